//! Position in the fixed A-Z alphabet that drives the traversal.

/// The 26 letters the directory indexes companies under
pub const ALPHABET: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Letter used whenever the configured start letter is unusable
pub const DEFAULT_START_LETTER: char = 'A';

/// Coerces a configured start letter into a letter of [`ALPHABET`]
///
/// Only a single uppercase ASCII letter is accepted as-is. Everything else
/// (empty, several characters, lowercase, digits, accented letters) falls
/// back to [`DEFAULT_START_LETTER`] without reporting an error.
///
/// # Examples
///
/// ```
/// use doualazoom_crawler::state::coerce_start_letter;
///
/// assert_eq!(coerce_start_letter("M"), 'M');
/// assert_eq!(coerce_start_letter("m"), 'A');
/// assert_eq!(coerce_start_letter("AB"), 'A');
/// assert_eq!(coerce_start_letter(""), 'A');
/// ```
pub fn coerce_start_letter(raw: &str) -> char {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => c,
        _ => DEFAULT_START_LETTER,
    }
}

/// Forward-only cursor over [`ALPHABET`]
///
/// The cursor is never reset; iterating it yields each remaining letter
/// exactly once, from the start letter through 'Z'.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterCursor {
    position: usize,
}

impl LetterCursor {
    /// Creates a cursor positioned on `start`, coercing invalid letters to 'A'
    pub fn new(start: char) -> Self {
        let position = ALPHABET
            .iter()
            .position(|&letter| letter == start)
            .unwrap_or(0);
        Self { position }
    }

    /// Creates a cursor from the raw configured value
    pub fn from_config(raw: &str) -> Self {
        Self::new(coerce_start_letter(raw))
    }

    /// The letter the cursor currently points at, if any remain
    pub fn current(&self) -> Option<char> {
        ALPHABET.get(self.position).copied()
    }

    /// Number of letters not yet yielded
    pub fn remaining(&self) -> usize {
        ALPHABET.len().saturating_sub(self.position)
    }
}

impl Default for LetterCursor {
    fn default() -> Self {
        Self::new(DEFAULT_START_LETTER)
    }
}

impl Iterator for LetterCursor {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let letter = self.current()?;
        self.position += 1;
        Some(letter)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LetterCursor {}
