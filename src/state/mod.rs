//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `LetterCursor`: forward-only position in the A-Z alphabet
//! - `LetterPhase`: traversal phase of a single letter
//! - `LetterProgress`: per-letter phase plus page and company counters

mod letter_cursor;
mod letter_phase;

// Re-export main types
pub use letter_cursor::{coerce_start_letter, LetterCursor, ALPHABET, DEFAULT_START_LETTER};
pub use letter_phase::{LetterPhase, LetterProgress};
