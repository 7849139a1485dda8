/// Traversal phase definitions for a single letter
///
/// Each letter moves through these phases independently of the others.
use crate::CrawlerError;
use std::fmt;

/// Represents where a letter's traversal currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LetterPhase {
    /// Letter is known but its first listing page has not been requested
    AwaitingLetter,

    /// A listing page for this letter is in flight
    FetchingListing,

    /// Detail fetches for the current listing page are being dispatched
    FetchingDetail,

    /// The listing page had companies; the next page is about to be requested
    AdvancingPage,

    /// Pagination for this letter has stopped
    AdvancingLetter,

    /// Terminal: nothing more will be requested for this letter
    Done,
}

impl LetterPhase {
    /// Returns true for the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: LetterPhase) -> bool {
        use LetterPhase::*;
        matches!(
            (*self, next),
            (AwaitingLetter, FetchingListing)
                | (FetchingListing, FetchingDetail)
                | (FetchingListing, AdvancingPage)
                | (FetchingListing, AdvancingLetter)
                | (FetchingDetail, AdvancingPage)
                | (FetchingDetail, AdvancingLetter)
                | (AdvancingPage, FetchingListing)
                | (AdvancingLetter, Done)
        )
    }

    /// Short lowercase label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingLetter => "awaiting_letter",
            Self::FetchingListing => "fetching_listing",
            Self::FetchingDetail => "fetching_detail",
            Self::AdvancingPage => "advancing_page",
            Self::AdvancingLetter => "advancing_letter",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for LetterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-letter traversal bookkeeping
#[derive(Debug, Clone)]
pub struct LetterProgress {
    /// The letter being traversed
    pub letter: char,

    /// Current phase
    pub phase: LetterPhase,

    /// Listing pages fetched so far
    pub pages_fetched: u32,

    /// Company links discovered across all pages
    pub companies_found: u64,
}

impl LetterProgress {
    /// Creates progress for a letter that has not started yet
    pub fn new(letter: char) -> Self {
        Self {
            letter,
            phase: LetterPhase::AwaitingLetter,
            pages_fetched: 0,
            companies_found: 0,
        }
    }

    /// Moves to `next`, rejecting transitions the state machine does not allow
    pub fn transition(&mut self, next: LetterPhase) -> Result<(), CrawlerError> {
        if !self.phase.can_transition_to(next) {
            return Err(CrawlerError::InvalidTransition {
                letter: self.letter,
                from: self.phase,
                to: next,
            });
        }

        tracing::trace!("Letter {}: {} -> {}", self.letter, self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Records a fetched listing page and the companies it listed
    pub fn record_page(&mut self, companies: usize) {
        self.pages_fetched += 1;
        self.companies_found += companies as u64;
    }

    /// Returns true once `cap` listing pages have been fetched
    pub fn reached_cap(&self, cap: Option<u32>) -> bool {
        cap.is_some_and(|cap| self.pages_fetched >= cap)
    }
}
