//! Terminal states of the pagination loop

use crate::FetchError;
use std::fmt;

/// Why the crawl stopped requesting listing pages
#[derive(Debug)]
pub enum StopReason {
    /// The first page had no rows: private profile, wrong id, or changed layout
    EmptyProfile,

    /// A later page had no rows
    Exhausted,

    /// A page came back with fewer rows than requested
    LastPage,

    /// The configured page cap was reached
    PageCap,

    /// A listing page could not be fetched; records gathered so far are kept
    Aborted(FetchError),
}

impl StopReason {
    /// Returns true if the crawl ended because of a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }

    /// Returns true if the listing was read to its natural end
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Exhausted | Self::LastPage)
    }

    /// Short machine-friendly label
    pub fn label(&self) -> &'static str {
        match self {
            Self::EmptyProfile => "empty_profile",
            Self::Exhausted => "exhausted",
            Self::LastPage => "last_page",
            Self::PageCap => "page_cap",
            Self::Aborted(_) => "aborted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyProfile => write!(f, "no rows on the first page"),
            Self::Exhausted => write!(f, "no more rows"),
            Self::LastPage => write!(f, "last page reached"),
            Self::PageCap => write!(f, "page cap reached"),
            Self::Aborted(e) => write!(f, "aborted: {}", e),
        }
    }
}
