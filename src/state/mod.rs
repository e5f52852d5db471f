//! State module for a single extraction run
//!
//! # Components
//!
//! - `PublicationRecord`: One accepted publication, as written to the snapshot
//! - `StopReason`: Why the pagination loop ended

mod record;
mod stop_reason;

// Re-export main types
pub use record::{record_id, venue_tag, PublicationRecord, UNFEATURED_ORDER};
pub use stop_reason::StopReason;
