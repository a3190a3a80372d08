//! Media module for record representation and timeline entry parsing.

pub mod parser;
pub mod record;
pub mod types;

pub use parser::{parse_entry, Rejection};
pub use record::MediaRecord;
pub use types::TimelinePayload;
