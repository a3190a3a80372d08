//! Live media stream engine.
//!
//! This module provides:
//! - Shared pending buffer with a single-slot wake signal
//! - Interception of timeline data responses
//! - Scroll driving with stagnation detection
//! - The pull-based stream coordinator

pub mod channel;
pub mod coordinator;
pub mod scroll;
pub mod session;

pub use channel::{extract_records, InterceptionChannel, DEFAULT_TIMELINE_ENDPOINT};
pub use coordinator::{MediaStream, StreamConfig};
pub use scroll::{ScrollDriver, ScrollOutcome, ScrollReport, DEFAULT_SCROLL_INTERVALS};
pub use session::{Awaiter, StreamSession, StreamState};
