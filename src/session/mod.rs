//! Exercise sessions
//!
//! - `state` - Session aggregate, options, rep counting rule, summaries
//! - `registry` - Concurrent store of live sessions

pub mod registry;
pub mod state;

pub use registry::{FrameTicket, FrameUpdate, RegistryStats, SessionRegistry};
pub use state::{
    Session, SessionId, SessionOptions, SessionOptionsOverride, SessionStatus, SessionSummary,
};
