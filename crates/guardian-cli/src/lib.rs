//! Offline tooling around the guardian engine
//!
//! Replays recorded detection streams (see [`parser`]) through the same
//! per-frame engine a live session uses.

pub mod parser;
pub mod replay;

pub use parser::{read_frames, ParseError, RecordedDetection, ReplayFrame};
pub use replay::{replay, PoseOverrides, RecordedCollaborators, ReplaySummary};
