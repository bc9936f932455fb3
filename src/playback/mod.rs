mod session;
mod sink;

pub use session::{Player, Session, SessionOptions};
pub use sink::{click_clip, AudioSink, DeviceSink, PcmSpec};

use thiserror::Error;

/// Why a single sonification cycle was skipped.
///
/// None of these are fatal: the worker logs the reason and waits for the
/// next cadence tick or frame. Only explicit stop or end of stream ends a
/// session.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("source unreadable: {0:#}")]
    SourceUnreadable(anyhow::Error),
    #[error("stage failed: {0:#}")]
    Stage(anyhow::Error),
    #[error("audio sink unavailable: {0:#}")]
    SinkUnavailable(anyhow::Error),
}
