use radeon_drm::{ChipFamily, DrmError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CsError>;

/// Errors produced while constructing, building or submitting a command
/// stream.
#[derive(Debug, Error)]
pub enum CsError {
    /// The device's detected chip generation falls outside the profile's
    /// supported span. Raised at construction, before any stream id is
    /// taken.
    #[error("chip family {family} is outside the {profile} generation")]
    UnsupportedFamily {
        profile: &'static str,
        family: ChipFamily,
    },

    /// Every stream id is held by a live stream.
    #[error("all {capacity} command-stream ids are in use")]
    StreamIdsExhausted { capacity: u32 },

    /// The kernel rejected the submission; the inner error names the
    /// failing request.
    #[error("command stream submission failed")]
    Submit(#[source] DrmError),
}
