use thiserror::Error;

pub type Result<T> = std::result::Result<T, DrmError>;

/// Unified error type for kernel-interface operations.
///
/// Interrupted and temporarily-unavailable conditions (`EINTR`/`EAGAIN`) are
/// absorbed by the retry loop in [`crate::ioctl::drm_ioctl`] and never reach
/// this type; every variant here is a real failure that the caller has to
/// report or act on.
#[derive(Debug, Error)]
pub enum DrmError {
    /// A kernel request failed. `request` is the uapi name of the ioctl so
    /// the message reads like the kernel interface the caller grepped for.
    #[error("{request}: {source}")]
    Ioctl {
        request: &'static str,
        source: std::io::Error,
    },

    /// Opening the device node failed.
    #[error("open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    /// Mapping a buffer object into the process address space failed.
    #[error("mmap: {source}")]
    Mmap { source: std::io::Error },
}
