//! The retried ioctl entry point.

use std::os::fd::RawFd;

use crate::error::{DrmError, Result};

/// Issue `request` on `fd`, retrying while the kernel reports `EINTR` or
/// `EAGAIN`.
///
/// The retry loop has no cap and no backoff: for these two errnos the kernel
/// contract is "call again", and the original interface retried forever. A
/// pathological kernel-side stall therefore spins here rather than
/// surfacing; any other errno is wrapped with the request's uapi name and
/// returned.
///
/// # Safety
///
/// `arg` must be the argument type `request` encodes. For a request with a
/// read direction the kernel writes `_IOC_SIZE(request)` bytes through the
/// pointer, so a mismatched type corrupts memory.
pub unsafe fn drm_ioctl<T>(
    fd: RawFd,
    request: u64,
    name: &'static str,
    arg: &mut T,
) -> Result<()> {
    loop {
        let r = unsafe { libc::ioctl(fd, request as libc::c_ulong, arg as *mut T) };
        if r != -1 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINTR) | Some(libc::EAGAIN) => continue,
            _ => {
                return Err(DrmError::Ioctl {
                    request: name,
                    source: err,
                })
            }
        }
    }
}
