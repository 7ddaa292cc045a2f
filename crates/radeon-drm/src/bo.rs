use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::error::{DrmError, Result};
use crate::ioctl::drm_ioctl;
use crate::uapi::{self, GemDomain};
use crate::{BoHandle, RadeonDevice};

/// A kernel-managed memory allocation identified by an opaque handle.
///
/// The handle is the currency of the command-stream layer: relocation
/// entries name buffers by handle and the kernel resolves them to physical
/// placements at submission time. Dropping the object closes the handle.
#[derive(Debug)]
pub struct RadeonBufferObject<'d> {
    device: &'d RadeonDevice,
    handle: BoHandle,
    size: u64,
}

impl<'d> RadeonBufferObject<'d> {
    /// Allocate a buffer object of `size` bytes in `initial_domain`.
    pub fn create(
        device: &'d RadeonDevice,
        size: u64,
        alignment: u64,
        initial_domain: GemDomain,
        flags: u32,
    ) -> Result<Self> {
        let mut args = uapi::DrmRadeonGemCreate {
            size,
            alignment,
            handle: 0,
            initial_domain: initial_domain.bits(),
            flags,
        };
        // SAFETY: request code and argument type are paired in uapi.
        unsafe {
            drm_ioctl(
                device.descriptor(),
                uapi::DRM_IOCTL_RADEON_GEM_CREATE,
                "DRM_IOCTL_RADEON_GEM_CREATE",
                &mut args,
            )?;
        }
        debug!(handle = args.handle, size, ?initial_domain, "created buffer object");
        Ok(Self {
            device,
            handle: args.handle,
            size,
        })
    }

    /// Open a buffer object previously published with [`flink`].
    ///
    /// [`flink`]: Self::flink
    pub fn open_name(device: &'d RadeonDevice, name: u32) -> Result<Self> {
        let mut args = uapi::DrmGemOpen {
            name,
            handle: 0,
            size: 0,
        };
        // SAFETY: request code and argument type are paired in uapi.
        unsafe {
            drm_ioctl(
                device.descriptor(),
                uapi::DRM_IOCTL_GEM_OPEN,
                "DRM_IOCTL_GEM_OPEN",
                &mut args,
            )?;
        }
        Ok(Self {
            device,
            handle: args.handle,
            size: args.size,
        })
    }

    /// Publish the object under a global name other processes can open.
    pub fn flink(&self) -> Result<u32> {
        let mut args = uapi::DrmGemFlink {
            handle: self.handle,
            name: 0,
        };
        // SAFETY: request code and argument type are paired in uapi.
        unsafe {
            drm_ioctl(
                self.device.descriptor(),
                uapi::DRM_IOCTL_GEM_FLINK,
                "DRM_IOCTL_GEM_FLINK",
                &mut args,
            )?;
        }
        Ok(args.name)
    }

    /// The kernel handle naming this object.
    pub fn handle(&self) -> BoHandle {
        self.handle
    }

    /// Size of the allocation in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Map `len` bytes at `offset` into the process address space.
    ///
    /// Takes `&mut self` so at most one mapping of the object exists at a
    /// time; the mapping unmaps itself when dropped.
    pub fn mmap(&mut self, offset: u64, len: usize) -> Result<BoMapping<'_>> {
        let mut args = uapi::DrmRadeonGemMmap {
            handle: self.handle,
            pad: 0,
            offset,
            size: len as u64,
            addr_ptr: 0,
        };
        // SAFETY: request code and argument type are paired in uapi.
        unsafe {
            drm_ioctl(
                self.device.descriptor(),
                uapi::DRM_IOCTL_RADEON_GEM_MMAP,
                "DRM_IOCTL_RADEON_GEM_MMAP",
                &mut args,
            )?;
        }

        // SAFETY: mapping a fresh region chosen by the kernel; the fake
        // offset returned above is what the device expects on its node.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                self.device.descriptor(),
                args.addr_ptr as libc::off_t,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(DrmError::Mmap {
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(BoMapping {
            ptr: ptr.cast(),
            len,
            _bo: PhantomData,
        })
    }

    /// Block until the GPU is done with this object.
    pub fn wait_idle(&self) -> Result<()> {
        let mut args = uapi::DrmRadeonGemWaitIdle {
            handle: self.handle,
            pad: 0,
        };
        // SAFETY: request code and argument type are paired in uapi.
        unsafe {
            drm_ioctl(
                self.device.descriptor(),
                uapi::DRM_IOCTL_RADEON_GEM_WAIT_IDLE,
                "DRM_IOCTL_RADEON_GEM_WAIT_IDLE",
                &mut args,
            )
        }
    }

    /// Whether the kernel still considers the object busy.
    pub fn busy(&self) -> Result<bool> {
        let mut args = uapi::DrmRadeonGemBusy {
            handle: self.handle,
            domain: 0,
        };
        // SAFETY: request code and argument type are paired in uapi.
        let r = unsafe {
            drm_ioctl(
                self.device.descriptor(),
                uapi::DRM_IOCTL_RADEON_GEM_BUSY,
                "DRM_IOCTL_RADEON_GEM_BUSY",
                &mut args,
            )
        };
        match r {
            Ok(()) => Ok(false),
            Err(DrmError::Ioctl { source, .. })
                if source.raw_os_error() == Some(libc::EBUSY) =>
            {
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }
}

impl Drop for RadeonBufferObject<'_> {
    fn drop(&mut self) {
        let mut args = uapi::DrmGemClose {
            handle: self.handle,
            pad: 0,
        };
        // SAFETY: request code and argument type are paired in uapi.
        let r = unsafe {
            drm_ioctl(
                self.device.descriptor(),
                uapi::DRM_IOCTL_GEM_CLOSE,
                "DRM_IOCTL_GEM_CLOSE",
                &mut args,
            )
        };
        if let Err(e) = r {
            warn!(handle = self.handle, error = %e, "closing buffer object failed");
        }
    }
}

/// A live CPU mapping of a buffer object.
///
/// Derefs to the mapped bytes; the region is unmapped on drop. The GPU may
/// write the same memory while the mapping exists, so callers synchronize
/// through [`RadeonBufferObject::wait_idle`] before reading results.
pub struct BoMapping<'a> {
    ptr: *mut u8,
    len: usize,
    _bo: PhantomData<&'a mut [u8]>,
}

impl Deref for BoMapping<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: ptr/len describe the mapping established in `mmap`.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl DerefMut for BoMapping<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: ptr/len describe the mapping established in `mmap`, and
        // `mmap` hands out at most one mapping per object.
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for BoMapping<'_> {
    fn drop(&mut self) {
        // SAFETY: unmapping the exact region returned by mmap.
        if unsafe { libc::munmap(self.ptr.cast(), self.len) } == -1 {
            warn!(
                error = %std::io::Error::last_os_error(),
                "unmapping buffer object failed"
            );
        }
    }
}

impl std::fmt::Debug for BoMapping<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoMapping")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}
