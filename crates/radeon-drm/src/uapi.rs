//! Kernel uapi declarations for the DRM core and the radeon driver.
//!
//! Source of truth: `include/uapi/drm/drm.h` and
//! `include/uapi/drm/radeon_drm.h` in the kernel tree. Only the structs and
//! request codes this crate actually issues are declared; layouts must match
//! the kernel bit-for-bit (the layout tests below pin the sizes and the
//! encoded request numbers).

use bitflags::bitflags;

// `_IOC` field layout from asm-generic/ioctl.h.
const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;

const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

const fn ioc(dir: u32, ty: u32, nr: u32, size: usize) -> u64 {
    ((dir << IOC_DIRSHIFT)
        | (ty << IOC_TYPESHIFT)
        | (nr << IOC_NRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)) as u64
}

const fn iow<T>(ty: u32, nr: u32) -> u64 {
    ioc(IOC_WRITE, ty, nr, core::mem::size_of::<T>())
}

const fn iowr<T>(ty: u32, nr: u32) -> u64 {
    ioc(IOC_WRITE | IOC_READ, ty, nr, core::mem::size_of::<T>())
}

/// DRM ioctl type byte (`'d'`).
const DRM_IOCTL_BASE: u32 = 0x64;
/// First request number reserved for driver-specific commands.
const DRM_COMMAND_BASE: u32 = 0x40;

// Driver-specific request numbers of the radeon driver.
const DRM_RADEON_GEM_INFO: u32 = 0x1c;
const DRM_RADEON_GEM_CREATE: u32 = 0x1d;
const DRM_RADEON_GEM_MMAP: u32 = 0x1e;
const DRM_RADEON_GEM_WAIT_IDLE: u32 = 0x24;
const DRM_RADEON_CS: u32 = 0x26;
const DRM_RADEON_INFO: u32 = 0x27;
const DRM_RADEON_GEM_BUSY: u32 = 0x2a;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct DrmGemClose {
    pub handle: u32,
    pub pad: u32,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct DrmGemFlink {
    pub handle: u32,
    pub name: u32,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct DrmGemOpen {
    pub name: u32,
    pub handle: u32,
    pub size: u64,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct DrmRadeonGemInfo {
    pub gart_size: u64,
    pub vram_size: u64,
    pub vram_visible: u64,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct DrmRadeonGemCreate {
    pub size: u64,
    pub alignment: u64,
    pub handle: u32,
    pub initial_domain: u32,
    pub flags: u32,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct DrmRadeonGemMmap {
    pub handle: u32,
    pub pad: u32,
    /// Fake mmap offset handed back by the kernel; passed to `mmap(2)` on
    /// the device descriptor to materialize the mapping.
    pub offset: u64,
    pub size: u64,
    pub addr_ptr: u64,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct DrmRadeonGemWaitIdle {
    pub handle: u32,
    pub pad: u32,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct DrmRadeonGemBusy {
    pub handle: u32,
    /// Current domain of the object, written back by the kernel.
    pub domain: u32,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct DrmRadeonInfo {
    pub request: u32,
    pub pad: u32,
    /// User address of the destination value the kernel writes.
    pub value: u64,
}

/// One section of a command-stream submission.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct DrmRadeonCsChunk {
    pub chunk_id: u32,
    pub length_dw: u32,
    pub chunk_data: u64,
}

/// One relocation-chunk entry: which buffer a stream reference resolves to
/// and the access rights the kernel must honor when placing it.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DrmRadeonCsReloc {
    pub handle: u32,
    pub read_domains: u32,
    pub write_domain: u32,
    pub flags: u32,
}

/// Top-level command-stream submission arguments.
///
/// `chunks` points at an array of `u64`s, each of which is itself the user
/// address of one [`DrmRadeonCsChunk`] (double indirection).
#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct DrmRadeonCs {
    pub num_chunks: u64,
    pub cs_id: u64,
    pub chunks: u64,
    pub gart_limit: u64,
    pub vram_limit: u64,
}

pub const DRM_IOCTL_GEM_CLOSE: u64 = iow::<DrmGemClose>(DRM_IOCTL_BASE, 0x09);
pub const DRM_IOCTL_GEM_FLINK: u64 = iowr::<DrmGemFlink>(DRM_IOCTL_BASE, 0x0a);
pub const DRM_IOCTL_GEM_OPEN: u64 = iowr::<DrmGemOpen>(DRM_IOCTL_BASE, 0x0b);

pub const DRM_IOCTL_RADEON_GEM_INFO: u64 =
    iowr::<DrmRadeonGemInfo>(DRM_IOCTL_BASE, DRM_COMMAND_BASE + DRM_RADEON_GEM_INFO);
pub const DRM_IOCTL_RADEON_GEM_CREATE: u64 =
    iowr::<DrmRadeonGemCreate>(DRM_IOCTL_BASE, DRM_COMMAND_BASE + DRM_RADEON_GEM_CREATE);
pub const DRM_IOCTL_RADEON_GEM_MMAP: u64 =
    iowr::<DrmRadeonGemMmap>(DRM_IOCTL_BASE, DRM_COMMAND_BASE + DRM_RADEON_GEM_MMAP);
pub const DRM_IOCTL_RADEON_GEM_WAIT_IDLE: u64 =
    iow::<DrmRadeonGemWaitIdle>(DRM_IOCTL_BASE, DRM_COMMAND_BASE + DRM_RADEON_GEM_WAIT_IDLE);
pub const DRM_IOCTL_RADEON_CS: u64 =
    iowr::<DrmRadeonCs>(DRM_IOCTL_BASE, DRM_COMMAND_BASE + DRM_RADEON_CS);
pub const DRM_IOCTL_RADEON_INFO: u64 =
    iowr::<DrmRadeonInfo>(DRM_IOCTL_BASE, DRM_COMMAND_BASE + DRM_RADEON_INFO);
pub const DRM_IOCTL_RADEON_GEM_BUSY: u64 =
    iowr::<DrmRadeonGemBusy>(DRM_IOCTL_BASE, DRM_COMMAND_BASE + DRM_RADEON_GEM_BUSY);

/// `DrmRadeonInfo::request` value querying the PCI device id.
pub const RADEON_INFO_DEVICE_ID: u32 = 0x00;

// Chunk ids understood by the submission ioctl.
pub const RADEON_CHUNK_ID_RELOCS: u32 = 0x01;
pub const RADEON_CHUNK_ID_IB: u32 = 0x02;
pub const RADEON_CHUNK_ID_FLAGS: u32 = 0x03;

// First word of the flags chunk.
pub const RADEON_CS_KEEP_TILING_FLAGS: u32 = 0x01;
pub const RADEON_CS_USE_VM: u32 = 0x02;
// Second word of the flags chunk.
pub const RADEON_CS_RING_GFX: u32 = 0;
pub const RADEON_CS_RING_COMPUTE: u32 = 1;

bitflags! {
    /// Memory domains a buffer object may reside in or be accessed from.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GemDomain: u32 {
        /// Host memory, unmigrated.
        const CPU = 0x1;
        /// Host memory visible to the GPU through the GART.
        const GTT = 0x2;
        /// Dedicated video memory.
        const VRAM = 0x4;
    }
}
