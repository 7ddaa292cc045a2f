//! `radeon-drm` wraps the kernel DRM/GEM interface of radeon devices.
//!
//! Currently this crate provides:
//! - Hand-declared uapi structs and ioctl request codes for the requests
//!   this library issues (see [`uapi`]).
//! - The single retried ioctl entry point every kernel request goes through
//!   (see [`ioctl::drm_ioctl`]).
//! - Device-node wrappers that cache identity at open time (see
//!   [`RadeonDevice`]).
//! - GEM buffer objects with create/share/map/synchronize operations (see
//!   [`RadeonBufferObject`]).

pub mod ioctl;
pub mod uapi;

mod bo;
mod device;
mod error;

pub use bo::{BoMapping, RadeonBufferObject};
pub use device::{ChipFamily, DriDevice, RadeonDevice};
pub use error::{DrmError, Result};

/// Opaque kernel handle naming a GEM buffer object.
///
/// Handles are per-device-file: the same allocation opened through two
/// device descriptors has two unrelated handle values.
pub type BoHandle = u32;
