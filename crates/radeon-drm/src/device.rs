use std::ffi::CString;
use std::fmt;
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{DrmError, Result};
use crate::ioctl::drm_ioctl;
use crate::uapi;

/// Chip generations this library knows about, in release order.
///
/// The ordering is load-bearing: generation spans are expressed as
/// half-open ranges over this enum (`R600 <= f < Cedar` selects the r600
/// encoder, `Cedar <= f < Cayman` the evergreen one). Devices older than
/// R600, or ids missing from the probe table, report `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChipFamily {
    Unknown,
    R600,
    Rv610,
    Rv630,
    Rv670,
    Rv620,
    Rv635,
    Rs780,
    Rs880,
    Rv770,
    Rv730,
    Rv710,
    Rv740,
    Cedar,
    Redwood,
    Juniper,
    Cypress,
    Hemlock,
    Palm,
    Sumo,
    Sumo2,
    Barts,
    Turks,
    Caicos,
    Cayman,
    Aruba,
}

impl ChipFamily {
    /// Map a PCI device id to its chip family.
    ///
    /// Covers the R600 through Northern-Islands ids this library can drive;
    /// anything else (including pre-R600 parts) maps to [`Unknown`], which
    /// no encoder profile accepts.
    ///
    /// [`Unknown`]: ChipFamily::Unknown
    pub fn from_device_id(device_id: u32) -> ChipFamily {
        use ChipFamily::*;
        match device_id {
            0x9400 | 0x9401 | 0x9402 | 0x9403 | 0x9405 | 0x940a | 0x940b | 0x940f => R600,
            0x94c0 | 0x94c1 | 0x94c3 | 0x94c4 | 0x94c5 | 0x94c6 | 0x94c7 | 0x94c8 | 0x94c9
            | 0x94cb | 0x94cc => Rv610,
            0x9580 | 0x9581 | 0x9583 | 0x9586 | 0x9587 | 0x9588 | 0x9589 | 0x958a | 0x958b
            | 0x958c | 0x958d | 0x958e => Rv630,
            0x9500 | 0x9501 | 0x9504 | 0x9505 | 0x9506 | 0x9507 | 0x9508 | 0x9509 | 0x950f
            | 0x9511 | 0x9515 => Rv670,
            0x95c0 | 0x95c2 | 0x95c4 | 0x95c5 | 0x95c6 | 0x95c7 | 0x95c9 | 0x95cc | 0x95cd
            | 0x95ce | 0x95cf => Rv620,
            0x9590 | 0x9591 | 0x9593 | 0x9595 | 0x9596 | 0x9597 | 0x9598 | 0x9599 | 0x959b => {
                Rv635
            }
            0x9610 | 0x9611 | 0x9612 | 0x9613 | 0x9614 | 0x9615 | 0x9616 => Rs780,
            0x9710 | 0x9711 | 0x9712 | 0x9713 | 0x9714 | 0x9715 => Rs880,
            0x9440 | 0x9441 | 0x9442 | 0x9443 | 0x9444 | 0x9446 | 0x944a | 0x944b | 0x944c
            | 0x944e | 0x9450 | 0x9452 | 0x9456 | 0x945a | 0x9460 | 0x9462 => Rv770,
            0x9480 | 0x9487 | 0x9488 | 0x9489 | 0x948a | 0x948f | 0x9490 | 0x9491 | 0x9495
            | 0x9498 | 0x949c | 0x949e | 0x949f => Rv730,
            0x9540 | 0x9541 | 0x9542 | 0x954e | 0x954f | 0x9552 | 0x9553 | 0x9555 | 0x9557
            | 0x955f => Rv710,
            0x94a0 | 0x94a1 | 0x94a3 | 0x94b1 | 0x94b3 | 0x94b4 | 0x94b5 | 0x94b9 => Rv740,
            0x68e0 | 0x68e1 | 0x68e4 | 0x68e5 | 0x68e8 | 0x68e9 | 0x68f1 | 0x68f2 | 0x68f8
            | 0x68f9 | 0x68fa | 0x68fe => Cedar,
            0x68c0 | 0x68c1 | 0x68c7 | 0x68c8 | 0x68c9 | 0x68d8 | 0x68d9 | 0x68da | 0x68de => {
                Redwood
            }
            0x68a0 | 0x68a1 | 0x68a8 | 0x68a9 | 0x68b0 | 0x68b8 | 0x68b9 | 0x68ba | 0x68be
            | 0x68bf => Juniper,
            0x6880 | 0x6888 | 0x6889 | 0x688a | 0x688c | 0x688d | 0x6898 | 0x6899 | 0x689b
            | 0x689e => Cypress,
            0x689c | 0x689d => Hemlock,
            0x9802 | 0x9803 | 0x9804 | 0x9805 | 0x9806 | 0x9807 | 0x9808 | 0x9809 | 0x980a => {
                Palm
            }
            0x9640 | 0x9641 | 0x9647 | 0x9648 | 0x9649 | 0x964a | 0x964b | 0x964c | 0x964e
            | 0x964f => Sumo,
            0x9642 | 0x9643 | 0x9644 | 0x9645 => Sumo2,
            0x6720 | 0x6721 | 0x6722 | 0x6723 | 0x6724 | 0x6725 | 0x6726 | 0x6727 | 0x6728
            | 0x6729 | 0x6738 | 0x6739 | 0x673e => Barts,
            0x6740 | 0x6741 | 0x6742 | 0x6743 | 0x6744 | 0x6745 | 0x6746 | 0x6747 | 0x6748
            | 0x6749 | 0x674a | 0x6750 | 0x6751 | 0x6758 | 0x6759 | 0x675b | 0x675d | 0x675f => {
                Turks
            }
            0x6760 | 0x6761 | 0x6762 | 0x6763 | 0x6764 | 0x6765 | 0x6766 | 0x6767 | 0x6768
            | 0x6770 | 0x6771 | 0x6772 | 0x6778 | 0x6779 | 0x677b => Caicos,
            0x6700 | 0x6701 | 0x6702 | 0x6703 | 0x6704 | 0x6705 | 0x6706 | 0x6707 | 0x6708
            | 0x6709 | 0x6718 | 0x6719 | 0x671c | 0x671d | 0x671f => Cayman,
            0x9900 | 0x9901 | 0x9903 | 0x9904 | 0x9905 | 0x9906 | 0x9907 | 0x9908 | 0x9909
            | 0x990a | 0x990f | 0x9910 | 0x9913 | 0x9917 | 0x9918 | 0x9919 | 0x9990 | 0x9991
            | 0x9992 | 0x9993 | 0x9994 | 0x9995 | 0x9996 | 0x9997 | 0x9998 | 0x9999 => Aruba,
            _ => Unknown,
        }
    }

    /// The family's marketing-free name, as the kernel spells it.
    pub fn name(self) -> &'static str {
        use ChipFamily::*;
        match self {
            Unknown => "UNKNOWN",
            R600 => "R600",
            Rv610 => "RV610",
            Rv630 => "RV630",
            Rv670 => "RV670",
            Rv620 => "RV620",
            Rv635 => "RV635",
            Rs780 => "RS780",
            Rs880 => "RS880",
            Rv770 => "RV770",
            Rv730 => "RV730",
            Rv710 => "RV710",
            Rv740 => "RV740",
            Cedar => "CEDAR",
            Redwood => "REDWOOD",
            Juniper => "JUNIPER",
            Cypress => "CYPRESS",
            Hemlock => "HEMLOCK",
            Palm => "PALM",
            Sumo => "SUMO",
            Sumo2 => "SUMO2",
            Barts => "BARTS",
            Turks => "TURKS",
            Caicos => "CAICOS",
            Cayman => "CAYMAN",
            Aruba => "ARUBA",
        }
    }
}

impl fmt::Display for ChipFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An open DRI device node.
#[derive(Debug)]
pub struct DriDevice {
    fd: RawFd,
}

impl DriDevice {
    /// Open the device node at `path` for read/write.
    pub fn open(path: &Path) -> Result<Self> {
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| DrmError::Open {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
        })?;
        let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDWR | libc::O_CLOEXEC) };
        if fd == -1 {
            return Err(DrmError::Open {
                path: path.display().to_string(),
                source: std::io::Error::last_os_error(),
            });
        }
        debug!(path = %path.display(), fd, "opened dri device");
        Ok(Self { fd })
    }

    /// The raw file descriptor of the node.
    pub fn descriptor(&self) -> RawFd {
        self.fd
    }
}

impl Drop for DriDevice {
    fn drop(&mut self) {
        if unsafe { libc::close(self.fd) } == -1 {
            warn!(
                fd = self.fd,
                error = %std::io::Error::last_os_error(),
                "closing dri device failed"
            );
        }
    }
}

/// A radeon device node with identity cached at open time.
#[derive(Debug)]
pub struct RadeonDevice {
    dri: DriDevice,
    gem_info: uapi::DrmRadeonGemInfo,
    device_id: u32,
    family: ChipFamily,
}

impl RadeonDevice {
    /// Open `path` and query the memory-manager capacity and PCI id once.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let dri = DriDevice::open(path.as_ref())?;

        let mut gem_info = uapi::DrmRadeonGemInfo::default();
        // SAFETY: request code and argument type are paired in uapi.
        unsafe {
            drm_ioctl(
                dri.descriptor(),
                uapi::DRM_IOCTL_RADEON_GEM_INFO,
                "DRM_IOCTL_RADEON_GEM_INFO",
                &mut gem_info,
            )?;
        }

        let device_id = Self::query_info_u32(&dri, uapi::RADEON_INFO_DEVICE_ID)?;
        let family = ChipFamily::from_device_id(device_id);
        debug!(
            path = %path.as_ref().display(),
            device_id,
            %family,
            "probed radeon device"
        );

        Ok(Self {
            dri,
            gem_info,
            device_id,
            family,
        })
    }

    /// The raw file descriptor of the node.
    pub fn descriptor(&self) -> RawFd {
        self.dri.descriptor()
    }

    /// Memory-manager capacity reported by the kernel at open time.
    pub fn gem_info(&self) -> &uapi::DrmRadeonGemInfo {
        &self.gem_info
    }

    /// Cached PCI device id.
    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    /// Cached chip family derived from the PCI id.
    pub fn family(&self) -> ChipFamily {
        self.family
    }

    /// Issue a `DRM_IOCTL_RADEON_INFO` request returning a 32-bit value.
    pub fn info_u32(&self, request: u32) -> Result<u32> {
        Self::query_info_u32(&self.dri, request)
    }

    fn query_info_u32(dri: &DriDevice, request: u32) -> Result<u32> {
        let mut value: u32 = 0;
        let mut args = uapi::DrmRadeonInfo {
            request,
            pad: 0,
            value: &mut value as *mut u32 as u64,
        };
        // SAFETY: request code and argument type are paired in uapi; `value`
        // stays alive across the call.
        unsafe {
            drm_ioctl(
                dri.descriptor(),
                uapi::DRM_IOCTL_RADEON_INFO,
                "DRM_IOCTL_RADEON_INFO",
                &mut args,
            )?;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_ordering_matches_release_order() {
        assert!(ChipFamily::Unknown < ChipFamily::R600);
        assert!(ChipFamily::R600 < ChipFamily::Cedar);
        assert!(ChipFamily::Rv740 < ChipFamily::Cedar);
        assert!(ChipFamily::Cedar < ChipFamily::Cayman);
        assert!(ChipFamily::Caicos < ChipFamily::Cayman);
        assert!(ChipFamily::Cayman < ChipFamily::Aruba);
    }

    #[test]
    fn known_device_ids_resolve() {
        assert_eq!(ChipFamily::from_device_id(0x9400), ChipFamily::R600);
        assert_eq!(ChipFamily::from_device_id(0x94c1), ChipFamily::Rv610);
        assert_eq!(ChipFamily::from_device_id(0x9460), ChipFamily::Rv770);
        assert_eq!(ChipFamily::from_device_id(0x68e0), ChipFamily::Cedar);
        assert_eq!(ChipFamily::from_device_id(0x689c), ChipFamily::Hemlock);
        assert_eq!(ChipFamily::from_device_id(0x6720), ChipFamily::Barts);
        assert_eq!(ChipFamily::from_device_id(0x6700), ChipFamily::Cayman);
    }

    #[test]
    fn unknown_device_ids_resolve_to_unknown() {
        assert_eq!(ChipFamily::from_device_id(0x0000), ChipFamily::Unknown);
        assert_eq!(ChipFamily::from_device_id(0x5159), ChipFamily::Unknown); // RV100-era id
        assert_eq!(ChipFamily::from_device_id(0xffff), ChipFamily::Unknown);
    }

    #[test]
    fn family_names_match_kernel_spelling() {
        assert_eq!(ChipFamily::R600.name(), "R600");
        assert_eq!(ChipFamily::Sumo2.name(), "SUMO2");
        assert_eq!(ChipFamily::Cayman.to_string(), "CAYMAN");
    }
}
