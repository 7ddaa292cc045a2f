use std::sync::Arc;

use bitflags::bitflags;
use tracing::debug;

use radeon_drm::ioctl::drm_ioctl;
use radeon_drm::uapi::{self, DrmRadeonCs, DrmRadeonCsChunk, DrmRadeonCsReloc, GemDomain};
use radeon_drm::{BoHandle, ChipFamily, DrmError, RadeonDevice};

use crate::error::{CsError, Result};
use crate::hexdump::HexDump;
use crate::ib::InstructionBuffer;
use crate::packet::{packet3, PACKET3_NOP};
use crate::profile::{ChipProfile, SetRegPacket};
use crate::reloc::{RelocationTable, RELOC_SIZE_DW};
use crate::stream_id::{StreamId, StreamIdAllocator};

bitflags! {
    /// First word of the flags chunk.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CsFlags: u32 {
        /// Keep the buffers' tiling state as-is instead of resetting it.
        const KEEP_TILING_FLAGS = uapi::RADEON_CS_KEEP_TILING_FLAGS;
        /// Address the stream through the per-process virtual GPU address
        /// space.
        const USE_VM = uapi::RADEON_CS_USE_VM;
    }
}

/// Ring selector carried in the second word of the flags chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsRing {
    #[default]
    Gfx,
    Compute,
}

impl CsRing {
    fn as_word(self) -> u32 {
        match self {
            CsRing::Gfx => uapi::RADEON_CS_RING_GFX,
            CsRing::Compute => uapi::RADEON_CS_RING_COMPUTE,
        }
    }
}

/// Device-side contract the encoder needs: the cached chip generation for
/// profile validation and the raw submission request.
///
/// [`RadeonDevice`] is the production implementation; tests substitute a
/// recording fake to inspect the exact descriptor the kernel would see.
pub trait CsTarget {
    fn family(&self) -> ChipFamily;

    /// Perform the submission request with fully built arguments, retrying
    /// transient interruption internally.
    fn submit_cs(&self, args: &mut DrmRadeonCs) -> std::result::Result<(), DrmError>;
}

impl CsTarget for RadeonDevice {
    fn family(&self) -> ChipFamily {
        RadeonDevice::family(self)
    }

    fn submit_cs(&self, args: &mut DrmRadeonCs) -> std::result::Result<(), DrmError> {
        // SAFETY: request code and argument type are paired in uapi; the
        // chunk arrays `args` points at outlive the call (they live in the
        // caller's frame).
        unsafe {
            drm_ioctl(
                self.descriptor(),
                uapi::DRM_IOCTL_RADEON_CS,
                "DRM_IOCTL_RADEON_CS",
                args,
            )
        }
    }
}

/// An in-memory command stream under construction for one device.
///
/// The stream accumulates packets in call order, deduplicates buffer
/// references, and on [`emit`] packages everything into the kernel's
/// multi-chunk submission descriptor. One stream is one batch: there is no
/// reset, a fresh batch takes a fresh stream. Building is single-writer;
/// distinct streams are independent.
///
/// [`emit`]: Self::emit
#[derive(Debug)]
pub struct CommandStream<'d, D: CsTarget> {
    device: &'d D,
    profile: &'static ChipProfile,
    ib: InstructionBuffer,
    relocs: RelocationTable,
    flags: [u32; 2],
    id: StreamId,
}

impl<'d, D: CsTarget> CommandStream<'d, D> {
    /// Create a stream for `device` using the process-wide id allocator.
    ///
    /// Fails with [`CsError::UnsupportedFamily`] if the device's generation
    /// is outside the profile's span; the check runs before any id is
    /// taken, so a rejected construction consumes nothing.
    pub fn new(device: &'d D, profile: &'static ChipProfile) -> Result<Self> {
        Self::with_allocator(device, profile, &StreamIdAllocator::global())
    }

    /// Like [`new`], with an explicit id allocator.
    ///
    /// [`new`]: Self::new
    pub fn with_allocator(
        device: &'d D,
        profile: &'static ChipProfile,
        allocator: &Arc<StreamIdAllocator>,
    ) -> Result<Self> {
        let family = device.family();
        if !profile.supports(family) {
            return Err(CsError::UnsupportedFamily {
                profile: profile.name,
                family,
            });
        }
        let id = allocator.acquire()?;
        Ok(Self {
            device,
            profile,
            ib: InstructionBuffer::new(),
            relocs: RelocationTable::new(),
            flags: [0, 0],
            id,
        })
    }

    /// The stream's id among concurrently live streams.
    pub fn id(&self) -> u32 {
        self.id.value()
    }

    /// The generation profile the stream encodes for.
    pub fn profile(&self) -> &'static ChipProfile {
        self.profile
    }

    /// Number of instruction words written so far.
    pub fn len(&self) -> usize {
        self.ib.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ib.is_empty()
    }

    /// Instruction-buffer capacity in words.
    pub fn capacity(&self) -> usize {
        self.ib.capacity()
    }

    /// Pre-size the instruction buffer for `additional` more words.
    pub fn reserve(&mut self, additional: usize) {
        self.ib.reserve(additional);
    }

    /// The raw instruction words written so far.
    pub fn as_words(&self) -> &[u32] {
        self.ib.as_words()
    }

    /// Relocation entries accumulated so far, in first-reference order.
    pub fn relocations(&self) -> &[DrmRadeonCsReloc] {
        self.relocs.entries()
    }

    /// Append one word.
    pub fn write(&mut self, word: u32) {
        self.ib.push(word);
    }

    /// Append an IEEE-754 single bit-for-bit.
    pub fn write_f32(&mut self, x: f32) {
        self.ib.push_f32(x);
    }

    /// Append a block of words.
    pub fn write_all(&mut self, words: &[u32]) {
        self.ib.extend_from_slice(words);
    }

    /// Append the header of a register-set packet for `count` consecutive
    /// registers starting at `reg`; the caller appends the `count` data
    /// words next. Prefer [`set_reg`]/[`set_regs`], which write header and
    /// data together.
    ///
    /// [`set_reg`]: Self::set_reg
    /// [`set_regs`]: Self::set_regs
    pub fn write_set_reg(&mut self, reg: u32, count: u32) {
        self.ib.reserve(2 + count as usize);
        match self.profile.set_reg_packet(reg, count) {
            SetRegPacket::Type3 { header, offset } => {
                self.ib.extend_from_slice(&[header, offset]);
            }
            SetRegPacket::Type0 { header } => {
                self.ib.push(header);
            }
        }
    }

    /// Set the register at `reg` to `value`.
    pub fn set_reg(&mut self, reg: u32, value: u32) {
        self.write_set_reg(reg, 1);
        self.ib.push(value);
    }

    /// Set the register at `reg` to a float, bit-copied.
    pub fn set_reg_f32(&mut self, reg: u32, value: f32) {
        self.set_reg(reg, value.to_bits());
    }

    /// Set `values.len()` consecutive registers starting at `reg` as one
    /// packet.
    pub fn set_regs(&mut self, reg: u32, values: &[u32]) {
        debug_assert!(!values.is_empty(), "register block write with no values");
        self.write_set_reg(reg, values.len() as u32);
        self.ib.extend_from_slice(values);
    }

    /// Reference the buffer `handle` from the current stream position.
    ///
    /// Each distinct handle gets exactly one relocation entry no matter how
    /// often it is referenced; repeated references OR the requested domains
    /// and flags into the entry. The emitted packet is a `NOP` whose
    /// payload word is the entry's dword offset inside the relocation chunk
    /// (entry index × [`RELOC_SIZE_DW`]), which is how the kernel locates
    /// the entry when patching the stream.
    pub fn write_reloc(
        &mut self,
        handle: BoHandle,
        read_domains: GemDomain,
        write_domain: GemDomain,
        flags: u32,
    ) {
        let index = self
            .relocs
            .insert_or_merge(handle, read_domains, write_domain, flags);
        self.ib
            .extend_from_slice(&[packet3(PACKET3_NOP, 0), index * RELOC_SIZE_DW]);
    }

    /// Set the two words of the flags chunk carried with the submission.
    pub fn set_flags(&mut self, flags: CsFlags, ring: CsRing) {
        self.flags = [flags.bits(), ring.as_word()];
    }

    /// Diagnostic rendering of the raw instruction words.
    pub fn hex_dump(&self) -> HexDump<'_> {
        HexDump::new(self.ib.as_words())
    }

    /// Hand the accumulated stream to the kernel for asynchronous
    /// execution.
    ///
    /// Builds the three-chunk descriptor (instruction buffer, relocations,
    /// flags) and performs the submission request; transient interruption
    /// is retried inside the device's request primitive, any other failure
    /// surfaces as [`CsError::Submit`]. The call does not wait for the GPU;
    /// completion is observed through the referenced buffer objects.
    ///
    /// Nothing stops a caller invoking `emit` twice, but the second call
    /// resubmits the same accumulated words.
    pub fn emit(&self) -> Result<()> {
        let ib_words = self.ib.as_words();
        let reloc_entries = self.relocs.entries();

        let chunks = [
            DrmRadeonCsChunk {
                chunk_id: uapi::RADEON_CHUNK_ID_IB,
                length_dw: ib_words.len() as u32,
                chunk_data: if ib_words.is_empty() {
                    0
                } else {
                    ib_words.as_ptr() as u64
                },
            },
            DrmRadeonCsChunk {
                chunk_id: uapi::RADEON_CHUNK_ID_RELOCS,
                length_dw: reloc_entries.len() as u32 * RELOC_SIZE_DW,
                chunk_data: if reloc_entries.is_empty() {
                    0
                } else {
                    reloc_entries.as_ptr() as u64
                },
            },
            DrmRadeonCsChunk {
                chunk_id: uapi::RADEON_CHUNK_ID_FLAGS,
                length_dw: self.flags.len() as u32,
                chunk_data: self.flags.as_ptr() as u64,
            },
        ];

        // The kernel reads the chunk array through one more indirection:
        // `chunks` holds user addresses of the chunk structs, not the
        // structs themselves.
        let chunk_ptrs = [
            &chunks[0] as *const DrmRadeonCsChunk as u64,
            &chunks[1] as *const DrmRadeonCsChunk as u64,
            &chunks[2] as *const DrmRadeonCsChunk as u64,
        ];

        let mut args = DrmRadeonCs {
            num_chunks: chunk_ptrs.len() as u64,
            cs_id: self.id.value() as u64,
            chunks: chunk_ptrs.as_ptr() as u64,
            gart_limit: 0,
            vram_limit: 0,
        };

        debug!(
            id = self.id.value(),
            ib_dw = ib_words.len(),
            relocs = reloc_entries.len(),
            "submitting command stream"
        );
        self.device.submit_cs(&mut args).map_err(CsError::Submit)
    }
}
