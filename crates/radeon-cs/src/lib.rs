//! In-memory PM4 command streams for radeon GEM devices.
//!
//! A [`CommandStream`] accumulates 32-bit instruction words, register-set
//! packets chosen per chip generation, and relocation references to buffer
//! objects, then hands the whole batch to the kernel for asynchronous
//! execution.
//!
//! Currently this crate provides:
//! - An append-only instruction buffer of 32-bit words (see
//!   [`InstructionBuffer`]).
//! - PM4 packet word encodings (see [`packet`]).
//! - Per-generation register-window tables and packet selection (see
//!   [`ChipProfile`]).
//! - Relocation tracking with per-buffer dedup and access widening (see
//!   [`RelocationTable`]).
//! - Stream-id allocation over a shared atomic bitmask (see
//!   [`StreamIdAllocator`]).
//! - The stream builder and the kernel submission path (see
//!   [`CommandStream`]).

pub mod packet;

mod error;
mod hexdump;
mod ib;
mod profile;
mod reloc;
mod stream;
mod stream_id;

pub use error::{CsError, Result};
pub use hexdump::HexDump;
pub use ib::InstructionBuffer;
pub use profile::{ChipProfile, RegisterRange, SetRegPacket};
pub use reloc::{RelocationTable, RELOC_SIZE_DW};
pub use stream::{CommandStream, CsFlags, CsRing, CsTarget};
pub use stream_id::{StreamId, StreamIdAllocator};

pub use radeon_drm::uapi::GemDomain;
pub use radeon_drm::{BoHandle, ChipFamily};
