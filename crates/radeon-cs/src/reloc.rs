use std::collections::hash_map::Entry;
use std::collections::HashMap;

use radeon_drm::uapi::{DrmRadeonCsReloc, GemDomain};
use radeon_drm::BoHandle;

/// Size of one relocation entry in dwords, as the kernel counts the
/// relocation chunk.
pub const RELOC_SIZE_DW: u32 =
    (core::mem::size_of::<DrmRadeonCsReloc>() / core::mem::size_of::<u32>()) as u32;

/// Deduplicated, insertion-ordered relocation entries of one stream.
///
/// Entry order is frozen at first reference: the instruction stream encodes
/// an entry's position, not its handle, so entries must never move once an
/// index has been handed out.
#[derive(Debug, Default)]
pub struct RelocationTable {
    entries: Vec<DrmRadeonCsReloc>,
    index_by_handle: HashMap<BoHandle, u32>,
}

impl RelocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference to `handle` and return the entry's index.
    ///
    /// The first reference appends an entry; later references OR the
    /// domains and flags into it, widening access but never narrowing.
    pub fn insert_or_merge(
        &mut self,
        handle: BoHandle,
        read_domains: GemDomain,
        write_domain: GemDomain,
        flags: u32,
    ) -> u32 {
        match self.index_by_handle.entry(handle) {
            Entry::Occupied(slot) => {
                let index = *slot.get();
                let entry = &mut self.entries[index as usize];
                entry.read_domains |= read_domains.bits();
                entry.write_domain |= write_domain.bits();
                entry.flags |= flags;
                index
            }
            Entry::Vacant(slot) => {
                let index = self.entries.len() as u32;
                slot.insert(index);
                self.entries.push(DrmRadeonCsReloc {
                    handle,
                    read_domains: read_domains.bits(),
                    write_domain: write_domain.bits(),
                    flags,
                });
                index
            }
        }
    }

    /// Number of distinct buffers referenced.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-reference order, ready to ship as the relocation
    /// chunk.
    pub fn entries(&self) -> &[DrmRadeonCsReloc] {
        &self.entries
    }

    /// The entry index previously assigned to `handle`, if any.
    pub fn index_of(&self, handle: BoHandle) -> Option<u32> {
        self.index_by_handle.get(&handle).copied()
    }
}
