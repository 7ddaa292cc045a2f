use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use radeon_cs::{
    ChipFamily, ChipProfile, CommandStream, CsTarget, GemDomain, StreamIdAllocator,
};
use radeon_drm::uapi::DrmRadeonCs;
use radeon_drm::DrmError;

struct NullTarget;

impl CsTarget for NullTarget {
    fn family(&self) -> ChipFamily {
        ChipFamily::Cedar
    }

    fn submit_cs(&self, _args: &mut DrmRadeonCs) -> Result<(), DrmError> {
        Ok(())
    }
}

fn bench_register_packets(c: &mut Criterion) {
    let target = NullTarget;
    let alloc = Arc::new(StreamIdAllocator::new());

    c.bench_function("set_reg_1k_context", |b| {
        b.iter(|| {
            let mut cs =
                CommandStream::with_allocator(&target, &ChipProfile::EVERGREEN, &alloc).unwrap();
            for i in 0..1024u32 {
                cs.set_reg(black_box(0x2_8000 + (i % 0x400) * 4), black_box(i));
            }
            black_box(cs.len())
        })
    });

    c.bench_function("reloc_heavy_stream", |b| {
        b.iter(|| {
            let mut cs =
                CommandStream::with_allocator(&target, &ChipProfile::EVERGREEN, &alloc).unwrap();
            for i in 0..1024u32 {
                // 16 distinct buffers referenced over and over: the dedup
                // path dominates.
                cs.write_reloc(black_box(i % 16), GemDomain::VRAM, GemDomain::empty(), 0);
            }
            black_box(cs.relocations().len())
        })
    });
}

criterion_group!(benches, bench_register_packets);
criterion_main!(benches);
