use std::sync::Arc;

use radeon_cs::packet::{packet0, packet3, PACKET3_SET_CONFIG_REG, PACKET3_SET_CONTEXT_REG};
use radeon_cs::{
    ChipFamily, ChipProfile, CommandStream, CsTarget, StreamIdAllocator,
};
use radeon_drm::uapi::DrmRadeonCs;
use radeon_drm::DrmError;

/// Minimal device stand-in: a chip family and a submission that must never
/// be reached by these tests.
struct FakeTarget {
    family: ChipFamily,
}

impl CsTarget for FakeTarget {
    fn family(&self) -> ChipFamily {
        self.family
    }

    fn submit_cs(&self, _args: &mut DrmRadeonCs) -> Result<(), DrmError> {
        panic!("encoding tests must not submit");
    }
}

fn r600_stream(target: &FakeTarget) -> CommandStream<'_, FakeTarget> {
    let alloc = Arc::new(StreamIdAllocator::new());
    CommandStream::with_allocator(target, &ChipProfile::R600, &alloc).unwrap()
}

#[test]
fn context_reg_block_emits_type3_with_window_offset() {
    let target = FakeTarget {
        family: ChipFamily::Rv770,
    };
    let mut cs = r600_stream(&target);
    cs.set_regs(0x2_8100, &[0x1111_1111, 0x2222_2222]);
    assert_eq!(
        cs.as_words(),
        &[
            packet3(PACKET3_SET_CONTEXT_REG, 2),
            0x40,
            0x1111_1111,
            0x2222_2222,
        ]
    );
}

#[test]
fn unmapped_register_emits_type0_with_raw_address() {
    let target = FakeTarget {
        family: ChipFamily::R600,
    };
    let mut cs = r600_stream(&target);
    cs.set_regs(0x1234, &[7, 8, 9]);
    assert_eq!(cs.as_words(), &[packet0(0x1234, 2), 7, 8, 9]);
}

#[test]
fn scalar_and_float_forms_share_the_header_encoding() {
    let target = FakeTarget {
        family: ChipFamily::Rv630,
    };
    let mut cs = r600_stream(&target);
    cs.set_reg(0x2_8000, 5);
    cs.set_reg_f32(0x2_8004, 1.0);
    assert_eq!(
        cs.as_words(),
        &[
            packet3(PACKET3_SET_CONTEXT_REG, 1),
            0x0,
            5,
            packet3(PACKET3_SET_CONTEXT_REG, 1),
            0x1,
            0x3f80_0000,
        ]
    );
}

#[test]
fn encoding_is_independent_of_call_history() {
    let target = FakeTarget {
        family: ChipFamily::Rs880,
    };

    let mut warmed = r600_stream(&target);
    warmed.set_regs(0x8000, &[1, 2, 3, 4]);
    warmed.write(0xdead_beef);
    let before = warmed.len();
    warmed.set_regs(0x2_8100, &[0xa, 0xb]);
    let from_warmed = warmed.as_words()[before..].to_vec();

    let mut fresh = r600_stream(&target);
    fresh.set_regs(0x2_8100, &[0xa, 0xb]);

    assert_eq!(from_warmed, fresh.as_words());
}

#[test]
fn generations_encode_the_same_address_differently() {
    // 0x8c00 is config space on r600 but past the narrower evergreen
    // config window, so evergreen falls back to a direct write.
    let r600_dev = FakeTarget {
        family: ChipFamily::R600,
    };
    let eg_dev = FakeTarget {
        family: ChipFamily::Cedar,
    };
    let alloc = Arc::new(StreamIdAllocator::new());

    let mut r600 = CommandStream::with_allocator(&r600_dev, &ChipProfile::R600, &alloc).unwrap();
    r600.set_reg(0x8c00, 1);
    assert_eq!(
        r600.as_words()[0],
        packet3(PACKET3_SET_CONFIG_REG, 1),
    );

    let mut eg = CommandStream::with_allocator(&eg_dev, &ChipProfile::EVERGREEN, &alloc).unwrap();
    eg.set_reg(0x8c00, 1);
    assert_eq!(eg.as_words()[0], packet0(0x8c00, 0));
}

#[test]
fn plain_writes_pass_words_through_untouched() {
    let target = FakeTarget {
        family: ChipFamily::Rv670,
    };
    let mut cs = r600_stream(&target);
    cs.write(0xffff_ffff);
    cs.write_f32(-0.0);
    cs.write_all(&[1, 2]);
    assert_eq!(cs.as_words(), &[0xffff_ffff, 0x8000_0000, 1, 2]);
}

#[test]
fn hex_dump_renders_word_indexed_rows() {
    let target = FakeTarget {
        family: ChipFamily::R600,
    };
    let mut cs = r600_stream(&target);
    cs.write_all(&[0x1, 0x2, 0x3, 0x4, 0x5]);
    assert_eq!(
        cs.hex_dump().to_string(),
        "000000:\t00000001\t00000002\t00000003\t00000004\n000004:\t00000005"
    );
}
