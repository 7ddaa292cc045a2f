use radeon_drm::ChipFamily;

use crate::packet::{self, packet0, packet3};

/// One register window: registers in `[start, end)` are set with the
/// class-relative type-3 packet carrying `opcode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRange {
    pub start: u32,
    /// One past the last register address of the window.
    pub end: u32,
    pub opcode: u32,
}

/// Packet header chosen for a register-set operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetRegPacket {
    /// Type-3 header followed by the register's word index within its
    /// window; `count` data words follow.
    Type3 { header: u32, offset: u32 },
    /// Type-0 header addressing the register directly; data words follow
    /// the header with no offset word.
    Type0 { header: u32 },
}

/// Register-window table and supported-generation span of one chip
/// generation.
///
/// A profile is plain data: adding a generation means adding a table, not a
/// type. The two shipped profiles are [`ChipProfile::R600`] and
/// [`ChipProfile::EVERGREEN`].
#[derive(Debug)]
pub struct ChipProfile {
    pub name: &'static str,
    first_family: ChipFamily,
    /// One past the last supported family.
    end_family: ChipFamily,
    ranges: &'static [RegisterRange],
}

impl ChipProfile {
    /// Families R600 through RV740 (pre-evergreen).
    pub const R600: ChipProfile = ChipProfile {
        name: "r600",
        first_family: ChipFamily::R600,
        end_family: ChipFamily::Cedar,
        ranges: &[
            RegisterRange { start: 0x0000_8000, end: 0x0000_ac00, opcode: packet::PACKET3_SET_CONFIG_REG },
            RegisterRange { start: 0x0002_8000, end: 0x0002_9000, opcode: packet::PACKET3_SET_CONTEXT_REG },
            RegisterRange { start: 0x0003_0000, end: 0x0003_2000, opcode: packet::PACKET3_SET_ALU_CONST },
            RegisterRange { start: 0x0003_e380, end: 0x0003_e38c, opcode: packet::PACKET3_SET_BOOL_CONST },
            RegisterRange { start: 0x0003_e200, end: 0x0003_e26c, opcode: packet::PACKET3_SET_LOOP_CONST },
            RegisterRange { start: 0x0003_8000, end: 0x0003_c000, opcode: packet::PACKET3_SET_RESOURCE },
            RegisterRange { start: 0x0003_c000, end: 0x0003_cff0, opcode: packet::PACKET3_SET_SAMPLER },
            RegisterRange { start: 0x0003_cff0, end: 0x0003_e200, opcode: packet::PACKET3_SET_CTL_CONST },
        ],
    };

    /// Families Cedar through Caicos. Evergreen has no ALU-const window;
    /// those constants moved to the resource path.
    pub const EVERGREEN: ChipProfile = ChipProfile {
        name: "evergreen",
        first_family: ChipFamily::Cedar,
        end_family: ChipFamily::Cayman,
        ranges: &[
            RegisterRange { start: 0x0000_8000, end: 0x0000_8b00, opcode: packet::PACKET3_SET_CONFIG_REG },
            RegisterRange { start: 0x0002_8000, end: 0x0002_9000, opcode: packet::PACKET3_SET_CONTEXT_REG },
            RegisterRange { start: 0x0003_a500, end: 0x0003_a518, opcode: packet::PACKET3_SET_BOOL_CONST },
            RegisterRange { start: 0x0003_a200, end: 0x0003_a26c, opcode: packet::PACKET3_SET_LOOP_CONST },
            RegisterRange { start: 0x0003_0000, end: 0x0003_8000, opcode: packet::PACKET3_SET_RESOURCE },
            RegisterRange { start: 0x0003_c000, end: 0x0003_c600, opcode: packet::PACKET3_SET_SAMPLER },
            RegisterRange { start: 0x0003_cff0, end: 0x0003_ff0c, opcode: packet::PACKET3_SET_CTL_CONST },
        ],
    };

    /// Whether `family` falls inside this profile's generation span.
    pub fn supports(&self, family: ChipFamily) -> bool {
        family >= self.first_family && family < self.end_family
    }

    /// The window table in priority order.
    pub fn ranges(&self) -> &'static [RegisterRange] {
        self.ranges
    }

    /// Select the packet encoding for setting `count` consecutive registers
    /// starting at address `reg`.
    ///
    /// Pure in `(reg, count)`: the table is scanned in declaration order and
    /// the first window containing `reg` wins; addresses outside every
    /// window get a direct type-0 write. `count` must be at least 1.
    pub fn set_reg_packet(&self, reg: u32, count: u32) -> SetRegPacket {
        debug_assert!(count >= 1, "register-set packet with zero registers");
        for range in self.ranges {
            if reg >= range.start && reg < range.end {
                return SetRegPacket::Type3 {
                    header: packet3(range.opcode, count),
                    offset: (reg - range.start) >> 2,
                };
            }
        }
        SetRegPacket::Type0 {
            header: packet0(reg, count - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r600_supports_pre_evergreen_families_only() {
        assert!(ChipProfile::R600.supports(ChipFamily::R600));
        assert!(ChipProfile::R600.supports(ChipFamily::Rv740));
        assert!(!ChipProfile::R600.supports(ChipFamily::Cedar));
        assert!(!ChipProfile::R600.supports(ChipFamily::Unknown));
    }

    #[test]
    fn evergreen_supports_cedar_to_caicos() {
        assert!(ChipProfile::EVERGREEN.supports(ChipFamily::Cedar));
        assert!(ChipProfile::EVERGREEN.supports(ChipFamily::Caicos));
        assert!(!ChipProfile::EVERGREEN.supports(ChipFamily::Rv740));
        assert!(!ChipProfile::EVERGREEN.supports(ChipFamily::Cayman));
    }

    #[test]
    fn in_window_addresses_use_word_relative_offsets() {
        match ChipProfile::R600.set_reg_packet(0x2_8100, 2) {
            SetRegPacket::Type3 { header, offset } => {
                assert_eq!(header, packet3(packet::PACKET3_SET_CONTEXT_REG, 2));
                assert_eq!(offset, (0x2_8100 - 0x2_8000) >> 2);
            }
            other => panic!("expected type-3, got {other:?}"),
        }
    }

    #[test]
    fn out_of_window_addresses_fall_back_to_type0() {
        match ChipProfile::R600.set_reg_packet(0x1234, 3) {
            SetRegPacket::Type0 { header } => assert_eq!(header, packet0(0x1234, 2)),
            other => panic!("expected type-0, got {other:?}"),
        }
    }

    #[test]
    fn window_boundaries_are_half_open() {
        // End of the sampler window is the start of the ctl-const window on
        // r600; the boundary address belongs to ctl-const.
        match ChipProfile::R600.set_reg_packet(0x3_cff0, 1) {
            SetRegPacket::Type3 { header, offset } => {
                assert_eq!(header, packet3(packet::PACKET3_SET_CTL_CONST, 1));
                assert_eq!(offset, 0);
            }
            other => panic!("expected type-3, got {other:?}"),
        }
        match ChipProfile::R600.set_reg_packet(0x3_cfec, 1) {
            SetRegPacket::Type3 { header, .. } => {
                assert_eq!(header, packet3(packet::PACKET3_SET_SAMPLER, 1));
            }
            other => panic!("expected type-3, got {other:?}"),
        }
    }

    #[test]
    fn generations_disagree_on_window_ownership() {
        // 0x30000 is ALU-const space on r600 but resource space on
        // evergreen.
        match ChipProfile::R600.set_reg_packet(0x3_0000, 1) {
            SetRegPacket::Type3 { header, .. } => {
                assert_eq!(header, packet3(packet::PACKET3_SET_ALU_CONST, 1));
            }
            other => panic!("expected type-3, got {other:?}"),
        }
        match ChipProfile::EVERGREEN.set_reg_packet(0x3_0000, 1) {
            SetRegPacket::Type3 { header, .. } => {
                assert_eq!(header, packet3(packet::PACKET3_SET_RESOURCE, 1));
            }
            other => panic!("expected type-3, got {other:?}"),
        }
        // The r600 bool-const window is plain address space on evergreen.
        assert!(matches!(
            ChipProfile::EVERGREEN.set_reg_packet(0x3_e380, 1),
            SetRegPacket::Type0 { .. }
        ));
    }

    #[test]
    fn dispatch_is_deterministic() {
        let a = ChipProfile::EVERGREEN.set_reg_packet(0x2_8230, 4);
        let b = ChipProfile::EVERGREEN.set_reg_packet(0x2_8230, 4);
        assert_eq!(a, b);
    }

    #[test]
    fn windows_within_a_profile_do_not_overlap() {
        for profile in [&ChipProfile::R600, &ChipProfile::EVERGREEN] {
            let ranges = profile.ranges();
            for (i, a) in ranges.iter().enumerate() {
                assert!(a.start < a.end, "{}: empty window {a:?}", profile.name);
                for b in &ranges[i + 1..] {
                    assert!(
                        a.end <= b.start || b.end <= a.start,
                        "{}: {a:?} overlaps {b:?}",
                        profile.name
                    );
                }
            }
        }
    }
}
