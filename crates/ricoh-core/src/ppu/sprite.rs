use bitflags::bitflags;

bitflags! {
    /// Sprite byte 2.
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// V H P . . . p p
    /// ```
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct SpriteAttributes: u8 {
        const PALETTE = 0b0000_0011;
        /// Drawn behind opaque background pixels.
        const BEHIND_BACKGROUND = 0b0010_0000;
        const FLIP_HORIZONTAL = 0b0100_0000;
        const FLIP_VERTICAL = 0b1000_0000;
    }
}

impl SpriteAttributes {
    pub(crate) fn palette(self) -> u8 {
        self.bits() & 0b11
    }
}

/// Bits 2-4 of the attribute byte do not exist in OAM.
pub(crate) const ATTRIBUTE_READ_MASK: u8 = 0xE3;

/// Pattern-table address of `row` (already flipped) of a sprite's tile.
/// 8x16 sprites take their table from bit 0 of the tile number.
pub(crate) fn pattern_addr(tile: u8, row: u16, height: u16, table_8x8: u16) -> u16 {
    if height == 16 {
        let table = (tile as u16 & 1) * 0x1000;
        let tile = (tile & 0xFE) as u16 + (row >> 3);
        table + tile * 16 + (row & 7)
    } else {
        table_8x8 + tile as u16 * 16 + row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tall_sprites_pick_table_from_tile_bit_zero() {
        assert_eq!(pattern_addr(0x03, 0, 16, 0), 0x1020);
        assert_eq!(pattern_addr(0x03, 9, 16, 0), 0x1031);
        assert_eq!(pattern_addr(0x03, 2, 8, 0x1000), 0x1032);
    }
}
