use super::sprite::SpriteAttributes;

/// One of the eight per-line sprite output units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
struct SpriteSlot {
    pattern_low: u8,
    pattern_high: u8,
    attributes: SpriteAttributes,
    /// Dots left before the shifters start.
    x_counter: u8,
    sprite0: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub(crate) struct SpritePixel {
    pub(crate) palette: u8,
    /// 0 means transparent.
    pub(crate) color: u8,
    pub(crate) behind_background: bool,
    pub(crate) sprite0: bool,
}

/// Sprite output units for the scanline being drawn. Lower slots win.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SpritePipeline {
    slots: [SpriteSlot; 8],
    active: u8,
}

impl SpritePipeline {
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Loads slot `i` with fetched pattern bytes. Horizontal flip is applied
    /// here so output always shifts left.
    pub(crate) fn load(&mut self, i: usize, low: u8, high: u8, attributes: u8, x: u8, sprite0: bool) {
        let attributes = SpriteAttributes::from_bits_retain(attributes);
        let (low, high) = if attributes.contains(SpriteAttributes::FLIP_HORIZONTAL) {
            (low.reverse_bits(), high.reverse_bits())
        } else {
            (low, high)
        };
        self.slots[i] = SpriteSlot {
            pattern_low: low,
            pattern_high: high,
            attributes,
            x_counter: x,
            sprite0,
        };
        self.active = self.active.max(i as u8 + 1);
    }

    /// Front-most opaque sprite pixel for this dot; advances every slot.
    pub(crate) fn sample_and_shift(&mut self) -> SpritePixel {
        let mut chosen: Option<SpritePixel> = None;
        for slot in self.slots.iter_mut().take(self.active as usize) {
            if slot.x_counter > 0 {
                slot.x_counter -= 1;
                continue;
            }
            let color = (slot.pattern_high >> 7) << 1 | (slot.pattern_low >> 7);
            if chosen.is_none() && color != 0 {
                chosen = Some(SpritePixel {
                    palette: slot.attributes.palette(),
                    color,
                    behind_background: slot
                        .attributes
                        .contains(SpriteAttributes::BEHIND_BACKGROUND),
                    sprite0: slot.sprite0,
                });
            }
            slot.pattern_low <<= 1;
            slot.pattern_high <<= 1;
        }
        chosen.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_counter_delays_output() {
        let mut sprites = SpritePipeline::default();
        sprites.load(0, 0xFF, 0x00, 0x01, 3, true);
        for _ in 0..3 {
            assert_eq!(sprites.sample_and_shift().color, 0);
        }
        let px = sprites.sample_and_shift();
        assert_eq!((px.color, px.palette, px.sprite0), (1, 1, true));
    }

    #[test]
    fn lower_slot_wins_and_flip_reverses() {
        let mut sprites = SpritePipeline::default();
        sprites.load(0, 0x01, 0x00, 0x40, 0, false); // flipped: leftmost pixel set
        sprites.load(1, 0xFF, 0xFF, 0x02, 0, false);
        let px = sprites.sample_and_shift();
        assert_eq!((px.color, px.palette), (1, 0));
        let px = sprites.sample_and_shift();
        assert_eq!((px.color, px.palette), (3, 2));
    }
}
