//! Picture Processing Unit (PPU).
//!
//! A dot-stepped model of the 2C02/2C07. Each call to [`Ppu::clock`]
//! performs the memory fetches, shifter updates and pixel output of one dot
//! and then advances the `(scanline, dot)` counter. Rendering follows the
//! NESdev frame timing diagram: background tiles are fetched in 8-dot cells,
//! sprites are evaluated into secondary OAM during the visible part of a
//! line and their patterns fetched during dots 257-320.

mod background_pipeline;
pub mod bus;
mod frame;
mod open_bus;
mod registers;
mod sprite;
mod sprite_pipeline;
mod sprite_state;

use core::fmt;
use std::ops::RangeInclusive;

use crate::{
    cartridge::{Cartridge, header::Mirroring},
    config::Region,
    error::RegistrationError,
    memory::ppu::{self as ppu_mem, Register as PpuRegister},
};

pub use bus::{PpuBus, PpuDevice};
pub use frame::{FRAME_HEIGHT, FRAME_PIXELS, FRAME_WIDTH, FrameBuffer};

use background_pipeline::BgPipeline;
use open_bus::PpuOpenBus;
use registers::{Mask, Registers, Status};
use sprite::{ATTRIBUTE_READ_MASK, SpriteAttributes};
use sprite_pipeline::SpritePipeline;
use sprite_state::SpriteEvaluation;

pub const DOTS_PER_SCANLINE: u16 = 341;
pub const VISIBLE_SCANLINES: u16 = 240;
pub const VBLANK_SCANLINE: u16 = 241;

#[derive(Clone)]
pub struct Ppu {
    region: Region,
    pre_render_line: u16,
    regs: Registers,
    bus: PpuBus,
    oam: [u8; ppu_mem::OAM_SIZE],
    evaluation: SpriteEvaluation,
    sprites: SpritePipeline,
    /// Pattern low byte of the sprite slot being fetched.
    sprite_low: u8,
    background: BgPipeline,
    open_bus: PpuOpenBus,
    scanline: u16,
    dot: u16,
    frame: u64,
    odd_frame: bool,
    /// Dots since power-on; the time base mappers see.
    master_dot: u64,
    /// A `$2002` read landed on the dot that sets vblank.
    suppress_vblank: bool,
    /// Frame being drawn and the last completed one.
    back: FrameBuffer,
    front: FrameBuffer,
}

impl fmt::Debug for Ppu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ppu")
            .field("region", &self.region)
            .field("registers", &self.regs)
            .field("scanline", &self.scanline)
            .field("dot", &self.dot)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl Ppu {
    /// `chr_window` is the pattern range the cartridge decodes.
    pub fn new(region: Region, chr_window: RangeInclusive<u16>) -> Result<Self, RegistrationError> {
        Ok(Self {
            region,
            pre_render_line: region.scanlines() - 1,
            regs: Registers::default(),
            bus: PpuBus::new(chr_window)?,
            oam: [0; ppu_mem::OAM_SIZE],
            evaluation: SpriteEvaluation::default(),
            sprites: SpritePipeline::default(),
            sprite_low: 0,
            background: BgPipeline::default(),
            open_bus: PpuOpenBus::default(),
            scanline: 0,
            dot: 0,
            frame: 0,
            odd_frame: false,
            master_dot: 0,
            suppress_vblank: false,
            back: FrameBuffer::new(),
            front: FrameBuffer::new(),
        })
    }

    /// Power cycle: memories, registers and counters start over. Nametable
    /// routing is kept.
    pub fn power_on(&mut self) {
        self.master_dot = 0;
        self.regs = Registers::default();
        self.bus.clear();
        self.oam.fill(0);
        self.evaluation = SpriteEvaluation::default();
        self.sprites.clear();
        self.background = BgPipeline::default();
        self.open_bus = PpuOpenBus::default();
        self.scanline = 0;
        self.dot = 0;
        self.frame = 0;
        self.odd_frame = false;
        self.suppress_vblank = false;
        self.back.clear();
        self.front.clear();
    }

    /// Reset button: control, mask and the write toggle clear; memories and
    /// the raster position are untouched.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.odd_frame = false;
    }

    pub fn route_nametables(&mut self, mirroring: Mirroring) {
        tracing::debug!(?mirroring, "nametables rerouted");
        self.bus.route_nametables(mirroring);
    }

    /// `(scanline, dot)` of the next dot to be clocked.
    pub fn position(&self) -> (u16, u16) {
        (self.scanline, self.dot)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn master_dot(&self) -> u64 {
        self.master_dot
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Last completed frame.
    pub fn frame(&self) -> &FrameBuffer {
        &self.front
    }

    pub fn oam(&self) -> &[u8; ppu_mem::OAM_SIZE] {
        &self.oam
    }

    /// Level of the PPU's /NMI output, active high.
    pub fn nmi_line(&self) -> bool {
        self.regs.status.contains(Status::VERTICAL_BLANK) && self.regs.control.nmi_enabled()
    }

    fn rendering(&self) -> bool {
        self.regs.mask.rendering_enabled()
    }

    /// Lines on which the fetch pipeline runs.
    fn on_render_line(&self) -> bool {
        self.scanline < VISIBLE_SCANLINES || self.scanline == self.pre_render_line
    }

    // ---- CPU port ---------------------------------------------------------

    /// CPU read of `reg`, with its side effects.
    pub fn cpu_read(&mut self, reg: PpuRegister, cartridge: &mut Cartridge) -> u8 {
        let frame = self.frame;
        match reg {
            PpuRegister::Status => {
                if self.position() == (VBLANK_SCANLINE, 1) {
                    self.suppress_vblank = true;
                }
                let value =
                    (self.regs.status.bits() & 0xE0) | (self.open_bus.value(frame) & 0x1F);
                self.regs.status.remove(Status::VERTICAL_BLANK);
                self.regs.scroll.w = false;
                self.open_bus.drive(0xE0, value, frame);
                value
            }
            PpuRegister::OamData => {
                let value = self.oam_data();
                self.open_bus.drive(0xFF, value, frame);
                value
            }
            PpuRegister::Data => {
                let addr = self.regs.scroll.v.bus_addr();
                let dot = self.master_dot;
                let value = if addr >= ppu_mem::PALETTE_BASE {
                    // Palette data comes straight out; the buffer picks up
                    // the nametable byte underneath.
                    let entry = self.bus.read(addr, cartridge, dot);
                    self.regs.read_buffer = self.bus.read(addr - 0x1000, cartridge, dot);
                    let value = entry | (self.open_bus.value(frame) & 0xC0);
                    self.open_bus.drive(0x3F, value, frame);
                    value
                } else {
                    let value = self.regs.read_buffer;
                    self.regs.read_buffer = self.bus.read(addr, cartridge, dot);
                    self.open_bus.drive(0xFF, value, frame);
                    value
                };
                self.step_vram_addr();
                value
            }
            _ => self.open_bus.value(frame),
        }
    }

    /// What a CPU read would return, without side effects.
    pub fn peek_register(&self, reg: PpuRegister) -> u8 {
        let open = self.open_bus.value(self.frame);
        match reg {
            PpuRegister::Status => (self.regs.status.bits() & 0xE0) | (open & 0x1F),
            PpuRegister::OamData => self.oam_data(),
            PpuRegister::Data => {
                let addr = self.regs.scroll.v.bus_addr();
                if addr >= ppu_mem::PALETTE_BASE {
                    self.bus.palette_entry(addr) | (open & 0xC0)
                } else {
                    self.regs.read_buffer
                }
            }
            _ => open,
        }
    }

    pub fn cpu_write(&mut self, reg: PpuRegister, value: u8, cartridge: &mut Cartridge) {
        self.open_bus.drive(0xFF, value, self.frame);
        match reg {
            PpuRegister::Control => self.regs.write_control(value),
            PpuRegister::Mask => self.regs.mask = Mask::from_bits_retain(value),
            PpuRegister::Status => {}
            PpuRegister::OamAddr => self.regs.oam_addr = value,
            PpuRegister::OamData => self.write_oam_data(value),
            PpuRegister::Scroll => self.regs.scroll.write_scroll(value),
            PpuRegister::Addr => self.regs.scroll.write_addr(value),
            PpuRegister::Data => {
                let addr = self.regs.scroll.v.bus_addr();
                self.bus.write(addr, value, cartridge, self.master_dot);
                self.step_vram_addr();
            }
        }
    }

    /// One byte of an OAM DMA transfer; identical to a `$2004` write.
    pub fn write_oam_dma_byte(&mut self, value: u8) {
        self.write_oam_data(value);
    }

    fn oam_data(&self) -> u8 {
        let clearing = self.rendering()
            && self.scanline < VISIBLE_SCANLINES
            && (1..=64).contains(&self.dot);
        if clearing {
            return 0xFF;
        }
        let addr = self.regs.oam_addr;
        let value = self.oam[addr as usize];
        if addr & 3 == 2 {
            value & ATTRIBUTE_READ_MASK
        } else {
            value
        }
    }

    fn write_oam_data(&mut self, value: u8) {
        if self.rendering() && self.on_render_line() {
            // The write is lost but the address still moves on a sprite.
            self.regs.oam_addr = self.regs.oam_addr.wrapping_add(4);
            return;
        }
        self.oam[self.regs.oam_addr as usize] = value;
        self.regs.oam_addr = self.regs.oam_addr.wrapping_add(1);
    }

    /// `$2007` access step. While rendering the access collides with the
    /// fetch pipeline and bumps both coarse X and Y instead.
    fn step_vram_addr(&mut self) {
        if self.rendering() && self.on_render_line() {
            self.regs.scroll.v.increment_x();
            self.regs.scroll.v.increment_y();
        } else {
            let step = self.regs.control.vram_increment();
            self.regs.scroll.v.increment(step);
        }
    }

    // ---- dot clock --------------------------------------------------------

    /// Runs one dot. Returns `true` when this dot completed a frame, which
    /// is then available from [`Ppu::frame`].
    pub fn clock(&mut self, cartridge: &mut Cartridge) -> bool {
        if self.rendering() && self.on_render_line() {
            self.render_dot(cartridge);
        }
        if self.scanline < VISIBLE_SCANLINES && (1..=256).contains(&self.dot) {
            self.output_pixel();
        }

        if self.dot == 1 {
            if self.scanline == VBLANK_SCANLINE {
                if !self.suppress_vblank {
                    self.regs.status.insert(Status::VERTICAL_BLANK);
                }
                self.suppress_vblank = false;
            } else if self.scanline == self.pre_render_line {
                self.regs.status.remove(
                    Status::VERTICAL_BLANK | Status::SPRITE_ZERO_HIT | Status::SPRITE_OVERFLOW,
                );
            }
        }

        self.master_dot += 1;
        self.advance()
    }

    fn advance(&mut self) -> bool {
        self.dot += 1;
        let skip_last_dot = self.scanline == self.pre_render_line
            && self.dot == DOTS_PER_SCANLINE - 1
            && self.odd_frame
            && !self.region.is_pal()
            && self.regs.mask.contains(Mask::SHOW_BACKGROUND);
        if skip_last_dot {
            self.dot = DOTS_PER_SCANLINE;
        }
        if self.dot < DOTS_PER_SCANLINE {
            return false;
        }

        self.dot = 0;
        self.scanline += 1;
        if self.scanline <= self.pre_render_line {
            return false;
        }

        self.scanline = 0;
        self.frame += 1;
        self.odd_frame = !self.odd_frame;
        std::mem::swap(&mut self.back, &mut self.front);
        tracing::trace!(frame = self.frame, "frame complete");
        true
    }

    fn render_dot(&mut self, cartridge: &mut Cartridge) {
        let dot = self.dot;
        let pre_render = self.scanline == self.pre_render_line;

        if !pre_render {
            if (1..=64).contains(&dot) {
                self.evaluation.clear_step(dot);
            } else if (66..=256).contains(&dot) && dot % 2 == 0 {
                let height = self.regs.control.sprite_height();
                if self.evaluation.step(&self.oam, self.scanline, height) {
                    self.regs.status.insert(Status::SPRITE_OVERFLOW);
                }
            }
        }

        if (2..=257).contains(&dot) || (321..=337).contains(&dot) {
            self.background.shift();
            match (dot - 1) % 8 {
                0 => {
                    self.background.reload();
                    let addr = self.regs.scroll.v.tile_addr();
                    self.background.next_tile = self.fetch(addr, cartridge);
                }
                2 => {
                    let v = self.regs.scroll.v;
                    let byte = self.fetch(v.attribute_addr(), cartridge);
                    self.background.next_palette = (byte >> v.attribute_shift()) & 0b11;
                }
                4 => {
                    let addr = self.background_pattern_addr();
                    self.background.next_low = self.fetch(addr, cartridge);
                }
                6 => {
                    let addr = self.background_pattern_addr() + 8;
                    self.background.next_high = self.fetch(addr, cartridge);
                }
                7 => self.regs.scroll.v.increment_x(),
                _ => {}
            }
        }

        match dot {
            256 => self.regs.scroll.v.increment_y(),
            257 => {
                let t = self.regs.scroll.t;
                self.regs.scroll.v.copy_horizontal(t);
                self.sprites.clear();
            }
            280..=304 if pre_render => {
                let t = self.regs.scroll.t;
                self.regs.scroll.v.copy_vertical(t);
            }
            338 | 340 => {
                let addr = self.regs.scroll.v.tile_addr();
                self.background.next_tile = self.fetch(addr, cartridge);
            }
            _ => {}
        }

        if (257..=320).contains(&dot) {
            self.regs.oam_addr = 0;
            let offset = dot - 257;
            if offset % 8 == 4 || offset % 8 == 6 {
                self.fetch_sprite_pattern((offset / 8) as usize, offset % 8 == 6, cartridge);
            }
        }
    }

    fn background_pattern_addr(&self) -> u16 {
        self.regs.control.background_pattern_table()
            + self.background.next_tile as u16 * 16
            + self.regs.scroll.v.fine_y()
    }

    fn fetch(&mut self, addr: u16, cartridge: &mut Cartridge) -> u8 {
        self.bus.read(addr, cartridge, self.master_dot)
    }

    /// Pattern fetch for sprite slot `slot`. Empty slots fetch tile `$FF` so
    /// the mapper still sees the address-line pattern of eight fetches.
    fn fetch_sprite_pattern(&mut self, slot: usize, high: bool, cartridge: &mut Cartridge) {
        let height = self.regs.control.sprite_height();
        let count = if self.scanline == self.pre_render_line {
            0
        } else {
            self.evaluation.count() as usize
        };
        let [y, tile, attributes, x] = if slot < count {
            self.evaluation.slot(slot)
        } else {
            [0xFF; 4]
        };
        let row = if slot < count {
            let row = self.scanline.wrapping_sub(y as u16);
            let flip = SpriteAttributes::from_bits_retain(attributes)
                .contains(SpriteAttributes::FLIP_VERTICAL);
            if flip { height - 1 - row } else { row }
        } else {
            0
        };
        let addr = sprite::pattern_addr(tile, row, height, self.regs.control.sprite_pattern_table())
            + if high { 8 } else { 0 };
        let byte = self.fetch(addr, cartridge);

        if !high {
            self.sprite_low = byte;
        } else if slot < count {
            let sprite0 = slot == 0 && self.evaluation.sprite0_in_range();
            self.sprites
                .load(slot, self.sprite_low, byte, attributes, x, sprite0);
        }
    }

    fn output_pixel(&mut self) {
        let x = (self.dot - 1) as usize;
        let mask = self.regs.mask;

        let index = if mask.rendering_enabled() {
            let (bg_palette, bg_color) = if mask.background_visible_at(x) {
                self.background.sample(self.regs.scroll.x)
            } else {
                (0, 0)
            };
            let sprite = self.sprites.sample_and_shift();
            let sprite = if mask.sprites_visible_at(x) {
                sprite
            } else {
                Default::default()
            };

            if sprite.sprite0 && sprite.color != 0 && bg_color != 0 && x != 255 {
                self.regs.status.insert(Status::SPRITE_ZERO_HIT);
            }

            let sprite_addr = 0x3F10 | (sprite.palette as u16) << 2 | sprite.color as u16;
            let bg_addr = 0x3F00 | (bg_palette as u16) << 2 | bg_color as u16;
            let addr = match (bg_color, sprite.color) {
                (0, 0) => ppu_mem::PALETTE_BASE,
                (0, _) => sprite_addr,
                (_, 0) => bg_addr,
                _ if sprite.behind_background => bg_addr,
                _ => sprite_addr,
            };
            self.bus.palette_entry(addr)
        } else {
            // With rendering off the backdrop shows, unless v points into
            // palette RAM, in which case that entry does.
            let v = self.regs.scroll.v.bus_addr();
            if v >= ppu_mem::PALETTE_BASE {
                self.bus.palette_entry(v)
            } else {
                self.bus.palette_entry(ppu_mem::PALETTE_BASE)
            }
        };

        self.back
            .set(x, self.scanline as usize, index & mask.color_mask());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::nrom_image;

    fn rig() -> (Ppu, Cartridge) {
        // CHR RAM so tests can draw tiles.
        let cartridge = Cartridge::load(&nrom_image(1, 0, |_| 0)).unwrap();
        let mut ppu = Ppu::new(Region::Ntsc, cartridge.ppu_mappings()).unwrap();
        ppu.route_nametables(cartridge.mirroring());
        (ppu, cartridge)
    }

    fn set_addr(ppu: &mut Ppu, cart: &mut Cartridge, addr: u16) {
        ppu.cpu_write(PpuRegister::Addr, (addr >> 8) as u8, cart);
        ppu.cpu_write(PpuRegister::Addr, addr as u8, cart);
    }

    fn poke(ppu: &mut Ppu, cart: &mut Cartridge, addr: u16, bytes: &[u8]) {
        set_addr(ppu, cart, addr);
        for &b in bytes {
            ppu.cpu_write(PpuRegister::Data, b, cart);
        }
    }

    fn run_to(ppu: &mut Ppu, cart: &mut Cartridge, position: (u16, u16)) {
        while ppu.position() != position {
            ppu.clock(cart);
        }
    }

    fn frame_length(ppu: &mut Ppu, cart: &mut Cartridge) -> u32 {
        let mut dots = 1;
        while !ppu.clock(cart) {
            dots += 1;
        }
        dots
    }

    #[test]
    fn buffered_ppu_data_read() {
        let (mut ppu, mut cart) = rig();
        poke(&mut ppu, &mut cart, 0x2000, &[0x11, 0x22]);
        set_addr(&mut ppu, &mut cart, 0x2000);
        let stale = ppu.cpu_read(PpuRegister::Data, &mut cart);
        assert_eq!(stale, 0);
        assert_eq!(ppu.cpu_read(PpuRegister::Data, &mut cart), 0x11);
        assert_eq!(ppu.cpu_read(PpuRegister::Data, &mut cart), 0x22);
    }

    #[test]
    fn palette_reads_bypass_buffer_and_mirror() {
        let (mut ppu, mut cart) = rig();
        poke(&mut ppu, &mut cart, 0x3F10, &[0x2A]);
        set_addr(&mut ppu, &mut cart, 0x3F00);
        assert_eq!(ppu.cpu_read(PpuRegister::Data, &mut cart) & 0x3F, 0x2A);
        set_addr(&mut ppu, &mut cart, 0x3FF0);
        assert_eq!(ppu.cpu_read(PpuRegister::Data, &mut cart) & 0x3F, 0x2A);
    }

    #[test]
    fn increment_32_walks_down_a_column() {
        let (mut ppu, mut cart) = rig();
        ppu.cpu_write(PpuRegister::Control, 0x04, &mut cart);
        poke(&mut ppu, &mut cart, 0x2000, &[1, 2]);
        ppu.cpu_write(PpuRegister::Control, 0x00, &mut cart);
        set_addr(&mut ppu, &mut cart, 0x2020);
        let _ = ppu.cpu_read(PpuRegister::Data, &mut cart);
        assert_eq!(ppu.cpu_read(PpuRegister::Data, &mut cart), 2);
    }

    #[test]
    fn horizontal_mirroring_shares_top_tables() {
        let (mut ppu, mut cart) = rig();
        poke(&mut ppu, &mut cart, 0x2400, &[0x77]);
        set_addr(&mut ppu, &mut cart, 0x2000);
        let _ = ppu.cpu_read(PpuRegister::Data, &mut cart);
        assert_eq!(ppu.cpu_read(PpuRegister::Data, &mut cart), 0x77);
        // $3000 mirrors $2000.
        set_addr(&mut ppu, &mut cart, 0x3000);
        let _ = ppu.cpu_read(PpuRegister::Data, &mut cart);
        assert_eq!(ppu.cpu_read(PpuRegister::Data, &mut cart), 0x77);
    }

    #[test]
    fn status_read_clears_vblank_and_write_toggle() {
        let (mut ppu, mut cart) = rig();
        run_to(&mut ppu, &mut cart, (241, 2));
        ppu.cpu_write(PpuRegister::Scroll, 0x10, &mut cart);
        let status = ppu.cpu_read(PpuRegister::Status, &mut cart);
        assert_eq!(status & 0x80, 0x80);
        assert_eq!(ppu.cpu_read(PpuRegister::Status, &mut cart) & 0x80, 0);
        assert!(!ppu.regs.scroll.w);
    }

    #[test]
    fn vblank_and_nmi_follow_the_raster() {
        let (mut ppu, mut cart) = rig();
        ppu.cpu_write(PpuRegister::Control, 0x80, &mut cart);
        run_to(&mut ppu, &mut cart, (241, 1));
        assert!(!ppu.nmi_line());
        ppu.clock(&mut cart);
        assert!(ppu.nmi_line());
        run_to(&mut ppu, &mut cart, (261, 2));
        assert!(!ppu.nmi_line());
        assert_eq!(ppu.peek_register(PpuRegister::Status) & 0x80, 0);
    }

    #[test]
    fn reading_status_on_the_set_dot_suppresses_vblank() {
        let (mut ppu, mut cart) = rig();
        ppu.cpu_write(PpuRegister::Control, 0x80, &mut cart);
        run_to(&mut ppu, &mut cart, (241, 1));
        let status = ppu.cpu_read(PpuRegister::Status, &mut cart);
        assert_eq!(status & 0x80, 0);
        run_to(&mut ppu, &mut cart, (245, 0));
        assert!(!ppu.nmi_line());
        assert_eq!(ppu.peek_register(PpuRegister::Status) & 0x80, 0);
    }

    #[test]
    fn enabling_nmi_during_vblank_raises_the_line() {
        let (mut ppu, mut cart) = rig();
        run_to(&mut ppu, &mut cart, (250, 0));
        assert!(!ppu.nmi_line());
        ppu.cpu_write(PpuRegister::Control, 0x80, &mut cart);
        assert!(ppu.nmi_line());
    }

    #[test]
    fn odd_frames_drop_a_dot_when_background_is_on() {
        let (mut ppu, mut cart) = rig();
        assert_eq!(frame_length(&mut ppu, &mut cart), 262 * 341);
        assert_eq!(frame_length(&mut ppu, &mut cart), 262 * 341);

        ppu.cpu_write(PpuRegister::Mask, 0x08, &mut cart);
        let even = frame_length(&mut ppu, &mut cart);
        let odd = frame_length(&mut ppu, &mut cart);
        assert_eq!(even, 262 * 341);
        assert_eq!(odd, 262 * 341 - 1);
    }

    #[test]
    fn pal_frames_are_312_lines_without_skip() {
        let mut cart = Cartridge::load(&nrom_image(1, 0, |_| 0)).unwrap();
        let mut ppu = Ppu::new(Region::Pal, cart.ppu_mappings()).unwrap();
        ppu.cpu_write(PpuRegister::Mask, 0x08, &mut cart);
        assert_eq!(frame_length(&mut ppu, &mut cart), 312 * 341);
        assert_eq!(frame_length(&mut ppu, &mut cart), 312 * 341);
    }

    #[test]
    fn oam_data_port_increments_and_masks_attributes() {
        let (mut ppu, mut cart) = rig();
        ppu.cpu_write(PpuRegister::OamAddr, 0x00, &mut cart);
        for b in [0x10, 0x20, 0xFF, 0x40] {
            ppu.cpu_write(PpuRegister::OamData, b, &mut cart);
        }
        assert_eq!(ppu.oam()[..4], [0x10, 0x20, 0xFF, 0x40]);
        ppu.cpu_write(PpuRegister::OamAddr, 0x02, &mut cart);
        assert_eq!(ppu.cpu_read(PpuRegister::OamData, &mut cart), 0xE3);
    }

    #[test]
    fn write_only_registers_read_open_bus() {
        let (mut ppu, mut cart) = rig();
        ppu.cpu_write(PpuRegister::OamAddr, 0x5C, &mut cart);
        assert_eq!(ppu.cpu_read(PpuRegister::Control, &mut cart), 0x5C);
        let status = ppu.cpu_read(PpuRegister::Status, &mut cart);
        assert_eq!(status & 0x1F, 0x1C);
    }

    /// Solid tile 1 everywhere, sprite 0 using tile 1 at (40, 31).
    fn sprite_zero_scene(ppu: &mut Ppu, cart: &mut Cartridge) {
        poke(ppu, cart, 0x0010, &[0xFF; 8]);
        poke(ppu, cart, 0x2000, &[1; 0x3C0]);
        poke(ppu, cart, 0x3F00, &[0x0F, 0x21, 0x22, 0x23]);
        poke(ppu, cart, 0x3F10, &[0x0F, 0x16, 0x17, 0x18]);
        ppu.cpu_write(PpuRegister::OamAddr, 0, cart);
        for b in [30, 1, 0, 40] {
            ppu.cpu_write(PpuRegister::OamData, b, cart);
        }
        set_addr(ppu, cart, 0x0000);
        ppu.cpu_write(PpuRegister::Mask, 0x1E, cart);
    }

    #[test]
    fn sprite_zero_hit_fires_on_first_overlap() {
        let (mut ppu, mut cart) = rig();
        sprite_zero_scene(&mut ppu, &mut cart);
        // Let the pipeline settle through one pre-render line.
        while !ppu.clock(&mut cart) {}
        run_to(&mut ppu, &mut cart, (31, 0));
        assert_eq!(ppu.peek_register(PpuRegister::Status) & 0x40, 0);
        run_to(&mut ppu, &mut cart, (31, 60));
        assert_eq!(ppu.peek_register(PpuRegister::Status) & 0x40, 0x40);
        // Cleared on the pre-render line.
        run_to(&mut ppu, &mut cart, (261, 2));
        assert_eq!(ppu.peek_register(PpuRegister::Status) & 0x40, 0);
    }

    #[test]
    fn rendered_frame_uses_background_and_sprite_palettes() {
        let (mut ppu, mut cart) = rig();
        sprite_zero_scene(&mut ppu, &mut cart);
        while !ppu.clock(&mut cart) {}
        while !ppu.clock(&mut cart) {}
        let frame = ppu.frame();
        // Tile 1 low plane only: color 1 of palette 0.
        assert_eq!(frame.pixel(100, 100), 0x21);
        assert_eq!(frame.pixel(40, 31), 0x16);
        assert_eq!(frame.pixel(47, 31), 0x16);
        assert_eq!(frame.pixel(48, 31), 0x21);
    }

    #[test]
    fn grayscale_masks_the_hue() {
        let (mut ppu, mut cart) = rig();
        poke(&mut ppu, &mut cart, 0x3F00, &[0x2C]);
        set_addr(&mut ppu, &mut cart, 0x0000);
        ppu.cpu_write(PpuRegister::Mask, 0x01, &mut cart);
        while !ppu.clock(&mut cart) {}
        assert_eq!(ppu.frame().pixel(0, 0), 0x20);
    }

    #[test]
    fn more_than_eight_sprites_sets_overflow() {
        let (mut ppu, mut cart) = rig();
        ppu.cpu_write(PpuRegister::OamAddr, 0, &mut cart);
        for i in 0..9u8 {
            for b in [50, 0, 0, i * 10] {
                ppu.cpu_write(PpuRegister::OamData, b, &mut cart);
            }
        }
        for _ in 9..64 {
            for b in [0xF0, 0, 0, 0] {
                ppu.cpu_write(PpuRegister::OamData, b, &mut cart);
            }
        }
        ppu.cpu_write(PpuRegister::Mask, 0x10, &mut cart);
        run_to(&mut ppu, &mut cart, (50, 0));
        assert_eq!(ppu.peek_register(PpuRegister::Status) & 0x20, 0);
        run_to(&mut ppu, &mut cart, (51, 0));
        assert_eq!(ppu.peek_register(PpuRegister::Status) & 0x20, 0x20);
    }
}
