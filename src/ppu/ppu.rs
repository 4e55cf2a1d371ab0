//! NES PPU (Picture Processing Unit) implementation.
//!
//! A dot-stepped 2C02: 341 dots per scanline, 262 scanlines per frame. The background is fetched
//! eight dots per tile into a 64-bit shift register, sprites are evaluated once per scanline into
//! a line buffer, and finished frames are double-buffered for the front-end.
//! Registers: $2000–$2007 (mirrored).

use crate::bus::PpuBus;
use crate::cpu::cpu::{Interrupt, InterruptLine};
use crate::ppu::registers::{
    Control, Mask, PpuRegisters, STATUS_SPRITE_OVERFLOW, STATUS_SPRITE_ZERO_HIT, STATUS_VBLANK,
};

/// NES 2C02-style 64-color palette (0xRRGGBB). Index 0 = backdrop.
pub const NES_PALETTE_RGB: [u32; 64] = [
    0x545454, 0x001E74, 0x081090, 0x300088, 0x440064, 0x5C0030, 0x540400, 0x3C1800, 0x202A00,
    0x083A00, 0x004000, 0x003C00, 0x00302C, 0x000000, 0x000000, 0x000000, 0x989698, 0x084CC4,
    0x3032EC, 0x5C1EE4, 0x8814B0, 0xA01464, 0x982220, 0x783C00, 0x545A00, 0x287200, 0x087C00,
    0x007628, 0x006678, 0x000000, 0x000000, 0x000000, 0xECEEEC, 0x3C7EEC, 0x5C5CEC, 0x8844EC,
    0xB02CEC, 0xE028B0, 0xD83C50, 0xC45400, 0xAC7000, 0x808800, 0x409C30, 0x20A458, 0x209A88,
    0x404040, 0x000000, 0x000000, 0xECEEEC, 0xA8BCEC, 0xBCACEC, 0xD4A0EC, 0xEC94EC, 0xEC90D4,
    0xEC9CB4, 0xE4B090, 0xDCC878, 0xD4DC78, 0xB8EC98, 0xA8ECBC, 0xA0E4E4, 0xA0A0A0, 0x000000,
    0x000000,
];

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;

/// OAM (Object Attribute Memory): 64 sprites × 4 bytes. Each entry: Y, tile, attr, X.
pub const OAM_LEN: usize = 256;
const MAX_SPRITES_PER_LINE: usize = 8;

const LAST_CYCLE: u16 = 340;
const VBLANK_SCANLINE: u16 = 241;
const PRE_RENDER_SCANLINE: u16 = 261;

/// Opaque sprite pixel left on the line buffer by sprite evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SpritePixel {
    /// Index into palette RAM ($10–$1F).
    palette_index: u8,
    behind_background: bool,
}

/// PPU state: timing, registers, OAM, fetch latches, sprite line buffer and framebuffers.
pub struct PPU {
    registers: PpuRegisters,
    cycle: u16,
    scanline: u16,
    /// OAM: 64 sprites × 4 bytes (Y, tile, attr, X). Written via $2003/$2004 or $4014 DMA.
    oam: [u8; OAM_LEN],

    nametable_latch: u8,
    attribute_latch: u8,
    pattern_low_latch: u8,
    pattern_high_latch: u8,
    /// Two tiles of background pixels, 4 bits each (palette << 2 | pattern), oldest in the top half.
    tile_data: u64,

    sprite_line: [Option<SpritePixel>; SCREEN_WIDTH],
    sprite_zero_line: [bool; SCREEN_WIDTH],

    /// 256×240 framebuffers (0xRRGGBB per pixel), row-major. `front` is the last completed frame.
    frames: [Vec<u32>; 2],
    front: usize,
    frame_count: u64,

    interrupt: InterruptLine,
}

impl PPU {
    /// Create a PPU that raises NMI on `interrupt`, already in its reset state.
    pub fn new(interrupt: InterruptLine) -> Self {
        let mut ppu = Self {
            registers: PpuRegisters::default(),
            cycle: 0,
            scanline: 0,
            oam: [0; OAM_LEN],
            nametable_latch: 0,
            attribute_latch: 0,
            pattern_low_latch: 0,
            pattern_high_latch: 0,
            tile_data: 0,
            sprite_line: [None; SCREEN_WIDTH],
            sprite_zero_line: [false; SCREEN_WIDTH],
            frames: [
                vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
                vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            ],
            front: 0,
            frame_count: 0,
            interrupt,
        };
        ppu.reset();
        ppu
    }

    /// Power-up state: last dot of the pre-render line, vblank and overflow flags set.
    pub fn reset(&mut self) {
        self.registers = PpuRegisters {
            status: STATUS_VBLANK | STATUS_SPRITE_OVERFLOW,
            ..PpuRegisters::default()
        };
        self.cycle = LAST_CYCLE;
        self.scanline = PRE_RENDER_SCANLINE;
        self.oam = [0; OAM_LEN];
        self.nametable_latch = 0;
        self.attribute_latch = 0;
        self.pattern_low_latch = 0;
        self.pattern_high_latch = 0;
        self.tile_data = 0;
        self.sprite_line = [None; SCREEN_WIDTH];
        self.sprite_zero_line = [false; SCREEN_WIDTH];
        for frame in &mut self.frames {
            frame.fill(0);
        }
        self.front = 0;
        self.frame_count = 0;
    }

    pub fn registers(&self) -> &PpuRegisters {
        &self.registers
    }

    pub fn cycle(&self) -> u16 {
        self.cycle
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn oam(&self) -> &[u8; OAM_LEN] {
        &self.oam
    }

    pub fn open_bus(&self) -> u8 {
        self.registers.open_bus
    }

    /// Last completed frame.
    pub fn pixels(&self) -> &[u32] {
        &self.frames[self.front]
    }

    /// Number of completed frames since reset.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Advance the PPU by one dot.
    pub fn tick(&mut self, bus: &mut impl PpuBus) {
        let rendering = self.registers.mask.rendering_enabled();
        let visible_line = self.scanline < SCREEN_HEIGHT as u16;
        let pre_render_line = self.scanline == PRE_RENDER_SCANLINE;
        let render_line = visible_line || pre_render_line;
        let visible_cycle = (1..=256).contains(&self.cycle);
        let fetch_cycle = visible_cycle || (321..=336).contains(&self.cycle);

        if visible_line && visible_cycle {
            self.render_pixel(&*bus);
        }

        if rendering {
            if render_line && fetch_cycle {
                self.tile_data <<= 4;
                match self.cycle % 8 {
                    1 => self.fetch_nametable_byte(&*bus),
                    3 => self.fetch_attribute_byte(&*bus),
                    5 => self.pattern_low_latch = bus.read_ppu_byte(self.pattern_address()),
                    7 => self.pattern_high_latch = bus.read_ppu_byte(self.pattern_address() + 8),
                    0 => {
                        self.store_tile_data();
                        self.registers.v.increment_x();
                    }
                    _ => {}
                }
            }
            if render_line && self.cycle == 256 {
                self.registers.v.increment_y();
            }
            if render_line && self.cycle == 257 {
                let t = self.registers.t;
                self.registers.v.copy_x(t);
            }
            if pre_render_line && (280..=304).contains(&self.cycle) {
                let t = self.registers.t;
                self.registers.v.copy_y(t);
            }
            if self.cycle == 257 {
                if visible_line {
                    self.evaluate_sprites(&*bus);
                } else if pre_render_line {
                    self.sprite_line = [None; SCREEN_WIDTH];
                    self.sprite_zero_line = [false; SCREEN_WIDTH];
                }
            }
        }

        if self.cycle == 1 {
            if self.scanline == VBLANK_SCANLINE {
                self.registers.status |= STATUS_VBLANK;
                if self.registers.ctrl.nmi_enabled() {
                    log::debug!("vblank NMI at frame {}", self.frame_count);
                    self.interrupt.raise(Interrupt::Nmi);
                }
            } else if pre_render_line {
                self.registers.status &=
                    !(STATUS_VBLANK | STATUS_SPRITE_ZERO_HIT | STATUS_SPRITE_OVERFLOW);
            }
        }

        self.advance();
    }

    fn advance(&mut self) {
        self.cycle += 1;
        if self.cycle > LAST_CYCLE {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline > PRE_RENDER_SCANLINE {
                self.scanline = 0;
                self.front ^= 1;
                self.frame_count += 1;
            }
        }
    }

    fn back_buffer(&mut self) -> &mut [u32] {
        &mut self.frames[self.front ^ 1]
    }

    fn fetch_nametable_byte(&mut self, bus: &impl PpuBus) {
        self.nametable_latch = bus.read_ppu_byte(self.registers.v.tile_address());
    }

    fn fetch_attribute_byte(&mut self, bus: &impl PpuBus) {
        let v = self.registers.v;
        let attribute = bus.read_ppu_byte(v.attribute_address());
        self.attribute_latch = ((attribute >> v.attribute_shift()) & 0b11) << 2;
    }

    fn pattern_address(&self) -> u16 {
        self.registers.ctrl.background_table()
            + self.nametable_latch as u16 * 16
            + self.registers.v.fine_y() as u16
    }

    /// Interleave the latched pattern planes with the palette bits into the low half of tile_data.
    fn store_tile_data(&mut self) {
        let mut low = self.pattern_low_latch;
        let mut high = self.pattern_high_latch;
        let mut data: u32 = 0;
        for _ in 0..8 {
            let pixel = self.attribute_latch | ((high & 0x80) >> 6) | ((low & 0x80) >> 7);
            low <<= 1;
            high <<= 1;
            data = (data << 4) | pixel as u32;
        }
        self.tile_data |= data as u64;
    }

    /// 4-bit background pixel at the fine X offset: palette << 2 | pattern.
    fn background_pixel(&self) -> u8 {
        let shift = (7 - self.registers.fine_x as u32) * 4;
        (((self.tile_data >> 32) as u32 >> shift) & 0x0F) as u8
    }

    fn render_pixel(&mut self, bus: &impl PpuBus) {
        let x = (self.cycle - 1) as usize;
        let y = self.scanline as usize;
        let mask = self.registers.mask;

        let background = if mask.show_background() && (x >= 8 || mask.show_background_left()) {
            self.background_pixel()
        } else {
            0
        };
        let background_opaque = background & 0b11 != 0;

        let sprites_visible = mask.show_sprites() && (x >= 8 || mask.show_sprites_left());
        let sprite = if sprites_visible { self.sprite_line[x] } else { None };
        if sprites_visible && self.sprite_zero_line[x] && background_opaque && x != 255 {
            self.registers.status |= STATUS_SPRITE_ZERO_HIT;
        }

        let index = match sprite {
            Some(sprite) if !(sprite.behind_background && background_opaque) => {
                sprite.palette_index
            }
            _ if background_opaque => background,
            _ => 0,
        };

        let mut color = bus.read_ppu_byte(0x3F00 | index as u16);
        if mask.greyscale() {
            color &= 0x30;
        }
        self.back_buffer()[y * SCREEN_WIDTH + x] = NES_PALETTE_RGB[(color & 0x3F) as usize];
    }

    /// Pick up to eight sprites on the current scanline and rasterize them into the line buffer.
    /// A ninth match sets the overflow flag.
    fn evaluate_sprites(&mut self, bus: &impl PpuBus) {
        let ctrl = self.registers.ctrl;
        let height = ctrl.sprite_height() as i32;
        let scanline = self.scanline as i32;

        let mut selected = [0usize; MAX_SPRITES_PER_LINE];
        let mut count = 0;
        for sprite in 0..OAM_LEN / 4 {
            let row = scanline - self.oam[sprite * 4] as i32;
            if !(0..height).contains(&row) {
                continue;
            }
            if count == MAX_SPRITES_PER_LINE {
                self.registers.status |= STATUS_SPRITE_OVERFLOW;
                break;
            }
            selected[count] = sprite;
            count += 1;
        }

        self.sprite_line = [None; SCREEN_WIDTH];
        self.sprite_zero_line = [false; SCREEN_WIDTH];

        // Back to front so lower OAM indices end up on top
        for &sprite in selected[..count].iter().rev() {
            let entry = &self.oam[sprite * 4..sprite * 4 + 4];
            let (y, tile, attributes, x) = (entry[0], entry[1], entry[2], entry[3]);

            let mut row = (scanline - y as i32) as u16;
            if attributes & 0x80 != 0 {
                row = height as u16 - 1 - row;
            }
            let address = Self::sprite_pattern_address(ctrl, tile, row);
            let low = bus.read_ppu_byte(address);
            let high = bus.read_ppu_byte(address + 8);

            let flip_horizontal = attributes & 0x40 != 0;
            let palette = (attributes & 0b11) << 2;
            for column in 0..8u8 {
                let bit = if flip_horizontal { column } else { 7 - column };
                let pattern = (((high >> bit) & 1) << 1) | ((low >> bit) & 1);
                let screen_x = x as usize + column as usize;
                if pattern == 0 || screen_x >= SCREEN_WIDTH {
                    continue;
                }
                self.sprite_line[screen_x] = Some(SpritePixel {
                    palette_index: 0x10 | palette | pattern,
                    behind_background: attributes & 0x20 != 0,
                });
                if sprite == 0 {
                    self.sprite_zero_line[screen_x] = true;
                }
            }
        }
    }

    /// Pattern row address for a sprite. 8×16 sprites pick the table from tile bit 0 and use
    /// the even/odd tile pair for the top/bottom halves.
    fn sprite_pattern_address(ctrl: Control, tile: u8, row: u16) -> u16 {
        if ctrl.sprite_height() == 16 {
            let table = (tile as u16 & 1) * 0x1000;
            let top = tile as u16 & 0xFE;
            let (tile, row) = if row < 8 { (top, row) } else { (top + 1, row - 8) };
            table + tile * 16 + row
        } else {
            ctrl.sprite_table() + tile as u16 * 16 + row
        }
    }

    /// CPU read of $2000–$2007.
    pub fn read_register(&mut self, addr: u16, bus: &mut impl PpuBus) -> u8 {
        let value = match addr & 7 {
            2 => {
                let status = (self.registers.status & 0xE0) | (self.registers.open_bus & 0x1F);
                self.registers.status &= !STATUS_VBLANK;
                self.registers.write_toggle = false;
                status
            }
            4 => {
                let data = self.oam[self.registers.oam_addr as usize];
                // Attribute bytes have no bits 2–4
                if self.registers.oam_addr % 4 == 2 { data & 0xE3 } else { data }
            }
            7 => self.read_data(&*bus),
            _ => return self.registers.open_bus,
        };
        self.registers.open_bus = value;
        value
    }

    /// Buffered below the palette; palette reads return immediately and refill the buffer from
    /// the nametable underneath.
    fn read_data(&mut self, bus: &impl PpuBus) -> u8 {
        let addr = self.registers.v.0 & 0x3FFF;
        let value = if addr < 0x3F00 {
            let buffered = self.registers.read_buffer;
            self.registers.read_buffer = bus.read_ppu_byte(addr);
            buffered
        } else {
            self.registers.read_buffer = bus.read_ppu_byte(addr - 0x1000);
            bus.read_ppu_byte(addr)
        };
        self.registers.increment_address();
        value
    }

    /// CPU write of $2000–$2007.
    pub fn write_register(&mut self, addr: u16, data: u8, bus: &mut impl PpuBus) {
        self.registers.open_bus = data;
        match addr & 7 {
            0 => {
                self.registers.ctrl = Control(data);
                self.registers.t.set_nametable(self.registers.ctrl.nametable());
            }
            1 => self.registers.mask = Mask(data),
            3 => self.registers.oam_addr = data,
            4 => {
                self.oam[self.registers.oam_addr as usize] = data;
                self.registers.oam_addr = self.registers.oam_addr.wrapping_add(1);
            }
            5 => self.registers.write_scroll(data),
            6 => self.registers.write_address(data),
            7 => {
                bus.write_ppu_byte(self.registers.v.0 & 0x3FFF, data);
                self.registers.increment_address();
            }
            // PPUSTATUS is read-only
            _ => {}
        }
    }

    /// OAM DMA ($4014): 256 bytes written starting at OAMADDR, wrapping.
    pub fn write_oam_dma(&mut self, data: &[u8; OAM_LEN]) {
        for (i, &byte) in data.iter().enumerate() {
            let index = self.registers.oam_addr.wrapping_add(i as u8);
            self.oam[index as usize] = byte;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat 16 KiB PPU address space: no mirroring, no palette aliasing.
    struct TestPpuBus {
        mem: Vec<u8>,
    }

    impl TestPpuBus {
        fn new() -> Self {
            Self {
                mem: vec![0; 0x4000],
            }
        }
    }

    impl PpuBus for TestPpuBus {
        fn read_ppu_byte(&self, addr: u16) -> u8 {
            self.mem[(addr & 0x3FFF) as usize]
        }

        fn write_ppu_byte(&mut self, addr: u16, data: u8) {
            self.mem[(addr & 0x3FFF) as usize] = data;
        }
    }

    fn new_ppu() -> (PPU, InterruptLine) {
        let interrupt = InterruptLine::new();
        (PPU::new(interrupt.clone()), interrupt)
    }

    /// Tick until the PPU reaches (scanline, cycle).
    fn run_to(ppu: &mut PPU, bus: &mut TestPpuBus, scanline: u16, cycle: u16) {
        while !(ppu.scanline() == scanline && ppu.cycle() == cycle) {
            ppu.tick(bus);
        }
    }

    #[test]
    fn reset_is_idempotent() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        ppu.write_register(0x2000, 0x80, &mut bus);
        ppu.tick(&mut bus);
        ppu.reset();
        let first = (*ppu.registers(), ppu.cycle(), ppu.scanline());
        ppu.reset();
        assert_eq!(first, (*ppu.registers(), ppu.cycle(), ppu.scanline()));
        assert_eq!(first.0.status, STATUS_VBLANK | STATUS_SPRITE_OVERFLOW);
        assert_eq!((first.1, first.2), (LAST_CYCLE, PRE_RENDER_SCANLINE));
    }

    #[test]
    fn vblank_raises_nmi_when_enabled() {
        let (mut ppu, interrupt) = new_ppu();
        let mut bus = TestPpuBus::new();
        ppu.write_register(0x2000, 0x80, &mut bus);
        run_to(&mut ppu, &mut bus, VBLANK_SCANLINE, 1);
        assert_eq!(interrupt.pending(), None);
        ppu.tick(&mut bus);
        assert_eq!(interrupt.pending(), Some(Interrupt::Nmi));
        assert_ne!(ppu.registers().status & STATUS_VBLANK, 0);
    }

    #[test]
    fn vblank_without_nmi_enable_leaves_line_clear() {
        let (mut ppu, interrupt) = new_ppu();
        let mut bus = TestPpuBus::new();
        run_to(&mut ppu, &mut bus, VBLANK_SCANLINE, 2);
        assert_eq!(interrupt.pending(), None);
        assert_ne!(ppu.registers().status & STATUS_VBLANK, 0);
    }

    #[test]
    fn pre_render_line_clears_status_flags() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        run_to(&mut ppu, &mut bus, PRE_RENDER_SCANLINE, 2);
        assert_eq!(ppu.registers().status & 0xE0, 0);
    }

    #[test]
    fn status_read_clears_vblank_and_toggle() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        ppu.write_register(0x2006, 0x21, &mut bus);
        assert!(ppu.registers().write_toggle);
        let status = ppu.read_register(0x2002, &mut bus);
        assert_eq!(status & 0xE0, STATUS_VBLANK | STATUS_SPRITE_OVERFLOW);
        // Low bits come from the last value written to a register
        assert_eq!(status & 0x1F, 0x21 & 0x1F);
        assert_eq!(ppu.registers().status & STATUS_VBLANK, 0);
        assert!(!ppu.registers().write_toggle);
    }

    #[test]
    fn ctrl_write_sets_nametable_bits_of_t() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        ppu.write_register(0x2000, 0x03, &mut bus);
        assert_eq!(ppu.registers().t.nametable(), 3);
    }

    #[test]
    fn data_reads_are_buffered_below_palette() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        bus.mem[0x2000] = 0x11;
        bus.mem[0x2001] = 0x22;
        ppu.write_register(0x2006, 0x20, &mut bus);
        ppu.write_register(0x2006, 0x00, &mut bus);
        ppu.read_register(0x2007, &mut bus);
        assert_eq!(ppu.read_register(0x2007, &mut bus), 0x11);
        assert_eq!(ppu.read_register(0x2007, &mut bus), 0x22);
    }

    #[test]
    fn palette_reads_are_immediate_and_refill_buffer() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        bus.mem[0x3F00] = 0x0F;
        bus.mem[0x2F00] = 0x77;
        ppu.write_register(0x2006, 0x3F, &mut bus);
        ppu.write_register(0x2006, 0x00, &mut bus);
        assert_eq!(ppu.read_register(0x2007, &mut bus), 0x0F);
        assert_eq!(ppu.registers().read_buffer, 0x77);
    }

    #[test]
    fn data_writes_increment_by_32_when_selected() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        ppu.write_register(0x2000, 0x04, &mut bus);
        ppu.write_register(0x2006, 0x20, &mut bus);
        ppu.write_register(0x2006, 0x00, &mut bus);
        ppu.write_register(0x2007, 0xAA, &mut bus);
        ppu.write_register(0x2007, 0xBB, &mut bus);
        assert_eq!(bus.mem[0x2000], 0xAA);
        assert_eq!(bus.mem[0x2020], 0xBB);
        assert_eq!(ppu.registers().v.0, 0x2040);
    }

    #[test]
    fn oam_data_masks_attribute_reads() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        ppu.write_register(0x2003, 0x02, &mut bus);
        ppu.write_register(0x2004, 0xFF, &mut bus);
        ppu.write_register(0x2003, 0x02, &mut bus);
        assert_eq!(ppu.read_register(0x2004, &mut bus), 0xE3);
    }

    #[test]
    fn oam_dma_starts_at_oam_addr() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        ppu.write_register(0x2003, 0xFE, &mut bus);
        let mut page = [0u8; OAM_LEN];
        page[0] = 1;
        page[2] = 3;
        ppu.write_oam_dma(&page);
        assert_eq!(ppu.oam()[0xFE], 1);
        assert_eq!(ppu.oam()[0x00], 3);
    }

    #[test]
    fn frame_completes_after_full_scan() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        // The first dot after reset wraps into scanline 0
        ppu.tick(&mut bus);
        assert_eq!(ppu.frame_count(), 1);
        for _ in 0..341 * 262 {
            ppu.tick(&mut bus);
        }
        assert_eq!(ppu.frame_count(), 2);
        assert_eq!((ppu.scanline(), ppu.cycle()), (0, 0));
    }

    #[test]
    fn disabled_rendering_shows_backdrop() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        bus.mem[0x3F00] = 0x21;
        ppu.tick(&mut bus);
        for _ in 0..341 * 262 {
            ppu.tick(&mut bus);
        }
        assert!(ppu.pixels().iter().all(|&p| p == NES_PALETTE_RGB[0x21]));
    }

    /// Solid tile 1 (pattern value 3) everywhere, background palette 0 entry 3.
    fn solid_background(bus: &mut TestPpuBus) {
        for row in 0..8 {
            bus.mem[16 + row] = 0xFF;
            bus.mem[16 + row + 8] = 0xFF;
        }
        for addr in 0x2000..0x23C0 {
            bus.mem[addr] = 1;
        }
        bus.mem[0x3F00] = 0x0F;
        bus.mem[0x3F03] = 0x16;
    }

    #[test]
    fn renders_background_tiles() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        solid_background(&mut bus);
        ppu.write_register(0x2001, 0x0A, &mut bus);
        // Two full frames so the first visible line has prefetched tiles
        for _ in 0..341 * 262 * 2 + 1 {
            ppu.tick(&mut bus);
        }
        let pixels = ppu.pixels();
        assert_eq!(pixels[0], NES_PALETTE_RGB[0x16]);
        assert_eq!(pixels[100 * SCREEN_WIDTH + 128], NES_PALETTE_RGB[0x16]);
    }

    #[test]
    fn sprite_zero_hit_over_opaque_background() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        solid_background(&mut bus);
        let mut page = [0xFFu8; OAM_LEN];
        // Sprite 0 at (40, 31) using the solid tile
        page[..4].copy_from_slice(&[30, 1, 0, 40]);
        ppu.write_oam_dma(&page);
        ppu.write_register(0x2001, 0x1E, &mut bus);
        run_to(&mut ppu, &mut bus, 0, 0);
        run_to(&mut ppu, &mut bus, 31, 40);
        assert_eq!(ppu.registers().status & STATUS_SPRITE_ZERO_HIT, 0);
        run_to(&mut ppu, &mut bus, 31, 50);
        assert_ne!(ppu.registers().status & STATUS_SPRITE_ZERO_HIT, 0);
    }

    #[test]
    fn ninth_sprite_on_a_line_sets_overflow() {
        let (mut ppu, _) = new_ppu();
        let mut bus = TestPpuBus::new();
        let mut page = [0xFFu8; OAM_LEN];
        for sprite in 0..9 {
            page[sprite * 4] = 10;
        }
        ppu.write_oam_dma(&page);
        ppu.write_register(0x2001, 0x10, &mut bus);
        run_to(&mut ppu, &mut bus, PRE_RENDER_SCANLINE, 2);
        assert_eq!(ppu.registers().status & STATUS_SPRITE_OVERFLOW, 0);
        run_to(&mut ppu, &mut bus, 10, 258);
        assert_ne!(ppu.registers().status & STATUS_SPRITE_OVERFLOW, 0);
    }

    #[test]
    fn eight_by_sixteen_sprites_use_tile_bit_zero_for_table() {
        let ctrl = Control(0x20);
        assert_eq!(PPU::sprite_pattern_address(ctrl, 0x03, 0), 0x1000 + 0x02 * 16);
        assert_eq!(PPU::sprite_pattern_address(ctrl, 0x03, 9), 0x1000 + 0x03 * 16 + 1);
        assert_eq!(PPU::sprite_pattern_address(Control(0x08), 0x03, 2), 0x1000 + 0x30 + 2);
    }
}
