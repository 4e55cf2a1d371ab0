//! PPU register file: PPUCTRL, PPUMASK, PPUSTATUS, and the internal scroll registers.
//!
//! See [PPU scrolling](https://www.nesdev.org/wiki/PPU_scrolling) for the v/t/x/w model.

/// PPUSTATUS bits.
pub const STATUS_SPRITE_OVERFLOW: u8 = 0x20;
pub const STATUS_SPRITE_ZERO_HIT: u8 = 0x40;
pub const STATUS_VBLANK: u8 = 0x80;

/// 15-bit VRAM address as used for v and t.
///
/// ```text
/// yyy NN YYYYY XXXXX
/// ||| || ||||| +++++-- coarse X
/// ||| || +++++-------- coarse Y
/// ||| ++-------------- nametable select
/// +++----------------- fine Y
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VramAddress(pub u16);

impl VramAddress {
    const COARSE_X: u16 = 0b000_00_00000_11111;
    const COARSE_Y: u16 = 0b000_00_11111_00000;
    const NAMETABLE: u16 = 0b000_11_00000_00000;
    const FINE_Y: u16 = 0b111_00_00000_00000;
    const HORIZONTAL: u16 = 0b000_01_00000_11111;
    const VERTICAL: u16 = 0b111_10_11111_00000;

    pub fn coarse_x(self) -> u8 {
        (self.0 & Self::COARSE_X) as u8
    }

    pub fn set_coarse_x(&mut self, value: u8) {
        self.0 = (self.0 & !Self::COARSE_X) | (value as u16 & 0x1F);
    }

    pub fn coarse_y(self) -> u8 {
        ((self.0 & Self::COARSE_Y) >> 5) as u8
    }

    pub fn set_coarse_y(&mut self, value: u8) {
        self.0 = (self.0 & !Self::COARSE_Y) | ((value as u16 & 0x1F) << 5);
    }

    pub fn nametable(self) -> u8 {
        ((self.0 & Self::NAMETABLE) >> 10) as u8
    }

    pub fn set_nametable(&mut self, value: u8) {
        self.0 = (self.0 & !Self::NAMETABLE) | ((value as u16 & 0b11) << 10);
    }

    pub fn fine_y(self) -> u8 {
        ((self.0 & Self::FINE_Y) >> 12) as u8
    }

    pub fn set_fine_y(&mut self, value: u8) {
        self.0 = (self.0 & !Self::FINE_Y) | ((value as u16 & 0b111) << 12);
    }

    /// Address of the nametable byte for the current tile.
    pub fn tile_address(self) -> u16 {
        0x2000 | (self.0 & 0x0FFF)
    }

    /// Address of the attribute byte covering the current tile.
    pub fn attribute_address(self) -> u16 {
        0x23C0 | (self.0 & 0x0C00) | ((self.0 >> 4) & 0x38) | ((self.0 >> 2) & 0x07)
    }

    /// Shift that selects the tile's 2-bit palette within its attribute byte.
    pub fn attribute_shift(self) -> u8 {
        (((self.0 >> 4) & 4) | (self.0 & 2)) as u8
    }

    /// Coarse X wraps at 32 into the horizontally adjacent nametable.
    pub fn increment_x(&mut self) {
        if self.coarse_x() == 31 {
            self.set_coarse_x(0);
            self.0 ^= 0x0400;
        } else {
            self.0 += 1;
        }
    }

    /// Fine Y, carrying into coarse Y. Row 29 wraps into the vertically adjacent nametable;
    /// rows 30 and 31 (attribute memory) wrap without switching.
    pub fn increment_y(&mut self) {
        let fine_y = self.fine_y();
        if fine_y < 7 {
            self.set_fine_y(fine_y + 1);
            return;
        }
        self.set_fine_y(0);
        match self.coarse_y() {
            29 => {
                self.set_coarse_y(0);
                self.0 ^= 0x0800;
            }
            31 => self.set_coarse_y(0),
            y => self.set_coarse_y(y + 1),
        }
    }

    /// Copy coarse X and the horizontal nametable bit from `source`.
    pub fn copy_x(&mut self, source: VramAddress) {
        self.0 = (self.0 & !Self::HORIZONTAL) | (source.0 & Self::HORIZONTAL);
    }

    /// Copy fine Y, coarse Y and the vertical nametable bit from `source`.
    pub fn copy_y(&mut self, source: VramAddress) {
        self.0 = (self.0 & !Self::VERTICAL) | (source.0 & Self::VERTICAL);
    }
}

/// PPUCTRL ($2000).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Control(pub u8);

impl Control {
    pub fn nametable(self) -> u8 {
        self.0 & 0b11
    }

    /// VRAM address increment per $2007 access: 1 (across) or 32 (down).
    pub fn vram_increment(self) -> u16 {
        if self.0 & 0x04 != 0 { 32 } else { 1 }
    }

    /// Pattern table for 8×8 sprites.
    pub fn sprite_table(self) -> u16 {
        if self.0 & 0x08 != 0 { 0x1000 } else { 0x0000 }
    }

    pub fn background_table(self) -> u16 {
        if self.0 & 0x10 != 0 { 0x1000 } else { 0x0000 }
    }

    pub fn sprite_height(self) -> u16 {
        if self.0 & 0x20 != 0 { 16 } else { 8 }
    }

    pub fn nmi_enabled(self) -> bool {
        self.0 & 0x80 != 0
    }
}

/// PPUMASK ($2001).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Mask(pub u8);

impl Mask {
    pub fn greyscale(self) -> bool {
        self.0 & 0x01 != 0
    }

    pub fn show_background_left(self) -> bool {
        self.0 & 0x02 != 0
    }

    pub fn show_sprites_left(self) -> bool {
        self.0 & 0x04 != 0
    }

    pub fn show_background(self) -> bool {
        self.0 & 0x08 != 0
    }

    pub fn show_sprites(self) -> bool {
        self.0 & 0x10 != 0
    }

    pub fn rendering_enabled(self) -> bool {
        self.show_background() || self.show_sprites()
    }
}

/// CPU-visible and internal PPU registers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PpuRegisters {
    pub ctrl: Control,
    pub mask: Mask,
    pub status: u8,
    pub oam_addr: u8,
    /// Current VRAM address.
    pub v: VramAddress,
    /// Temporary VRAM address; the top-left of the screen.
    pub t: VramAddress,
    /// Fine X scroll (0–7).
    pub fine_x: u8,
    /// Shared first/second write toggle for $2005 and $2006.
    pub write_toggle: bool,
    /// $2007 read buffer.
    pub read_buffer: u8,
    /// Last value driven onto the PPU data bus.
    pub open_bus: u8,
}

impl PpuRegisters {
    /// $2005: X scroll on the first write, Y scroll on the second.
    pub fn write_scroll(&mut self, data: u8) {
        if !self.write_toggle {
            self.t.set_coarse_x(data >> 3);
            self.fine_x = data & 0b111;
        } else {
            self.t.set_coarse_y(data >> 3);
            self.t.set_fine_y(data & 0b111);
        }
        self.write_toggle = !self.write_toggle;
    }

    /// $2006: high six bits first, then the low byte, which also copies t into v.
    pub fn write_address(&mut self, data: u8) {
        if !self.write_toggle {
            self.t.0 = (self.t.0 & 0x00FF) | ((data as u16 & 0x3F) << 8);
        } else {
            self.t.0 = (self.t.0 & 0xFF00) | data as u16;
            self.v = self.t;
        }
        self.write_toggle = !self.write_toggle;
    }

    pub fn increment_address(&mut self) {
        self.v.0 = self.v.0.wrapping_add(self.ctrl.vram_increment()) & 0x7FFF;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coarse_x_wraps_into_next_nametable() {
        let mut v = VramAddress::default();
        v.set_coarse_x(31);
        v.increment_x();
        assert_eq!(v.coarse_x(), 0);
        assert_eq!(v.nametable(), 1);
    }

    #[test]
    fn coarse_y_wraps_at_row_29() {
        let mut v = VramAddress::default();
        v.set_coarse_y(29);
        v.set_fine_y(7);
        v.increment_y();
        assert_eq!((v.fine_y(), v.coarse_y(), v.nametable()), (0, 0, 2));
    }

    #[test]
    fn coarse_y_in_attribute_rows_wraps_without_switching() {
        let mut v = VramAddress::default();
        v.set_coarse_y(31);
        v.set_fine_y(7);
        v.increment_y();
        assert_eq!((v.coarse_y(), v.nametable()), (0, 0));
    }

    #[test]
    fn scroll_writes_fill_t_and_fine_x() {
        let mut regs = PpuRegisters::default();
        regs.write_scroll(0b0111_1101);
        regs.write_scroll(0b0101_1110);
        assert_eq!(regs.t.coarse_x(), 0b01111);
        assert_eq!(regs.fine_x, 0b101);
        assert_eq!(regs.t.coarse_y(), 0b01011);
        assert_eq!(regs.t.fine_y(), 0b110);
        assert!(!regs.write_toggle);
    }

    #[test]
    fn address_writes_load_v_on_second_write() {
        let mut regs = PpuRegisters::default();
        regs.write_address(0x3F);
        assert_eq!(regs.v.0, 0);
        regs.write_address(0x10);
        assert_eq!(regs.v.0, 0x3F10);
    }

    #[test]
    fn copies_split_horizontal_and_vertical_bits() {
        let source = VramAddress(0x7FFF);
        let mut v = VramAddress(0);
        v.copy_x(source);
        assert_eq!(v.0, 0x041F);
        v.copy_y(source);
        assert_eq!(v.0, 0x7FFF);
    }

    #[test]
    fn attribute_address_and_shift() {
        // Coarse X 5, coarse Y 6 in nametable 1
        let mut v = VramAddress::default();
        v.set_coarse_x(5);
        v.set_coarse_y(6);
        v.set_nametable(1);
        assert_eq!(v.attribute_address(), 0x27C0 | (1 << 3) | 1);
        assert_eq!(v.attribute_shift(), 4);
    }
}
