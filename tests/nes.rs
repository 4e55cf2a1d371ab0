//! End-to-end tests driving the console through hand-built iNES images.

use nemus::bus::Bus;
use nemus::controller::{Button, Controller};
use nemus::cpu::flags::{FLAG_CARRY, FLAG_NEGATIVE, FLAG_OVERFLOW, FLAG_ZERO};
use nemus::error::CpuError;
use nemus::{Frontend, Nes, NesConfig, NesError};

const PRG_SIZE: usize = 0x4000;
const CHR_SIZE: usize = 0x2000;

/// One-bank NROM image with `program` at $8000 and every vector pointing there unless
/// overridden with [`Image::vectors`].
struct Image {
    flags6: u8,
    prg: Vec<u8>,
    chr: Vec<u8>,
}

impl Image {
    fn nrom(program: &[u8]) -> Self {
        let mut prg = vec![0xEA; PRG_SIZE];
        prg[..program.len()].copy_from_slice(program);
        let mut image = Self {
            flags6: 0,
            prg,
            chr: vec![0; CHR_SIZE],
        };
        image.vectors(0x8000, 0x8000, 0x8000);
        image
    }

    fn vectors(&mut self, nmi: u16, reset: u16, irq: u16) -> &mut Self {
        for (offset, vector) in [(0x3FFA, nmi), (0x3FFC, reset), (0x3FFE, irq)] {
            self.prg[offset..offset + 2].copy_from_slice(&vector.to_le_bytes());
        }
        self
    }

    fn at(&mut self, addr: u16, code: &[u8]) -> &mut Self {
        let offset = (addr - 0x8000) as usize % PRG_SIZE;
        self.prg[offset..offset + code.len()].copy_from_slice(code);
        self
    }

    fn bytes(&self) -> Vec<u8> {
        let mut data = vec![b'N', b'E', b'S', 0x1A, 1, 1, self.flags6, 0];
        data.resize(16, 0);
        data.extend_from_slice(&self.prg);
        data.extend_from_slice(&self.chr);
        data
    }
}

fn boot(image: &Image) -> Nes {
    let mut nes = Nes::new(NesConfig { speed: 0.0 });
    nes.load_game(&image.bytes()).unwrap();
    nes
}

#[test]
fn adc_immediate_from_reset_vector() {
    let mut nes = boot(&Image::nrom(&[0x69, 0x05]));

    assert_eq!(nes.step().unwrap(), 2);
    let regs = nes.cpu().unwrap().regs;
    assert_eq!(regs.a, 5);
    assert_eq!(regs.pc, 0x8002);
    for flag in [FLAG_CARRY, FLAG_ZERO, FLAG_OVERFLOW, FLAG_NEGATIVE] {
        assert!(!regs.flag(flag));
    }
}

#[test]
fn adc_immediate_adds_carry_in() {
    let mut nes = boot(&Image::nrom(&[0x69, 0x05]));
    nes.cpu_mut().unwrap().regs.set_flag(FLAG_CARRY, true);

    nes.step().unwrap();
    let regs = nes.cpu().unwrap().regs;
    assert_eq!(regs.a, 6);
    assert!(!regs.flag(FLAG_CARRY));
}

#[test]
fn chr_rom_is_visible_to_the_ppu() {
    let mut image = Image::nrom(&[]);
    image.chr[0] = 0xFE;
    let nes = boot(&image);
    assert_eq!(nes.cpu().unwrap().bus.read_ppu_byte(0x0000), 0xFE);
}

#[test]
fn sixteen_kilobyte_prg_appears_twice() {
    let mut nes = boot(&Image::nrom(&[0xA9, 0x42]));
    let bus = &mut nes.cpu_mut().unwrap().bus;
    assert_eq!(bus.read_byte(0x8000).unwrap(), 0xA9);
    assert_eq!(bus.read_byte(0xC000).unwrap(), 0xA9);
}

#[test]
fn nothing_runs_without_a_game() {
    let mut nes = Nes::default();
    assert!(!nes.is_loaded());
    assert!(matches!(nes.step(), Err(NesError::NoGameLoaded)));
    assert!(nes.pixels().is_none());
}

#[test]
fn bad_image_is_rejected() {
    let mut nes = Nes::default();
    assert!(matches!(
        nes.load_game(b"not a rom"),
        Err(NesError::Cartridge { .. })
    ));
}

#[test]
fn vblank_nmi_runs_handler_once_per_frame() {
    let mut image = Image::nrom(&[
        0xA9, 0x80, // LDA #$80
        0x8D, 0x00, 0x20, // STA $2000
        0x4C, 0x05, 0x80, // JMP $8005
    ]);
    image
        .at(0x8010, &[0xE6, 0x10, 0x40]) // INC $10; RTI
        .vectors(0x8010, 0x8000, 0x8000);
    let mut nes = boot(&image);

    // The first frame boundary comes right after reset
    nes.step_frame().unwrap();
    assert_eq!(nes.cpu().unwrap().bus.ram[0x10], 0);
    for _ in 0..3 {
        nes.step_frame().unwrap();
    }
    assert_eq!(nes.cpu().unwrap().bus.ram[0x10], 3);
}

#[test]
fn unimplemented_opcode_stops_the_console() {
    let mut nes = boot(&Image::nrom(&[0xEA, 0x02]));
    nes.step().unwrap();
    assert!(matches!(
        nes.step(),
        Err(NesError::Cpu {
            source: CpuError::UnimplementedOpcode { opcode: 0x02, pc: 0x8001, .. }
        })
    ));
    assert!(matches!(
        nes.step(),
        Err(NesError::Cpu {
            source: CpuError::Halted
        })
    ));

    nes.reset().unwrap();
    assert_eq!(nes.step().unwrap(), 2);
}

#[test]
fn battery_ram_survives_a_reload() {
    let mut image = Image::nrom(&[
        0xA9, 0x77, // LDA #$77
        0x8D, 0x00, 0x60, // STA $6000
    ]);
    image.flags6 = 0x02;
    let mut nes = boot(&image);
    nes.step().unwrap();
    nes.step().unwrap();
    let save = nes.save_ram().unwrap();
    assert_eq!(save[0], 0x77);

    let mut reloaded = Nes::default();
    reloaded.load_game_with_save(&image.bytes(), &save).unwrap();
    let bus = &mut reloaded.cpu_mut().unwrap().bus;
    assert_eq!(bus.read_byte(0x6000).unwrap(), 0x77);
}

#[test]
fn no_save_ram_without_battery() {
    let nes = boot(&Image::nrom(&[]));
    assert!(nes.save_ram().is_none());
}

#[test]
fn controller_reads_through_4016() {
    let image = Image::nrom(&[
        0xA9, 0x01, // LDA #$01
        0x8D, 0x16, 0x40, // STA $4016
        0xA9, 0x00, // LDA #$00
        0x8D, 0x16, 0x40, // STA $4016
        0xAD, 0x16, 0x40, // LDA $4016 (A)
        0x85, 0x00, // STA $00
        0xAD, 0x16, 0x40, // LDA $4016 (B)
        0x85, 0x01, // STA $01
    ]);
    let mut nes = boot(&image);
    nes.controller_mut().unwrap().set_button(Button::B, true);
    for _ in 0..8 {
        nes.step().unwrap();
    }
    let ram = &nes.cpu().unwrap().bus.ram;
    assert_eq!((ram[0], ram[1]), (0, 1));
}

#[test]
fn mmc1_switches_prg_banks() {
    let mut data = vec![b'N', b'E', b'S', 0x1A, 4, 0, 0x10, 0];
    data.resize(16, 0);
    for bank in 0..4u8 {
        let mut prg = vec![bank; PRG_SIZE];
        prg[0x3FFC..0x3FFE].copy_from_slice(&0xC000u16.to_le_bytes());
        data.extend_from_slice(&prg);
    }
    let mut nes = Nes::default();
    nes.load_game(&data).unwrap();

    let bus = &mut nes.cpu_mut().unwrap().bus;
    assert_eq!(bus.read_byte(0xC000).unwrap(), 3);
    for bit in 0..5 {
        bus.write_byte(0xE000, (2 >> bit) & 1).unwrap();
    }
    assert_eq!(bus.read_byte(0x8000).unwrap(), 2);
    assert_eq!(bus.read_byte(0xC000).unwrap(), 3);
}

/// Presents a fixed number of frames, pressing Start on the way.
struct CountingFrontend {
    frames: usize,
    limit: usize,
}

impl Frontend for CountingFrontend {
    fn present(&mut self, pixels: &[u32]) {
        assert_eq!(pixels.len(), 256 * 240);
        self.frames += 1;
    }

    fn poll_input(&mut self, controller: &mut Controller) {
        controller.set_button(Button::Start, true);
    }

    fn quit_requested(&self) -> bool {
        self.frames >= self.limit
    }
}

#[test]
fn run_presents_frames_until_quit() {
    let mut nes = boot(&Image::nrom(&[0x4C, 0x00, 0x80])); // JMP $8000
    let mut frontend = CountingFrontend {
        frames: 0,
        limit: 3,
    };
    nes.run(&mut frontend).unwrap();
    assert_eq!(frontend.frames, 3);
    assert!(nes.controller_mut().unwrap().is_pressed(Button::Start));
}

#[test]
fn run_reports_a_halt() {
    let mut nes = boot(&Image::nrom(&[0x02]));
    let mut frontend = CountingFrontend {
        frames: 0,
        limit: 10,
    };
    assert!(matches!(
        nes.run(&mut frontend),
        Err(NesError::Cpu { .. })
    ));
    assert_eq!(frontend.frames, 0);
}

#[test]
fn frame_pacing_follows_speed() {
    let normal = NesConfig::default().frame_duration().unwrap();
    assert_eq!(normal.as_micros(), 16_639);
    let double = NesConfig { speed: 2.0 }.frame_duration().unwrap();
    assert_eq!(double.as_micros(), 8_319);
    assert_eq!(NesConfig { speed: 0.0 }.frame_duration(), None);
    assert_eq!(NesConfig { speed: -1.0 }.frame_duration(), None);
    // Frame time too long to represent runs unthrottled instead of panicking
    assert_eq!(NesConfig { speed: 1e-320 }.frame_duration(), None);
}
