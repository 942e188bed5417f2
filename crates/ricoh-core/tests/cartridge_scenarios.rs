mod common;

use anyhow::Result;
use common::{Asm, RomBuilder, boot, run_to_spin, run_until};
use ricoh_core::{
    Core, Error,
    cartridge::{Mapper, header::Mirroring},
    config::{CoreConfig, Region},
    error::CartridgeError,
};

/// Five serial writes, LSB first, to an MMC1 register.
fn mmc1_write(asm: Asm, addr: u16, value: u8) -> Asm {
    (0..5).fold(asm, |asm, bit| asm.store(addr, (value >> bit) & 1))
}

#[test]
fn mmc1_serial_writes_set_control_and_banks() -> Result<()> {
    let asm = Asm::new(0xC100).store(0x8000, 0x80);
    // Bits 0,1,1,1,0: vertical mirroring, PRG mode 3.
    let asm = mmc1_write(asm, 0x8000, 0b01110)
        .lda_abs(0xC000)
        .sta_zp(0x10)
        .lda_abs(0x8000)
        .sta_zp(0x11);
    let asm = mmc1_write(asm, 0xE000, 2).lda_abs(0x8000).sta_zp(0x12);
    // Odd selections lose bit 0 in this mode.
    let asm = mmc1_write(asm, 0xE000, 3).lda_abs(0x8000).sta_zp(0x13);
    let (spin, program) = asm.spin();
    let rom = RomBuilder::new()
        .mapper(1)
        .prg_banks(4)
        .code_at(0xC100, &program)
        .reset_vector(0xC100)
        .build();

    let mut core = boot(&rom)?;
    run_to_spin(&mut core, spin)?;

    let Mapper::Mmc1(mmc1) = core.cartridge().mapper() else {
        panic!("expected MMC1, got {}", core.cartridge().mapper().name());
    };
    assert_eq!(mmc1.control(), 0x0E);
    assert_eq!(core.cartridge().mirroring(), Mirroring::Vertical);
    assert_eq!(core.peek_cpu(0x0010), 3, "$C000 is fixed to the last bank");
    assert_eq!(core.peek_cpu(0x0011), 0);
    assert_eq!(core.peek_cpu(0x0012), 2);
    assert_eq!(core.peek_cpu(0x0013), 2);
    Ok(())
}

#[test]
fn uxrom_switches_the_low_window() -> Result<()> {
    let (spin, program) = Asm::new(0xC100)
        .store(0x8000, 2)
        .lda_abs(0x8000)
        .sta_zp(0x10)
        .lda_abs(0xC000)
        .sta_zp(0x11)
        .spin();
    let rom = RomBuilder::new()
        .mapper(2)
        .prg_banks(4)
        .code_at(0xC100, &program)
        .reset_vector(0xC100)
        .build();

    let mut core = boot(&rom)?;
    run_to_spin(&mut core, spin)?;
    assert_eq!(core.peek_cpu(0x0010), 2);
    assert_eq!(core.peek_cpu(0x0011), 3);
    Ok(())
}

#[test]
fn cnrom_switches_chr_banks() -> Result<()> {
    let (spin, program) = Asm::new(0xC000)
        .store(0x8000, 2)
        .ppu_addr(0x0000)
        .lda_abs(0x2007)
        .lda_abs(0x2007)
        .sta_zp(0x10)
        .spin();
    let mut builder = RomBuilder::new().mapper(3).chr_banks(4).code_at(0xC000, &program);
    for bank in 0..4u8 {
        builder = builder.chr(bank as usize * 0x2000, &[0xA0 | bank]);
    }

    let mut core = boot(&builder.build())?;
    run_to_spin(&mut core, spin)?;
    assert_eq!(core.peek_cpu(0x0010), 0xA2);
    Ok(())
}

#[test]
fn mmc3_scanline_counter_raises_irq() -> Result<()> {
    let (_, program) = Asm::new(0xE000)
        .store(0xC000, 10)
        .store(0xC001, 0)
        .store(0xE001, 0)
        // Sprites from $1000 give one A12 rise per scanline.
        .store(0x2000, 0x08)
        .store(0x2001, 0x18)
        .raw(&[0x58]) // CLI
        .spin();
    let handler = Asm::new(0xE100)
        .sta_abs(0xE000)
        .inc_zp(0x10)
        .rti()
        .bytes();
    let rom = RomBuilder::new()
        .mapper(4)
        .prg_banks(2)
        .code_at(0xE000, &program)
        .code_at(0xE100, &handler)
        .reset_vector(0xE000)
        .irq_vector(0xE100)
        .build();

    let mut core = boot(&rom)?;
    run_until(&mut core, 100_000, |c| c.cpu().pc() == 0xE100)?;
    let (scanline, _) = core.ppu().position();
    assert!((10..=11).contains(&scanline), "IRQ taken on line {scanline}");
    assert!(core.cpu().status().contains(ricoh_core::cpu::Status::INTERRUPT));

    for _ in 0..3 {
        core.step_instruction()?;
    }
    assert_eq!(core.peek_cpu(0x0010), 1);
    Ok(())
}

#[test]
fn malformed_images_are_rejected() {
    let short = Core::new(b"NES", CoreConfig::default());
    assert!(matches!(
        short,
        Err(Error::InvalidCartridge(CartridgeError::TooShort { actual: 3 }))
    ));

    let mut bad_magic = RomBuilder::new().build();
    bad_magic[0] = b'X';
    assert!(matches!(
        Core::new(&bad_magic, CoreConfig::default()),
        Err(Error::InvalidCartridge(CartridgeError::InvalidMagic))
    ));

    let mut truncated = RomBuilder::new().build();
    truncated.truncate(16 + 0x1000);
    assert!(matches!(
        Core::new(&truncated, CoreConfig::default()),
        Err(Error::InvalidCartridge(CartridgeError::SectionTooShort { .. }))
    ));

    let unknown = RomBuilder::new().mapper(5).build();
    assert!(matches!(
        Core::new(&unknown, CoreConfig::default()),
        Err(Error::InvalidCartridge(CartridgeError::UnsupportedMapper(5)))
    ));
}

#[test]
fn battery_ram_survives_a_new_core() -> Result<()> {
    let (spin, program) = Asm::new(0xC000).store(0x6000, 0x42).spin();
    let rom = RomBuilder::new().battery().code_at(0xC000, &program).build();

    let mut core = boot(&rom)?;
    run_to_spin(&mut core, spin)?;
    let saved = core.battery_ram().map(<[u8]>::to_vec);
    let saved = saved.expect("battery board exposes its RAM");
    assert_eq!(saved[0], 0x42);

    let (idle, program) = Asm::new(0xC000).spin();
    let mut restored = boot(&RomBuilder::new().battery().code_at(0xC000, &program).build())?;
    restored.load_battery_ram(&saved);
    run_to_spin(&mut restored, idle)?;
    assert_eq!(restored.peek_cpu(0x6000), 0x42);

    let plain = boot(&RomBuilder::new().build())?;
    assert!(plain.battery_ram().is_none());
    Ok(())
}

#[test]
fn region_follows_the_header_unless_forced() -> Result<()> {
    let pal = RomBuilder::new().pal().build();
    assert_eq!(boot(&pal)?.region(), Region::Pal);
    assert_eq!(boot(&RomBuilder::new().build())?.region(), Region::Ntsc);

    let forced = Core::new(&pal, CoreConfig::default().with_region(Region::Ntsc))?;
    assert_eq!(forced.region(), Region::Ntsc);
    Ok(())
}
