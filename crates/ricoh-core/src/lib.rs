//! `ricoh_core` is a cycle-counted NES execution core.
//!
//! [`Core`] owns every component of the console (CPU, PPU, APU, cartridge,
//! work RAM, controllers) and interleaves them: after each CPU instruction
//! of `c` cycles the PPU is stepped `3c` dots (NTSC) or `3.2c` dots (PAL)
//! and the APU `c` cycles. Completed frames and resampled audio leave the
//! core through the traits in [`sink`]; controller input arrives through an
//! [`sink::InputSource`] or [`Core::set_button`].
//!
//! The library never installs a `tracing` subscriber. Cartridge loads,
//! resets and DMA are logged at `debug`, per-instruction disassembly at
//! `trace` under the `ricoh_core::trace` target.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{Level, debug, trace, warn};

use crate::{
    apu::Apu,
    audio::Resampler,
    bus::{AddressMap, Bus, CpuBus, CpuDevice, OpenBus, cpu::cpu_address_map},
    cartridge::Cartridge,
    config::{CoreConfig, Region},
    controller::{Button, Controller, ControllerEvent},
    cpu::{Cpu, CpuOptions},
    error::HostBackendError,
    memory::cpu as cpu_mem,
    ppu::{FrameBuffer, Ppu},
    sink::{AudioSink, InputSource, VideoSink},
};

pub mod apu;
pub mod audio;
pub mod bus;
pub mod cartridge;
pub mod config;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod memory;
pub mod ppu;
pub mod sink;

pub use error::{Error, Result};

/// Bytes moved by one OAM DMA.
const OAM_DMA_LEN: u16 = 256;
/// CPU cycles an OAM DMA holds the CPU, plus one when it starts on an odd
/// cycle.
const OAM_DMA_CYCLES: u16 = 513;
/// Cycles the CPU spends in its reset sequence.
const RESET_CYCLES: u32 = 7;

/// Why [`Core::step_frame`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The PPU finished a frame; it is available from [`Core::frame`].
    Frame,
    /// A [`QuitHandle`] was triggered. The core stopped on an instruction
    /// boundary and may be stepped again after [`QuitHandle::clear`].
    Quit,
}

/// Cross-thread stop request, checked between instructions.
#[derive(Debug, Clone, Default)]
pub struct QuitHandle(Arc<AtomicBool>);

impl QuitHandle {
    pub fn quit(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_quit(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Which sinks are fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Recording {
    video: bool,
    audio: bool,
}

/// A host sink and its run of consecutive failures.
struct Attached<T: ?Sized> {
    sink: Box<T>,
    failures: u32,
}

impl<T: ?Sized> Attached<T> {
    fn new(sink: Box<T>) -> Self {
        Self { sink, failures: 0 }
    }
}

type ErrorHook = Box<dyn FnMut(&Error) + Send>;

/// Everything on the CPU bus. Kept apart from [`Cpu`] so a [`CpuBus`] can
/// borrow it while the CPU runs.
#[derive(Debug)]
struct Console {
    map: AddressMap<CpuDevice>,
    ram: [u8; cpu_mem::INTERNAL_RAM_SIZE],
    ppu: Ppu,
    apu: Apu,
    cartridge: Cartridge,
    controllers: [Controller; 2],
    open_bus: OpenBus,
    oam_dma_request: Option<u8>,
}

impl Console {
    fn bus(&mut self, cpu_cycle: u64) -> CpuBus<'_> {
        CpuBus {
            map: &self.map,
            ram: &mut self.ram,
            ppu: &mut self.ppu,
            apu: &mut self.apu,
            cartridge: &mut self.cartridge,
            controllers: &mut self.controllers,
            open_bus: &mut self.open_bus,
            oam_dma_request: &mut self.oam_dma_request,
            cpu_cycle,
        }
    }
}

/// The synchronizer: owns the console and steps it a frame or an
/// instruction at a time.
pub struct Core {
    config: CoreConfig,
    region: Region,
    cpu: Cpu,
    console: Console,
    resampler: Resampler,
    /// Samples produced during the last completed frame.
    frame_audio: Vec<i16>,
    /// Fractional PPU dot carry, in units of `1 / den` dots.
    dot_phase: u32,
    video: Option<Attached<dyn VideoSink>>,
    audio: Option<Attached<dyn AudioSink>>,
    input: Option<Box<dyn InputSource>>,
    error_hook: Option<ErrorHook>,
    quit: QuitHandle,
    recording: Recording,
    /// Applied at the next frame boundary.
    pending_recording: Option<Recording>,
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core")
            .field("region", &self.region)
            .field("cpu", &self.cpu)
            .field("ppu", &self.console.ppu)
            .field("apu", &self.console.apu)
            .field("video_attached", &self.video.is_some())
            .field("audio_attached", &self.audio.is_some())
            .field("recording", &self.recording)
            .finish_non_exhaustive()
    }
}

impl Core {
    /// Parses `rom` as an iNES / NES 2.0 image and powers the console on.
    pub fn new(rom: &[u8], config: CoreConfig) -> Result<Self> {
        let cartridge = Cartridge::load(rom)?;
        Self::with_cartridge(cartridge, config)
    }

    pub fn with_cartridge(cartridge: Cartridge, config: CoreConfig) -> Result<Self> {
        let region = config.region.resolve(cartridge.header().tv_system);
        let map = cpu_address_map(&cartridge.cpu_mappings())?;
        let mut ppu = Ppu::new(region, cartridge.ppu_mappings())?;
        ppu.route_nametables(cartridge.mirroring());

        debug!(
            mapper = cartridge.mapper().id(),
            board = cartridge.mapper().name(),
            %region,
            "console assembled"
        );

        let cpu = Cpu::new().with_options(CpuOptions {
            strict_opcodes: config.strict_opcodes,
            break_on_brk: config.break_on_brk,
        });
        let mut core = Self {
            region,
            cpu,
            console: Console {
                map,
                ram: [0; cpu_mem::INTERNAL_RAM_SIZE],
                ppu,
                apu: Apu::new(region),
                cartridge,
                controllers: [Controller::new(); 2],
                open_bus: OpenBus::new(),
                oam_dma_request: None,
            },
            resampler: Resampler::new(region.cpu_clock_hz(), config.sample_rate),
            frame_audio: Vec::new(),
            dot_phase: 0,
            video: None,
            audio: None,
            input: None,
            error_hook: None,
            quit: QuitHandle::default(),
            recording: Recording {
                video: true,
                audio: true,
            },
            pending_recording: None,
            config,
        };
        core.power_on();
        Ok(core)
    }

    /// Cold start. Battery-backed PRG RAM survives; everything else is
    /// reinitialized.
    pub fn power_on(&mut self) {
        let console = &mut self.console;
        console.ram.fill(0);
        console.ppu.power_on();
        console.apu.power_on();
        console.cartridge.power_on();
        if let Some(mirroring) = console.cartridge.take_mirroring_update() {
            console.ppu.route_nametables(mirroring);
        }
        console.controllers = [Controller::new(); 2];
        console.open_bus = OpenBus::new();
        console.oam_dma_request = None;
        self.resampler.reset();
        self.frame_audio.clear();
        self.dot_phase = 0;

        let mut bus = self.console.bus(0);
        self.cpu.power_on(&mut bus);
        self.run_cycles(RESET_CYCLES);
        debug!(pc = format_args!("{:04X}", self.cpu.pc()), "power on");
    }

    /// Reset button. RAM, VRAM, OAM and mapper banks keep their contents.
    pub fn reset(&mut self) {
        let console = &mut self.console;
        console.ppu.reset();
        console.apu.reset();
        console.cartridge.reset();
        if let Some(mirroring) = console.cartridge.take_mirroring_update() {
            console.ppu.route_nametables(mirroring);
        }
        console.oam_dma_request = None;

        let cycles = self.cpu.cycles();
        let mut bus = self.console.bus(cycles);
        self.cpu.reset(&mut bus);
        self.run_cycles(RESET_CYCLES);
        debug!(pc = format_args!("{:04X}", self.cpu.pc()), "reset");
    }

    /// Runs until the PPU completes a frame, then feeds the sinks.
    ///
    /// CPU errors (strict opcodes, BRK in debug runs) stop the frame early
    /// with the CPU still pointing at the offending instruction. Sink
    /// failures never end up here; see [`Core::set_error_hook`].
    pub fn step_frame(&mut self) -> Result<StepOutcome> {
        self.poll_input();
        loop {
            if self.quit.is_quit() {
                return Ok(StepOutcome::Quit);
            }
            if self.run_instruction()? {
                break;
            }
        }
        self.finish_frame();
        Ok(StepOutcome::Frame)
    }

    /// Runs one CPU instruction, interrupt entry or DMA stall cycle. Returns
    /// `true` when a frame completed along the way.
    pub fn step_instruction(&mut self) -> Result<bool> {
        let frame_done = self.run_instruction()?;
        if frame_done {
            self.finish_frame();
        }
        Ok(frame_done)
    }

    fn run_instruction(&mut self) -> Result<bool> {
        if self.cpu.tick_stall() {
            return Ok(self.run_cycles(1));
        }

        let cycle = self.cpu.cycles();
        let mut bus = self.console.bus(cycle);
        if tracing::enabled!(target: "ricoh_core::trace", Level::TRACE) {
            trace!(target: "ricoh_core::trace", "{}", cpu::trace_line(&self.cpu, &bus));
        }
        let cycles = self.cpu.step(&mut bus)?;
        let frame_done = self.run_cycles(cycles as u32);

        if let Some(page) = self.console.oam_dma_request.take() {
            self.oam_dma(page);
        }
        Ok(frame_done)
    }

    /// Copies page `page` into OAM and stalls the CPU for the transfer.
    fn oam_dma(&mut self, page: u8) {
        let cycles = self.cpu.cycles();
        let stall = OAM_DMA_CYCLES + (cycles & 1) as u16;
        debug!(page = format_args!("{page:02X}"), stall, "OAM DMA");

        let base = (page as u16) << 8;
        let mut bus = self.console.bus(cycles);
        for offset in 0..OAM_DMA_LEN {
            let value = bus.read(base | offset);
            bus.ppu.write_oam_dma_byte(value);
        }
        self.cpu.add_stall(stall);
    }

    /// Advances PPU and APU by `cycles` CPU cycles and refreshes the CPU's
    /// interrupt inputs after every PPU dot.
    fn run_cycles(&mut self, cycles: u32) -> bool {
        let (num, den) = self.region.dots_per_cpu_cycle();
        let console = &mut self.console;
        let mut frame_done = false;
        for _ in 0..cycles {
            self.dot_phase += num;
            while self.dot_phase >= den {
                self.dot_phase -= den;
                frame_done |= console.ppu.clock(&mut console.cartridge);
                self.cpu.set_nmi_line(console.ppu.nmi_line());
            }

            let cartridge = &console.cartridge;
            console
                .apu
                .clock(&mut |addr| cartridge.cpu_read(addr).unwrap_or(0));
            self.resampler.push(console.apu.output());
            self.cpu
                .set_irq_line(console.apu.irq() || console.cartridge.irq());
        }
        frame_done
    }

    fn finish_frame(&mut self) {
        self.frame_audio.clear();
        self.frame_audio.extend(self.resampler.drain());

        let limit = self.config.max_sink_failures;
        if self.recording.video {
            if let Some(slot) = self.video.as_mut() {
                let result = slot.sink.present(self.console.ppu.frame());
                settle(&mut self.video, result, limit, &mut self.error_hook);
            }
        }
        if self.recording.audio && !self.frame_audio.is_empty() {
            if let Some(slot) = self.audio.as_mut() {
                let result = slot.sink.push_samples(&self.frame_audio);
                settle(&mut self.audio, result, limit, &mut self.error_hook);
            }
        }

        if let Some(recording) = self.pending_recording.take() {
            debug!(video = recording.video, audio = recording.audio, "recording toggled");
            self.recording = recording;
        }
    }

    fn poll_input(&mut self) {
        let Some(input) = self.input.as_mut() else {
            return;
        };
        while let Some(event) = input.poll() {
            apply_event(&mut self.console.controllers, event);
        }
    }

    // ---- host wiring ------------------------------------------------------

    pub fn attach_video(&mut self, sink: impl VideoSink + 'static) {
        self.video = Some(Attached::new(Box::new(sink)));
    }

    pub fn attach_audio(&mut self, sink: impl AudioSink + 'static) {
        self.audio = Some(Attached::new(Box::new(sink)));
    }

    pub fn attach_input(&mut self, source: impl InputSource + 'static) {
        self.input = Some(Box::new(source));
    }

    pub fn detach_video(&mut self) {
        self.video = None;
    }

    pub fn detach_audio(&mut self) {
        self.audio = None;
    }

    pub fn video_attached(&self) -> bool {
        self.video.is_some()
    }

    pub fn audio_attached(&self) -> bool {
        self.audio.is_some()
    }

    /// Called with every sink failure, after it has been logged.
    pub fn set_error_hook(&mut self, hook: impl FnMut(&Error) + Send + 'static) {
        self.error_hook = Some(Box::new(hook));
    }

    pub fn quit_handle(&self) -> QuitHandle {
        self.quit.clone()
    }

    /// Turns feeding of the video and audio sinks on or off from the next
    /// frame boundary.
    pub fn set_recording(&mut self, video: bool, audio: bool) {
        self.pending_recording = Some(Recording { video, audio });
    }

    pub fn set_button(&mut self, port: u8, button: Button, pressed: bool) {
        apply_event(
            &mut self.console.controllers,
            ControllerEvent::new(port, button, pressed),
        );
    }

    // ---- inspection -------------------------------------------------------

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Timing actually in use, after `Auto` was resolved.
    pub fn region(&self) -> Region {
        self.region
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn ppu(&self) -> &Ppu {
        &self.console.ppu
    }

    pub fn apu(&self) -> &Apu {
        &self.console.apu
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.console.cartridge
    }

    /// Last completed frame.
    pub fn frame(&self) -> &FrameBuffer {
        self.console.ppu.frame()
    }

    /// Samples the APU produced during the last completed frame.
    pub fn frame_audio(&self) -> &[i16] {
        &self.frame_audio
    }

    /// Reads CPU memory without side effects.
    pub fn peek_cpu(&mut self, addr: u16) -> u8 {
        let cycles = self.cpu.cycles();
        self.console.bus(cycles).peek(addr)
    }

    /// nestest-style disassembly of the next instruction.
    pub fn trace_line(&mut self) -> String {
        let cycles = self.cpu.cycles();
        let bus = self.console.bus(cycles);
        cpu::trace_line(&self.cpu, &bus)
    }

    /// Points the CPU somewhere else, e.g. `$C000` for nestest's automated
    /// mode.
    pub fn set_pc(&mut self, pc: u16) {
        self.cpu.set_pc(pc);
    }

    /// PPU dots since power-on.
    pub fn dot_counter(&self) -> u64 {
        self.console.ppu.master_dot()
    }

    pub fn cpu_cycles(&self) -> u64 {
        self.cpu.cycles()
    }

    pub fn frame_count(&self) -> u64 {
        self.console.ppu.frame_count()
    }

    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.console.cartridge.battery_ram()
    }

    pub fn load_battery_ram(&mut self, data: &[u8]) {
        self.console.cartridge.load_battery_ram(data);
    }
}

fn apply_event(controllers: &mut [Controller; 2], event: ControllerEvent) {
    match controllers.get_mut(event.port as usize) {
        Some(pad) => pad.set_button(event.button, event.pressed),
        None => trace!(port = event.port, "event for missing controller port"),
    }
}

/// Books one sink call: resets the failure run on success, otherwise logs,
/// reports to the hook and detaches the sink once `limit` is reached.
fn settle<T: ?Sized>(
    slot: &mut Option<Attached<T>>,
    result: std::result::Result<(), HostBackendError>,
    limit: u32,
    hook: &mut Option<ErrorHook>,
) {
    let Some(attached) = slot.as_mut() else {
        return;
    };
    let err = match result {
        Ok(()) => {
            attached.failures = 0;
            return;
        }
        Err(err) => err,
    };

    attached.failures += 1;
    warn!(
        backend = err.backend,
        failures = attached.failures,
        "{}",
        err.message
    );
    let detach = attached.failures >= limit;
    if let Some(hook) = hook.as_mut() {
        hook(&Error::HostBackend(err.clone()));
    }
    if detach {
        warn!(backend = err.backend, "detaching sink after repeated failures");
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use ctor::ctor;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    use super::*;
    use crate::cartridge::tests::nrom_image;

    #[ctor]
    fn init_tracing() {
        let subscriber = FmtSubscriber::builder()
            .with_file(true)
            .with_line_number(true)
            .with_max_level(Level::DEBUG)
            .pretty()
            .finish();
        tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
    }

    /// NROM image whose reset vector points at `program`, loaded at `$8000`.
    fn program_rom(program: &[u8]) -> Vec<u8> {
        let program = program.to_vec();
        nrom_image(1, 1, move |i| match i {
            0x3FFC => 0x00,
            0x3FFD => 0x80,
            // NMI and IRQ land on an RTI at $8FF0.
            0x3FFA | 0x3FFE => 0xF0,
            0x3FFB | 0x3FFF => 0x8F,
            0x0FF0 => 0x40,
            i if i < program.len() => program[i],
            _ => 0xEA,
        })
    }

    /// `loop: JMP loop`.
    const SPIN: [u8; 3] = [0x4C, 0x00, 0x80];

    #[test]
    fn power_on_loads_reset_vector() {
        let core = Core::new(&program_rom(&SPIN), CoreConfig::default()).unwrap();
        assert_eq!(core.cpu().pc(), 0x8000);
        assert_eq!(core.cpu().sp(), 0xFD);
        assert_eq!(core.cpu_cycles(), 7);
        assert_eq!(core.dot_counter(), 21);
        assert_eq!(core.region(), Region::Ntsc);
    }

    #[test]
    fn ppu_runs_three_dots_per_cpu_cycle() {
        let mut core = Core::new(&program_rom(&SPIN), CoreConfig::default()).unwrap();
        for _ in 0..100 {
            let cycles = core.cpu_cycles();
            let dots = core.dot_counter();
            core.step_instruction().unwrap();
            assert_eq!(core.dot_counter() - dots, 3 * (core.cpu_cycles() - cycles));
        }
    }

    #[test]
    fn pal_runs_sixteen_dots_per_five_cycles() {
        let config = CoreConfig::default().with_region(Region::Pal);
        let mut core = Core::new(&program_rom(&SPIN), config).unwrap();
        while core.cpu_cycles() < 7 + 5 * 300 {
            core.step_instruction().unwrap();
        }
        let cycles = core.cpu_cycles();
        let dots = core.dot_counter();
        assert!((dots as i64 - (cycles * 16 / 5) as i64).abs() <= 1);
    }

    #[test]
    fn step_frame_returns_once_per_frame() {
        let mut core = Core::new(&program_rom(&SPIN), CoreConfig::default()).unwrap();
        assert_eq!(core.step_frame().unwrap(), StepOutcome::Frame);
        assert_eq!(core.frame_count(), 1);
        assert_eq!(core.step_frame().unwrap(), StepOutcome::Frame);
        assert_eq!(core.frame_count(), 2);
        // One NTSC frame of audio at 44.1 kHz.
        assert!((730..=740).contains(&core.frame_audio().len()));
    }

    #[test]
    fn quit_handle_stops_between_instructions() {
        let mut core = Core::new(&program_rom(&SPIN), CoreConfig::default()).unwrap();
        let quit = core.quit_handle();
        quit.quit();
        assert_eq!(core.step_frame().unwrap(), StepOutcome::Quit);
        quit.clear();
        assert_eq!(core.step_frame().unwrap(), StepOutcome::Frame);
    }

    #[test]
    fn oam_dma_copies_a_page_and_stalls() {
        // LDX #0; loop: TXA; STA $0200,X; INX; BNE loop; LDA #$02; STA $4014; JMP *
        let program = [
            0xA2, 0x00, 0x8A, 0x9D, 0x00, 0x02, 0xE8, 0xD0, 0xF9, 0xA9, 0x02, 0x8D, 0x14, 0x40,
            0x4C, 0x0E, 0x80,
        ];
        let mut core = Core::new(&program_rom(&program), CoreConfig::default()).unwrap();
        while core.cpu().pc() != 0x800E {
            core.step_instruction().unwrap();
        }
        let before = core.cpu_cycles();
        // The stall is paid one cycle per step.
        let mut steps = 0;
        while core.cpu.stalled() {
            core.step_instruction().unwrap();
            steps += 1;
        }
        assert!(steps == 513 || steps == 514);
        assert_eq!(core.cpu_cycles() - before, steps);
        let oam = core.ppu().oam();
        assert!(oam.iter().enumerate().all(|(i, &b)| b == i as u8));
    }

    #[test]
    fn brk_surfaces_in_debug_mode() {
        let config = CoreConfig::default().with_break_on_brk(true);
        let mut core = Core::new(&program_rom(&[0xEA, 0x00]), config).unwrap();
        core.step_instruction().unwrap();
        let err = core.step_instruction().unwrap_err();
        assert!(matches!(err, Error::BreakEncountered { pc: 0x8001 }));
        assert_eq!(core.cpu().pc(), 0x8001);
    }

    #[test]
    fn strict_mode_rejects_unstable_opcodes() {
        // SHY $0200,X
        let config = CoreConfig::default().with_strict_opcodes(true);
        let mut core = Core::new(&program_rom(&[0x9C, 0x00, 0x02]), config).unwrap();
        let err = core.step_instruction().unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedOpcode {
                opcode: 0x9C,
                pc: 0x8000
            }
        ));

        let mut relaxed = Core::new(&program_rom(&[0x9C, 0x00, 0x02]), CoreConfig::default())
            .unwrap();
        relaxed.step_instruction().unwrap();
    }

    #[test]
    fn failing_sink_is_detached_and_reported() {
        let config = CoreConfig::default().with_max_sink_failures(3);
        let mut core = Core::new(&program_rom(&SPIN), config).unwrap();
        let seen = Arc::new(Mutex::new(0));
        let hook_seen = Arc::clone(&seen);
        core.set_error_hook(move |err| {
            assert!(matches!(err, Error::HostBackend(_)));
            *hook_seen.lock().unwrap() += 1;
        });
        core.attach_video(|_: &FrameBuffer| -> std::result::Result<(), HostBackendError> {
            Err(HostBackendError::new("video", "gone"))
        });

        for _ in 0..2 {
            core.step_frame().unwrap();
        }
        assert!(core.video_attached());
        core.step_frame().unwrap();
        assert!(!core.video_attached());
        assert_eq!(*seen.lock().unwrap(), 3);

        // Emulation carries on.
        assert_eq!(core.step_frame().unwrap(), StepOutcome::Frame);
    }

    #[test]
    fn recording_toggle_waits_for_frame_boundary() {
        let mut core = Core::new(&program_rom(&SPIN), CoreConfig::default()).unwrap();
        let frames = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&frames);
        core.attach_video(
            move |_: &FrameBuffer| -> std::result::Result<(), HostBackendError> {
                *counter.lock().unwrap() += 1;
                Ok(())
            },
        );

        core.step_frame().unwrap();
        core.set_recording(false, true);
        // This frame was already underway: still delivered.
        core.step_frame().unwrap();
        core.step_frame().unwrap();
        assert_eq!(*frames.lock().unwrap(), 2);

        core.set_recording(true, true);
        core.step_frame().unwrap();
        core.step_frame().unwrap();
        assert_eq!(*frames.lock().unwrap(), 3);
    }

    #[test]
    fn input_source_feeds_controllers() {
        // LDA #1; STA $4016; LDA #0; STA $4016; LDA $4016; STA $10; JMP *
        let program = [
            0xA9, 0x01, 0x8D, 0x16, 0x40, 0xA9, 0x00, 0x8D, 0x16, 0x40, 0xAD, 0x16, 0x40, 0x85,
            0x10, 0x4C, 0x0F, 0x80,
        ];
        let mut core = Core::new(&program_rom(&program), CoreConfig::default()).unwrap();
        let (sender, source) = sink::input_channel();
        core.attach_input(source);
        sender.press(0, Button::A).unwrap();
        core.step_frame().unwrap();
        assert_eq!(core.peek_cpu(0x0010), 0x41);
    }

    #[test]
    fn reset_keeps_ram_and_drops_stack_pointer() {
        // LDA #$5A; STA $0300; JMP *
        let program = [0xA9, 0x5A, 0x8D, 0x00, 0x03, 0x4C, 0x05, 0x80];
        let mut core = Core::new(&program_rom(&program), CoreConfig::default()).unwrap();
        core.step_frame().unwrap();
        let sp = core.cpu().sp();
        core.reset();
        assert_eq!(core.peek_cpu(0x0300), 0x5A);
        assert_eq!(core.cpu().sp(), sp.wrapping_sub(3));
        assert_eq!(core.cpu().pc(), 0x8000);

        core.power_on();
        assert_eq!(core.peek_cpu(0x0300), 0x00);
        assert_eq!(core.dot_counter(), 21);
    }

    #[test]
    fn trace_line_disassembles_next_instruction() {
        let mut core = Core::new(&program_rom(&SPIN), CoreConfig::default()).unwrap();
        let line = core.trace_line();
        assert!(line.starts_with("8000  4C 00 80  JMP $8000"), "{line}");
    }
}
