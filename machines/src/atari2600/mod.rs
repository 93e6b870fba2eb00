mod bus;

pub use bus::{RAM_SIZE, Region, SystemBus, decode};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use vcs_core::core::{
    AudioSink, Bus, BusMaster, BusMasterComponent, Component, InputButton, Machine, NullSink,
    PixelSink,
};
use vcs_core::cpu::m6502::{CpuFault, DispatchStrategy, M6502};
use vcs_core::cpu::{Cpu, CpuStateTrait, M6502State};
use vcs_core::device::tia::{AUDIO_SAMPLE_RATE, FRAME_LINES, FuturePixels, VISIBLE_WIDTH, palette};
use vcs_core::device::{BankScheme, Cartridge, Riot, Tia};

use crate::error::MachineError;

// ---------------------------------------------------------------------------
// Input button IDs
// ---------------------------------------------------------------------------
pub const INPUT_P0_UP: u8 = 0;
pub const INPUT_P0_DOWN: u8 = 1;
pub const INPUT_P0_LEFT: u8 = 2;
pub const INPUT_P0_RIGHT: u8 = 3;
pub const INPUT_P0_FIRE: u8 = 4;
pub const INPUT_P1_UP: u8 = 5;
pub const INPUT_P1_DOWN: u8 = 6;
pub const INPUT_P1_LEFT: u8 = 7;
pub const INPUT_P1_RIGHT: u8 = 8;
pub const INPUT_P1_FIRE: u8 = 9;
pub const INPUT_RESET: u8 = 10;
pub const INPUT_SELECT: u8 = 11;
/// Held = black and white.
pub const INPUT_BW: u8 = 12;
/// Held = difficulty A.
pub const INPUT_P0_DIFFICULTY: u8 = 13;
pub const INPUT_P1_DIFFICULTY: u8 = 14;

const VCS_INPUT_MAP: &[InputButton] = &[
    InputButton { id: INPUT_P0_UP, name: "P1 Up" },
    InputButton { id: INPUT_P0_DOWN, name: "P1 Down" },
    InputButton { id: INPUT_P0_LEFT, name: "P1 Left" },
    InputButton { id: INPUT_P0_RIGHT, name: "P1 Right" },
    InputButton { id: INPUT_P0_FIRE, name: "P1 Fire" },
    InputButton { id: INPUT_P1_UP, name: "P2 Up" },
    InputButton { id: INPUT_P1_DOWN, name: "P2 Down" },
    InputButton { id: INPUT_P1_LEFT, name: "P2 Left" },
    InputButton { id: INPUT_P1_RIGHT, name: "P2 Right" },
    InputButton { id: INPUT_P1_FIRE, name: "P2 Fire" },
    InputButton { id: INPUT_RESET, name: "Game Reset" },
    InputButton { id: INPUT_SELECT, name: "Game Select" },
    InputButton { id: INPUT_BW, name: "B/W" },
    InputButton { id: INPUT_P0_DIFFICULTY, name: "P1 Difficulty A" },
    InputButton { id: INPUT_P1_DIFFICULTY, name: "P2 Difficulty A" },
];

/// SWCHB with both console buttons released, color, difficulty B.
pub const SWCHB_DEFAULT: u8 = 0x0B;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
// NTSC color clock: 3.579545 MHz
// CPU clock: color clock / 3 = 1.193 MHz
// 228 color clocks (76 CPU cycles) per scanline
pub const COLOR_CLOCKS_PER_CYCLE: u64 = 3;

/// What the scheduler does when the CPU reports an opcode it cannot run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpcodePolicy {
    /// Stop and report [`MachineError::UnimplementedOpcode`].
    #[default]
    Fatal,
    /// Log a warning and continue past the opcode byte.
    Skip,
}

impl std::str::FromStr for OpcodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fatal" => Ok(Self::Fatal),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown opcode policy '{other}' (expected fatal or skip)")),
        }
    }
}

/// Startup choices for a machine. Everything here is host configuration,
/// never part of a snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct MachineConfig {
    pub dispatch: DispatchStrategy,
    pub delays: FuturePixels,
    pub policy: OpcodePolicy,
}

/// Atari 2600 (NTSC)
///
/// Hardware: MOS 6507 @ 1.19 MHz, TIA video/audio, 6532 RIOT
/// (128 bytes RAM, timer, two I/O ports), 4K cartridge window.
///
/// Memory map (13 address lines, mirrored through 64K):
///   0x0000-0x007F  TIA (writes decode A0-A5, reads A0-A3)
///   0x0080-0x00FF  RIOT RAM (mirrored at 0x0180, the stack page)
///   0x0280-0x0297  RIOT ports and timer
///   0x1000-0x1FFF  Cartridge window (bank-switched)
///
/// Each [`advance`](Self::advance) is one CPU cycle: three TIA color
/// clocks, one RIOT clock, then one CPU cycle unless WSYNC holds RDY.
pub struct Atari2600 {
    cpu: M6502,
    bus: SystemBus,
    cycles: u64,
    paused: bool,
    policy: OpcodePolicy,
    // Host-side button state, re-applied after a power cycle
    fire: [bool; 2],
    video: Box<dyn PixelSink>,
    audio: Box<dyn AudioSink>,
    pcm: Vec<i16>,
}

impl Atari2600 {
    /// Power on with a cartridge already validated by [`Cartridge::load`].
    pub fn new(cart: Cartridge, config: &MachineConfig) -> Self {
        let mut machine = Self {
            cpu: M6502::with_dispatch(config.dispatch),
            bus: SystemBus::new(Tia::new(config.delays), cart),
            cycles: 0,
            paused: false,
            policy: config.policy,
            fire: [false; 2],
            video: Box::new(NullSink),
            audio: Box::new(NullSink),
            pcm: Vec::new(),
        };
        machine.bus.riot.set_port_b_input(SWCHB_DEFAULT);
        machine.cpu.reset_with_bus(&mut machine.bus, BusMaster::Cpu(0));
        debug!(
            "power on: {}, reset vector ${:04X}",
            machine.bus.cart.identity(),
            machine.cpu.pc
        );
        machine
    }

    /// Build a cartridge from a ROM image and power on. Image errors are
    /// reported before any machine state exists.
    pub fn from_rom(
        rom: &[u8],
        scheme: Option<BankScheme>,
        config: &MachineConfig,
    ) -> Result<Self, MachineError> {
        let cart = Cartridge::load(rom, scheme)?;
        Ok(Self::new(cart, config))
    }

    // -----------------------------------------------------------------------
    // Scheduler
    // -----------------------------------------------------------------------

    /// One CPU cycle. Returns true when an instruction completed.
    ///
    /// The TIA always gets its three color clocks; RDY is sampled after
    /// them, so a WSYNC halt ends on the cycle whose last color clock
    /// wraps the line.
    pub fn advance(&mut self) -> Result<bool, MachineError> {
        for _ in 0..COLOR_CLOCKS_PER_CYCLE {
            self.bus.tia.tick();
        }
        self.bus.riot.tick();
        self.cycles += 1;

        let completed = self.cpu.tick_with_bus(&mut self.bus, BusMaster::Cpu(0));

        if self.bus.tia.take_frame_ready() {
            self.deliver_frame();
        }

        if completed && let Some(fault) = self.cpu.take_fault() {
            let CpuFault::UnimplementedOpcode { pc, opcode } = fault;
            match self.policy {
                OpcodePolicy::Fatal => {
                    return Err(MachineError::UnimplementedOpcode { pc, opcode });
                }
                OpcodePolicy::Skip => {
                    warn!("skipping unimplemented opcode ${opcode:02X} at ${pc:04X}");
                }
            }
        }
        Ok(completed)
    }

    /// Advance until `predicate` holds or the machine is paused. The
    /// predicate is checked before every cycle.
    pub fn run_until<F>(&mut self, mut predicate: F) -> Result<(), MachineError>
    where
        F: FnMut(&Atari2600) -> bool,
    {
        while !self.paused && !predicate(self) {
            self.advance()?;
        }
        Ok(())
    }

    /// Run the rest of the current instruction (or the whole next one at
    /// a boundary). Returns the cycles spent, WSYNC stalls included.
    pub fn step_instruction(&mut self) -> Result<u64, MachineError> {
        let start = self.cycles;
        while !self.advance()? {}
        Ok(self.cycles - start)
    }

    /// Monotonic CPU cycle counter. Each cycle is three color clocks.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn color_clocks(&self) -> u64 {
        self.cycles * COLOR_CLOCKS_PER_CYCLE
    }

    pub fn frame_count(&self) -> u64 {
        self.bus.tia.frame_count()
    }

    pub fn at_instruction_boundary(&self) -> bool {
        self.cpu.at_instruction_boundary()
    }

    /// Finish the instruction in flight, then stop `run_until`/`run_frame`
    /// from advancing. Snapshots and stepping are valid while paused.
    pub fn pause(&mut self) -> Result<(), MachineError> {
        if !self.cpu.at_instruction_boundary() {
            self.step_instruction()?;
        }
        self.paused = true;
        Ok(())
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_opcode_policy(&mut self, policy: OpcodePolicy) {
        self.policy = policy;
    }

    pub fn set_dispatch(&mut self, dispatch: DispatchStrategy) {
        self.cpu.set_dispatch(dispatch);
    }

    pub fn set_delays(&mut self, delays: FuturePixels) {
        self.bus.tia.set_delays(delays);
    }

    // -----------------------------------------------------------------------
    // Sinks
    // -----------------------------------------------------------------------

    pub fn attach_video(&mut self, sink: Box<dyn PixelSink>) {
        self.video = sink;
    }

    pub fn attach_audio(&mut self, sink: Box<dyn AudioSink>) {
        self.audio = sink;
    }

    /// Hand the just-completed frame and its audio to the sinks.
    fn deliver_frame(&mut self) {
        let (width, height) = self.display_size();
        let mut rgb = vec![0u8; (width * height * 3) as usize];
        self.render_frame(&mut rgb);
        self.video.present_frame(width, height, &rgb);

        // 0-30 mixed levels to signed 16-bit centered on 15
        self.pcm.clear();
        self.pcm.extend(
            self.bus
                .tia
                .drain_audio()
                .into_iter()
                .map(|s| ((s as i32 - 15) * 2184) as i16),
        );
        self.audio.push_samples(AUDIO_SAMPLE_RATE, &self.pcm);
    }

    // -----------------------------------------------------------------------
    // Inspection and editing
    // -----------------------------------------------------------------------

    pub fn cpu(&self) -> &M6502 {
        &self.cpu
    }

    pub fn cpu_state(&self) -> M6502State {
        self.cpu.snapshot()
    }

    pub fn tia(&self) -> &Tia {
        &self.bus.tia
    }

    pub fn riot(&self) -> &Riot {
        &self.bus.riot
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.bus.cart
    }

    pub fn ram(&self) -> &[u8; RAM_SIZE] {
        &self.bus.ram
    }

    /// Read any address without side effects.
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// Debugger write through the bus: RAM, or the ROM byte under the
    /// active bank for cartridge addresses.
    pub fn poke(&mut self, addr: u16, data: u8) {
        self.bus.write(BusMaster::Debugger, addr, data);
    }

    pub(crate) fn parts(&self) -> (&M6502, &SystemBus) {
        (&self.cpu, &self.bus)
    }

    /// Swap in fully validated state in one step.
    pub(crate) fn replace_state(&mut self, cpu: M6502, bus: SystemBus, cycles: u64) {
        self.cpu = cpu;
        self.bus = bus;
        self.cycles = cycles;
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    fn set_joystick_bit(&mut self, mask: u8, pressed: bool) {
        let swcha = self.bus.riot.port_a_input();
        let swcha = if pressed { swcha & !mask } else { swcha | mask };
        self.bus.riot.set_port_a_input(swcha);
    }

    fn set_switch_bit(&mut self, mask: u8, set: bool) {
        let swchb = self.bus.riot.port_b_input();
        let swchb = if set { swchb | mask } else { swchb & !mask };
        self.bus.riot.set_port_b_input(swchb);
    }

    fn set_fire(&mut self, player: usize, pressed: bool) {
        self.fire[player] = pressed;
        self.bus.tia.set_fire_button(player, pressed);
    }
}

impl Machine for Atari2600 {
    type Error = MachineError;

    fn display_size(&self) -> (u32, u32) {
        (VISIBLE_WIDTH as u32, FRAME_LINES as u32)
    }

    fn run_frame(&mut self) -> Result<(), MachineError> {
        let frame = self.frame_count();
        self.run_until(|m| m.frame_count() != frame)
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        for (pixel, &color) in buffer
            .chunks_exact_mut(3)
            .zip(self.bus.tia.completed_frame())
        {
            pixel.copy_from_slice(&palette::rgb(color));
        }
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        match button {
            // SWCHA: P0 in the high nibble, P1 in the low; R L D U from bit 7
            INPUT_P0_RIGHT => self.set_joystick_bit(0x80, pressed),
            INPUT_P0_LEFT => self.set_joystick_bit(0x40, pressed),
            INPUT_P0_DOWN => self.set_joystick_bit(0x20, pressed),
            INPUT_P0_UP => self.set_joystick_bit(0x10, pressed),
            INPUT_P1_RIGHT => self.set_joystick_bit(0x08, pressed),
            INPUT_P1_LEFT => self.set_joystick_bit(0x04, pressed),
            INPUT_P1_DOWN => self.set_joystick_bit(0x02, pressed),
            INPUT_P1_UP => self.set_joystick_bit(0x01, pressed),
            INPUT_P0_FIRE => self.set_fire(0, pressed),
            INPUT_P1_FIRE => self.set_fire(1, pressed),
            // SWCHB: console buttons are active low
            INPUT_RESET => self.set_switch_bit(0x01, !pressed),
            INPUT_SELECT => self.set_switch_bit(0x02, !pressed),
            INPUT_BW => self.set_switch_bit(0x08, !pressed),
            INPUT_P0_DIFFICULTY => self.set_switch_bit(0x40, pressed),
            INPUT_P1_DIFFICULTY => self.set_switch_bit(0x80, pressed),
            _ => {}
        }
    }

    fn input_map(&self) -> &[InputButton] {
        VCS_INPUT_MAP
    }

    /// Power-on chip state with held inputs and ROM patches kept. The
    /// cycle counter is not restarted.
    fn reset(&mut self) {
        let swcha = self.bus.riot.port_a_input();
        let swchb = self.bus.riot.port_b_input();

        self.bus.tia = Tia::new(self.bus.tia.delays());
        self.bus.riot = Riot::new();
        self.bus.riot.set_port_a_input(swcha);
        self.bus.riot.set_port_b_input(swchb);
        for player in 0..2 {
            self.bus.tia.set_fire_button(player, self.fire[player]);
        }
        self.bus.ram = [0; RAM_SIZE];
        self.bus.cart.reset();

        self.cpu.reset_with_bus(&mut self.bus, BusMaster::Cpu(0));
        self.paused = false;
    }
}
