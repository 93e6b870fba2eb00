use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use vcs_core::core::{AudioSink, Machine, PixelSink};
use vcs_core::device::BankScheme;
use vcs_core::device::cartridge::Mapper;
use vcs_core::device::tia::regs::{INPT4, WSYNC};
use vcs_machines::atari2600::{
    INPUT_BW, INPUT_P0_FIRE, INPUT_P0_UP, INPUT_P1_DIFFICULTY, INPUT_RESET,
};
use vcs_machines::{
    Atari2600, MachineConfig, MachineError, MachineSnapshot, OpcodePolicy, SnapshotMismatch,
};

/// 2K image with `program` at $F800 and the reset vector pointing there.
fn rom_2k(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0xEA; 0x800];
    rom[..program.len()].copy_from_slice(program);
    rom[0x7FC] = 0x00;
    rom[0x7FD] = 0xF8;
    rom
}

fn machine(program: &[u8]) -> Atari2600 {
    Atari2600::from_rom(&rom_2k(program), None, &MachineConfig::default()).unwrap()
}

/// A frame loop touching RAM, the timer, future-pixel registers and WSYNC.
const KERNEL: &[u8] = &[
    0xA9, 0x02, //       F800 LDA #2
    0x85, 0x00, //       F802 STA VSYNC
    0x85, 0x02, //       F804 STA WSYNC
    0xA9, 0x00, //       F806 LDA #0
    0x85, 0x00, //       F808 STA VSYNC
    0xA9, 0x2B, //       F80A LDA #43
    0x8D, 0x96, 0x02, // F80C STA TIM64T
    0xE6, 0x80, //       F80F INC $80
    0xA5, 0x80, //       F811 LDA $80
    0x85, 0x09, //       F813 STA COLUBK
    0x85, 0x0D, //       F815 STA PF0
    0xAD, 0x84, 0x02, // F817 LDA INTIM
    0xD0, 0xFB, //       F81A BNE F817
    0xA2, 0xC0, //       F81C LDX #192
    0x85, 0x02, //       F81E STA WSYNC
    0x86, 0x1B, //       F820 STX GRP0
    0xCA, //             F822 DEX
    0xD0, 0xF9, //       F823 BNE F81E
    0x4C, 0x00, 0xF8, // F825 JMP F800
];

// =============================================================================
// Machine trait
// =============================================================================

#[test]
fn test_display_size_and_input_map() {
    let m = machine(&[]);
    assert_eq!(m.display_size(), (160, 320));
    assert_eq!(m.input_map().len(), 15);
    for button in m.input_map() {
        assert!(!button.name.is_empty());
    }
}

// =============================================================================
// Power on
// =============================================================================

#[test]
fn test_two_k_rom_boots_single_bank_from_vector() {
    let mut m = machine(&[0xA2, 0x42]); // LDX #$42
    assert_eq!(m.cartridge().scheme(), BankScheme::SingleBank);
    assert_eq!(m.cpu().pc, 0xF800);
    assert_eq!(m.cycles(), 0);

    assert_eq!(m.step_instruction().unwrap(), 2);
    assert_eq!(m.cpu().x, 0x42);
    assert_eq!(m.cpu().pc, 0xF802);
}

#[test]
fn test_invalid_image_builds_no_machine() {
    let result = Atari2600::from_rom(&[0; 0x1400], None, &MachineConfig::default());
    assert!(matches!(result, Err(MachineError::InvalidCartridgeImage(_))));
}

// =============================================================================
// Scheduler
// =============================================================================

#[test]
fn test_advance_ticks_tia_three_clocks() {
    let mut m = machine(&[]);
    for n in 1..=10u8 {
        m.advance().unwrap();
        assert_eq!(m.tia().hclock(), 3 * n);
    }
    assert_eq!(m.color_clocks(), 30);
}

#[test]
fn test_wsync_stalls_cpu_until_line_wraps() {
    let mut m = machine(&[0x85, WSYNC, 0xEA, 0xEA]); // STA WSYNC; NOP; NOP
    assert_eq!(m.step_instruction().unwrap(), 3);
    assert_eq!(m.tia().hclock(), 9);
    assert!(m.tia().rdy_halt());

    let pc = m.cpu().pc;
    for _ in 0..72 {
        let before = m.tia().hclock();
        assert!(!m.advance().unwrap());
        // The TIA keeps its three clocks while the CPU is held
        assert_eq!(m.tia().hclock(), before + 3);
        assert_eq!(m.cpu().pc, pc);
    }
    assert_eq!(m.tia().hclock(), 225);

    // This cycle wraps the line, releases RDY and fetches the NOP
    m.advance().unwrap();
    assert_eq!(m.tia().hclock(), 0);
    assert_eq!(m.tia().scanline(), 1);
    assert!(!m.tia().rdy_halt());
    assert_eq!(m.cpu().pc, pc + 1);
}

#[test]
fn test_step_instruction_counts_wsync_stall() {
    let mut m = machine(&[0xEA, 0x85, WSYNC, 0xEA]);
    m.step_instruction().unwrap(); // NOP: 2 cycles, hclock 6
    m.step_instruction().unwrap(); // STA WSYNC ends at hclock 15
    // 70 stalled cycles; the wrap cycle fetches the NOP, one more ends it
    assert_eq!(m.step_instruction().unwrap(), 72);
}

#[test]
fn test_riot_ticks_once_per_cpu_cycle() {
    // LDA #5; STA TIM1T
    let mut m = machine(&[0xA9, 0x05, 0x8D, 0x94, 0x02]);
    m.step_instruction().unwrap();
    m.step_instruction().unwrap();
    assert_eq!(m.riot().timer(), 5);
    m.advance().unwrap();
    m.advance().unwrap();
    assert_eq!(m.riot().timer(), 3);
}

#[test]
fn test_run_until_predicate() {
    let mut m = machine(KERNEL);
    m.run_until(|m| m.cycles() >= 1234).unwrap();
    assert_eq!(m.cycles(), 1234);

    m.run_until(|m| m.cpu().pc == 0xF81C && m.at_instruction_boundary())
        .unwrap();
    assert_eq!(m.cpu().pc, 0xF81C);
    assert_eq!(m.ram()[0], 1);
}

#[test]
fn test_pause_completes_instruction_and_blocks_run() {
    let mut m = machine(KERNEL);
    m.advance().unwrap(); // opcode fetch of LDA #2
    assert!(!m.at_instruction_boundary());

    m.pause().unwrap();
    assert!(m.is_paused());
    assert!(m.at_instruction_boundary());
    let cycles = m.cycles();
    m.run_until(|_| false).unwrap();
    m.run_frame().unwrap();
    assert_eq!(m.cycles(), cycles);

    // Stepping still works while paused
    m.step_instruction().unwrap();
    assert!(m.cycles() > cycles);

    m.resume();
    m.run_until(|m| m.cycles() >= cycles + 100).unwrap();
    assert_eq!(m.cycles(), cycles + 100);
}

// =============================================================================
// Opcode policy
// =============================================================================

#[test]
fn test_unimplemented_opcode_is_fatal_by_default() {
    let mut m = machine(&[0x02, 0xA9, 0x07]);
    let err = m.step_instruction().unwrap_err();
    assert!(matches!(
        err,
        MachineError::UnimplementedOpcode {
            pc: 0xF800,
            opcode: 0x02
        }
    ));
    assert_eq!(err.to_string(), "unimplemented opcode $02 at $F800");
}

#[test]
fn test_unimplemented_opcode_skip_policy() {
    let config = MachineConfig {
        policy: OpcodePolicy::Skip,
        ..MachineConfig::default()
    };
    let mut m = Atari2600::from_rom(&rom_2k(&[0x02, 0xA9, 0x07]), None, &config).unwrap();
    assert_eq!(m.step_instruction().unwrap(), 2);
    m.step_instruction().unwrap();
    assert_eq!(m.cpu().a, 0x07);
}

// =============================================================================
// Bus and bank switching through the CPU
// =============================================================================

#[test]
fn test_cpu_read_of_hot_address_switches_bank() {
    let mut rom = vec![0xEA; 0x2000];
    // Bank 1 (power-on): LDA $FFF8; then whatever bank 0 has at $F003
    rom[0x1000..0x1005].copy_from_slice(&[0xAD, 0xF8, 0xFF, 0xA2, 0x22]);
    rom[0x1FFC] = 0x00;
    rom[0x1FFD] = 0xF0;
    rom[0x0003..0x0005].copy_from_slice(&[0xA2, 0x11]);

    let mut m = Atari2600::from_rom(&rom, None, &MachineConfig::default()).unwrap();
    assert_eq!(m.cartridge().scheme(), BankScheme::Default);
    m.step_instruction().unwrap();
    m.step_instruction().unwrap();
    assert_eq!(m.cpu().x, 0x11);
}

#[test]
fn test_activision_jsr_switches_bank() {
    let mut rom = vec![0xEA; 0x2000];
    // Bank 0: LDX #$FF; TXS; JSR $D000
    rom[0x0000..0x0006].copy_from_slice(&[0xA2, 0xFF, 0x9A, 0x20, 0x00, 0xD0]);
    rom[0x0FFC] = 0x00;
    rom[0x0FFD] = 0xF0;
    // Bank 1: LDX #$77
    rom[0x1000..0x1002].copy_from_slice(&[0xA2, 0x77]);

    let mut m = Atari2600::from_rom(&rom, Some(BankScheme::Fe), &MachineConfig::default()).unwrap();
    for _ in 0..4 {
        m.step_instruction().unwrap();
    }
    assert_eq!(m.cpu().pc, 0xD002);
    assert_eq!(m.cpu().x, 0x77);
}

#[test]
fn test_ram_mirrors_through_stack_page() {
    // LDA #$5A; STA $80; LDX $0180
    let mut m = machine(&[0xA9, 0x5A, 0x85, 0x80, 0xAE, 0x80, 0x01]);
    for _ in 0..3 {
        m.step_instruction().unwrap();
    }
    assert_eq!(m.cpu().x, 0x5A);
    assert_eq!(m.peek(0x2080), 0x5A);
}

#[test]
fn test_poke_edits_rom_and_ram_only() {
    let mut m = machine(&[]);
    m.poke(0xF900, 0x55);
    assert_eq!(m.peek(0xF900), 0x55);
    assert_eq!(m.cartridge().rom()[0x100], 0x55);

    m.poke(0x0081, 0x66);
    assert_eq!(m.ram()[1], 0x66);

    // Strobes are never triggered from the debugger
    m.poke(0x0002, 0x00);
    assert!(!m.tia().rdy_halt());
}

// =============================================================================
// Inputs
// =============================================================================

#[test]
fn test_inputs_reach_ports() {
    let mut m = machine(&[]);
    assert_eq!(m.peek(0x0280), 0xFF);
    assert_eq!(m.peek(0x0282), 0x0B);

    m.set_input(INPUT_P0_UP, true);
    assert_eq!(m.peek(0x0280), 0xEF);
    m.set_input(INPUT_P0_UP, false);
    assert_eq!(m.peek(0x0280), 0xFF);

    m.set_input(INPUT_P0_FIRE, true);
    assert_eq!(m.peek(INPT4 as u16), 0x00);

    m.set_input(INPUT_RESET, true);
    assert_eq!(m.peek(0x0282), 0x0A);
    m.set_input(INPUT_RESET, false);
    m.set_input(INPUT_BW, true);
    m.set_input(INPUT_P1_DIFFICULTY, true);
    assert_eq!(m.peek(0x0282), 0x83);
}

#[test]
fn test_reset_keeps_held_inputs() {
    let mut m = machine(KERNEL);
    m.run_until(|m| m.cycles() >= 500).unwrap();
    m.set_input(INPUT_P0_FIRE, true);
    m.set_input(INPUT_P0_UP, true);
    let before = m.cycles();
    m.reset();
    // The cycle counter keeps running across a console reset
    assert_eq!(m.cycles(), before);
    assert_eq!(m.cpu().pc, 0xF800);
    assert_eq!(m.ram()[0], 0);
    assert_eq!(m.peek(0x0280), 0xEF);
    assert_eq!(m.peek(INPT4 as u16), 0x00);
}

// =============================================================================
// Sinks
// =============================================================================

#[derive(Default)]
struct Recorded {
    frames: Vec<(u32, u32, usize)>,
    samples: usize,
    rate: u32,
}

struct Recorder(Rc<RefCell<Recorded>>);

impl PixelSink for Recorder {
    fn present_frame(&mut self, width: u32, height: u32, rgb: &[u8]) {
        self.0.borrow_mut().frames.push((width, height, rgb.len()));
    }
}

impl AudioSink for Recorder {
    fn push_samples(&mut self, sample_rate: u32, samples: &[i16]) {
        let mut rec = self.0.borrow_mut();
        rec.samples += samples.len();
        rec.rate = sample_rate;
    }
}

#[test]
fn test_frames_and_audio_reach_sinks() {
    let rec = Rc::new(RefCell::new(Recorded::default()));
    let mut m = machine(KERNEL);
    m.attach_video(Box::new(Recorder(rec.clone())));
    m.attach_audio(Box::new(Recorder(rec.clone())));

    m.run_frame().unwrap();
    m.run_frame().unwrap();
    assert_eq!(m.frame_count(), 2);

    let rec = rec.borrow();
    assert_eq!(rec.frames.len(), 2);
    assert_eq!(rec.frames[1], (160, 320, 160 * 320 * 3));
    // Two samples per scanline; the second frame is over 200 lines long
    assert!(rec.samples > 400);
    assert_eq!(rec.rate, 31_400);
}

// =============================================================================
// Snapshots
// =============================================================================

fn assert_same_state(a: &Atari2600, b: &Atari2600) {
    assert_eq!(a.cycles(), b.cycles());
    assert_eq!(a.cpu_state(), b.cpu_state());
    assert_eq!(a.ram(), b.ram());
    assert_eq!(a.riot(), b.riot());
    assert_eq!(a.tia().registers(), b.tia().registers());
    assert_eq!(a.tia().hclock(), b.tia().hclock());
    assert_eq!(a.tia().scanline(), b.tia().scanline());
    assert_eq!(a.tia().pending_writes(), b.tia().pending_writes());
    assert_eq!(a.cartridge().bank_state(), b.cartridge().bank_state());
}

#[test]
fn test_snapshot_at_cycle_10000_matches_fresh_run() {
    let mut original = machine(KERNEL);
    original.run_until(|m| m.cycles() >= 10_000).unwrap();
    original.pause().unwrap();
    let at = original.cycles();
    let saved = original.save_state().unwrap();

    let mut restored = machine(KERNEL);
    restored.load_state(&saved).unwrap();

    let mut fresh = machine(KERNEL);
    fresh.run_until(|m| m.cycles() >= at).unwrap();
    assert_same_state(&restored, &fresh);
    assert_same_state(&restored, &original);
}

#[test]
fn test_restored_machine_traces_identically() {
    let mut original = machine(KERNEL);
    original.run_until(|m| m.cycles() >= 4321).unwrap();
    original.pause().unwrap();
    original.resume();
    let snap = MachineSnapshot::capture(&original).unwrap();

    let mut restored = machine(KERNEL);
    snap.restore(&mut restored).unwrap();

    for _ in 0..3000 {
        let a = original.advance().unwrap();
        let b = restored.advance().unwrap();
        assert_eq!(a, b);
        assert_eq!(original.cpu_state(), restored.cpu_state());
    }
    assert_same_state(&original, &restored);
}

#[test]
fn test_snapshot_from_other_cartridge_is_refused() {
    let mut source = machine(KERNEL);
    source.run_until(|m| m.cycles() >= 100).unwrap();
    source.pause().unwrap();
    let saved = source.save_state().unwrap();

    let mut other = machine(&[0xA2, 0x01]);
    other.step_instruction().unwrap();
    let before = other.cpu_state();

    let err = other.load_state(&saved).unwrap_err();
    assert!(matches!(
        err,
        MachineError::IncompatibleSnapshot(SnapshotMismatch::Cartridge { .. })
    ));
    // Nothing was applied
    assert_eq!(other.cpu_state(), before);
    assert_eq!(other.cycles(), 2);
}

#[test]
fn test_snapshot_with_wrong_version_is_refused() {
    let mut m = machine(KERNEL);
    let mut snap = MachineSnapshot::capture(&m).unwrap();
    snap.version += 1;
    assert!(matches!(
        snap.restore(&mut m),
        Err(MachineError::IncompatibleSnapshot(SnapshotMismatch::Version { .. }))
    ));
}

#[test]
fn test_snapshot_with_out_of_range_bank_is_refused() {
    let mut rom = vec![0xEA; 0x2000];
    rom[0x1FFC] = 0x00;
    rom[0x1FFD] = 0xF0;
    let mut m = Atari2600::from_rom(&rom, None, &MachineConfig::default()).unwrap();
    m.step_instruction().unwrap();

    let mut snap = MachineSnapshot::capture(&m).unwrap();
    snap.cart.mapper = Mapper::Generic {
        banks: 2,
        hot_end: 0xFF9,
        bank: 7,
    };
    let bytes = snap.encode().unwrap();

    let before = m.cpu_state();
    assert!(matches!(
        m.load_state(&bytes),
        Err(MachineError::IncompatibleSnapshot(SnapshotMismatch::Layout(_)))
    ));
    assert_eq!(m.cpu_state(), before);
    assert_eq!(m.peek(0x1000), 0xEA);
    m.step_instruction().unwrap();
}

#[test]
fn test_snapshot_carries_rom_patches() {
    let mut original = machine(&[]);
    original.poke(0xF800, 0xA9); // LDA #$42
    original.poke(0xF801, 0x42);
    let saved = original.save_state().unwrap();

    let mut restored = machine(&[]);
    restored.load_state(&saved).unwrap();
    assert_eq!(restored.peek(0xF800), 0xA9);

    original.step_instruction().unwrap();
    restored.step_instruction().unwrap();
    assert_eq!(restored.cpu().a, 0x42);
    assert_eq!(restored.cpu().pc, 0xF802);
    assert_eq!(original.cpu_state(), restored.cpu_state());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_capture_restore_reproduces_run(stop in 0u64..6000, extra in 1u64..1500) {
        let mut original = machine(KERNEL);
        original.run_until(|m| m.cycles() >= stop).unwrap();
        original.pause().unwrap();
        original.resume();
        let bytes = original.save_state().unwrap();

        let mut restored = machine(KERNEL);
        restored.load_state(&bytes).unwrap();

        let end = original.cycles() + extra;
        original.run_until(|m| m.cycles() >= end).unwrap();
        restored.run_until(|m| m.cycles() >= end).unwrap();
        prop_assert_eq!(original.cpu_state(), restored.cpu_state());
        prop_assert_eq!(original.ram(), restored.ram());
        prop_assert_eq!(original.tia().registers(), restored.tia().registers());
        prop_assert_eq!(original.riot(), restored.riot());
    }
}
