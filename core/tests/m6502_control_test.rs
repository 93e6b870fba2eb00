use vcs_core::core::BusMaster;
use vcs_core::cpu::m6502::{M6502, StatusFlag};
use vcs_core::cpu::{Cpu, CpuStateTrait, M6502State};
mod common;
use common::{TestBus, run_instruction};

fn cpu_at(pc: u16) -> M6502 {
    let mut cpu = M6502::new();
    cpu.pc = pc;
    cpu
}

// =============================================================================
// Reset
// =============================================================================

#[test]
fn test_reset_reads_vector_and_clears_interrupt_disable() {
    let mut cpu = M6502::new();
    let mut bus = TestBus::new();
    bus.set_reset_vector(0xF800);
    cpu.p = 0xFF;
    cpu.sp = 0x00;

    cpu.reset_with_bus(&mut bus, BusMaster::Cpu(0));

    assert_eq!(cpu.pc, 0xF800);
    assert_eq!(cpu.sp, 0xFD);
    assert_eq!(cpu.p & StatusFlag::I as u8, 0);
    assert!(cpu.at_instruction_boundary());
}

#[test]
fn test_first_instruction_runs_at_vector() {
    let mut cpu = M6502::new();
    let mut bus = TestBus::new();
    bus.set_reset_vector(0xF000);
    bus.load(0xF000, &[0xA2, 0x99]); // LDX #$99
    cpu.reset_with_bus(&mut bus, BusMaster::Cpu(0));
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.x, 0x99);
    assert_eq!(cpu.pc, 0xF002);
}

// =============================================================================
// Subroutines and interrupts
// =============================================================================

#[test]
fn test_jsr_rts_round_trip() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x20, 0x00, 0x30]); // JSR $3000
    bus.load(0x3000, &[0x60]); // RTS

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x3000);
    assert_eq!(cpu.sp, 0xFB);
    // Return address is the last byte of the JSR
    assert_eq!(bus.memory[0x01FD], 0x02);
    assert_eq!(bus.memory[0x01FC], 0x02);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0203);
    assert_eq!(cpu.sp, 0xFD);
}

#[test]
fn test_brk_pushes_state_and_rti_restores() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x00, 0xEA]); // BRK + padding
    bus.load(0xFFFE, &[0x00, 0x40]); // IRQ/BRK vector -> $4000
    bus.load(0x4000, &[0x40]); // RTI
    cpu.p |= StatusFlag::C as u8;

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x4000);
    assert!(cpu.p & StatusFlag::I as u8 != 0);
    assert_eq!(bus.memory[0x01FD], 0x02);
    assert_eq!(bus.memory[0x01FC], 0x02);
    let pushed = bus.memory[0x01FB];
    assert_eq!(pushed & (StatusFlag::B as u8 | StatusFlag::C as u8), 0x11);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0202);
    assert_eq!(cpu.sp, 0xFD);
    assert_eq!(cpu.p & StatusFlag::B as u8, 0);
    assert!(cpu.p & StatusFlag::C as u8 != 0);
    assert_eq!(cpu.p & StatusFlag::I as u8, 0);
}

#[test]
fn test_jmp_indirect_page_wrap_bug() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x6C, 0xFF, 0x30]); // JMP ($30FF)
    bus.memory[0x30FF] = 0x34;
    bus.memory[0x3000] = 0x12; // high byte comes from $3000, not $3100
    bus.memory[0x3100] = 0x56;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x1234);
}

// =============================================================================
// Stack
// =============================================================================

#[test]
fn test_php_sets_break_and_unused_on_stack_copy() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x08]);
    cpu.p = StatusFlag::U as u8 | StatusFlag::N as u8;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x01FD], 0xB0);
    assert_eq!(cpu.sp, 0xFC);
}

#[test]
fn test_pha_pla() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x48, 0xA9, 0x00, 0x68]); // PHA; LDA #0; PLA
    cpu.a = 0x80;
    for _ in 0..3 {
        run_instruction(&mut cpu, &mut bus);
    }
    assert_eq!(cpu.a, 0x80);
    assert!(cpu.p & StatusFlag::N as u8 != 0);
    assert_eq!(cpu.sp, 0xFD);
}

#[test]
fn test_plp_ignores_break() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x28]);
    bus.memory[0x01FE] = 0xFF;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.p, 0xFF & !(StatusFlag::B as u8));
}

#[test]
fn test_txs_does_not_touch_flags() {
    let mut cpu = cpu_at(0x0200);
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x9A]); // TXS
    cpu.x = 0x00;
    let before = cpu.p;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.sp, 0x00);
    assert_eq!(cpu.p, before);
}

// =============================================================================
// Snapshot
// =============================================================================

#[test]
fn test_snapshot_and_restore_registers() {
    let mut cpu = cpu_at(0x1234);
    cpu.a = 1;
    cpu.x = 2;
    cpu.y = 3;
    cpu.sp = 0x80;
    cpu.p = 0xA5;
    let state = cpu.snapshot();
    assert_eq!(
        state,
        M6502State {
            a: 1,
            x: 2,
            y: 3,
            pc: 0x1234,
            sp: 0x80,
            p: 0xA5
        }
    );

    let mut other = M6502::new();
    other.restore(&state);
    assert_eq!(other.snapshot(), state);
    assert!(other.at_instruction_boundary());
}
