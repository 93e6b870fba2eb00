use vcs_core::cpu::m6502::{M6502, StatusFlag};
mod common;
use common::{TestBus, run_instruction};

/// Run the first instruction of `program` at $0200 after `setup`.
fn run(program: &[u8], setup: impl FnOnce(&mut M6502, &mut TestBus)) -> (M6502, TestBus) {
    let mut cpu = M6502::new();
    let mut bus = TestBus::new();
    bus.load(0x0200, program);
    cpu.pc = 0x0200;
    setup(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    (cpu, bus)
}

fn flag(cpu: &M6502, f: StatusFlag) -> bool {
    cpu.p & f as u8 != 0
}

// =============================================================================
// ADC / SBC
// =============================================================================

#[test]
fn test_adc_signed_overflow() {
    let (cpu, _) = run(&[0x69, 0x50], |cpu, _| cpu.a = 0x50);
    assert_eq!(cpu.a, 0xA0);
    assert!(flag(&cpu, StatusFlag::V));
    assert!(flag(&cpu, StatusFlag::N));
    assert!(!flag(&cpu, StatusFlag::C));
}

#[test]
fn test_adc_carry_out_and_zero() {
    let (cpu, _) = run(&[0x69, 0x01], |cpu, _| cpu.a = 0xFF);
    assert_eq!(cpu.a, 0x00);
    assert!(flag(&cpu, StatusFlag::C));
    assert!(flag(&cpu, StatusFlag::Z));
    assert!(!flag(&cpu, StatusFlag::V));
}

#[test]
fn test_adc_uses_carry_in() {
    let (cpu, _) = run(&[0x69, 0x01], |cpu, _| {
        cpu.a = 0x10;
        cpu.p |= StatusFlag::C as u8;
    });
    assert_eq!(cpu.a, 0x12);
}

#[test]
fn test_adc_decimal() {
    let (cpu, _) = run(&[0x69, 0x01], |cpu, _| {
        cpu.a = 0x09;
        cpu.p |= StatusFlag::D as u8;
    });
    assert_eq!(cpu.a, 0x10);
    assert!(!flag(&cpu, StatusFlag::C));
}

#[test]
fn test_adc_decimal_wrap_sets_carry_but_not_zero() {
    // NMOS: Z follows the binary sum ($9A), not the BCD result ($00)
    let (cpu, _) = run(&[0x69, 0x01], |cpu, _| {
        cpu.a = 0x99;
        cpu.p |= StatusFlag::D as u8;
    });
    assert_eq!(cpu.a, 0x00);
    assert!(flag(&cpu, StatusFlag::C));
    assert!(!flag(&cpu, StatusFlag::Z));
}

#[test]
fn test_sbc_binary_borrow() {
    let (cpu, _) = run(&[0xE9, 0xF0], |cpu, _| {
        cpu.a = 0x50;
        cpu.p |= StatusFlag::C as u8;
    });
    assert_eq!(cpu.a, 0x60);
    assert!(!flag(&cpu, StatusFlag::C));
    assert!(!flag(&cpu, StatusFlag::V));
}

#[test]
fn test_sbc_decimal() {
    let (cpu, _) = run(&[0xE9, 0x01], |cpu, _| {
        cpu.a = 0x10;
        cpu.p |= StatusFlag::C as u8 | StatusFlag::D as u8;
    });
    assert_eq!(cpu.a, 0x09);
    assert!(flag(&cpu, StatusFlag::C));

    let (cpu, _) = run(&[0xE9, 0x01], |cpu, _| {
        cpu.a = 0x00;
        cpu.p |= StatusFlag::C as u8 | StatusFlag::D as u8;
    });
    assert_eq!(cpu.a, 0x99);
    assert!(!flag(&cpu, StatusFlag::C));
}

#[test]
fn test_sbc_immediate_alias() {
    // $EB behaves exactly like $E9
    let (a, _) = run(&[0xE9, 0x33], |cpu, _| cpu.a = 0x80);
    let (b, _) = run(&[0xEB, 0x33], |cpu, _| cpu.a = 0x80);
    assert_eq!(a.a, b.a);
    assert_eq!(a.p, b.p);
}

// =============================================================================
// Compare, BIT, logic
// =============================================================================

#[test]
fn test_cmp_equal_and_less() {
    let (cpu, _) = run(&[0xC9, 0x40], |cpu, _| cpu.a = 0x40);
    assert!(flag(&cpu, StatusFlag::Z));
    assert!(flag(&cpu, StatusFlag::C));

    let (cpu, _) = run(&[0xC9, 0x41], |cpu, _| cpu.a = 0x40);
    assert!(!flag(&cpu, StatusFlag::C));
    assert!(flag(&cpu, StatusFlag::N));
    assert_eq!(cpu.a, 0x40);
}

#[test]
fn test_bit_copies_operand_bits() {
    let (cpu, _) = run(&[0x24, 0x10], |cpu, bus| {
        cpu.a = 0x01;
        bus.memory[0x10] = 0xC0;
    });
    assert!(flag(&cpu, StatusFlag::N));
    assert!(flag(&cpu, StatusFlag::V));
    assert!(flag(&cpu, StatusFlag::Z));
    assert_eq!(cpu.a, 0x01);
}

#[test]
fn test_and_ora_eor() {
    let (cpu, _) = run(&[0x29, 0x0F], |cpu, _| cpu.a = 0x3C);
    assert_eq!(cpu.a, 0x0C);
    let (cpu, _) = run(&[0x09, 0x80], |cpu, _| cpu.a = 0x01);
    assert_eq!(cpu.a, 0x81);
    assert!(flag(&cpu, StatusFlag::N));
    let (cpu, _) = run(&[0x49, 0xFF], |cpu, _| cpu.a = 0xFF);
    assert_eq!(cpu.a, 0x00);
    assert!(flag(&cpu, StatusFlag::Z));
}

// =============================================================================
// Shifts and rotates
// =============================================================================

#[test]
fn test_ror_accumulator_through_carry() {
    let (cpu, _) = run(&[0x6A], |cpu, _| {
        cpu.a = 0x01;
        cpu.p |= StatusFlag::C as u8;
    });
    assert_eq!(cpu.a, 0x80);
    assert!(flag(&cpu, StatusFlag::C));
    assert!(flag(&cpu, StatusFlag::N));
}

#[test]
fn test_asl_memory() {
    let (cpu, bus) = run(&[0x06, 0x10], |_, bus| bus.memory[0x10] = 0x81);
    assert_eq!(bus.memory[0x10], 0x02);
    assert!(flag(&cpu, StatusFlag::C));
}

#[test]
fn test_lsr_to_zero() {
    let (cpu, _) = run(&[0x4A], |cpu, _| cpu.a = 0x01);
    assert_eq!(cpu.a, 0x00);
    assert!(flag(&cpu, StatusFlag::Z));
    assert!(flag(&cpu, StatusFlag::C));
}

#[test]
fn test_dec_zp_x_wraps_in_zero_page() {
    let (cpu, bus) = run(&[0xD6, 0xF0], |cpu, bus| {
        cpu.x = 0x20;
        bus.memory[0x10] = 0x00;
    });
    assert_eq!(bus.memory[0x10], 0xFF);
    assert!(flag(&cpu, StatusFlag::N));
}

// =============================================================================
// Undocumented
// =============================================================================

#[test]
fn test_lax_loads_a_and_x() {
    let (cpu, _) = run(&[0xA7, 0x10], |_, bus| bus.memory[0x10] = 0x8F);
    assert_eq!(cpu.a, 0x8F);
    assert_eq!(cpu.x, 0x8F);
    assert!(flag(&cpu, StatusFlag::N));
}

#[test]
fn test_sax_stores_a_and_x() {
    let (cpu, bus) = run(&[0x87, 0x10], |cpu, _| {
        cpu.a = 0xF0;
        cpu.x = 0x3C;
        cpu.p |= StatusFlag::Z as u8;
    });
    assert_eq!(bus.memory[0x10], 0x30);
    // No flags touched
    assert!(flag(&cpu, StatusFlag::Z));
}

#[test]
fn test_dcp_decrements_then_compares() {
    let (cpu, bus) = run(&[0xC7, 0x10], |cpu, bus| {
        cpu.a = 0x40;
        bus.memory[0x10] = 0x41;
    });
    assert_eq!(bus.memory[0x10], 0x40);
    assert!(flag(&cpu, StatusFlag::Z));
    assert!(flag(&cpu, StatusFlag::C));
}

#[test]
fn test_isb_increments_then_subtracts() {
    let (cpu, bus) = run(&[0xE7, 0x10], |cpu, bus| {
        cpu.a = 0x20;
        cpu.p |= StatusFlag::C as u8;
        bus.memory[0x10] = 0x0F;
    });
    assert_eq!(bus.memory[0x10], 0x10);
    assert_eq!(cpu.a, 0x10);
}
