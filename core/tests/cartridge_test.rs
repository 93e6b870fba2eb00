use proptest::prelude::*;

use vcs_core::core::BusMaster;
use vcs_core::device::cartridge::{
    BankScheme, BankState, Cartridge, CartridgeError, Mapper, WINDOW_SIZE, crc32,
};

const CPU: BusMaster = BusMaster::Cpu(0);

/// Image whose every byte holds the index of its `slice`-sized slice.
fn sliced_rom(size: usize, slice: usize) -> Vec<u8> {
    (0..size).map(|i| (i / slice) as u8).collect()
}

fn generic_bank(cart: &Cartridge) -> u8 {
    match cart.mapper() {
        Mapper::Generic { bank, .. } => *bank,
        other => panic!("not a generic mapper: {other:?}"),
    }
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_two_k_image_selects_single_bank_and_mirrors() {
    let mut rom = vec![0u8; 0x800];
    rom[0x7FC] = 0x00;
    rom[0x7FD] = 0xF8;
    let mut cart = Cartridge::load(&rom, None).unwrap();
    assert_eq!(cart.scheme(), BankScheme::SingleBank);
    // Reset vector read from the top of the 2K image
    assert_eq!(cart.read(CPU, 0x1FFC), 0x00);
    assert_eq!(cart.read(CPU, 0x1FFD), 0xF8);
    assert_eq!(cart.peek(0xF7FD), 0xF8);
}

#[test]
fn test_inferred_schemes() {
    let cases = [
        (0x1000, BankScheme::SingleBank),
        (0x2000, BankScheme::Default),
        (0x3000, BankScheme::Cbs),
        (0x4000, BankScheme::Default),
        (0x8000, BankScheme::F4),
    ];
    for (size, scheme) in cases {
        let cart = Cartridge::load(&vec![0; size], None).unwrap();
        assert_eq!(cart.scheme(), scheme, "{size:#X}");
    }
}

#[test]
fn test_invalid_images_rejected() {
    assert!(matches!(
        Cartridge::load(&[], None),
        Err(CartridgeError::InvalidImage { size: 0, .. })
    ));
    assert!(matches!(
        Cartridge::load(&vec![0; 0x1400], None),
        Err(CartridgeError::InvalidImage { scheme: None, .. })
    ));
    assert!(matches!(
        Cartridge::load(&vec![0; 0x2000], Some(BankScheme::SingleBank)),
        Err(CartridgeError::InvalidImage {
            scheme: Some(BankScheme::SingleBank),
            ..
        })
    ));
    assert!(Cartridge::load(&vec![0; 0x4000], Some(BankScheme::Cbs)).is_err());
    assert!(Cartridge::load(&vec![0; 0x2000], Some(BankScheme::MNetwork)).is_err());
}

#[test]
fn test_identity_carries_checksum() {
    let rom = sliced_rom(0x2000, WINDOW_SIZE);
    let cart = Cartridge::load(&rom, Some(BankScheme::Fe)).unwrap();
    let id = cart.identity();
    assert_eq!(id.crc32, crc32(&rom));
    assert_eq!(id.size, 0x2000);
    assert_eq!(id.scheme, BankScheme::Fe);
}

// =============================================================================
// Generic 4K schemes
// =============================================================================

#[test]
fn test_f8_starts_in_last_bank_and_switches() {
    let mut cart = Cartridge::load(&sliced_rom(0x2000, WINDOW_SIZE), None).unwrap();
    assert_eq!(cart.peek(0x1000), 1);

    cart.read(CPU, 0x1FF8);
    assert_eq!(cart.peek(0x1000), 0);
    cart.write(CPU, 0x1FF9, 0);
    assert_eq!(cart.peek(0x1000), 1);
}

#[test]
fn test_f6_hot_range() {
    let mut cart = Cartridge::load(&sliced_rom(0x4000, WINDOW_SIZE), None).unwrap();
    assert_eq!(generic_bank(&cart), 3);
    cart.read(CPU, 0x1FF6);
    assert_eq!(cart.peek(0x1234), 0);
    cart.read(CPU, 0x3FF8); // mirror of $1FF8
    assert_eq!(cart.peek(0x1234), 2);
}

#[test]
fn test_f4_eight_banks() {
    let mut cart = Cartridge::load(&sliced_rom(0x8000, WINDOW_SIZE), None).unwrap();
    for bank in 0..8u16 {
        cart.read(CPU, 0x1FF4 + bank);
        assert_eq!(cart.peek(0x1800), bank as u8);
    }
}

#[test]
fn test_superchip_ram_ports() {
    let mut cart =
        Cartridge::load(&sliced_rom(0x4000, WINDOW_SIZE), Some(BankScheme::Super)).unwrap();
    cart.write(CPU, 0x1005, 0xAB);
    assert_eq!(cart.read(CPU, 0x1085), 0xAB);
    assert_eq!(cart.ram()[5], 0xAB);
    // RAM survives a bank switch
    cart.read(CPU, 0x1FF6);
    assert_eq!(cart.read(CPU, 0x1085), 0xAB);
    // Writes to the read port are lost
    cart.write(CPU, 0x1085, 0x00);
    assert_eq!(cart.read(CPU, 0x1085), 0xAB);
}

#[test]
fn test_f4_superchip_ram_and_banks() {
    let mut cart =
        Cartridge::load(&sliced_rom(0x8000, WINDOW_SIZE), Some(BankScheme::F4Sc)).unwrap();
    assert_eq!(cart.ram().len(), 0x80);
    cart.write(CPU, 0x107F, 0x11);
    assert_eq!(cart.peek(0x10FF), 0x11);
    cart.read(CPU, 0x1FF5);
    assert_eq!(cart.peek(0x1100), 1);
}

#[test]
fn test_cbs_ram_plus() {
    let mut cart = Cartridge::load(&sliced_rom(0x3000, WINDOW_SIZE), None).unwrap();
    assert_eq!(cart.ram().len(), 0x100);
    assert_eq!(cart.peek(0x1800), 2);
    cart.write(CPU, 0x10FF, 0x5A);
    assert_eq!(cart.peek(0x11FF), 0x5A);
    cart.read(CPU, 0x1FF8);
    assert_eq!(cart.peek(0x1800), 0);
    cart.read(CPU, 0x1FFA);
    assert_eq!(cart.peek(0x1800), 2);
}

// =============================================================================
// Other schemes
// =============================================================================

#[test]
fn test_activision_stack_snoop() {
    let mut cart =
        Cartridge::load(&sliced_rom(0x2000, WINDOW_SIZE), Some(BankScheme::Fe)).unwrap();
    assert_eq!(cart.peek(0x1000), 0);

    // JSR into $Dxxx pushes $D0: bit 5 clear selects bank 1
    cart.snoop(0x01FE, 0x00);
    cart.snoop(0x01FD, 0xD0);
    assert_eq!(cart.peek(0x1000), 1);

    // $Fxxx has bit 5 set: back to bank 0
    cart.snoop(0x01FE, 0x00);
    cart.snoop(0x01FF, 0xF0);
    assert_eq!(cart.peek(0x1000), 0);

    // Without the $01FE access the data is ignored
    cart.snoop(0x0080, 0x00);
    cart.snoop(0x0081, 0xD0);
    assert_eq!(cart.peek(0x1000), 0);
}

#[test]
fn test_parker_bros_segments() {
    let mut cart = Cartridge::load(&sliced_rom(0x2000, 0x400), Some(BankScheme::ParkerBros))
        .unwrap();
    assert_eq!(cart.peek(0x1000), 4);
    assert_eq!(cart.peek(0x1400), 5);
    assert_eq!(cart.peek(0x1800), 6);
    assert_eq!(cart.peek(0x1C00), 7);

    cart.read(CPU, 0x1FE2); // segment 0 <- slice 2
    cart.read(CPU, 0x1FEB); // segment 1 <- slice 3
    cart.write(CPU, 0x1FF0, 0); // segment 2 <- slice 0
    assert_eq!(cart.peek(0x1000), 2);
    assert_eq!(cart.peek(0x1400), 3);
    assert_eq!(cart.peek(0x1800), 0);
    assert_eq!(cart.peek(0x1C00), 7);
}

#[test]
fn test_mnetwork_slices_and_ram() {
    let mut cart =
        Cartridge::load(&sliced_rom(0x4000, 0x800), Some(BankScheme::MNetwork)).unwrap();
    assert_eq!(cart.peek(0x1000), 0);
    // Upper 1.5K is fixed to the last slice
    assert_eq!(cart.peek(0x1A00), 7);
    assert_eq!(cart.peek(0x1FFF), 7);

    cart.read(CPU, 0x1FE3);
    assert_eq!(cart.peek(0x1000), 3);

    // 1K RAM in the lower window
    cart.read(CPU, 0x1FE7);
    cart.write(CPU, 0x1010, 0x55);
    assert_eq!(cart.peek(0x1410), 0x55);

    // 256-byte pages at $1800/$1900
    cart.read(CPU, 0x1FE9);
    cart.write(CPU, 0x1805, 0x66);
    assert_eq!(cart.peek(0x1905), 0x66);
    cart.read(CPU, 0x1FE8);
    assert_eq!(cart.peek(0x1905), 0x00);
    cart.read(CPU, 0x1FE9);
    assert_eq!(cart.peek(0x1905), 0x66);

    // Selecting a ROM slice hides the RAM again
    cart.read(CPU, 0x1FE1);
    assert_eq!(cart.peek(0x1410), 1);
}

// =============================================================================
// Debugger access and state
// =============================================================================

#[test]
fn test_debugger_access_has_no_side_effects() {
    let mut cart = Cartridge::load(&sliced_rom(0x2000, WINDOW_SIZE), None).unwrap();
    cart.read(BusMaster::Debugger, 0x1FF8);
    assert_eq!(generic_bank(&cart), 1);

    // Writes patch ROM in the active bank only
    cart.write(BusMaster::Debugger, 0x1234, 0xEE);
    assert_eq!(cart.peek(0x1234), 0xEE);
    assert_eq!(cart.rom()[WINDOW_SIZE + 0x234], 0xEE);
    assert_eq!(cart.rom()[0x234], 0x00);
}

#[test]
fn test_reset_returns_to_power_on_banks() {
    let mut cart =
        Cartridge::load(&sliced_rom(0x4000, WINDOW_SIZE), Some(BankScheme::Super)).unwrap();
    cart.read(CPU, 0x1FF6);
    cart.write(CPU, 0x1000, 0x99);
    cart.reset();
    assert_eq!(generic_bank(&cart), 3);
    assert_eq!(cart.ram()[0], 0x00);
}

#[test]
fn test_bank_state_restore_checks_kind() {
    let mut f8 = Cartridge::load(&sliced_rom(0x2000, WINDOW_SIZE), None).unwrap();
    let saved = f8.bank_state().clone();
    f8.read(CPU, 0x1FF8);
    f8.restore_bank_state(saved).unwrap();
    assert_eq!(generic_bank(&f8), 1);

    let pb = Cartridge::load(&vec![0; 0x2000], Some(BankScheme::ParkerBros)).unwrap();
    assert_eq!(
        f8.restore_bank_state(pb.bank_state().clone()),
        Err(CartridgeError::StateMismatch)
    );
}

#[test]
fn test_bank_state_restore_rejects_out_of_range_indexes() {
    let mut f8 = Cartridge::load(&sliced_rom(0x2000, WINDOW_SIZE), None).unwrap();
    let good = f8.bank_state().clone();
    let with_mapper = |mapper| BankState {
        mapper,
        ..good.clone()
    };
    for mapper in [
        Mapper::Generic {
            banks: 2,
            hot_end: 0xFF9,
            bank: 7,
        },
        // Bank in range, but not this cartridge's bank count
        Mapper::Generic {
            banks: 4,
            hot_end: 0xFF9,
            bank: 3,
        },
        Mapper::Generic {
            banks: 2,
            hot_end: 0xFFB,
            bank: 0,
        },
    ] {
        assert_eq!(
            f8.restore_bank_state(with_mapper(mapper)),
            Err(CartridgeError::StateMismatch)
        );
    }
    assert_eq!(f8.bank_state(), &good);
    assert_eq!(f8.peek(0x1000), 1);

    let mut pb = Cartridge::load(&vec![0; 0x2000], Some(BankScheme::ParkerBros)).unwrap();
    let state = BankState {
        mapper: Mapper::ParkerBros { slices: [0, 8, 1] },
        ..pb.bank_state().clone()
    };
    assert_eq!(pb.restore_bank_state(state), Err(CartridgeError::StateMismatch));

    let mut fe = Cartridge::load(&vec![0; 0x2000], Some(BankScheme::Fe)).unwrap();
    let state = BankState {
        mapper: Mapper::Fe {
            bank: 2,
            snoop: false,
        },
        ..fe.bank_state().clone()
    };
    assert_eq!(fe.restore_bank_state(state), Err(CartridgeError::StateMismatch));

    let mut mnet = Cartridge::load(&vec![0; 0x4000], Some(BankScheme::MNetwork)).unwrap();
    for (slice, ram_bank) in [(7, 0), (0, 4)] {
        let state = BankState {
            mapper: Mapper::MNetwork {
                slice,
                ram_enabled: false,
                ram_bank,
            },
            ..mnet.bank_state().clone()
        };
        assert_eq!(mnet.restore_bank_state(state), Err(CartridgeError::StateMismatch));
    }
    let state = BankState {
        mapper: Mapper::MNetwork {
            slice: 6,
            ram_enabled: true,
            ram_bank: 3,
        },
        ..mnet.bank_state().clone()
    };
    mnet.restore_bank_state(state).unwrap();
    assert_eq!(mnet.peek(0x1900), 0);
}

#[test]
fn test_rom_patches_travel_with_bank_state() {
    let rom = sliced_rom(0x1000, WINDOW_SIZE);
    let mut patched = Cartridge::load(&rom, None).unwrap();
    patched.poke(0x1010, 0x42);
    assert_eq!(patched.bank_state().patches.get(&0x10), Some(&0x42));
    // Writing the original byte back drops the patch
    patched.poke(0x1020, 0x99);
    patched.poke(0x1020, 0x00);
    assert_eq!(patched.bank_state().patches.len(), 1);

    let mut fresh = Cartridge::load(&rom, None).unwrap();
    fresh.restore_bank_state(patched.bank_state().clone()).unwrap();
    assert_eq!(fresh.peek(0x1010), 0x42);
    assert_eq!(fresh.rom(), patched.rom());

    // Restoring unpatched state undoes the patch
    let clean = Cartridge::load(&rom, None).unwrap();
    fresh.restore_bank_state(clean.bank_state().clone()).unwrap();
    assert_eq!(fresh.peek(0x1010), 0x00);

    let mut state = clean.bank_state().clone();
    state.patches.insert(0x1000, 0xEA);
    assert_eq!(fresh.restore_bank_state(state), Err(CartridgeError::StateMismatch));
}

fn generic_scheme() -> impl Strategy<Value = (BankScheme, usize, u16, u16)> {
    // (scheme, image size, first hot address, last hot address)
    prop_oneof![
        Just((BankScheme::Default, 0x2000, 0x1FF8, 0x1FF9)),
        Just((BankScheme::Default, 0x4000, 0x1FF6, 0x1FF9)),
        Just((BankScheme::F4, 0x8000, 0x1FF4, 0x1FFB)),
        Just((BankScheme::F4Sc, 0x8000, 0x1FF4, 0x1FFB)),
        Just((BankScheme::Super, 0x4000, 0x1FF6, 0x1FF9)),
        Just((BankScheme::Cbs, 0x3000, 0x1FF8, 0x1FFA)),
    ]
}

proptest! {
    #[test]
    fn prop_only_hot_addresses_switch_banks(
        (scheme, size, first, last) in generic_scheme(),
        addrs in prop::collection::vec(0x1000u16..0x2000, 1..64),
        writes in prop::collection::vec(any::<bool>(), 64),
    ) {
        let mut cart = Cartridge::load(&sliced_rom(size, WINDOW_SIZE), Some(scheme)).unwrap();
        for (i, &addr) in addrs.iter().enumerate() {
            let before = generic_bank(&cart);
            if writes[i] {
                cart.write(CPU, addr, 0);
            } else {
                cart.read(CPU, addr);
            }
            let after = generic_bank(&cart);
            if (first..=last).contains(&addr) {
                prop_assert_eq!(after, (addr - first) as u8);
                prop_assert_eq!(cart.peek(0x1F00), after);
            } else {
                prop_assert_eq!(after, before);
            }
        }
    }
}
