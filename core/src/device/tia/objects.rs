//! Movable objects, playfield and collision decode.
//!
//! Positions are visible pixel columns (0-159) where the object's first
//! pixel appears.

use serde::{Deserialize, Serialize};

pub const VISIBLE_WIDTH: u16 = 160;

/// Copy offsets for NUSIZ bits 0-2.
fn copies(nusiz: u8) -> &'static [u16] {
    match nusiz & 0x07 {
        1 => &[0, 16],
        2 => &[0, 32],
        3 => &[0, 16, 32],
        4 => &[0, 64],
        6 => &[0, 32, 64],
        _ => &[0], // 0 = one copy, 5 = double width, 7 = quad width
    }
}

/// Player stretch factor for NUSIZ bits 0-2.
pub fn player_scale(nusiz: u8) -> u16 {
    match nusiz & 0x07 {
        5 => 2,
        7 => 4,
        _ => 1,
    }
}

/// Distance from an object's position to column `x`, wrapping at 160.
#[inline]
fn offset(x: u8, pos: u8) -> u16 {
    (x as u16 + VISIBLE_WIDTH - pos as u16) % VISIBLE_WIDTH
}

/// Signed motion value from an HMxx register (upper nibble).
pub fn motion(value: u8) -> i8 {
    (value as i8) >> 4
}

/// Apply HMOVE motion. Positive values move left.
pub fn moved(pos: u8, hm: i8) -> u8 {
    (pos as i16 - hm as i16).rem_euclid(VISIBLE_WIDTH as i16) as u8
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub grp_new: u8, // last GRPx write
    pub grp_old: u8, // copy taken when the other player's GRP is written
    pub pos: u8,
    pub nusiz: u8,
    pub reflect: bool,
    pub vdel: bool,
    pub hm: i8,
}

impl Player {
    /// Pattern currently shifted out, honoring VDELPx.
    pub fn graphics(&self) -> u8 {
        if self.vdel { self.grp_old } else { self.grp_new }
    }

    pub fn pixel(&self, x: u8) -> bool {
        let grp = self.graphics();
        if grp == 0 {
            return false;
        }
        let scale = player_scale(self.nusiz);
        let off = offset(x, self.pos);
        for &copy in copies(self.nusiz) {
            let d = (off + VISIBLE_WIDTH - copy) % VISIBLE_WIDTH;
            if d < 8 * scale {
                let bit = d / scale;
                let mask = if self.reflect { 0x01 << bit } else { 0x80 >> bit };
                return grp & mask != 0;
            }
        }
        false
    }

    /// Column a locked missile snaps to (RESMPx): the player's center.
    pub fn center(&self) -> u8 {
        let half = 4 * player_scale(self.nusiz);
        ((self.pos as u16 + half - 1) % VISIBLE_WIDTH) as u8
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Missile {
    pub enabled: bool,
    pub locked: bool, // RESMPx: hidden and following its player
    pub pos: u8,
    pub hm: i8,
}

impl Missile {
    /// Missiles take copies from NUSIZ bits 0-2 and width from bits 4-5.
    pub fn pixel(&self, x: u8, nusiz: u8) -> bool {
        if !self.enabled || self.locked {
            return false;
        }
        let width = 1u16 << ((nusiz >> 4) & 0x03);
        let off = offset(x, self.pos);
        copies(nusiz)
            .iter()
            .any(|&copy| (off + VISIBLE_WIDTH - copy) % VISIBLE_WIDTH < width)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ball {
    pub enabled_new: bool,
    pub enabled_old: bool, // copy taken on GRP1 writes
    pub vdel: bool,
    pub pos: u8,
    pub hm: i8,
}

impl Ball {
    pub fn enabled(&self) -> bool {
        if self.vdel { self.enabled_old } else { self.enabled_new }
    }

    /// Width from CTRLPF bits 4-5.
    pub fn pixel(&self, x: u8, ctrlpf: u8) -> bool {
        if !self.enabled() {
            return false;
        }
        let width = 1u16 << ((ctrlpf >> 4) & 0x03);
        offset(x, self.pos) < width
    }
}

/// Playfield bit for column `x`. Each of the 20 bits covers 4 pixels:
/// PF0 bits 4-7, PF1 bits 7-0, PF2 bits 0-7. The right half repeats,
/// or mirrors when CTRLPF bit 0 is set.
pub fn playfield_pixel(pf: &[u8; 3], ctrlpf: u8, x: u8) -> bool {
    let mut idx = (x / 4) as usize;
    if idx >= 20 {
        idx = if ctrlpf & 0x01 != 0 { 39 - idx } else { idx - 20 };
    }
    match idx {
        0..=3 => pf[0] & (0x10 << idx) != 0,
        4..=11 => pf[1] & (0x80 >> (idx - 4)) != 0,
        _ => pf[2] & (0x01 << (idx - 12)) != 0,
    }
}

// ---------------------------------------------------------------------------
// Collisions
// ---------------------------------------------------------------------------

pub const OBJ_P0: u8 = 0x01;
pub const OBJ_P1: u8 = 0x02;
pub const OBJ_M0: u8 = 0x04;
pub const OBJ_M1: u8 = 0x08;
pub const OBJ_BL: u8 = 0x10;
pub const OBJ_PF: u8 = 0x20;

/// Collision latch bit for read register `reg` (0-7), data bit 7 or 6.
pub const fn latch(reg: u8, bit7: bool) -> u16 {
    1 << (reg * 2 + if bit7 { 0 } else { 1 })
}

/// (object a, object b, latch) for the 15 pairs, in CXM0P..CXPPMM order.
const PAIRS: [(u8, u8, u16); 15] = [
    (OBJ_M0, OBJ_P1, latch(0, true)),
    (OBJ_M0, OBJ_P0, latch(0, false)),
    (OBJ_M1, OBJ_P0, latch(1, true)),
    (OBJ_M1, OBJ_P1, latch(1, false)),
    (OBJ_P0, OBJ_PF, latch(2, true)),
    (OBJ_P0, OBJ_BL, latch(2, false)),
    (OBJ_P1, OBJ_PF, latch(3, true)),
    (OBJ_P1, OBJ_BL, latch(3, false)),
    (OBJ_M0, OBJ_PF, latch(4, true)),
    (OBJ_M0, OBJ_BL, latch(4, false)),
    (OBJ_M1, OBJ_PF, latch(5, true)),
    (OBJ_M1, OBJ_BL, latch(5, false)),
    (OBJ_BL, OBJ_PF, latch(6, true)),
    (OBJ_P0, OBJ_P1, latch(7, true)),
    (OBJ_M0, OBJ_M1, latch(7, false)),
];

const fn build_collision_table() -> [u16; 64] {
    let mut table = [0u16; 64];
    let mut objects = 0;
    while objects < 64 {
        let mut i = 0;
        while i < PAIRS.len() {
            let (a, b, bit) = PAIRS[i];
            if objects & a as usize != 0 && objects & b as usize != 0 {
                table[objects] |= bit;
            }
            i += 1;
        }
        objects += 1;
    }
    table
}

/// Latches set by each combination of visible objects.
pub static COLLISIONS: [u16; 64] = build_collision_table();

/// Value of collision read register `reg` (bits 7 and 6 only).
pub fn collision_register(latches: u16, reg: u8) -> u8 {
    let b7 = (latches & latch(reg, true) != 0) as u8;
    let b6 = (latches & latch(reg, false) != 0) as u8;
    (b7 << 7) | (b6 << 6)
}
