//! TIA audio channel: 5-bit frequency divider feeding a waveform selected
//! by AUDC, scaled by the 4-bit AUDV volume.

use serde::{Deserialize, Serialize};

const POLY4_LEN: usize = 15;
const POLY5_LEN: usize = 31;
const POLY9_LEN: usize = 511;

/// Output sequence of a maximal-length LFSR (`bits` wide, feedback from
/// bit 0 XOR bit `tap`).
const fn lfsr<const N: usize>(bits: u32, tap: u32) -> [bool; N] {
    let mut out = [false; N];
    let mut reg: u32 = (1 << bits) - 1;
    let mut i = 0;
    while i < N {
        out[i] = reg & 1 != 0;
        let feedback = (reg ^ (reg >> tap)) & 1;
        reg = (reg >> 1) | (feedback << (bits - 1));
        i += 1;
    }
    out
}

/// Divide-by-31 pattern: a single pulse each period.
const fn div31() -> [bool; POLY5_LEN] {
    let mut out = [false; POLY5_LEN];
    out[18] = true;
    out
}

static POLY4: [bool; POLY4_LEN] = lfsr::<POLY4_LEN>(4, 1);
static POLY5: [bool; POLY5_LEN] = lfsr::<POLY5_LEN>(5, 2);
static POLY9: [bool; POLY9_LEN] = lfsr::<POLY9_LEN>(9, 4);
static DIV31: [bool; POLY5_LEN] = div31();

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioChannel {
    pub audc: u8, // tone type (4 bits)
    pub audf: u8, // frequency divider (5 bits)
    pub audv: u8, // volume (4 bits)
    div_count: u16,
    div_max: u16,
    p4: u16,
    p5: u16,
    p9: u16,
    output: bool,
}

impl AudioChannel {
    pub fn write_audc(&mut self, value: u8) {
        self.audc = value & 0x0F;
        self.update_divider();
    }

    pub fn write_audf(&mut self, value: u8) {
        self.audf = value & 0x1F;
        self.update_divider();
    }

    pub fn write_audv(&mut self, value: u8) {
        self.audv = value & 0x0F;
    }

    fn update_divider(&mut self) {
        let mut period = if self.audc == 0 { 0 } else { self.audf as u16 + 1 };
        // AUDC 12-15 divide the clock by a further 3
        if self.audc & 0x0C == 0x0C {
            period *= 3;
        }
        if period != self.div_max {
            self.div_max = period;
            if self.div_count == 0 || period == 0 {
                self.div_count = period;
            }
        }
    }

    /// Advance one audio clock. The divider counts down and, on underflow,
    /// steps the waveform generator.
    pub fn clock(&mut self) {
        if self.div_count > 1 {
            self.div_count -= 1;
            return;
        }
        if self.div_count == 0 {
            return;
        }
        self.div_count = self.div_max;

        self.p5 = (self.p5 + 1) % POLY5_LEN as u16;
        let gate = if self.audc & 0x02 == 0 {
            true
        } else if self.audc & 0x01 == 0 {
            DIV31[self.p5 as usize]
        } else {
            POLY5[self.p5 as usize]
        };
        if !gate {
            return;
        }

        if self.audc & 0x04 != 0 {
            // Pure tone: divide by two
            self.output = !self.output;
        } else if self.audc & 0x08 != 0 {
            if self.audc == 0x08 {
                self.p9 = (self.p9 + 1) % POLY9_LEN as u16;
                self.output = POLY9[self.p9 as usize];
            } else {
                self.output = POLY5[self.p5 as usize];
            }
        } else {
            self.p4 = (self.p4 + 1) % POLY4_LEN as u16;
            self.output = POLY4[self.p4 as usize];
        }
    }

    /// Current output level, 0-15.
    pub fn volume(&self) -> u8 {
        // AUDC 0 and 11 hold the output high
        if self.audc == 0x00 || self.audc == 0x0B || self.output {
            self.audv
        } else {
            0
        }
    }
}
