//! Graphics register write latency ("future pixels").
//!
//! A CPU write to a graphics register does not reach the video output on
//! the next color clock. Each write is queued and applied after a per-class
//! number of color clocks. The values are a tunable approximation.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const MIN_DELAY: u8 = 1;
pub const MAX_DELAY: u8 = 9;

/// Delays in color clocks, per register class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuturePixels {
    pub playfield: u8, // PF0, PF1, PF2
    pub player: u8,    // GRP0, GRP1
    pub enable: u8,    // ENAM0, ENAM1, ENABL
    pub color: u8,     // COLUP0, COLUP1, COLUPF, COLUBK
    pub control: u8,   // NUSIZx, CTRLPF, REFPx, VDELxx
}

impl Default for FuturePixels {
    fn default() -> Self {
        Self {
            playfield: 4,
            player: 1,
            enable: 1,
            color: 1,
            control: 1,
        }
    }
}

impl FuturePixels {
    /// Every class applies on the next color clock.
    pub fn immediate() -> Self {
        Self {
            playfield: MIN_DELAY,
            player: MIN_DELAY,
            enable: MIN_DELAY,
            color: MIN_DELAY,
            control: MIN_DELAY,
        }
    }

    /// Copy with every delay clamped into 1..=9.
    pub fn clamped(self) -> Self {
        let c = |v: u8| v.clamp(MIN_DELAY, MAX_DELAY);
        Self {
            playfield: c(self.playfield),
            player: c(self.player),
            enable: c(self.enable),
            color: c(self.color),
            control: c(self.control),
        }
    }

    /// Delay for a write register, or None if the register acts immediately.
    pub fn delay_for(&self, reg: u8) -> Option<u8> {
        use super::regs::*;
        match reg {
            PF0 | PF1 | PF2 => Some(self.playfield),
            GRP0 | GRP1 => Some(self.player),
            ENAM0 | ENAM1 | ENABL => Some(self.enable),
            COLUP0 | COLUP1 | COLUPF | COLUBK => Some(self.color),
            NUSIZ0 | NUSIZ1 | CTRLPF | REFP0 | REFP1 | VDELP0 | VDELP1 | VDELBL => {
                Some(self.control)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingWrite {
    pub reg: u8,
    pub value: u8,
    pub remaining: u8, // color clocks until the write lands
}

/// Writes in flight, in CPU order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayQueue {
    pending: VecDeque<PendingWrite>,
}

impl DelayQueue {
    pub fn push(&mut self, reg: u8, value: u8, delay: u8) {
        self.pending.push_back(PendingWrite {
            reg,
            value,
            remaining: delay,
        });
    }

    /// Count one color clock off every pending write.
    pub fn advance(&mut self) {
        for w in self.pending.iter_mut() {
            w.remaining = w.remaining.saturating_sub(1);
        }
    }

    /// Remove and return the oldest write that has landed.
    pub fn take_due(&mut self) -> Option<(u8, u8)> {
        let idx = self.pending.iter().position(|w| w.remaining == 0)?;
        self.pending.remove(idx).map(|w| (w.reg, w.value))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingWrite> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::super::regs::{GRP0, PF1, WSYNC};
    use super::*;

    #[test]
    fn test_default_delays_in_range() {
        let fp = FuturePixels::default();
        assert_eq!(fp, fp.clamped());
    }

    #[test]
    fn test_clamped_bounds() {
        let fp = FuturePixels {
            playfield: 0,
            player: 12,
            enable: 5,
            color: 9,
            control: 1,
        }
        .clamped();
        assert_eq!(fp.playfield, 1);
        assert_eq!(fp.player, 9);
        assert_eq!(fp.enable, 5);
    }

    #[test]
    fn test_strobes_are_not_delayed() {
        let fp = FuturePixels::default();
        assert_eq!(fp.delay_for(WSYNC), None);
        assert_eq!(fp.delay_for(PF1), Some(4));
    }

    #[test]
    fn test_shorter_delay_lands_first() {
        let mut q = DelayQueue::default();
        q.push(PF1, 0xAA, 3);
        q.push(GRP0, 0x55, 1);

        q.advance();
        assert_eq!(q.take_due(), Some((GRP0, 0x55)));
        assert_eq!(q.take_due(), None);

        q.advance();
        q.advance();
        assert_eq!(q.take_due(), Some((PF1, 0xAA)));
        assert!(q.is_empty());
    }
}
