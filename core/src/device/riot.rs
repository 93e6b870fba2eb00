use serde::{Deserialize, Serialize};

use crate::core::Component;

/// Timer intervals selected by address bits A1:A0 of a timer write.
const INTERVAL_SHIFTS: [u8; 4] = [0, 3, 6, 10]; // 1, 8, 64, 1024 clocks

/// MOS 6532 RAM-I/O-Timer (RIOT), register side.
///
/// The 128 bytes of RAM live on the system bus; this models the two I/O
/// ports and the interval timer. Registers are decoded from the low address
/// bits, with everything above A4 mirrored:
///
/// | A2 | A4 | A1:A0 | Read              | Write                      |
/// |----|----|-------|-------------------|----------------------------|
/// | 0  | x  | 0     | SWCHA (port A)    | SWCHA output register      |
/// | 0  | x  | 1     | SWACNT (DDR A)    | SWACNT                     |
/// | 0  | x  | 2     | SWCHB (port B)    | SWCHB output register      |
/// | 0  | x  | 3     | SWBCNT (DDR B)    | SWBCNT                     |
/// | 1  | 0  | x     | INTIM / TIMINT    | PA7 edge control           |
/// | 1  | 1  | x     | INTIM / TIMINT    | TIM1T/TIM8T/TIM64T/T1024T  |
///
/// Reads with A2 set return INTIM when A0 is clear and TIMINT when A0 is set.
///
/// After the timer passes zero it sets the underflow latch and counts down
/// once per clock until the next interval write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Riot {
    // Timer
    timer: u8,
    interval_shift: u8, // log2 of the programmed interval
    prescaler: u16,     // clocks left before the next decrement
    fast: bool,         // past underflow: decrement every clock
    underflow: bool,    // TIMINT bit 7

    // PA7 edge detect
    edge_flag: bool,     // TIMINT bit 6
    edge_positive: bool, // false = falling edge
    pa7: bool,

    // Ports
    output_a: u8,
    ddr_a: u8,
    input_a: u8,
    output_b: u8,
    ddr_b: u8,
    input_b: u8,
}

impl Default for Riot {
    fn default() -> Self {
        Self::new()
    }
}

impl Riot {
    /// Power-on state: all port pins inputs and pulled high, timer in the
    /// 1024-clock interval.
    pub fn new() -> Self {
        Self {
            timer: 0,
            interval_shift: 10,
            prescaler: 0,
            fast: false,
            underflow: false,
            edge_flag: false,
            edge_positive: false,
            pa7: true,
            output_a: 0,
            ddr_a: 0,
            input_a: 0xFF,
            output_b: 0,
            ddr_b: 0,
            input_b: 0xFF,
        }
    }

    /// CPU read. INTIM clears the underflow latch and TIMINT clears the
    /// PA7 edge flag.
    pub fn read(&mut self, addr: u16) -> u8 {
        let value = self.peek(addr);
        if addr & 0x04 != 0 {
            if addr & 0x01 == 0 {
                self.underflow = false;
            } else {
                self.edge_flag = false;
            }
        }
        value
    }

    /// Read without side effects (debugger views).
    pub fn peek(&self, addr: u16) -> u8 {
        if addr & 0x04 == 0 {
            match addr & 0x03 {
                0 => self.port_a(),
                1 => self.ddr_a,
                2 => self.port_b(),
                _ => self.ddr_b,
            }
        } else if addr & 0x01 == 0 {
            self.timer
        } else {
            ((self.underflow as u8) << 7) | ((self.edge_flag as u8) << 6)
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        if addr & 0x04 == 0 {
            match addr & 0x03 {
                0 => self.output_a = data,
                1 => self.ddr_a = data,
                2 => self.output_b = data,
                _ => self.ddr_b = data,
            }
            self.update_pa7();
        } else if addr & 0x10 != 0 {
            self.interval_shift = INTERVAL_SHIFTS[(addr & 0x03) as usize];
            self.timer = data;
            self.prescaler = 0;
            self.fast = false;
            self.underflow = false;
        } else {
            self.edge_positive = addr & 0x01 != 0;
        }
    }

    /// Port A as seen by the CPU: output register where DDR=1, pins where DDR=0.
    pub fn port_a(&self) -> u8 {
        (self.input_a & !self.ddr_a) | (self.output_a & self.ddr_a)
    }

    pub fn port_b(&self) -> u8 {
        (self.input_b & !self.ddr_b) | (self.output_b & self.ddr_b)
    }

    /// Set external input pins for port A (joysticks).
    pub fn set_port_a_input(&mut self, data: u8) {
        self.input_a = data;
        self.update_pa7();
    }

    /// Set external input pins for port B (console switches).
    pub fn set_port_b_input(&mut self, data: u8) {
        self.input_b = data;
    }

    pub fn port_a_input(&self) -> u8 {
        self.input_a
    }

    pub fn port_b_input(&self) -> u8 {
        self.input_b
    }

    fn update_pa7(&mut self) {
        let level = self.port_a() & 0x80 != 0;
        let rising = level && !self.pa7;
        let falling = !level && self.pa7;
        self.pa7 = level;
        if (self.edge_positive && rising) || (!self.edge_positive && falling) {
            self.edge_flag = true;
        }
    }

    pub fn timer(&self) -> u8 {
        self.timer
    }

    /// Programmed interval in clocks (1, 8, 64 or 1024).
    pub fn interval(&self) -> u16 {
        1 << self.interval_shift
    }

    pub fn underflow(&self) -> bool {
        self.underflow
    }
}

impl Component for Riot {
    /// One RIOT clock (one CPU cycle). Returns true on the clock the timer
    /// wraps past zero.
    fn tick(&mut self) -> bool {
        if self.prescaler > 0 {
            self.prescaler -= 1;
            return false;
        }

        let (next, wrapped) = self.timer.overflowing_sub(1);
        self.timer = next;
        if wrapped {
            self.underflow = true;
            self.fast = true;
        }
        self.prescaler = if self.fast { 0 } else { self.interval() - 1 };
        wrapped
    }
}
