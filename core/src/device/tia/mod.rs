//! TIA (Television Interface Adaptor)
//!
//! Color-clock driven video and audio generator. Each `tick()` is one
//! color clock; the CPU runs at one third of that rate. A scanline is 228
//! clocks: 68 of horizontal blank followed by 160 visible pixels.
//!
//! Register map (write, A0-A5):
//!   $00 VSYNC   $01 VBLANK  $02 WSYNC   $03 RSYNC
//!   $04-$05 NUSIZx  $06-$09 COLUP0/COLUP1/COLUPF/COLUBK  $0A CTRLPF
//!   $0B-$0C REFPx   $0D-$0F PF0-PF2
//!   $10-$14 RESP0/RESP1/RESM0/RESM1/RESBL
//!   $15-$1A AUDC/AUDF/AUDV    $1B-$1C GRPx  $1D-$1F ENAM0/ENAM1/ENABL
//!   $20-$24 HMxx  $25-$27 VDELxx  $28-$29 RESMPx
//!   $2A HMOVE  $2B HMCLR  $2C CXCLR
//!
//! Register map (read, A0-A3):
//!   $0-$7 collision latches (bits 7/6), $8-$B INPT0-3, $C-$D INPT4-5

use serde::{Deserialize, Serialize};

use crate::core::component::Component;

mod audio;
mod delay;
mod objects;
pub mod palette;

pub use audio::AudioChannel;
pub use delay::{DelayQueue, FuturePixels, MAX_DELAY, MIN_DELAY, PendingWrite};
pub use objects::{Ball, Missile, Player, VISIBLE_WIDTH};

use objects::{
    COLLISIONS, OBJ_BL, OBJ_M0, OBJ_M1, OBJ_P0, OBJ_P1, OBJ_PF, collision_register, motion,
    moved, playfield_pixel,
};

pub mod regs {
    pub const VSYNC: u8 = 0x00;
    pub const VBLANK: u8 = 0x01;
    pub const WSYNC: u8 = 0x02;
    pub const RSYNC: u8 = 0x03;
    pub const NUSIZ0: u8 = 0x04;
    pub const NUSIZ1: u8 = 0x05;
    pub const COLUP0: u8 = 0x06;
    pub const COLUP1: u8 = 0x07;
    pub const COLUPF: u8 = 0x08;
    pub const COLUBK: u8 = 0x09;
    pub const CTRLPF: u8 = 0x0A;
    pub const REFP0: u8 = 0x0B;
    pub const REFP1: u8 = 0x0C;
    pub const PF0: u8 = 0x0D;
    pub const PF1: u8 = 0x0E;
    pub const PF2: u8 = 0x0F;
    pub const RESP0: u8 = 0x10;
    pub const RESP1: u8 = 0x11;
    pub const RESM0: u8 = 0x12;
    pub const RESM1: u8 = 0x13;
    pub const RESBL: u8 = 0x14;
    pub const AUDC0: u8 = 0x15;
    pub const AUDC1: u8 = 0x16;
    pub const AUDF0: u8 = 0x17;
    pub const AUDF1: u8 = 0x18;
    pub const AUDV0: u8 = 0x19;
    pub const AUDV1: u8 = 0x1A;
    pub const GRP0: u8 = 0x1B;
    pub const GRP1: u8 = 0x1C;
    pub const ENAM0: u8 = 0x1D;
    pub const ENAM1: u8 = 0x1E;
    pub const ENABL: u8 = 0x1F;
    pub const HMP0: u8 = 0x20;
    pub const HMP1: u8 = 0x21;
    pub const HMM0: u8 = 0x22;
    pub const HMM1: u8 = 0x23;
    pub const HMBL: u8 = 0x24;
    pub const VDELP0: u8 = 0x25;
    pub const VDELP1: u8 = 0x26;
    pub const VDELBL: u8 = 0x27;
    pub const RESMP0: u8 = 0x28;
    pub const RESMP1: u8 = 0x29;
    pub const HMOVE: u8 = 0x2A;
    pub const HMCLR: u8 = 0x2B;
    pub const CXCLR: u8 = 0x2C;

    // Read registers
    pub const CXM0P: u8 = 0x00;
    pub const CXM1P: u8 = 0x01;
    pub const CXP0FB: u8 = 0x02;
    pub const CXP1FB: u8 = 0x03;
    pub const CXM0FB: u8 = 0x04;
    pub const CXM1FB: u8 = 0x05;
    pub const CXBLPF: u8 = 0x06;
    pub const CXPPMM: u8 = 0x07;
    pub const INPT0: u8 = 0x08;
    pub const INPT4: u8 = 0x0C;
    pub const INPT5: u8 = 0x0D;
}

use regs::*;

// ---------------------------------------------------------------------------
// Timing constants
// ---------------------------------------------------------------------------

pub const CLOCKS_PER_LINE: u8 = 228;
pub const HBLANK_CLOCKS: u8 = 68;
/// Lines kept per frame; a ROM that never strobes VSYNC gets a frame cut here.
pub const FRAME_LINES: u16 = 320;
/// Audio is clocked twice per scanline.
pub const AUDIO_CLOCKS: [u8; 2] = [0, 114];
/// NTSC color clock (3.579545 MHz) / 114.
pub const AUDIO_SAMPLE_RATE: u32 = 31_400;
/// One second of mixed samples; older ones are dropped when nobody drains.
const SAMPLE_CAPACITY: usize = AUDIO_SAMPLE_RATE as usize;
/// GRP writes kept per frame for the sprite viewer.
const SPRITE_LOG_CAPACITY: usize = 256;

/// A GRPx write observed during a frame: (scanline, pattern).
pub type SpriteWrite = (u16, u8);

/// Snapshot of the write-only registers for the debugger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TiaRegisters {
    pub vsync: bool,
    pub vblank: u8,
    pub colors: [u8; 4], // COLUP0, COLUP1, COLUPF, COLUBK
    pub ctrlpf: u8,
    pub pf: [u8; 3],
    pub players: [Player; 2],
    pub missiles: [Missile; 2],
    pub ball: Ball,
    pub nusiz: [u8; 2],
    pub audio: [AudioChannel; 2],
    pub collisions: [u8; 8],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tia {
    // Beam
    hclock: u8,
    scanline: u16,
    frame_count: u64,
    vsync: bool,
    vblank: u8,
    wsync: bool,
    hmove_blank: bool,

    // Graphics registers
    colors: [u8; 4],
    ctrlpf: u8,
    pf: [u8; 3],
    players: [Player; 2],
    missiles: [Missile; 2],
    ball: Ball,
    collisions: u16,
    pending: DelayQueue,

    // Audio
    channels: [AudioChannel; 2],

    // Inputs
    fire: [bool; 2],       // live button state, true = pressed
    fire_latch: [bool; 2], // presses held while VBLANK bit 6 is set

    // Video output: one color register value per pixel
    frame: Vec<u8>,

    #[serde(skip)]
    delays: FuturePixels,
    #[serde(skip)]
    completed: Vec<u8>,
    #[serde(skip)]
    frame_ready: bool,
    #[serde(skip)]
    samples: Vec<u8>,
    #[serde(skip)]
    sprite_log: [Vec<SpriteWrite>; 2],
    #[serde(skip)]
    last_sprite_log: [Vec<SpriteWrite>; 2],
}

impl Default for Tia {
    fn default() -> Self {
        Self::new(FuturePixels::default())
    }
}

impl Tia {
    pub fn new(delays: FuturePixels) -> Self {
        let frame_len = VISIBLE_WIDTH as usize * FRAME_LINES as usize;
        Self {
            hclock: 0,
            scanline: 0,
            frame_count: 0,
            vsync: false,
            vblank: 0,
            wsync: false,
            hmove_blank: false,
            colors: [0; 4],
            ctrlpf: 0,
            pf: [0; 3],
            players: Default::default(),
            missiles: Default::default(),
            ball: Ball::default(),
            collisions: 0,
            pending: DelayQueue::default(),
            channels: Default::default(),
            fire: [false; 2],
            fire_latch: [false; 2],
            frame: vec![0; frame_len],
            delays: delays.clamped(),
            completed: vec![0; frame_len],
            frame_ready: false,
            samples: Vec::new(),
            sprite_log: Default::default(),
            last_sprite_log: Default::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Bus interface
    // -----------------------------------------------------------------------

    /// Read register (A0-A3). Reads have no side effects.
    pub fn read(&self, reg: u8) -> u8 {
        let reg = reg & 0x0F;
        match reg {
            CXM0P..=CXPPMM => collision_register(self.collisions, reg),
            0x08..=0x0B => {
                // No paddles: the ports read charged unless VBLANK bit 7 grounds them
                if self.vblank & 0x80 != 0 { 0x00 } else { 0x80 }
            }
            INPT4 | INPT5 => {
                let p = (reg - INPT4) as usize;
                let latched = self.vblank & 0x40 != 0 && self.fire_latch[p];
                if self.fire[p] || latched { 0x00 } else { 0x80 }
            }
            _ => 0x00,
        }
    }

    /// Write register (A0-A5). Graphics registers go through the delay queue.
    pub fn write(&mut self, reg: u8, value: u8) {
        let reg = reg & 0x3F;
        match self.delays.delay_for(reg) {
            Some(delay) => self.pending.push(reg, value, delay),
            None => self.apply(reg, value),
        }
    }

    fn apply(&mut self, reg: u8, value: u8) {
        match reg {
            VSYNC => {
                let on = value & 0x02 != 0;
                if on && !self.vsync {
                    self.end_frame();
                }
                self.vsync = on;
            }
            VBLANK => {
                if value & 0x40 == 0 {
                    self.fire_latch = [false; 2];
                }
                self.vblank = value;
            }
            WSYNC => self.wsync = true,
            RSYNC => log::debug!("RSYNC ignored at clock {}", self.hclock),
            NUSIZ0 | NUSIZ1 => self.players[(reg - NUSIZ0) as usize].nusiz = value,
            COLUP0..=COLUBK => self.colors[(reg - COLUP0) as usize] = value & 0xFE,
            CTRLPF => self.ctrlpf = value,
            REFP0 | REFP1 => self.players[(reg - REFP0) as usize].reflect = value & 0x08 != 0,
            PF0..=PF2 => self.pf[(reg - PF0) as usize] = value,
            RESP0 | RESP1 => {
                let pos = self.reset_position(5, 3);
                self.players[(reg - RESP0) as usize].pos = pos;
            }
            RESM0 | RESM1 => {
                let pos = self.reset_position(4, 2);
                self.missiles[(reg - RESM0) as usize].pos = pos;
            }
            RESBL => self.ball.pos = self.reset_position(4, 2),
            AUDC0 | AUDC1 => self.channels[(reg - AUDC0) as usize].write_audc(value),
            AUDF0 | AUDF1 => self.channels[(reg - AUDF0) as usize].write_audf(value),
            AUDV0 | AUDV1 => self.channels[(reg - AUDV0) as usize].write_audv(value),
            GRP0 => {
                self.players[0].grp_new = value;
                self.players[1].grp_old = self.players[1].grp_new;
                self.log_sprite(0, value);
            }
            GRP1 => {
                self.players[1].grp_new = value;
                self.players[0].grp_old = self.players[0].grp_new;
                self.ball.enabled_old = self.ball.enabled_new;
                self.log_sprite(1, value);
            }
            ENAM0 | ENAM1 => self.missiles[(reg - ENAM0) as usize].enabled = value & 0x02 != 0,
            ENABL => self.ball.enabled_new = value & 0x02 != 0,
            HMP0 | HMP1 => self.players[(reg - HMP0) as usize].hm = motion(value),
            HMM0 | HMM1 => self.missiles[(reg - HMM0) as usize].hm = motion(value),
            HMBL => self.ball.hm = motion(value),
            VDELP0 | VDELP1 => self.players[(reg - VDELP0) as usize].vdel = value & 0x01 != 0,
            VDELBL => self.ball.vdel = value & 0x01 != 0,
            RESMP0 | RESMP1 => {
                let i = (reg - RESMP0) as usize;
                self.missiles[i].locked = value & 0x02 != 0;
                if self.missiles[i].locked {
                    self.missiles[i].pos = self.players[i].center();
                }
            }
            HMOVE => self.hmove(),
            HMCLR => {
                for p in self.players.iter_mut() {
                    p.hm = 0;
                }
                for m in self.missiles.iter_mut() {
                    m.hm = 0;
                }
                self.ball.hm = 0;
            }
            CXCLR => self.collisions = 0,
            _ => {}
        }
    }

    /// Position for a RESxx strobe: `visible_offset` pixels after the
    /// current beam position, or `hblank_pos` during horizontal blank.
    fn reset_position(&self, visible_offset: u16, hblank_pos: u8) -> u8 {
        if self.hclock < HBLANK_CLOCKS {
            hblank_pos
        } else {
            let x = (self.hclock - HBLANK_CLOCKS) as u16;
            ((x + visible_offset) % VISIBLE_WIDTH) as u8
        }
    }

    fn hmove(&mut self) {
        for p in self.players.iter_mut() {
            p.pos = moved(p.pos, p.hm);
        }
        for m in self.missiles.iter_mut() {
            m.pos = moved(m.pos, m.hm);
        }
        self.ball.pos = moved(self.ball.pos, self.ball.hm);
        if self.hclock < HBLANK_CLOCKS {
            self.hmove_blank = true;
        }
    }

    fn log_sprite(&mut self, player: usize, value: u8) {
        let log = &mut self.sprite_log[player];
        if log.len() < SPRITE_LOG_CAPACITY {
            log.push((self.scanline, value));
        }
    }

    // -----------------------------------------------------------------------
    // Video
    // -----------------------------------------------------------------------

    fn render_pixel(&mut self) {
        let x = self.hclock - HBLANK_CLOCKS;

        for (m, p) in self.missiles.iter_mut().zip(self.players.iter()) {
            if m.locked {
                m.pos = p.center();
            }
        }

        let mut objects = 0u8;
        if self.players[0].pixel(x) {
            objects |= OBJ_P0;
        }
        if self.players[1].pixel(x) {
            objects |= OBJ_P1;
        }
        if self.missiles[0].pixel(x, self.players[0].nusiz) {
            objects |= OBJ_M0;
        }
        if self.missiles[1].pixel(x, self.players[1].nusiz) {
            objects |= OBJ_M1;
        }
        if self.ball.pixel(x, self.ctrlpf) {
            objects |= OBJ_BL;
        }
        if playfield_pixel(&self.pf, self.ctrlpf, x) {
            objects |= OBJ_PF;
        }
        self.collisions |= COLLISIONS[objects as usize];

        let blank = self.vblank & 0x02 != 0 || (self.hmove_blank && x < 8);
        let color = if blank { 0 } else { self.color_for(objects, x) };

        if self.scanline < FRAME_LINES {
            let idx = self.scanline as usize * VISIBLE_WIDTH as usize + x as usize;
            self.frame[idx] = color;
        }
    }

    /// Priority: players/missiles over ball/playfield over background,
    /// reversed for the playfield when CTRLPF bit 2 is set.
    fn color_for(&self, objects: u8, x: u8) -> u8 {
        let [colup0, colup1, colupf, colubk] = self.colors;
        let score = self.ctrlpf & 0x02 != 0;
        let priority = self.ctrlpf & 0x04 != 0;

        let pf_color = if objects & OBJ_BL != 0 {
            Some(colupf)
        } else if objects & OBJ_PF != 0 {
            Some(if score && !priority {
                if x < 80 { colup0 } else { colup1 }
            } else {
                colupf
            })
        } else {
            None
        };
        let p0 = (objects & (OBJ_P0 | OBJ_M0) != 0).then_some(colup0);
        let p1 = (objects & (OBJ_P1 | OBJ_M1) != 0).then_some(colup1);

        let ordered = if priority {
            [pf_color, p0, p1]
        } else {
            [p0, p1, pf_color]
        };
        ordered.into_iter().flatten().next().unwrap_or(colubk)
    }

    fn end_frame(&mut self) {
        std::mem::swap(&mut self.frame, &mut self.completed);
        self.frame.fill(0);
        self.frame_ready = true;
        self.frame_count += 1;
        self.scanline = 0;
        for (last, current) in self.last_sprite_log.iter_mut().zip(self.sprite_log.iter_mut()) {
            *last = std::mem::take(current);
        }
    }

    fn end_line(&mut self) {
        self.hclock = 0;
        self.wsync = false;
        self.hmove_blank = false;
        self.scanline += 1;
        if self.scanline >= FRAME_LINES {
            self.end_frame();
        }
    }

    fn clock_audio(&mut self) {
        for ch in self.channels.iter_mut() {
            ch.clock();
        }
        if self.samples.len() < SAMPLE_CAPACITY {
            self.samples.push(self.channels[0].volume() + self.channels[1].volume());
        }
    }

    // -----------------------------------------------------------------------
    // Outputs and inspection
    // -----------------------------------------------------------------------

    /// WSYNC halt line (RDY) the scheduler samples.
    pub fn rdy_halt(&self) -> bool {
        self.wsync
    }

    pub fn hclock(&self) -> u8 {
        self.hclock
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn vsync(&self) -> bool {
        self.vsync
    }

    pub fn vblank(&self) -> bool {
        self.vblank & 0x02 != 0
    }

    /// All 15 collision latches (see `objects::latch` for the layout).
    pub fn collisions(&self) -> u16 {
        self.collisions
    }

    pub fn pending_writes(&self) -> &DelayQueue {
        &self.pending
    }

    pub fn delays(&self) -> FuturePixels {
        self.delays
    }

    pub fn set_delays(&mut self, delays: FuturePixels) {
        self.delays = delays.clamped();
    }

    /// Returns true once per completed frame.
    pub fn take_frame_ready(&mut self) -> bool {
        std::mem::take(&mut self.frame_ready)
    }

    /// Last completed frame: `VISIBLE_WIDTH * FRAME_LINES` color values.
    pub fn completed_frame(&self) -> &[u8] {
        &self.completed
    }

    /// Mixed samples (0-30) produced since the last drain.
    pub fn drain_audio(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.samples)
    }

    /// GRP writes of the last completed frame, per player.
    pub fn sprite_writes(&self, player: usize) -> &[SpriteWrite] {
        &self.last_sprite_log[player & 1]
    }

    pub fn set_fire_button(&mut self, player: usize, pressed: bool) {
        let p = player & 1;
        self.fire[p] = pressed;
        if pressed && self.vblank & 0x40 != 0 {
            self.fire_latch[p] = true;
        }
    }

    pub fn registers(&self) -> TiaRegisters {
        let mut collisions = [0u8; 8];
        for (reg, c) in collisions.iter_mut().enumerate() {
            *c = collision_register(self.collisions, reg as u8);
        }
        TiaRegisters {
            vsync: self.vsync,
            vblank: self.vblank,
            colors: self.colors,
            ctrlpf: self.ctrlpf,
            pf: self.pf,
            players: self.players.clone(),
            missiles: self.missiles.clone(),
            ball: self.ball.clone(),
            nusiz: [self.players[0].nusiz, self.players[1].nusiz],
            audio: self.channels.clone(),
            collisions,
        }
    }

    /// Carry host-side configuration and output buffers over from `other`
    /// after this state was deserialized from a snapshot.
    pub fn adopt_host_state(&mut self, other: &Tia) {
        self.delays = other.delays;
        self.completed = other.completed.clone();
        if self.frame.len() != other.frame.len() {
            self.frame.resize(other.frame.len(), 0);
        }
    }
}

impl Component for Tia {
    /// One color clock. Returns true at the end of each scanline.
    fn tick(&mut self) -> bool {
        self.pending.advance();
        while let Some((reg, value)) = self.pending.take_due() {
            self.apply(reg, value);
        }

        if AUDIO_CLOCKS.contains(&self.hclock) {
            self.clock_audio();
        }
        if self.hclock >= HBLANK_CLOCKS {
            self.render_pixel();
        }

        self.hclock += 1;
        if self.hclock == CLOCKS_PER_LINE {
            self.end_line();
            return true;
        }
        false
    }
}
