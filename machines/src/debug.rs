//! Read-only views for a debugger front end: CPU registers with change
//! flags, memory windows, TIA registers, sprite bitmaps rebuilt from GRP
//! writes, a text dump report and a per-instruction trace line.

use std::io;

use vcs_core::cpu::M6502State;
use vcs_core::device::tia::{FRAME_LINES, SpriteWrite, TiaRegisters};

use crate::atari2600::Atari2600;

// ---------------------------------------------------------------------------
// CPU view
// ---------------------------------------------------------------------------

/// Which registers differ from the previous view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuChanged {
    pub a: bool,
    pub x: bool,
    pub y: bool,
    pub pc: bool,
    pub sp: bool,
    pub p: bool,
}

impl CpuChanged {
    pub fn any(&self) -> bool {
        self.a || self.x || self.y || self.pc || self.sp || self.p
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuView {
    pub regs: M6502State,
    pub changed: CpuChanged,
}

impl CpuView {
    /// Flags as `NV-BDIZC`, lower case when clear.
    pub fn flags(&self) -> String {
        "NV-BDIZC"
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let set = self.regs.p & (0x80 >> i) != 0;
                if set { c } else { c.to_ascii_lowercase() }
            })
            .collect()
    }
}

/// Remembers the registers of the last view taken.
#[derive(Clone, Debug, Default)]
pub struct CpuWatch {
    previous: Option<M6502State>,
}

impl CpuWatch {
    /// Registers now, flagged against the previous call. The first view
    /// reports nothing as changed.
    pub fn view(&mut self, machine: &Atari2600) -> CpuView {
        let regs = machine.cpu_state();
        let changed = match self.previous {
            Some(prev) => CpuChanged {
                a: prev.a != regs.a,
                x: prev.x != regs.x,
                y: prev.y != regs.y,
                pc: prev.pc != regs.pc,
                sp: prev.sp != regs.sp,
                p: prev.p != regs.p,
            },
            None => CpuChanged::default(),
        };
        self.previous = Some(regs);
        CpuView { regs, changed }
    }
}

// ---------------------------------------------------------------------------
// Memory and chip views
// ---------------------------------------------------------------------------

/// The 4K cartridge window as the CPU currently sees it.
pub struct CartridgeView {
    pub bank: String,
    pub bytes: Vec<u8>,
    /// Cartridge RAM, empty for schemes without it.
    pub ram: Vec<u8>,
}

pub fn cartridge_view(machine: &Atari2600) -> CartridgeView {
    let cart = machine.cartridge();
    CartridgeView {
        bank: cart.bank_label(),
        bytes: (0x1000..0x2000u16).map(|addr| cart.peek(addr)).collect(),
        ram: cart.ram().to_vec(),
    }
}

pub fn tia_view(machine: &Atari2600) -> TiaRegisters {
    machine.tia().registers()
}

/// One player's GRP pattern per scanline of the last completed frame.
/// A pattern holds until the next write, as it does on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteBitmap {
    pub rows: Vec<u8>,
}

impl SpriteBitmap {
    pub fn from_writes(writes: &[SpriteWrite]) -> Self {
        let mut rows = vec![0u8; FRAME_LINES as usize];
        let mut pattern = 0u8;
        let mut next = writes.iter().peekable();
        for (line, row) in rows.iter_mut().enumerate() {
            while let Some(&&(at, value)) = next.peek() {
                if at as usize > line {
                    break;
                }
                pattern = value;
                next.next();
            }
            *row = pattern;
        }
        Self { rows }
    }

    /// Rows that draw anything, as `#`/`.` art with their scanline.
    pub fn render(&self) -> Vec<(u16, String)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|&(_, &row)| row != 0)
            .map(|(line, &row)| {
                let art = (0..8)
                    .map(|bit| if row & (0x80 >> bit) != 0 { '#' } else { '.' })
                    .collect();
                (line as u16, art)
            })
            .collect()
    }
}

pub fn sprite_bitmap(machine: &Atari2600, player: usize) -> SpriteBitmap {
    SpriteBitmap::from_writes(machine.tia().sprite_writes(player))
}

// ---------------------------------------------------------------------------
// Trace
// ---------------------------------------------------------------------------

/// Operand bytes following an opcode, from the 6502's aaabbbcc layout.
pub fn operand_len(opcode: u8) -> u16 {
    let mode = (opcode >> 2) & 0x07;
    match opcode & 0x03 {
        0x00 => match (mode, opcode) {
            (0, 0x20) => 2,
            (0, 0x00 | 0x40 | 0x60) => 0,
            (0, _) | (1, _) | (4, _) | (5, _) => 1,
            (2, _) | (6, _) => 0,
            _ => 2,
        },
        0x01 => match mode {
            3 | 6 | 7 => 2,
            _ => 1,
        },
        cc => match mode {
            0 if cc == 0x02 && matches!(opcode, 0x02 | 0x22 | 0x42 | 0x62) => 0,
            0 | 1 | 5 => 1,
            2 if cc == 0x03 => 1,
            2 => 0,
            4 if cc == 0x02 => 0,
            4 => 1,
            6 if cc == 0x02 => 0,
            _ => 2,
        },
    }
}

/// One line per instruction boundary:
/// `F000  A9 01     A:00 X:00 Y:00 P:20 SP:FD  CYC:12 SL:0 HC:36`
pub fn trace_line(machine: &Atari2600) -> String {
    let regs = machine.cpu_state();
    let opcode = machine.peek(regs.pc);
    let len = operand_len(opcode);
    let mut bytes = format!("{opcode:02X}");
    for i in 1..=len {
        bytes.push_str(&format!(" {:02X}", machine.peek(regs.pc.wrapping_add(i))));
    }
    let tia = machine.tia();
    format!(
        "{:04X}  {bytes:<8}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}  CYC:{} SL:{} HC:{}",
        regs.pc,
        regs.a,
        regs.x,
        regs.y,
        regs.p,
        regs.sp,
        machine.cycles(),
        tia.scanline(),
        tia.hclock(),
    )
}

// ---------------------------------------------------------------------------
// Dump report
// ---------------------------------------------------------------------------

const RULE: &str = "--------------------------------------------------";

fn hex_row<W: io::Write>(out: &mut W, addr: usize, bytes: &[u8]) -> io::Result<()> {
    let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02X}")).collect();
    let ascii: String = bytes
        .iter()
        .map(|&b| if (32..127).contains(&b) { b as char } else { '.' })
        .collect();
    writeln!(out, "${addr:04X}: {:<47}  |{ascii}|", hex.join(" "))
}

/// Full text report of the machine state.
pub fn write_dump<W: io::Write>(machine: &Atari2600, out: &mut W) -> io::Result<()> {
    let regs = machine.cpu_state();
    let view = CpuView {
        regs,
        changed: CpuChanged::default(),
    };

    writeln!(out, "ATARI 2600 STATE DUMP")?;
    writeln!(out, "{}", "=".repeat(RULE.len()))?;
    writeln!(out)?;

    writeln!(out, "CPU STATE")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "PC:  ${:04X}", regs.pc)?;
    writeln!(out, "A:   ${:02X}   ({:3})", regs.a, regs.a)?;
    writeln!(out, "X:   ${:02X}   ({:3})", regs.x, regs.x)?;
    writeln!(out, "Y:   ${:02X}   ({:3})", regs.y, regs.y)?;
    writeln!(out, "SP:  ${:02X}   (-> ${:04X})", regs.sp, 0x100 + regs.sp as u16)?;
    writeln!(out, "P:   ${:02X}   {}", regs.p, view.flags())?;
    writeln!(out)?;

    let tia = machine.tia();
    writeln!(out, "TIMING")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "CPU cycles:   {}", machine.cycles())?;
    writeln!(out, "Color clocks: {}", machine.color_clocks())?;
    writeln!(out, "Frame:        {}", tia.frame_count())?;
    writeln!(out, "Scanline:     {}  clock {}", tia.scanline(), tia.hclock())?;
    writeln!(out)?;

    let ram = machine.ram();
    writeln!(out, "RIOT RAM ($0080-$00FF, mirrored at $0180-$01FF)")?;
    writeln!(out, "{RULE}")?;
    for (row, chunk) in ram.chunks(16).enumerate() {
        hex_row(out, 0x80 + row * 16, chunk)?;
    }
    writeln!(out)?;

    writeln!(out, "STACK (SP=${:02X})", regs.sp)?;
    writeln!(out, "{RULE}")?;
    if regs.sp == 0xFF {
        writeln!(out, "  (empty)")?;
    }
    for sp in (regs.sp as u16 + 1)..=(regs.sp as u16 + 32).min(0xFF) {
        writeln!(out, "  ${:04X}: ${:02X}", 0x100 + sp, ram[(sp & 0x7F) as usize])?;
    }
    writeln!(out)?;

    let riot = machine.riot();
    writeln!(out, "RIOT")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "SWCHA: ${:02X}  SWCHB: ${:02X}", riot.port_a(), riot.port_b())?;
    writeln!(
        out,
        "INTIM: ${:02X}  interval {}  underflow {}",
        riot.timer(),
        riot.interval(),
        riot.underflow()
    )?;
    writeln!(out)?;

    let r = tia.registers();
    writeln!(out, "TIA STATE")?;
    writeln!(out, "{RULE}")?;
    for (i, p) in r.players.iter().enumerate() {
        writeln!(
            out,
            "Player {i}:   GRP=${:02X} ({:08b})  pos {:3}  NUSIZ=${:02X}  REFP={}  VDELP={}",
            p.grp_new, p.grp_new, p.pos, r.nusiz[i], p.reflect as u8, p.vdel as u8
        )?;
    }
    for (i, m) in r.missiles.iter().enumerate() {
        writeln!(out, "Missile {i}:  ENAM={}  pos {:3}", m.enabled as u8, m.pos)?;
    }
    writeln!(out, "Ball:       ENABL={}  pos {:3}", r.ball.enabled() as u8, r.ball.pos)?;
    writeln!(
        out,
        "Playfield:  PF0=${:02X}  PF1=${:02X}  PF2=${:02X}  CTRLPF=${:02X}",
        r.pf[0], r.pf[1], r.pf[2], r.ctrlpf
    )?;
    writeln!(
        out,
        "Colors:     P0=${:02X} P1=${:02X} PF=${:02X} BK=${:02X}",
        r.colors[0], r.colors[1], r.colors[2], r.colors[3]
    )?;
    writeln!(out, "VSYNC={}  VBLANK=${:02X}", r.vsync as u8, r.vblank)?;
    writeln!(out, "Pending writes: {}", tia.pending_writes().len())?;
    writeln!(out)?;

    const CX_NAMES: [&str; 8] = [
        "CXM0P", "CXM1P", "CXP0FB", "CXP1FB", "CXM0FB", "CXM1FB", "CXBLPF", "CXPPMM",
    ];
    writeln!(out, "COLLISION REGISTERS")?;
    writeln!(out, "{RULE}")?;
    for pair in CX_NAMES.chunks(2).zip(r.collisions.chunks(2)) {
        let (names, values) = pair;
        writeln!(
            out,
            "{:<7} ${:02X}  {:<7} ${:02X}",
            names[0], values[0], names[1], values[1]
        )?;
    }
    writeln!(out)?;

    let cart = machine.cartridge();
    writeln!(out, "CARTRIDGE")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "{}", cart.identity())?;
    writeln!(out, "Active: {}", cart.bank_label())?;
    writeln!(out)?;
    for (row, chunk) in cart.rom().chunks(16).enumerate() {
        hex_row(out, row * 16, chunk)?;
    }
    writeln!(out)?;

    let vector = |addr: u16| u16::from_le_bytes([machine.peek(addr), machine.peek(addr + 1)]);
    writeln!(out, "Vectors (active bank):")?;
    writeln!(out, "  NMI:   ${:04X}", vector(0xFFFA))?;
    writeln!(out, "  RESET: ${:04X}", vector(0xFFFC))?;
    writeln!(out, "  IRQ:   ${:04X}", vector(0xFFFE))?;
    Ok(())
}
