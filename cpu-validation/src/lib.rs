use std::io::{self, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use vcs_core::core::{Bus, BusMaster, BusMasterComponent};
use vcs_core::cpu::M6502;
use vcs_core::cpu::m6502::{CpuDispatcher, TableDispatch};

// --- TracingBus: flat 64KB memory with cycle-by-cycle recording ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusOp {
    Read,
    Write,
}

impl BusOp {
    /// Name used by the SingleStepTests vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            BusOp::Read => "read",
            BusOp::Write => "write",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusCycle {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
}

#[derive(Clone)]
pub struct TracingBus {
    pub memory: Box<[u8; 0x10000]>,
    pub cycles: Vec<BusCycle>,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            cycles: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn clear_cycles(&mut self) {
        self.cycles.clear();
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TracingBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        let data = self.memory[addr as usize];
        self.cycles.push(BusCycle {
            addr,
            data,
            op: BusOp::Read,
        });
        data
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
        self.cycles.push(BusCycle {
            addr,
            data,
            op: BusOp::Write,
        });
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        false
    }
}

// --- Execution helpers ---

/// Upper bound on the cycles any defined instruction takes.
pub const MAX_INSTRUCTION_CYCLES: usize = 8;

/// Tick until one instruction completes. Returns the cycles taken, or
/// `None` if it ran past [`MAX_INSTRUCTION_CYCLES`].
pub fn run_instruction(cpu: &mut M6502, bus: &mut TracingBus) -> Option<usize> {
    for ticks in 1..=MAX_INSTRUCTION_CYCLES {
        if cpu.tick_with_bus(bus, BusMaster::Cpu(0)) {
            return Some(ticks);
        }
    }
    None
}

/// Every opcode the CPU decodes, in ascending order.
pub fn implemented_opcodes() -> Vec<u8> {
    (0..=0xFFu8)
        .filter(|&op| TableDispatch.is_defined(op))
        .collect()
}

// --- M6502 JSON test vector types (SingleStepTests/65x02 format) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct M6502TestCase {
    pub name: String,
    pub initial: M6502CpuState,
    #[serde(rename = "final")]
    pub final_state: M6502CpuState,
    pub cycles: Vec<(u16, u8, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct M6502CpuState {
    pub pc: u16,
    pub s: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub ram: Vec<(u16, u8)>,
}

/// Read the vectors for one opcode from `dir`, as `xx.json` or
/// gzip-compressed `xx.json.gz`. `Ok(None)` when neither file exists.
pub fn load_vectors(dir: &Path, opcode: u8) -> io::Result<Option<Vec<M6502TestCase>>> {
    let plain = dir.join(format!("{opcode:02x}.json"));
    let gzipped = dir.join(format!("{opcode:02x}.json.gz"));

    let mut json = Vec::new();
    if plain.exists() {
        json = std::fs::read(&plain)?;
    } else if gzipped.exists() {
        GzDecoder::new(std::fs::File::open(&gzipped)?).read_to_end(&mut json)?;
    } else {
        return Ok(None);
    }
    let tests = serde_json::from_slice(&json)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(tests))
}

impl M6502CpuState {
    /// Put this state into a CPU sitting at an instruction boundary.
    pub fn apply(&self, cpu: &mut M6502, bus: &mut TracingBus) {
        cpu.pc = self.pc;
        cpu.sp = self.s;
        cpu.a = self.a;
        cpu.x = self.x;
        cpu.y = self.y;
        cpu.p = self.p;
        for &(addr, val) in &self.ram {
            bus.memory[addr as usize] = val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defined_set_excludes_jams() {
        let ops = implemented_opcodes();
        assert_eq!(ops.len(), 203);
        assert!(ops.contains(&0x00));
        assert!(ops.contains(&0xEA));
        assert!(!ops.contains(&0x02));
    }

    #[test]
    fn load_vectors_reads_gzip() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let dir = std::env::temp_dir().join("vcs_cpu_validation_vectors");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let json = br#"[{"name": "ea 1", "initial": {"pc": 512, "s": 253, "a": 0, "x": 0, "y": 0, "p": 36, "ram": [[512, 234]]}, "final": {"pc": 513, "s": 253, "a": 0, "x": 0, "y": 0, "p": 36, "ram": [[512, 234]]}, "cycles": [[512, 234, "read"], [513, 0, "read"]]}]"#;
        let mut gz = GzEncoder::new(Vec::new(), Compression::default());
        gz.write_all(json).unwrap();
        std::fs::write(dir.join("ea.json.gz"), gz.finish().unwrap()).unwrap();

        let tests = load_vectors(&dir, 0xEA).unwrap().unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].final_state.pc, 513);
        assert!(load_vectors(&dir, 0xA9).unwrap().is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn run_instruction_traces_bus() {
        let mut cpu = M6502::new();
        let mut bus = TracingBus::new();
        bus.load(0x0200, &[0x8D, 0x34, 0x12]); // STA $1234
        cpu.pc = 0x0200;
        cpu.a = 0x5A;

        assert_eq!(run_instruction(&mut cpu, &mut bus), Some(4));
        assert_eq!(bus.memory[0x1234], 0x5A);
        assert_eq!(
            bus.cycles.last(),
            Some(&BusCycle {
                addr: 0x1234,
                data: 0x5A,
                op: BusOp::Write
            })
        );
        assert_eq!(bus.cycles.len(), 4);
    }
}
