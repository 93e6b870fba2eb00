use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{info, warn};
use vcs_machines::{Atari2600, MachineError, debug};

/// NTSC field rate used for pacing.
const FRAME_TIME: Duration = Duration::from_nanos(1_000_000_000 / 60);

pub struct RunOptions {
    /// Stop once this many color clocks have elapsed.
    pub stop_clock: Option<u64>,
    /// Stop after this many frames.
    pub max_frames: Option<u64>,
    /// Print a trace line per instruction and a dump at exit.
    pub debug: bool,
    /// Hold each frame to 1/60 s.
    pub pace: bool,
    /// Restored at startup if present, written at exit.
    pub state_path: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub frames: u64,
    pub cycles: u64,
}

/// Restore from the state file if one exists. A missing file is not an
/// error. A file saved from another cartridge or version is left alone:
/// the machine starts from power-on and the exit save is dropped so the
/// file is not overwritten. On any other error the machine is left as it
/// was.
pub fn restore(machine: &mut Atari2600, opts: &mut RunOptions) -> Result<(), MachineError> {
    let Some(path) = &opts.state_path else {
        return Ok(());
    };
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    match machine.load_state(&bytes) {
        Ok(()) => {
            info!(
                "restored {} at cycle {}",
                path.display(),
                machine.cycles()
            );
            Ok(())
        }
        Err(MachineError::IncompatibleSnapshot(why)) => {
            warn!(
                "ignoring state file {}: {why}; it will not be saved over",
                path.display()
            );
            opts.state_path = None;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Run until the stop clock or frame limit. With neither set, runs until
/// the process is interrupted.
pub fn run(machine: &mut Atari2600, opts: &RunOptions) -> Result<RunSummary, MachineError> {
    let stop = opts.stop_clock;
    let reached = move |m: &Atari2600| stop.is_some_and(|clock| m.color_clocks() >= clock);

    let mut summary = RunSummary::default();
    let mut deadline = Instant::now() + FRAME_TIME;
    let stdout = std::io::stdout();

    loop {
        let frame = machine.frame_count();
        if opts.debug {
            let mut out = stdout.lock();
            while machine.frame_count() == frame && !reached(machine) {
                writeln!(out, "{}", debug::trace_line(machine))?;
                machine.step_instruction()?;
            }
        } else {
            machine.run_until(|m| m.frame_count() != frame || reached(m))?;
        }

        if reached(machine) {
            break;
        }
        summary.frames += 1;
        if opts.max_frames.is_some_and(|max| summary.frames >= max) {
            break;
        }

        if opts.pace {
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
                deadline += FRAME_TIME;
            } else {
                // Running behind; don't try to catch up
                deadline = now + FRAME_TIME;
            }
        }
    }

    // Snapshots and the dump need an instruction boundary
    machine.pause()?;
    summary.cycles = machine.cycles();

    if opts.debug {
        debug::write_dump(machine, &mut stdout.lock())?;
    }
    if let Some(path) = &opts.state_path {
        std::fs::write(path, machine.save_state()?)?;
        info!("saved state to {}", path.display());
    }
    Ok(summary)
}
