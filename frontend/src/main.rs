use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::info;

use vcs_core::cpu::m6502::DispatchStrategy;
use vcs_core::device::BankScheme;
use vcs_core::device::tia::AUDIO_SAMPLE_RATE;
use vcs_machines::{Atari2600, MachineConfig, OpcodePolicy};

mod config;
mod emulator;
mod rom_path;
mod sinks;

use config::Config;
use emulator::RunOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Graphics {
    /// Write every frame as a PNG under --frames-dir
    Png,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Audio {
    /// Record to the --wav file
    File,
    /// Mix audio and discard it
    Null,
    None,
}

/// Cycle-accurate Atari 2600 emulator
#[derive(Parser, Debug)]
#[command(name = "vcs", version)]
struct Cli {
    /// Cartridge image (.a26/.bin) or a .zip holding one
    rom: PathBuf,

    /// Bank-switch scheme: default, single_bank, f4, fe, e, super, pb, mnet, cbs
    #[arg(short = 'c', long = "cart")]
    cart: Option<BankScheme>,

    /// Video output
    #[arg(short = 'g', long = "graphics", value_enum, default_value_t = Graphics::None)]
    graphics: Graphics,

    /// CPU dispatch strategy: direct or table
    #[arg(long = "cpu")]
    cpu: Option<DispatchStrategy>,

    /// Audio output
    #[arg(short = 'a', long = "audio", value_enum, default_value_t = Audio::None)]
    audio: Audio,

    /// Trace every instruction and dump machine state at exit
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Save-state file: restored at startup if present, written at exit
    #[arg(short = 'r', long = "state")]
    state: Option<PathBuf>,

    /// Stop after this many color clocks
    #[arg(short = 's', long = "stop-clock")]
    stop_clock: Option<u64>,

    /// Run as fast as possible instead of at 60 frames per second
    #[arg(short = 'n', long = "no-delay")]
    no_delay: bool,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Unimplemented opcodes: fatal or skip
    #[arg(long)]
    policy: Option<OpcodePolicy>,

    #[arg(long, default_value = "frames")]
    frames_dir: PathBuf,

    #[arg(long, default_value = "vcs.wav")]
    wav: PathBuf,

    /// Config file (default: <config dir>/vcs/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("vcs: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = Config::load(cli.config.as_deref())?;

    let scheme = match (cli.cart, &config.cart) {
        (Some(scheme), _) => Some(scheme),
        (None, Some(name)) => Some(name.parse::<BankScheme>()?),
        (None, None) => None,
    };
    let dispatch = match (cli.cpu, &config.cpu) {
        (Some(dispatch), _) => dispatch,
        (None, Some(name)) => name.parse::<DispatchStrategy>()?,
        (None, None) => DispatchStrategy::default(),
    };
    let machine_config = MachineConfig {
        dispatch,
        delays: config.delays(),
        policy: cli.policy.or(config.policy).unwrap_or_default(),
    };

    let rom = rom_path::load_rom(&cli.rom)?;
    let mut machine = Atari2600::from_rom(rom.data(), scheme, &machine_config)?;
    info!(
        "{}: {} (crc32 {:08X}), {} dispatch",
        rom.name(),
        machine.cartridge().identity(),
        rom.crc32(),
        dispatch
    );

    match cli.graphics {
        Graphics::Png => machine.attach_video(Box::new(sinks::PngFrames::create(&cli.frames_dir)?)),
        Graphics::None => {}
    }
    match cli.audio {
        Audio::File => machine.attach_audio(Box::new(sinks::WavFile::create(
            &cli.wav,
            AUDIO_SAMPLE_RATE,
        )?)),
        Audio::Null | Audio::None => {}
    }

    let mut opts = RunOptions {
        stop_clock: cli.stop_clock,
        max_frames: cli.frames,
        debug: cli.debug,
        pace: !(cli.no_delay || config.no_delay),
        state_path: cli.state,
    };

    emulator::restore(&mut machine, &mut opts)?;
    let summary = emulator::run(&mut machine, &opts)?;
    info!(
        "stopped after {} frames, {} cycles",
        summary.frames, summary.cycles
    );
    Ok(())
}
