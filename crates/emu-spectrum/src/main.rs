//! ZX Spectrum 48K emulator binary.
//!
//! Headless: runs a number of frames from reset or a snapshot, then
//! optionally saves an SNA file or prints the CPU state as JSON.

use std::path::PathBuf;
use std::process;

use emu_spectrum::{Emulator, EmulatorResult, SnapshotFormat, SpectrumConfig, sna};

/// ROM used when `--rom` is not given.
const DEFAULT_ROM: &str = "roms/48.rom";

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    rom_path: PathBuf,
    snapshot: Option<(PathBuf, SnapshotFormat)>,
    frames: u32,
    fps: Option<f32>,
    fast_load: bool,
    accurate_ula: bool,
    save_sna: Option<PathBuf>,
    dump_state: bool,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        rom_path: PathBuf::from(DEFAULT_ROM),
        snapshot: None,
        frames: 200,
        fps: None,
        fast_load: false,
        accurate_ula: true,
        save_sna: None,
        dump_state: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rom" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.rom_path = PathBuf::from(s);
                }
            }
            "--sna" => {
                i += 1;
                cli.snapshot = args.get(i).map(|s| (PathBuf::from(s), SnapshotFormat::Sna));
            }
            "--z80" => {
                i += 1;
                cli.snapshot = args.get(i).map(|s| (PathBuf::from(s), SnapshotFormat::Z80));
            }
            "--frames" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.frames = s.parse().unwrap_or(200);
                }
            }
            "--fps" => {
                i += 1;
                cli.fps = args.get(i).and_then(|s| s.parse().ok());
            }
            "--fast-load" => cli.fast_load = true,
            "--no-ula-shadow" => cli.accurate_ula = false,
            "--save-sna" => {
                i += 1;
                cli.save_sna = args.get(i).map(PathBuf::from);
            }
            "--dump-state" => cli.dump_state = true,
            "--help" | "-h" => {
                eprintln!("Usage: emu-spectrum [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --rom <file>         16K system ROM [default: {DEFAULT_ROM}]");
                eprintln!("  --sna <file>         Load a SNA snapshot");
                eprintln!("  --z80 <file>         Load a .Z80 snapshot (v1/v2/v3, 48K only)");
                eprintln!("  --frames <n>         Number of frames to run [default: 200]");
                eprintln!("  --fps <f>            Frame rate reported to audio receivers");
                eprintln!("  --fast-load          Accelerated tape loading (no tape noise)");
                eprintln!("  --no-ula-shadow      Show final memory instead of sampled screen");
                eprintln!("  --save-sna <file>    Save an SNA snapshot after the run");
                eprintln!("  --dump-state         Print the CPU state as JSON after the run");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn run(cli: &CliArgs) -> EmulatorResult<()> {
    let rom = std::fs::read(&cli.rom_path)?;
    let mut config = SpectrumConfig::new(rom);
    config.accelerated_load = cli.fast_load;
    config.accurate_ula = cli.accurate_ula;
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }

    let mut emulator = Emulator::spawn(config)?;
    let rom_loaded = emulator.reset()?;

    if let Some((path, format)) = &cli.snapshot {
        let data = std::fs::read(path)?;
        emulator.load_snapshot(&data, *format)?;
        log::info!("loaded {}", path.display());
    }

    for frame in 0..cli.frames {
        emulator.render_frame()?;
        if rom_loaded.try_recv() == Ok(true) {
            log::info!("system ROM ready after {frame} frames");
        }
    }

    let snapshot = emulator.make_snapshot()?;
    if let Some(path) = &cli.save_sna {
        std::fs::write(path, sna::encode(&snapshot)?)?;
        log::info!("saved {}", path.display());
    }
    if cli.dump_state {
        match serde_json::to_string_pretty(&snapshot.cpu) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("state dump failed: {e}"),
        }
    }

    emulator.pause()?;
    emulator.terminate()
}

fn main() {
    env_logger::init();
    let cli = parse_args();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
