use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use arcade_ict::board_config::{BoardFactory, BoardProfile};
use arcade_ict::region::{segments, RegionDescriptor, RegionKind};
use arcade_ict::strategy::{MemoryStrategy, Strategy};
use arcade_ict::systems::arcade_board::{ArcadeBoard, MEGA2560_PIN_COUNT};
use arcade_ict::{BusCpu, BusError, Mos6502Tester, PinMappedBus, PinValue};

#[derive(Parser, Debug)]
#[command(name = "ict-sim")]
#[command(about = "Run the ICT bus-emulation layer against a simulated arcade board", long_about = None)]
struct Args {
    /// Built-in board profile
    #[arg(long, default_value = "centipede")]
    board: String,

    /// Board profile JSON file (overrides --board)
    #[arg(long)]
    config: Option<PathBuf>,

    /// List built-in boards and exit
    #[arg(long, action = ArgAction::SetTrue)]
    list_boards: bool,

    /// Shift the simulated phi0 by this many picoseconds before every access
    #[arg(long, default_value_t = 0)]
    phase_shift_ps: u64,

    /// Drive every address with the asynchronous cycle, whatever the profile says
    #[arg(long, action = ArgAction::SetTrue)]
    ignore_strategies: bool,

    /// Hold the simulated phi0 low
    #[arg(long, action = ArgAction::SetTrue)]
    stop_clock: bool,

    /// Seed for the test pattern
    #[arg(long, default_value_t = 0x5A)]
    seed: u8,
}

type Tester = Mos6502Tester<PinMappedBus<ArcadeBoard>>;

#[derive(Debug, Default)]
struct RegionResult {
    checked: u32,
    mismatches: u32,
    first_error: Option<BusError>,
}

fn pattern(seed: u8, address: u32) -> u8 {
    seed ^ (address as u8).rotate_left(3) ^ (address >> 8) as u8
}

fn load_profile(args: &Args) -> Result<BoardProfile> {
    let factory = BoardFactory::new();
    match &args.config {
        Some(path) => factory
            .load_json(path)
            .with_context(|| format!("loading board profile {}", path.display())),
        None => factory
            .create(&args.board)
            .with_context(|| format!("available boards: {}", factory.names().join(", "))),
    }
}

fn check_region(tester: &mut Tester, region: &RegionDescriptor, seed: u8, phase_shift_ps: u64) -> RegionResult {
    let mut result = RegionResult::default();
    let addresses = u32::from(region.start)..region.end();

    for address in addresses.clone() {
        tester.platform_mut().clock_mut().shift_phase(phase_shift_ps);
        if let Err(err) = tester.memory_write(address, pattern(seed, address)) {
            result.first_error = Some(err);
            return result;
        }
    }

    for address in addresses {
        tester.platform_mut().clock_mut().shift_phase(phase_shift_ps);
        match tester.memory_read(address) {
            Ok(data) => {
                result.checked += 1;
                if data != pattern(seed, address) {
                    result.mismatches += 1;
                }
            }
            Err(err) => {
                result.first_error = Some(err);
                return result;
            }
        }
    }
    result
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_boards {
        let factory = BoardFactory::new();
        for name in factory.names() {
            let profile = factory.create(&name)?;
            println!("{:<14} {}", name, profile.description);
        }
        return Ok(());
    }

    let profile = load_profile(&args)?;
    profile
        .validate(MEGA2560_PIN_COUNT)
        .with_context(|| format!("board profile '{}' is invalid", profile.name))?;

    let mut board = ArcadeBoard::for_profile(&profile);
    if args.stop_clock {
        board.clock_mut().stop(PinValue::Low);
    }

    let mut tester_profile = profile.clone();
    if args.ignore_strategies {
        tester_profile.strategies = vec![MemoryStrategy::END];
    }
    let mut tester = Mos6502Tester::from_profile(board, &tester_profile)
        .context("wiring tester to simulated board")?;

    println!("Arcade ICT bus emulation - {}", profile.description);
    println!("==================================================");
    println!(
        "Synchronized cycle: {}",
        if tester.supports_synchronized_cycle() {
            "available"
        } else {
            "not available"
        }
    );
    println!();

    let mut failed = 0;
    for region in profile.regions_of(RegionKind::Ram) {
        for run in segments(tester.strategies(), region) {
            if run.read != Strategy::Default || run.write != Strategy::Default {
                println!(
                    "  {:04X}-{:04X} read {} / write {}",
                    run.start,
                    run.start + run.length - 1,
                    run.read,
                    run.write
                );
            }
        }

        let result = check_region(&mut tester, region, args.seed, args.phase_shift_ps);
        let status = match (&result.first_error, result.mismatches) {
            (Some(err), _) => format!("ERROR  {}", err),
            (None, 0) => "PASS".to_string(),
            (None, n) => format!("FAIL   {} of {} bytes wrong", n, result.checked),
        };
        if status != "PASS" {
            failed += 1;
        }
        println!(
            "{:<12} {:04X}+{:04X}  {}",
            region.label, region.start, region.length, status
        );
    }

    let stats = tester.platform().stats();
    println!();
    println!(
        "phi2 pulses: {}  mistimed: {}  with interrupts enabled: {}  elapsed: {:.3} ms",
        stats.phi2_pulses,
        stats.mistimed_accesses,
        stats.pulses_with_interrupts_enabled,
        tester.platform().now_ps() as f64 / 1e9
    );

    if failed > 0 {
        anyhow::bail!("{} region(s) failed", failed);
    }
    Ok(())
}
