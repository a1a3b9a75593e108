mod logging;

use std::{process::ExitCode, time::Instant};

use clap::Parser;
use lazy_static::lazy_static;
use mips_emulator::{
    Emulator,
    config::arch_config::{REGFILE_CNT, WordType},
    isa::mips::{
        MipsReg,
        debugger::{DebugEvent, Debugger},
    },
};

use crate::logging::LogLevel;

lazy_static! {
    static ref cli_args: Args = Args::parse();
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
enum TargetFormat {
    Auto,
    Elf,
    Bin,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path of the target executable file (elf/bin).
    path: std::path::PathBuf,

    /// Specify target executable file format.
    #[arg(value_enum, short, long, default_value_t = TargetFormat::Auto)]
    format: TargetFormat,

    /// Cycle budget for the whole run.
    #[arg(short, long, default_value_t = 1_000_000)]
    cycles: i64,

    /// Cycles per execute call.
    #[arg(short, long, default_value_t = 10_000)]
    slice: i64,

    /// Stop when this address is about to retire (hex). May be repeated.
    #[arg(short = 'b', long = "break", value_parser = parse_addr)]
    breakpoints: Vec<WordType>,

    /// Also dump coprocessor-0 registers.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Switch log level.
    #[arg(value_enum, long = "loglevel", default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

fn parse_addr(s: &str) -> Result<WordType, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    WordType::from_str_radix(digits, 16).map_err(|e| format!("bad address `{}`: {}", s, e))
}

fn dump_registers(emulator: &Emulator, verbose: bool) {
    let shown = if verbose {
        MipsReg::ALL.len()
    } else {
        4 + REGFILE_CNT
    };

    for (i, reg) in MipsReg::ALL[..shown].iter().enumerate() {
        print!("{:>7}: 0x{:08x}  ", reg.to_string(), emulator.cpu().get_reg(*reg));
        if i % 4 == 3 {
            println!();
        }
    }
}

fn main() -> ExitCode {
    let args = &*cli_args;
    let _logger_handle = match logging::init(args.log_level) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("logging disabled: {}", e);
            None
        }
    };

    let is_elf = matches!(
        (args.format, args.path.extension() == Some("elf".as_ref())),
        (TargetFormat::Elf, _) | (TargetFormat::Auto, true)
    );
    let loaded = if is_elf {
        Emulator::from_elf(&args.path)
    } else {
        Emulator::from_binary(&args.path)
    };
    let mut emulator = match loaded {
        Ok(emulator) => emulator,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let identity = emulator.cpu().identity();
    println!(
        "{} ({} v{}), path = {:?}, cycles = {}",
        identity.name, identity.family, identity.version, args.path, args.cycles
    );

    let now = Instant::now();
    if args.breakpoints.is_empty() {
        let slice = args.slice.max(1);
        let mut consumed = 0;
        while consumed < args.cycles {
            consumed += emulator.run(slice.min(args.cycles - consumed));
            log::debug!(
                "{} cycles consumed, pc = {:#010x}",
                consumed,
                emulator.cpu().get_reg(MipsReg::Pc)
            );
        }
        println!("Consumed {} cycles", consumed);
    } else {
        let mut debugger = Debugger::new(emulator.into_cpu());
        for &addr in &args.breakpoints {
            debugger.set_breakpoint(addr);
        }
        match debugger.continue_until(args.cycles.max(0) as u64) {
            DebugEvent::BreakpointHit { pc } => println!("Breakpoint hit at {:#010x}", pc),
            DebugEvent::StepCompleted { pc } => println!("Budget exhausted at {:#010x}", pc),
        }
        emulator = Emulator::from_cpu(debugger.into_target());
    }
    println!("Used time: {}s", now.elapsed().as_secs_f32());

    dump_registers(&emulator, args.verbose);
    ExitCode::SUCCESS
}
