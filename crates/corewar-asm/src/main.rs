//! CLI entry point for the Core War assembler and battle runner.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use corewar_asm::{assemble_source, Assembler};
use corewar_vm::{read_program, Instruction, Player, RoundState, Ruleset, VirtualMachine, VmConfig};
use thiserror as _;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Assemble Core War programs and run them against each other"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a source file into a binary program.
    Build(BuildArgs),
    /// Print the instructions of a binary program.
    Disasm(DisasmArgs),
    /// Run a round between two programs.
    Battle(BattleArgs),
}

#[derive(Args, Debug, PartialEq, Eq)]
struct BuildArgs {
    /// Source file to assemble.
    input: PathBuf,
    /// Output path (default: input stem + .bin).
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print a listing to stderr.
    #[arg(short, long)]
    verbose: bool,
    #[command(flatten)]
    rules: RuleArgs,
}

#[derive(Args, Debug, PartialEq, Eq)]
struct DisasmArgs {
    /// Binary program to decode.
    input: PathBuf,
}

#[derive(Args, Debug, PartialEq, Eq)]
struct BattleArgs {
    /// Player 1 program (source, or .bin binary).
    p1: PathBuf,
    /// Player 2 program (source, or .bin binary).
    p2: PathBuf,
    /// Load address of player 1.
    #[arg(long, default_value_t = 0)]
    offset1: u32,
    /// Load address of player 2 (default: half the core).
    #[arg(long)]
    offset2: Option<u32>,
    /// Print every step report.
    #[arg(long)]
    trace: bool,
    #[command(flatten)]
    rules: RuleArgs,
}

#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
struct RuleArgs {
    /// Parameter preset.
    #[arg(long, value_enum, default_value_t = RulesetArg::Standard)]
    ruleset: RulesetArg,
    /// Override the number of core cells.
    #[arg(long)]
    core_size: Option<u32>,
    /// Override the cycle limit.
    #[arg(long)]
    max_cycles: Option<u32>,
    /// Override the per-player process cap.
    #[arg(long)]
    max_processes: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum RulesetArg {
    Standard,
    Small,
}

impl RuleArgs {
    fn config(self) -> VmConfig {
        let ruleset = match self.ruleset {
            RulesetArg::Standard => Ruleset::Standard,
            RulesetArg::Small => Ruleset::Small,
        };
        let preset = VmConfig::for_ruleset(ruleset);
        VmConfig {
            core_size: self.core_size.unwrap_or(preset.core_size),
            max_cycles: self.max_cycles.unwrap_or(preset.max_cycles),
            max_processes: self.max_processes.unwrap_or(preset.max_processes),
        }
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("out");
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{stem}.bin"))
}

fn is_binary(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bin"))
}

fn run_build(args: &BuildArgs) -> Result<()> {
    let mut assembler = Assembler::new(args.rules.config().core_size)
        .map_err(|e| anyhow::anyhow!("{}", e.format_for_stderr()))?;
    assembler
        .open_file(&args.input)
        .map_err(|e| anyhow::anyhow!("{}", e.format_for_stderr()))?;

    if !assembler.assemble() {
        eprintln!("{}", assembler.errors().format_for_stderr());
        bail!(
            "{} error(s) assembling {}",
            assembler.errors().len(),
            args.input.display()
        );
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    assembler
        .write_binary(&output)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", output.display()))?;

    if args.verbose {
        for entry in assembler.listing() {
            eprintln!(
                "{:04}: {:<24} ; line {}: {}",
                entry.index,
                entry.instruction.to_string(),
                entry.line,
                entry.source
            );
        }
    }

    println!(
        "Assembled {} ({} instructions) -> {}",
        args.input.display(),
        assembler.instructions().len(),
        output.display()
    );
    Ok(())
}

fn run_disasm(args: &DisasmArgs) -> Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let program = read_program(&mut BufReader::new(file))
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    for (index, instruction) in program.iter().enumerate() {
        println!("{index:04}: {instruction}");
    }
    Ok(())
}

fn load_warrior(path: &Path, core_size: u32) -> Result<Vec<Instruction>> {
    if is_binary(path) {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        return read_program(&mut BufReader::new(file))
            .with_context(|| format!("failed to read {}", path.display()));
    }

    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    match assemble_source(path, text, core_size) {
        Ok(program) => Ok(program),
        Err(errors) => {
            eprintln!("{}", errors.format_for_stderr());
            bail!("{} error(s) assembling {}", errors.len(), path.display())
        }
    }
}

fn run_battle(args: &BattleArgs) -> Result<RoundState> {
    let config = args.rules.config();
    let mut vm = VirtualMachine::new(config).context("invalid machine configuration")?;

    let p1 = load_warrior(&args.p1, config.core_size)?;
    let p2 = load_warrior(&args.p2, config.core_size)?;
    let offset2 = args.offset2.unwrap_or(config.core_size / 2);
    vm.load_program(&p1, args.offset1, Player::One)
        .with_context(|| format!("failed to load {}", args.p1.display()))?;
    vm.load_program(&p2, offset2, Player::Two)
        .with_context(|| format!("failed to load {}", args.p2.display()))?;

    let outcome = if args.trace {
        while vm.execute_cycle() == RoundState::Ongoing {
            print_reports(&vm);
        }
        print_reports(&vm);
        vm.round_state()
    } else {
        vm.run()
    };

    tracing::info!(cycles = vm.current_cycle(), %outcome, "battle finished");
    println!("{outcome} after {} cycles", vm.current_cycle());
    Ok(outcome)
}

fn print_reports(vm: &VirtualMachine) {
    for player in Player::ALL {
        let report = vm.report(player);
        if !report.is_empty() {
            println!(
                "{:>6} P{} ({}) {report}",
                vm.current_cycle(),
                player.index() + 1,
                report.process_count
            );
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Build(args) => run_build(&args),
        Command::Disasm(args) => run_disasm(&args),
        Command::Battle(args) => run_battle(&args).map(|_| ()),
    }
}
