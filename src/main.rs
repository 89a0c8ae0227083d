use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use qasm_gates::parser::{parse_file, ParseOptions};
use qasm_gates::transpiler::{PassManager, UnrollCustomGates};
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Qasm,
    Json,
}

#[derive(Parser)]
#[command(name = "qasm-gates")]
#[command(about = "Parse OpenQASM 2.0 programs with custom gate definitions", long_about = None)]
#[command(version)]
struct Cli {
    /// OpenQASM 2.0 source file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Expand every custom gate into built-in gates
    #[arg(short, long)]
    unroll: bool,

    /// Expand only this many levels of nested custom gates (implies --unroll)
    #[arg(long, value_name = "LEVELS")]
    depth: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "qasm")]
    format: Format,

    /// JSON file with parser options
    #[arg(short, long, value_name = "OPTIONS")]
    config: Option<PathBuf>,

    /// Log more (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_options(path: Option<&PathBuf>) -> Result<ParseOptions> {
    let Some(path) = path else {
        return Ok(ParseOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config '{}'", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = load_options(cli.config.as_ref())?;
    let circuit = parse_file(&cli.input, &options)
        .with_context(|| format!("failed to parse '{}'", cli.input.display()))?;

    let mut pm = PassManager::new();
    if cli.unroll || cli.depth.is_some() {
        pm.add_pass(Box::new(UnrollCustomGates {
            max_depth: cli.depth,
        }));
    }
    let circuit = pm.run(&circuit).context("transpilation failed")?;

    info!(
        qubits = circuit.num_qubits,
        cbits = circuit.num_cbits,
        definitions = circuit.definitions.len(),
        depth = circuit.depth(),
        counts = ?circuit.gate_counts(),
        "circuit ready"
    );

    match cli.format {
        Format::Qasm => print!("{}", circuit.to_qasm()),
        Format::Json => println!("{}", serde_json::to_string_pretty(&circuit)?),
    }
    Ok(())
}
