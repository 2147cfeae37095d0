//! ember compiler - semantic analyzer for ember scripts
//!
//! Usage: emberc [OPTIONS] <input>

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ember_compiler::common::DiagnosticReporter;
use ember_compiler::driver::Pipeline;
use ember_compiler::frontend::FrontendConfig;

#[derive(ClapParser, Debug)]
#[command(name = "emberc")]
#[command(version)]
#[command(about = "Type checker and reachability analyzer for ember scripts", long_about = None)]
struct Args {
    /// Input script (.ember)
    #[arg(required = true)]
    input: PathBuf,

    /// Write the IR dump to a file instead of stderr
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Type the script's result is converted to
    #[arg(long, default_value = "def")]
    return_type: String,

    /// Analyze only; print nothing on success
    #[arg(long)]
    check: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dump IR (for debugging)
    #[arg(long)]
    dump_ir: bool,

    /// Dump AST (for debugging)
    #[arg(long)]
    dump_ast: bool,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

/// Log to stderr, filtered by `EMBER_LOG` when it is set
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env("EMBER_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let filename = args.input.display().to_string();

    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file(&filename, &source);

    let config = FrontendConfig {
        dump_tokens: args.dump_tokens,
        dump_ast: args.dump_ast,
        dump_ir: args.dump_ir,
        return_type: args.return_type.clone(),
    };

    let pipeline = Pipeline::new();
    let ir = pipeline
        .compile_source(&source, &filename, &config, &reporter, file_id)
        .with_context(|| format!("{} failed to compile", filename))?;

    if args.check {
        return Ok(());
    }

    if let Some(output) = &args.output {
        fs::write(output, ir.to_string())
            .with_context(|| format!("cannot write {}", output.display()))?;
        info!(output = %output.display(), "IR written");
    } else if config.dump_ir {
        eprintln!("=== IR ===");
        eprint!("{}", ir);
        eprintln!("=== End IR ===\n");
    } else {
        println!(
            "{}: ok ({} statements, {} locals, returns {})",
            filename,
            ir.body.statements.len(),
            ir.locals.len(),
            ir.return_type
        );
    }

    Ok(())
}
