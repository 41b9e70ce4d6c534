//! Tarn CLI: assemble, verify, disassemble and execute modules.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input/decode/assembly error
//! - 2: Verification failure
//! - 3: Runtime error

mod catalog;
mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tarn_vm::machine::{DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_OPERAND_STACK};
use tarn_vm::VmConfig;
use tracing_subscriber::{fmt, EnvFilter};

use commands::RunOptions;

#[derive(Parser, Debug)]
#[command(name = "tarn", version)]
#[command(about = "Assemble, verify and run Tarn bytecode modules")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a .tasm text file into a module image
    Assemble {
        /// Assembly source
        input: PathBuf,

        /// Output path (defaults to the input with a .tbc extension)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },

    /// Print a module as canonical assembly text
    Disassemble {
        /// Module image or .tasm source
        input: PathBuf,
    },

    /// Verify a module without running it
    Check {
        /// Module image or .tasm source
        input: PathBuf,
    },

    /// Verify and execute a module
    Run {
        /// Module image or .tasm source
        input: PathBuf,

        #[command(flatten)]
        limits: Limits,
    },

    /// List the built-in samples, or run one by name
    Demo {
        /// Sample name
        name: Option<String>,

        #[command(flatten)]
        limits: Limits,
    },
}

#[derive(clap::Args, Debug)]
struct Limits {
    /// Skip static verification
    #[arg(long = "no-verify")]
    no_verify: bool,

    /// Maximum operand stack depth
    #[arg(long = "max-stack", default_value_t = DEFAULT_MAX_OPERAND_STACK)]
    max_stack: usize,

    /// Maximum call depth
    #[arg(long = "max-call-depth", default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

impl Limits {
    fn options(&self) -> RunOptions {
        RunOptions {
            verify: !self.no_verify,
            config: VmConfig::default()
                .with_max_operand_stack(self.max_stack)
                .with_max_call_depth(self.max_call_depth),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Help and version go to stdout and are not failures.
            process::exit(if e.use_stderr() { commands::EXIT_INPUT } else { 0 });
        }
    };

    init_logging();

    let result = match &cli.command {
        Command::Assemble { input, output } => commands::assemble(input, output.as_deref()),
        Command::Disassemble { input } => commands::disassemble(input),
        Command::Check { input } => commands::check(input),
        Command::Run { input, limits } => commands::run(input, limits.options()),
        Command::Demo { name, limits } => commands::demo(name.as_deref(), limits.options()),
    };

    if let Err(code) = result {
        process::exit(code);
    }
}
