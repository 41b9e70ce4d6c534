//! CLI command implementations.
//!
//! Every command returns `Err(code)` after reporting the problem on stderr.

use std::fs;
use std::path::{Path, PathBuf};

use tarn_common::Module;
use tarn_vm::{Vm, VmConfig};
use tracing::{debug, info};

use crate::catalog;

/// Text sources use this extension; anything else is read as an image.
pub const TEXT_EXTENSION: &str = "tasm";
/// Default extension for assembled images.
pub const IMAGE_EXTENSION: &str = "tbc";

/// Exit code for input, decode and assembly errors.
pub const EXIT_INPUT: i32 = 1;
/// Exit code for verification failures.
pub const EXIT_VERIFY: i32 = 2;
/// Exit code for runtime faults.
pub const EXIT_RUNTIME: i32 = 3;

/// Options for `run` and `demo`.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub verify: bool,
    pub config: VmConfig,
}

/// Assemble a text file into a module image.
pub fn assemble(input: &Path, output: Option<&Path>) -> Result<(), i32> {
    let text = read_text(input)?;
    let module = assemble_text(input, &text)?;

    let output: PathBuf = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension(IMAGE_EXTENSION));
    let bytes = module.to_bytes().map_err(|e| {
        eprintln!("error: {}: {e}", input.display());
        EXIT_INPUT
    })?;

    fs::write(&output, &bytes).map_err(|e| {
        eprintln!("error: cannot write '{}': {e}", output.display());
        EXIT_INPUT
    })?;

    eprintln!(
        "assembled {} instructions ({} bytes) -> {}",
        module.len(),
        bytes.len(),
        output.display()
    );
    Ok(())
}

/// Print a module as canonical assembly text.
pub fn disassemble(input: &Path) -> Result<(), i32> {
    let module = load_module(input)?;
    print!("{}", tarn_assembler::disassemble(&module));
    Ok(())
}

/// Verify a module without running it.
pub fn check(input: &Path) -> Result<(), i32> {
    let module = load_module(input)?;
    verify(&module)?;
    println!("OK: {} ({} instructions)", input.display(), module.len());
    Ok(())
}

/// Verify (unless disabled) and execute a module.
pub fn run(input: &Path, options: RunOptions) -> Result<(), i32> {
    let module = load_module(input)?;
    execute(module, options)
}

/// List the built-in samples, or run one.
pub fn demo(name: Option<&str>, options: RunOptions) -> Result<(), i32> {
    let Some(name) = name else {
        for sample in catalog::SAMPLES {
            println!("{:<10} {}", sample.name, sample.intent);
        }
        return Ok(());
    };

    let sample = catalog::find(name).ok_or_else(|| {
        eprintln!("error: unknown sample '{name}' (try `tarn demo` for a list)");
        EXIT_INPUT
    })?;
    info!(sample = sample.name, "running sample");
    let module = assemble_text(Path::new(sample.name), sample.source)?;
    execute(module, options)
}

fn execute(module: Module, options: RunOptions) -> Result<(), i32> {
    if options.verify {
        verify(&module)?;
    } else {
        debug!("verification skipped");
    }

    let mut vm = Vm::with_config(module, options.config);
    vm.register_stdout_print();
    match vm.run_from_entry() {
        Ok(reason) => {
            info!(?reason, "run finished");
            for value in vm.operand_stack().as_slice() {
                println!("{value}");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("runtime error: {e}");
            Err(EXIT_RUNTIME)
        }
    }
}

fn verify(module: &Module) -> Result<(), i32> {
    tarn_verifier::verify(module).map_err(|errors| {
        for e in &errors {
            eprintln!("error: {e}");
        }
        EXIT_VERIFY
    })
}

fn is_text(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == TEXT_EXTENSION)
}

fn read_text(path: &Path) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{}': {e}", path.display());
        EXIT_INPUT
    })
}

fn assemble_text(path: &Path, text: &str) -> Result<Module, i32> {
    tarn_assembler::assemble(text).map_err(|e| {
        eprintln!("error: {}: {e}", path.display());
        EXIT_INPUT
    })
}

/// Load a module from a `.tasm` source or a module image.
fn load_module(path: &Path) -> Result<Module, i32> {
    if is_text(path) {
        let text = read_text(path)?;
        return assemble_text(path, &text);
    }

    let bytes = fs::read(path).map_err(|e| {
        eprintln!("error: cannot read '{}': {e}", path.display());
        EXIT_INPUT
    })?;
    debug!(bytes = bytes.len(), path = %path.display(), "decoding image");
    Module::from_bytes(&bytes).map_err(|e| {
        eprintln!("error: invalid module image '{}': {e}", path.display());
        EXIT_INPUT
    })
}
