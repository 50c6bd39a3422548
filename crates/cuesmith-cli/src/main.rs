use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context as _;
use clap::Parser;
use cuesmith_compiler::{compile, CompileError};
use tracing::debug;

/// Translates a table of effects into an Arduino sketch that performs the
/// represented actions.
#[derive(Parser, Debug)]
#[command(name = "cuesmith", version)]
struct Cli {
    /// Input effect table (csv).
    input: PathBuf,

    /// Output sketch (ino).
    output: PathBuf,

    /// Ask before overwriting an existing sketch.
    #[arg(short = 'n', long = "no-clobber")]
    no_clobber: bool,

    /// Print the derived show model as JSON instead of writing a sketch.
    #[arg(long)]
    dump_model: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let input = resolve_input(&cli.input)?;
    let output = resolve_output(&cli.output)?;

    if cli.no_clobber && output.exists() && !confirm_overwrite(&output)? {
        println!("Aborting...");
        return Ok(ExitCode::SUCCESS);
    }

    let source = fs::read_to_string(&input)
        .with_context(|| format!("read table '{}'", input.display()))?;
    let source_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    match compile(&source, &source_name) {
        Ok(result) => {
            for diagnostic in result.diagnostics.iter() {
                eprintln!("{diagnostic}");
            }
            if cli.dump_model {
                println!("{}", result.model_json().context("serialize show model")?);
                return Ok(ExitCode::SUCCESS);
            }
            fs::write(&output, &result.sketch)
                .with_context(|| format!("write sketch '{}'", output.display()))?;
            debug!(sketch = %output.display(), bytes = result.sketch.len(), "sketch written");
            Ok(ExitCode::SUCCESS)
        }
        Err(CompileError::Invalid(diags)) => {
            for diagnostic in diags.iter() {
                eprintln!("{diagnostic}");
            }
            eprintln!(
                "{} error(s); no sketch was written",
                diags.errors.len()
            );
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}

fn resolve_input(path: &Path) -> anyhow::Result<PathBuf> {
    let path = match path.extension() {
        None => {
            eprintln!("Warning: No file extension given, assuming CSV...");
            path.with_extension("csv")
        }
        Some(_) => path.to_path_buf(),
    };
    if path.extension().and_then(|e| e.to_str()) != Some("csv") {
        anyhow::bail!("file type '{}' not supported", path.display());
    }
    if !path.exists() {
        anyhow::bail!("file '{}' not found", path.display());
    }
    Ok(path)
}

fn resolve_output(path: &Path) -> anyhow::Result<PathBuf> {
    let path = match path.extension() {
        None => {
            eprintln!("Warning: No extension given for sketch name, assuming INO...");
            path.with_extension("ino")
        }
        Some(_) => path.to_path_buf(),
    };
    if path.extension().and_then(|e| e.to_str()) != Some("ino") {
        anyhow::bail!("sketch name must end in an 'ino' suffix");
    }
    Ok(path)
}

/// Prompt until the answer is a clear y or n.
fn confirm_overwrite(path: &Path) -> anyhow::Result<bool> {
    let stdin = io::stdin();
    loop {
        print!(
            "Sketch {} already exists. Overwrite? (y/n): ",
            path.display()
        );
        io::stdout().flush()?;
        let mut choice = String::new();
        stdin.lock().read_line(&mut choice).context("read answer")?;
        match choice.trim().to_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => println!("Sorry?"),
        }
    }
}
