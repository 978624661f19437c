//! Runs one invocation of either command-line tool: resolve the parsed
//! options, read the shader, optimize it and write the result.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::error::GlslOptError;
use crate::gateway::{check_sentinel, Engine, Optimizer};
use crate::options::{parse_args, usage, ParsedArgs};
use crate::target::{resolve_stage, resolve_target, ShaderStage, ShaderTarget};
use crate::writer::{header_symbol, select_output, write_payload, Output};

/// What a `-1` exit status turns into.
pub const FAILURE_EXIT_CODE: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Bytes in, bytes out. Reads stdin without an input file, writes stdout
    /// without `--output`, and can emit C headers.
    Buffer,
    /// The older text tool: an input file is required and the result goes
    /// next to it as `<name>.min<ext>` unless `--output` says otherwise.
    Text,
}

impl Mode {
    pub fn program_name(self) -> &'static str {
        match self {
            Mode::Buffer => "glslopt",
            Mode::Text => "glslopt-text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub target: ShaderTarget,
    pub stage: ShaderStage,
    pub header_symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Version,
    Help,
    Optimize(Invocation),
}

/// `<dir>/<stem>.min<ext>` next to `input`.
pub fn sibling_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}.min.{}", stem, ext.to_string_lossy()),
        None => format!("{}.min", stem),
    };
    input.with_file_name(name)
}

/// Validates parsed options and turns them into a [`Command`].
pub fn resolve(parsed: &ParsedArgs, mode: Mode) -> Result<Command, GlslOptError> {
    let options = &parsed.options;
    if options.version() {
        return Ok(Command::Version);
    }
    if options.help() {
        return Ok(Command::Help);
    }

    let input = match parsed.inputs.as_slice() {
        [] if mode == Mode::Text => return Err(GlslOptError::NoInputs),
        [] => None,
        [input] => Some(PathBuf::from(input)),
        _ => return Err(GlslOptError::MultipleInputs),
    };

    let target = resolve_target(options.target())?;
    let stage = resolve_stage(options.vs(), options.fs(), input.as_deref())?;

    let output = match (options.output(), input.as_deref()) {
        (Some(path), _) => Some(PathBuf::from(path)),
        (None, Some(input)) if mode == Mode::Text => Some(sibling_output(input)),
        (None, _) => None,
    };

    let header_symbol = match mode {
        Mode::Buffer => header_symbol(output.as_deref(), options.cheader()),
        Mode::Text => None,
    };

    Ok(Command::Optimize(Invocation {
        input,
        output,
        target,
        stage,
        header_symbol,
    }))
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>> {
    match input {
        Some(path) => {
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut source = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut source)
                .context("failed to read standard input")?;
            Ok(source)
        }
    }
}

/// Loads the engine, optimizes `source` and copies the result out of the
/// engine heap. An [`ERROR_SENTINEL`](crate::gateway::ERROR_SENTINEL) result
/// becomes [`GlslOptError::Engine`].
pub async fn optimize_source<E: Engine>(
    optimizer: &mut Optimizer<E>,
    source: &[u8],
    target: ShaderTarget,
    stage: ShaderStage,
) -> Result<Vec<u8>, GlslOptError> {
    optimizer.load().await?;
    let result = optimizer.optimize_buffer(source, target, stage.is_vertex());
    Ok(check_sentinel(result)?.to_vec())
}

/// Writes the payload and finishes the output.
pub fn emit(out: &mut dyn Output, payload: &[u8], symbol: Option<&str>) -> io::Result<()> {
    write_payload(out, payload, symbol)?;
    out.end()
}

fn describe_output(output: Option<&Path>) -> String {
    match output {
        Some(path) => path.display().to_string(),
        None => "standard output".to_string(),
    }
}

/// Runs a resolved invocation against real files and standard streams.
pub async fn execute<E: Engine>(
    invocation: &Invocation,
    mode: Mode,
    optimizer: &mut Optimizer<E>,
) -> Result<()> {
    let output = invocation.output.as_deref();
    info!(
        "optimizing {} shader for {}",
        invocation.stage, invocation.target
    );

    let payload = match mode {
        Mode::Buffer => {
            let source = read_input(invocation.input.as_deref())?;
            optimize_source(optimizer, &source, invocation.target, invocation.stage).await?
        }
        Mode::Text => {
            let input = invocation.input.as_deref().ok_or(GlslOptError::NoInputs)?;
            let source = fs::read_to_string(input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            optimizer.load().await?;
            optimizer
                .optimize_text(&source, invocation.target, invocation.stage.is_vertex())
                .into_bytes()
        }
    };
    debug!("optimized shader is {} bytes", payload.len());

    let mut out = select_output(output)
        .with_context(|| format!("failed to open {}", describe_output(output)))?;
    emit(out.as_mut(), &payload, invocation.header_symbol.as_deref())
        .with_context(|| format!("failed to write {}", describe_output(output)))?;
    Ok(())
}

async fn run<E: Engine>(parsed: &ParsedArgs, mode: Mode, engine: E) -> Result<ExitCode> {
    match resolve(parsed, mode)? {
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::from(FAILURE_EXIT_CODE))
        }
        Command::Help => {
            print!("{}", usage(mode.program_name()));
            Ok(ExitCode::from(FAILURE_EXIT_CODE))
        }
        Command::Optimize(invocation) => {
            let mut optimizer = Optimizer::new(engine);
            execute(&invocation, mode, &mut optimizer).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Entry point shared by both binaries.
///
/// Validation and engine errors print their message; anything else prints the
/// whole error chain.
pub async fn main<E: Engine>(mode: Mode, engine: E) -> ExitCode {
    let parsed = parse_args(std::env::args().skip(1));
    // Parse problems always reach stderr, whatever the log level.
    for diagnostic in &parsed.diagnostics {
        eprintln!("{}", diagnostic);
    }
    match run(&parsed, mode, engine).await {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<GlslOptError>() {
                Some(GlslOptError::IO(_)) | None => eprintln!("{:?}", err),
                Some(known) => eprintln!("{}", known),
            }
            ExitCode::from(FAILURE_EXIT_CODE)
        }
    }
}
