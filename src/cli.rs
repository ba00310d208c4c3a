use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Config;
use crate::executor::{
    run_function, ConsoleSink, DiskFileSystem, ExecutionOutcome, Runtime, Val,
};
use crate::parser::{self, semantic_validator::validate_program};

#[derive(Parser)]
#[command(name = "guardflow")]
#[command(about = "guardflow - run control-flow fixtures with ordered cleanup", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory that relative resource paths are resolved against
    #[arg(long, global = true)]
    pub files_root: Option<PathBuf>,

    /// Maximum nesting of fixture function calls
    #[arg(long, global = true)]
    pub max_call_depth: Option<usize>,

    /// Abort a run after this many evaluation steps
    #[arg(long, global = true)]
    pub max_steps: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a function of a fixture program
    Run {
        /// Fixture source file
        file: PathBuf,

        /// Function to call
        #[arg(short = 'f', long = "function", default_value = "main")]
        function: String,

        /// Arguments; integers are passed as ints, everything else as strings
        args: Vec<String>,
    },

    /// Parse and validate a fixture program without running it
    Check {
        /// Fixture source file
        file: PathBuf,
    },

    /// Print the parsed AST as JSON
    Dump {
        /// Fixture source file
        file: PathBuf,
    },
}

impl Cli {
    /// Resolve configuration with this invocation's flags on top
    pub fn load_config(&self) -> Result<Config> {
        Config::builder()
            .config_path(self.config.clone())
            .files_root(self.files_root.clone())
            .max_call_depth(self.max_call_depth)
            .max_steps(self.max_steps)
            .build()
    }
}

/// Execute a parsed command line
///
/// Returns the process exit code: 1 when the fixture raised an uncaught
/// exception or has validation errors. Host errors come back as `Err`.
pub fn run_cli_with_args(cli: Cli, config: &Config) -> Result<i32> {
    match cli.command {
        Commands::Run {
            file,
            function,
            args,
        } => {
            let source = read_source(&file)?;
            let program = parser::load_program(&source)
                .with_context(|| format!("Failed to load {}", file.display()))?;

            let mut files = match &config.files.root {
                Some(root) => DiskFileSystem::with_root(root.clone()),
                None => DiskFileSystem::new(),
            };
            let mut output = ConsoleSink;
            let mut rt = Runtime::new(&program, &mut output, &mut files)
                .with_limits(config.evaluator.clone());

            let args: Vec<Val> = args.iter().map(|a| parse_arg(a)).collect();
            debug!(file = %file.display(), function = %function, args = args.len(), "running fixture");
            match run_function(&mut rt, &function, args) {
                ExecutionOutcome::Completed(value) => {
                    println!("=> {}", value);
                    Ok(0)
                }
                ExecutionOutcome::Raised(error) => {
                    eprintln!("Uncaught exception: {}", error);
                    for suppressed in &error.suppressed {
                        eprintln!("  suppressed: {}", suppressed);
                    }
                    Ok(1)
                }
                ExecutionOutcome::BrokeLoop | ExecutionOutcome::ContinuedLoop => {
                    eprintln!("Loop control escaped function {}", function);
                    Ok(1)
                }
            }
        }

        Commands::Check { file } => {
            let source = read_source(&file)?;
            let program = parser::parse_program(&source)
                .with_context(|| format!("Failed to parse {}", file.display()))?;

            println!("{}", file.display());
            println!("  sha256: {:x}", Sha256::digest(source.as_bytes()));
            println!("  functions: {}", program.functions.len());
            for func in &program.functions {
                println!("    {}({})", func.name, func.params.join(", "));
            }

            let findings = validate_program(&program, &source);
            if findings.is_empty() {
                println!("✓ No issues found");
                return Ok(0);
            }
            for finding in &findings {
                println!("  {}", finding);
            }

            if findings.iter().any(|f| f.is_error()) {
                Ok(1)
            } else {
                Ok(0)
            }
        }

        Commands::Dump { file } => {
            let source = read_source(&file)?;
            let program = parser::parse_program(&source)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&program)?);
            Ok(0)
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture file: {}", path.display()))
}

/// Command-line argument to fixture value
fn parse_arg(raw: &str) -> Val {
    match raw.parse::<i32>() {
        Ok(n) => Val::Int(n),
        Err(_) => Val::Str(raw.to_string()),
    }
}
