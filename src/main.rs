//! Pipescript front-end driver

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use pipescript::feedback::{ErrorReport, Report};
use pipescript::frontend::parser::DEFAULT_MAX_DEPTH;
use pipescript::frontend::source::StrSource;
use pipescript::{parse_source, FrontendOptions, LexDiagnostic, Lexer, LexerOptions, ParserOptions, RuleSet};

/// Pipescript front end
#[derive(Parser, Debug)]
#[command(name = "pipesc")]
#[command(author = "Z1529")]
#[command(version = "0.1.0")]
#[command(about = "Pipescript lexer and parser")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: GlobalOptions,
}

#[derive(Args, Debug)]
struct GlobalOptions {
    /// Token rule set (JSON); the builtin rules are used when omitted
    #[arg(long, global = true, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Maximum expression nesting depth
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Fail on input no rule matches instead of skipping it
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the token stream
    Tokens {
        /// Input source file
        input: PathBuf,
    },
    /// Print every statement as JSON
    Parse {
        /// Input source file
        input: PathBuf,
    },
    /// Print a JSON report of errors, warnings and statistics
    Check {
        /// Input source file
        input: PathBuf,
    },
}

impl GlobalOptions {
    fn load_rules(&self) -> Result<RuleSet> {
        match &self.rules {
            Some(path) => RuleSet::from_path(path)
                .with_context(|| format!("failed to load rules from {}", path.display())),
            None => Ok(RuleSet::builtin()?),
        }
    }

    fn frontend(&self) -> FrontendOptions {
        FrontendOptions {
            lexer: LexerOptions { strict: self.strict },
            parser: ParserOptions { max_depth: self.max_depth },
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Tokens { input } => print_tokens(input, &cli.options),
        Commands::Parse { input } => print_statements(input, &cli.options),
        Commands::Check { input } => check_file(input, &cli.options),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn read_source(input: &Path) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn warn_skipped(diagnostics: &[LexDiagnostic], file_name: &str) {
    for diagnostic in diagnostics {
        if let Some(report) = ErrorReport::from_diagnostic(diagnostic, file_name) {
            warn!("{}:{}: {}", file_name, diagnostic.span(), report.message);
        }
    }
}

fn print_tokens(input: &Path, options: &GlobalOptions) -> Result<()> {
    let source = read_source(input)?;
    let rules = options.load_rules()?;
    let lexed = Lexer::with_options(StrSource::new(&source), &rules, options.frontend().lexer).tokenize()?;
    warn_skipped(&lexed.diagnostics, &input.display().to_string());

    for token in &lexed.tokens {
        println!("{}", token);
    }
    Ok(())
}

fn print_statements(input: &Path, options: &GlobalOptions) -> Result<()> {
    let source = read_source(input)?;
    let rules = options.load_rules()?;
    let program = parse_source(&source, &rules, options.frontend())?;
    warn_skipped(&program.diagnostics, &input.display().to_string());
    info!("{} statements", program.statements.len());

    for statement in &program.statements {
        println!("{}", serde_json::to_string_pretty(statement)?);
    }
    Ok(())
}

/// Always prints a report; the exit code reflects success
fn check_file(input: &Path, options: &GlobalOptions) -> Result<()> {
    let file_name = input.display().to_string();

    let outcome = read_source(input).and_then(|source| {
        let rules = options.load_rules()?;
        Ok(parse_source(&source, &rules, options.frontend()))
    });

    let report = match outcome {
        Ok(Ok(program)) => Report::success(&file_name, &program),
        Ok(Err(e)) => Report::failure(&file_name, &e),
        Err(e) => {
            let err = match e.downcast_ref::<pipescript::Error>() {
                Some(err) => err.clone(),
                None => pipescript::Error::Io(format!("{:#}", e)),
            };
            Report::failure(&file_name, &err)
        }
    };

    println!("{}", report.to_json());
    if !report.success {
        process::exit(1);
    }
    Ok(())
}
