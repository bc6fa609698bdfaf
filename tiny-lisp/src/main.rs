use std::fs;
use std::io::{self, Read};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::{self as logger};

use tiny_lisp::ParseError;
use tiny_lisp::diagnostics::DiagnosticPrinter;
use tiny_lisp::parser::{self, DEFAULT_MAX_DEPTH, ParseOptions, lexer::Lexer};

const LOG_ENV: &str = "TINY_LISP_LOG";
const LOG_STYLE_ENV: &str = "TINY_LISP_LOG_STYLE";

#[derive(Debug, Parser)]
#[command(name = "tiny-lisp")]
#[command(about = "Lexer and parser for a tiny defun-only Lisp", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse a program and print its AST
    Parse {
        #[command(flatten)]
        input: Input,

        /// How to print the AST
        #[arg(short, long, value_enum, default_value_t = Format::Tree)]
        format: Format,

        /// Deepest allowed form nesting
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },

    /// Print the token stream, one token per line
    Tokens {
        #[command(flatten)]
        input: Input,
    },

    /// Parse a program without printing the AST
    Check {
        #[command(flatten)]
        input: Input,

        /// Deepest allowed form nesting
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct Input {
    /// Source file, `-` reads stdin
    input: Option<String>,

    /// Program text given inline
    #[arg(short, long)]
    source: Option<String>,
}

/// Where the program text comes from.
#[derive(Debug, PartialEq, Eq)]
enum Origin<'a> {
    Inline(&'a str),
    Stdin,
    File(&'a str),
}

impl Input {
    fn origin(&self) -> Origin<'_> {
        match (self.source.as_deref(), self.input.as_deref()) {
            (Some(text), _) => Origin::Inline(text),
            (None, Some(path)) if path != "-" => Origin::File(path),
            (None, _) => Origin::Stdin,
        }
    }

    /// Returns the display name and the text of the program.
    fn load(&self) -> io::Result<(String, String)> {
        match self.origin() {
            Origin::Inline(text) => Ok(("<source>".to_string(), text.to_string())),
            Origin::File(path) => Ok((path.to_string(), fs::read_to_string(path)?)),
            Origin::Stdin => {
                let mut text = String::new();
                io::stdin().read_to_string(&mut text)?;
                Ok(("<stdin>".to_string(), text))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Indented outline with positions
    Tree,
    /// One-line s-expression
    Sexp,
    /// Rust debug dump of the node arena
    Debug,
}

impl Commands {
    fn input(&self) -> &Input {
        match self {
            Self::Parse { input, .. } | Self::Tokens { input } | Self::Check { input, .. } => input,
        }
    }
}

/// Result of one subcommand: text for stdout and stderr, and the exit status.
#[derive(Debug)]
struct Outcome {
    stdout: String,
    stderr: String,
    status: i32,
}

/// Runs a subcommand on loaded source and returns what goes to stdout.
fn execute(command: &Commands, source: &str) -> Result<String, ParseError> {
    match command {
        Commands::Parse { format, max_depth, .. } => {
            let ast = parser::parse_with(source, ParseOptions { max_depth: *max_depth })?;
            Ok(match format {
                Format::Tree => ast.to_string(),
                Format::Sexp => format!("{}\n", ast.to_sexp(ast.root())),
                Format::Debug => format!("{:#?}\n", ast),
            })
        }
        Commands::Tokens { .. } => Lexer::new(source)
            .map(|token| token.map(|t| format!("{:<8} {}\n", t.span.to_string(), t.token)))
            .collect(),
        Commands::Check { max_depth, .. } => {
            let ast = parser::parse_with(source, ParseOptions { max_depth: *max_depth })?;
            log::debug!("check passed with {} nodes", ast.len());
            Ok("ok\n".to_string())
        }
    }
}

fn run(command: &Commands, name: &str, source: &str) -> Outcome {
    match execute(command, source) {
        Ok(stdout) => Outcome {
            stdout,
            stderr: String::new(),
            status: 0,
        },
        Err(e) => {
            log::debug!("{}: {:?}", name, e);
            Outcome {
                stdout: String::new(),
                stderr: DiagnosticPrinter::new(name, source).render(&e),
                status: 1,
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    bootstrap_logging();
    let cli = Cli::parse();

    let (name, source) = cli.command.input().load()?;
    let outcome = run(&cli.command, &name, &source);
    print!("{}", outcome.stdout);
    eprint!("{}", outcome.stderr);
    if outcome.status != 0 {
        process::exit(outcome.status);
    }

    Ok(())
}

fn bootstrap_logging() {
    if std::env::var(LOG_ENV).is_ok() {
        logger::Builder::from_env(logger::Env::new().filter(LOG_ENV).write_style(LOG_STYLE_ENV))
            .format_timestamp_micros()
            .init();
        log::debug!("logging initialized");
    } else {
        logger::Builder::new()
            .filter_level(log::LevelFilter::Error)
            .format_timestamp_millis()
            .init()
    }
}
