use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use whtml_lexer::{Scanner, TokenKind};

#[derive(Parser)]
#[command(name = "whtml")]
#[command(about = "Inspect whtml templates: tokens, node trees, syntax checks")]
#[command(version)]
struct Cli {
    /// Log scanner and parser decisions at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the token stream of a template
    Tokens {
        /// Input file, or `-` for stdin
        path: Option<String>,
    },

    /// Parse a template and print its node tree
    Parse {
        /// Input file, or `-` for stdin
        path: Option<String>,
    },

    /// Check a template for syntax errors without printing output
    Check {
        /// Input file, or `-` for stdin
        path: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Tokens { path } => cmd_tokens(path.as_deref()),
        Command::Parse { path } => cmd_parse(path.as_deref()),
        Command::Check { path } => cmd_check(path.as_deref()),
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(path: Option<&str>) -> String {
    match path {
        None | Some("-") => {
            let mut source = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut source) {
                eprintln!("error: reading stdin: {e}");
                std::process::exit(1);
            }
            source
        }
        Some(path) => {
            let p = Path::new(path);
            if !p.exists() {
                eprintln!("error: file not found: {path}");
                std::process::exit(1);
            }
            match std::fs::read_to_string(p) {
                Ok(source) => source,
                Err(e) => {
                    eprintln!("error: reading {path}: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}

fn display_name(path: Option<&str>) -> &str {
    match path {
        None | Some("-") => "<stdin>",
        Some(path) => path,
    }
}

fn cmd_tokens(path: Option<&str>) {
    let source = read_source(path);
    tracing::debug!(bytes = source.len(), "scanning");

    let mut scanner = Scanner::new(&source);
    loop {
        let token = scanner.scan();
        if token.is_error() {
            eprintln!("error: {}", scanner.errors());
            std::process::exit(1);
        }

        let pos = token.position;
        println!("{}:{}\t{:?}", pos.line + 1, pos.column, token.kind);
        if token.kind == TokenKind::EndOfInput {
            return;
        }
    }
}

fn cmd_parse(path: Option<&str>) {
    let source = read_source(path);

    match whtml_parser::parse(&source) {
        Ok(doc) => print!("{}", doc.render()),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_check(path: Option<&str>) {
    let source = read_source(path);

    if let Err(e) = whtml_parser::parse(&source) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    eprintln!("OK: {}", display_name(path));
}
