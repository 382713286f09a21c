//! OpenAPI formatter CLI.
//!
//! Usage:
//!   openapi-format <file> [--suffix indexed|cumulative] [--dry-run]

use std::path::PathBuf;

use clap::Parser;
use openapi_format::{format_file, FormatOptions, SuffixScheme};

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Normalize an inspector-generated OpenAPI document for client generators
#[derive(Parser, Debug)]
#[command(name = "openapi-format")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// OpenAPI document (JSON), rewritten in place
    #[arg(required = true)]
    path: PathBuf,

    /// Naming of schemas hoisted from bodies with several media types
    #[arg(short, long, value_enum, default_value_t = SuffixScheme::Indexed)]
    suffix: SuffixScheme,

    /// Report changes without writing the file
    #[arg(short = 'n', long)]
    dry_run: bool,
}

fn main() {
    let args = Args::parse();
    let options = FormatOptions {
        suffix: args.suffix,
        dry_run: args.dry_run,
    };

    let report = match format_file(&args.path, &options) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{RED}error:{RESET} {err}");
            std::process::exit(1);
        }
    };

    for (operation, id) in &report.renamed_operations {
        println!("{DIM}operationId{RESET} {operation} -> {GREEN}{id}{RESET}");
    }
    for schema in &report.hoisted {
        let note = if schema.replaced { " (replaced existing)" } else { "" };
        println!(
            "{DIM}schema{RESET} {GREEN}{}{RESET} <- {}{YELLOW}{note}{RESET}",
            schema.name, schema.location
        );
    }
    for operation in &report.unnamed_operations {
        println!("{YELLOW}warning:{RESET} {operation} has no summary or operationId, skipped");
    }

    if report.is_unchanged() {
        println!("{} already formatted", args.path.display());
    } else if args.dry_run {
        println!("{DIM}dry run, {} not written{RESET}", args.path.display());
    } else {
        println!("Formatted {}", args.path.display());
    }
}
