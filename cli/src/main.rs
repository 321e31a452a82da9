//! casewise CLI — check and filter JSON payloads from the shell.
//!
//! Subcommands:
//! - `valid <payload> [--lenient]` — print whether the payload carries content
//! - `check <payload> [--spec <file>] [--trace]` — validate a record, exit 1 on failure
//! - `filter <payload> [--spec <file>]` — print the filtered record as JSON

mod logging;

use std::path::Path;
use std::process;

use casewise::{
    filter, is_valid_with, validate_with_trace, FailAction, FilterSpec, KeepAction, SpecConfig,
    ValidationSpec, Value,
};
use serde::de::DeserializeOwned;
use tracing::debug;

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "valid" => parse_options(&args[2..]).and_then(|opts| cmd_valid(&opts)),
        "check" => parse_options(&args[2..]).and_then(|opts| cmd_check(&opts)),
        "filter" => parse_options(&args[2..]).and_then(|opts| cmd_filter(&opts)),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_valid(opts: &Options) -> Result<(), String> {
    let payload = load_payload(&opts.payload)?;
    println!("{}", is_valid_with(&payload, !opts.lenient));
    Ok(())
}

fn cmd_check(opts: &Options) -> Result<(), String> {
    let payload = load_payload(&opts.payload)?;
    let spec = match &opts.spec {
        Some(path) => load_spec::<FailAction>(path)?
            .build_validation()
            .map_err(|e| format!("spec invalid: {e}"))?,
        None => ValidationSpec::default(),
    };

    let trace = validate_with_trace(&payload, &spec);
    if opts.trace {
        println!("{trace}");
    }

    if trace.result {
        println!("valid");
        return Ok(());
    }
    if trace.payload_rejected {
        return Err("payload is not a record with content".into());
    }
    match trace.failed_field() {
        Some(field) => Err(format!("field \"{field}\" failed validation")),
        None => Err("payload failed validation".into()),
    }
}

fn cmd_filter(opts: &Options) -> Result<(), String> {
    if opts.lenient || opts.trace {
        return Err("filter accepts only --spec".into());
    }

    let payload = load_payload(&opts.payload)?;
    let spec = match &opts.spec {
        Some(path) => load_spec::<KeepAction>(path)?
            .build_filter()
            .map_err(|e| format!("spec invalid: {e}"))?,
        None => FilterSpec::default(),
    };

    let filtered = filter(&payload, &spec).to_json();
    let rendered =
        serde_json::to_string_pretty(&filtered).map_err(|e| format!("render failed: {e}"))?;
    println!("{rendered}");
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════════════════════════

fn read(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))
}

fn is_json(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn load_payload(path: &str) -> Result<Value, String> {
    let content = read(path)?;
    let json: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| format!("JSON parse error: {e}"))?;
    debug!(path, "payload loaded");
    Ok(Value::from(json))
}

fn load_spec<A: DeserializeOwned + Default>(path: &str) -> Result<SpecConfig<A>, String> {
    let content = read(path)?;

    let config = if is_json(path) {
        SpecConfig::from_json(&content)
    } else {
        // Default to YAML (handles .yaml and .yml)
        SpecConfig::from_yaml(&content)
    };
    config.map_err(|e| format!("failed to load spec \"{path}\": {e}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    payload: String,
    spec: Option<String>,
    lenient: bool,
    trace: bool,
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut opts = Options::default();
    let mut payload = None;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--spec" => {
                i += 1;
                let path = args.get(i).ok_or("--spec requires a file path")?;
                opts.spec = Some(path.clone());
            }
            "--lenient" => opts.lenient = true,
            "--trace" => opts.trace = true,
            flag if flag.starts_with("--") => {
                return Err(format!("unknown option \"{flag}\""));
            }
            path if payload.is_none() => payload = Some(path.to_owned()),
            extra => return Err(format!("unexpected argument \"{extra}\"")),
        }
        i += 1;
    }

    opts.payload = payload.ok_or("a payload file path is required")?;
    Ok(opts)
}

fn print_usage() {
    eprintln!(
        "Usage: casewise <command> [options]

Commands:
  valid <payload> [--lenient]                 Print whether the payload has content
  check <payload> [--spec <file>] [--trace]   Validate a JSON record
  filter <payload> [--spec <file>]            Print the filtered JSON record
  help                                        Show this help

Specs are YAML unless the file ends in .json. Set RUST_LOG for diagnostics."
    );
}
