//! Gauntlet CLI - Multi-stage Validation Pipelines
//!
//! Validates JSON records against a pipeline assembled from a TOML config.

use anyhow::{bail, Context, Result};
use gauntlet::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code when every record passed.
const EXIT_VALID: u8 = 0;
/// Exit code when at least one record failed validation.
const EXIT_INVALID: u8 = 1;
/// Exit code for usage errors and records that could not be validated.
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("gauntlet");

    let verbose = args.iter().any(|arg| arg == "--verbose" || arg == "-v");
    init_logging(verbose);

    if args.len() < 2 {
        print_usage(program);
        return ExitCode::from(EXIT_FATAL);
    }

    let result = match args[1].as_str() {
        "validate" => validate(&args[2..]),
        "stages" => list_stages(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage(program);
            Ok(EXIT_VALID)
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(program);
            Ok(EXIT_FATAL)
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

fn print_usage(program: &str) {
    println!("Gauntlet v{}", gauntlet::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  validate --config <pipeline.toml> <records.json>  Validate records");
    println!("  stages --config <pipeline.toml>                   List pipeline stages");
    println!("  help                                              Show this help message");
    println!();
    println!("Options:");
    println!("  --config <path>   Pipeline configuration (TOML)");
    println!("  --json            Print outcomes as JSON");
    println!("  --verbose, -v     Log stage execution (RUST_LOG overrides)");
    println!();
    println!("Exit codes: 0 all valid, 1 any invalid, 2 usage or fatal error");
}

/// Parsed options shared by the subcommands.
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    positional: Vec<String>,
    json: bool,
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let path = args.get(i + 1).context("--config requires a path")?;
                options.config = Some(PathBuf::from(path));
                i += 2;
            }
            "--json" => {
                options.json = true;
                i += 1;
            }
            "--verbose" | "-v" => i += 1,
            flag if flag.starts_with('-') => bail!("unknown option: {}", flag),
            value => {
                options.positional.push(value.to_string());
                i += 1;
            }
        }
    }

    Ok(options)
}

fn load_pipeline(options: &Options) -> Result<(PipelineConfig, ValidationPipeline<Record>)> {
    let path = options.config.as_ref().context("missing --config <pipeline.toml>")?;
    let config = PipelineConfig::from_path(path)
        .with_context(|| format!("loading {}", path.display()))?;
    let pipeline = config.build()?;
    Ok((config, pipeline))
}

/// JSON shape of one record's result.
#[derive(Serialize)]
struct RecordReport<'a> {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'a ValidationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fatal: Option<String>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    pipeline: &'a str,
    summary: BatchReport,
    records: Vec<RecordReport<'a>>,
}

fn validate(args: &[String]) -> Result<u8> {
    let options = parse_options(args)?;
    let records_path = match options.positional.as_slice() {
        [path] => path,
        [] => bail!("missing records file"),
        _ => bail!("expected exactly one records file"),
    };

    let (config, pipeline) = load_pipeline(&options)?;
    let records = Record::load_all(records_path)
        .with_context(|| format!("loading {}", records_path))?;
    log::info!(
        "validating {} record(s) with '{}' ({} stages)",
        records.len(),
        config.display_name(),
        pipeline.len()
    );

    let results = pipeline.validate_batch(&records);
    let report = BatchReport::from_results(&results);

    if options.json {
        let json = JsonReport {
            pipeline: config.display_name(),
            summary: report.clone(),
            records: results
                .iter()
                .enumerate()
                .map(|(index, result)| match result {
                    Ok(outcome) => RecordReport { index, outcome: Some(outcome), fatal: None },
                    Err(e) => RecordReport { index, outcome: None, fatal: Some(e.to_string()) },
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        for (index, result) in results.iter().enumerate() {
            match result {
                Ok(outcome) => {
                    println!("record #{}: {}", index, outcome.summary());
                    for line in outcome.detailed_errors() {
                        println!("    {}", line);
                    }
                }
                Err(e) => println!("record #{}: could not be validated: {}", index, e),
            }
        }
        println!();
        println!("{}", report.summary());
    }

    Ok(exit_code(&report))
}

/// Map a batch summary onto the process exit code.
fn exit_code(report: &BatchReport) -> u8 {
    if report.fatal > 0 {
        EXIT_FATAL
    } else if report.all_valid() {
        EXIT_VALID
    } else {
        EXIT_INVALID
    }
}

fn list_stages(args: &[String]) -> Result<u8> {
    let options = parse_options(args)?;
    if !options.positional.is_empty() {
        bail!("unexpected argument: {}", options.positional[0]);
    }
    let (config, pipeline) = load_pipeline(&options)?;

    println!("Pipeline '{}' ({} stages):", config.display_name(), pipeline.len());
    for (index, (name, halts)) in pipeline.stages().enumerate() {
        let policy = if halts { "halts on failure" } else { "continues" };
        println!("  {}. {} [{}]", index + 1, name, policy);
    }

    Ok(EXIT_VALID)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(valid: usize, invalid: usize, fatal: usize) -> BatchReport {
        BatchReport {
            total: valid + invalid + fatal,
            valid,
            invalid,
            fatal,
            ..BatchReport::default()
        }
    }

    #[test]
    fn test_exit_code_all_valid() {
        assert_eq!(exit_code(&report(3, 0, 0)), EXIT_VALID);
        assert_eq!(exit_code(&report(0, 0, 0)), EXIT_VALID);
    }

    #[test]
    fn test_exit_code_some_invalid() {
        assert_eq!(exit_code(&report(2, 1, 0)), EXIT_INVALID);
    }

    #[test]
    fn test_exit_code_fatal_wins() {
        assert_eq!(exit_code(&report(1, 1, 1)), EXIT_FATAL);
    }

    #[test]
    fn test_parse_options() {
        let args: Vec<String> = ["--config", "p.toml", "records.json", "--json"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let options = parse_options(&args).unwrap();
        assert_eq!(options.config, Some(PathBuf::from("p.toml")));
        assert_eq!(options.positional, vec!["records.json".to_string()]);
        assert!(options.json);

        assert!(parse_options(&["--bogus".to_string()]).is_err());
        assert!(parse_options(&["--config".to_string()]).is_err());
    }
}
