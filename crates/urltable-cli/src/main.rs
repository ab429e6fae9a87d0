//! urltable command-line tool.
//!
//! Checks pattern files, resolves requests against them and keeps a table
//! hot-reloaded from disk.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use urltable::SharedTable;
use urltable_cli::{build_table, resolve_all, PatternWatcher, Resolution};
use urltable_telemetry::{LogFormat, Telemetry, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(name = "urltable", about = "Check URL pattern tables and resolve requests", version)]
struct Cli {
    /// Log level.
    #[arg(long, global = true, env = "URLTABLE_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log format (json or pretty).
    #[arg(long, global = true, env = "URLTABLE_LOG_FORMAT", default_value = "json")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the table from a pattern file and report conflicts.
    Check {
        /// Pattern file (YAML, or JSON with a .json extension).
        #[arg(short, long)]
        patterns: String,
    },

    /// Resolve requests such as `GET/api/v1/user` against a pattern file.
    Resolve {
        /// Pattern file (YAML, or JSON with a .json extension).
        #[arg(short, long)]
        patterns: String,

        /// Requests in `METHOD/path` form.
        #[arg(required = true, num_args = 1..)]
        requests: Vec<String>,

        /// Output format (text or json).
        #[arg(long, default_value = "text")]
        output: String,
    },

    /// Print the canonical form of each pattern.
    Format {
        #[arg(required = true, num_args = 1..)]
        patterns: Vec<String>,
    },

    /// Resolve requests read from stdin, reloading the pattern file on change.
    Watch {
        /// Pattern file (YAML, or JSON with a .json extension).
        #[arg(short, long)]
        patterns: String,
    },
}

/// Run the check command.
fn run_check(patterns: &str) -> ExitCode {
    match build_table(Path::new(patterns)) {
        Ok(table) => {
            for pattern in table.patterns() {
                println!("{}", pattern);
            }
            eprintln!("checked {}: {} pattern(s), no conflicts", patterns, table.size());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Run the resolve command.
fn run_resolve(patterns: &str, requests: &[String], output_format: &str) -> ExitCode {
    let table = match build_table(Path::new(patterns)) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let results = match resolve_all(&table, requests) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("error: invalid request: {}", e);
            return ExitCode::from(1);
        }
    };

    if output_format == "json" {
        match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
        }
    } else {
        for result in &results {
            println!("{}", result);
        }
    }

    ExitCode::SUCCESS
}

/// Run the format command.
fn run_format(patterns: &[String]) -> ExitCode {
    for pattern in patterns {
        match urltable::format(pattern) {
            Ok(canonical) => println!("{}", canonical),
            Err(e) => {
                eprintln!("error: '{}': {}", pattern, e);
                return ExitCode::from(1);
            }
        }
    }
    ExitCode::SUCCESS
}

/// Run the watch command.
async fn run_watch(patterns: &str) -> ExitCode {
    let path = Path::new(patterns);
    let table = match build_table(path) {
        Ok(table) => Arc::new(SharedTable::new(table)),
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    // Dropping the watcher stops it, so keep it alive for the whole loop.
    let _watcher = match PatternWatcher::new(path, Arc::clone(&table)).run() {
        Ok(watcher) => watcher,
        Err(e) => {
            eprintln!("error: failed to watch {}: {}", patterns, e);
            return ExitCode::from(1);
        }
    };

    eprintln!(
        "urltable: watching {} ({} pattern(s)), reading requests from stdin",
        patterns,
        table.load().size()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let request = line.trim();
                    if request.is_empty() {
                        continue;
                    }
                    match Resolution::resolve(&table.load(), request) {
                        Ok(result) => println!("{}", result),
                        Err(e) => eprintln!("error: invalid request '{}': {}", request, e),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    eprintln!("error: failed to read stdin: {}", e);
                    return ExitCode::from(1);
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    urltable_telemetry::log_shutdown!(path = %patterns, "watch stopped");
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(log_format) = LogFormat::parse(&cli.log_format) else {
        eprintln!("error: invalid log format: {}", cli.log_format);
        return ExitCode::from(1);
    };
    let config = TelemetryConfig::new()
        .with_log_level(&cli.log_level)
        .with_log_format(log_format);
    let telemetry = match Telemetry::init(config) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    urltable_telemetry::log_startup!(
        service = %telemetry.config().service_name,
        version = env!("CARGO_PKG_VERSION"),
        "starting"
    );

    match cli.command {
        Commands::Check { patterns } => run_check(&patterns),
        Commands::Resolve {
            patterns,
            requests,
            output,
        } => run_resolve(&patterns, &requests, &output),
        Commands::Format { patterns } => run_format(&patterns),
        Commands::Watch { patterns } => run_watch(&patterns).await,
    }
}
