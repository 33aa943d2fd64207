//! repocap CLI
//!
//! Entry point for the `repocap` command-line tool. Every subcommand
//! prints JSON on stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use repocap::client::{HttpTransport, RepositoryClient};
use repocap::config::EffectiveConfig;
use repocap::extract::{BuildRepository, CleanupStatus};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "repocap")]
#[command(about = "Capture, promote and clean up build repositories", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract dependencies and outputs of a finished build
    Extract {
        /// Build id; names the build's stores and tracking record
        #[arg(long)]
        build_id: String,

        /// Collection the build belongs to
        #[arg(long)]
        collection_id: String,

        #[command(flatten)]
        common: CommonArgs,

        /// Promote the build's hosted store into the collection's store
        #[arg(long)]
        promote_build_output: bool,

        /// Treat a failed cleanup as an error
        #[arg(long)]
        strict: bool,
    },

    /// Print the URLs a build should use
    Connection {
        #[arg(long)]
        build_id: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print the effective configuration
    Config {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Path to a TOML config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Repository manager API base URL
    #[arg(long)]
    base_url: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Extract {
            build_id,
            collection_id,
            common,
            promote_build_output,
            strict,
        } => run_extract(&build_id, &collection_id, &common, promote_build_output, strict),
        Commands::Connection { build_id, common } => run_connection(&build_id, &common),
        Commands::Config { common } => run_config(&common),
    };
    process::exit(code);
}

const DEFAULT_LOG_FILTER: &str = "repocap=info";

/// `RUST_LOG` when set and valid, `repocap=info` otherwise
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn cli_overrides(common: &CommonArgs, promote_build_output: bool) -> Option<Value> {
    let mut overrides = json!({});
    if let Some(url) = &common.base_url {
        overrides["repository_manager"] = json!({ "base_url": url });
    }
    if promote_build_output {
        overrides["promotion"] = json!({ "promote_build_output": true });
    }
    match overrides.as_object() {
        Some(map) if map.is_empty() => None,
        _ => Some(overrides),
    }
}

fn load_config(common: &CommonArgs, promote_build_output: bool) -> Result<EffectiveConfig, i32> {
    EffectiveConfig::build(common.config.as_deref(), cli_overrides(common, promote_build_output)).map_err(|e| {
        eprintln!("Error loading config: {}", e);
        1
    })
}

fn build_repository(
    config: &EffectiveConfig,
    build_id: &str,
    collection_id: &str,
) -> Result<BuildRepository, i32> {
    let settings = config.settings().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        1
    })?;
    let http = settings.http_config().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        1
    })?;
    let base_url = http.base_url.clone();
    let transport = HttpTransport::new(http).map_err(|e| {
        eprintln!("Error creating HTTP client: {}", e);
        1
    })?;
    let client = RepositoryClient::new(Arc::new(transport), base_url);
    Ok(BuildRepository::new(client, build_id, collection_id, settings.store_settings()))
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            1
        }
    }
}

fn print_error(message: String, exit_code: i32) -> i32 {
    print_json(&json!({ "error": message, "exit_code": exit_code }));
    exit_code
}

fn run_extract(
    build_id: &str,
    collection_id: &str,
    common: &CommonArgs,
    promote_build_output: bool,
    strict: bool,
) -> i32 {
    let repository = match load_config(common, promote_build_output)
        .and_then(|config| build_repository(&config, build_id, collection_id))
    {
        Ok(r) => r,
        Err(code) => return code,
    };

    let report = match repository.extract_build_artifacts() {
        Ok(report) => report,
        Err(e) => return print_error(e.to_string(), e.exit_code()),
    };

    if strict {
        return match report.into_result() {
            Ok(artifacts) => print_json(&artifacts),
            Err(e) => print_error(e.to_string(), e.exit_code()),
        };
    }

    let failed = matches!(report.cleanup, CleanupStatus::Failed { .. });
    let code = print_json(&report);
    if failed {
        40
    } else {
        code
    }
}

fn run_connection(build_id: &str, common: &CommonArgs) -> i32 {
    match load_config(common, false).and_then(|config| build_repository(&config, build_id, "")) {
        Ok(repository) => print_json(repository.connection_info()),
        Err(code) => code,
    }
}

fn run_config(common: &CommonArgs) -> i32 {
    match load_config(common, false) {
        Ok(config) => print_json(&config),
        Err(code) => code,
    }
}
