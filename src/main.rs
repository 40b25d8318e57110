//! veris-attack CLI
//!
//! Entry point for the `veris-attack` command-line tool.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;
use veris_attack::config::resolve_config_path;
use veris_attack::{Domain, HttpSource, PipelineError, RunReport, Settings};

// No `version` here: `--version` selects the ATT&CK release.
#[derive(Parser)]
#[command(name = "veris-attack")]
#[command(about = "Append veris framework objects and mappings to ATT&CK")]
struct Cli {
    /// Filepath to the STIX bundle representing the veris framework
    #[arg(long)]
    veris_objects: Option<PathBuf>,

    /// Filepath to the STIX bundle mapping veris to ATT&CK
    #[arg(long)]
    mappings: Option<PathBuf>,

    /// The ATT&CK domain to append the veris work to
    #[arg(long, value_enum)]
    domain: Option<Domain>,

    /// Which ATT&CK version to use (e.g. 9.0)
    #[arg(long = "version")]
    attack_version: Option<String>,

    /// Include veris objects that don't map to techniques. By default only
    /// veris objects that have technique mappings are included
    #[arg(long)]
    allow_unmapped: bool,

    /// Filepath to write the output STIX bundle to
    #[arg(long)]
    output: Option<PathBuf>,

    /// Path to a TOML config file (default: ./veris-attack.toml if present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Base URL ATT&CK releases are downloaded from
    #[arg(long)]
    attack_base_url: Option<String>,

    /// Download timeout in seconds
    #[arg(long)]
    timeout_seconds: Option<u64>,

    /// Print object counts and the objects digest after writing
    #[arg(long)]
    summary: bool,
}

impl Cli {
    /// Flags that were given explicitly, shaped like the config file
    fn overrides(&self) -> Value {
        let mut map = Map::new();
        if let Some(ref path) = self.veris_objects {
            map.insert("veris_objects".into(), Value::String(path.to_string_lossy().into_owned()));
        }
        if let Some(ref path) = self.mappings {
            map.insert("mappings".into(), Value::String(path.to_string_lossy().into_owned()));
        }
        if let Some(domain) = self.domain {
            map.insert("domain".into(), Value::String(domain.as_str().to_string()));
        }
        if let Some(ref version) = self.attack_version {
            map.insert("version".into(), Value::String(version.clone()));
        }
        if self.allow_unmapped {
            map.insert("allow_unmapped".into(), Value::Bool(true));
        }
        if let Some(ref path) = self.output {
            map.insert("output".into(), Value::String(path.to_string_lossy().into_owned()));
        }

        let mut attack = Map::new();
        if let Some(ref url) = self.attack_base_url {
            attack.insert("base_url".into(), Value::String(url.clone()));
        }
        if let Some(seconds) = self.timeout_seconds {
            attack.insert("timeout_seconds".into(), Value::from(seconds));
        }
        if !attack.is_empty() {
            map.insert("attack".into(), Value::Object(attack));
        }

        Value::Object(map)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref(), Path::new("."));
    let settings = match Settings::build(config_path.as_deref(), Some(cli.overrides())) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    tracing::debug!(sources = settings.sources.len(), "configuration resolved");

    let source = match HttpSource::with_timeout(settings.timeout()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut progress = stdout.lock();
    let result = veris_attack::run(&settings, &source, &mut progress);
    let code = finish(result, cli.summary, &mut progress);
    if code != 0 {
        process::exit(code);
    }
}

/// Report the outcome of a run and return the exit code.
///
/// Writes to `out` are best effort: stdout may already be a closed pipe,
/// which is often the very reason the run failed.
fn finish<W: Write>(result: Result<RunReport, PipelineError>, summary: bool, out: &mut W) -> i32 {
    match result {
        Ok(report) => {
            if summary {
                let _ = writeln!(
                    out,
                    "{} objects ({} ATT&CK, {} veris kept, {} veris dropped, {} mappings) objects_sha256={}",
                    report.objects,
                    report.stats.attack,
                    report.stats.veris_kept,
                    report.stats.veris_dropped,
                    report.stats.mappings,
                    report.objects_sha256
                );
            }
            0
        }
        Err(e) => {
            // Finish the pending progress line before reporting
            let _ = writeln!(out);
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}
