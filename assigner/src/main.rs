use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use modid::config::{DigestEncoding, IdOptions};
use modid::error::ConfigError;
use modid::plugin::{write_export, NamedModuleIds};
use modid::registry::RunExport;
use modid::SourceModule;

#[derive(Parser, Debug)]
#[command(
    name = "modid",
    version,
    about = "Assign stable, collision-free ids to bundler modules"
)]
struct Cli {
    /// Module paths (read from stdin, one per line, when omitted)
    modules: Vec<String>,

    /// Project root (default: current directory)
    #[arg(long)]
    context: Option<PathBuf>,

    /// JSON options file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Hash algorithm: named, debug, fast, md4, sha256, blake2b512, ...
    #[arg(long)]
    hash_function: Option<String>,

    /// Digest encoding: hex, base64 or base64url
    #[arg(long)]
    hash_digest: Option<DigestEncoding>,

    /// Initial id length before collision growth
    #[arg(long)]
    hash_digest_length: Option<usize>,

    /// Dependency exempt from version blurring (repeatable)
    #[arg(long = "enforce")]
    enforce: Vec<String>,

    /// Re-hash semantic identities into short digests
    #[arg(long)]
    named_to_hash: bool,

    /// Prefix project sources with the root package name
    #[arg(long)]
    add_source_prefix: bool,

    /// npm global install directory (default: detected)
    #[arg(long)]
    global_dir: Option<PathBuf>,

    /// Write the run export (named set and hashed map) to this file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Assigned {
    module: String,
    id: Option<String>,
}

#[derive(Serialize)]
struct Failure {
    module: String,
    error: String,
}

#[derive(Serialize)]
struct Output {
    modules: Vec<Assigned>,
    #[serde(flatten)]
    export: RunExport,
    failures: Vec<Failure>,
}

fn options(cli: &Cli) -> Result<IdOptions, ConfigError> {
    let mut options = match &cli.config {
        Some(path) => IdOptions::load(path)?,
        None => IdOptions::default(),
    };
    if let Some(context) = &cli.context {
        options.context = Some(context.clone());
    }
    if let Some(name) = &cli.hash_function {
        options.hash_function = name.clone();
    }
    if let Some(encoding) = cli.hash_digest {
        options.hash_digest = encoding;
    }
    if let Some(len) = cli.hash_digest_length {
        options.hash_digest_length = len;
    }
    if !cli.enforce.is_empty() {
        options.enforce_modules = cli.enforce.clone();
    }
    options.named_to_hash |= cli.named_to_hash;
    options.add_source_prefix |= cli.add_source_prefix;
    if let Some(dir) = &cli.global_dir {
        options.global_dir = Some(dir.clone());
    }
    Ok(options)
}

fn read_modules(cli: &Cli) -> io::Result<Vec<String>> {
    if !cli.modules.is_empty() {
        return Ok(cli.modules.clone());
    }
    let mut modules = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            modules.push(line.to_string());
        }
    }
    Ok(modules)
}

fn fail(message: impl std::fmt::Display, code: i32) -> ! {
    eprintln!("modid: error: {}", message);
    std::process::exit(code);
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let options = options(&cli).unwrap_or_else(|e| fail(e, 2));
    let host_root = std::env::current_dir()
        .map_err(ConfigError::ProjectRoot)
        .unwrap_or_else(|e| fail(e, 2));

    let mut plugin = NamedModuleIds::new(options, &host_root).unwrap_or_else(|e| fail(e, 2));
    if let Some(path) = cli.export.clone() {
        plugin = plugin.with_callback(move |named, hashed, fs| {
            let export = RunExport {
                named: named.clone(),
                hashed: hashed.clone(),
            };
            write_export(fs, &path, &export)
        });
    }

    let requests = read_modules(&cli).unwrap_or_else(|e| fail(e, 2));
    info!(modules = requests.len(), root = %plugin.deriver().context().project_root, "assigning");

    let mut modules: Vec<SourceModule> = requests.into_iter().map(SourceModule::new).collect();
    let outcome = plugin.compile(modules.iter_mut()).unwrap_or_else(|e| fail(e, 2));

    let failed = !outcome.report.is_success();
    let output = Output {
        modules: modules
            .into_iter()
            .map(|m| Assigned {
                module: m.request,
                id: m.id,
            })
            .collect(),
        export: outcome.export,
        failures: outcome
            .report
            .failures
            .iter()
            .map(|f| Failure {
                module: f.identity.clone(),
                error: f.source.to_string(),
            })
            .collect(),
    };
    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e, 2),
    }
    if failed {
        std::process::exit(1);
    }
}
