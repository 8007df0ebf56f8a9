mod config;
mod desktop;
mod error;
mod executor;
mod matcher;
mod model;
mod resolver;

use anyhow::{Result, bail};
use clap::Parser;
use crate::executor::{DryRun, Launcher, ProcessRunner, ReplaceProcess, SpawnDetached};
use crate::resolver::SearchPath;
use log::{debug, error};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Open a URL with the application its rules pick", long_about = None)]
struct Args {
    /// Path to the JSON rule list
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replace this process with the application instead of spawning it
    #[arg(long, conflicts_with = "dry_run")]
    exec: bool,

    /// Print the command that would run instead of running it
    #[arg(long)]
    dry_run: bool,

    /// Log every rule that is tried
    #[arg(short, long)]
    verbose: bool,

    /// http or https URL to open
    url: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("no rule could open {}", args.url);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    check_scheme(&args.url)?;

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let rules = config::load_rules(&config_path)?;
    debug!("Loaded {} rules from {:?}", rules.len(), config_path);

    let search_path = SearchPath::from_env();
    debug!("Desktop entry search path: {:?}", search_path.dirs());

    Ok(if args.dry_run {
        route_with(args, &rules, search_path, DryRun)
    } else if args.exec {
        route_with(args, &rules, search_path, ReplaceProcess)
    } else {
        route_with(args, &rules, search_path, SpawnDetached)
    })
}

fn route_with<R: ProcessRunner>(
    args: &Args,
    rules: &[model::Rule],
    search_path: SearchPath,
    runner: R,
) -> bool {
    let launcher = Launcher::new(search_path, runner);
    matcher::route(&args.url, rules, &launcher)
}

/// Only http and https URLs are routed.
fn check_scheme(url: &str) -> Result<()> {
    let Some((scheme, rest)) = url.split_once(':') else {
        bail!("{url:?} is not a URL");
    };
    if !(scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")) {
        bail!("only http and https URLs are supported, got {scheme:?}");
    }
    if !rest.starts_with("//") {
        bail!("{url:?} is missing an authority");
    }
    Ok(())
}
