//! `ballot`: replay election scenarios against the engine and print results.

mod runner;
mod scenario;

use std::path::PathBuf;

use anyhow::Context;
use ballot_engine::EngineConfig;
use ballot_types::Address;
use ballot_utils::LogFormat;
use clap::Parser;

use crate::scenario::Scenario;

#[derive(Parser)]
#[command(name = "ballot", about = "Election engine scenario runner")]
struct Cli {
    /// Path to a TOML engine configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "BALLOT_CONFIG")]
    config: Option<PathBuf>,

    /// Ledger account that holds staked tokens.
    #[arg(long, env = "BALLOT_CUSTODY")]
    custody: Option<String>,

    /// Maximum number of candidates per election.
    #[arg(long, env = "BALLOT_MAX_CANDIDATES")]
    max_candidates: Option<usize>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "BALLOT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "BALLOT_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a scenario file and print the final state as JSON.
    Simulate {
        /// Scenario TOML file.
        #[arg(long)]
        scenario: PathBuf,

        /// Include the full event log in the output.
        #[arg(long)]
        events: bool,

        /// Stop at the first failing step.
        #[arg(long)]
        strict: bool,
    },
    /// Print the effective engine configuration as TOML.
    Config,
}

impl Cli {
    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_toml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(custody) = &self.custody {
            config.custody = Address::new(custody.as_str());
        }
        if let Some(max) = self.max_candidates {
            config.max_candidates = max;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.engine_config()?;

    let format: LogFormat = config
        .log_format
        .parse()
        .map_err(anyhow::Error::msg)?;
    ballot_utils::init_logging(format, &config.log_level);

    match cli.command {
        Command::Simulate {
            scenario,
            events,
            strict,
        } => {
            let mut loaded = Scenario::from_toml_file(&scenario)?;
            loaded.strict |= strict;
            tracing::info!(
                scenario = %scenario.display(),
                steps = loaded.steps.len(),
                "replaying scenario"
            );
            let report = runner::run(&loaded, config, events)?;
            let failed = report.steps.iter().filter(|s| !s.ok).count();
            tracing::info!(failed, "scenario finished");
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
