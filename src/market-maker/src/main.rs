//! Market-maker daemon entry point: CLI parsing, credential/strategy
//! loading, and dispatch to the scheduler.

use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use common::{load_credentials, AuthSession, ExchangeClient};
use market_maker::strategy;
use market_maker::Scheduler;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

const CREDENTIALS_PATH: &str = "./credentials.yaml";
const STRATEGIES_DIR: &str = "./strategies";

#[derive(Parser, Debug)]
#[command(name = "market-maker")]
#[command(about = "Automated two-sided market maker for a binary prediction-market exchange")]
struct Cli {
    #[command(subcommand)]
    operation: Operation,
}

#[derive(Subcommand, Debug)]
enum Operation {
    /// Clear the book once, then continuously quote every market in the profile.
    Make {
        #[arg(default_value = "default")]
        profile: String,
    },
    /// Cancel every resting order for every market in the profile. No quoting.
    Clear {
        #[arg(default_value = "default")]
        profile: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    FmtSubscriber::builder().with_max_level(Level::INFO).init();

    let cli = Cli::parse();
    let (profile_name, clearing_only) = match &cli.operation {
        Operation::Make { profile } => (profile.clone(), false),
        Operation::Clear { profile } => (profile.clone(), true),
    };

    let strategies = match strategy::load_strategies(Path::new(STRATEGIES_DIR)) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let Some(strategy) = strategies.get(&profile_name) else {
        println!("No strategy found with this name.");
        return ExitCode::SUCCESS;
    };

    let credentials = match load_credentials(Path::new(CREDENTIALS_PATH), strategy.env) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    info!(profile = %profile_name, markets = strategy.markets.len(), "starting");

    let auth = AuthSession::new(strategy.env.host(), credentials);
    let client = ExchangeClient::new(strategy.env.host(), auth);
    let mut scheduler = Scheduler::new(client, strategy.markets.clone());

    let result = if clearing_only {
        scheduler.run_clear().await
    } else {
        scheduler.run_make().await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "fatal error");
            ExitCode::FAILURE
        }
    }
}
