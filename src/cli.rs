use bao::config::{DEFAULT_HOST, DEFAULT_PORT};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    version,
    name = "bao",
    about = r#"
Inspect the arm table and talk to a Bao decision service.

Each arm is a fixed set of planner strategies. For every eligible query the
optimizer plans once per arm and the decision service picks the plan to run."#
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print every arm with its enabled strategies and hint
    Arms,
    /// Print the statements that reproduce one arm
    Hint(HintCommand),
    /// Ask the decision service to load a saved model
    LoadModel(LoadModelCommand),
}

/// Where the decision service listens.
#[derive(Debug, Clone, Args)]
pub struct ServiceConfig {
    /// Decision service host.
    #[arg(long, env = "BAO_HOST", default_value = DEFAULT_HOST)]
    pub host: String,
    /// Decision service port.
    #[arg(long, short, env = "BAO_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

#[derive(Debug, Clone, Args)]
pub struct HintCommand {
    /// Arm index.
    pub arm: usize,
}

#[derive(Debug, Clone, Args)]
pub struct LoadModelCommand {
    /// Path of the saved model, as seen by the decision service.
    pub path: String,

    #[command(flatten)]
    pub service_config: ServiceConfig,
}
