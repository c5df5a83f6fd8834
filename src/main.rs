#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![warn(clippy::nursery)]
#![allow(clippy::multiple_crate_versions)]
mod cli;

use crate::cli::{Cli, Commands};
use bao::{Arm, ProtocolClient, Strategy, hint_for};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Arms => {
            for arm in Arm::all() {
                let config = arm.configuration();
                let enabled: Vec<&str> = Strategy::ALL
                    .into_iter()
                    .filter(|strategy| config.is_enabled(*strategy))
                    .map(Strategy::setting_name)
                    .collect();
                let hint = hint_for(arm).map_or_else(|| "(no hint)".to_string(), |h| h.to_string());
                println!("{arm:>2}\t{}\t{}", enabled.join(","), hint.trim_end());
            }
        }
        Commands::Hint(cmd) => {
            let arm = Arm::new(cmd.arm)?;
            match hint_for(arm) {
                Some(hint) => println!("{}", hint.to_string().trim_end()),
                None => println!("(no hint)"),
            }
        }
        Commands::LoadModel(cmd) => {
            let service = &cmd.service_config;
            let client = ProtocolClient::new(service.host.clone(), service.port);
            client.load_model(&cmd.path)?;
            log::info!("Asked {} to load model {}", client.address(), cmd.path);
        }
    }

    Ok(())
}
