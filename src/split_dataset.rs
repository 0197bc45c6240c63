use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use traffic_devkit::{process_split, SplitArgs};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = SplitArgs::parse();

    info!("Splitting annotations in {}...", args.data_dir.display());

    match process_split(&args.layout(), &args.split_config()) {
        Ok(_) => {
            info!("Dataset split completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to split dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
