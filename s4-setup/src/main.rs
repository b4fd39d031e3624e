use clap::Parser;
use s4_setup::{ConsoleReporter, Pipeline, SetupConfig, SetupError, SystemRunner};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "s4-setup")]
#[command(about = "Set up a Python environment and an S4 Slicer checkout")]
struct Cli {
    /// TOML file overriding the built-in settings
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory to set up in (defaults to the current directory)
    #[arg(short, long)]
    work_dir: Option<PathBuf>,
    /// Stop instead of reusing an existing checkout
    #[arg(long)]
    strict_clone: bool,
}

fn load_config(cli: &Cli) -> Result<SetupConfig, SetupError> {
    let mut config = match &cli.config {
        Some(path) => SetupConfig::from_toml_file(path)?,
        None => SetupConfig::default(),
    };

    if let Some(work_dir) = &cli.work_dir {
        config = config.with_work_dir(work_dir);
    }
    if cli.strict_clone {
        config = config.with_reuse_existing_clone(false);
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match load_config(&cli) {
        Ok(config) => {
            let pipeline = Pipeline::new(config, SystemRunner::new());
            pipeline.run(&mut ConsoleReporter).await.map(|_| ())
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_reported() => {
            error!("setup stopped: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("setup failed: {}", e);
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}
