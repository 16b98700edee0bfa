use anyhow::{bail, Context, Result};
use clap::Parser;
use snowflake::app::{self, RunOptions};
use snowflake::config::{default_config_path, load_config, save_config_atomic};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Grow a snowflake on a hexagonal lattice")]
struct Args {
    /// JSON config file (defaults to the per-user config location)
    #[arg(long)]
    config: Option<PathBuf>,

    /// lattice radius in cells
    #[arg(long)]
    radius: Option<i32>,

    /// number of simulation steps
    #[arg(long)]
    iterations: Option<u64>,

    /// background vapour density, in [0, 1)
    #[arg(long)]
    beta: Option<f64>,

    /// vapour deposited on receptive cells per step
    #[arg(long)]
    gamma: Option<f64>,

    /// animate growth in the terminal
    #[arg(long)]
    live: bool,

    /// steps between frames in live mode
    #[arg(long)]
    steps_per_frame: Option<u32>,

    /// ms per frame in live mode
    #[arg(long)]
    ms: Option<u64>,

    /// write the final lattice as JSON
    #[arg(long)]
    export: Option<PathBuf>,

    /// save the merged settings back to the config file
    #[arg(long)]
    save_config: bool,

    /// print without ANSI colors
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(p) => {
            if !p.exists() {
                bail!("config file {} does not exist", p.display());
            }
            Some(p.clone())
        }
        None => default_config_path(),
    };

    let mut cfg = match &config_path {
        Some(p) => load_config(p)?,
        None => Default::default(),
    };

    if let Some(v) = args.radius {
        cfg.radius = v;
    }
    if let Some(v) = args.iterations {
        cfg.iterations = v;
    }
    if let Some(v) = args.beta {
        cfg.beta = v;
    }
    if let Some(v) = args.gamma {
        cfg.gamma = v;
    }
    if let Some(v) = args.steps_per_frame {
        cfg.steps_per_frame = v;
    }
    if let Some(v) = args.ms {
        cfg.frame_ms = v;
    }
    if args.no_color {
        cfg.enable_color = false;
    }
    cfg.validate()?;

    if args.save_config {
        let path = config_path.context("no config location available; pass --config")?;
        save_config_atomic(&path, &cfg)?;
        tracing::info!(path = %path.display(), "saved config");
    }

    app::run(RunOptions {
        config: cfg,
        live: args.live,
        export: args.export,
    })
}
