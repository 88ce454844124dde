// CLI entry point for the toy piano counterpoint service.
//
// Starts the HTTP endpoint on a background thread and blocks until it
// exits. See `server.rs` for the request loop and `counterpoint.rs` for the
// per-request pipeline.
//
// Usage:
//   toy-piano [OPTIONS]
//     --host <HOST>            Listen address (default: 127.0.0.1)
//     --port <PORT>            Listen port (default: 5002)
//     --oracle seeded|replay   Sample backend (default: seeded)
//     --seed <N>               Seed for the seeded backend
//     --replay <FILE>          Recorded supply for the replay backend
//     --log-level <LEVEL>      Default filter when RUST_LOG is unset
//     --log-json               JSON log lines

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use toy_piano_compose::oracle::{Oracle, ReplayOracle, SeededOracle};
use toy_piano_service::server::{ServiceConfig, start_service};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OracleKind {
    /// Uniform outcomes from a seeded generator
    Seeded,
    /// Outcomes from a recorded `full_res_dict`
    Replay,
}

#[derive(Parser)]
#[command(name = "toy-piano", version)]
#[command(about = "Serve quantum toy piano counterpoint over HTTP")]
struct Cli {
    #[arg(long, env = "TOY_PIANO_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "TOY_PIANO_PORT", default_value_t = 5002)]
    port: u16,

    #[arg(long, value_enum, default_value_t = OracleKind::Seeded)]
    oracle: OracleKind,

    /// Seed for the seeded oracle (OS entropy when absent)
    #[arg(long)]
    seed: Option<u64>,

    /// Recording to answer from when `--oracle replay`
    #[arg(long, required_if_eq("oracle", "replay"))]
    replay: Option<PathBuf>,

    #[arg(long, env = "TOY_PIANO_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long)]
    log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let oracle: Box<dyn Oracle + Send> = match (cli.oracle, &cli.replay) {
        (OracleKind::Replay, Some(path)) => Box::new(
            ReplayOracle::load(path)
                .with_context(|| format!("loading recording {}", path.display()))?,
        ),
        (OracleKind::Replay, None) => anyhow::bail!("--oracle replay needs --replay <FILE>"),
        (OracleKind::Seeded, _) => match cli.seed {
            Some(seed) => Box::new(SeededOracle::new(seed)),
            None => Box::new(SeededOracle::from_entropy()),
        },
    };

    let config = ServiceConfig {
        host: cli.host,
        port: cli.port,
    };
    let (handle, addr) = start_service(config, oracle).context("starting service")?;
    println!("Toy piano service listening on http://{addr}/toy_piano_counterpoint");

    handle.wait();
    Ok(())
}
