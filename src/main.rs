use clap::Parser;
use tracing_subscriber::EnvFilter;

mod ai;
mod app;
mod cli;
mod config;
mod eid;
mod extract;
mod knowledge;
mod lock;
mod storage;
mod surface;
#[cfg(test)]
mod tests;
mod web;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(cli::run(args.command))
}
