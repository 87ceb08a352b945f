use clap::Parser;
use gridbench::bench::cancel_pair;
use gridbench::cli::Cli;
use gridbench::driver::Driver;
use gridbench::EXIT_NOT_RUNNABLE;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let (source, token) = cancel_pair();
    let mut driver = Driver::new(token);
    match cli.into_config() {
        Ok(config) => driver.configure(config),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(EXIT_NOT_RUNNABLE);
        }
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current trial");
            source.cancel();
        }
    });

    let code = driver.run().await;
    std::process::exit(code);
}
