//! Coin Sync Client - headless interpolating viewer
//!
//! Type `up`, `down`, `left`, `right` or `stop` (or w/s/a/d/x) followed by
//! Enter to steer.

use clap::Parser;

use coin_sync::config::ClientConfig;
use coin_sync::util::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::parse();
    init_tracing(&config.log_level);

    coin_sync::client::run(config).await?;
    Ok(())
}
