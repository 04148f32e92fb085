use anyhow::Result;
use webhook_relay_core::config::RunMode;

#[tokio::main]
async fn main() -> Result<()> {
    webhook_relay_server::run(RunMode::Ping).await
}
