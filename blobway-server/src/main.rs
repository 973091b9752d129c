use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let server = blobway_server::build().await?;

    tracing::info!(addr = %server.addr(), "starting blobway");

    server.listen().await?;

    Ok(())
}
