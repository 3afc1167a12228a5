use color_eyre::Result;

use gridmate::proxy::{ProxyConfig, serve};

pub struct Options {
    pub port: u16,
}

/// Runs the HTTP relay that forwards transform requests to the completion
/// API with the server-held credential. Fails fast when the credential is
/// missing from the environment.
pub async fn command(options: Options) -> Result<()> {
    let config = ProxyConfig::from_env()?;
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", options.port)).await?;
    serve(listener, config).await
}
