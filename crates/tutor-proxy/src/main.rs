use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tutor_ai::init_tracing;
use tutor_proxy::{routes, GeminiUpstream, ProxyConfig, ProxyState, PROXY_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("tutor-proxy")
        .version(tutor_proxy::VERSION)
        .about("Generation proxy holding the model API credential")
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .value_parser(value_parser!(SocketAddr))
                .help("Listen address, overrides PROXY_BIND"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .get_matches();

    init_tracing(matches.get_flag("json-logs"));

    let mut config = ProxyConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("failed to load proxy configuration")?;
    if let Some(bind) = matches.get_one::<SocketAddr>("bind") {
        config.bind = *bind;
    }
    if config.api_key.is_none() {
        tracing::warn!("API_KEY is not set; generation requests will be refused");
    }

    let upstream = GeminiUpstream::new(
        config.upstream_url.clone(),
        Duration::from_secs(config.timeout_secs),
    )
    .context("failed to build the upstream client")?;
    let bind = config.bind;
    let state = Arc::new(ProxyState::new(config, Arc::new(upstream)));

    let (addr, server) = warp::serve(routes(state))
        .try_bind_ephemeral(bind)
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!("listening on http://{}/{}", addr, PROXY_PATH);
    server.await;
    Ok(())
}
