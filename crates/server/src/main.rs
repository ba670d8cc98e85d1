use std::{future::IntoFuture, net::SocketAddr, path::Path, sync::Arc};

use anyhow::Context;
use command_core::Interpreter;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod dashboard;
mod tcp;

use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings()?;
    let topology = topology::load_layout(Path::new(&settings.layout_path))
        .with_context(|| format!("failed to load layout '{}'", settings.layout_path))?;
    let interpreter = Interpreter::standard(Arc::new(topology))
        .context("failed to register the standard command set")?;
    let state = AppState::new(Arc::new(interpreter), settings.snapshot_channel_capacity);

    let command_addr: SocketAddr = settings
        .command_bind
        .parse()
        .with_context(|| format!("invalid command_bind '{}'", settings.command_bind))?;
    let dashboard_addr: SocketAddr = settings
        .dashboard_bind
        .parse()
        .with_context(|| format!("invalid dashboard_bind '{}'", settings.dashboard_bind))?;

    let command_listener = tokio::net::TcpListener::bind(command_addr).await?;
    let dashboard_listener = tokio::net::TcpListener::bind(dashboard_addr).await?;
    info!(%command_addr, "command port listening");
    info!(%dashboard_addr, "dashboard listening");

    let commands = tokio::spawn(tcp::serve(
        command_listener,
        state.clone(),
        settings.idle_timeout(),
    ));
    let app = dashboard::build_router(Arc::new(state));

    tokio::select! {
        served = axum::serve(dashboard_listener, app).into_future() => served?,
        joined = commands => joined.context("command listener stopped")?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }
    Ok(())
}
