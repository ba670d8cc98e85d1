//! Line-oriented command transport. One task per connection; commands on a
//! connection run strictly in arrival order.

use std::time::Duration;

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    time::timeout,
};
use tokio_stream::{wrappers::TcpListenerStream, StreamExt};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::app_state::AppState;

pub(crate) async fn serve(listener: TcpListener, state: AppState, idle_timeout: Option<Duration>) {
    let mut incoming = TcpListenerStream::new(listener);
    while let Some(stream) = incoming.next().await {
        let stream = match stream {
            Ok(stream) => stream,
            Err(error) => {
                warn!(%error, "failed to accept command connection");
                continue;
            }
        };
        let state = state.clone();
        tokio::spawn(handle_connection(stream, state, idle_timeout));
    }
}

async fn handle_connection(stream: TcpStream, state: AppState, idle_timeout: Option<Duration>) {
    let conn = Uuid::new_v4();
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".into());
    let span = info_span!("connection", %conn, %peer);

    async move {
        info!("client connected");
        match session(stream, &state, idle_timeout).await {
            Ok(()) => info!("client disconnected"),
            Err(error) => warn!(%error, "connection closed with error"),
        }
    }
    .instrument(span)
    .await
}

async fn session(
    stream: TcpStream,
    state: &AppState,
    idle_timeout: Option<Duration>,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        let next = match idle_timeout {
            Some(limit) => match timeout(limit, lines.next_line()).await {
                Ok(line) => line?,
                Err(_) => {
                    info!(idle_seconds = limit.as_secs(), "closing idle connection");
                    return Ok(());
                }
            },
            None => lines.next_line().await?,
        };
        let Some(line) = next else {
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        let before = state.interpreter.store().revision();
        let response = state.interpreter.interpret(&line);
        let verb = response.echo.split_whitespace().next().unwrap_or_default();
        info!(verb, code = %response.code, "command handled");

        writer.write_all(response.to_wire().as_bytes()).await?;
        writer.flush().await?;

        if state.interpreter.store().revision() != before {
            state.publish();
        }
    }
}

#[cfg(test)]
#[path = "tests/tcp_tests.rs"]
mod tests;
