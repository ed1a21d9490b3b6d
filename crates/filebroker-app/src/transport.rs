//! Newline-delimited JSON over a local socket or named pipe.
//!
//! # Design
//! - One line per request message; each request runs on its own task so slow
//!   operations never hold up the rest of the connection.
//! - Responses funnel through a single writer task per connection.
//! - A request line longer than [`MAX_REQUEST_LINE`] ends the connection
//!   before it is buffered.

use std::future::Future;
use std::io;

use filebroker_protocol::ValueSet;
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::dispatcher::Dispatcher;
use crate::error::{AppError, AppResult};

/// Longest accepted request line, in bytes.
pub const MAX_REQUEST_LINE: usize = 4 * 1024 * 1024;

/// Serve one client connection until it closes its sending side.
///
/// Requests still in flight when the client stops sending are completed and
/// their responses written before the connection is shut down.
///
/// # Errors
///
/// Returns an error when reading from or writing to the stream fails.
pub async fn serve_connection<S>(stream: S, dispatcher: Dispatcher) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    serve_lines(stream, dispatcher, MAX_REQUEST_LINE).await
}

async fn serve_lines<S>(stream: S, dispatcher: Dispatcher, max_line: usize) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let (responses, queue) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_responses(writer, queue));

    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(max_line));
    let mut requests = JoinSet::new();
    while let Some(read) = lines.next().await {
        let line = match read {
            Ok(line) => line,
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                warn!(max_line, "request line too long, closing connection");
                dispatcher.services().metrics.inc_decode_failure();
                break;
            }
            Err(LinesCodecError::Io(err)) => return Err(err),
        };
        if line.trim().is_empty() {
            continue;
        }
        let message: ValueSet = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, "malformed request line");
                dispatcher.services().metrics.inc_decode_failure();
                continue;
            }
        };
        let dispatcher = dispatcher.clone();
        let responses = responses.clone();
        requests.spawn(async move {
            match dispatcher.dispatch(&message).await {
                Ok(Some(response)) => {
                    if responses.send(response).is_err() {
                        debug!("connection writer closed before response");
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    dispatcher.services().metrics.inc_handler_failure();
                    error!(error = %err, "request handler failed");
                }
            }
        });
    }

    drop(responses);
    while let Some(joined) = requests.join_next().await {
        if let Err(err) = joined {
            error!(error = %err, "request task aborted");
        }
    }
    writer_task.await.map_err(io::Error::other)?
}

async fn write_responses<W>(
    mut writer: W,
    mut queue: mpsc::UnboundedReceiver<ValueSet>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = queue.recv().await {
        let mut line = serde_json::to_vec(&message).map_err(io::Error::other)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}

fn spawn_connection<S>(stream: S, dispatcher: Dispatcher)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let connection = Uuid::new_v4();
    let span = info_span!("connection", %connection);
    tokio::spawn(
        async move {
            debug!("client connected");
            match serve_connection(stream, dispatcher).await {
                Ok(()) => debug!("client disconnected"),
                Err(err) => warn!(error = %err, "connection failed"),
            }
        }
        .instrument(span),
    );
}

/// Accept clients on `endpoint` until `shutdown` resolves.
///
/// A stale socket file left by a previous run is replaced; any other file at
/// the endpoint is refused.
///
/// # Errors
///
/// Returns an error when the endpoint cannot be bound.
#[cfg(unix)]
pub async fn serve<F>(endpoint: &str, dispatcher: Dispatcher, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()>,
{
    use std::os::unix::fs::FileTypeExt;
    use std::path::Path;

    use tokio::net::UnixListener;

    let path = Path::new(endpoint);
    if let Ok(metadata) = std::fs::symlink_metadata(path) {
        if !metadata.file_type().is_socket() {
            return Err(AppError::transport(
                "transport.bind",
                endpoint,
                io::Error::from(io::ErrorKind::AlreadyExists),
            ));
        }
        std::fs::remove_file(path)
            .map_err(|err| AppError::transport("transport.remove_stale", endpoint, err))?;
    }
    let listener =
        UnixListener::bind(path).map_err(|err| AppError::transport("transport.bind", endpoint, err))?;
    info!(endpoint, "listening");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => spawn_connection(stream, dispatcher.clone()),
                Err(err) => warn!(error = %err, "accept failed"),
            },
        }
    }

    if let Err(err) = std::fs::remove_file(path) {
        debug!(endpoint, error = %err, "socket cleanup skipped");
    }
    info!(endpoint, "listener stopped");
    Ok(())
}

/// Accept clients on the named pipe `endpoint` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error when a pipe instance cannot be created.
#[cfg(windows)]
pub async fn serve<F>(endpoint: &str, dispatcher: Dispatcher, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()>,
{
    use tokio::net::windows::named_pipe::ServerOptions;

    let mut server = ServerOptions::new()
        .first_pipe_instance(true)
        .create(endpoint)
        .map_err(|err| AppError::transport("transport.bind", endpoint, err))?;
    info!(endpoint, "listening");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            connected = server.connect() => {
                if let Err(err) = connected {
                    warn!(error = %err, "pipe connect failed");
                    continue;
                }
                let next = ServerOptions::new()
                    .create(endpoint)
                    .map_err(|err| AppError::transport("transport.create_instance", endpoint, err))?;
                spawn_connection(std::mem::replace(&mut server, next), dispatcher.clone());
            }
        }
    }

    info!(endpoint, "listener stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use filebroker_config::{BrokerConfig, LogFormatSetting, LoggingSettings};
    use filebroker_fsops::MemoryClipboard;
    use filebroker_protocol::Value;
    use filebroker_telemetry::Metrics;
    use filebroker_test_support::{file_operation, with_request_id};
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::services::Services;

    fn dispatcher(root: &std::path::Path) -> anyhow::Result<Dispatcher> {
        let config = BrokerConfig {
            endpoint: "unused".to_string(),
            recycle_dir: Some(root.join(".recycle")),
            link_resolve_timeout: Duration::from_millis(100),
            acknowledge_link_writes: false,
            logging: LoggingSettings {
                level: "info".to_string(),
                format: LogFormatSetting::Auto,
            },
        };
        let services =
            Services::with_clipboard(&config, Metrics::new()?, Arc::new(MemoryClipboard::new()))?;
        Ok(Dispatcher::new(services))
    }

    #[tokio::test]
    async fn over_long_line_closes_connection() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let doomed = dir.path().join("doomed.txt");
        std::fs::write(&doomed, b"x")?;
        let dispatcher = dispatcher(dir.path())?;
        let metrics = dispatcher.services().metrics.clone();

        let request = |id: &str| {
            with_request_id(
                file_operation(
                    "DeleteItem",
                    [("filepath", Value::from(doomed.as_path())), ("permanently", Value::Bool(true))],
                ),
                id,
            )
        };
        let mut input = serde_json::to_vec(&request("first"))?;
        input.push(b'\n');
        input.extend(std::iter::repeat_n(b'a', 4096));
        input.push(b'\n');
        input.extend(serde_json::to_vec(&request("after"))?);
        input.push(b'\n');

        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let server_task = tokio::spawn(serve_lines(server, dispatcher, 1024));
        client.write_all(&input).await?;
        client.shutdown().await?;
        let mut output = String::new();
        client.read_to_string(&mut output).await?;
        server_task.await??;

        let answers: Vec<ValueSet> = output
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?;
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].get("RequestID"), Some(&Value::from("first")));
        assert_eq!(metrics.snapshot().decode_failures_total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn writer_emits_one_line_per_message_then_closes() -> anyhow::Result<()> {
        let (client, server) = tokio::io::duplex(1024);
        let (sender, queue) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_responses(server, queue));
        sender.send(ValueSet::new().with("Success", true))?;
        sender.send(ValueSet::new().with("RequestID", "r2"))?;
        drop(sender);
        writer.await??;

        let mut output = String::new();
        let mut client = client;
        client.read_to_string(&mut output).await?;
        let lines: Vec<ValueSet> = output
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].get("Success"), Some(&Value::Bool(true)));
        assert_eq!(lines[1].get("RequestID"), Some(&Value::from("r2")));
        Ok(())
    }
}
