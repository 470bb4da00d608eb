//! JSON-lines message channel between UI contexts and the background.
//!
//! Each inbound line is a request; each outbound line is either a response
//! (carrying the request's correlation id) or an `appConfigUpdate` event.
//! Requests are answered concurrently, so responses may arrive out of order.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use linguist_background::Background;
use linguist_config::AppConfig;
use linguist_protocol::{
    requests, CorrelationId, ErrorKind, EventMessage, MessageCodec, RequestMessage, ResponseMessage,
};

const OUTBOUND_CAPACITY: usize = 256;

/// Serve requests from `reader` until it reaches end of input, then wait for
/// in-flight requests, detach the background's reactions and flush `writer`.
pub async fn serve<R, W>(background: Arc<Background>, reader: R, writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbound, rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);
    let writer_task = tokio::spawn(write_lines(writer, rx));
    let events_task = tokio::spawn(forward_config_events(background.subscribe_config(), outbound.clone()));

    let mut in_flight = JoinSet::new();
    let mut lines = reader.lines();
    let mut received = 0usize;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        received += 1;
        match MessageCodec::decode::<RequestMessage>(&line) {
            Ok(request) => {
                let background = Arc::clone(&background);
                let outbound = outbound.clone();
                in_flight.spawn(async move {
                    let response = background.dispatch(request).await;
                    send(&outbound, &response).await;
                });
            }
            Err(e) => {
                let correlation_id = salvage_correlation_id(&line);
                warn!(error = %e, %correlation_id, "undecodable request line");
                let response = ResponseMessage::error(correlation_id, ErrorKind::InvalidPayload, e.to_string());
                send(&outbound, &response).await;
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "request task failed");
        }
    }
    events_task.abort();
    let _ = events_task.await;
    background.shutdown();

    drop(outbound);
    writer_task.await??;
    info!(received, "channel closed");
    Ok(())
}

/// Correlation id of a line that is JSON but not a valid request, or nil
/// when there is none to answer under.
fn salvage_correlation_id(line: &str) -> CorrelationId {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|mut doc| doc.get_mut("correlationId").map(Value::take))
        .and_then(|raw| serde_json::from_value(raw).ok())
        .unwrap_or_else(CorrelationId::nil)
}

async fn write_lines<W>(mut writer: W, mut rx: mpsc::Receiver<String>) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}

async fn forward_config_events(mut events: broadcast::Receiver<AppConfig>, outbound: mpsc::Sender<String>) {
    loop {
        match events.recv().await {
            Ok(config) => match serde_json::to_value(&config) {
                Ok(payload) => {
                    send(&outbound, &EventMessage::new(requests::APP_CONFIG_UPDATE, payload)).await;
                }
                Err(e) => warn!(error = %e, "config snapshot not serializable"),
            },
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "config events dropped"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn send<M: Serialize>(outbound: &mpsc::Sender<String>, message: &M) {
    match MessageCodec::encode(message) {
        Ok(line) => {
            if outbound.send(line).await.is_err() {
                debug!("output closed, message dropped");
            }
        }
        Err(e) => warn!(error = %e, "message not encodable"),
    }
}
