//! Line-delimited JSON-RPC transport used in MCP mode.
//!
//! Every request runs on its own task, so a tool waiting on a receipt does not
//! hold up the next line. Replies go through a channel to a single writer and
//! may arrive out of order; callers match them by id.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{
    mcp::{
        handler::handle_mcp_request,
        protocol::{error_codes, Request, Response},
    },
    AppState,
};

/// Serves requests read line by line from `input` until EOF, then waits for
/// in-flight requests to reply before returning.
pub async fn serve<R, W>(state: AppState, input: R, output: W)
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (replies, outbox) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_replies(outbox, output));

    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("EOF received, shutting down MCP server");
                break;
            }
            Err(e) => {
                error!("Failed to read from stdin: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("Received: {}", line);

        match serde_json::from_str::<Request>(line) {
            Ok(request) => {
                tokio::spawn(dispatch(request, state.clone(), replies.clone()));
            }
            Err(parse_error) => {
                error!("JSON parse error: {}", parse_error);
                let _ = replies.send(Response::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", parse_error),
                ));
            }
        }
    }

    drop(replies);
    if let Err(e) = writer.await {
        error!("Reply writer stopped: {}", e);
    }
}

// Runs the handler on its own task so a panic becomes an internal error reply.
async fn dispatch(request: Request, state: AppState, replies: mpsc::UnboundedSender<Response>) {
    let id = request.id.clone();
    let method = request.method.clone();
    let notification = request.is_notification();

    let reply = match tokio::spawn(handle_mcp_request(request, state)).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Handler for '{}' aborted: {}", method, e);
            (!notification).then(|| {
                Response::error(
                    id,
                    error_codes::INTERNAL_ERROR,
                    format!("Internal error while handling '{}'", method),
                )
            })
        }
    };

    if let Some(reply) = reply {
        let _ = replies.send(reply);
    }
}

async fn write_replies<W>(mut outbox: mpsc::UnboundedReceiver<Response>, mut output: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(reply) = outbox.recv().await {
        let mut line = match serde_json::to_string(&reply) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                continue;
            }
        };
        debug!("Sending: {}", line);
        line.push('\n');

        let written = output.write_all(line.as_bytes()).await;
        if let Err(e) = written.and(output.flush().await) {
            error!("Failed to write response: {}", e);
            break;
        }
    }
}
