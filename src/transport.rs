//! Line-oriented stdio transport.
//!
//! Reads one JSON-RPC request per line from the reader, dispatches it, and
//! writes one serialized response line to the writer. Blank lines are
//! skipped; framing failures (oversized lines) are answered with a parse
//! error without tearing the loop down. Diagnostics go to the log, never to
//! the response stream.

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::rpc::codec::RpcLineCodec;
use crate::rpc::envelope::Response;
use crate::rpc::router::Router;
use crate::Result;

/// Serve the JSON-RPC loop over stdin/stdout until EOF or cancellation.
///
/// # Errors
///
/// Returns `AppError::Io` if writing a response fails.
pub async fn serve_stdio(router: &Router, ct: CancellationToken) -> Result<()> {
    info!(
        methods = ?Router::supported_methods(),
        "stdio transport ready"
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    tokio::select! {
        () = ct.cancelled() => {
            info!("stdio transport shutting down");
            Ok(())
        }
        result = run_loop(router, stdin, stdout) => {
            info!("stdio transport stopped");
            result
        }
    }
}

/// Drive the request/response loop over arbitrary byte streams.
///
/// Generic so tests can run the full loop against in-memory buffers.
///
/// # Errors
///
/// Returns `AppError::Io` if writing a response fails. Read-side framing
/// errors are reported to the peer as parse errors and do not end the loop.
pub async fn run_loop<R, W>(router: &Router, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = FramedRead::new(reader, RpcLineCodec::new());

    while let Some(frame) = lines.next().await {
        let response = match frame {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                router.handle_line(trimmed).await
            }
            Err(err) => {
                warn!(%err, "failed to frame request line");
                Response::parse_error(&err.to_string())
            }
        };

        let mut out = response.to_json();
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}
