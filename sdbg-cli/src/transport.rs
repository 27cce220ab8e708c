//! Minimal newline-delimited JSON RPC carrier (§6). Not itself the subject
//! of deep design: no versioning, no multiplexed channels, no compression —
//! just enough framing to exercise the CommandInterface end to end.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use sdbg_core::{CommandInterface, EngineError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

#[derive(Debug, Deserialize)]
struct WireRequest {
    id: u64,
    #[serde(flatten)]
    command: sdbg_core::command::Command,
}

#[derive(Debug, Serialize)]
struct WireOk {
    id: u64,
    result: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct WireErr {
    id: u64,
    error: WireErrorBody,
}

#[derive(Debug, Serialize)]
struct WireErrorBody {
    kind: String,
    message: String,
}

/// Binds `port` on loopback and serves one thread per connection until the
/// process exits. Never returns on success.
///
/// # Errors
/// Returns an error if the port cannot be bound.
pub fn serve(port: u16, iface: Arc<CommandInterface>) -> std::io::Result<()> {
    let listener = TcpListener::bind(("127.0.0.1", port))?;
    info!(port, "rpc listener bound");

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let iface = iface.clone();
                thread::spawn(move || handle_connection(stream, &iface));
            }
            Err(e) => warn!(error = %e, "failed to accept connection"),
        }
    }
    Ok(())
}

fn handle_connection(stream: TcpStream, iface: &CommandInterface) {
    let peer = stream.peer_addr().ok();
    debug!(?peer, "client connected");
    let reader = BufReader::new(stream.try_clone().expect("clone tcp stream"));
    let mut writer = stream;

    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(iface, &line);
        if writer.write_all(response.as_bytes()).is_err() || writer.write_all(b"\n").is_err() {
            break;
        }
    }
    debug!(?peer, "client disconnected");
}

fn handle_line(iface: &CommandInterface, line: &str) -> String {
    let request: WireRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            return serde_json::to_string(&WireErr {
                id: 0,
                error: WireErrorBody {
                    kind: "TransportFailure".into(),
                    message: format!("malformed request: {e}"),
                },
            })
            .unwrap_or_default();
        }
    };

    let id = request.id;
    match iface.dispatch(request.command) {
        Ok(result) => serde_json::to_string(&WireOk {
            id,
            result: serde_json::to_value(result).unwrap_or(serde_json::Value::Null),
        })
        .unwrap_or_default(),
        Err(err) => {
            error!(id, error = %err, "command failed");
            serde_json::to_string(&WireErr {
                id,
                error: WireErrorBody {
                    kind: error_kind(&err).into(),
                    message: err.to_string(),
                },
            })
            .unwrap_or_default()
        }
    }
}

fn error_kind(err: &EngineError) -> &'static str {
    match err {
        EngineError::UnknownThread { .. } => "UnknownThread",
        EngineError::NotSuspended { .. } => "NotSuspended",
        EngineError::InvalidArgument { .. } => "InvalidArgument",
        EngineError::EvaluationFailure { .. } => "EvaluationFailure",
        EngineError::TransportFailure { .. } => "TransportFailure",
        EngineError::SessionFatal { .. } => "SessionFatal",
    }
}
