//! Live browser handles: a launched server process or an attached
//! control-protocol connection.
//!
//! The handle is owned exclusively by the bootstrap process. Workers
//! never see it; they reconnect through the endpoint string published
//! in the session descriptor.

use std::net::TcpListener;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::acquire::fetch_debugger_endpoint;
use crate::engine::{EngineDriver, LaunchSpec};

const LAUNCH_POLL_ATTEMPTS: u32 = 25;
const LAUNCH_POLL_INTERVAL: Duration = Duration::from_millis(200);
const LAUNCH_POLL_TIMEOUT: Duration = Duration::from_millis(400);

/// The process-unique browser automation handle.
///
/// Exactly one exists per bootstrap run. It stays with the bootstrap
/// until an external teardown step calls [`BrowserHandle::close`].
#[derive(Debug)]
pub enum BrowserHandle {
	/// Browser server process launched and owned by this run. The
	/// child is deliberately not killed on drop so the server outlives
	/// the bootstrap for the worker processes.
	Launched { child: Child },
	/// Attachment to an already-running browser.
	Attached { transport: WsTransport },
}

impl BrowserHandle {
	/// Tears the session down: kills a launched server or closes an
	/// attached connection.
	pub async fn close(self) -> anyhow::Result<()> {
		match self {
			BrowserHandle::Launched { mut child } => {
				child.kill().await.context("failed to kill launched browser server")?;
				Ok(())
			}
			BrowserHandle::Attached { transport } => transport.close().await,
		}
	}
}

/// WebSocket control-protocol transport with a per-command pacing
/// delay.
#[derive(Debug)]
pub struct WsTransport {
	stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
	pacing: Duration,
	next_id: u64,
}

impl WsTransport {
	pub async fn connect(endpoint: &str, pacing: Duration) -> anyhow::Result<Self> {
		debug!(target = "bootstrap", %endpoint, "connecting control-protocol websocket");
		let (stream, _) = tokio_tungstenite::connect_async(endpoint)
			.await
			.with_context(|| format!("websocket connect to {endpoint} failed"))?;
		Ok(Self {
			stream,
			pacing,
			next_id: 0,
		})
	}

	/// Sends a JSON-RPC command and waits for its response, honoring
	/// the pacing delay before dispatch.
	pub async fn send_command(&mut self, method: &str, params: Value) -> anyhow::Result<Value> {
		if !self.pacing.is_zero() {
			tokio::time::sleep(self.pacing).await;
		}
		self.next_id += 1;
		let id = self.next_id;
		let payload = serde_json::json!({ "id": id, "method": method, "params": params });
		self.stream
			.send(Message::Text(payload.to_string()))
			.await
			.with_context(|| format!("failed to send {method}"))?;

		while let Some(message) = self.stream.next().await {
			let message = message.with_context(|| format!("connection error awaiting {method} response"))?;
			let Message::Text(text) = message else {
				continue;
			};
			let value: Value = serde_json::from_str(&text)
				.with_context(|| format!("malformed response to {method}"))?;
			// Events carry no id; skip until our response arrives.
			if value.get("id").and_then(Value::as_u64) != Some(id) {
				continue;
			}
			if let Some(err) = value.get("error") {
				anyhow::bail!("{method} failed: {err}");
			}
			return Ok(value.get("result").cloned().unwrap_or(Value::Null));
		}
		anyhow::bail!("connection closed before response to {method}")
	}

	pub async fn close(mut self) -> anyhow::Result<()> {
		self.stream.close(None).await.context("failed to close websocket")?;
		Ok(())
	}
}

/// Launches a browser server process and polls its debug port until
/// the reusable endpoint is available.
pub(crate) async fn launch_server<D>(driver: &D, spec: &LaunchSpec) -> anyhow::Result<(BrowserHandle, String)>
where
	D: EngineDriver + ?Sized,
{
	let port = reserve_debug_port()?;
	let args = driver.launch_args(spec, port);
	debug!(target = "bootstrap", engine = %driver.kind(), executable = %spec.executable.display(), port, "launching browser server");

	let mut child = Command::new(&spec.executable)
		.args(&args)
		.stdin(Stdio::null())
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.spawn()
		.with_context(|| format!("failed to spawn {}", spec.executable.display()))?;

	let base = format!("http://127.0.0.1:{port}");
	let mut last_error = String::from("endpoint not reachable");
	for _ in 0..LAUNCH_POLL_ATTEMPTS {
		tokio::time::sleep(LAUNCH_POLL_INTERVAL).await;

		if let Some(status) = child.try_wait().context("failed to poll browser process")? {
			anyhow::bail!("browser exited before the debugging endpoint came up (status: {status})");
		}

		match fetch_debugger_endpoint(&base, LAUNCH_POLL_TIMEOUT).await {
			Ok(info) => {
				let endpoint = info.web_socket_debugger_url;
				return Ok((BrowserHandle::Launched { child }, endpoint));
			}
			Err(err) => last_error = err.to_string(),
		}
	}

	anyhow::bail!("debugging endpoint never became available on port {port}: {last_error}")
}

/// Reserves a free loopback port for the debug endpoint. The listener
/// is dropped before the browser binds it; the race window is accepted
/// for a one-shot sequential bootstrap.
fn reserve_debug_port() -> anyhow::Result<u16> {
	let listener = TcpListener::bind(("127.0.0.1", 0)).context("failed to reserve a debug port")?;
	Ok(listener.local_addr()?.port())
}
