//! Bloch lab daemon - drives the two-qubit lab demonstration
//!
//! The daemon owns the shared lab state, runs one render-loop task per
//! indicator, and exposes the user-facing controls (run triggers, animation
//! toggle, reset, viewport resize, state snapshot) over a JSON-lines IPC
//! socket. Circuit execution is delegated to an external HTTP backend.
//!
//! Configuration (environment):
//! - `BLOCHLAB_LISTEN`: IPC listen address (default 127.0.0.1:9341)
//! - `BLOCHLAB_BACKEND`: circuit backend endpoint
//!   (default http://127.0.0.1:5000/api/run_circuit)
//! - `BLOCHLAB_ANIMATE`: set to 0 to start with pulse animation disabled

use std::env;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, RwLock};
use tokio::time;
use tracing::{error, info};

use blochlab::backend::HttpCircuitBackend;
use blochlab::lab::{ExperimentController, LabState, QUBIT_COUNT};
use blochlab::render::{HeadlessScene, RenderLoop, ViewportSize, DEFAULT_FPS};

// ═══════════════════════════════════════════════════════════════════════════
// Protocol Messages
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Request {
    GetState,
    Run { shots: u32 },
    SetAnimation { enabled: bool },
    Resize { width: u32, height: u32 },
    Reset,
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Response {
    State(LabState),
    Success { message: String },
    Error { message: String },
}

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
struct LabConfig {
    listen_addr: String,
    backend_endpoint: String,
    animation_enabled: bool,
    viewport: ViewportSize,
}

impl LabConfig {
    fn from_env() -> Self {
        let listen_addr =
            env::var("BLOCHLAB_LISTEN").unwrap_or_else(|_| "127.0.0.1:9341".to_string());
        let backend_endpoint = env::var("BLOCHLAB_BACKEND")
            .unwrap_or_else(|_| "http://127.0.0.1:5000/api/run_circuit".to_string());
        let animation_enabled = env::var("BLOCHLAB_ANIMATE")
            .map(|v| v != "0")
            .unwrap_or(true);

        Self {
            listen_addr,
            backend_endpoint,
            animation_enabled,
            viewport: ViewportSize {
                width: 640,
                height: 480,
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Client Handler
// ═══════════════════════════════════════════════════════════════════════════

struct Lab {
    state: Arc<RwLock<LabState>>,
    controller: ExperimentController<HttpCircuitBackend>,
    viewport_tx: watch::Sender<ViewportSize>,
}

async fn handle_client(
    stream: TcpStream,
    lab: Arc<Lab>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let request: Request = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                let resp = Response::Error {
                    message: format!("Invalid request: {}", e),
                };
                writer
                    .write_all(serde_json::to_string(&resp)?.as_bytes())
                    .await?;
                writer.write_all(b"\n").await?;
                continue;
            }
        };

        let response = match request {
            Request::GetState => {
                let s = lab.state.read().await;
                Response::State(s.clone())
            }
            Request::Run { shots } => match lab.controller.run(shots).await {
                Ok(()) => {
                    // The final status line carries the outcome summary.
                    let s = lab.state.read().await;
                    Response::Success {
                        message: s.status.clone(),
                    }
                }
                Err(e) => Response::Error {
                    message: e.to_string(),
                },
            },
            Request::SetAnimation { enabled } => {
                let mut s = lab.state.write().await;
                s.animation_enabled = enabled;
                Response::Success {
                    message: format!(
                        "Pulse animation {}",
                        if enabled { "enabled" } else { "disabled" }
                    ),
                }
            }
            Request::Resize { width, height } => {
                match lab.viewport_tx.send(ViewportSize { width, height }) {
                    Ok(()) => Response::Success {
                        message: format!("Viewport resized to {}x{}", width, height),
                    },
                    Err(e) => Response::Error {
                        message: format!("Resize failed: {}", e),
                    },
                }
            }
            Request::Reset => {
                let mut s = lab.state.write().await;
                s.reset();
                Response::Success {
                    message: s.status.clone(),
                }
            }
            Request::Shutdown => {
                info!("Shutdown requested");
                tokio::spawn(async {
                    // Give the response a moment to flush before exiting.
                    time::sleep(Duration::from_millis(50)).await;
                    std::process::exit(0);
                });
                Response::Success {
                    message: "Shutting down".to_string(),
                }
            }
        };

        writer
            .write_all(serde_json::to_string(&response)?.as_bytes())
            .await?;
        writer.write_all(b"\n").await?;
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Main
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = LabConfig::from_env();
    info!("Circuit backend: {}", config.backend_endpoint);

    // Reset semantics initialize the state: vectors up, everything cleared.
    let state = Arc::new(RwLock::new(LabState::new(config.animation_enabled)));

    let (viewport_tx, viewport_rx) = watch::channel(config.viewport);

    // One unbounded render task per indicator; never awaited, never paused.
    for qubit in 0..QUBIT_COUNT {
        let _task = RenderLoop::new(DEFAULT_FPS).spawn(
            HeadlessScene::new(),
            qubit,
            Arc::clone(&state),
            viewport_rx.clone(),
        );
    }

    let controller = ExperimentController::new(
        Arc::clone(&state),
        HttpCircuitBackend::new(config.backend_endpoint),
    );
    let lab = Arc::new(Lab {
        state,
        controller,
        viewport_tx,
    });

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("Bloch lab daemon listening on {}", config.listen_addr);

    loop {
        let (stream, addr) = listener.accept().await?;
        info!("Client connected: {}", addr);
        let lab = Arc::clone(&lab);

        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, lab).await {
                error!("Client handler error: {}", e);
            }
        });
    }
}
