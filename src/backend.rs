//! Circuit-execution backend client and wire types.
//!
//! The backend runs the actual two-qubit circuit (H on q0, CNOT q0→q1,
//! measure all) and returns per-outcome probabilities as percentages. This
//! crate never computes probabilities itself.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LabError;

/// The two-bit outcome keys, in display order.
pub const OUTCOME_KEYS: [&str; 4] = ["00", "01", "10", "11"];

/// Request body for `POST /api/run_circuit`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunRequest {
    pub shots: u32,
}

/// Measurement probabilities per two-bit outcome, in percent [0, 100].
///
/// Keys missing from the wire form default to 0 rather than failing the
/// parse. Values are trusted from the backend; this core does not enforce
/// that they sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OutcomeDistribution {
    #[serde(rename = "00", default)]
    pub p00: f64,
    #[serde(rename = "01", default)]
    pub p01: f64,
    #[serde(rename = "10", default)]
    pub p10: f64,
    #[serde(rename = "11", default)]
    pub p11: f64,
}

impl OutcomeDistribution {
    /// Probability for one outcome key. Unknown keys read as 0.
    pub fn get(&self, key: &str) -> f64 {
        match key {
            "00" => self.p00,
            "01" => self.p01,
            "10" => self.p10,
            "11" => self.p11,
            _ => 0.0,
        }
    }
}

/// Wire shape of the backend response. The service replies either with
/// `results` or, on an internal failure, with an `error` message.
#[derive(Debug, Deserialize)]
struct RunCircuitResponse {
    #[serde(default)]
    results: Option<OutcomeDistribution>,
    #[serde(default)]
    error: Option<String>,
}

/// Circuit execution service returning measurement probabilities.
///
/// One request/response per run; no retries, no streaming.
pub trait CircuitBackend: Send + Sync + 'static {
    fn run_circuit(
        &self,
        shots: u32,
    ) -> impl Future<Output = Result<OutcomeDistribution, LabError>> + Send;
}

/// HTTP client for the circuit backend.
///
/// The request itself is blocking (`ureq`), so it runs on the blocking
/// thread pool to keep the render loops and IPC handlers responsive.
#[derive(Debug, Clone)]
pub struct HttpCircuitBackend {
    endpoint: String,
    timeout: Duration,
}

impl HttpCircuitBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn post_run(&self, shots: u32) -> Result<OutcomeDistribution, LabError> {
        let response = ureq::post(&self.endpoint)
            .timeout(self.timeout)
            .set("Content-Type", "application/json")
            .send_json(RunRequest { shots })
            .map_err(|err| match err {
                ureq::Error::Status(code, _) => {
                    LabError::Backend(format!("backend returned status {code}"))
                }
                ureq::Error::Transport(transport) => {
                    LabError::Backend(format!("transport error: {transport}"))
                }
            })?;

        let body: RunCircuitResponse = response
            .into_json()
            .map_err(|err| LabError::Backend(format!("invalid JSON response: {err}")))?;

        if let Some(message) = body.error {
            return Err(LabError::Backend(message));
        }
        Ok(body.results.unwrap_or_default())
    }
}

impl CircuitBackend for HttpCircuitBackend {
    async fn run_circuit(&self, shots: u32) -> Result<OutcomeDistribution, LabError> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.post_run(shots))
            .await
            .map_err(|err| LabError::Backend(format!("backend task failed: {err}")))?
    }
}
