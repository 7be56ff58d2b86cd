//! Answer generation behind a subprocess worker boundary.
//!
//! The generation worker is invoked as
//! `sabaq-generate-worker <payload_json_path>` with a payload of
//! `{"prompt": str, "max_new_tokens": int}`. On success it prints
//! `{"generated_text": str}` to stdout; on failure `{"error": str}`.
//! Exit code 0 means success, 2 means no payload was provided, 3 means
//! a runtime failure.

use sabaq_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

/// Worker exited successfully.
pub const EXIT_OK: i32 = 0;

/// Worker was invoked without a payload file.
pub const EXIT_NO_PAYLOAD: i32 = 2;

/// Worker failed while generating.
pub const EXIT_RUNTIME_FAILURE: i32 = 3;

/// Payload handed to the generation worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePayload {
    /// Fully rendered prompt
    pub prompt: String,

    /// Token budget for the answer
    pub max_new_tokens: u32,
}

/// Single-line JSON the worker prints to stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Trait for answer generation backends.
///
/// The RAG engine only sees this seam, so tests can substitute a
/// counting or failing generator.
#[async_trait::async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer for a fully rendered prompt.
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> AppResult<String>;
}

/// Generator that runs each request in a dedicated worker process.
///
/// Crashes inside the model runtime are contained in the worker; the
/// caller sees an error and applies its own degrade policy. Workers are
/// killed at the timeout; there is no mid-flight cancellation.
pub struct WorkerGenerator {
    worker_path: PathBuf,
    timeout: Duration,
    envs: Vec<(String, String)>,
}

impl WorkerGenerator {
    pub fn new(worker_path: PathBuf, timeout: Duration) -> Self {
        Self {
            worker_path,
            timeout,
            envs: Vec::new(),
        }
    }

    /// Environment variables forwarded to the worker process
    /// (e.g. `SABAQ_GEN_ENDPOINT`, `SABAQ_GEN_MODEL`).
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for WorkerGenerator {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> AppResult<String> {
        let payload = GeneratePayload {
            prompt: prompt.to_string(),
            max_new_tokens,
        };

        // Payload goes through a temp file, mirroring the insert worker
        let mut payload_file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .map_err(|e| AppError::Generation(format!("Failed to create payload file: {}", e)))?;
        payload_file
            .write_all(serde_json::to_string(&payload)?.as_bytes())
            .map_err(|e| AppError::Generation(format!("Failed to write payload: {}", e)))?;
        payload_file
            .flush()
            .map_err(|e| AppError::Generation(format!("Failed to flush payload: {}", e)))?;

        let mut cmd = tokio::process::Command::new(&self.worker_path);
        cmd.arg(payload_file.path())
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            AppError::Generation(format!(
                "Failed to spawn generation worker {:?}: {}",
                self.worker_path, e
            ))
        })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AppError::Generation(format!(
                    "Generation worker timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::Generation(format!("Generation worker I/O failure: {}", e)))?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let diagnostics = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(AppError::Generation(format!(
                "Generation worker failed with code {}: {}",
                code,
                diagnostics.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: GenerateOutput = serde_json::from_str(stdout.trim()).map_err(|e| {
            AppError::Generation(format!(
                "Generation worker returned invalid output: {} ({})",
                stdout.trim(),
                e
            ))
        })?;

        if let Some(error) = parsed.error {
            return Err(AppError::Generation(format!(
                "Generation worker reported: {}",
                error
            )));
        }

        parsed
            .generated_text
            .map(|text| text.trim().to_string())
            .ok_or_else(|| {
                AppError::Generation("Generation worker output missing generated_text".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn script_worker(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("worker.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_worker_is_error() {
        let generator = WorkerGenerator::new(
            PathBuf::from("/nonexistent/sabaq-generate-worker"),
            Duration::from_secs(1),
        );
        assert!(generator.generate("prompt", 16).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_worker_output() {
        let temp = tempfile::TempDir::new().unwrap();
        let worker = script_worker(
            temp.path(),
            r#"echo '{"generated_text": "Photosynthesis makes food."}'"#,
        );

        let generator = WorkerGenerator::new(worker, Duration::from_secs(5));
        let answer = generator.generate("prompt", 16).await.unwrap();
        assert_eq!(answer, "Photosynthesis makes food.");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_worker_error_output() {
        let temp = tempfile::TempDir::new().unwrap();
        let worker = script_worker(temp.path(), r#"echo '{"error": "model not found"}'"#);

        let generator = WorkerGenerator::new(worker, Duration::from_secs(5));
        let err = generator.generate("prompt", 16).await.unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_malformed_worker_output() {
        let temp = tempfile::TempDir::new().unwrap();
        let worker = script_worker(temp.path(), "echo not-json");

        let generator = WorkerGenerator::new(worker, Duration::from_secs(5));
        assert!(generator.generate("prompt", 16).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let worker = script_worker(temp.path(), "echo boom >&2\nexit 3");

        let generator = WorkerGenerator::new(worker, Duration::from_secs(5));
        let err = generator.generate("prompt", 16).await.unwrap_err();
        assert!(err.to_string().contains("code 3"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let worker = script_worker(temp.path(), "sleep 5");

        let generator = WorkerGenerator::new(worker, Duration::from_millis(100));
        let err = generator.generate("prompt", 16).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_payload_serialization() {
        let payload = GeneratePayload {
            prompt: "Context: ...".to_string(),
            max_new_tokens: 256,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"max_new_tokens\":256"));
    }
}
