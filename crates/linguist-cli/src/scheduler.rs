//! Translation scheduler that delegates each job to an external program.
//!
//! The program receives one JSON object on stdin,
//! `{"translator": id, "engine": {...}, "request": {...}}`, and prints the
//! translated text on stdout. A nonzero exit status is a failed translation
//! and its stderr becomes the error message.

use std::process::Stdio;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use linguist_translators::{
    SchedulerError, TranslateRequest, TranslateScheduler, TranslatorId, TranslatorInfo, TranslatorSet,
};

pub struct CommandScheduler {
    program: Vec<String>,
    timeout: Duration,
    translators: RwLock<TranslatorSet>,
}

#[derive(Serialize)]
struct Job<'a> {
    translator: &'a TranslatorId,
    engine: &'a TranslatorInfo,
    request: &'a TranslateRequest,
}

impl CommandScheduler {
    /// Run `program` (argv form) per job, giving up after `timeout`.
    pub fn new(program: Vec<String>, timeout: Duration) -> Self {
        Self {
            program,
            timeout,
            translators: RwLock::new(TranslatorSet::new()),
        }
    }

    async fn run(&self, job: &Job<'_>) -> Result<String, SchedulerError> {
        let Some((program, args)) = self.program.split_first() else {
            return Err(SchedulerError::Failed("no translator command configured".into()));
        };
        let input = serde_json::to_vec(job).map_err(|e| SchedulerError::Failed(e.to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SchedulerError::Failed(format!("spawning {program}: {e}")))?;

        // Stdin is fed concurrently with output collection, both under the timeout.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(&input).await {
                    debug!(error = %e, "translator closed stdin early");
                }
            }
        };
        let run = async move {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };
        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(output) => output.map_err(|e| SchedulerError::Failed(e.to_string()))?,
            Err(_) => return Err(SchedulerError::Timeout),
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(SchedulerError::Failed(if stderr.is_empty() {
                format!("translator exited with {}", output.status)
            } else {
                stderr
            }));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl TranslateScheduler for CommandScheduler {
    async fn translate(
        &self,
        translator: &TranslatorId,
        request: &TranslateRequest,
    ) -> Result<String, SchedulerError> {
        let engine = self
            .translators
            .read()
            .expect("lock poisoned")
            .get(translator)
            .cloned()
            .ok_or_else(|| SchedulerError::UnknownTranslator(translator.to_string()))?;

        debug!(%translator, from = %request.from, to = %request.to, "running translator command");
        self.run(&Job {
            translator,
            engine: &engine,
            request,
        })
        .await
    }

    fn set_translators(&self, translators: TranslatorSet) {
        debug!(count = translators.len(), "translator set replaced");
        *self.translators.write().expect("lock poisoned") = translators;
    }
}
