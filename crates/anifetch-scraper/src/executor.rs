//! Subprocess invoker for the external scraper scripts.
//!
//! Each invocation spawns one child with the kind-specific script and the
//! task's primary parameter, waits for it under a hard deadline and buffers
//! both output streams. Dropping the wait kills the child.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anifetch_core::{AcquisitionTask, RawAcquisitionResult, TaskKind};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::error::ScraperError;

/// Default interpreter for the scraper scripts.
#[cfg(windows)]
pub const DEFAULT_PROGRAM: &str = "python";
#[cfg(not(windows))]
pub const DEFAULT_PROGRAM: &str = "python3";

/// Script file name per task kind, relative to the scripts root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLayout {
    pub latest: String,
    pub search: String,
    pub episodes: String,
    pub video: String,
}

impl Default for ScriptLayout {
    fn default() -> Self {
        Self {
            latest: "crawler_latest.py".to_string(),
            search: "crawler_search.py".to_string(),
            episodes: "crawler_episodes.py".to_string(),
            video: "crawler_video.py".to_string(),
        }
    }
}

impl ScriptLayout {
    pub fn script_for(&self, kind: TaskKind) -> &str {
        match kind {
            TaskKind::Latest => &self.latest,
            TaskKind::Search => &self.search,
            TaskKind::Episodes => &self.episodes,
            TaskKind::Video => &self.video,
        }
    }

    pub fn set(&mut self, kind: TaskKind, script: impl Into<String>) {
        let slot = match kind {
            TaskKind::Latest => &mut self.latest,
            TaskKind::Search => &mut self.search,
            TaskKind::Episodes => &mut self.episodes,
            TaskKind::Video => &mut self.video,
        };
        *slot = script.into();
    }
}

/// Runs scraper scripts as bounded child processes.
#[derive(Debug, Clone)]
pub struct ScraperExecutor {
    /// Interpreter or executable that runs the scripts.
    program: String,

    /// Working directory of the child; scripts are resolved against it.
    scripts_root: PathBuf,

    scripts: ScriptLayout,

    /// Additional environment variables.
    env_vars: Vec<(String, String)>,
}

impl ScraperExecutor {
    /// Create an executor running `program` inside `scripts_root`.
    pub fn new(program: impl Into<String>, scripts_root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            scripts_root: scripts_root.into(),
            scripts: ScriptLayout::default(),
            env_vars: Vec::new(),
        }
    }

    pub fn with_scripts(mut self, scripts: ScriptLayout) -> Self {
        self.scripts = scripts;
        self
    }

    /// Override the script used for one task kind.
    pub fn with_script(mut self, kind: TaskKind, script: impl Into<String>) -> Self {
        self.scripts.set(kind, script);
        self
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    pub fn script_path(&self, kind: TaskKind) -> PathBuf {
        self.scripts_root.join(self.scripts.script_for(kind))
    }

    /// Run the scraper for `task` under the task's own timeout.
    pub async fn invoke(&self, task: &AcquisitionTask) -> Result<RawAcquisitionResult, ScraperError> {
        self.invoke_within(task, task.timeout()).await
    }

    /// Run the scraper for `task`, killing it once `budget` has elapsed.
    ///
    /// Returns a timed-out result rather than an error when the deadline
    /// fires; partial output is discarded.
    pub async fn invoke_within(
        &self,
        task: &AcquisitionTask,
        budget: Duration,
    ) -> Result<RawAcquisitionResult, ScraperError> {
        let script = self.script_path(task.kind());
        if !script.is_file() {
            error!(task_id = %task.id(), script = %script.display(), "Scraper script missing");
            return Err(ScraperError::MissingScript(script));
        }

        let mut cmd = Command::new(&self.program);
        cmd.arg(self.scripts.script_for(task.kind()));
        if let Some(param) = task.primary_param() {
            cmd.arg(param);
        }

        // CJK payloads must survive the pipe intact
        cmd.env("PYTHONIOENCODING", "utf-8").env("PYTHONUTF8", "1");
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(&self.scripts_root)
            .kill_on_drop(true);

        debug!(task_id = %task.id(), "Full command: {:?}", cmd);

        let started = Instant::now();
        let child = cmd.spawn().map_err(|source| {
            error!(
                task_id = %task.id(),
                program = %self.program,
                error = %source,
                "Failed to spawn scraper"
            );
            ScraperError::Spawn {
                program: self.program.clone(),
                source,
            }
        })?;

        info!(
            task_id = %task.id(),
            kind = %task.kind(),
            pid = child.id().unwrap_or_default(),
            budget_ms = budget.as_millis() as u64,
            "Scraper spawned"
        );

        match tokio::time::timeout(budget, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                // Killed by a signal
                let exit_code = output.status.code().unwrap_or(-1);
                info!(
                    task_id = %task.id(),
                    exit_code,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    stdout_len = output.stdout.len(),
                    "Scraper exited"
                );
                Ok(RawAcquisitionResult::completed(
                    exit_code,
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr),
                ))
            }
            Ok(Err(e)) => {
                error!(task_id = %task.id(), error = %e, "Error waiting for scraper");
                Err(ScraperError::Io(e))
            }
            Err(_) => {
                warn!(
                    task_id = %task.id(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Scraper timed out, killed"
                );
                Ok(RawAcquisitionResult::timed_out())
            }
        }
    }
}
