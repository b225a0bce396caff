use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use desk_core::{
    update, AppState, JobOptions, JobPhase, Msg, OptionValue, PreviewRegistry, RawFile, ToolKey,
    ToolSpec,
};
use desk_logging::{desk_debug, desk_info, desk_warn};

use crate::config::DeskConfig;
use crate::effects::EffectRunner;
use crate::{persistence, render};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// What `pdfdesk run` was asked to do.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub tool: ToolKey,
    pub settings: Vec<String>,
    pub files: Vec<PathBuf>,
    pub out: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub download: bool,
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
}

impl Session {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            desk_debug!("State now {:?}", state.phase());
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Feeds engine messages into `update` until `done` holds or `deadline`
    /// passes. Returns whether `done` was reached.
    fn pump_until(
        &mut self,
        deadline: Option<Instant>,
        mut done: impl FnMut(&Msg) -> bool,
    ) -> anyhow::Result<bool> {
        loop {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Ok(false);
            }
            match self.msg_rx.recv_timeout(POLL_INTERVAL) {
                Ok(msg) => {
                    let finished = done(&msg);
                    self.dispatch(msg);
                    if finished {
                        return Ok(true);
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    bail!("engine stopped unexpectedly")
                }
            }
        }
    }
}

/// Runs one job end to end: intake, options, start, wait, download.
pub fn run(config: &DeskConfig, request: RunRequest) -> anyhow::Result<()> {
    let spec = request.tool.spec();
    let assignments = request
        .settings
        .iter()
        .map(|raw| parse_assignment(spec, raw))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let files = request
        .files
        .iter()
        .map(PathBuf::as_path)
        .map(read_file)
        .collect::<anyhow::Result<Vec<_>>>()?;

    let download_dir = request
        .out
        .clone()
        .unwrap_or_else(|| config.download_dir.clone());
    let (msg_tx, msg_rx) = mpsc::channel();
    let runner = EffectRunner::new(
        config.engine_config(download_dir),
        config.history_dir.clone(),
        msg_tx,
    );
    let previews = Arc::new(PreviewRegistry::new());
    let mut session = Session {
        state: AppState::with_services(
            request.tool,
            config.controller_config(),
            previews.clone(),
        ),
        runner,
        msg_rx,
    };

    session.dispatch(Msg::RestoreHistory(persistence::load_history(
        &config.history_dir,
    )));
    for (key, value) in assignments {
        session.dispatch(Msg::OptionChanged { key, value });
    }
    session.dispatch(Msg::FilesDropped(files));
    session.dispatch(Msg::StartClicked);

    let mut timed_out = false;
    if let Some(job_id) = session.state.running_job() {
        let deadline = request.timeout.map(|timeout| Instant::now() + timeout);
        let finished = session.pump_until(deadline, |msg| {
            matches!(msg, Msg::JobFinished { job_id: id, .. } if *id == job_id)
        })?;
        if !finished {
            desk_warn!("Job {} timed out; cancelling", job_id);
            session.dispatch(Msg::CancelClicked);
            timed_out = true;
        }
    }

    if session.state.phase() == JobPhase::Completed && request.download {
        let mut pending = session.state.results().len();
        session.dispatch(Msg::DownloadAllClicked);
        let deadline = Some(Instant::now() + DOWNLOAD_TIMEOUT);
        let drained = session.pump_until(deadline, |msg| {
            if matches!(msg, Msg::DownloadFinished { .. }) {
                pending = pending.saturating_sub(1);
            }
            pending == 0
        })?;
        if !drained {
            desk_warn!("Gave up waiting for downloads");
        }
    }

    let view = session.state.view();
    render::summary(&view);
    session.runner.shutdown();
    drop(session);
    desk_info!(
        "Session ended; previews created={} released={}",
        previews.created(),
        previews.released()
    );

    match view.phase {
        JobPhase::Completed => Ok(()),
        JobPhase::Failed => bail!(view
            .error_banner
            .unwrap_or_else(|| "job failed".to_string())),
        _ if timed_out => bail!("job did not finish in time and was cancelled"),
        _ => bail!("no job was run"),
    }
}

pub fn print_history(config: &DeskConfig, json: bool) -> anyhow::Result<()> {
    let history = persistence::load_history(&config.history_dir);
    if json {
        println!("{}", persistence::history_json(&history)?);
    } else {
        render::history(&history);
    }
    Ok(())
}

fn read_file(path: &Path) -> anyhow::Result<RawFile> {
    let blob = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;
    Ok(RawFile::new(name, blob))
}

/// `quality=high` into a typed option for `spec`.
fn parse_assignment(spec: &ToolSpec, raw: &str) -> anyhow::Result<(String, OptionValue)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    let kind = spec
        .option_kind(key)
        .ok_or_else(|| anyhow!("{} has no option '{key}'", spec.key))?;
    let value = OptionValue::parse_for(kind, value)
        .ok_or_else(|| anyhow!("invalid value '{}' for option '{key}'", value.trim()))?;
    if !JobOptions::defaults_for(spec).set(spec, key, value.clone()) {
        bail!("invalid value '{value}' for option '{key}'");
    }
    Ok((key.to_string(), value))
}
