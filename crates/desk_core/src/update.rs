use std::collections::BTreeMap;

use crate::intake::check_candidate;
use crate::{
    format_size, AcceptPolicy, AppState, DeskError, Effect, IntakeReport, JobPhase, Msg, Notice,
    RawFile, RejectionKind, RejectionNotice, RejectionNotices,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesDropped(candidates) => take_in(&mut state, candidates),
        Msg::FileRemoved(id) => {
            if state.phase() == JobPhase::Running {
                return (state, Vec::new());
            }
            match state.remove_file(id) {
                Some(name) => vec![Effect::Notify(Notice::info(format!("Removed {name}")))],
                None => Vec::new(),
            }
        }
        Msg::ToolSelected(tool) => {
            if tool == state.tool() {
                return (state, Vec::new());
            }
            // Switching invalidates the selection, including a job in flight.
            let effects: Vec<Effect> = state
                .running_job()
                .map(|job_id| Effect::CancelJob { job_id })
                .into_iter()
                .collect();
            state.switch_tool(tool);
            effects
        }
        Msg::OptionChanged { key, value } => {
            state.set_option(&key, value);
            Vec::new()
        }
        Msg::StartClicked => match state.phase() {
            JobPhase::Running => Vec::new(),
            JobPhase::Completed => vec![Effect::Notify(Notice::info(
                "Start over to run another job",
            ))],
            _ if state.files().is_empty() => vec![Effect::Notify(Notice::error(format!(
                "Cannot start: {}",
                DeskError::EmptyInput
            )))],
            _ => {
                let request = state.begin_job();
                let count = request.inputs.len();
                vec![
                    Effect::Notify(Notice::info(format!(
                        "{}: processing {}",
                        state.tool_spec().label,
                        file_count(count)
                    ))),
                    Effect::SubmitJob(request),
                ]
            }
        },
        Msg::CancelClicked => match state.running_job() {
            Some(job_id) => {
                state.abandon_job();
                vec![
                    Effect::CancelJob { job_id },
                    Effect::Notify(Notice::warning("Job cancelled")),
                ]
            }
            None => Vec::new(),
        },
        Msg::ResetClicked => {
            if matches!(state.phase(), JobPhase::Completed | JobPhase::Failed) {
                state.clear_session();
            }
            Vec::new()
        }
        Msg::DownloadClicked(result_id) => {
            if state.phase() != JobPhase::Completed {
                return (state, Vec::new());
            }
            match state.result(result_id).cloned() {
                Some(result) => vec![
                    Effect::Notify(Notice::info(format!("Downloading {}", result.derived_name))),
                    Effect::Download {
                        results: vec![result],
                    },
                ],
                None => Vec::new(),
            }
        }
        Msg::DownloadAllClicked => {
            if state.phase() != JobPhase::Completed || state.results().is_empty() {
                return (state, Vec::new());
            }
            let results = state.results().to_vec();
            vec![
                Effect::Notify(Notice::info(format!(
                    "Downloading {}",
                    file_count(results.len())
                ))),
                Effect::Download { results },
            ]
        }
        Msg::JobFinished {
            job_id,
            result,
            finished_at,
        } => {
            // Completions for cancelled or superseded jobs are stale.
            if state.running_job() != Some(job_id) {
                return (state, Vec::new());
            }
            let label = state.tool_spec().label;
            match result {
                Ok(results) => {
                    let ready = results.len();
                    state.complete_job(results, finished_at);
                    vec![
                        Effect::Notify(Notice::success(format!(
                            "{label} finished: {} ready",
                            file_count(ready)
                        ))),
                        Effect::PersistHistory(state.history().to_vec()),
                    ]
                }
                Err(err) => {
                    state.fail_job(err.to_string());
                    vec![Effect::Notify(Notice::error(format!("{label} failed: {err}")))]
                }
            }
        }
        Msg::DownloadFinished { result_id, result } => match result {
            Ok(path) => vec![Effect::Notify(Notice::success(format!(
                "Saved {}",
                path.display()
            )))],
            Err(message) => vec![Effect::Notify(Notice::error(format!(
                "Download of result {result_id} failed: {message}"
            )))],
        },
        Msg::RestoreHistory(history) => {
            state.restore_history(history);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn take_in(state: &mut AppState, candidates: Vec<RawFile>) -> Vec<Effect> {
    if candidates.is_empty() {
        return Vec::new();
    }
    match state.phase() {
        JobPhase::Running => {
            return vec![Effect::Notify(Notice::warning(
                "Please wait for the current job to finish",
            ))]
        }
        JobPhase::Completed => {
            return vec![Effect::Notify(Notice::warning(
                "Start over to add more files",
            ))]
        }
        JobPhase::Idle | JobPhase::Validated | JobPhase::Failed => {}
    }

    let policy = state.tool_spec().accept;
    let mut report = IntakeReport::default();
    let mut held = state.files().len();
    for candidate in candidates {
        let verdict = check_candidate(&policy, &candidate).and_then(|()| match policy.max_count {
            Some(max) if held >= max => Err(RejectionKind::TooMany),
            _ => Ok(()),
        });
        match verdict {
            Ok(()) => {
                report.accepted.push(state.accept_file(candidate));
                held += 1;
            }
            Err(kind) => report.rejected.push(RejectionNotice {
                file_name: candidate.name,
                kind,
            }),
        }
    }

    let mut effects = Vec::new();
    if !report.accepted.is_empty() {
        effects.push(Effect::Notify(Notice::success(format!(
            "{} added",
            file_count(report.accepted.len())
        ))));
    }
    effects.extend(
        rejection_notices(state.config().rejection_notices, &policy, &report.rejected)
            .into_iter()
            .map(Effect::Notify),
    );
    state.set_last_intake(report);
    effects
}

fn rejection_notices(
    mode: RejectionNotices,
    policy: &AcceptPolicy,
    rejected: &[RejectionNotice],
) -> Vec<Notice> {
    match mode {
        RejectionNotices::PerFile => rejected
            .iter()
            .map(|notice| {
                Notice::error(format!(
                    "{}: {}",
                    notice.file_name,
                    rejection_error(notice.kind, policy)
                ))
            })
            .collect(),
        RejectionNotices::Coalesced => {
            let mut by_kind: BTreeMap<RejectionKind, usize> = BTreeMap::new();
            for notice in rejected {
                *by_kind.entry(notice.kind).or_default() += 1;
            }
            by_kind
                .into_iter()
                .map(|(kind, count)| {
                    Notice::error(format!(
                        "{} rejected: {}",
                        file_count(count),
                        rejection_error(kind, policy)
                    ))
                })
                .collect()
        }
    }
}

fn rejection_error(kind: RejectionKind, policy: &AcceptPolicy) -> DeskError {
    match kind {
        RejectionKind::UnsupportedType => DeskError::UnsupportedType {
            accepted: policy.describe_extensions(),
        },
        RejectionKind::TooLarge => DeskError::TooLarge {
            limit: format_size(policy.max_size_bytes),
        },
        RejectionKind::TooMany => DeskError::TooMany {
            max_count: policy.max_count.unwrap_or_default(),
        },
    }
}

fn file_count(count: usize) -> String {
    if count == 1 {
        "1 file".to_string()
    } else {
        format!("{count} files")
    }
}
