use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use desk_core::{FileId, JobInput, JobOptions, JobRequest, ToolKey};
use desk_engine::{
    EngineConfig, EngineEvent, EngineHandle, EngineStopped, FailureKind, JobStatus,
    SimulationSettings,
};
use tempfile::TempDir;

fn init_logging() {
    desk_logging::initialize_for_tests();
}

fn request(job_id: u64, tool: ToolKey, names: &[&str]) -> JobRequest {
    JobRequest {
        job_id,
        tool,
        inputs: names
            .iter()
            .zip(1..)
            .map(|(name, id)| JobInput {
                file_id: FileId(id),
                name: name.to_string(),
                size_bytes: 1024,
                mime_type: None,
                blob: Bytes::from_static(b"%PDF-1.7"),
            })
            .collect(),
        options: JobOptions::defaults_for(tool.spec()),
    }
}

fn config(dir: &TempDir, simulation: SimulationSettings) -> EngineConfig {
    let mut config = EngineConfig::default_with_output(dir.path().join("downloads"));
    config.simulation = simulation;
    config.finished_utc = Some(Arc::new(|| "2026-10-18T12:00:00Z".to_string()));
    config
}

/// Collects events until `done` matches one or the deadline passes.
fn wait_for(engine: &EngineHandle, done: impl Fn(&EngineEvent) -> bool) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        match engine.recv_timeout(Duration::from_millis(50)) {
            Ok(Some(event)) => {
                let finished = done(&event);
                events.push(event);
                if finished {
                    break;
                }
            }
            Ok(None) => {}
            Err(EngineStopped) => break,
        }
    }
    events
}

fn is_terminal(event: &EngineEvent) -> bool {
    matches!(
        event,
        EngineEvent::Job {
            status: JobStatus::Completed { .. } | JobStatus::Failed(_),
            ..
        }
    )
}

#[test]
fn submitted_job_reports_running_then_completed() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let engine = EngineHandle::new(config(&temp, SimulationSettings::instant()));

    engine.submit(request(1, ToolKey::PdfToWord, &["a.pdf"]));
    let events = wait_for(&engine, is_terminal);

    assert!(matches!(
        events.first(),
        Some(EngineEvent::Job {
            job_id: 1,
            status: JobStatus::Running { processed: 0, total: 1 }
        })
    ));
    match events.last() {
        Some(EngineEvent::Job {
            job_id: 1,
            status: JobStatus::Completed {
                results,
                finished_at,
            },
        }) => {
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].derived_name, "a.docx");
            assert_eq!(finished_at.as_deref(), Some("2026-10-18T12:00:00Z"));
        }
        other => panic!("expected completion, got {other:?}"),
    }
    engine.shutdown();
}

fn slow() -> SimulationSettings {
    SimulationSettings {
        base_delay: Duration::from_secs(60),
        max_delay: Duration::from_secs(60),
        ..SimulationSettings::default()
    }
}

#[test]
fn cancel_stops_a_slow_job() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let engine = EngineHandle::new(config(&temp, slow()));

    engine.submit(request(3, ToolKey::Compress, &["big.pdf"]));
    std::thread::sleep(Duration::from_millis(50));
    engine.cancel(3);

    let events = wait_for(&engine, is_terminal);
    assert!(matches!(
        events.last(),
        Some(EngineEvent::Job {
            job_id: 3,
            status: JobStatus::Failed(FailureKind::Cancelled)
        })
    ));
    engine.shutdown();
}

#[test]
fn download_all_writes_distinct_files() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let engine = EngineHandle::new(config(&temp, SimulationSettings::instant()));

    engine.submit(request(5, ToolKey::PdfToImage, &["scan.pdf", "scan.PDF"]));
    let results = match wait_for(&engine, is_terminal).pop() {
        Some(EngineEvent::Job {
            status: JobStatus::Completed { results, .. },
            ..
        }) => results,
        other => panic!("expected completion, got {other:?}"),
    };
    assert!(results.iter().all(|r| r.derived_name == "scan.jpg"));

    engine.download(results);
    let mut paths = Vec::new();
    for _ in 0..2 {
        let events = wait_for(&engine, |event| matches!(event, EngineEvent::Download { .. }));
        match events.last() {
            Some(EngineEvent::Download { result: Ok(path), .. }) => paths.push(path.clone()),
            other => panic!("expected download, got {other:?}"),
        }
    }

    let mut names: Vec<_> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["scan (1).jpg".to_string(), "scan.jpg".to_string()]);
    assert!(paths.iter().all(|p| p.is_file()));
    engine.shutdown();
}

#[test]
fn shutdown_cancels_running_jobs_then_reports_stopped() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let engine = EngineHandle::new(config(&temp, slow()));

    engine.submit(request(9, ToolKey::Sign, &["lease.pdf"]));
    let started = wait_for(&engine, |event| {
        matches!(event, EngineEvent::Job { status: JobStatus::Running { .. }, .. })
    });
    assert!(!started.is_empty());
    engine.shutdown();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut events = Vec::new();
    loop {
        assert!(Instant::now() < deadline, "engine never reported stopping");
        match engine.recv_timeout(Duration::from_millis(50)) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {}
            Err(EngineStopped) => break,
        }
    }
    assert!(events.contains(&EngineEvent::Job {
        job_id: 9,
        status: JobStatus::Failed(FailureKind::Cancelled),
    }));

    // Once stopped, receives fail at once instead of reporting "no event yet".
    let polled = Instant::now();
    for _ in 0..5 {
        assert_eq!(engine.recv_timeout(Duration::from_millis(50)), Err(EngineStopped));
    }
    assert!(polled.elapsed() < Duration::from_millis(250));
}
