use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use desk_core::{FileId, JobInput, JobOptions, JobRequest, OptionValue, ResultId, ToolKey};
use desk_engine::{
    ConversionBackend, EngineEvent, FailureKind, JobStatus, ProgressSink, SimulatedBackend,
    SimulationSettings,
};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

const MB: u64 = 1024 * 1024;

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn request(tool: ToolKey, files: &[(&str, u64)]) -> JobRequest {
    JobRequest {
        job_id: 7,
        tool,
        inputs: files
            .iter()
            .zip(1..)
            .map(|((name, size_bytes), id)| JobInput {
                file_id: FileId(id),
                name: name.to_string(),
                size_bytes: *size_bytes,
                mime_type: None,
                blob: Bytes::new(),
            })
            .collect(),
        options: JobOptions::defaults_for(tool.spec()),
    }
}

fn slow() -> SimulationSettings {
    SimulationSettings {
        base_delay: Duration::from_secs(30),
        max_delay: Duration::from_secs(30),
        ..SimulationSettings::default()
    }
}

#[tokio::test]
async fn run_produces_results_and_reports_progress() {
    let backend = SimulatedBackend::new(SimulationSettings::instant());
    let sink = TestSink::default();
    let mut request = request(ToolKey::ExcelToPdf, &[("invoice.xlsx", 2 * MB), ("q.csv", 100)]);
    request.options.set(
        ToolKey::ExcelToPdf.spec(),
        "quality",
        OptionValue::Choice("high".into()),
    );

    let results = backend
        .run(&request, &sink, &CancellationToken::new())
        .await
        .expect("run ok");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].derived_name, "invoice.pdf");
    assert_eq!(results[0].derived_size_bytes, 3 * MB);
    assert_eq!(results[1].id, ResultId { job_id: 7, index: 1 });

    let progress: Vec<_> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Job {
                status: JobStatus::Running { processed, total },
                ..
            } => Some((processed, total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(1, 2), (2, 2)]);
}

#[tokio::test]
async fn empty_request_fails_fast() {
    let backend = SimulatedBackend::new(slow());
    let err = backend
        .run(
            &request(ToolKey::Compress, &[]),
            &TestSink::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, FailureKind::EmptyInput);
}

#[tokio::test]
async fn cancellation_interrupts_the_delay() {
    let backend = SimulatedBackend::new(slow());
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        backend.run(&request(ToolKey::Compress, &[("a.pdf", 10)]), &TestSink::default(), &token),
    )
    .await
    .expect("cancellation should end the run");
    assert_eq!(outcome.unwrap_err(), FailureKind::Cancelled);
}

#[tokio::test]
async fn injected_failure_surfaces_as_processing_error() {
    let backend = SimulatedBackend::new(SimulationSettings {
        inject_failure: Some("converter crashed".into()),
        ..SimulationSettings::instant()
    });
    let err = backend
        .run(
            &request(ToolKey::Sign, &[("a.pdf", 10)]),
            &TestSink::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, FailureKind::Processing("converter crashed".into()));
}

#[tokio::test]
async fn fetch_result_only_serves_issued_results() {
    let backend = SimulatedBackend::new(SimulationSettings::instant());
    let results = backend
        .run(
            &request(ToolKey::PdfToWord, &[("report.pdf", 1000)]),
            &TestSink::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let blob = backend.fetch_result(&results[0]).await.unwrap();
    let text = String::from_utf8(blob.to_vec()).unwrap();
    assert!(text.contains("name: report.docx"));
    assert!(text.contains("size: 800 bytes"));

    let mut forged = results[0].clone();
    forged.id = ResultId { job_id: 99, index: 0 };
    assert_eq!(
        backend.fetch_result(&forged).await.unwrap_err(),
        FailureKind::UnknownResult(forged.id)
    );
}

#[tokio::test]
async fn a_new_job_replaces_the_issued_results() {
    let backend = SimulatedBackend::new(SimulationSettings::instant());
    let first = backend
        .run(
            &request(ToolKey::Compress, &[("scan.pdf", 4 * MB)]),
            &TestSink::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let mut next = request(ToolKey::Compress, &[("deck.pdf", 2 * MB)]);
    next.job_id = 8;
    let second = backend
        .run(&next, &TestSink::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        backend.fetch_result(&first[0]).await.unwrap_err(),
        FailureKind::UnknownResult(first[0].id)
    );
    assert!(backend.fetch_result(&second[0]).await.is_ok());
}
