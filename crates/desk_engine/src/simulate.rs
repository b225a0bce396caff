use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use desk_core::{format_size, plan_results, JobRequest, ResultFile, ResultId};
use desk_logging::{desk_debug, desk_info};
use tokio_util::sync::CancellationToken;

use crate::backend::{ConversionBackend, ProgressSink};
use crate::{EngineEvent, FailureKind, JobStatus};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSettings {
    pub base_delay: Duration,
    pub per_megabyte_delay: Duration,
    pub max_delay: Duration,
    /// When set, every job fails with this message after its delay.
    pub inject_failure: Option<String>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(2000),
            per_megabyte_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            inject_failure: None,
        }
    }
}

impl SimulationSettings {
    /// Settings with no artificial delay, for tests and dry runs.
    pub fn instant() -> Self {
        Self {
            base_delay: Duration::ZERO,
            per_megabyte_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            inject_failure: None,
        }
    }

    pub fn delay_for(&self, total_bytes: u64) -> Duration {
        let megabytes = total_bytes as f64 / BYTES_PER_MEGABYTE;
        let scaled_secs = self.per_megabyte_delay.as_secs_f64() * megabytes;
        let headroom = self.max_delay.saturating_sub(self.base_delay).as_secs_f64();
        if scaled_secs >= headroom {
            return self.max_delay;
        }
        (self.base_delay + Duration::from_secs_f64(scaled_secs)).min(self.max_delay)
    }
}

/// Stand-in for a conversion service: waits, then derives results from the
/// request without touching file content.
#[derive(Debug, Default)]
pub struct SimulatedBackend {
    settings: SimulationSettings,
    issued: Mutex<HashMap<ResultId, ResultFile>>,
}

impl SimulatedBackend {
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            settings,
            issued: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl ConversionBackend for SimulatedBackend {
    async fn run(
        &self,
        request: &JobRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResultFile>, FailureKind> {
        let total = request.inputs.len();
        if total == 0 {
            return Err(FailureKind::EmptyInput);
        }
        let total_bytes: u64 = request.inputs.iter().map(|input| input.size_bytes).sum();
        let delay = self.settings.delay_for(total_bytes);
        desk_debug!(
            "Simulating job {} tool={} inputs={} size={} delay={:?}",
            request.job_id,
            request.tool,
            total,
            format_size(total_bytes),
            delay
        );

        // Spread the delay over the inputs so progress advances per file.
        let step = delay / total as u32;
        for processed in 1..=total {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FailureKind::Cancelled),
                _ = tokio::time::sleep(step) => {}
            }
            sink.emit(EngineEvent::Job {
                job_id: request.job_id,
                status: JobStatus::Running { processed, total },
            });
        }

        if let Some(message) = &self.settings.inject_failure {
            return Err(FailureKind::Processing(message.clone()));
        }

        let results = plan_results(request.tool, request.job_id, &request.inputs, &request.options);
        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the latest job's results stay downloadable.
        issued.clear();
        for result in &results {
            issued.insert(result.id, result.clone());
        }
        desk_info!("Job {} produced {} result(s)", request.job_id, results.len());
        Ok(results)
    }

    async fn fetch_result(&self, result: &ResultFile) -> Result<Bytes, FailureKind> {
        let issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        let known = issued
            .get(&result.id)
            .ok_or(FailureKind::UnknownResult(result.id))?;
        // Placeholder content; no real conversion happens.
        let body = format!(
            "pdfdesk simulated output\nresult: {}\nname: {}\nsize: {} bytes\n",
            known.id, known.derived_name, known.derived_size_bytes
        );
        Ok(Bytes::from(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_scales_with_size_and_is_capped() {
        let settings = SimulationSettings {
            base_delay: Duration::from_millis(100),
            per_megabyte_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(400),
            inject_failure: None,
        };
        assert_eq!(settings.delay_for(0), Duration::from_millis(100));
        assert_eq!(settings.delay_for(2 * 1024 * 1024), Duration::from_millis(200));
        assert_eq!(settings.delay_for(100 * 1024 * 1024), Duration::from_millis(400));
    }

    #[test]
    fn instant_settings_never_wait() {
        assert_eq!(SimulationSettings::instant().delay_for(u64::MAX / 2), Duration::ZERO);
    }
}
