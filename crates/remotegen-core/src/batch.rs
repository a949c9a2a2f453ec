// ── Batch orchestration ──
//
// Devices run in fixed-width concurrent batches separated by a short
// delay. A batch always settles completely before the next one starts.
// Failures go through the error handler; retry state lives in a ledger
// owned by a single run.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::generator::DeviceGenerator;
use crate::model::{BatchResult, GenerationResult};
use crate::naming;
use crate::recovery::{ErrorContext, ErrorHandler, RecoveryAction, RecoveryPolicy, RetryLedger};

const DEFAULT_MAX_CONCURRENCY: usize = 3;
const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Devices per batch. Zero is treated as one.
    pub max_concurrency: usize,
    /// Keep starting batches after a device fails.
    pub continue_on_error: bool,
    pub batch_delay: Duration,
    pub recovery: RecoveryPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            continue_on_error: true,
            batch_delay: DEFAULT_BATCH_DELAY,
            recovery: RecoveryPolicy::default(),
        }
    }
}

/// Called once per settled device, in completion order within a batch.
pub type ProgressFn = Arc<dyn Fn(&GenerationResult) + Send + Sync>;

struct DeviceOutcome {
    result: GenerationResult,
    abort: bool,
}

pub struct BatchOrchestrator {
    generator: Arc<DeviceGenerator>,
    options: BatchOptions,
    handler: ErrorHandler,
    progress: Option<ProgressFn>,
}

impl BatchOrchestrator {
    pub fn new(generator: Arc<DeviceGenerator>, options: BatchOptions) -> Self {
        Self {
            generator,
            handler: ErrorHandler::new(options.recovery),
            options,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: impl Fn(&GenerationResult) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Generate every device in `device_ids`. Duplicate ids run once.
    ///
    /// Never fails: per-device errors become failed or skipped results,
    /// and an abort stops the run with everything settled so far reported.
    pub async fn process_many(&self, device_ids: &[String]) -> BatchResult {
        let started = Instant::now();
        let mut seen = HashSet::new();
        let unique: Vec<&str> = device_ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect();

        let width = self.options.max_concurrency.max(1);
        let ledger = Mutex::new(RetryLedger::new());
        let mut results = Vec::with_capacity(unique.len());
        let mut aborted = false;

        let (ids, clashes) = split_name_clashes(unique);
        for (device_id, err) in clashes {
            let context = ErrorContext::for_device(device_id, "generate");
            self.handler.handle(&mut *ledger.lock().await, &err, &context);
            results.push(
                self.settle(DeviceOutcome {
                    result: GenerationResult::failed(device_id, err.to_string()),
                    abort: false,
                })
                .result,
            );
        }
        let ids = if !self.options.continue_on_error && !results.is_empty() {
            warn!("component name clash and continue-on-error is off, stopping");
            Vec::new()
        } else {
            ids
        };

        info!(devices = ids.len(), width, "starting batch run");
        for (index, chunk) in ids.chunks(width).enumerate() {
            if index > 0 && !self.options.batch_delay.is_zero() {
                tokio::time::sleep(self.options.batch_delay).await;
            }
            debug!(batch = index + 1, devices = chunk.len(), "starting batch");

            let outcomes = join_all(chunk.iter().map(|id| self.process_one(id, &ledger))).await;
            let mut stop = false;
            for outcome in outcomes {
                aborted |= outcome.abort;
                stop |= !self.options.continue_on_error && outcome.result.is_failure();
                results.push(outcome.result);
            }

            if aborted {
                warn!(batch = index + 1, "run aborted, remaining devices not attempted");
                break;
            }
            if stop {
                warn!(batch = index + 1, "device failed and continue-on-error is off, stopping");
                break;
            }
        }

        let history = ledger.into_inner().into_history();
        let summary = BatchResult::from_results(results, started.elapsed(), aborted, history);
        info!(
            total = summary.total_processed,
            successful = summary.successful,
            failed = summary.failed,
            skipped = summary.skipped,
            elapsed_ms = u64::try_from(summary.processing_time.as_millis()).unwrap_or(u64::MAX),
            "batch run finished"
        );
        summary
    }

    async fn process_one(&self, device_id: &str, ledger: &Mutex<RetryLedger>) -> DeviceOutcome {
        loop {
            let err = match self.generator.generate(device_id).await {
                Ok(generated) => {
                    return self.settle(DeviceOutcome {
                        result: generated.to_result(),
                        abort: false,
                    });
                }
                Err(err) => err,
            };

            let context = ErrorContext::for_device(device_id, "generate");
            let decision = {
                let mut ledger = ledger.lock().await;
                self.handler.handle(&mut ledger, &err, &context)
            };

            let message = err.to_string();
            let outcome = match decision.action {
                RecoveryAction::Retry => {
                    let delay = decision.retry_after.unwrap_or_default();
                    tokio::time::sleep(delay).await;
                    continue;
                }
                RecoveryAction::Skip => DeviceOutcome {
                    result: GenerationResult::skipped(device_id, message),
                    abort: false,
                },
                RecoveryAction::Abort => DeviceOutcome {
                    result: GenerationResult::failed(device_id, message),
                    abort: true,
                },
                RecoveryAction::Continue => DeviceOutcome {
                    result: GenerationResult::failed(device_id, message),
                    abort: false,
                },
            };
            return self.settle(outcome);
        }
    }

    fn settle(&self, outcome: DeviceOutcome) -> DeviceOutcome {
        if let Some(progress) = &self.progress {
            progress(&outcome.result);
        }
        outcome
    }
}

/// Ids whose generated component name is already claimed by an earlier id
/// in the run (`living_room_tv` and `living-room-tv`) are split off with a
/// validation error; their imports would collide in the router.
fn split_name_clashes(ids: Vec<&str>) -> (Vec<&str>, Vec<(&str, CoreError)>) {
    let mut claimed: HashMap<String, &str> = HashMap::new();
    let mut keep = Vec::with_capacity(ids.len());
    let mut clashes = Vec::new();
    for id in ids {
        // Underivable names are reported by the generator itself.
        let Ok(name) = naming::component_name(id) else {
            keep.push(id);
            continue;
        };
        match claimed.entry(name) {
            Entry::Occupied(first) => clashes.push((
                id,
                CoreError::Validation {
                    message: format!(
                        "device {id} generates component {} already used by {}",
                        first.key(),
                        first.get()
                    ),
                },
            )),
            Entry::Vacant(slot) => {
                slot.insert(id);
                keep.push(id);
            }
        }
    }
    (keep, clashes)
}
