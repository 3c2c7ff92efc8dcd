//! The TTS scheduler: bounded concurrency, retry, idempotent resume, cooperative cancellation.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bookvoice_core::{AudioChunk, CancellationToken, CoreError, TtsSynth, VoiceId};
use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};

use crate::backoff::full_jitter_delay;
use crate::error::WorkerError;

/// One sentence's synthesis work order.
#[derive(Debug, Clone)]
pub struct SynthesisTask {
    pub part_index: u32,
    pub text: String,
    /// Logical chapter name this sentence belongs to.
    pub filename: String,
    /// Zero-padded chapter-relative sequence number, as displayed to the user.
    pub filenum: String,
    pub voice: VoiceId,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 2000,
            max_delay_ms: 60_000,
            max_attempts: 3,
        }
    }
}

pub struct PoolConfig {
    pub max_workers: usize,
    pub output_directory: PathBuf,
    pub retry: RetryPolicy,
}

/// Callback bundle invoked over the course of a run. Each is optional and may fire from any
/// worker task concurrently, so all must be `Send + Sync`. `on_status` carries `(current,
/// total, message)` as distinct fields rather than a pre-formatted string, so a caller can
/// render a real progress bar instead of parsing text.
#[derive(Default, Clone)]
pub struct PoolCallbacks {
    pub on_status: Option<Arc<dyn Fn(u64, u64, String) + Send + Sync>>,
    pub on_task_complete: Option<Arc<dyn Fn(u32, String) + Send + Sync>>,
    pub on_task_error: Option<Arc<dyn Fn(u32, String) + Send + Sync>>,
}

#[derive(Debug, Default)]
pub struct PoolOutcome {
    pub completed: Vec<(u32, String)>,
    pub failed_tasks: Vec<u32>,
}

/// Returns the `_temp_work` directory, creating it if it doesn't exist yet.
pub async fn temp_dir_handle(output_directory: &Path) -> Result<PathBuf, WorkerError> {
    let dir = output_directory.join("_temp_work");
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|source| WorkerError::TempDirCreate {
            path: dir.display().to_string(),
            source,
        })?;
    Ok(dir)
}

/// Drops from `tasks` any whose chunk file already exists on disk with non-zero size —
/// these are treated as already synthesized by a prior, interrupted run.
pub async fn filter_already_synthesized(
    tasks: Vec<SynthesisTask>,
    temp_dir: &Path,
) -> Vec<SynthesisTask> {
    let mut remaining = Vec::with_capacity(tasks.len());
    for task in tasks {
        let chunk_path = temp_dir.join(AudioChunk::filename_for(task.part_index));
        let already_done = tokio::fs::metadata(&chunk_path)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !already_done {
            remaining.push(task);
        }
    }
    remaining
}

/// Progress report cadence: about every 1% of `total`, clamped to `[50, 500]` tasks.
fn report_step(total: usize) -> usize {
    (total / 100).clamp(50, 500)
}

async fn synthesize_with_retry(
    task: &SynthesisTask,
    tts: &Arc<dyn TtsSynth>,
    retry: &RetryPolicy,
    cancellation: &CancellationToken,
    callbacks: &PoolCallbacks,
) -> Result<Vec<u8>, CoreError> {
    let mut attempt = 0u32;
    loop {
        if cancellation.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        match tts
            .synthesize(&task.text, task.voice.as_str(), 1.0, 0.0, 1.0)
            .await
        {
            Ok(bytes) => return Ok(bytes),
            Err(err) if err.is_retriable() && attempt < retry.max_attempts => {
                if let Some(on_status) = &callbacks.on_status {
                    on_status(
                        (attempt + 1) as u64,
                        retry.max_attempts as u64,
                        format!("retrying part {}: {}", task.part_index, err),
                    );
                }
                let delay = full_jitter_delay(
                    attempt,
                    retry.base_delay_ms,
                    retry.max_delay_ms,
                    &mut rand::thread_rng(),
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancellation.cancelled() => return Err(CoreError::Cancelled),
                }
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Runs every task to completion (success or terminal failure) using at most
/// `config.max_workers` concurrent TTS calls. Resolves once the queue is drained and every
/// in-flight worker has finished; the caller observing this future's completion is the
/// `on_all_complete` half of the scheduling contract.
///
/// Cancellation is cooperative: a task already inside `tts.synthesize` finishes that one
/// call before the token is checked again, but no new task is started and no retry sleep
/// is waited out once cancellation fires.
pub async fn run_pool(
    tasks: Vec<SynthesisTask>,
    config: PoolConfig,
    tts: Arc<dyn TtsSynth>,
    cancellation: CancellationToken,
    callbacks: PoolCallbacks,
) -> Result<PoolOutcome, WorkerError> {
    let temp_dir = temp_dir_handle(&config.output_directory).await?;
    let tasks = filter_already_synthesized(tasks, &temp_dir).await;

    let total = tasks.len();
    let step = report_step(total.max(1));
    let processed = Arc::new(AtomicUsize::new(0));

    let queue = Arc::new(Mutex::new(VecDeque::from(tasks)));
    let semaphore = Arc::new(Semaphore::new(config.max_workers.max(1)));
    let completed = Arc::new(Mutex::new(Vec::new()));
    let failed_tasks = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    loop {
        if cancellation.is_cancelled() {
            break;
        }
        let task = {
            let mut q = queue.lock().await;
            q.pop_front()
        };
        let Some(task) = task else { break };

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("worker semaphore is never closed");

        let temp_dir = temp_dir.clone();
        let tts = tts.clone();
        let retry = config.retry.clone();
        let cancellation = cancellation.clone();
        let callbacks = callbacks.clone();
        let completed = completed.clone();
        let failed_tasks = failed_tasks.clone();
        let processed = processed.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permit;
            let part_index = task.part_index;

            match synthesize_with_retry(&task, &tts, &retry, &cancellation, &callbacks).await {
                Ok(bytes) => {
                    let filename = AudioChunk::filename_for(part_index);
                    let path = temp_dir.join(&filename);
                    match tokio::fs::write(&path, &bytes).await {
                        Ok(()) => {
                            info!(part_index, %filename, "chunk synthesized");
                            if let Some(on_task_complete) = &callbacks.on_task_complete {
                                on_task_complete(part_index, filename.clone());
                            }
                            completed.lock().await.push((part_index, filename));
                        }
                        Err(source) => {
                            warn!(part_index, error = %source, "failed to persist synthesized chunk");
                            if let Some(on_task_error) = &callbacks.on_task_error {
                                on_task_error(part_index, source.to_string());
                            }
                            failed_tasks.lock().await.push(part_index);
                        }
                    }
                }
                Err(err) => {
                    warn!(part_index, error = %err, "task failed permanently");
                    if let Some(on_task_error) = &callbacks.on_task_error {
                        on_task_error(part_index, err.to_string());
                    }
                    failed_tasks.lock().await.push(part_index);
                }
            }

            let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
            if done % step == 0 {
                if let Some(on_status) = &callbacks.on_status {
                    on_status(done as u64, total as u64, format!("{done}/{total} tasks processed"));
                }
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    Ok(PoolOutcome {
        completed: Arc::try_unwrap(completed)
            .map(Mutex::into_inner)
            .unwrap_or_default(),
        failed_tasks: Arc::try_unwrap(failed_tasks)
            .map(Mutex::into_inner)
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;
    use tempfile::tempdir;

    struct AlwaysSucceeds;

    #[async_trait]
    impl TtsSynth for AlwaysSucceeds {
        async fn synthesize(
            &self,
            text: &str,
            _voice: &str,
            _rate: f32,
            _pitch: f32,
            _volume: f32,
        ) -> Result<Vec<u8>, CoreError> {
            Ok(text.as_bytes().to_vec())
        }
    }

    struct FailsNTimesThenSucceeds {
        remaining_failures: AtomicU32,
    }

    #[async_trait]
    impl TtsSynth for FailsNTimesThenSucceeds {
        async fn synthesize(
            &self,
            text: &str,
            _voice: &str,
            _rate: f32,
            _pitch: f32,
            _volume: f32,
        ) -> Result<Vec<u8>, CoreError> {
            let remaining = self.remaining_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.remaining_failures.fetch_sub(1, Ordering::SeqCst);
                return Err(CoreError::Transient("503".into()));
            }
            Ok(text.as_bytes().to_vec())
        }
    }

    struct AlwaysFatal;

    #[async_trait]
    impl TtsSynth for AlwaysFatal {
        async fn synthesize(
            &self,
            _text: &str,
            _voice: &str,
            _rate: f32,
            _pitch: f32,
            _volume: f32,
        ) -> Result<Vec<u8>, CoreError> {
            Err(CoreError::Fatal("bad auth".into()))
        }
    }

    fn task(part_index: u32) -> SynthesisTask {
        SynthesisTask {
            part_index,
            text: format!("sentence {part_index}"),
            filename: "Chapter 1".to_string(),
            filenum: format!("{part_index:06}"),
            voice: VoiceId::new("en-US,GuyNeural"),
        }
    }

    #[tokio::test]
    async fn every_task_completes_with_a_reliable_tts() {
        let dir = tempdir().unwrap();
        let config = PoolConfig {
            max_workers: 2,
            output_directory: dir.path().to_path_buf(),
            retry: RetryPolicy::default(),
        };
        let outcome = run_pool(
            vec![task(0), task(1), task(2)],
            config,
            Arc::new(AlwaysSucceeds),
            CancellationToken::new(),
            PoolCallbacks::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.completed.len(), 3);
        assert!(outcome.failed_tasks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_until_success() {
        let dir = tempdir().unwrap();
        let config = PoolConfig {
            max_workers: 1,
            output_directory: dir.path().to_path_buf(),
            retry: RetryPolicy {
                base_delay_ms: 10,
                max_delay_ms: 100,
                max_attempts: 3,
            },
        };
        let tts = Arc::new(FailsNTimesThenSucceeds {
            remaining_failures: AtomicU32::new(2),
        });

        let handle = tokio::spawn(run_pool(
            vec![task(0)],
            config,
            tts,
            CancellationToken::new(),
            PoolCallbacks::default(),
        ));
        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        let outcome = handle.await.unwrap().unwrap();

        assert_eq!(outcome.completed.len(), 1);
        assert!(outcome.failed_tasks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_exhausted_reports_failure() {
        let dir = tempdir().unwrap();
        let config = PoolConfig {
            max_workers: 1,
            output_directory: dir.path().to_path_buf(),
            retry: RetryPolicy {
                base_delay_ms: 10,
                max_delay_ms: 100,
                max_attempts: 2,
            },
        };
        let tts = Arc::new(FailsNTimesThenSucceeds {
            remaining_failures: AtomicU32::new(10),
        });

        let handle = tokio::spawn(run_pool(
            vec![task(0)],
            config,
            tts,
            CancellationToken::new(),
            PoolCallbacks::default(),
        ));
        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        let outcome = handle.await.unwrap().unwrap();

        assert!(outcome.completed.is_empty());
        assert_eq!(outcome.failed_tasks, vec![0]);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let dir = tempdir().unwrap();
        let config = PoolConfig {
            max_workers: 1,
            output_directory: dir.path().to_path_buf(),
            retry: RetryPolicy::default(),
        };
        let outcome = run_pool(
            vec![task(0)],
            config,
            Arc::new(AlwaysFatal),
            CancellationToken::new(),
            PoolCallbacks::default(),
        )
        .await
        .unwrap();

        assert!(outcome.completed.is_empty());
        assert_eq!(outcome.failed_tasks, vec![0]);
    }

    #[tokio::test]
    async fn chunks_already_on_disk_are_skipped() {
        let dir = tempdir().unwrap();
        let temp_work = temp_dir_handle(dir.path()).await.unwrap();
        tokio::fs::write(temp_work.join(AudioChunk::filename_for(0)), vec![1u8; 10])
            .await
            .unwrap();

        let config = PoolConfig {
            max_workers: 2,
            output_directory: dir.path().to_path_buf(),
            retry: RetryPolicy::default(),
        };
        let outcome = run_pool(
            vec![task(0), task(1)],
            config,
            Arc::new(AlwaysSucceeds),
            CancellationToken::new(),
            PoolCallbacks::default(),
        )
        .await
        .unwrap();

        // Only part 1 was actually dispatched; part 0's pre-existing chunk was left alone.
        assert_eq!(outcome.completed, vec![(1, AudioChunk::filename_for(1))]);
    }

    #[tokio::test]
    async fn cancelling_before_the_run_starts_dispatches_nothing() {
        let dir = tempdir().unwrap();
        let config = PoolConfig {
            max_workers: 2,
            output_directory: dir.path().to_path_buf(),
            retry: RetryPolicy::default(),
        };
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let outcome = run_pool(
            vec![task(0), task(1)],
            config,
            Arc::new(AlwaysSucceeds),
            cancellation,
            PoolCallbacks::default(),
        )
        .await
        .unwrap();

        assert!(outcome.completed.is_empty());
    }
}
