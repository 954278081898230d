// THEORY:
// Sheets are independent of each other: no state crosses from one sheet to the
// next. The `ParallelPipeline` exploits that with a fixed pool of tokio workers.
//
// Layout:
// - One dispatcher task receives `SheetTask`s and hands them to workers
//   round-robin.
// - Each worker owns a handle to the shared, immutable `SheetPipeline` and runs the
//   CPU-bound slicing and clustering on the blocking thread pool, one sheet at a
//   time, replying on the task's `oneshot` channel.
// - `process_batch` submits every sheet up front and awaits the replies in
//   submission order, so reports come back in the same order as their sheets no
//   matter which worker finishes first.

use crate::config::PipelineConfig;
use crate::error::Error;
use crate::pipeline::{Sheet, SheetPipeline, SheetReport};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

pub struct SheetTask {
    pub sheet: Sheet,
    pub result_sender: oneshot::Sender<SheetReport>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<SheetTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(pipeline: Arc<SheetPipeline>, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<SheetTask>();
        let mut workers = Vec::with_capacity(worker_count + 1);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<SheetTask>())
            .unzip();

        // Dispatcher
        workers.push(tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    log::warn!("worker {} is gone, dropping task", worker_idx);
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        }));

        for (worker_idx, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            let worker_pipeline = Arc::clone(&pipeline);

            workers.push(tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let pipeline = Arc::clone(&worker_pipeline);
                    let SheetTask { sheet, result_sender } = task;
                    let name = sheet.name.clone();

                    match tokio::task::spawn_blocking(move || pipeline.generate_report(&sheet)).await {
                        Ok(report) => {
                            let _ = result_sender.send(report);
                        }
                        Err(join_error) => {
                            log::error!("worker {} failed on sheet '{}': {}", worker_idx, name, join_error);
                        }
                    }
                }
            }));
        }

        Self { task_sender, workers }
    }

    pub async fn process_sheet(&self, sheet: Sheet) -> Result<SheetReport, Error> {
        let (result_sender, result_receiver) = oneshot::channel();
        let name = sheet.name.clone();

        self.task_sender
            .send(SheetTask { sheet, result_sender })
            .map_err(|_| Error::Worker(String::from("failed to send task to worker pool")))?;

        result_receiver
            .await
            .map_err(|_| Error::Worker(format!("no result received for sheet '{}'", name)))
    }

    /// Stops accepting tasks and waits for queued ones to finish.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Processes many sheets concurrently on a `WorkerPool`.
pub struct ParallelPipeline {
    worker_pool: WorkerPool,
    worker_count: usize,
}

impl ParallelPipeline {
    /// Must be called from within a tokio runtime.
    pub fn new(config: &PipelineConfig) -> Self {
        let worker_count = config.batch.worker_count();
        let pipeline = Arc::new(SheetPipeline::new(config));
        log::debug!("starting parallel pipeline with {} workers", worker_count);
        Self {
            worker_pool: WorkerPool::new(pipeline, worker_count),
            worker_count,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub async fn process_sheet(&self, sheet: Sheet) -> Result<SheetReport, Error> {
        self.worker_pool.process_sheet(sheet).await
    }

    /// Reports for every sheet, in the order the sheets were given.
    pub async fn process_batch(&self, sheets: Vec<Sheet>) -> Result<Vec<SheetReport>, Error> {
        let pending = sheets.into_iter().map(|sheet| self.worker_pool.process_sheet(sheet));
        join_all(pending).await.into_iter().collect()
    }

    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}
