#[cfg(test)]
mod tests;

use crate::logging::*;
use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::result::Result;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("task backlog is full")]
pub struct QueueFull;

/// 固定サイズのワーカープール。submit は即時に返り、結果は返さない
/// （呼び出し元はタスク id を持っていてストアをポーリングする）。
/// バックログ満杯は黙って捨てずに QueueFull として呼び出し元へ返す。
pub struct TaskExecutor {
    tx: mpsc::Sender<Job>,
}

impl TaskExecutor {
    pub fn new(workers: usize, backlog: usize) -> TaskExecutor {
        let (tx, rx) = mpsc::channel::<Job>(backlog.max(1));
        let rx = Arc::new(Mutex::new(rx));
        for worker_id in 0..workers.max(1) {
            tokio::spawn(worker_loop(worker_id, Arc::clone(&rx)));
        }
        TaskExecutor { tx }
    }

    pub fn submit<F>(&self, job: F) -> Result<(), QueueFull>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tx.try_send(Box::pin(job)).map_err(|_| QueueFull)
    }
}

async fn worker_loop(worker_id: usize, rx: Arc<Mutex<mpsc::Receiver<Job>>>) {
    let log = DEFAULT.new(o!(
        "function" => "worker_loop",
        "worker_id" => worker_id,
    ));
    trace!(log, "worker started");
    loop {
        // ロックは recv の間だけ。取り出したら手放して実行する
        let job = rx.lock().await.recv().await;
        let Some(job) = job else {
            trace!(log, "queue closed, worker exiting");
            break;
        };
        // ジョブの panic はワーカーにも他のジョブにも波及させない
        if AssertUnwindSafe(job).catch_unwind().await.is_err() {
            error!(log, "job panicked");
        }
    }
}
