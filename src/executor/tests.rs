use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tokio::time::{Duration, timeout};

async fn wait_for<F>(mut cond: F)
where
    F: FnMut() -> bool,
{
    timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_submitted_job_runs() {
    let executor = TaskExecutor::new(2, 8);
    let counter = Arc::new(AtomicUsize::new(0));

    let c = Arc::clone(&counter);
    executor
        .submit(async move {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    wait_for(|| counter.load(Ordering::SeqCst) == 1).await;
}

#[tokio::test]
async fn test_jobs_run_concurrently() {
    let executor = TaskExecutor::new(2, 8);
    let started = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Notify::new());

    for _ in 0..2 {
        let started = Arc::clone(&started);
        let release = Arc::clone(&release);
        executor
            .submit(async move {
                started.fetch_add(1, Ordering::SeqCst);
                release.notified().await;
            })
            .unwrap();
    }

    // ワーカー2つが同時に両方のジョブへ入る
    wait_for(|| started.load(Ordering::SeqCst) == 2).await;
    release.notify_waiters();
}

#[tokio::test]
async fn test_full_backlog_is_rejected() {
    let executor = TaskExecutor::new(1, 1);
    let started = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Notify::new());

    // 1本目がワーカーを占有するまで待つ
    let s = Arc::clone(&started);
    let r = Arc::clone(&release);
    executor
        .submit(async move {
            s.fetch_add(1, Ordering::SeqCst);
            r.notified().await;
        })
        .unwrap();
    wait_for(|| started.load(Ordering::SeqCst) == 1).await;

    // 2本目はバックログに収まり、3本目で満杯
    executor.submit(async {}).unwrap();
    assert_eq!(executor.submit(async {}), Err(QueueFull));

    release.notify_waiters();
}

#[tokio::test]
async fn test_panicking_job_does_not_kill_the_pool() {
    let executor = TaskExecutor::new(1, 8);
    let counter = Arc::new(AtomicUsize::new(0));

    executor
        .submit(async {
            panic!("boom");
        })
        .unwrap();

    let c = Arc::clone(&counter);
    executor
        .submit(async move {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    wait_for(|| counter.load(Ordering::SeqCst) == 1).await;
}
