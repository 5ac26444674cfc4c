#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// キー毎のトークンバケット。capacity / window の速度で連続補充する。
#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// ユーザ単位の流入制御。admit はロック1回の即時判定で、ブロックも待機もしない。
pub struct RateLimiter {
    capacity: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(capacity: u32, window: Duration) -> RateLimiter {
        RateLimiter {
            capacity: capacity.max(1),
            window: window.max(Duration::from_millis(1)),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// 許可なら true。拒否された呼び出しはタスクを一切作らずに返すこと。
    pub fn admit(&self, key: &str) -> bool {
        let now = Instant::now();
        let capacity = self.capacity as f64;
        let rate = capacity / self.window.as_secs_f64();

        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        // 1ウィンドウ放置されたバケットは満タンまで補充済みで、無いのと同じ。
        // キーを溜め込まないようここで落とす
        buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < self.window);
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: capacity,
            last_refill: now,
        });
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * rate).min(capacity);
        bucket.last_refill = now;
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
