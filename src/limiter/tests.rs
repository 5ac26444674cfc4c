use super::*;

#[test]
fn test_capacity_20_rejects_the_21st() {
    let limiter = RateLimiter::new(20, Duration::from_secs(60));
    for i in 0..20 {
        assert!(limiter.admit("user_1"), "request {i} should be admitted");
    }
    assert!(!limiter.admit("user_1"), "21st request should be rejected");
}

#[test]
fn test_keys_are_independent() {
    let limiter = RateLimiter::new(1, Duration::from_secs(60));
    assert!(limiter.admit("user_1"));
    assert!(!limiter.admit("user_1"));
    assert!(limiter.admit("user_2"));
}

#[test]
fn test_tokens_refill_over_time() {
    let limiter = RateLimiter::new(2, Duration::from_millis(100));
    assert!(limiter.admit("user_1"));
    assert!(limiter.admit("user_1"));
    assert!(!limiter.admit("user_1"));

    // 1ウィンドウ分待てばまた通る
    std::thread::sleep(Duration::from_millis(120));
    assert!(limiter.admit("user_1"));
}

#[test]
fn test_idle_buckets_are_pruned() {
    let limiter = RateLimiter::new(2, Duration::from_millis(50));
    assert!(limiter.admit("user_1"));
    assert_eq!(limiter.tracked_keys(), 1);

    // 1ウィンドウ放置したキーは次の admit で落ちる
    std::thread::sleep(Duration::from_millis(80));
    assert!(limiter.admit("user_2"));
    assert_eq!(limiter.tracked_keys(), 1);
}

#[test]
fn test_refill_does_not_exceed_capacity() {
    let limiter = RateLimiter::new(2, Duration::from_millis(50));
    assert!(limiter.admit("user_1"));
    assert!(limiter.admit("user_1"));

    // 数ウィンドウ分待っても capacity を超えて貯まらない
    std::thread::sleep(Duration::from_millis(200));
    assert!(limiter.admit("user_1"));
    assert!(limiter.admit("user_1"));
    assert!(!limiter.admit("user_1"));
}
