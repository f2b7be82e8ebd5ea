use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration, Instant};

/// Token bucket at 1 request/second, burst 1 (spec §4.7). Process-wide
/// singleton: every adapter call, paginated or not, serializes through
/// the same bucket.
pub struct PaapiRateLimiter {
    semaphore: Arc<Semaphore>,
    last_request: Arc<Mutex<Instant>>,
    min_delay: Duration,
}

impl PaapiRateLimiter {
    pub fn new(requests_per_sec: u32) -> Self {
        let min_delay_ms = 1000 / requests_per_sec.max(1) as u64;
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            last_request: Arc::new(Mutex::new(Instant::now() - Duration::from_secs(1))),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    pub async fn acquire(&self) -> RateLimitGuard {
        let permit = self.semaphore.clone().acquire_owned().await.unwrap();

        let wait_time = {
            let last = self.last_request.lock();
            let elapsed = last.elapsed();
            (elapsed < self.min_delay).then(|| self.min_delay - elapsed)
        };
        if let Some(delay) = wait_time {
            sleep(delay).await;
        }
        *self.last_request.lock() = Instant::now();

        RateLimitGuard { _permit: permit }
    }
}

pub struct RateLimitGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

/// Adaptive delay between paginated requests (spec §4.7): standard
/// 2.5s, 3.5s for 3-5 pages, 4.5s beyond.
pub fn pagination_delay(total_pages: usize) -> Duration {
    if total_pages <= 2 {
        Duration::from_millis(2500)
    } else if total_pages <= 5 {
        Duration::from_millis(3500)
    } else {
        Duration::from_millis(4500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_delay_bands_match_spec() {
        assert_eq!(pagination_delay(1), Duration::from_millis(2500));
        assert_eq!(pagination_delay(4), Duration::from_millis(3500));
        assert_eq!(pagination_delay(8), Duration::from_millis(4500));
    }

    #[tokio::test]
    async fn limiter_enforces_minimum_spacing() {
        let limiter = PaapiRateLimiter::new(1);
        let start = Instant::now();
        drop(limiter.acquire().await);
        drop(limiter.acquire().await);
        assert!(start.elapsed() >= Duration::from_millis(900));
    }
}
