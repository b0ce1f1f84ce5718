//! 시간 제한이 있는 반복 확인
//!
//! 고정 간격으로 조건을 확인하고, 마감 시각을 넘기면 포기한다.
//! 시계는 [`Clock`] 으로 주입되므로 테스트는 실제로 기다리지 않는다.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// 경과 시간과 대기 능력
#[allow(async_fn_in_trait)]
pub trait Clock {
    /// 임의 기준점으로부터의 경과 시간
    fn elapsed(&self) -> Duration;
    async fn sleep(&self, duration: Duration);
}

/// tokio 타이머를 쓰는 실제 시계
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 대기 없이 시간만 앞으로 가는 시계
#[derive(Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += duration;
        }
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.now.lock().map(|now| *now).unwrap_or_default()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// 반복 확인 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Found(T),
    TimedOut { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            PollOutcome::Found(value) => Some(value),
            PollOutcome::TimedOut { .. } => None,
        }
    }
}

/// `predicate` 가 값을 돌려줄 때까지 `interval` 간격으로 확인
///
/// 첫 확인은 즉시 하고, 다음 확인 시각이 `deadline` 을 넘으면 멈춘다.
pub async fn poll_until<C, T, F>(
    clock: &C,
    interval: Duration,
    deadline: Duration,
    mut predicate: F,
) -> PollOutcome<T>
where
    C: Clock,
    F: FnMut() -> Option<T>,
{
    let start = clock.elapsed();
    let mut attempts = 0;

    loop {
        attempts += 1;
        if let Some(value) = predicate() {
            return PollOutcome::Found(value);
        }

        let spent = clock.elapsed().saturating_sub(start);
        if spent + interval > deadline {
            return PollOutcome::TimedOut { attempts };
        }
        clock.sleep(interval).await;
    }
}
