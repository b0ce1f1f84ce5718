//! 502 Bad Gateway 전체 재시도

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::AppError;
use crate::infrastructure::Clock;

/// 오류 사슬 어딘가에 502 응답이 있는지
pub fn is_bad_gateway(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.downcast_ref::<AppError>().is_some_and(AppError::is_bad_gateway))
}

/// 502 오류면 `delay` 만큼 쉬고 처음부터 다시 (최대 `limit` 번)
///
/// `attempt` 는 지금까지의 재시도 횟수를 받는다.
pub async fn retry_on_bad_gateway<C, T, F, Fut>(
    clock: &C,
    limit: u32,
    delay: Duration,
    mut attempt: F,
) -> Result<T>
where
    C: Clock,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;
    loop {
        match attempt(retries).await {
            Ok(value) => return Ok(value),
            Err(e) if retries < limit && is_bad_gateway(&e) => {
                retries += 1;
                warn!("⚠️ 서버 오류(502) 발생: {:#}", e);
                warn!("{}초 후 다시 시도합니다... ({}/{})", delay.as_secs(), retries, limit);
                clock.sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::infrastructure::ManualClock;
    use anyhow::{anyhow, Context};

    fn bad_gateway() -> anyhow::Error {
        let err: Result<()> = Err(AppError::Api(ApiError::BadStatus {
            endpoint: "values.get".to_string(),
            status: 502,
            message: "Bad Gateway".to_string(),
        }))
        .context("시트를 읽지 못했습니다");
        err.unwrap_err()
    }

    #[test]
    fn test_detects_wrapped_bad_gateway() {
        assert!(is_bad_gateway(&bad_gateway()));
        assert!(!is_bad_gateway(&anyhow!("다른 오류")));
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let clock = ManualClock::new();
        let result = retry_on_bad_gateway(&clock, 3, Duration::from_secs(30), |n| async move {
            if n < 2 {
                Err(bad_gateway())
            } else {
                Ok(n)
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 2);
        assert_eq!(clock.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_gives_up_after_limit() {
        let clock = ManualClock::new();
        let mut calls = 0;
        let result: Result<()> = retry_on_bad_gateway(&clock, 3, Duration::from_secs(30), |_| {
            calls += 1;
            async { Err(bad_gateway()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 4);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let clock = ManualClock::new();
        let mut calls = 0;
        let result: Result<()> = retry_on_bad_gateway(&clock, 3, Duration::from_secs(30), |_| {
            calls += 1;
            async { Err(anyhow!("인증 실패")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
