use std::{future::Future, time::Duration};

use color_eyre::Result;

/// Shared backoff policy for transient provider failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
}
impl RetryPolicy {
	pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
		Self { max_attempts: max_attempts.max(1), base_delay, max_delay }
	}

	/// Exponential delay for a 1-based attempt number, capped at `max_delay`.
	pub fn delay_for(&self, attempt: u32) -> Duration {
		let exp = attempt.max(1).saturating_sub(1).min(6);
		let base = (self.base_delay.as_millis() as u64).saturating_mul(1 << exp);
		let capped = base.min(self.max_delay.as_millis() as u64);

		Duration::from_millis(capped)
	}
}

pub async fn with_retries<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let mut attempt = 0;

	loop {
		attempt += 1;

		match op().await {
			Ok(value) => return Ok(value),
			Err(err) if attempt < policy.max_attempts => {
				tracing::warn!(error = %err, attempt, label, "Provider call failed. Retrying.");
				tokio::time::sleep(policy.delay_for(attempt)).await;
			},
			Err(err) => return Err(err),
		}
	}
}
