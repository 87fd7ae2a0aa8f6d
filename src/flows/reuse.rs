//! Single-flight token cache.
//!
//! [`ReuseTokenSource`] keeps the most recent token from an inner [`TokenSource`] and hands it
//! out until it expires. The cache moves between three states:
//!
//! - `Empty`: nothing usable is cached; the next caller retrieves.
//! - `Valid`: a token is cached and returned while it has not expired.
//! - `Refreshing`: one caller (the leader) is retrieving; everyone else queues on the flight guard.
//!
//! Each completed retrieval bumps an epoch. A queued caller compares the epoch it saw before
//! queueing with the current one: if a retrieval finished in between, it takes that result
//! (token or error) instead of calling upstream again. Failures leave the cache `Empty`, so only
//! the callers that were already waiting observe a failure; the next caller retries.
//!
//! Dropping a caller's future only detaches that caller. When the leader is dropped mid-flight
//! the in-flight retrieval is abandoned, the cache returns to `Empty`, and the next queued caller
//! starts a fresh retrieval.

// self
use crate::{
	_prelude::*,
	auth::Token,
	flows::{TokenFuture, TokenSource},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Caching [`TokenSource`] that coalesces concurrent refreshes into one upstream call.
pub struct ReuseTokenSource<S> {
	source: S,
	expiry_skew: Duration,
	slot: Mutex<Slot>,
	flight: AsyncMutex<()>,
}
impl<S> ReuseTokenSource<S>
where
	S: TokenSource,
{
	/// Wraps `source` with an empty cache and no expiry skew.
	pub fn new(source: S) -> Self {
		Self {
			source,
			expiry_skew: Duration::ZERO,
			slot: Mutex::new(Slot::default()),
			flight: AsyncMutex::new(()),
		}
	}

	/// Seeds the cache with an existing token.
	pub fn with_token(self, token: Token) -> Self {
		self.slot.lock().state = CacheState::Valid(token);

		self
	}

	/// Treats cached tokens as expired `skew` before their advertised expiry.
	///
	/// Negative values are clamped to zero.
	pub fn with_expiry_skew(mut self, skew: Duration) -> Self {
		self.expiry_skew = if skew.is_negative() { Duration::ZERO } else { skew };

		self
	}

	/// Returns the cached token if it is still valid, without contacting the inner source.
	pub fn cached(&self) -> Option<Token> {
		self.slot.lock().valid_token(OffsetDateTime::now_utc(), self.expiry_skew).cloned()
	}

	/// Wrapped source.
	pub fn source(&self) -> &S {
		&self.source
	}

	/// Skew applied to cached token expiry.
	pub fn expiry_skew(&self) -> Duration {
		self.expiry_skew
	}

	async fn reuse_or_refresh(&self) -> Result<Token> {
		const KIND: FlowKind = FlowKind::Cached;

		let ticket = {
			let slot = self.slot.lock();

			if let Some(token) = slot.valid_token(OffsetDateTime::now_utc(), self.expiry_skew) {
				obs::record_flow_outcome(KIND, FlowOutcome::Reused);

				return Ok(token.clone());
			}

			slot.epoch
		};
		let span = FlowSpan::new(KIND, "reuse_or_refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.refresh(ticket)).await;
		let outcome = match &result {
			Ok((_, true)) => FlowOutcome::Reused,
			Ok((_, false)) => FlowOutcome::Success,
			Err(_) => FlowOutcome::Failure,
		};

		obs::record_flow_outcome(KIND, outcome);
		span.record_outcome(outcome);

		result.map(|(token, _)| token)
	}

	/// Returns the token and whether it came from another caller's retrieval.
	async fn refresh(&self, ticket: u64) -> Result<(Token, bool)> {
		let _flight = self.flight.lock().await;

		{
			let mut slot = self.slot.lock();

			if slot.epoch != ticket {
				if let CacheState::Valid(token) = &slot.state {
					return Ok((token.clone(), true));
				}
				if let Some(err) = &slot.last_error {
					return Err(err.clone());
				}
			}

			slot.state = CacheState::Refreshing;
		}

		let reset = ResetOnDrop { slot: &self.slot };
		let result = self.source.token().await;

		{
			let mut slot = self.slot.lock();

			slot.epoch = slot.epoch.wrapping_add(1);

			match &result {
				Ok(token) => {
					slot.state = CacheState::Valid(token.clone());
					slot.last_error = None;
				},
				Err(err) => {
					slot.state = CacheState::Empty;
					slot.last_error = Some(err.clone());
				},
			}
		}

		drop(reset);

		result.map(|token| (token, false))
	}
}
impl<S> TokenSource for ReuseTokenSource<S>
where
	S: TokenSource,
{
	fn token(&self) -> TokenFuture<'_> {
		Box::pin(self.reuse_or_refresh())
	}
}
impl<S> Debug for ReuseTokenSource<S> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let slot = self.slot.lock();

		f.debug_struct("ReuseTokenSource")
			.field("state", &slot.state.label())
			.field("epoch", &slot.epoch)
			.field("expiry_skew", &self.expiry_skew)
			.finish()
	}
}

#[derive(Debug, Default)]
struct Slot {
	state: CacheState,
	epoch: u64,
	last_error: Option<Error>,
}
impl Slot {
	fn valid_token(&self, now: OffsetDateTime, skew: Duration) -> Option<&Token> {
		match &self.state {
			CacheState::Valid(token) if token.is_valid_at(now, skew) => Some(token),
			_ => None,
		}
	}
}

#[derive(Debug, Default)]
enum CacheState {
	#[default]
	Empty,
	Valid(Token),
	Refreshing,
}
impl CacheState {
	fn label(&self) -> &'static str {
		match self {
			CacheState::Empty => "empty",
			CacheState::Valid(_) => "valid",
			CacheState::Refreshing => "refreshing",
		}
	}
}

/// Returns an abandoned `Refreshing` state to `Empty` when the leader is dropped.
struct ResetOnDrop<'a> {
	slot: &'a Mutex<Slot>,
}
impl Drop for ResetOnDrop<'_> {
	fn drop(&mut self) {
		let mut slot = self.slot.lock();

		if matches!(slot.state, CacheState::Refreshing) {
			slot.state = CacheState::Empty;
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		sync::atomic::{AtomicUsize, Ordering},
		time::Duration as StdDuration,
	};
	// self
	use super::*;
	use crate::error::RetrieveError;

	type Script = fn(usize) -> Result<Token>;

	struct ScriptedSource {
		calls: AtomicUsize,
		delay: StdDuration,
		script: Script,
	}
	impl ScriptedSource {
		fn new(delay_ms: u64, script: Script) -> Self {
			Self { calls: AtomicUsize::new(0), delay: StdDuration::from_millis(delay_ms), script }
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl TokenSource for ScriptedSource {
		fn token(&self) -> TokenFuture<'_> {
			Box::pin(async move {
				let call = self.calls.fetch_add(1, Ordering::SeqCst);
				let delay = if call == 0 { self.delay } else { self.delay / 10 };

				tokio::time::sleep(delay).await;

				(self.script)(call)
			})
		}
	}

	fn fresh(call: usize) -> Result<Token> {
		Ok(Token::new(format!("token-{call}"), "Bearer")
			.with_expiry(OffsetDateTime::now_utc() + Duration::hours(1)))
	}

	fn stale(call: usize) -> Result<Token> {
		Ok(Token::new(format!("token-{call}"), "Bearer")
			.with_expiry(OffsetDateTime::now_utc() - Duration::seconds(1)))
	}

	fn fail_first(call: usize) -> Result<Token> {
		if call == 0 {
			return Err(RetrieveError::new(Some("invalid_client".into()), 401, b"").into());
		}

		fresh(call)
	}

	async fn spawn_callers(
		cache: &Arc<ReuseTokenSource<ScriptedSource>>,
		count: usize,
	) -> Vec<Result<Token>> {
		let handles = (0..count)
			.map(|_| {
				let cache = cache.clone();

				tokio::spawn(async move { cache.token().await })
			})
			.collect::<Vec<_>>();
		let mut results = Vec::with_capacity(count);

		for handle in handles {
			results.push(handle.await.expect("Caller task should not panic."));
		}

		results
	}

	#[tokio::test]
	async fn concurrent_misses_share_one_retrieval() {
		let cache = Arc::new(ReuseTokenSource::new(ScriptedSource::new(50, fresh)));
		let results = spawn_callers(&cache, 16).await;

		assert_eq!(cache.source().calls(), 1);

		for result in results {
			let token = result.expect("Every caller should receive the shared token.");

			assert_eq!(token.access_token.expose(), "token-0");
		}

		let again = cache.token().await.expect("Cached token should be reused.");

		assert_eq!(again.access_token.expose(), "token-0");
		assert_eq!(cache.source().calls(), 1);
	}

	#[tokio::test]
	async fn concurrent_misses_share_one_failure_and_failure_is_not_cached() {
		let cache = Arc::new(ReuseTokenSource::new(ScriptedSource::new(50, fail_first)));
		let results = spawn_callers(&cache, 8).await;

		assert_eq!(cache.source().calls(), 1);

		for result in results {
			let err = result.expect_err("Every caller should receive the shared failure.");

			assert_eq!(err.as_retrieve().map(|err| err.code.as_str()), Some("invalid_client"));
		}

		assert!(cache.cached().is_none());

		let token = cache.token().await.expect("Next caller should retry after a failure.");

		assert_eq!(token.access_token.expose(), "token-1");
		assert_eq!(cache.source().calls(), 2);
	}

	#[tokio::test]
	async fn expired_token_triggers_exactly_one_new_retrieval() {
		let cache = ReuseTokenSource::new(ScriptedSource::new(0, stale));

		cache.token().await.expect("First retrieval should succeed.");
		assert_eq!(cache.source().calls(), 1);

		let token = cache.token().await.expect("Second retrieval should succeed.");

		assert_eq!(token.access_token.expose(), "token-1");
		assert_eq!(cache.source().calls(), 2);
	}

	#[tokio::test]
	async fn seeded_token_is_reused_until_skewed_expiry() {
		let seeded = Token::new("seeded", "Bearer")
			.with_expiry(OffsetDateTime::now_utc() + Duration::seconds(30));
		let cache = ReuseTokenSource::new(ScriptedSource::new(0, fresh)).with_token(seeded.clone());

		assert_eq!(cache.cached(), Some(seeded.clone()));
		assert_eq!(cache.token().await.expect("Seeded token should be reused."), seeded);
		assert_eq!(cache.source().calls(), 0);

		let skewed = ReuseTokenSource::new(ScriptedSource::new(0, fresh))
			.with_token(seeded)
			.with_expiry_skew(Duration::minutes(1));
		let token = skewed.token().await.expect("Skewed cache should refresh.");

		assert_eq!(token.access_token.expose(), "token-0");
		assert_eq!(skewed.source().calls(), 1);
	}

	#[tokio::test]
	async fn dropped_leader_does_not_strand_waiters() {
		let cache = Arc::new(ReuseTokenSource::new(ScriptedSource::new(500, fresh)));
		let leader = {
			let cache = cache.clone();

			tokio::spawn(async move {
				tokio::time::timeout(StdDuration::from_millis(20), cache.token()).await
			})
		};

		tokio::time::sleep(StdDuration::from_millis(5)).await;

		let waiter = {
			let cache = cache.clone();

			tokio::spawn(async move { cache.token().await })
		};

		assert!(leader.await.expect("Leader task should not panic.").is_err());

		let token = waiter
			.await
			.expect("Waiter task should not panic.")
			.expect("Waiter should retrieve a fresh token.");

		assert_eq!(token.access_token.expose(), "token-1");
		assert_eq!(cache.source().calls(), 2);
	}

	#[test]
	fn debug_reports_state_without_token() {
		let cache = ReuseTokenSource::new(ScriptedSource::new(0, fresh))
			.with_token(Token::new("hidden", "Bearer"));
		let rendered = format!("{cache:?}");

		assert!(rendered.contains("valid"));
		assert!(!rendered.contains("hidden"));
	}
}
