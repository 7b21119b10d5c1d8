//! Replay detection over (consumer key, token, nonce, timestamp) tuples.

// std
use std::collections::HashSet;
// self
use crate::_prelude::*;

/// Default clock-skew tolerance applied when none is configured.
pub const DEFAULT_MAX_SKEW: Duration = Duration::minutes(5);

#[derive(Clone, PartialEq, Eq, Hash)]
struct NonceKey {
	consumer_key: String,
	token: Option<String>,
	nonce: String,
	timestamp: i64,
}

/// Tracks accepted nonce tuples until their timestamps age past the skew window.
///
/// Entries older than the window need no tracking: the timestamp check alone
/// rejects them. Purging is housekeeping, not a correctness requirement.
pub struct NonceTracker {
	max_skew: Duration,
	seen: Mutex<HashSet<NonceKey>>,
}
impl NonceTracker {
	/// Creates a tracker with the provided skew tolerance.
	pub fn new(max_skew: Duration) -> Self {
		Self { max_skew, seen: Mutex::new(HashSet::new()) }
	}

	/// Returns the configured skew tolerance.
	pub fn max_skew(&self) -> Duration {
		self.max_skew
	}

	/// Validates and records a nonce tuple against the current clock.
	pub fn check_and_record(
		&self,
		consumer_key: &str,
		token: Option<&str>,
		nonce: &str,
		timestamp: i64,
	) -> Result<()> {
		self.check_and_record_at(consumer_key, token, nonce, timestamp, OffsetDateTime::now_utc())
	}

	/// Validates and records a nonce tuple against an explicit clock instant.
	///
	/// Rejects timestamps outside the skew window with
	/// [`Error::TimestampOutOfRange`] and previously accepted tuples with
	/// [`Error::ReplayedNonce`]. The lock spans check and insert so two
	/// simultaneous submissions of one tuple cannot both be accepted.
	pub fn check_and_record_at(
		&self,
		consumer_key: &str,
		token: Option<&str>,
		nonce: &str,
		timestamp: i64,
		now: OffsetDateTime,
	) -> Result<()> {
		let skew_secs = self.max_skew.whole_seconds();

		if (now.unix_timestamp() - timestamp).abs() > skew_secs {
			return Err(Error::TimestampOutOfRange { timestamp, skew_secs });
		}

		let key = NonceKey {
			consumer_key: consumer_key.to_owned(),
			token: token.map(str::to_owned),
			nonce: nonce.to_owned(),
			timestamp,
		};
		let mut seen = self.seen.lock();

		Self::purge_locked(&mut seen, now, skew_secs);

		if !seen.insert(key) {
			return Err(Error::ReplayedNonce);
		}

		Ok(())
	}

	/// Drops entries whose timestamps have aged past the skew window.
	pub fn purge_expired_at(&self, now: OffsetDateTime) {
		Self::purge_locked(&mut self.seen.lock(), now, self.max_skew.whole_seconds());
	}

	/// Number of tuples currently retained.
	pub fn tracked(&self) -> usize {
		self.seen.lock().len()
	}

	fn purge_locked(seen: &mut HashSet<NonceKey>, now: OffsetDateTime, skew_secs: i64) {
		let horizon = now.unix_timestamp() - skew_secs;

		seen.retain(|key| key.timestamp >= horizon);
	}
}
impl Default for NonceTracker {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_SKEW)
	}
}
impl Debug for NonceTracker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("NonceTracker")
			.field("max_skew", &self.max_skew)
			.field("tracked", &self.tracked())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const NOW: OffsetDateTime = macros::datetime!(2026-06-01 12:00 UTC);

	#[test]
	fn accepts_then_rejects_an_identical_tuple() {
		let tracker = NonceTracker::default();
		let ts = NOW.unix_timestamp();

		tracker
			.check_and_record_at("sampleconsumer", Some("token-1"), "nonce-1", ts, NOW)
			.expect("First submission of a nonce tuple should be accepted.");

		let second = tracker
			.check_and_record_at("sampleconsumer", Some("token-1"), "nonce-1", ts, NOW)
			.expect_err("Second submission of the same tuple should be rejected.");

		assert!(matches!(second, Error::ReplayedNonce));
	}

	#[test]
	fn tuples_differing_in_any_component_are_independent() {
		let tracker = NonceTracker::default();
		let ts = NOW.unix_timestamp();

		tracker
			.check_and_record_at("sampleconsumer", Some("token-1"), "nonce-1", ts, NOW)
			.expect("Baseline tuple should be accepted.");
		tracker
			.check_and_record_at("otherconsumer", Some("token-1"), "nonce-1", ts, NOW)
			.expect("A different consumer key makes the tuple fresh.");
		tracker
			.check_and_record_at("sampleconsumer", None, "nonce-1", ts, NOW)
			.expect("A tokenless submission is a distinct tuple.");
		tracker
			.check_and_record_at("sampleconsumer", Some("token-1"), "nonce-2", ts, NOW)
			.expect("A fresh nonce makes the tuple fresh.");
	}

	#[test]
	fn stale_and_future_timestamps_are_rejected() {
		let tracker = NonceTracker::new(Duration::minutes(5));
		let stale = (NOW - Duration::minutes(6)).unix_timestamp();
		let future = (NOW + Duration::minutes(6)).unix_timestamp();

		assert!(matches!(
			tracker.check_and_record_at("sampleconsumer", None, "nonce-1", stale, NOW),
			Err(Error::TimestampOutOfRange { skew_secs: 300, .. })
		));
		assert!(matches!(
			tracker.check_and_record_at("sampleconsumer", None, "nonce-2", future, NOW),
			Err(Error::TimestampOutOfRange { .. })
		));
		assert_eq!(tracker.tracked(), 0);
	}

	#[test]
	fn purge_drops_only_aged_entries() {
		let tracker = NonceTracker::new(Duration::minutes(5));
		let old_ts = (NOW - Duration::minutes(4)).unix_timestamp();
		let fresh_ts = NOW.unix_timestamp();

		tracker
			.check_and_record_at("sampleconsumer", None, "nonce-old", old_ts, NOW)
			.expect("Tuple within the window should be accepted.");
		tracker
			.check_and_record_at("sampleconsumer", None, "nonce-new", fresh_ts, NOW)
			.expect("Fresh tuple should be accepted.");
		assert_eq!(tracker.tracked(), 2);

		// Two minutes later the old entry ages out; the fresh one stays.
		tracker.purge_expired_at(NOW + Duration::minutes(2));

		assert_eq!(tracker.tracked(), 1);

		// Replaying the purged tuple still fails: its timestamp is now outside
		// the skew window, so the timestamp check rejects it first.
		assert!(matches!(
			tracker.check_and_record_at(
				"sampleconsumer",
				None,
				"nonce-old",
				old_ts,
				NOW + Duration::minutes(2)
			),
			Err(Error::TimestampOutOfRange { .. })
		));
	}

	#[test]
	fn replay_within_window_is_rejected_even_after_other_purges() {
		let tracker = NonceTracker::new(Duration::minutes(5));
		let ts = NOW.unix_timestamp();

		tracker
			.check_and_record_at("sampleconsumer", None, "nonce-1", ts, NOW)
			.expect("Initial tuple should be accepted.");
		tracker.purge_expired_at(NOW + Duration::minutes(1));

		assert!(matches!(
			tracker.check_and_record_at(
				"sampleconsumer",
				None,
				"nonce-1",
				ts,
				NOW + Duration::minutes(1)
			),
			Err(Error::ReplayedNonce)
		));
	}
}
