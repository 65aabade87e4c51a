//! Time source abstraction used for cache expiry and retry pacing.
//!
//! [`SystemClock`] backs production clients. [`ManualClock`] lets tests move time by hand: every
//! sleep registered against it completes as soon as [`ManualClock::advance`] carries the clock
//! past the sleep's deadline, so retry schedules can be driven without real waiting.

// std
use std::{
	sync::atomic::{AtomicBool, AtomicUsize, Ordering},
	task::{Context, Poll, Waker},
};
// self
use crate::_prelude::*;

/// Boxed future returned by [`Clock::sleep`].
pub type ClockFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Current-time and sleep capability injected into the client.
pub trait Clock: Send + Sync {
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;

	/// Completes once `duration` has elapsed on this clock.
	fn sleep(&self, duration: Duration) -> ClockFuture<'_>;
}

/// Wall-clock time backed by the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}

	fn sleep(&self, duration: Duration) -> ClockFuture<'_> {
		let duration = std::time::Duration::try_from(duration).unwrap_or_default();

		Box::pin(tokio::time::sleep(duration))
	}
}

/// Hand-driven clock for deterministic tests.
///
/// Clones share the same timeline. Sleeps with a non-positive duration complete immediately; time
/// saturates at the largest representable instant.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<ManualClockInner>);
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self(Arc::new(ManualClockInner {
			state: Mutex::new(ManualClockState {
				now: start,
				waiters: Vec::new(),
				sleeps: Vec::new(),
			}),
			auto_advance: AtomicBool::new(false),
		}))
	}

	/// Makes every sleep advance the clock by its duration and complete immediately.
	pub fn with_auto_advance(self) -> Self {
		self.0.auto_advance.store(true, Ordering::SeqCst);

		self
	}

	/// Moves the clock forward and wakes every sleep whose deadline has passed.
	pub fn advance(&self, by: Duration) {
		let wakers = {
			let mut state = self.0.state.lock();

			state.now = state.now.saturating_add(by);

			let now = state.now;
			let (due, pending): (Vec<_>, Vec<_>) =
				state.waiters.drain(..).partition(|waiter| waiter.deadline <= now);

			state.waiters = pending;

			due
		};

		for waiter in wakers {
			waiter.waker.wake();
		}
	}

	/// Every duration passed to [`Clock::sleep`] so far, in call order.
	pub fn sleeps(&self) -> Vec<Duration> {
		self.0.state.lock().sleeps.clone()
	}

	/// Number of sleeps currently blocked on this clock.
	pub fn pending_sleeps(&self) -> usize {
		self.0.state.lock().waiters.len()
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		self.0.state.lock().now
	}

	fn sleep(&self, duration: Duration) -> ClockFuture<'_> {
		let deadline = {
			let mut state = self.0.state.lock();
			let duration = duration.max(Duration::ZERO);

			state.sleeps.push(duration);

			if self.0.auto_advance.load(Ordering::SeqCst) {
				state.now = state.now.saturating_add(duration);

				state.now
			} else {
				state.now.saturating_add(duration)
			}
		};

		Box::pin(ManualSleep { clock: Arc::clone(&self.0), deadline, id: None })
	}
}

#[derive(Debug)]
struct ManualClockInner {
	state: Mutex<ManualClockState>,
	auto_advance: AtomicBool,
}

#[derive(Debug)]
struct ManualClockState {
	now: OffsetDateTime,
	waiters: Vec<Waiter>,
	sleeps: Vec<Duration>,
}

#[derive(Debug)]
struct Waiter {
	id: usize,
	deadline: OffsetDateTime,
	waker: Waker,
}

struct ManualSleep {
	clock: Arc<ManualClockInner>,
	deadline: OffsetDateTime,
	id: Option<usize>,
}
impl Future for ManualSleep {
	type Output = ();

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
		let this = self.get_mut();
		let mut state = this.clock.state.lock();

		if state.now >= this.deadline {
			return Poll::Ready(());
		}

		let id = *this.id.get_or_insert_with(next_sleep_id);

		match state.waiters.iter_mut().find(|waiter| waiter.id == id) {
			Some(waiter) => waiter.waker.clone_from(cx.waker()),
			None => state.waiters.push(Waiter {
				id,
				deadline: this.deadline,
				waker: cx.waker().clone(),
			}),
		}

		Poll::Pending
	}
}
impl Drop for ManualSleep {
	fn drop(&mut self) {
		if let Some(id) = self.id {
			self.clock.state.lock().waiters.retain(|waiter| waiter.id != id);
		}
	}
}

fn next_sleep_id() -> usize {
	static NEXT: AtomicUsize = AtomicUsize::new(1);

	NEXT.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::test_epoch;

	#[test]
	fn manual_clock_advances_shared_timeline() {
		let clock = ManualClock::new(test_epoch());
		let other = clock.clone();

		clock.advance(Duration::seconds(90));

		assert_eq!(other.now(), test_epoch() + Duration::seconds(90));
	}

	#[tokio::test]
	async fn auto_advance_completes_sleeps_immediately() {
		let clock = ManualClock::new(test_epoch()).with_auto_advance();

		clock.sleep(Duration::seconds(15)).await;
		clock.sleep(Duration::seconds(15)).await;

		assert_eq!(clock.now(), test_epoch() + Duration::seconds(30));
		assert_eq!(clock.sleeps(), vec![Duration::seconds(15), Duration::seconds(15)]);
		assert_eq!(clock.pending_sleeps(), 0);
	}

	#[tokio::test]
	async fn advance_wakes_pending_sleep_once_deadline_passes() {
		let clock = ManualClock::new(test_epoch());
		let done = Arc::new(AtomicBool::new(false));
		let task = tokio::spawn({
			let clock = clock.clone();
			let done = Arc::clone(&done);

			async move {
				clock.sleep(Duration::seconds(10)).await;
				done.store(true, Ordering::SeqCst);
			}
		});

		while clock.pending_sleeps() == 0 {
			tokio::task::yield_now().await;
		}

		clock.advance(Duration::seconds(5));
		tokio::task::yield_now().await;

		assert!(!done.load(Ordering::SeqCst));
		assert_eq!(clock.pending_sleeps(), 1);

		clock.advance(Duration::seconds(5));
		task.await.expect("Sleeping task should complete after the deadline.");

		assert!(done.load(Ordering::SeqCst));
		assert_eq!(clock.pending_sleeps(), 0);
	}

	#[tokio::test]
	async fn huge_durations_saturate_instead_of_overflowing() {
		let clock = ManualClock::new(test_epoch()).with_auto_advance();

		clock.sleep(Duration::milliseconds(i64::MAX)).await;

		let ceiling = clock.now();

		assert!(ceiling > test_epoch());

		clock.sleep(Duration::seconds(15)).await;
		clock.advance(Duration::MAX);

		assert_eq!(clock.now(), ceiling);

		let manual = ManualClock::new(test_epoch());
		let sleeper = manual.clone();
		let task = tokio::spawn(async move { sleeper.sleep(Duration::MAX).await });

		while manual.pending_sleeps() == 0 {
			tokio::task::yield_now().await;
		}

		manual.advance(Duration::MAX);
		task.await.expect("Saturated sleep should complete once the clock saturates.");

		assert_eq!(manual.pending_sleeps(), 0);
	}

	#[tokio::test]
	async fn zero_sleep_completes_without_advancing() {
		let clock = ManualClock::new(test_epoch());

		clock.sleep(Duration::ZERO).await;

		assert_eq!(clock.now(), test_epoch());
	}
}
