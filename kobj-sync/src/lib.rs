//! Synchronization primitives for the kobj dispatch runtime.
//!
//! Everything here is spin-based; nothing suspends or blocks on an
//! external scheduler, making the primitives usable from interrupt-like
//! contexts where the dispatch runtime may be invoked.
#![cfg_attr(not(test), no_std)]

use core::{
	cell::UnsafeCell,
	mem::MaybeUninit,
	ops::{Deref, DerefMut},
	sync::atomic::{
		AtomicBool, AtomicU8, AtomicUsize,
		Ordering::{AcqRel, Acquire, Relaxed, Release},
	},
};

/// The number of iterations to wait for a stale ticket mutex lock.
const TICKET_MUTEX_TIMEOUT: usize = 1000;

/// Standardized lock interface implemented for all lock types.
pub trait Lock {
	/// The target type of value being guarded.
	type Target: Send + 'static;

	/// The lock guard type used by the lock implementation.
	type Guard<'a>: Drop + Deref<Target = Self::Target> + DerefMut
	where
		Self: 'a;

	/// Acquires a lock, blocking until it's available.
	fn lock(&self) -> Self::Guard<'_>;
}

/// A simple unfair, greedy spinlock. The most efficient lock
/// available in this library; used for short critical sections
/// such as inline cache slot updates.
pub struct Mutex<T: Send + 'static> {
	/// The guarded value.
	value:  UnsafeCell<T>,
	/// Whether or not the lock is taken.
	locked: AtomicBool,
}

// SAFETY: We are implementing a safe interface around a mutex so we can assert `Sync`.
unsafe impl<T: Send + 'static> Sync for Mutex<T> {}

impl<T: Send + 'static> Mutex<T> {
	/// Creates a new spinlock mutex for the given value.
	pub const fn new(value: T) -> Self {
		Self {
			value:  UnsafeCell::new(value),
			locked: AtomicBool::new(false),
		}
	}
}

impl<T: Send + 'static> Lock for Mutex<T> {
	type Guard<'a> = MutexGuard<'a, T>;
	type Target = T;

	fn lock(&self) -> Self::Guard<'_> {
		loop {
			if !self.locked.swap(true, Acquire) {
				return MutexGuard { lock: self };
			}

			::core::hint::spin_loop();
		}
	}
}

impl<T: Default + Send + 'static> Default for Mutex<T> {
	fn default() -> Self {
		Self::new(T::default())
	}
}

/// A mutex guard for the simple [`Mutex`] type.
pub struct MutexGuard<'a, T: Send + 'static>
where
	Self: 'a,
{
	/// A reference to the lock for which we have a guard.
	lock: &'a Mutex<T>,
}

impl<T: Send + 'static> Drop for MutexGuard<'_, T> {
	fn drop(&mut self) {
		self.lock.locked.store(false, Release);
	}
}

impl<T: Send + 'static> Deref for MutexGuard<'_, T> {
	type Target = T;

	fn deref(&self) -> &Self::Target {
		// SAFETY: We have guaranteed singular access as we're locked.
		unsafe { &*self.lock.value.get() }
	}
}

impl<T: Send + 'static> DerefMut for MutexGuard<'_, T> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		// SAFETY: We have guaranteed singular access as we're locked.
		unsafe { &mut *self.lock.value.get() }
	}
}

/// A ticketed, fair mutex implementation.
///
/// Used where contention is expected to be longer-lived than an inline
/// cache update, namely the registry's declaration tables.
pub struct TicketMutex<T: Send + 'static> {
	/// The guarded value.
	value:       UnsafeCell<T>,
	/// The currently served ticket.
	now_serving: AtomicUsize,
	/// The next ticket.
	next_ticket: AtomicUsize,
	/// Whether or not we've locked the lock.
	locked:      AtomicBool,
}

// SAFETY: We are implementing a safe interface around a mutex so we can assert `Sync`.
unsafe impl<T: Send + 'static> Sync for TicketMutex<T> {}

impl<T: Send + 'static> TicketMutex<T> {
	/// Creates a new ticket mutex.
	pub const fn new(value: T) -> Self {
		Self {
			value:       UnsafeCell::new(value),
			now_serving: AtomicUsize::new(0),
			next_ticket: AtomicUsize::new(0),
			locked:      AtomicBool::new(false),
		}
	}
}

impl<T: Send + 'static> Lock for TicketMutex<T> {
	type Guard<'a> = TicketMutexGuard<'a, T>;
	type Target = T;

	fn lock(&self) -> Self::Guard<'_> {
		'new_ticket: loop {
			let ticket = self.next_ticket.fetch_add(1, Relaxed);
			let mut old_now_serving = self.now_serving.load(Acquire);

			let mut timeout = TICKET_MUTEX_TIMEOUT;

			loop {
				let now_serving = self.now_serving.load(Acquire);

				// NOTE: The wrapping is intentional and desirable.
				#[expect(clippy::cast_possible_wrap)]
				let position = ticket.wrapping_sub(now_serving) as isize;

				if position == 0 && !self.locked.swap(true, AcqRel) {
					return TicketMutexGuard { lock: self, ticket };
				}

				if position < 0 {
					// We've been forcibly skipped; obtain a new ticket
					// and start over.
					continue 'new_ticket;
				}

				// If the ticket has been advanced, then reset the timeout.
				if now_serving != old_now_serving {
					old_now_serving = now_serving;
					timeout = TICKET_MUTEX_TIMEOUT;
				} else if !self.locked.load(Acquire) {
					timeout -= 1;

					if timeout == 0 {
						// The existing ticket has timed out; forcibly un-deadlock it.
						// We don't care about the result here; if another thread already
						// updated it, we honor that; otherwise ours is guaranteed to succeed.
						let _ = self.now_serving.compare_exchange(
							now_serving,
							now_serving.wrapping_add(1),
							AcqRel,
							Relaxed,
						);
					}
				}

				::core::hint::spin_loop();
			}
		}
	}
}

impl<T: Default + Send + 'static> Default for TicketMutex<T> {
	fn default() -> Self {
		Self::new(T::default())
	}
}

/// A lock guard for a [`TicketMutex`].
pub struct TicketMutexGuard<'a, T: Send + 'static>
where
	Self: 'a,
{
	/// The lock we are guarding.
	lock:   &'a TicketMutex<T>,
	/// Our ticket.
	ticket: usize,
}

impl<T: Send + 'static> Drop for TicketMutexGuard<'_, T> {
	fn drop(&mut self) {
		let _ = self.lock.now_serving.compare_exchange(
			self.ticket,
			self.ticket.wrapping_add(1),
			Release,
			Relaxed,
		);
		self.lock.locked.store(false, Release);
	}
}

impl<T: Send + 'static> Deref for TicketMutexGuard<'_, T> {
	type Target = T;

	fn deref(&self) -> &Self::Target {
		// SAFETY: We have guaranteed singular access as we're locked.
		unsafe { &*self.lock.value.get() }
	}
}

impl<T: Send + 'static> DerefMut for TicketMutexGuard<'_, T> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		// SAFETY: We have guaranteed singular access as we're locked.
		unsafe { &mut *self.lock.value.get() }
	}
}

/// The cell has not been initialized and nobody is initializing it.
const ONCE_UNINIT: u8 = 0;
/// A thread has claimed the cell and is running the initializer.
const ONCE_BUSY: u8 = 1;
/// The value has been published and may be read freely.
const ONCE_READY: u8 = 2;

/// A write-once cell implementing the exclusive-or-wait pattern.
///
/// The first caller of [`Once::get_or_init`] claims the cell and runs
/// the initializer exactly once; concurrent callers spin until the
/// winner publishes the value. No caller ever observes a partially
/// initialized value.
pub struct Once<T: Send + 'static> {
	/// Initialization state; one of the `ONCE_*` constants.
	state: AtomicU8,
	/// The value; only valid once `state` is [`ONCE_READY`].
	value: UnsafeCell<MaybeUninit<T>>,
}

// SAFETY: Access to the inner value is gated on the `ONCE_READY` state,
// SAFETY: after which it is only ever read.
unsafe impl<T: Send + Sync + 'static> Sync for Once<T> {}
// SAFETY: The cell owns its value; sending the cell sends the value.
unsafe impl<T: Send + 'static> Send for Once<T> {}

impl<T: Send + 'static> Once<T> {
	/// Creates a new, uninitialized cell.
	#[must_use]
	pub const fn new() -> Self {
		Self {
			state: AtomicU8::new(ONCE_UNINIT),
			value: UnsafeCell::new(MaybeUninit::uninit()),
		}
	}

	/// Returns a reference to the value, if it has been published.
	#[must_use]
	pub fn get(&self) -> Option<&T> {
		if self.state.load(Acquire) == ONCE_READY {
			// SAFETY: `ONCE_READY` is only stored after the value is written,
			// SAFETY: and the value is never written again.
			Some(unsafe { (*self.value.get()).assume_init_ref() })
		} else {
			None
		}
	}

	/// Returns whether initialization has started (or finished).
	///
	/// Once this returns `true` it never returns `false` again.
	#[must_use]
	pub fn is_started(&self) -> bool {
		self.state.load(Acquire) != ONCE_UNINIT
	}

	/// Returns a reference to the value, initializing it via `f` if the
	/// cell is uninitialized.
	///
	/// Exactly one caller runs `f`; all others spin until the value is
	/// published.
	pub fn get_or_init(&self, f: impl FnOnce() -> T) -> &T {
		if self
			.state
			.compare_exchange(ONCE_UNINIT, ONCE_BUSY, Acquire, Acquire)
			.is_ok()
		{
			// We won the claim; initialize and publish.
			let value = f();
			// SAFETY: We hold the exclusive `ONCE_BUSY` claim; nobody else
			// SAFETY: reads or writes the value until `ONCE_READY` is stored.
			unsafe { (*self.value.get()).write(value) };
			self.state.store(ONCE_READY, Release);
		} else {
			while self.state.load(Acquire) != ONCE_READY {
				::core::hint::spin_loop();
			}
		}

		// SAFETY: The state is `ONCE_READY`; the value is initialized
		// SAFETY: and will never be written again.
		unsafe { (*self.value.get()).assume_init_ref() }
	}
}

impl<T: Send + 'static> Default for Once<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Send + 'static> Drop for Once<T> {
	fn drop(&mut self) {
		if *self.state.get_mut() == ONCE_READY {
			// SAFETY: The value was initialized and never dropped elsewhere.
			unsafe { self.value.get_mut().assume_init_drop() };
		}
	}
}
