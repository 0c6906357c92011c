//! Globally unique identifier allocator and the typed ID wrappers
//! used throughout the dispatch runtime.

use core::{
	fmt,
	sync::atomic::{AtomicU64, Ordering},
};

/// Static, system-wide monotonically increasing resource counter.
///
/// Used for every identified resource kind; all resources are
/// guaranteed a unique ID, even across resource types. An ID is never
/// reused for the lifetime of the process.
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Allocates a new globally unique identifier.
///
/// Guaranteed to be unique across all threads, and monotonically
/// increasing. This function is lock-free.
///
/// Guaranteed never to return 0.
#[inline]
#[must_use]
pub fn allocate() -> u64 {
	COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// The stable identity of one abstract method declaration.
///
/// One ID is allocated per method descriptor; descriptors (and thus
/// their IDs) are shared by reference across every class asked to
/// resolve them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MethodId(u64);

impl MethodId {
	/// The reserved "no method" identity.
	///
	/// [`allocate`] never returns 0, so this can never collide with a
	/// declared method. Reported by the error trap when it is invoked
	/// outside the dispatch path, where the method identity is unknown.
	pub const NONE: Self = Self(0);

	/// Allocates a fresh method identity.
	#[must_use]
	pub(crate) fn allocate() -> Self {
		Self(allocate())
	}

	/// Rewraps a raw ID previously obtained from [`Self::raw`].
	#[inline]
	#[must_use]
	pub(crate) const fn from_raw(raw: u64) -> Self {
		Self(raw)
	}

	/// Returns the raw ID value.
	#[inline]
	#[must_use]
	pub fn raw(self) -> u64 {
		self.0
	}
}

impl fmt::Display for MethodId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "m#{}", self.0)
	}
}

/// The stable identity of one declared class.
///
/// Inline cache slots remember resolutions by class identity; because
/// IDs are never reused, a stale cache entry can never alias a newer
/// class, even across a registry reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ClassId(u64);

impl ClassId {
	/// Allocates a fresh class identity.
	#[must_use]
	pub(crate) fn allocate() -> Self {
		Self(allocate())
	}

	/// Returns the raw ID value.
	#[inline]
	#[must_use]
	pub fn raw(self) -> u64 {
		self.0
	}
}

impl fmt::Display for ClassId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "c#{}", self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ids_are_unique_and_nonzero() {
		let a = MethodId::allocate();
		let b = MethodId::allocate();
		let c = ClassId::allocate();

		assert_ne!(a, b);
		assert_ne!(a.raw(), 0);
		assert_ne!(b.raw(), 0);
		assert_ne!(c.raw(), 0);
		// Method and class IDs share one counter and never collide.
		assert_ne!(a.raw(), c.raw());
		assert_ne!(b.raw(), c.raw());
	}
}
