//! Hashing implementations.
//!
//! Note that these implementations impose strict rules for how they are
//! used, and under which circumstances they are safe.

use core::hash::{BuildHasher, Hasher};

/// Builder for an [`IdentityHasher`].
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityBuildHasher;

impl BuildHasher for IdentityBuildHasher {
	type Hasher = IdentityHasher;

	fn build_hasher(&self) -> Self::Hasher {
		IdentityHasher::default()
	}
}

/// A strict identity hasher that only hashes `u64` values (by returning
/// the value itself). Only allows a single `u64` to be passed to the
/// hasher.
///
/// The IDs handed out by [`crate::id::allocate`] are already unique and
/// uniformly usable as hash values, so tables keyed by them need no
/// mixing at all.
///
/// # Safety
/// This hasher is only safe to use with tables keyed by allocator-issued
/// IDs. **Do not use it for any other purpose.** Any hash request other
/// than exactly one `write_u64` panics.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityHasher {
	/// The hashed value, or 0 if it's not been hashed.
	value: u64,
	/// Debug-only: whether the hasher has populated a value.
	#[cfg(debug_assertions)]
	used:  bool,
}

impl Hasher for IdentityHasher {
	// Every non-`u64` write funnels through the default `write_*`
	// implementations into this method, so a single assertion covers
	// all misuse.
	fn write(&mut self, _bytes: &[u8]) {
		unreachable!("IdentityHasher used with a non-u64 key");
	}

	fn finish(&self) -> u64 {
		#[cfg(debug_assertions)]
		{
			debug_assert!(self.used, "IdentityHasher::finish called before any writes");
		}

		self.value
	}

	fn write_u64(&mut self, i: u64) {
		#[cfg(debug_assertions)]
		{
			debug_assert!(!self.used, "IdentityHasher::write_u64 called multiple times");

			self.used = true;
		}

		self.value = i;
	}
}

#[cfg(test)]
mod tests {
	use core::hash::{BuildHasher, Hasher};

	use super::*;

	#[test]
	fn identity_hash_is_the_value() {
		let mut hasher = IdentityBuildHasher.build_hasher();
		hasher.write_u64(0xDEAD_BEEF);
		assert_eq!(hasher.finish(), 0xDEAD_BEEF);
	}

	#[test]
	#[should_panic(expected = "non-u64 key")]
	fn rejects_byte_writes() {
		let mut hasher = IdentityBuildHasher.build_hasher();
		hasher.write(b"nope");
	}
}
