//! ID- and name-keyed table abstractions backing the registry and the
//! compiled method tables.

use alloc::string::String;

use hashbrown::HashMap;

use crate::hash::IdentityBuildHasher;

/// A table of values indexed by an allocator-issued unique ID.
///
/// IDs come from [`crate::id::allocate`] and are unique and uniform,
/// so the table hashes by identity.
#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct IdTable<T>(HashMap<u64, T, IdentityBuildHasher>);

impl<T> IdTable<T> {
	/// Creates a new empty table.
	#[must_use]
	pub fn new() -> Self {
		Self(HashMap::default())
	}

	/// Inserts a value under the given ID, returning the previous value
	/// if one existed.
	#[inline]
	pub fn insert(&mut self, id: u64, value: T) -> Option<T> {
		self.0.insert(id, value)
	}

	/// Inserts a value under the given ID only if the ID is absent.
	#[inline]
	pub fn insert_if_absent(&mut self, id: u64, value: T) {
		self.0.entry(id).or_insert(value);
	}

	/// Returns a reference to the value associated with the given ID.
	#[inline]
	#[must_use]
	pub fn get(&self, id: u64) -> Option<&T> {
		self.0.get(&id)
	}

	/// Returns whether the given ID exists in the table.
	#[inline]
	#[must_use]
	pub fn contains(&self, id: u64) -> bool {
		self.0.contains_key(&id)
	}

	/// Removes a value given its ID. Returns `None` if it didn't exist.
	#[inline]
	pub fn remove(&mut self, id: u64) -> Option<T> {
		self.0.remove(&id)
	}

	/// Returns the number of entries in the table.
	#[inline]
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns whether the table is empty.
	#[inline]
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over `(id, value)` pairs in unspecified order.
	pub fn iter(&self) -> impl Iterator<Item = (u64, &T)> {
		self.0.iter().map(|(id, value)| (*id, value))
	}

	/// Removes every entry from the table.
	#[inline]
	pub fn clear(&mut self) {
		self.0.clear();
	}
}

impl<T> Default for IdTable<T> {
	fn default() -> Self {
		Self::new()
	}
}

/// A table of values indexed by a declared name.
///
/// Names are user-supplied strings; unlike [`IdTable`] keys they need
/// real mixing, so this uses `foldhash`'s fixed-seed state.
#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct NameTable<T>(HashMap<String, T, foldhash::fast::FixedState>);

impl<T> NameTable<T> {
	/// Creates a new empty table.
	#[must_use]
	pub fn new() -> Self {
		Self(HashMap::default())
	}

	/// Inserts a value under the given name, returning the previous
	/// value if one existed.
	#[inline]
	pub fn insert(&mut self, name: String, value: T) -> Option<T> {
		self.0.insert(name, value)
	}

	/// Returns a reference to the value associated with the given name.
	#[inline]
	#[must_use]
	pub fn get(&self, name: &str) -> Option<&T> {
		self.0.get(name)
	}

	/// Returns whether the given name exists in the table.
	#[inline]
	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	/// Returns the number of entries in the table.
	#[inline]
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns whether the table is empty.
	#[inline]
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Removes every entry from the table.
	#[inline]
	pub fn clear(&mut self) {
		self.0.clear();
	}
}

impl<T> Default for NameTable<T> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use alloc::string::ToString;

	use super::*;

	#[test]
	fn id_table_round_trip() {
		let mut table = IdTable::new();
		let id = crate::id::allocate();

		assert!(table.is_empty());
		assert!(table.insert(id, "first").is_none());
		assert_eq!(table.insert(id, "second"), Some("first"));
		table.insert_if_absent(id, "third");
		assert_eq!(table.get(id), Some(&"second"));
		assert!(table.contains(id));
		assert_eq!(table.len(), 1);
		assert_eq!(table.remove(id), Some("second"));
		assert!(!table.contains(id));
	}

	#[test]
	fn name_table_round_trip() {
		let mut table = NameTable::new();

		assert!(table.insert("disk".to_string(), 1_u32).is_none());
		assert_eq!(table.insert("disk".to_string(), 2), Some(1));
		assert_eq!(table.get("disk"), Some(&2));
		assert!(!table.contains("tape"));
		table.clear();
		assert!(table.is_empty());
	}
}
