//! Interfaces: named, ordered sets of method descriptors that a family
//! of classes may implement.

use alloc::{string::String, sync::Arc, vec::Vec};

use kobj_sync::{Lock, Mutex};

use crate::{
	error::Error,
	method::{MethodDescriptor, MethodFn},
};

/// A named, ordered set of method descriptors.
///
/// Created at registration time and immutable thereafter apart from
/// method declaration, which is expected to happen during the
/// single-threaded initialization phase. Descriptor order is the
/// declaration order; it has no dispatch meaning, only diagnostic
/// value.
pub struct Interface {
	/// The interface name, unique within its registry.
	name:    String,
	/// The declared descriptors, in declaration order.
	methods: Mutex<Vec<Arc<MethodDescriptor>>>,
}

impl Interface {
	/// Creates a new, empty interface.
	pub(crate) fn new(name: &str) -> Arc<Self> {
		Arc::new(Self {
			name:    String::from(name),
			methods: Mutex::new(Vec::new()),
		})
	}

	/// The interface name.
	#[inline]
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Declares a method on this interface, optionally with a default
	/// implementation used when no class in an ancestry overrides it.
	///
	/// Fails with [`Error::DuplicateMethod`] if the name was already
	/// declared on this interface.
	pub fn declare_method(
		&self,
		name: &str,
		default_impl: Option<MethodFn>,
	) -> Result<Arc<MethodDescriptor>, Error> {
		let mut methods = self.methods.lock();

		if methods.iter().any(|m| m.name() == name) {
			return Err(Error::DuplicateMethod {
				interface: self.name.clone(),
				method:    String::from(name),
			});
		}

		let desc = MethodDescriptor::new(&self.name, name, default_impl);
		methods.push(desc.clone());
		Ok(desc)
	}

	/// Looks up a declared method by name.
	#[must_use]
	pub fn method(&self, name: &str) -> Option<Arc<MethodDescriptor>> {
		self.methods.lock().iter().find(|m| m.name() == name).cloned()
	}

	/// Returns the declared descriptors, in declaration order.
	#[must_use]
	pub fn methods(&self) -> Vec<Arc<MethodDescriptor>> {
		self.methods.lock().clone()
	}
}

impl core::fmt::Debug for Interface {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Interface")
			.field("name", &self.name)
			.field("methods", &self.methods.lock().len())
			.finish()
	}
}
