//! The process-wide registration surface: interface and class
//! namespaces, object binding and diagnostics.

use alloc::{string::String, sync::Arc, vec::Vec};

use kobj_sync::{Lock, Once, TicketMutex};

use crate::{
	class::{Binding, ClassNode},
	error::Error,
	interface::Interface,
	object::{Object, ObjectData},
	table::NameTable,
};

/// The registry: the namespaces of declared interfaces and classes.
///
/// Populated during the single-threaded initialization phase and
/// read-only afterward during normal operation; [`Registry::reset`] is
/// an explicit test-harness operation, not part of the driver-facing
/// lifecycle.
pub struct Registry {
	/// Declared interfaces, in declaration order.
	interfaces: TicketMutex<Vec<Arc<Interface>>>,
	/// Declared classes, by name.
	classes:    TicketMutex<NameTable<Arc<ClassNode>>>,
}

impl Registry {
	/// Creates a new, empty registry.
	#[must_use]
	pub fn new() -> Self {
		Self {
			interfaces: TicketMutex::new(Vec::new()),
			classes:    TicketMutex::new(NameTable::new()),
		}
	}

	/// Declares a new interface.
	///
	/// Fails with [`Error::DuplicateInterface`] if the name is taken.
	pub fn declare_interface(&self, name: &str) -> Result<Arc<Interface>, Error> {
		let mut interfaces = self.interfaces.lock();

		if interfaces.iter().any(|i| i.name() == name) {
			return Err(Error::DuplicateInterface(String::from(name)));
		}

		let iface = Interface::new(name);
		interfaces.push(iface.clone());
		Ok(iface)
	}

	/// Looks up a declared interface by name.
	#[must_use]
	pub fn interface(&self, name: &str) -> Option<Arc<Interface>> {
		self.interfaces.lock().iter().find(|i| i.name() == name).cloned()
	}

	/// Declares a new class with the given parents, in
	/// resolution-priority order.
	///
	/// Fails with [`Error::CyclicClassGraph`] if the name already
	/// appears anywhere in the supplied parents' ancestry (the named
	/// class graph would close a cycle), or with
	/// [`Error::DuplicateClass`] if the name is taken. Neither failure
	/// registers any partial state.
	pub fn declare_class(
		&self,
		name: &str,
		parents: &[Arc<ClassNode>],
	) -> Result<Arc<ClassNode>, Error> {
		if let Some(through) = parents.iter().find(|p| p.ancestry_contains(name)) {
			return Err(Error::CyclicClassGraph {
				class:   String::from(name),
				through: String::from(through.name()),
			});
		}

		let mut classes = self.classes.lock();

		if classes.contains(name) {
			return Err(Error::DuplicateClass(String::from(name)));
		}

		let class = ClassNode::new(name, parents.to_vec());
		classes.insert(String::from(name), class.clone());
		Ok(class)
	}

	/// Looks up a declared class by name.
	#[must_use]
	pub fn class(&self, name: &str) -> Option<Arc<ClassNode>> {
		self.classes.lock().get(name).cloned()
	}

	/// Binds a new object handle to the named class.
	///
	/// Fails with [`Error::UnknownClass`] if the class was never
	/// registered.
	pub fn bind(&self, class: &str) -> Result<Object, Error> {
		self.bind_inner(class, None)
	}

	/// Binds a new object handle to the named class, attaching
	/// per-instance state reachable via [`Object::data`].
	pub fn bind_with(&self, class: &str, data: ObjectData) -> Result<Object, Error> {
		self.bind_inner(class, Some(data))
	}

	/// Shared bind path.
	fn bind_inner(&self, class: &str, data: Option<ObjectData>) -> Result<Object, Error> {
		let node = self
			.class(class)
			.ok_or_else(|| Error::UnknownClass(String::from(class)))?;
		Ok(Object::bind(node, data))
	}

	/// Describes how the named class binds every method declared on
	/// every registered interface, in declaration order.
	///
	/// Diagnostic only; bypasses and never perturbs inline caches.
	/// Note that this resolves against the class and therefore freezes
	/// it, like any other first use.
	pub fn describe(&self, class: &str) -> Result<Vec<(String, Binding)>, Error> {
		let node = self
			.class(class)
			.ok_or_else(|| Error::UnknownClass(String::from(class)))?;

		let interfaces = self.interfaces.lock().clone();
		let mut out = Vec::new();

		for iface in interfaces {
			for desc in iface.methods() {
				out.push((String::from(desc.name()), node.binding(&desc)));
			}
		}

		Ok(out)
	}

	/// Clears every declared interface and class.
	///
	/// This is a test-harness operation; production registration
	/// happens once at initialization and is never torn down. Stale
	/// `Arc`s held by callers keep working, and inline caches can
	/// never alias a newly declared class because identities are never
	/// reused.
	pub fn reset(&self) {
		self.interfaces.lock().clear();
		self.classes.lock().clear();
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

/// Returns the process-wide registry.
///
/// Driver frameworks that don't scope their own [`Registry`] register
/// and bind through this one. It is never torn down.
#[must_use]
pub fn registry() -> &'static Registry {
	#[doc(hidden)]
	static REGISTRY: Once<Registry> = Once::new();

	REGISTRY.get_or_init(Registry::new)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn duplicate_names_are_rejected() {
		let reg = Registry::new();

		reg.declare_interface("ata").unwrap();
		assert_eq!(
			reg.declare_interface("ata").unwrap_err(),
			Error::DuplicateInterface(String::from("ata"))
		);

		reg.declare_class("controller", &[]).unwrap();
		assert_eq!(
			reg.declare_class("controller", &[]).unwrap_err(),
			Error::DuplicateClass(String::from("controller"))
		);
	}

	#[test]
	fn cycle_rejection_registers_no_partial_state() {
		let reg = Registry::new();

		let x = reg.declare_class("x", &[]).unwrap();
		let y = reg.declare_class("y", &[x.clone()]).unwrap();

		// Directly self-parented.
		assert_eq!(
			reg.declare_class("x", &[x]).unwrap_err(),
			Error::CyclicClassGraph {
				class:   String::from("x"),
				through: String::from("x"),
			}
		);
		// Transitively self-parented (x is y's ancestor). The cycle
		// diagnosis wins over the duplicate-name one.
		assert_eq!(
			reg.declare_class("x", &[y]).unwrap_err(),
			Error::CyclicClassGraph {
				class:   String::from("x"),
				through: String::from("y"),
			}
		);
		// The original `x` is untouched.
		assert!(reg.class("x").is_some());
		assert_eq!(reg.class("x").unwrap().parents().len(), 0);
	}

	#[test]
	fn bind_unknown_class_fails() {
		let reg = Registry::new();
		assert_eq!(
			reg.bind("ghost").unwrap_err(),
			Error::UnknownClass(String::from("ghost"))
		);
	}

	#[test]
	fn reset_clears_namespaces() {
		let reg = Registry::new();
		reg.declare_interface("i").unwrap();
		reg.declare_class("c", &[]).unwrap();

		reg.reset();
		assert!(reg.interface("i").is_none());
		assert!(reg.class("c").is_none());
		// The names are reusable after a reset.
		reg.declare_interface("i").unwrap();
		reg.declare_class("c", &[]).unwrap();
	}

	#[test]
	fn global_registry_is_stable() {
		let a = registry() as *const Registry;
		let b = registry() as *const Registry;
		assert_eq!(a, b);
	}
}
