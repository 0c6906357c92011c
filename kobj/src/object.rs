//! Object handles: lightweight instance tags binding an object to its
//! class's compiled method table.

use alloc::{boxed::Box, sync::Arc};
use core::any::Any;

use crate::{
	class::ClassNode,
	error::Error,
	method::{Args, MethodDescriptor, Value},
};

/// Per-instance state attached to an object handle.
pub type ObjectData = Box<dyn Any + Send + Sync>;

/// A lightweight instance tag binding an object to its class.
///
/// Created when a driver instance is constructed and destroyed with
/// it; it never mutates the table it references. All polymorphic calls
/// go through [`Object::call`].
pub struct Object {
	/// The class this object is bound to.
	class: Arc<ClassNode>,
	/// Optional instance state, reachable from implementations via
	/// [`Object::data`].
	data:  Option<ObjectData>,
}

impl Object {
	/// Binds a new object handle to the given class.
	pub(crate) fn bind(class: Arc<ClassNode>, data: Option<ObjectData>) -> Self {
		class.instance_created();
		Self { class, data }
	}

	/// The class this object is bound to.
	#[inline]
	#[must_use]
	pub fn class(&self) -> &Arc<ClassNode> {
		&self.class
	}

	/// Downcasts the instance state, if any was attached and it is of
	/// type `T`.
	#[must_use]
	pub fn data<T: Any>(&self) -> Option<&T> {
		self.data.as_ref().and_then(|d| d.downcast_ref())
	}

	/// Dispatches the given method against this object.
	///
	/// The descriptor's inline cache is consulted first: if it
	/// remembers this object's class, the cached binding is used with
	/// no table lookup. Otherwise the class's compiled table resolves
	/// the method (compiling it on first use), the cache is refilled,
	/// and the binding is invoked. The callee's result is returned
	/// verbatim.
	///
	/// A call site alternating between classes misses the cache every
	/// time but never calls the wrong class's implementation; the
	/// cache is keyed by class identity and is a hint only.
	pub fn call(&self, desc: &MethodDescriptor, args: Args<'_>) -> Result<Value, Error> {
		let class_id = self.class.id();

		let resolved = desc.cached(class_id).unwrap_or_else(|| {
			let resolved = self.class.resolve(desc);
			desc.cache_store(class_id, resolved);
			resolved
		});

		resolved.invoke(self, args)
	}
}

impl Drop for Object {
	fn drop(&mut self) {
		self.class.instance_dropped();
	}
}

impl core::fmt::Debug for Object {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Object")
			.field("class", &self.class.name())
			.field("has_data", &self.data.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use alloc::{string::String, vec::Vec};

	use super::*;
	use crate::{interface::Interface, method::MethodFn};

	fn tag_a(_obj: &Object, _args: Args<'_>) -> Result<Value, Error> {
		Ok(Box::new("a") as Value)
	}

	fn tag_b(_obj: &Object, _args: Args<'_>) -> Result<Value, Error> {
		Ok(Box::new("b") as Value)
	}

	fn called_tag(obj: &Object, desc: &MethodDescriptor) -> &'static str {
		*obj.call(desc, &[]).unwrap().downcast::<&'static str>().unwrap()
	}

	#[test]
	fn alternating_classes_thrash_but_never_cross_call() {
		let iface = Interface::new("i");
		let m = iface.declare_method("m", None).unwrap();

		let c1 = ClassNode::new("c1", Vec::new());
		c1.override_method(&m, tag_a as MethodFn).unwrap();
		let c2 = ClassNode::new("c2", Vec::new());
		c2.override_method(&m, tag_b as MethodFn).unwrap();

		let o1 = Object::bind(c1, None);
		let o2 = Object::bind(c2, None);

		// Every alternating call is a cache miss, yet each object
		// always reaches its own class's implementation.
		for _ in 0..4 {
			assert_eq!(called_tag(&o1, &m), "a");
			assert_eq!(called_tag(&o2, &m), "b");
		}
	}

	#[test]
	fn cache_hit_matches_table_resolution() {
		let iface = Interface::new("i");
		let m = iface.declare_method("m", None).unwrap();

		let class = ClassNode::new("c", Vec::new());
		class.override_method(&m, tag_a as MethodFn).unwrap();

		let obj = Object::bind(class.clone(), None);
		// First call populates the cache; second call hits it.
		assert_eq!(called_tag(&obj, &m), "a");
		assert_eq!(called_tag(&obj, &m), "a");
		assert_eq!(class.resolve(&m).func() as usize, tag_a as usize);
	}

	#[test]
	fn dispatch_reports_missing_method_with_identity() {
		let iface = Interface::new("i");
		let m = iface.declare_method("absent", None).unwrap();
		let class = ClassNode::new("blob", Vec::new());

		let obj = Object::bind(class, None);
		let err = obj.call(&m, &[]).unwrap_err();
		assert_eq!(
			err,
			Error::MissingMethod {
				method: m.id(),
				class:  String::from("blob"),
			}
		);
	}

	#[test]
	fn instance_data_is_downcastable() {
		let class = ClassNode::new("c", Vec::new());
		let obj = Object::bind(class.clone(), Some(Box::new(42_u32)));

		assert_eq!(obj.data::<u32>(), Some(&42));
		assert_eq!(obj.data::<u64>(), None);
		assert_eq!(class.instances(), 1);
		drop(obj);
		assert_eq!(class.instances(), 0);
	}
}
