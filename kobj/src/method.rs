//! Method descriptors: the identity, default implementation and inline
//! cache state for one abstract operation, plus the resolved-method
//! value type the table compiler produces.

use alloc::{boxed::Box, string::String, sync::Arc};
use core::any::Any;

use kobj_sync::{Lock, Mutex};
use log::warn;

use crate::{
	error::Error,
	id::{ClassId, MethodId},
	object::Object,
};

/// The uniform value type carried into and out of dispatched methods.
///
/// The dispatch layer never interprets these; they are produced and
/// consumed entirely by the caller and the resolved implementation.
pub type Value = Box<dyn Any + Send>;

/// Caller-supplied arguments to a dispatched method.
pub type Args<'a> = &'a [Value];

/// The signature shared by every dispatched method implementation,
/// including interface defaults and the error trap.
pub type MethodFn = fn(&Object, Args<'_>) -> Result<Value, Error>;

/// The sentinel implementation bound to a method when a class neither
/// overrides it nor has a usable default.
///
/// It is a valid [`MethodFn`]; resolution marks bindings to it with
/// [`Origin::Trap`] so that "would trap" is a first-class, inspectable
/// outcome rather than a pointer comparison. Calling it always fails.
///
/// Invoked through the dispatch path, the failure carries the real
/// method identity; invoked directly, the method identity is unknown
/// and reported as [`MethodId::NONE`].
pub fn error_trap(obj: &Object, _args: Args<'_>) -> Result<Value, Error> {
	Err(Error::MissingMethod {
		method: MethodId::NONE,
		class:  String::from(obj.class().name()),
	})
}

/// Where a resolved implementation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
	/// An override declared by the class itself or inherited from an
	/// ancestor; carries the declaring class's identity.
	Override(ClassId),
	/// The declaring interface's default implementation.
	Default,
	/// The error trap; the method has no usable implementation.
	Trap,
}

/// One fully resolved `(method, implementation)` binding, as stored in
/// a compiled table entry or an inline cache slot.
#[derive(Debug, Clone, Copy)]
pub struct CompiledMethod {
	/// The method this binding resolves.
	method: MethodId,
	/// The resolved implementation.
	func:   MethodFn,
	/// Where the implementation came from.
	origin: Origin,
}

impl CompiledMethod {
	/// Creates a new binding.
	pub(crate) fn new(method: MethodId, func: MethodFn, origin: Origin) -> Self {
		Self {
			method,
			func,
			origin,
		}
	}

	/// The method this binding resolves.
	#[inline]
	#[must_use]
	pub fn method(&self) -> MethodId {
		self.method
	}

	/// The resolved implementation.
	#[inline]
	#[must_use]
	pub fn func(&self) -> MethodFn {
		self.func
	}

	/// Where the implementation came from.
	#[inline]
	#[must_use]
	pub fn origin(&self) -> Origin {
		self.origin
	}

	/// Whether this binding is the error trap.
	#[inline]
	#[must_use]
	pub fn is_trap(&self) -> bool {
		self.origin == Origin::Trap
	}

	/// Invokes the binding against the given object.
	///
	/// Trap bindings fail with [`Error::MissingMethod`] carrying the
	/// method identity and the object's class name; the trap never
	/// reaches driver code.
	pub fn invoke(&self, obj: &Object, args: Args<'_>) -> Result<Value, Error> {
		if self.is_trap() {
			warn!(
				"trapped call: method {} on class `{}`",
				self.method,
				obj.class().name()
			);
			return Err(Error::MissingMethod {
				method: self.method,
				class:  String::from(obj.class().name()),
			});
		}

		(self.func)(obj, args)
	}
}

/// The single-slot inline cache payload: the most recently resolved
/// class and its binding, always updated as one unit.
#[derive(Clone, Copy)]
struct CacheSlot {
	/// The class identity the binding was resolved against.
	class:  ClassId,
	/// The binding resolved for that class.
	method: CompiledMethod,
}

/// Identity, default implementation and inline cache for one abstract
/// operation.
///
/// Owned by the interface that declares it; shared by reference across
/// every class later asked to resolve it.
pub struct MethodDescriptor {
	/// The process-wide unique identity of this method.
	id:           MethodId,
	/// The declared method name, unique within the owning interface.
	name:         String,
	/// The name of the interface that declared this method.
	interface:    String,
	/// The interface-level default implementation, if any.
	default_impl: Option<MethodFn>,
	/// The inline cache slot.
	///
	/// A hint only: correctness never depends on it being fresh. A
	/// stale or cold slot falls back to full table resolution. The
	/// guarded pair moves as one unit, so a reader can never observe a
	/// binding paired with the wrong class identity.
	cache:        Mutex<Option<CacheSlot>>,
}

impl MethodDescriptor {
	/// Creates a new descriptor with a freshly allocated identity.
	pub(crate) fn new(interface: &str, name: &str, default_impl: Option<MethodFn>) -> Arc<Self> {
		Arc::new(Self {
			id: MethodId::allocate(),
			name: String::from(name),
			interface: String::from(interface),
			default_impl,
			cache: Mutex::new(None),
		})
	}

	/// The process-wide unique identity of this method.
	#[inline]
	#[must_use]
	pub fn id(&self) -> MethodId {
		self.id
	}

	/// The declared method name.
	#[inline]
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The name of the interface that declared this method.
	#[inline]
	#[must_use]
	pub fn interface(&self) -> &str {
		&self.interface
	}

	/// Whether the declaring interface supplied a default
	/// implementation.
	#[inline]
	#[must_use]
	pub fn has_default(&self) -> bool {
		self.default_impl.is_some()
	}

	/// Returns the cached binding if the slot remembers the given
	/// class, `None` on a cold or mismatched slot.
	#[inline]
	pub(crate) fn cached(&self, class: ClassId) -> Option<CompiledMethod> {
		match *self.cache.lock() {
			Some(slot) if slot.class == class => Some(slot.method),
			_ => None,
		}
	}

	/// Overwrites the cache slot with the given resolution.
	#[inline]
	pub(crate) fn cache_store(&self, class: ClassId, method: CompiledMethod) {
		*self.cache.lock() = Some(CacheSlot { class, method });
	}

	/// The binding used when no class in the ancestry overrides this
	/// method: the interface default if present, else the error trap.
	pub(crate) fn fallback(&self) -> CompiledMethod {
		self.default_impl.map_or_else(
			|| CompiledMethod::new(self.id, error_trap, Origin::Trap),
			|func| CompiledMethod::new(self.id, func, Origin::Default),
		)
	}
}

impl core::fmt::Debug for MethodDescriptor {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("MethodDescriptor")
			.field("id", &self.id)
			.field("name", &self.name)
			.field("interface", &self.interface)
			.field("has_default", &self.default_impl.is_some())
			.finish_non_exhaustive()
	}
}
