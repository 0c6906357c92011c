//! Class nodes and the method table compiler.
//!
//! A class is a named bundle of method overrides plus an ordered list
//! of parent classes. Its resolved method table is compiled lazily, at
//! most once, by merging its own overrides with its parents' already
//! compiled tables in declaration order.

use alloc::{string::String, sync::Arc, vec::Vec};
use core::sync::atomic::{AtomicU64, Ordering::Relaxed};

use kobj_sync::{Lock, Mutex, Once};
use log::debug;

use crate::{
	error::Error,
	id::{ClassId, MethodId},
	method::{CompiledMethod, MethodDescriptor, MethodFn, Origin},
	table::IdTable,
};

/// A class's dense resolved method table.
///
/// Contains one entry per method overridden anywhere in the class's
/// ancestry. Methods absent from the table degrade, at lookup time, to
/// the descriptor's interface default or to the error trap. Immutable
/// after construction and freely shared across threads.
pub struct CompiledTable {
	/// The resolved bindings, keyed by method identity.
	entries: IdTable<CompiledMethod>,
}

impl CompiledTable {
	/// Looks up the binding compiled for the given method, if any
	/// ancestor override exists.
	#[inline]
	#[must_use]
	pub fn lookup(&self, method: MethodId) -> Option<CompiledMethod> {
		self.entries.get(method.raw()).copied()
	}

	/// Returns the number of compiled entries.
	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns whether the table has no entries.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// How a class binds one method; the diagnostic view of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
	/// The class overrides the method itself.
	Own,
	/// The binding is inherited from the named ancestor.
	Inherited {
		/// The ancestor class that declared the override.
		from: String,
	},
	/// The declaring interface's default implementation applies.
	Default,
	/// The method would reach the error trap.
	Trap,
}

/// A named vertex in the class graph.
///
/// Parents are fixed at declaration; their order is the resolution
/// priority (earlier parents shadow later ones on conflict). Overrides
/// may be added until the first table compilation, after which the
/// class is frozen.
pub struct ClassNode {
	/// The process-wide unique identity of this class.
	id:        ClassId,
	/// The declared class name, unique within its registry.
	name:      String,
	/// The parent classes, in resolution-priority order.
	parents:   Vec<Arc<ClassNode>>,
	/// The class's own method overrides.
	overrides: Mutex<IdTable<MethodFn>>,
	/// The compiled method table; building it freezes the class.
	table:     Once<Arc<CompiledTable>>,
	/// Diagnostic count of live object handles bound to this class.
	instances: AtomicU64,
}

impl ClassNode {
	/// Creates a new class node. Graph validation (cycles, duplicate
	/// names) is the registry's responsibility.
	pub(crate) fn new(name: &str, parents: Vec<Arc<Self>>) -> Arc<Self> {
		Arc::new(Self {
			id: ClassId::allocate(),
			name: String::from(name),
			parents,
			overrides: Mutex::new(IdTable::new()),
			table: Once::new(),
			instances: AtomicU64::new(0),
		})
	}

	/// The process-wide unique identity of this class.
	#[inline]
	#[must_use]
	pub fn id(&self) -> ClassId {
		self.id
	}

	/// The declared class name.
	#[inline]
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The parent classes, in resolution-priority order.
	#[must_use]
	pub fn parents(&self) -> &[Arc<Self>] {
		&self.parents
	}

	/// Whether the class's method table has been (or is being)
	/// compiled. Once frozen, overrides are rejected forever.
	#[must_use]
	pub fn frozen(&self) -> bool {
		self.table.is_started()
	}

	/// Returns whether this class, or any of its ancestors, carries
	/// the given name.
	pub(crate) fn ancestry_contains(&self, name: &str) -> bool {
		self.name == name || self.parents.iter().any(|p| p.ancestry_contains(name))
	}

	/// Declares (or replaces) this class's override for the given
	/// method. Before the first compilation the last write wins.
	///
	/// Fails with [`Error::ClassFrozen`] once the class's table has
	/// been compiled; the existing table is left unchanged.
	pub fn override_method(&self, desc: &MethodDescriptor, imp: MethodFn) -> Result<(), Error> {
		if self.frozen() {
			return Err(Error::ClassFrozen(self.name.clone()));
		}

		self.overrides.lock().insert(desc.id().raw(), imp);
		Ok(())
	}

	/// Compiles this class's method table, freezing the class.
	///
	/// Idempotent and safe under concurrent first use: one caller
	/// builds the table while concurrent callers wait for it; nobody
	/// observes a partially built table. Infallible: methods without
	/// any implementation degrade at lookup time rather than failing
	/// compilation.
	pub fn compile(&self) -> Arc<CompiledTable> {
		self.table
			.get_or_init(|| {
				let mut entries = IdTable::new();

				for (raw, imp) in self.overrides.lock().iter() {
					entries.insert(
						raw,
						CompiledMethod::new(
							MethodId::from_raw(raw),
							*imp,
							Origin::Override(self.id),
						),
					);
				}

				// Earlier parents shadow later ones; each parent table
				// already encodes its own subtree's precedence, so this
				// merge is equivalent to the depth-first walk. Shared
				// ancestors were resolved once, when the parent
				// compiled.
				for parent in &self.parents {
					let table = parent.compile();
					for (raw, binding) in table.entries.iter() {
						entries.insert_if_absent(raw, *binding);
					}
				}

				debug!(
					"compiled method table for class `{}` ({} entries)",
					self.name,
					entries.len()
				);

				Arc::new(CompiledTable { entries })
			})
			.clone()
	}

	/// Resolves the given method against this class, bypassing the
	/// descriptor's inline cache: ancestry override, else interface
	/// default, else the error trap.
	///
	/// Deterministic and stable once the class is frozen; compiling on
	/// first use if necessary.
	#[must_use]
	pub fn resolve(&self, desc: &MethodDescriptor) -> CompiledMethod {
		self.compile()
			.lookup(desc.id())
			.unwrap_or_else(|| desc.fallback())
	}

	/// Whether a dispatch of the given method against this class would
	/// reach the error trap.
	#[must_use]
	pub fn would_trap(&self, desc: &MethodDescriptor) -> bool {
		self.resolve(desc).is_trap()
	}

	/// The diagnostic binding of the given method for this class.
	#[must_use]
	pub fn binding(&self, desc: &MethodDescriptor) -> Binding {
		match self.resolve(desc).origin() {
			Origin::Override(class) if class == self.id => Binding::Own,
			Origin::Override(class) => {
				Binding::Inherited {
					from: self
						.ancestor_name(class)
						.unwrap_or_else(|| String::from("<unknown>")),
				}
			}
			Origin::Default => Binding::Default,
			Origin::Trap => Binding::Trap,
		}
	}

	/// Finds the name of the ancestor with the given identity.
	fn ancestor_name(&self, id: ClassId) -> Option<String> {
		if self.id == id {
			return Some(self.name.clone());
		}

		self.parents.iter().find_map(|p| p.ancestor_name(id))
	}

	/// The number of live object handles bound to this class.
	/// Purely diagnostic.
	#[must_use]
	pub fn instances(&self) -> u64 {
		self.instances.load(Relaxed)
	}

	/// Notes a newly bound object handle.
	pub(crate) fn instance_created(&self) {
		self.instances.fetch_add(1, Relaxed);
	}

	/// Notes a dropped object handle.
	pub(crate) fn instance_dropped(&self) {
		self.instances.fetch_sub(1, Relaxed);
	}
}

impl core::fmt::Debug for ClassNode {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("ClassNode")
			.field("id", &self.id)
			.field("name", &self.name)
			.field("parents", &self.parents.len())
			.field("frozen", &self.frozen())
			.finish()
	}
}
