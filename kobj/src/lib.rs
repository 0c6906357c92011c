//! Kernel object dispatch runtime.
//!
//! Every device/bus subsystem declares an *interface* of named
//! methods; concrete driver classes supply overrides and compose
//! parent classes for shared base behavior. This crate is the dispatch
//! runtime those declarations feed:
//!
//! - [`Interface`] / [`MethodDescriptor`]: identity, optional default
//!   implementation and a single-slot inline cache per abstract
//!   operation.
//! - [`ClassNode`]: a vertex in the class DAG; compiles, lazily and
//!   once, a dense resolved method table by merging its overrides with
//!   its parents' tables in declaration order.
//! - [`Object`]: a lightweight instance tag; all polymorphic calls go
//!   through [`Object::call`], which consults the descriptor's inline
//!   cache before falling back to the compiled table.
//! - [`error_trap`]: the sentinel bound to methods nobody implements,
//!   turning a missing-method call into a deterministic
//!   [`Error::MissingMethod`] instead of undefined behavior.
//!
//! Registration is expected to happen during a single-threaded
//! initialization phase; dispatch is safe from any thread afterward,
//! never blocks beyond its own spinlocks, and performs no allocation
//! on the cache-hit path.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod class;
pub mod error;
pub mod hash;
pub mod id;
pub mod interface;
pub mod method;
pub mod object;
pub mod registry;
pub mod table;

pub use self::{
	class::{Binding, ClassNode, CompiledTable},
	error::Error,
	id::{ClassId, MethodId},
	interface::Interface,
	method::{Args, CompiledMethod, MethodDescriptor, MethodFn, Origin, Value, error_trap},
	object::{Object, ObjectData},
	registry::{Registry, registry},
};
