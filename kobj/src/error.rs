//! The dispatch runtime's error taxonomy.
//!
//! Declaration-time errors (`Duplicate*`, `CyclicClassGraph`,
//! `ClassFrozen`, `UnknownClass`) indicate a programming error in
//! driver registration and must surface immediately. `MissingMethod`
//! is a runtime condition; the calling framework decides whether to
//! degrade gracefully or escalate. Nothing here is ever silently
//! discarded.

use alloc::string::String;

use thiserror::Error;

use crate::id::MethodId;

/// Any error raised by the dispatch runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// An interface was declared twice under the same name.
	#[error("interface `{0}` is already declared")]
	DuplicateInterface(String),
	/// A method name was declared twice within one interface.
	#[error("method `{method}` is already declared on interface `{interface}`")]
	DuplicateMethod {
		/// The interface the declaration targeted.
		interface: String,
		/// The duplicated method name.
		method:    String,
	},
	/// A class was declared twice under the same name.
	#[error("class `{0}` is already declared")]
	DuplicateClass(String),
	/// A class declaration would form a cycle in the class graph.
	#[error("class `{class}` parent list forms a cycle through `{through}`")]
	CyclicClassGraph {
		/// The class being declared.
		class:   String,
		/// The ancestor through which the cycle closes.
		through: String,
	},
	/// An override was attempted after the class's method table was
	/// compiled. The existing table is left unchanged.
	#[error("class `{0}` is frozen; overrides are rejected after first use")]
	ClassFrozen(String),
	/// A bind was attempted against a class that was never registered.
	#[error("class `{0}` is not registered")]
	UnknownClass(String),
	/// A dispatched method reached the error trap: the class neither
	/// overrides the method nor has a usable default.
	#[error("no implementation for method {method} on class `{class}`")]
	MissingMethod {
		/// The identity of the unimplemented method, or
		/// [`MethodId::NONE`] if the trap was invoked outside the
		/// dispatch path.
		method: MethodId,
		/// The name of the class the call was dispatched against.
		class:  String,
	},
}
