use anyhow::Result;
use std::fmt::{Debug, Formatter};
use crate::tree::method::MethodRef;

/// The function registry collaborator.
///
/// The method-body translator owns it; the layout engine consults it for
/// which functions are *used* (committed to being emitted) and publishes
/// dispatch-slot assignments back into it. Functions are compared by their
/// `(class, name, descriptor)` triple.
pub trait FunctionRegistry {
	/// Whether the translator has committed to emitting this function.
	fn is_used(&self, function: &MethodRef) -> bool;

	/// Commits this function to being emitted. Idempotent.
	fn mark_as_needed(&mut self, function: &MethodRef) -> Result<()>;

	/// Publishes the vtable slot (header included) this function dispatches
	/// through. A function keeps the same slot in every subclass vtable.
	fn set_vtable_index(&mut self, function: &MethodRef, index: usize) -> Result<()>;

	/// The itable slot previously published for this function, if any.
	fn itable_index(&self, function: &MethodRef) -> Option<usize>;

	/// Publishes the itable slot (header included) of an interface method.
	fn set_itable_index(&mut self, function: &MethodRef, index: usize) -> Result<()>;

	/// Registers a function the engine synthesized itself, body included.
	/// The registry must treat it as used.
	fn add_synthetic(&mut self, function: SyntheticFunction) -> Result<()>;
}

/// A value type of the target stack machine, for synthetic-function locals.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StackType {
	I32,
	I64,
	F32,
	F64,
	/// A reference to any object.
	Ref,
}

/// A function the engine writes itself, expressed in the target module's
/// textual instruction form.
///
/// The signature is carried by the descriptor of `method`; `locals` lists
/// the extra locals the body uses beyond the parameters.
#[derive(Clone, PartialEq)]
pub struct SyntheticFunction {
	pub method: MethodRef,
	pub locals: Vec<StackType>,
	pub code: String,
}

impl SyntheticFunction {
	pub fn new(method: MethodRef, locals: Vec<StackType>, code: impl Into<String>) -> SyntheticFunction {
		SyntheticFunction { method, locals, code: code.into() }
	}
}

impl Debug for SyntheticFunction {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		// the body is multi-line; keep Debug output to the identity
		f.debug_struct("SyntheticFunction")
			.field("method", &self.method)
			.field("locals", &self.locals)
			.finish_non_exhaustive()
	}
}
