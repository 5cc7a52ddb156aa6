use thiserror::Error;

/// The fatal failure kinds of the layout engine.
///
/// Every one of these aborts the whole compilation; there is no local
/// recovery. They travel inside [`anyhow::Error`] like every other failure
/// in this crate, so callers keep the context chain and can still match the
/// kind via [`anyhow::Error::downcast_ref`].
///
/// `line` is the source line the failure can be pinned to, `-1` when
/// unknown (which is the common case inside the engine: line information
/// lives with the method-body translator).
#[derive(Debug, Error)]
pub enum CompileError {
	/// A type was interned after the scan phase closed.
	#[error("register needed type after scanning: {name} (line {line})")]
	LateRegistration { name: String, line: i32 },

	/// The classfile provider cannot resolve a name that must resolve.
	#[error("missing classfile: {name} (line {line})")]
	MissingClass { name: String, line: i32 },

	/// The signature resolver saw an unknown descriptor prefix that is not
	/// a bare class name either.
	#[error("bad type signature: {signature:?} (line {line})")]
	BadSignature { signature: String, line: i32 },

	/// A used interface method has no concrete implementation reachable
	/// from a concrete class declaring the interface.
	#[error("no implementation of {method} found in {class} (line {line})")]
	MissingImplementation { method: String, class: String, line: i32 },

	/// An array was requested over a primitive kind that cannot be an
	/// array element.
	#[error("unsupported array element type: {element} (line {line})")]
	UnsupportedArrayElement { element: String, line: i32 },

	/// The emission orderer made no progress over a full sweep, which
	/// means the hierarchy is not a DAG.
	#[error("cycle in type hierarchy involving {name} (line {line})")]
	CycleInHierarchy { name: String, line: i32 },
}

impl CompileError {
	pub fn late_registration(name: impl Into<String>) -> CompileError {
		CompileError::LateRegistration { name: name.into(), line: -1 }
	}

	pub fn missing_class(name: impl Into<String>) -> CompileError {
		CompileError::MissingClass { name: name.into(), line: -1 }
	}

	pub fn bad_signature(signature: impl Into<String>) -> CompileError {
		CompileError::BadSignature { signature: signature.into(), line: -1 }
	}

	pub fn missing_implementation(method: impl Into<String>, class: impl Into<String>) -> CompileError {
		CompileError::MissingImplementation { method: method.into(), class: class.into(), line: -1 }
	}

	pub fn unsupported_array_element(element: impl Into<String>) -> CompileError {
		CompileError::UnsupportedArrayElement { element: element.into(), line: -1 }
	}

	pub fn cycle_in_hierarchy(name: impl Into<String>) -> CompileError {
		CompileError::CycleInHierarchy { name: name.into(), line: -1 }
	}
}
