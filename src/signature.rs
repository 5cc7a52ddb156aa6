//! Resolution of the one-character type-descriptor grammar onto the
//! registry.
//!
//! The grammar is:
//!   FieldType:
//!     "Z" | "B" | "C" | "S" | "I" | "J" | "F" | "D" |
//!     "L" ClassName ";" |
//!     "[" FieldType
//! plus "V" for no type at all. Anything else is taken to be a bare class
//! name, which call sites inherited from older descriptor-less metadata
//! still pass in.

use anyhow::Result;
use crate::error::CompileError;
use crate::registry::{TypeId, TypeRegistry, PRIMITIVES};

/// Where each descriptor character's primitive lives in the seeded table.
fn primitive_position(prefix: char) -> Option<usize> {
	match prefix {
		'Z' => Some(0),
		'B' => Some(1),
		'C' => Some(2),
		'D' => Some(3),
		'F' => Some(4),
		'I' => Some(5),
		'J' => Some(6),
		'S' => Some(7),
		_ => None,
	}
}

fn is_bare_class_name(signature: &str) -> bool {
	// a class name never starts with the characters the descriptor
	// grammar reserves
	!signature.is_empty()
		&& !signature.starts_with([';', '(', ')', '.'])
		&& !signature.chars().next().is_some_and(char::is_whitespace)
}

impl TypeRegistry {
	/// Resolves a type descriptor to a handle, interning class and array
	/// types on the way. `V` resolves to `None`.
	pub fn value_of_sig(&mut self, signature: &str) -> Result<Option<TypeId>> {
		self.ensure_seeded();

		let mut chars = signature.chars();
		let Some(prefix) = chars.next() else {
			return Err(CompileError::bad_signature(signature).into());
		};

		if let Some(position) = primitive_position(prefix) {
			// the prefix character alone decides; trailing characters
			// belong to the caller's surrounding grammar
			return Ok(self.primitive_by_name(PRIMITIVES[position].0));
		}

		match prefix {
			'V' => Ok(None),
			'L' => {
				let Some(name) = chars.as_str().strip_suffix(';') else {
					return Err(CompileError::bad_signature(signature).into());
				};
				Ok(Some(self.value_of(name.to_owned())?))
			}
			'[' => {
				let Some(element) = self.value_of_sig(chars.as_str())? else {
					return Err(CompileError::bad_signature(signature).into());
				};
				Ok(Some(self.array_type(element)?))
			}
			_ if is_bare_class_name(signature) => {
				Ok(Some(self.value_of(signature.to_owned())?))
			}
			_ => Err(CompileError::bad_signature(signature).into()),
		}
	}

	/// The non-interning twin of [`TypeRegistry::value_of_sig`]: resolves a
	/// descriptor against what has already been interned, `None` otherwise.
	/// Safe to call after the scan phase closed.
	pub fn lookup_sig(&self, signature: &str) -> Option<TypeId> {
		let mut chars = signature.chars();
		let prefix = chars.next()?;

		if let Some(position) = primitive_position(prefix) {
			return self.primitive_by_name(PRIMITIVES[position].0);
		}

		match prefix {
			'L' => self.lookup(chars.as_str().strip_suffix(';')?),
			'[' => {
				let element = self.lookup_sig(chars.as_str())?;
				self.lookup_array(element)
			}
			_ => self.lookup(signature),
		}
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use anyhow::Result;
	use crate::error::CompileError;
	use crate::registry::TypeRegistry;

	#[test]
	fn primitives() -> Result<()> {
		let mut types = TypeRegistry::new();

		for (signature, index) in [("Z", 0), ("B", 1), ("C", 2), ("D", 3), ("F", 4), ("I", 5), ("J", 6), ("S", 7)] {
			let id = types.value_of_sig(signature)?
				.ok_or_else(|| anyhow::anyhow!("{signature} resolved to nothing"))?;
			assert_eq!(id.index(), index, "{signature}");
		}

		assert_eq!(types.value_of_sig("V")?, None);

		Ok(())
	}

	#[test]
	fn classes_and_arrays() -> Result<()> {
		let mut types = TypeRegistry::new();

		let thread = types.value_of_sig("Ljava/lang/Thread;")?
			.ok_or_else(|| anyhow::anyhow!("no type"))?;
		assert_eq!(types.get(thread).name(), "java/lang/Thread");
		assert_eq!(Some(thread), types.value_of("java/lang/Thread").ok());

		let ints = types.value_of_sig("[I")?
			.ok_or_else(|| anyhow::anyhow!("no type"))?;
		assert_eq!(types.get(ints).name(), "[I");
		assert_eq!(types.get(ints).component().map(|id| id.index()), Some(5));

		let threads2 = types.value_of_sig("[[Ljava/lang/Thread;")?
			.ok_or_else(|| anyhow::anyhow!("no type"))?;
		assert_eq!(types.get(threads2).name(), "[[Ljava/lang/Thread;");

		// the legacy path: a bare class name without L...;
		let object = types.value_of_sig("java/lang/Object")?
			.ok_or_else(|| anyhow::anyhow!("no type"))?;
		assert_eq!(object.index(), 9);

		Ok(())
	}

	#[test]
	fn bad_signatures() {
		let mut types = TypeRegistry::new();

		for signature in ["", "Ljava/lang/Thread", "[V", ";x", "(I)V"] {
			let err = types.value_of_sig(signature).expect_err(signature);
			assert!(
				matches!(err.downcast_ref::<CompileError>(), Some(CompileError::BadSignature { .. })),
				"{signature}: {err}"
			);
		}
	}

	#[test]
	fn lookup_does_not_intern() -> Result<()> {
		let mut types = TypeRegistry::new();
		types.value_of("java/lang/Object")?;

		assert_eq!(types.lookup_sig("Lpkg/Unseen;"), None);
		let before = types.size();
		assert_eq!(types.lookup_sig("[Lpkg/Unseen;"), None);
		assert_eq!(types.size(), before);

		assert_eq!(types.lookup_sig("I").map(|id| id.index()), Some(5));

		Ok(())
	}
}
