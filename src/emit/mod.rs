//! Emission: imports and binary descriptors for every type, plus the
//! synthesized dispatch functions.

use anyhow::Result;
use crate::functions::FunctionRegistry;
use crate::provider::ClassProvider;
use crate::registry::TypeRegistry;
use crate::writer::ModuleWriter;

pub(crate) mod descriptor;
pub(crate) mod imports;
pub mod stubs;

/// Walks the emission order twice: once to describe every named type to the
/// module (declaration and definition imports), once to lay down the binary
/// descriptors, the flat type table and the table-offset accessor.
pub(crate) fn emit(
	registry: &mut TypeRegistry,
	provider: &impl ClassProvider,
	functions: &mut impl FunctionRegistry,
	writer: &mut impl ModuleWriter,
) -> Result<()> {
	imports::emit(&*registry, provider, &*functions, writer)?;
	descriptor::emit(registry, functions, writer)?;
	Ok(())
}
