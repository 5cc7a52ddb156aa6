//! Binary type descriptors.
//!
//! One block per registered type, at the offset recorded as the type's
//! `vtableOffset`, all values little-endian:
//!
//! ```text
//! offset 0  : i32  bytes from the descriptor start to the itable region
//! offset 4  : i32  bytes from the descriptor start to the instanceof region
//! offset 8  : i32  string id of the dotted class name
//! offset 12 : i32  array component class index, -1 for non-arrays
//! offset 16 : vtable entries, one i32 function id each
//!           : itable region: per interface [class index, byte stride to
//!           :   the next block, function ids...], then an i32 0 sentinel
//!           : instanceof region: i32 count, then that many class indices,
//!           :   self first
//! ```
//!
//! The two region offsets equal bytes-written-after-the-header plus 16:
//! the dispatch stubs add them to the descriptor's base address, so the
//! header size is baked into the stored value. Any change here must keep
//! the stubs in lock-step.

use anyhow::{Context, Result};
use log::debug;
use crate::constants::DESCRIPTOR_HEADER_SIZE;
use crate::emit::stubs;
use crate::functions::FunctionRegistry;
use crate::registry::{TypeId, TypeRegistry};
use crate::writer::{DataWrite, ModuleWriter};

pub(crate) fn emit(
	registry: &mut TypeRegistry,
	functions: &mut impl FunctionRegistry,
	writer: &mut impl ModuleWriter,
) -> Result<()> {
	let order: Vec<TypeId> = registry.emission_order().to_vec();
	for &id in &order {
		write_descriptor(registry, id, writer)
			.with_context(|| format!("failed to write descriptor of {}", registry.get(id).name()))?;
	}

	// the flat type table: one descriptor offset per registered type, in
	// registry order, for reflective lookups by class index
	let table_offset = writer.data().size();
	for id in registry.ids() {
		let offset = registry.get(id).vtable_offset()
			.with_context(|| format!("{} has no descriptor", registry.get(id).name()))?;
		writer.data().write_u32(offset)?;
	}

	debug!("type table at {table_offset}, {} entries", registry.size());

	stubs::register_type_table_offset(functions, table_offset)?;
	Ok(())
}

fn write_descriptor(registry: &mut TypeRegistry, id: TypeId, writer: &mut impl ModuleWriter) -> Result<()> {
	let def = registry.get(id);

	let dotted = def.dotted_name();
	let name_id = writer.string_index(&dotted)?;
	let component = def.component()
		.map(|component| component.index() as i32)
		.unwrap_or(-1);

	// the regions are built first so the header can carry their offsets
	let mut body = Vec::new();
	for function in def.vtable() {
		let function_id = writer.function_index(function)?;
		body.write_u32(function_id)?;
	}

	let itable_offset = body.len() as u32 + DESCRIPTOR_HEADER_SIZE;
	for itable in def.itables() {
		body.write_i32(itable.interface.index() as i32)?;
		body.write_i32(4 * (2 + itable.methods.len() as i32))?;
		for function in &itable.methods {
			let function_id = writer.function_index(function)?;
			body.write_u32(function_id)?;
		}
	}
	body.write_i32(0)?;

	let instance_of_offset = body.len() as u32 + DESCRIPTOR_HEADER_SIZE;
	body.write_i32(def.instance_of().len() as i32)?;
	for &super_type in def.instance_of() {
		body.write_i32(super_type.index() as i32)?;
	}

	let offset = writer.data().size();
	registry.get_mut(id).vtable_offset = Some(offset);

	let data = writer.data();
	data.write_i32(itable_offset as i32)?;
	data.write_i32(instance_of_offset as i32)?;
	data.write_u32(name_id)?;
	data.write_i32(component)?;
	data.write_u8_slice(&body)?;

	Ok(())
}
