//! Declaration and definition imports: the records that describe every
//! named type to the target module.
//!
//! Each record is an opcode byte followed by a payload; handles the payload
//! references travel alongside as [`ImportArg`]s, in reference order.
//! Strings are a `JI2` length plus utf-8 bytes, access flags are `JI2`,
//! counts are `JI4`, everything little-endian.

use anyhow::{Context, Result};
use log::trace;
use crate::constants::{import_op, type_access, IMPORT_NAMESPACE};
use crate::error::CompileError;
use crate::functions::FunctionRegistry;
use crate::provider::ClassProvider;
use crate::registry::{ImportKind, TypeId, TypeRegistry};
use crate::tree::class::{ClassAccess, ClassInfo};
use crate::writer::{DataWrite, ImportArg, ModuleWriter};

pub(crate) fn emit(
	registry: &TypeRegistry,
	provider: &impl ClassProvider,
	functions: &impl FunctionRegistry,
	writer: &mut impl ModuleWriter,
) -> Result<()> {
	for &id in registry.emission_order() {
		let def = registry.get(id);
		let Some(named) = def.named() else { continue };

		trace!("import {}", named.name);

		declare(registry, id, writer)
			.with_context(|| format!("failed to declare {}", named.name))?;

		if named.import == ImportKind::ExtClass {
			// the runtime defines these itself
			continue;
		}

		let info = provider.get(named.name.as_str())?
			.ok_or_else(|| CompileError::missing_class(named.name.as_str()))?;
		define(registry, id, info, functions, writer)
			.with_context(|| format!("failed to define {}", named.name))?;
	}
	Ok(())
}

/// The translation of classfile access flags into the target taxonomy.
fn target_flags(access: ClassAccess) -> u16 {
	(if access.is_abstract   { type_access::ABSTRACT } else { 0 }) |
	(if access.is_final      { type_access::FINAL } else { 0 }) |
	(if access.is_enum       { type_access::ENUM } else { 0 }) |
	(if access.is_annotation { type_access::ANNOTATION } else { 0 })
}

fn declare(registry: &TypeRegistry, id: TypeId, writer: &mut impl ModuleWriter) -> Result<()> {
	let def = registry.get(id);
	let Some(named) = def.named() else { return Ok(()) };

	let mut payload = vec![named.import.opcode()];
	payload.write_string(named.name.as_str())?;

	let mut args = Vec::new();
	match named.import {
		ImportKind::ExtClass => {
			// external classes declare only name and parent
			if let Some(parent) = named.parent {
				args.push(ImportArg::Type(parent));
			}
		}
		ImportKind::DeclClass => {
			payload.write_ji2(target_flags(named.access) as usize)?;
			payload.write_ji4(named.interfaces.len())?;
			if let Some(parent) = named.parent {
				args.push(ImportArg::Type(parent));
			}
			args.extend(named.interfaces.iter().map(|&interface| ImportArg::Type(interface)));
		}
		ImportKind::DeclInterface => {
			// interfaces carry no access flags; the args are the extended
			// interfaces
			payload.write_ji4(named.interfaces.len())?;
			args.extend(named.interfaces.iter().map(|&interface| ImportArg::Type(interface)));
		}
	}

	writer.import_type(IMPORT_NAMESPACE, payload, id, args)
}

fn define(
	registry: &TypeRegistry,
	id: TypeId,
	info: &ClassInfo,
	functions: &impl FunctionRegistry,
	writer: &mut impl ModuleWriter,
) -> Result<()> {
	let def = registry.get(id);
	let opcode = if def.is_interface() { import_op::DEF_INTERFACE } else { import_op::DEF_CLASS };

	let mut payload = vec![opcode];
	let mut args = Vec::new();

	// four count-prefixed sections, fixed order
	write_fields(registry, info, false, &mut payload, &mut args)?;
	write_methods(registry, info, false, functions, &mut payload, &mut args, writer)?;
	write_fields(registry, info, true, &mut payload, &mut args)?;
	write_methods(registry, info, true, functions, &mut payload, &mut args, writer)?;

	writer.import_type(IMPORT_NAMESPACE, payload, id, args)
}

fn write_fields(
	registry: &TypeRegistry,
	info: &ClassInfo,
	want_static: bool,
	payload: &mut Vec<u8>,
	args: &mut Vec<ImportArg>,
) -> Result<()> {
	let fields: Vec<_> = info.fields.iter()
		.filter(|field| field.is_static() == want_static)
		.collect();

	payload.write_ji4(fields.len())?;
	for field in fields {
		payload.write_string(field.name.as_str())?;
		payload.write_ji2(u16::from(field.access) as usize)?;
		write_field_signature(registry, field.descriptor.as_str(), payload, args)?;
	}
	Ok(())
}

/// A primitive field writes its one descriptor character; a reference field
/// writes `L` and hands the referenced type over as an argument.
fn write_field_signature(
	registry: &TypeRegistry,
	descriptor: &str,
	payload: &mut Vec<u8>,
	args: &mut Vec<ImportArg>,
) -> Result<()> {
	if descriptor.len() == 1 && !descriptor.starts_with(['L', '[']) {
		payload.write_u8_slice(descriptor.as_bytes())
	} else {
		payload.write_u8(b'L')?;
		args.push(ImportArg::Type(resolve_or_object(registry, descriptor)));
		Ok(())
	}
}

/// Reference types the program never requested have no handle and cannot
/// get one this late; Object stands in for them, which is sound because no
/// compiled code touches such a field or parameter with a concrete type.
fn resolve_or_object(registry: &TypeRegistry, descriptor: &str) -> TypeId {
	registry.lookup_sig(descriptor).unwrap_or(TypeId::OBJECT)
}

fn write_methods(
	registry: &TypeRegistry,
	info: &ClassInfo,
	want_static: bool,
	functions: &impl FunctionRegistry,
	payload: &mut Vec<u8>,
	args: &mut Vec<ImportArg>,
	writer: &mut impl ModuleWriter,
) -> Result<()> {
	let methods: Vec<_> = info.methods.iter()
		.filter(|method| method.is_static() == want_static)
		.filter(|method| functions.is_used(&method.as_ref_of(&info.name)))
		.collect();

	payload.write_ji4(methods.len())?;
	for method in methods {
		let signature = method.descriptor.as_str();

		payload.write_string(method.name.as_str())?;
		payload.write_ji2(u16::from(method.access) as usize)?;
		payload.write_ji2(signature.len() - 1)?;
		payload.write_u8_slice(signature.as_bytes())?;

		for parameter in method.descriptor.parameters()? {
			args.push(ImportArg::Type(resolve_or_object(registry, parameter)));
		}

		let function = method.as_ref_of(&info.name);
		writer.import_function(&function)?;
		args.push(ImportArg::Function(function));
	}
	Ok(())
}
