//! The hierarchy scan: runs once over every interned type when the scan
//! phase closes, and turns classfile metadata into interface closures,
//! instance layouts and vtables.

use anyhow::Result;
use indexmap::IndexSet;
use log::{debug, trace};
use crate::constants::{HASHCODE_FIELD, VTABLE_FIELD, VTABLE_FIRST_SLOT};
use crate::error::CompileError;
use crate::functions::FunctionRegistry;
use crate::provider::ClassProvider;
use crate::registry::{ImportKind, LayoutField, TypeForm, TypeId, TypeRegistry};
use crate::tree::class::{ClassAccess, ClassInfo, ClassName};
use crate::tree::field::FieldName;
use crate::tree::method::MethodRef;

pub(crate) fn scan(
	registry: &mut TypeRegistry,
	provider: &impl ClassProvider,
	functions: &mut impl FunctionRegistry,
) -> Result<()> {
	// named types first, in interning order; arrays afterwards, so that
	// Object's vtable is complete when they borrow it
	let ids: Vec<TypeId> = registry.ids().collect();
	for &id in &ids {
		if matches!(registry.get(id).form, TypeForm::Named(_)) {
			scan_named(registry, id, provider, functions)?;
		}
	}
	for &id in &ids {
		if registry.get(id).is_array() {
			scan_array(registry, id);
		}
	}
	Ok(())
}

/// Everything the scan of one class computes before any of it is written
/// back into the registry.
struct ScanOutcome {
	is_interface: bool,
	parent: Option<TypeId>,
	interfaces: IndexSet<TypeId>,
	instance_of: IndexSet<TypeId>,
	fields: Vec<LayoutField>,
	vtable: Vec<MethodRef>,
	access: ClassAccess,
}

fn scan_named(
	registry: &mut TypeRegistry,
	id: TypeId,
	provider: &impl ClassProvider,
	functions: &mut impl FunctionRegistry,
) -> Result<()> {
	let name = registry.get(id).name().to_owned();
	let outcome = compute(registry, id, &name, provider, functions)?;

	trace!(
		"scanned {name}: {} fields, {} vtable slots, {} interfaces",
		outcome.fields.len(),
		outcome.vtable.len(),
		outcome.interfaces.len()
	);

	let def = registry.get_mut(id);
	def.instance_of = outcome.instance_of;
	def.vtable = outcome.vtable;
	if let Some(named) = def.named_mut() {
		named.access = outcome.access;
		if outcome.is_interface && named.import != ImportKind::ExtClass {
			// the classfile revealed the kind
			named.import = ImportKind::DeclInterface;
		}
		named.parent = outcome.parent;
		named.interfaces = outcome.interfaces;
		named.fields = outcome.fields;
	}
	Ok(())
}

fn compute(
	registry: &TypeRegistry,
	id: TypeId,
	name: &str,
	provider: &impl ClassProvider,
	functions: &mut impl FunctionRegistry,
) -> Result<ScanOutcome> {
	let info = provider.get(name)?
		.ok_or_else(|| CompileError::missing_class(name))?;
	let is_interface = info.is_interface();

	let mut instance_of = IndexSet::new();
	instance_of.insert(id);

	// the superclass chain, this class first; interfaces have none
	let mut chain: Vec<&ClassInfo> = vec![info];
	if !is_interface {
		let mut seen: IndexSet<ClassName> = IndexSet::from([info.name.clone()]);
		let mut current = info;
		while let Some(super_name) = &current.super_class {
			if !seen.insert(super_name.clone()) {
				// a looping super chain would never terminate below
				return Err(CompileError::cycle_in_hierarchy(name).into());
			}
			let super_info = provider.get(super_name.as_str())?
				.ok_or_else(|| CompileError::missing_class(super_name.as_str()))?;
			chain.push(super_info);
			current = super_info;
		}
	}

	// transitive interface closure over the whole chain
	let mut interfaces = IndexSet::new();
	let mut visited = IndexSet::new();
	for level in &chain {
		for interface_name in &level.interfaces {
			collect_interfaces(registry, provider, interface_name, &mut visited, &mut interfaces, &mut instance_of)?;
		}
	}

	// the superclass levels, nearest first; only interned ones can be
	// referenced
	let mut parent = None;
	for level in &chain[1..] {
		if let Some(super_id) = registry.lookup(level.name.as_str()) {
			if parent.is_none() {
				parent = Some(super_id);
			}
			instance_of.insert(super_id);
		}
	}

	let mut fields = Vec::new();
	let mut vtable = Vec::new();
	if !is_interface {
		assemble_layout(registry, &chain, provider, functions, &mut fields, &mut vtable)?;
	}

	Ok(ScanOutcome {
		is_interface,
		parent,
		interfaces,
		instance_of,
		fields,
		vtable,
		access: info.access,
	})
}

fn collect_interfaces(
	registry: &TypeRegistry,
	provider: &impl ClassProvider,
	name: &ClassName,
	visited: &mut IndexSet<ClassName>,
	interfaces: &mut IndexSet<TypeId>,
	instance_of: &mut IndexSet<TypeId>,
) -> Result<()> {
	if !visited.insert(name.clone()) {
		return Ok(());
	}

	if let Some(interface_id) = registry.lookup(name.as_str()) {
		interfaces.insert(interface_id);
		instance_of.insert(interface_id);
	}

	let info = provider.get(name.as_str())?
		.ok_or_else(|| CompileError::missing_class(name.as_str()))?;
	for super_interface in &info.interfaces {
		collect_interfaces(registry, provider, super_interface, visited, interfaces, instance_of)?;
	}
	Ok(())
}

/// Walks the chain top-of-hierarchy first, gathering the instance layout
/// and the vtable.
fn assemble_layout(
	registry: &TypeRegistry,
	chain: &[&ClassInfo],
	provider: &impl ClassProvider,
	functions: &mut impl FunctionRegistry,
	fields: &mut Vec<LayoutField>,
	vtable: &mut Vec<MethodRef>,
) -> Result<()> {
	// a field takes a layout slot only when some class of the chain
	// demanded its name
	let mut needed: IndexSet<FieldName> = IndexSet::new();
	for level in chain {
		if let Some(level_id) = registry.lookup(level.name.as_str()) {
			if let Some(named) = registry.get(level_id).named() {
				needed.extend(named.needed_fields.iter().cloned());
			}
		}
	}

	for level in chain.iter().rev() {
		if level.super_class.is_none() {
			// the hierarchy root carries the object header
			fields.push(LayoutField {
				owner: level.name.clone(),
				name: FieldName::from(VTABLE_FIELD),
				descriptor: "I".into(),
			});
			fields.push(LayoutField {
				owner: level.name.clone(),
				name: FieldName::from(HASHCODE_FIELD),
				descriptor: "I".into(),
			});
		}

		for field in &level.fields {
			if !field.is_static() && needed.contains(&field.name) {
				fields.push(LayoutField {
					owner: level.name.clone(),
					name: field.name.clone(),
					descriptor: field.descriptor.clone(),
				});
			}
		}

		for method in &level.methods {
			if !method.is_static() && !method.is_constructor() {
				add_or_update(vtable, method.as_ref_of(&level.name), false, functions)?;
			}
		}

		// used default-able interface methods claim a virtual slot too, so
		// interface calls can also dispatch virtually
		for interface_name in &level.interfaces {
			let interface_info = provider.get(interface_name.as_str())?
				.ok_or_else(|| CompileError::missing_class(interface_name.as_str()))?;
			for method in &interface_info.methods {
				if method.is_static() {
					continue;
				}
				let function = method.as_ref_of(&interface_info.name);
				if functions.is_used(&function) {
					add_or_update(vtable, function, true, functions)?;
				}
			}
		}
	}
	Ok(())
}

/// Places `function` into the vtable.
///
/// A slot, once claimed by a name-and-descriptor pair, is kept for it down
/// the whole hierarchy: an override replaces in place. A default only
/// claims a fresh slot or replaces another default; it never displaces a
/// concrete method.
fn add_or_update(
	vtable: &mut Vec<MethodRef>,
	function: MethodRef,
	is_default: bool,
	functions: &mut impl FunctionRegistry,
) -> Result<()> {
	let found = vtable.iter()
		.position(|f| f.name == function.name && f.desc == function.desc);

	let slot = match found {
		Some(slot) => {
			if !is_default || functions.itable_index(&vtable[slot]).is_some() {
				functions.mark_as_needed(&function)?;
				vtable[slot] = function.clone();
			}
			Some(slot)
		}
		None => {
			if functions.is_used(&function) {
				vtable.push(function.clone());
				Some(vtable.len() - 1)
			} else {
				None
			}
		}
	};

	if let Some(slot) = slot {
		functions.set_vtable_index(&function, slot + VTABLE_FIRST_SLOT)?;
	}
	Ok(())
}

/// Arrays have no classfile; they live directly below Object and dispatch
/// through Object's vtable.
fn scan_array(registry: &mut TypeRegistry, id: TypeId) {
	let object_vtable = registry.get(TypeId::OBJECT).vtable().to_vec();

	debug!("array {}: {} inherited vtable slots", registry.get(id).name(), object_vtable.len());

	let def = registry.get_mut(id);
	def.instance_of = IndexSet::from([id, TypeId::OBJECT]);
	def.vtable = object_vtable;
}
