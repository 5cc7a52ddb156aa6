//! Interface dispatch tables: for every concrete class and every interface
//! it implements, the concrete target of each participating interface
//! method.

use anyhow::Result;
use log::trace;
use crate::constants::ITABLE_FIRST_SLOT;
use crate::error::CompileError;
use crate::functions::FunctionRegistry;
use crate::provider::ClassProvider;
use crate::registry::{ITable, ImportKind, TypeId, TypeRegistry};
use crate::tree::method::{MethodInfo, MethodRef};

pub(crate) fn build(
	registry: &mut TypeRegistry,
	provider: &impl ClassProvider,
	functions: &mut impl FunctionRegistry,
) -> Result<()> {
	let ids: Vec<TypeId> = registry.ids().collect();
	for &id in &ids {
		let Some(named) = registry.get(id).named() else { continue };
		if named.import == ImportKind::DeclInterface {
			continue;
		}
		if named.access.is_abstract {
			// no instance exists, nothing ever dispatches through it
			continue;
		}
		if named.interfaces.is_empty() {
			continue;
		}

		let class_name = named.name.clone();
		let interfaces: Vec<TypeId> = named.interfaces.iter().copied().collect();
		let interface_names: Vec<String> = interfaces.iter()
			.map(|&interface_id| registry.get(interface_id).name().to_owned())
			.collect();

		let mut itables = Vec::new();
		for (interface_id, interface_name) in interfaces.iter().zip(&interface_names) {
			let interface_info = provider.get(interface_name)?
				.ok_or_else(|| CompileError::missing_class(interface_name.as_str()))?;

			let mut methods = Vec::new();
			for method in &interface_info.methods {
				if method.is_static() {
					continue;
				}

				let declared = method.as_ref_of(&interface_info.name);
				let target = resolve_implementation(provider, class_name.as_str(), &interface_names, method)?;

				// a method participates when either side of the dispatch is
				// committed: the interface handle call sites name, or the
				// concrete implementation
				let participates = functions.is_used(&declared)
					|| target.as_ref().is_some_and(|target| functions.is_used(target));
				if !participates {
					continue;
				}

				let Some(target) = target else {
					return Err(CompileError::missing_implementation(declared.to_string(), class_name.as_str()).into());
				};

				trace!("itable {class_name} / {interface_name}: {declared} -> {target}");

				functions.mark_as_needed(&target)?;
				functions.set_itable_index(&declared, methods.len() + ITABLE_FIRST_SLOT)?;
				methods.push(target);
			}

			if !methods.is_empty() {
				itables.push(ITable { interface: *interface_id, methods });
			}
		}

		if let Some(named) = registry.get_mut(id).named_mut() {
			named.itables = itables;
		}
	}
	Ok(())
}

/// The most specific implementation of `method` reachable from
/// `class_name`: the class itself, then its superclass chain, then a
/// default from the interface closure.
fn resolve_implementation(
	provider: &impl ClassProvider,
	class_name: &str,
	interface_names: &[String],
	method: &MethodInfo,
) -> Result<Option<MethodRef>> {
	let matches = |candidate: &&MethodInfo| {
		!candidate.is_static()
			&& !candidate.access.is_abstract
			&& candidate.name == method.name
			&& candidate.descriptor == method.descriptor
	};

	let mut current = Some(class_name.to_owned());
	while let Some(name) = current {
		let info = provider.get(&name)?
			.ok_or_else(|| CompileError::missing_class(name.as_str()))?;
		if let Some(found) = info.methods.iter().find(matches) {
			return Ok(Some(found.as_ref_of(&info.name)));
		}
		current = info.super_class.as_ref().map(|super_name| super_name.as_str().to_owned());
	}

	for interface_name in interface_names {
		let info = provider.get(interface_name)?
			.ok_or_else(|| CompileError::missing_class(interface_name.as_str()))?;
		if let Some(found) = info.methods.iter().find(matches) {
			return Ok(Some(found.as_ref_of(&info.name)));
		}
	}

	Ok(None)
}
