//! Emission ordering: every type must be written after everything in its
//! instanceof set, so that descriptors and imports only ever reference
//! already-emitted types.

use anyhow::Result;
use indexmap::IndexSet;
use log::debug;
use crate::error::CompileError;
use crate::registry::{TypeId, TypeRegistry};

/// Linearizes the registry.
///
/// Iterative sweeps: a type enters the order once its whole instanceof set
/// (except itself) is already there. The instanceof relation is a DAG with
/// self-loops only, so every sweep places at least one more type; a sweep
/// that places none means the hierarchy has a cycle, which is fatal. The
/// sweeps are quadratic in the worst case, which is fine for the thousands
/// of types a compilation sees.
pub(crate) fn emission_order(registry: &TypeRegistry) -> Result<Vec<TypeId>> {
	let mut ordered: IndexSet<TypeId> = IndexSet::new();

	while ordered.len() < registry.size() {
		let before = ordered.len();

		for id in registry.ids() {
			if ordered.contains(&id) {
				continue;
			}
			let placeable = registry.get(id)
				.instance_of()
				.iter()
				.all(|&super_type| super_type == id || ordered.contains(&super_type));
			if placeable {
				ordered.insert(id);
			}
		}

		if ordered.len() == before {
			let stuck = registry.ids()
				.find(|id| !ordered.contains(id))
				.map(|id| registry.get(id).name().to_owned())
				.unwrap_or_default();
			return Err(CompileError::cycle_in_hierarchy(stuck).into());
		}
	}

	debug!("emission order fixed over {} types", ordered.len());

	Ok(ordered.into_iter().collect())
}
