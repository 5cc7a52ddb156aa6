//! Emission behavior: descriptor bytes, the dispatch walks the stubs
//! perform over them, the flat type table and the import stream.

use anyhow::{anyhow, Result};
use pretty_assertions::assert_eq;
use rachis::constants::import_op;
use rachis::registry::{TypeId, TypeRegistry};
use rachis::stubs;
use rachis::writer::ImportArg;

mod common;
use common::{class, interface, method, mref, object_info, read_i32, Classes, Functions, Module};

struct Emitted {
	types: TypeRegistry,
	functions: Functions,
	module: Module,
	i_id: TypeId,
	c_id: TypeId,
	ints_id: TypeId,
}

/// Object, an interface `pkg/I { f()V }`, a concrete `pkg/C` implementing
/// it, and `int[]`; `pkg/C.f` is used.
fn emitted() -> Result<Emitted> {
	let mut i = interface("pkg/I", &[]);
	i.methods.push(common::abstract_method("f", "()V"));

	let mut c = class("pkg/C", "java/lang/Object", &["pkg/I"]);
	c.methods.push(method("f", "()V"));

	let provider = Classes::new().with(object_info()).with(i).with(c);
	let mut functions = Functions::new().with_used(mref("pkg/C", "f", "()V"));
	let mut module = Module::new();

	let mut types = TypeRegistry::new();
	let i_id = types.value_of("pkg/I")?;
	let c_id = types.value_of("pkg/C")?;
	let ints_id = types.value_of_sig("[I")?.ok_or_else(|| anyhow!("no array type"))?;
	types.prepare_finish(&provider, &mut functions, &mut module)?;

	Ok(Emitted { types, functions, module, i_id, c_id, ints_id })
}

fn descriptor_offset(emitted: &Emitted, id: TypeId) -> Result<u32> {
	emitted.types.get(id).vtable_offset()
		.ok_or_else(|| anyhow!("{} has no descriptor offset", emitted.types.get(id).name()))
}

/// The interface-call walk of the dispatch stub: follow the itable region
/// until a block opens with `interface_index`, then load the slot.
fn interface_walk(bytes: &[u8], descriptor: u32, interface_index: i32, slot: u32) -> Option<i32> {
	let mut pointer = descriptor + read_i32(bytes, descriptor) as u32;
	loop {
		let probe = read_i32(bytes, pointer);
		if probe == interface_index {
			return Some(read_i32(bytes, pointer + 4 * slot));
		}
		if probe == 0 {
			return None;
		}
		pointer += read_i32(bytes, pointer + 4) as u32;
	}
}

/// The instanceof walk of the dispatch stub: scan the instanceof region
/// for `class_index`.
fn instance_walk(bytes: &[u8], descriptor: u32, class_index: i32) -> bool {
	let mut pointer = descriptor + read_i32(bytes, descriptor + 4) as u32;
	let count = read_i32(bytes, pointer);
	for _ in 0..count {
		pointer += 4;
		if read_i32(bytes, pointer) == class_index {
			return true;
		}
	}
	false
}

#[test]
fn descriptor_regions() -> Result<()> {
	let emitted = emitted()?;
	let bytes = emitted.module.data.bytes();
	let offset = descriptor_offset(&emitted, emitted.c_id)?;

	let c_f_id = emitted.module.function_id(&mref("pkg/C", "f", "()V"))
		.ok_or_else(|| anyhow!("no function id"))? as i32;

	// one vtable slot, so the itable region starts right after it
	assert_eq!(read_i32(bytes, offset), 20);
	assert_eq!(read_i32(bytes, offset + 16), c_f_id);

	// itable region: one block for pkg/I, then the sentinel
	assert_eq!(read_i32(bytes, offset + 20), emitted.i_id.index() as i32);
	assert_eq!(read_i32(bytes, offset + 24), 12);
	assert_eq!(read_i32(bytes, offset + 28), c_f_id);
	assert_eq!(read_i32(bytes, offset + 32), 0);

	// instanceof region: self first
	assert_eq!(read_i32(bytes, offset + 4), 36);
	assert_eq!(read_i32(bytes, offset + 36), 3);
	assert_eq!(read_i32(bytes, offset + 40), emitted.c_id.index() as i32);

	// the name string slot holds the dotted name
	let name_id = read_i32(bytes, offset + 8) as u32;
	assert_eq!(emitted.module.strings.get("pkg.C").copied(), Some(name_id));

	// not an array
	assert_eq!(read_i32(bytes, offset + 12), -1);

	Ok(())
}

#[test]
fn array_descriptor_carries_the_component() -> Result<()> {
	let emitted = emitted()?;
	let bytes = emitted.module.data.bytes();
	let offset = descriptor_offset(&emitted, emitted.ints_id)?;

	// int sits at class index 5
	assert_eq!(read_i32(bytes, offset + 12), 5);

	// Object declares nothing here, so the array's inherited vtable is
	// empty and the itable region opens with its sentinel
	assert_eq!(read_i32(bytes, offset), 16);
	assert_eq!(read_i32(bytes, offset + 16), 0);

	Ok(())
}

#[test]
fn primitive_descriptors_exist() -> Result<()> {
	let emitted = emitted()?;
	let bytes = emitted.module.data.bytes();

	let int = emitted.types.primitive_by_name("int")
		.ok_or_else(|| anyhow!("no int"))?;
	let offset = descriptor_offset(&emitted, int)?;

	// empty vtable, empty itable region
	assert_eq!(read_i32(bytes, offset), 16);
	assert_eq!(read_i32(bytes, offset + 16), 0);
	// assignable only to itself
	assert_eq!(read_i32(bytes, offset + 4), 20);
	assert_eq!(read_i32(bytes, offset + 20), 1);
	assert_eq!(read_i32(bytes, offset + 24), 5);
	// reflective code can still read a name
	let name_id = read_i32(bytes, offset + 8) as u32;
	assert_eq!(emitted.module.strings.get("int").copied(), Some(name_id));

	Ok(())
}

#[test]
fn interface_dispatch_resolves_through_the_bytes() -> Result<()> {
	let emitted = emitted()?;
	let bytes = emitted.module.data.bytes();
	let offset = descriptor_offset(&emitted, emitted.c_id)?;

	let i_f = mref("pkg/I", "f", "()V");
	let slot = emitted.functions.itable_indices.get(&i_f).copied()
		.ok_or_else(|| anyhow!("no itable index"))?;
	assert_eq!(slot, 2);

	let resolved = interface_walk(bytes, offset, emitted.i_id.index() as i32, slot as u32);
	let c_f_id = emitted.module.function_id(&mref("pkg/C", "f", "()V"))
		.ok_or_else(|| anyhow!("no function id"))? as i32;
	assert_eq!(resolved, Some(c_f_id));

	// an interface the class does not implement runs into the sentinel
	assert_eq!(interface_walk(bytes, offset, 12345, slot as u32), None);

	Ok(())
}

#[test]
fn instance_of_walks_match_the_hierarchy() -> Result<()> {
	let emitted = emitted()?;
	let bytes = emitted.module.data.bytes();

	let c_offset = descriptor_offset(&emitted, emitted.c_id)?;
	let object = emitted.types.object_type().ok_or_else(|| anyhow!("no object"))?.index() as i32;

	assert!(instance_walk(bytes, c_offset, emitted.c_id.index() as i32));
	assert!(instance_walk(bytes, c_offset, emitted.i_id.index() as i32));
	assert!(instance_walk(bytes, c_offset, object));
	assert!(!instance_walk(bytes, c_offset, emitted.ints_id.index() as i32));

	let ints_offset = descriptor_offset(&emitted, emitted.ints_id)?;
	assert!(instance_walk(bytes, ints_offset, emitted.ints_id.index() as i32));
	assert!(instance_walk(bytes, ints_offset, object));
	assert!(!instance_walk(bytes, ints_offset, emitted.c_id.index() as i32));

	Ok(())
}

#[test]
fn type_table_holds_every_descriptor_offset() -> Result<()> {
	let emitted = emitted()?;
	let bytes = emitted.module.data.bytes();

	// registry order: primitives, Object, pkg/I, pkg/C, int[]
	let mut registry_order: Vec<TypeId> = ["boolean", "byte", "char", "double", "float", "int", "long", "short", "void"]
		.into_iter()
		.map(|name| emitted.types.primitive_by_name(name).ok_or_else(|| anyhow!("no primitive {name}")))
		.collect::<Result<_>>()?;
	registry_order.push(emitted.types.object_type().ok_or_else(|| anyhow!("no object"))?);
	registry_order.extend([emitted.i_id, emitted.c_id, emitted.ints_id]);
	assert_eq!(registry_order.len(), emitted.types.size());

	let table_offset = emitted.module.data.size() - 4 * emitted.types.size() as u32;
	for (position, &id) in registry_order.iter().enumerate() {
		let entry = read_i32(bytes, table_offset + 4 * position as u32) as u32;
		assert_eq!(entry, descriptor_offset(&emitted, id)?, "table entry {position}");
	}

	// the accessor returns exactly the table's offset
	let accessor = emitted.functions.synthetic("typeTableMemoryOffset")
		.ok_or_else(|| anyhow!("no accessor"))?;
	assert_eq!(accessor.method.class, "java/lang/Class");
	assert!(accessor.code.starts_with(&format!("i32.const {table_offset}\n")));

	Ok(())
}

#[test]
fn declarations_and_definitions() -> Result<()> {
	let emitted = emitted()?;
	let object = emitted.types.object_type().ok_or_else(|| anyhow!("no object"))?;

	// arrays and primitives never reach the import stream
	assert_eq!(emitted.module.type_imports.len(), 5);
	assert!(emitted.module.type_imports.iter().all(|import| import.namespace == "java"));

	// external classes declare only name and parent
	let object_imports = emitted.module.imports_of(object);
	assert_eq!(object_imports.len(), 1);
	let mut expected = vec![import_op::EXT_CLASS, 16, 0];
	expected.extend_from_slice(b"java/lang/Object");
	assert_eq!(object_imports[0].payload, expected);
	assert_eq!(object_imports[0].args, Vec::<ImportArg>::new());

	// the interface declares its (absent) super-interfaces and defines no
	// used methods
	let i_imports = emitted.module.imports_of(emitted.i_id);
	assert_eq!(i_imports.len(), 2);
	let mut expected = vec![import_op::DECL_INTERFACE, 5, 0];
	expected.extend_from_slice(b"pkg/I");
	expected.extend_from_slice(&[0, 0, 0, 0]);
	assert_eq!(i_imports[0].payload, expected);
	assert_eq!(i_imports[1].payload[0], import_op::DEF_INTERFACE);

	// the class declaration carries flags, interface count, parent and
	// interfaces
	let c_imports = emitted.module.imports_of(emitted.c_id);
	assert_eq!(c_imports.len(), 2);
	let mut expected = vec![import_op::DECL_CLASS, 5, 0];
	expected.extend_from_slice(b"pkg/C");
	expected.extend_from_slice(&[0, 0]); // no abstract/final/enum/annotation
	expected.extend_from_slice(&[1, 0, 0, 0]);
	assert_eq!(c_imports[0].payload, expected);
	assert_eq!(c_imports[0].args, vec![ImportArg::Type(object), ImportArg::Type(emitted.i_id)]);

	// the definition: no fields, one used instance method, nothing static
	let mut expected = vec![import_op::DEF_CLASS];
	expected.extend_from_slice(&[0, 0, 0, 0]); // instance fields
	expected.extend_from_slice(&[1, 0, 0, 0]); // instance methods
	expected.extend_from_slice(&[1, 0]);
	expected.extend_from_slice(b"f");
	expected.extend_from_slice(&[1, 0]); // public
	expected.extend_from_slice(&[2, 0]); // "()V" minus one
	expected.extend_from_slice(b"()V");
	expected.extend_from_slice(&[0, 0, 0, 0]); // static fields
	expected.extend_from_slice(&[0, 0, 0, 0]); // static methods
	assert_eq!(c_imports[1].payload, expected);
	assert_eq!(c_imports[1].args, vec![ImportArg::Function(mref("pkg/C", "f", "()V"))]);

	assert!(emitted.module.imported_functions.contains(&mref("pkg/C", "f", "()V")));

	// dense emission indices over the named types only
	assert_eq!(emitted.types.get(object).emission_index(), Some(0));
	assert_eq!(emitted.types.get(emitted.i_id).emission_index(), Some(1));
	assert_eq!(emitted.types.get(emitted.c_id).emission_index(), Some(2));
	assert_eq!(emitted.types.get(emitted.ints_id).emission_index(), None);

	Ok(())
}

#[test]
fn dispatch_stubs_match_the_layout() -> Result<()> {
	let mut functions = Functions::new();

	let virtual_call = stubs::virtual_call(&mut functions)?;
	assert_eq!(virtual_call, mref("java/lang/Object", "virtualCall", "(Ljava/lang/Object;I)I"));

	let interface_call = stubs::interface_call(&mut functions)?;
	assert_eq!(interface_call.desc, "(Ljava/lang/Object;II)I");

	let cast_to = stubs::cast_to(&mut functions)?;
	assert_eq!(cast_to.name, "castTo");

	// castTo pulled its check in as well
	assert!(functions.synthetic("instanceOf").is_some());
	assert!(functions.used.contains(&mref("java/lang/Object", "instanceOf", "(Ljava/lang/Object;I)Z")));

	let virtual_code = &functions.synthetic("virtualCall").ok_or_else(|| anyhow!("no stub"))?.code;
	assert!(virtual_code.contains("struct.get java/lang/Object .vtable"));
	assert!(virtual_code.contains("i32.load offset=0 align=4"));

	let interface_code = &functions.synthetic("interfaceCall").ok_or_else(|| anyhow!("no stub"))?.code;
	// the stride load that steps between itable blocks
	assert!(interface_code.contains("i32.load offset=4 align=4"));
	assert!(interface_code.contains("unreachable"));

	let cast_code = &functions.synthetic("castTo").ok_or_else(|| anyhow!("no stub"))?.code;
	assert!(cast_code.contains("call $java/lang/Object.instanceOf(Ljava/lang/Object;I)Z"));

	assert_eq!(
		stubs::class_constant(),
		mref("java/lang/Class", "classConstant", "(I)Ljava/lang/Class;")
	);

	Ok(())
}
