//! The synthesized dispatch routines, written in the target module's
//! textual instruction form.
//!
//! Each one walks the descriptor layout of [`crate::emit::descriptor`] and
//! must stay in lock-step with it: the region offsets at descriptor bytes 0
//! and 4 already include the 16-byte header, itable blocks are
//! `[class index, stride, functions...]` with a 0 sentinel, the instanceof
//! region is a count followed by class indices.
//!
//! Vtable and itable indices published to the function registry are slot
//! numbers; call sites scale them by 4 into the byte offsets these routines
//! take as parameters.

use anyhow::Result;
use crate::constants::VTABLE_FIELD;
use crate::functions::{FunctionRegistry, StackType, SyntheticFunction};
use crate::tree::class::ClassName;
use crate::tree::method::MethodRef;

/// The pre-declared class-constant factory of the target runtime. Not
/// synthesized here; call sites reference it by this handle.
pub fn class_constant() -> MethodRef {
	MethodRef::new("java/lang/Class", "classConstant", "(I)Ljava/lang/Class;")
}

fn object_method(name: &'static str, desc: &'static str) -> MethodRef {
	MethodRef::new(ClassName::JAVA_LANG_OBJECT, name, desc)
}

fn register(
	functions: &mut impl FunctionRegistry,
	method: MethodRef,
	locals: Vec<StackType>,
	code: String,
) -> Result<MethodRef> {
	functions.add_synthetic(SyntheticFunction::new(method.clone(), locals, code))?;
	functions.mark_as_needed(&method)?;
	Ok(method)
}

/// `virtualCall(this, vfIdx) -> funcId`: one load out of the vtable region.
pub fn virtual_call(functions: &mut impl FunctionRegistry) -> Result<MethodRef> {
	let code = format!(
		"local.get 0\n\
		struct.get {object} {VTABLE_FIELD}\n\
		local.get 1\n\
		i32.add\n\
		i32.load offset=0 align=4\n\
		return\n",
		object = ClassName::JAVA_LANG_OBJECT,
	);
	register(functions, object_method("virtualCall", "(Ljava/lang/Object;I)I"), Vec::new(), code)
}

/// `interfaceCall(this, classIdx, vfIdx) -> funcId`: walks the itable
/// blocks until one opens with `classIdx`, then loads at `vfIdx` into it.
/// A 0 header means the interface is not in the table, which traps.
pub fn interface_call(functions: &mut impl FunctionRegistry) -> Result<MethodRef> {
	let code = format!(
		"local.get 0\n\
		struct.get {object} {VTABLE_FIELD}\n\
		local.tee 3\n\
		local.get 3\n\
		i32.load offset=0 align=4\n\
		i32.add\n\
		local.set 3\n\
		loop\n\
		local.get 3\n\
		i32.load offset=0 align=4\n\
		local.tee 4\n\
		local.get 1\n\
		i32.eq\n\
		if\n\
		local.get 3\n\
		local.get 2\n\
		i32.add\n\
		i32.load offset=0 align=4\n\
		return\n\
		end\n\
		local.get 4\n\
		i32.eqz\n\
		if\n\
		unreachable\n\
		end\n\
		local.get 3\n\
		local.get 3\n\
		i32.load offset=4 align=4\n\
		i32.add\n\
		local.set 3\n\
		br 0\n\
		end\n",
		object = ClassName::JAVA_LANG_OBJECT,
	);
	register(
		functions,
		object_method("interfaceCall", "(Ljava/lang/Object;II)I"),
		vec![StackType::I32, StackType::I32],
		code,
	)
}

/// `instanceOf(this, classIdx) -> bool`: scans the instanceof region.
pub fn instance_of(functions: &mut impl FunctionRegistry) -> Result<MethodRef> {
	let code = format!(
		"local.get 0\n\
		struct.get {object} {VTABLE_FIELD}\n\
		local.tee 2\n\
		local.get 2\n\
		i32.load offset=4 align=4\n\
		i32.add\n\
		local.set 2\n\
		local.get 2\n\
		i32.load offset=0 align=4\n\
		local.set 3\n\
		loop\n\
		local.get 3\n\
		i32.eqz\n\
		if\n\
		i32.const 0\n\
		return\n\
		end\n\
		local.get 2\n\
		i32.const 4\n\
		i32.add\n\
		local.tee 2\n\
		i32.load offset=0 align=4\n\
		local.get 1\n\
		i32.eq\n\
		if\n\
		i32.const 1\n\
		return\n\
		end\n\
		local.get 3\n\
		i32.const 1\n\
		i32.sub\n\
		local.set 3\n\
		br 0\n\
		end\n",
		object = ClassName::JAVA_LANG_OBJECT,
	);
	register(
		functions,
		object_method("instanceOf", "(Ljava/lang/Object;I)Z"),
		vec![StackType::I32, StackType::I32],
		code,
	)
}

/// `castTo(this, classIdx) -> this`: an instanceof check that traps on
/// failure instead of answering.
pub fn cast_to(functions: &mut impl FunctionRegistry) -> Result<MethodRef> {
	let check = instance_of(functions)?;
	let code = format!(
		"local.get 0\n\
		local.get 1\n\
		call ${check}\n\
		i32.eqz\n\
		if\n\
		unreachable\n\
		end\n\
		local.get 0\n\
		return\n",
	);
	register(functions, object_method("castTo", "(Ljava/lang/Object;I)Ljava/lang/Object;"), Vec::new(), code)
}

/// The accessor reflective code reads the type table's location through,
/// registered by the descriptor emitter once the table's offset is known.
pub(crate) fn register_type_table_offset(functions: &mut impl FunctionRegistry, offset: u32) -> Result<MethodRef> {
	let code = format!("i32.const {offset}\nreturn\n");
	register(
		functions,
		MethodRef::new("java/lang/Class", "typeTableMemoryOffset", "()I"),
		Vec::new(),
		code,
	)
}
