//! Shared fakes for the integration tests: an in-memory classfile
//! provider, a recording function registry and a recording module writer.
#![allow(dead_code)]

use anyhow::Result;
use indexmap::{IndexMap, IndexSet};
use rachis::functions::{FunctionRegistry, SyntheticFunction};
use rachis::provider::ClassProvider;
use rachis::registry::TypeId;
use rachis::tree::class::{ClassAccess, ClassInfo, ClassName};
use rachis::tree::field::{FieldAccess, FieldInfo};
use rachis::tree::method::{MethodAccess, MethodInfo, MethodRef};
use rachis::writer::{DataSection, ImportArg, ModuleWriter};

#[derive(Debug, Default)]
pub struct Classes {
	classes: IndexMap<String, ClassInfo>,
}

impl Classes {
	pub fn new() -> Classes {
		Classes::default()
	}

	pub fn with(mut self, info: ClassInfo) -> Classes {
		self.classes.insert(info.name.as_str().to_owned(), info);
		self
	}
}

impl ClassProvider for Classes {
	fn get(&self, name: &str) -> Result<Option<&ClassInfo>> {
		Ok(self.classes.get(name))
	}
}

#[derive(Debug, Default)]
pub struct Functions {
	pub used: IndexSet<MethodRef>,
	pub vtable_indices: IndexMap<MethodRef, usize>,
	pub itable_indices: IndexMap<MethodRef, usize>,
	pub synthetics: Vec<SyntheticFunction>,
}

impl Functions {
	pub fn new() -> Functions {
		Functions::default()
	}

	pub fn with_used(mut self, function: MethodRef) -> Functions {
		self.used.insert(function);
		self
	}

	pub fn synthetic(&self, name: &str) -> Option<&SyntheticFunction> {
		self.synthetics.iter().find(|synthetic| synthetic.method.name == *name)
	}
}

impl FunctionRegistry for Functions {
	fn is_used(&self, function: &MethodRef) -> bool {
		self.used.contains(function)
	}

	fn mark_as_needed(&mut self, function: &MethodRef) -> Result<()> {
		self.used.insert(function.clone());
		Ok(())
	}

	fn set_vtable_index(&mut self, function: &MethodRef, index: usize) -> Result<()> {
		self.vtable_indices.insert(function.clone(), index);
		Ok(())
	}

	fn itable_index(&self, function: &MethodRef) -> Option<usize> {
		self.itable_indices.get(function).copied()
	}

	fn set_itable_index(&mut self, function: &MethodRef, index: usize) -> Result<()> {
		self.itable_indices.insert(function.clone(), index);
		Ok(())
	}

	fn add_synthetic(&mut self, function: SyntheticFunction) -> Result<()> {
		self.used.insert(function.method.clone());
		self.synthetics.push(function);
		Ok(())
	}
}

#[derive(Debug, Default)]
pub struct Module {
	pub data: DataSection,
	pub function_ids: IndexMap<MethodRef, u32>,
	pub strings: IndexMap<String, u32>,
	pub type_imports: Vec<TypeImport>,
	pub imported_functions: Vec<MethodRef>,
}

#[derive(Debug)]
pub struct TypeImport {
	pub namespace: String,
	pub payload: Vec<u8>,
	pub self_type: TypeId,
	pub args: Vec<ImportArg>,
}

impl Module {
	pub fn new() -> Module {
		Module::default()
	}

	pub fn function_id(&self, function: &MethodRef) -> Option<u32> {
		self.function_ids.get(function).copied()
	}

	pub fn imports_of(&self, self_type: TypeId) -> Vec<&TypeImport> {
		self.type_imports.iter()
			.filter(|import| import.self_type == self_type)
			.collect()
	}
}

impl ModuleWriter for Module {
	fn import_type(&mut self, namespace: &str, payload: Vec<u8>, self_type: TypeId, args: Vec<ImportArg>) -> Result<()> {
		self.type_imports.push(TypeImport {
			namespace: namespace.to_owned(),
			payload,
			self_type,
			args,
		});
		Ok(())
	}

	fn import_function(&mut self, function: &MethodRef) -> Result<()> {
		self.imported_functions.push(function.clone());
		Ok(())
	}

	fn function_index(&mut self, function: &MethodRef) -> Result<u32> {
		let next = self.function_ids.len() as u32;
		Ok(*self.function_ids.entry(function.clone()).or_insert(next))
	}

	fn string_index(&mut self, s: &str) -> Result<u32> {
		let next = self.strings.len() as u32;
		Ok(*self.strings.entry(s.to_owned()).or_insert(next))
	}

	fn data(&mut self) -> &mut DataSection {
		&mut self.data
	}
}

pub fn object_info() -> ClassInfo {
	ClassInfo::new(
		ClassAccess { is_public: true, ..ClassAccess::default() },
		ClassName::from(ClassName::JAVA_LANG_OBJECT),
		None,
		Vec::new(),
	)
}

pub fn class(name: &'static str, super_class: &'static str, interfaces: &[&'static str]) -> ClassInfo {
	ClassInfo::new(
		ClassAccess { is_public: true, is_super: true, ..ClassAccess::default() },
		ClassName::from(name),
		Some(ClassName::from(super_class)),
		interfaces.iter().map(|&interface| ClassName::from(interface)).collect(),
	)
}

pub fn abstract_class(name: &'static str, super_class: &'static str, interfaces: &[&'static str]) -> ClassInfo {
	let mut info = class(name, super_class, interfaces);
	info.access.is_abstract = true;
	info
}

pub fn interface(name: &'static str, extends: &[&'static str]) -> ClassInfo {
	ClassInfo::new(
		ClassAccess { is_public: true, is_interface: true, is_abstract: true, ..ClassAccess::default() },
		ClassName::from(name),
		None,
		extends.iter().map(|&extended| ClassName::from(extended)).collect(),
	)
}

pub fn method(name: &'static str, descriptor: &'static str) -> MethodInfo {
	MethodInfo::new(
		MethodAccess { is_public: true, ..MethodAccess::default() },
		name.into(),
		descriptor.into(),
	)
}

pub fn abstract_method(name: &'static str, descriptor: &'static str) -> MethodInfo {
	let mut info = method(name, descriptor);
	info.access.is_abstract = true;
	info
}

pub fn static_method(name: &'static str, descriptor: &'static str) -> MethodInfo {
	let mut info = method(name, descriptor);
	info.access.is_static = true;
	info
}

pub fn field(name: &'static str, descriptor: &'static str) -> FieldInfo {
	FieldInfo::new(
		FieldAccess { is_private: true, ..FieldAccess::default() },
		name.into(),
		descriptor.into(),
	)
}

pub fn static_field(name: &'static str, descriptor: &'static str) -> FieldInfo {
	let mut info = field(name, descriptor);
	info.access.is_static = true;
	info
}

pub fn mref(class: &'static str, name: &'static str, descriptor: &'static str) -> MethodRef {
	MethodRef::new(class, name, descriptor)
}

/// Reads the little-endian i32 at `offset`.
pub fn read_i32(bytes: &[u8], offset: u32) -> i32 {
	let offset = offset as usize;
	let mut buf = [0; 4];
	buf.copy_from_slice(&bytes[offset..offset + 4]);
	i32::from_le_bytes(buf)
}
