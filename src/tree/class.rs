use std::borrow::Cow;
use std::fmt::{Debug, Formatter};
use crate::macros::{string_newtype, string_newtype_eq_str};
use crate::tree::field::FieldInfo;
use crate::tree::method::MethodInfo;

/// Represents a class name in internal binary form, i.e. with the complete
/// path written out and using slashes: the java class `java.lang.Thread`
/// would be `java/lang/Thread`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClassName(Cow<'static, str>);

string_newtype!(ClassName);
string_newtype_eq_str!(ClassName);

impl ClassName {
	/// A constant holding the class name of `Object`.
	pub const JAVA_LANG_OBJECT: &'static str = "java/lang/Object";

	/// The dotted form of the name, as the runtime reports it
	/// (`java/lang/Thread` becomes `java.lang.Thread`).
	pub fn dotted(&self) -> String {
		self.0.replace('/', ".")
	}
}

/// The access flags a class can have, after reading the `access_flags` item
/// of a classfile.
#[derive(Copy, Clone, Default, PartialEq)]
pub struct ClassAccess {
	pub is_public: bool,
	pub is_final: bool,
	pub is_super: bool,
	pub is_interface: bool,
	pub is_abstract: bool,
	pub is_synthetic: bool,
	pub is_annotation: bool,
	pub is_enum: bool,
}

impl Debug for ClassAccess {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str("ClassAccess { ")?;
		if self.is_public     { f.write_str("public ")?; }
		if self.is_final      { f.write_str("final ")?; }
		if self.is_super      { f.write_str("super ")?; }
		if self.is_interface  { f.write_str("interface ")?; }
		if self.is_abstract   { f.write_str("abstract ")?; }
		if self.is_synthetic  { f.write_str("synthetic ")?; }
		if self.is_annotation { f.write_str("annotation ")?; }
		if self.is_enum       { f.write_str("enum ")?; }
		f.write_str("}")
	}
}

impl From<u16> for ClassAccess {
	fn from(value: u16) -> Self {
		ClassAccess {
			is_public:     value & 0x0001 != 0,
			is_final:      value & 0x0010 != 0,
			is_super:      value & 0x0020 != 0,
			is_interface:  value & 0x0200 != 0,
			is_abstract:   value & 0x0400 != 0,
			is_synthetic:  value & 0x1000 != 0,
			is_annotation: value & 0x2000 != 0,
			is_enum:       value & 0x4000 != 0,
		}
	}
}

impl From<ClassAccess> for u16 {
	fn from(value: ClassAccess) -> Self {
		(if value.is_public     { 0x0001 } else { 0 }) |
		(if value.is_final      { 0x0010 } else { 0 }) |
		(if value.is_super      { 0x0020 } else { 0 }) |
		(if value.is_interface  { 0x0200 } else { 0 }) |
		(if value.is_abstract   { 0x0400 } else { 0 }) |
		(if value.is_synthetic  { 0x1000 } else { 0 }) |
		(if value.is_annotation { 0x2000 } else { 0 }) |
		(if value.is_enum       { 0x4000 } else { 0 })
	}
}

/// The metadata of one class, as handed over by the classfile provider.
///
/// This is the narrow slice of a classfile the layout engine consumes: the
/// kind and flags, the direct hierarchy edges, and the declared fields and
/// methods. Attributes, constant pools and method bodies stay with the
/// provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
	pub access: ClassAccess,
	pub name: ClassName,
	pub super_class: Option<ClassName>,
	pub interfaces: Vec<ClassName>,

	pub fields: Vec<FieldInfo>,
	pub methods: Vec<MethodInfo>,
}

impl ClassInfo {
	pub fn new(access: ClassAccess, name: ClassName, super_class: Option<ClassName>, interfaces: Vec<ClassName>) -> ClassInfo {
		ClassInfo {
			access,
			name,
			super_class,
			interfaces,

			fields: Vec::new(),
			methods: Vec::new(),
		}
	}

	pub fn is_interface(&self) -> bool {
		self.access.is_interface
	}
}
