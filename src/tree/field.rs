use std::borrow::Cow;
use std::fmt::{Debug, Formatter};
use crate::macros::{string_newtype, string_newtype_eq_str};

/// A field name, e.g. `value`. The two synthetic object-header fields use
/// names no classfile can declare, `.vtable` and `.hashcode`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldName(Cow<'static, str>);

string_newtype!(FieldName);
string_newtype_eq_str!(FieldName);

/// A field descriptor, e.g. `I` or `Ljava/lang/Thread;` or `[[D`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldDescriptor(Cow<'static, str>);

string_newtype!(FieldDescriptor);
string_newtype_eq_str!(FieldDescriptor);

#[derive(Copy, Clone, Default, PartialEq)]
pub struct FieldAccess {
	pub is_public: bool,
	pub is_private: bool,
	pub is_protected: bool,
	pub is_static: bool,
	pub is_final: bool,
	pub is_volatile: bool,
	pub is_transient: bool,
	pub is_synthetic: bool,
	pub is_enum: bool,
}

impl Debug for FieldAccess {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str("FieldAccess { ")?;
		if self.is_public     { f.write_str("public ")?; }
		if self.is_private    { f.write_str("private ")?; }
		if self.is_protected  { f.write_str("protected ")?; }
		if self.is_static     { f.write_str("static ")?; }
		if self.is_final      { f.write_str("final ")?; }
		if self.is_volatile   { f.write_str("volatile ")?; }
		if self.is_transient  { f.write_str("transient ")?; }
		if self.is_synthetic  { f.write_str("synthetic ")?; }
		if self.is_enum       { f.write_str("enum ")?; }
		f.write_str("}")
	}
}

impl From<u16> for FieldAccess {
	fn from(value: u16) -> Self {
		FieldAccess {
			is_public:    value & 0x0001 != 0,
			is_private:   value & 0x0002 != 0,
			is_protected: value & 0x0004 != 0,
			is_static:    value & 0x0008 != 0,
			is_final:     value & 0x0010 != 0,
			is_volatile:  value & 0x0040 != 0,
			is_transient: value & 0x0080 != 0,
			is_synthetic: value & 0x1000 != 0,
			is_enum:      value & 0x4000 != 0,
		}
	}
}

impl From<FieldAccess> for u16 {
	fn from(value: FieldAccess) -> Self {
		(if value.is_public    { 0x0001 } else { 0 }) |
		(if value.is_private   { 0x0002 } else { 0 }) |
		(if value.is_protected { 0x0004 } else { 0 }) |
		(if value.is_static    { 0x0008 } else { 0 }) |
		(if value.is_final     { 0x0010 } else { 0 }) |
		(if value.is_volatile  { 0x0040 } else { 0 }) |
		(if value.is_transient { 0x0080 } else { 0 }) |
		(if value.is_synthetic { 0x1000 } else { 0 }) |
		(if value.is_enum      { 0x4000 } else { 0 })
	}
}

/// A field as declared in a classfile.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
	pub access: FieldAccess,
	pub name: FieldName,
	pub descriptor: FieldDescriptor,
}

impl FieldInfo {
	pub fn new(access: FieldAccess, name: FieldName, descriptor: FieldDescriptor) -> FieldInfo {
		FieldInfo { access, name, descriptor }
	}

	pub fn is_static(&self) -> bool {
		self.access.is_static
	}
}
