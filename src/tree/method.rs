use anyhow::{anyhow, bail, Result};
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use crate::macros::{string_newtype, string_newtype_eq_str};
use crate::tree::class::ClassName;

/// A method name, e.g. `toString` or `<init>`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MethodName(Cow<'static, str>);

string_newtype!(MethodName);
string_newtype_eq_str!(MethodName);

impl MethodName {
	/// The name every constructor carries.
	pub const INIT: &'static str = "<init>";
	/// The name of the class initializer.
	pub const CLINIT: &'static str = "<clinit>";
}

/// A method descriptor, e.g. `(IDLjava/lang/Thread;)Ljava/lang/Object;`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MethodDescriptor(Cow<'static, str>);

string_newtype!(MethodDescriptor);
string_newtype_eq_str!(MethodDescriptor);

impl MethodDescriptor {
	/// The parameter descriptors, one string slice per parameter.
	///
	/// Fails on malformed descriptors.
	pub fn parameters(&self) -> Result<Vec<&str>> {
		let inner = self.as_str()
			.strip_prefix('(')
			.ok_or_else(|| anyhow!("method descriptor {self:?} doesn't start with '('"))?;

		let mut parameters = Vec::new();
		let mut rest = inner;
		loop {
			if rest.starts_with(')') {
				// everything after is the return descriptor
				break;
			}

			let dim = rest.len() - rest.trim_start_matches('[').len();
			let after_dim = &rest[dim..];
			let len = match after_dim.chars().next() {
				Some('L') => {
					let semi = after_dim.find(';')
						.ok_or_else(|| anyhow!("method descriptor {self:?} has a missing semicolon somewhere"))?;
					dim + semi + 1
				}
				Some('Z' | 'B' | 'C' | 'S' | 'I' | 'J' | 'F' | 'D') => dim + 1,
				_ => bail!("unexpected char in method descriptor {self:?}"),
			};
			parameters.push(&rest[..len]);
			rest = &rest[len..];
		}

		Ok(parameters)
	}
}

#[derive(Copy, Clone, Default, PartialEq)]
pub struct MethodAccess {
	pub is_public: bool,
	pub is_private: bool,
	pub is_protected: bool,
	pub is_static: bool,
	pub is_final: bool,
	pub is_synchronized: bool,
	pub is_bridge: bool,
	pub is_varargs: bool,
	pub is_native: bool,
	pub is_abstract: bool,
	pub is_synthetic: bool,
}

impl Debug for MethodAccess {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str("MethodAccess { ")?;
		if self.is_public       { f.write_str("public ")?; }
		if self.is_private      { f.write_str("private ")?; }
		if self.is_protected    { f.write_str("protected ")?; }
		if self.is_static       { f.write_str("static ")?; }
		if self.is_final        { f.write_str("final ")?; }
		if self.is_synchronized { f.write_str("synchronized ")?; }
		if self.is_bridge       { f.write_str("bridge ")?; }
		if self.is_varargs      { f.write_str("varargs ")?; }
		if self.is_native       { f.write_str("native ")?; }
		if self.is_abstract     { f.write_str("abstract ")?; }
		if self.is_synthetic    { f.write_str("synthetic ")?; }
		f.write_str("}")
	}
}

impl From<u16> for MethodAccess {
	fn from(value: u16) -> Self {
		MethodAccess {
			is_public:       value & 0x0001 != 0,
			is_private:      value & 0x0002 != 0,
			is_protected:    value & 0x0004 != 0,
			is_static:       value & 0x0008 != 0,
			is_final:        value & 0x0010 != 0,
			is_synchronized: value & 0x0020 != 0,
			is_bridge:       value & 0x0040 != 0,
			is_varargs:      value & 0x0080 != 0,
			is_native:       value & 0x0100 != 0,
			is_abstract:     value & 0x0400 != 0,
			is_synthetic:    value & 0x1000 != 0,
		}
	}
}

impl From<MethodAccess> for u16 {
	fn from(value: MethodAccess) -> Self {
		(if value.is_public       { 0x0001 } else { 0 }) |
		(if value.is_private      { 0x0002 } else { 0 }) |
		(if value.is_protected    { 0x0004 } else { 0 }) |
		(if value.is_static       { 0x0008 } else { 0 }) |
		(if value.is_final        { 0x0010 } else { 0 }) |
		(if value.is_synchronized { 0x0020 } else { 0 }) |
		(if value.is_bridge       { 0x0040 } else { 0 }) |
		(if value.is_varargs      { 0x0080 } else { 0 }) |
		(if value.is_native       { 0x0100 } else { 0 }) |
		(if value.is_abstract     { 0x0400 } else { 0 }) |
		(if value.is_synthetic    { 0x1000 } else { 0 })
	}
}

/// A method as declared in a classfile.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
	pub access: MethodAccess,
	pub name: MethodName,
	pub descriptor: MethodDescriptor,
}

impl MethodInfo {
	pub fn new(access: MethodAccess, name: MethodName, descriptor: MethodDescriptor) -> MethodInfo {
		MethodInfo { access, name, descriptor }
	}

	pub fn is_static(&self) -> bool {
		self.access.is_static
	}

	pub fn is_constructor(&self) -> bool {
		self.name == MethodName::INIT
	}

	/// Clones this method's name and descriptor into a [`MethodRef`] owned
	/// by `class`.
	pub fn as_ref_of(&self, class: &ClassName) -> MethodRef {
		MethodRef {
			class: class.clone(),
			name: self.name.clone(),
			desc: self.descriptor.clone(),
		}
	}
}

/// A function handle: the `(class, name, descriptor)` triple every vtable
/// and itable entry resolves through, and the identity the function
/// registry compares by.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MethodRef {
	pub class: ClassName,
	pub name: MethodName,
	pub desc: MethodDescriptor,
}

impl MethodRef {
	pub fn new(class: impl Into<ClassName>, name: impl Into<MethodName>, desc: impl Into<MethodDescriptor>) -> MethodRef {
		MethodRef {
			class: class.into(),
			name: name.into(),
			desc: desc.into(),
		}
	}
}

impl Display for MethodRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}{}", self.class, self.name, self.desc)
	}
}
