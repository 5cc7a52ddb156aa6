//! Constants of the target module contract: import opcodes, the translated
//! access-flag taxonomy, and the byte layout of type descriptors.

/// Namespace every type import and function import is filed under.
pub const IMPORT_NAMESPACE: &str = "java";

/// Classes the target runtime defines itself; they are declared with
/// [`import_op::EXT_CLASS`] instead of [`import_op::DECL_CLASS`].
pub const EXT_CLASSES: &[&str] = &["java/lang/Object", "java/lang/String"];

/// The opcode byte prefixing each import payload.
pub mod import_op {
	pub const DECL_CLASS: u8 = 0x01;
	pub const DECL_INTERFACE: u8 = 0x02;
	pub const EXT_CLASS: u8 = 0x03;
	pub const DEF_CLASS: u8 = 0x04;
	pub const DEF_INTERFACE: u8 = 0x05;
}

/// Class access flags after translation into the target taxonomy.
///
/// The target runtime only distinguishes these four; everything else a
/// classfile can express stays on the provider side.
pub mod type_access {
	pub const ABSTRACT: u16 = 0x0001;
	pub const FINAL: u16 = 0x0002;
	pub const ENUM: u16 = 0x0004;
	pub const ANNOTATION: u16 = 0x0008;
}

/// The name of the synthetic object-header field holding the address of the
/// owning class's type descriptor. Offset 0 in every instance.
pub const VTABLE_FIELD: &str = ".vtable";

/// The name of the synthetic object-header field caching the identity hash.
/// Offset 4 in every instance.
pub const HASHCODE_FIELD: &str = ".hashcode";

/// Byte size of a type descriptor's header: the itable offset, the
/// instanceof offset, the name string id and the array component index,
/// one i32 each. The vtable region starts right after it.
pub const DESCRIPTOR_HEADER_SIZE: u32 = 16;

/// First vtable slot a virtual method can occupy; slots 0..3 are the
/// header, counted in i32 words from the descriptor start.
pub const VTABLE_FIRST_SLOT: usize = 4;

/// First itable slot an interface method can occupy; slots 0..1 of each
/// itable block hold the interface's class index and the byte stride to
/// the next block.
pub const ITABLE_FIRST_SLOT: usize = 2;
