use anyhow::{anyhow, Context, Result};
use crate::registry::TypeId;
use crate::tree::method::MethodRef;

/// Little-endian writing onto a byte sink. Everything the engine emits
/// (descriptors, the type table, import payloads) is little-endian; this is
/// part of the target module contract.
///
/// `JI2`/`JI4` are the two integer widths of the import record format:
/// 2 bytes for string lengths and access flags, 4 bytes for counts.
pub trait DataWrite {
	fn write_u8_slice(&mut self, buf: &[u8]) -> Result<()>;

	fn write_u8(&mut self, value: u8) -> Result<()> {
		self.write_u8_slice(&[value]).context("couldn't write u8")
	}
	fn write_i32(&mut self, value: i32) -> Result<()> {
		self.write_u8_slice(&value.to_le_bytes()).context("couldn't write i32")
	}
	fn write_u32(&mut self, value: u32) -> Result<()> {
		self.write_u8_slice(&value.to_le_bytes()).context("couldn't write u32")
	}

	fn write_ji2(&mut self, value: usize) -> Result<()> {
		let value = u16::try_from(value)
			.with_context(|| anyhow!("failed to convert {value} to u16 for writing: value too large"))?;
		self.write_u8_slice(&value.to_le_bytes()).context("couldn't write ji2")
	}
	fn write_ji4(&mut self, value: usize) -> Result<()> {
		let value = u32::try_from(value)
			.with_context(|| anyhow!("failed to convert {value} to u32 for writing: value too large"))?;
		self.write_u32(value)
	}

	/// A `JI2` length prefix followed by the utf-8 bytes of `s`.
	fn write_string(&mut self, s: &str) -> Result<()> {
		self.write_ji2(s.len())
			.with_context(|| anyhow!("string {s:?} is too long"))?;
		self.write_u8_slice(s.as_bytes())
	}
}

impl DataWrite for Vec<u8> {
	fn write_u8_slice(&mut self, buf: &[u8]) -> Result<()> {
		self.extend_from_slice(buf);
		Ok(())
	}
}

/// The module's data section: an append-only byte buffer with cursor
/// semantics. [`DataSection::size`] is the offset the next write lands at,
/// which is how descriptor offsets are assigned.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DataSection {
	bytes: Vec<u8>,
}

impl DataSection {
	pub fn new() -> DataSection {
		DataSection { bytes: Vec::new() }
	}

	/// The current byte offset.
	pub fn size(&self) -> u32 {
		self.bytes.len() as u32
	}

	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}
}

impl DataWrite for DataSection {
	fn write_u8_slice(&mut self, buf: &[u8]) -> Result<()> {
		self.bytes.write_u8_slice(buf)
	}
}

/// An argument accompanying an import payload. The payload bytes describe
/// the record's shape; the handles that need resolving by the module writer
/// travel here, in the order the payload references them.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportArg {
	Type(TypeId),
	Function(MethodRef),
}

/// The module writer collaborator.
///
/// Accepts type and function imports and owns the data section plus the
/// string table of the module being produced.
pub trait ModuleWriter {
	/// Emits one import record. `payload` starts with an opcode byte from
	/// [`crate::constants::import_op`]; `self_type` is the type the record
	/// describes; `args` are the handles the payload references, in order.
	fn import_type(&mut self, namespace: &str, payload: Vec<u8>, self_type: TypeId, args: Vec<ImportArg>) -> Result<()>;

	/// Declares that a function crosses the module boundary.
	fn import_function(&mut self, function: &MethodRef) -> Result<()>;

	/// The function id the module assigned; this is the value vtable and
	/// itable slots hold at runtime.
	fn function_index(&mut self, function: &MethodRef) -> Result<u32>;

	/// Interns `s` in the module's string table and returns its id.
	fn string_index(&mut self, s: &str) -> Result<u32>;

	/// The module's data section.
	fn data(&mut self) -> &mut DataSection;
}
