use anyhow::{bail, Context, Result};
use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use crate::constants::{import_op, EXT_CLASSES};
use crate::error::CompileError;
use crate::functions::FunctionRegistry;
use crate::provider::ClassProvider;
use crate::tree::class::{ClassAccess, ClassName};
use crate::tree::field::{FieldDescriptor, FieldName};
use crate::tree::method::MethodRef;
use crate::writer::ModuleWriter;
use crate::{emit, hierarchy, itable, order};

/// The stable identity of an interned type: its class index.
///
/// Assigned once at interning, monotonically increasing, never recycled.
/// Indices 0..=8 are the primitives, index 9 is `java/lang/Object`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TypeId(u32);

impl TypeId {
	/// `java/lang/Object`, seeded together with the primitives.
	pub(crate) const OBJECT: TypeId = TypeId(9);

	pub fn index(self) -> u32 {
		self.0
	}

	fn from_position(position: usize) -> TypeId {
		TypeId(position as u32)
	}
}

/// The value kind of a primitive slot.
///
/// `char` folds onto [`PrimitiveKind::I8`] per the source descriptor
/// convention; it still keeps its own class index. `Externref` never gets a
/// seeded slot, but array components of that kind resolve to Object.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveKind {
	Bool,
	I8,
	I16,
	I32,
	I64,
	F32,
	F64,
	Void,
	Externref,
}

/// The nine seeded primitives, in their contractual order: the source
/// language's reflective primitive lookup indexes this table.
pub(crate) const PRIMITIVES: [(&str, PrimitiveKind); 9] = [
	("boolean", PrimitiveKind::Bool),
	("byte", PrimitiveKind::I8),
	("char", PrimitiveKind::I8),
	("double", PrimitiveKind::F64),
	("float", PrimitiveKind::F32),
	("int", PrimitiveKind::I32),
	("long", PrimitiveKind::I64),
	("short", PrimitiveKind::I16),
	("void", PrimitiveKind::Void),
];

/// How a named type is described to the target module.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImportKind {
	DeclClass,
	DeclInterface,
	/// Defined by the target runtime itself (`java/lang/Object`,
	/// `java/lang/String`); declared, never defined.
	ExtClass,
}

impl ImportKind {
	pub fn opcode(self) -> u8 {
		match self {
			ImportKind::DeclClass => import_op::DECL_CLASS,
			ImportKind::DeclInterface => import_op::DECL_INTERFACE,
			ImportKind::ExtClass => import_op::EXT_CLASS,
		}
	}
}

/// One slot of a class's instance layout.
///
/// Layout entries are always instance fields; statics never reach a layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutField {
	/// The class of the hierarchy that declared the field.
	pub owner: ClassName,
	pub name: FieldName,
	pub descriptor: FieldDescriptor,
}

/// The resolved dispatch table of one implemented interface: the concrete
/// target of every participating interface method, in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct ITable {
	pub interface: TypeId,
	pub methods: Vec<MethodRef>,
}

/// The mutable hierarchy data of a class or interface, populated by the
/// scan phase.
#[derive(Debug)]
pub(crate) struct NamedData {
	pub(crate) name: ClassName,
	pub(crate) import: ImportKind,
	/// Raw classfile flags, captured during the scan.
	pub(crate) access: ClassAccess,
	pub(crate) parent: Option<TypeId>,
	/// Transitive closure of implemented (or extended) interfaces.
	pub(crate) interfaces: IndexSet<TypeId>,
	pub(crate) fields: Vec<LayoutField>,
	pub(crate) itables: Vec<ITable>,
	/// Field names some consumer demanded on this class.
	pub(crate) needed_fields: IndexSet<FieldName>,
	/// Dense position in the import stream, named types only.
	pub(crate) emission_index: Option<u32>,
}

#[derive(Debug)]
pub(crate) enum TypeForm {
	Primitive {
		name: &'static str,
		kind: PrimitiveKind,
	},
	Named(NamedData),
	Array {
		name: ClassName,
		element: TypeId,
		/// The class index written into the descriptor's component slot.
		component: TypeId,
	},
}

/// One interned type: identity plus everything the scan and emission phases
/// attach to it.
#[derive(Debug)]
pub struct TypeDef {
	id: TypeId,
	pub(crate) form: TypeForm,
	/// Every type this one is assignable to, itself first.
	pub(crate) instance_of: IndexSet<TypeId>,
	pub(crate) vtable: Vec<MethodRef>,
	/// Byte offset of the emitted descriptor, assigned by the emitter.
	pub(crate) vtable_offset: Option<u32>,
}

impl TypeDef {
	fn new(id: TypeId, form: TypeForm) -> TypeDef {
		TypeDef {
			id,
			form,
			instance_of: IndexSet::new(),
			vtable: Vec::new(),
			vtable_offset: None,
		}
	}

	pub fn id(&self) -> TypeId {
		self.id
	}

	pub fn name(&self) -> &str {
		match &self.form {
			TypeForm::Primitive { name, .. } => name,
			TypeForm::Named(named) => named.name.as_str(),
			TypeForm::Array { name, .. } => name.as_str(),
		}
	}

	/// The dotted form of the name, as the string table carries it.
	pub fn dotted_name(&self) -> String {
		match &self.form {
			TypeForm::Primitive { name, .. } => (*name).to_owned(),
			TypeForm::Named(named) => named.name.dotted(),
			TypeForm::Array { name, .. } => name.dotted(),
		}
	}

	pub fn is_primitive(&self) -> bool {
		matches!(self.form, TypeForm::Primitive { .. })
	}

	pub fn is_array(&self) -> bool {
		matches!(self.form, TypeForm::Array { .. })
	}

	pub fn is_interface(&self) -> bool {
		matches!(&self.form, TypeForm::Named(named) if named.import == ImportKind::DeclInterface)
	}

	/// Whether the target runtime defines this type itself.
	pub fn is_external(&self) -> bool {
		matches!(&self.form, TypeForm::Named(named) if named.import == ImportKind::ExtClass)
	}

	pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
		match &self.form {
			TypeForm::Primitive { kind, .. } => Some(*kind),
			_ => None,
		}
	}

	pub fn array_element(&self) -> Option<TypeId> {
		match &self.form {
			TypeForm::Array { element, .. } => Some(*element),
			_ => None,
		}
	}

	/// The class index of the array component, `None` for non-arrays.
	pub fn component(&self) -> Option<TypeId> {
		match &self.form {
			TypeForm::Array { component, .. } => Some(*component),
			_ => None,
		}
	}

	pub fn parent(&self) -> Option<TypeId> {
		self.named().and_then(|named| named.parent)
	}

	pub fn interfaces(&self) -> impl Iterator<Item = TypeId> + '_ {
		self.named().map(|named| named.interfaces.iter().copied()).into_iter().flatten()
	}

	pub fn fields(&self) -> &[LayoutField] {
		self.named().map_or(&[], |named| named.fields.as_slice())
	}

	pub fn vtable(&self) -> &[MethodRef] {
		&self.vtable
	}

	pub fn itables(&self) -> &[ITable] {
		self.named().map_or(&[], |named| named.itables.as_slice())
	}

	pub fn instance_of(&self) -> &IndexSet<TypeId> {
		&self.instance_of
	}

	/// Byte offset of this type's descriptor in the data section; only
	/// available once emission ran.
	pub fn vtable_offset(&self) -> Option<u32> {
		self.vtable_offset
	}

	/// Dense position in the import stream; named types only, and only
	/// available once the emission order is computed.
	pub fn emission_index(&self) -> Option<u32> {
		self.named().and_then(|named| named.emission_index)
	}

	pub(crate) fn named(&self) -> Option<&NamedData> {
		match &self.form {
			TypeForm::Named(named) => Some(named),
			_ => None,
		}
	}

	pub(crate) fn named_mut(&mut self) -> Option<&mut NamedData> {
		match &mut self.form {
			TypeForm::Named(named) => Some(named),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
enum TypeKey {
	Name(ClassName),
	Array(TypeId),
}

/// The type registry: the single source of type identity, and the engine
/// driving everything that happens between scan close and emission.
///
/// One registry lives for one compilation. While the scan phase is open,
/// producers intern types ([`TypeRegistry::value_of`],
/// [`TypeRegistry::array_type`], [`TypeRegistry::value_of_sig`]) and demand
/// fields; [`TypeRegistry::prepare_finish`] closes the phase, resolves the
/// hierarchy and drives the module writer. Interning anything afterwards
/// fails with [`CompileError::LateRegistration`].
#[derive(Debug, Default)]
pub struct TypeRegistry {
	types: Vec<TypeDef>,
	lookup: IndexMap<TypeKey, TypeId>,
	finished: bool,
	emission_order: Vec<TypeId>,
}

impl TypeRegistry {
	pub fn new() -> TypeRegistry {
		TypeRegistry::default()
	}

	/// Seeds the primitives and `java/lang/Object` on the first interning
	/// of anything. Object is seeded exactly once; every later request for
	/// it resolves to the seeded handle.
	pub(crate) fn ensure_seeded(&mut self) {
		if !self.types.is_empty() || self.finished {
			return;
		}

		for (name, kind) in PRIMITIVES {
			let id = TypeId::from_position(self.types.len());
			let mut def = TypeDef::new(id, TypeForm::Primitive { name, kind });
			def.instance_of.insert(id);
			self.types.push(def);
			self.lookup.insert(TypeKey::Name(ClassName::from(name)), id);
		}

		let object = self.insert_named(ClassName::from(ClassName::JAVA_LANG_OBJECT));
		debug_assert_eq!(object, TypeId::OBJECT);
		debug!("seeded {} primitives and java/lang/Object", PRIMITIVES.len());
	}

	fn insert_named(&mut self, name: ClassName) -> TypeId {
		let import = if EXT_CLASSES.contains(&name.as_str()) {
			ImportKind::ExtClass
		} else {
			ImportKind::DeclClass
		};

		trace!("type: {name}");

		let id = TypeId::from_position(self.types.len());
		let named = NamedData {
			name: name.clone(),
			import,
			access: ClassAccess::default(),
			parent: None,
			interfaces: IndexSet::new(),
			fields: Vec::new(),
			itables: Vec::new(),
			needed_fields: IndexSet::new(),
			emission_index: None,
		};
		self.types.push(TypeDef::new(id, TypeForm::Named(named)));
		self.lookup.insert(TypeKey::Name(name), id);
		id
	}

	/// Interns a class or interface by name, or returns the existing
	/// handle. The first call seeds the registry.
	pub fn value_of(&mut self, name: impl Into<ClassName>) -> Result<TypeId> {
		let name = name.into();
		self.ensure_seeded();

		if let Some(&id) = self.lookup.get(&TypeKey::Name(name.clone())) {
			return Ok(id);
		}
		if self.finished {
			return Err(CompileError::late_registration(name.as_str()).into());
		}

		Ok(self.insert_named(name))
	}

	/// Interns the array type over `element`, or returns the existing
	/// handle.
	///
	/// The component class index stored with the array is the element's
	/// class index, except that an `externref` element maps to Object's
	/// index. `void` cannot be an array element.
	pub fn array_type(&mut self, element: TypeId) -> Result<TypeId> {
		if let Some(&id) = self.lookup.get(&TypeKey::Array(element)) {
			return Ok(id);
		}

		let element_def = self.get(element);
		let name = ClassName::from(format!("[{}", self.element_descriptor(element)));

		let component = match element_def.primitive_kind() {
			Some(PrimitiveKind::Void) => {
				return Err(CompileError::unsupported_array_element(element_def.name()).into());
			}
			Some(PrimitiveKind::Externref) => TypeId::OBJECT,
			_ => element,
		};

		if self.finished {
			return Err(CompileError::late_registration(name.as_str()).into());
		}

		trace!("type: {name}");

		let id = TypeId::from_position(self.types.len());
		self.types.push(TypeDef::new(id, TypeForm::Array { name, element, component }));
		self.lookup.insert(TypeKey::Array(element), id);
		Ok(id)
	}

	/// The descriptor spelling of `element`, for building array names.
	fn element_descriptor(&self, element: TypeId) -> String {
		match &self.get(element).form {
			TypeForm::Primitive { name, .. } => match *name {
				"boolean" => "Z".to_owned(),
				"byte" => "B".to_owned(),
				"char" => "C".to_owned(),
				"double" => "D".to_owned(),
				"float" => "F".to_owned(),
				"int" => "I".to_owned(),
				"long" => "J".to_owned(),
				"short" => "S".to_owned(),
				// void is rejected before naming; externref surfaces as Object
				_ => format!("L{};", ClassName::JAVA_LANG_OBJECT),
			},
			TypeForm::Named(named) => format!("L{};", named.name),
			// an array name is already a descriptor
			TypeForm::Array { name, .. } => name.as_str().to_owned(),
		}
	}

	/// Records that some consumer reads or writes the field `field` of
	/// `class`, making it part of the instance layout of every class below
	/// the declaring one.
	pub fn use_field_name(&mut self, class: TypeId, field: impl Into<FieldName>) -> Result<()> {
		if self.finished {
			bail!("field demanded after scanning on {}", self.get(class).name());
		}
		let field = field.into();
		if !matches!(self.get(class).form, TypeForm::Named(_)) {
			bail!("field {field} demanded on non-class type {}", self.get(class).name());
		}
		if let Some(named) = self.types[class.0 as usize].named_mut() {
			named.needed_fields.insert(field);
		}
		Ok(())
	}

	/// The number of interned types, primitives included.
	pub fn size(&self) -> usize {
		self.types.len()
	}

	pub fn is_finished(&self) -> bool {
		self.finished
	}

	pub fn get(&self, id: TypeId) -> &TypeDef {
		&self.types[id.0 as usize]
	}

	pub(crate) fn get_mut(&mut self, id: TypeId) -> &mut TypeDef {
		&mut self.types[id.0 as usize]
	}

	/// The handle of an already interned class or interface.
	pub fn lookup(&self, name: &str) -> Option<TypeId> {
		// primitives share the name map, so "int" resolves here too
		self.lookup.get(&TypeKey::Name(ClassName::from(name.to_owned()))).copied()
	}

	/// The handle of an already interned array type.
	pub fn lookup_array(&self, element: TypeId) -> Option<TypeId> {
		self.lookup.get(&TypeKey::Array(element)).copied()
	}

	/// The primitive slot for a source-level primitive name such as `int`.
	/// This is the lookup the source language's reflective primitive access
	/// compiles into.
	pub fn primitive_by_name(&self, name: &str) -> Option<TypeId> {
		PRIMITIVES.iter()
			.position(|&(n, _)| n == name)
			.map(TypeId::from_position)
			.filter(|_| !self.types.is_empty())
	}

	/// `java/lang/Object`, if the registry has been seeded.
	pub fn object_type(&self) -> Option<TypeId> {
		(self.types.len() > TypeId::OBJECT.0 as usize).then_some(TypeId::OBJECT)
	}

	pub(crate) fn ids(&self) -> impl Iterator<Item = TypeId> {
		(0..self.types.len()).map(TypeId::from_position)
	}

	/// The order descriptors and imports are emitted in: every type comes
	/// after everything in its instanceof set. Available once finished.
	pub fn emission_order(&self) -> &[TypeId] {
		&self.emission_order
	}

	/// Closes the scan phase and runs the whole back half of the engine:
	/// hierarchy scan, itable construction, emission ordering, imports,
	/// descriptors, the type table and the table-offset accessor.
	pub fn prepare_finish(
		&mut self,
		provider: &impl ClassProvider,
		functions: &mut impl FunctionRegistry,
		writer: &mut impl ModuleWriter,
	) -> Result<()> {
		if self.finished {
			bail!("prepare_finish called twice");
		}
		self.finished = true;

		debug!("scan closed with {} types", self.types.len());

		hierarchy::scan(self, provider, functions)
			.context("failed to scan the type hierarchy")?;
		itable::build(self, provider, functions)
			.context("failed to build interface dispatch tables")?;
		self.mark_dispatch_targets(functions)?;

		let ordered = order::emission_order(self)?;
		let mut next = 0;
		for &id in &ordered {
			let def = &mut self.types[id.0 as usize];
			if let Some(named) = def.named_mut() {
				named.emission_index = Some(next);
				next += 1;
			}
		}
		self.emission_order = ordered;

		emit::emit(self, provider, functions, writer)
			.context("failed to emit type imports and descriptors")?;

		Ok(())
	}

	/// Every function any vtable or itable slot resolves to must be used
	/// before descriptor emission assigns function ids.
	fn mark_dispatch_targets(&self, functions: &mut impl FunctionRegistry) -> Result<()> {
		for def in &self.types {
			for function in &def.vtable {
				functions.mark_as_needed(function)?;
			}
			for itable in def.itables() {
				for function in &itable.methods {
					functions.mark_as_needed(function)?;
				}
			}
		}
		Ok(())
	}
}
