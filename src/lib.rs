//! The type-layout and dispatch-table engine of a classfile-to-stack-
//! machine compiler.
//!
//! Given classfile metadata (through a [`provider::ClassProvider`]) and the
//! set of functions the method-body translator committed to (through a
//! [`functions::FunctionRegistry`]), this crate:
//!
//! - interns every referenced class, interface, array and primitive under a
//!   stable class index ([`registry::TypeRegistry`]),
//! - resolves the inheritance and interface-implementation hierarchy,
//! - computes instance layouts, virtual dispatch tables and per-interface
//!   dispatch tables,
//! - and emits binary type descriptors, type imports and the dispatch
//!   routines into a module through a [`writer::ModuleWriter`].
//!
//! The flow is two-phased: while the scan is open, producers request types
//! via [`registry::TypeRegistry::value_of`] and friends;
//! [`registry::TypeRegistry::prepare_finish`] closes the scan and runs
//! everything else. Interning after the close is fatal.
//!
//! ```
//! use rachis::registry::TypeRegistry;
//!
//! let mut types = TypeRegistry::new();
//! let object = types.value_of("java/lang/Object")?;
//! let ints = types.value_of_sig("[I")?;
//! assert_eq!(object.index(), 9);
//! assert!(ints.is_some());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod constants;
pub mod error;
pub mod functions;
pub mod provider;
pub mod registry;
pub mod tree;
pub mod writer;

mod emit;
mod hierarchy;
mod itable;
mod macros;
mod order;
mod signature;

pub use emit::stubs;

pub use crate::error::CompileError;
pub use crate::registry::{TypeId, TypeRegistry};
