//! # jitgate
//!
//! Backend-eligibility filtering for a JIT graph compiler.
//!
//! For every operation in a computation graph, jitgate decides which element
//! types are legal to compile for a given hardware backend, and repairs
//! declared type constraints that are known to be wrong. It provides:
//! - [`ElemType`] — element-type tags shared by constraints and backends
//! - [`KernelDescriptor`] — one operation's declared compilability envelope
//! - [`CapabilityTable`] — per-backend supported-type lists, frozen after startup
//! - [`OpFilter`] — per-backend constraint policy (tightening and widening repair)
//! - [`BackendRegistry`] — registration glue and the load → copy → apply pipeline
//!
//! The kernel registry that maps operation names to schema descriptors is an
//! external collaborator, consumed through [`DescriptorSource`].

pub mod capability;
pub mod dtype;
pub mod error;
pub mod filter;
pub mod kernel;
pub mod registry;

pub use capability::CapabilityTable;
pub use dtype::ElemType;
pub use error::{Error, Result};
pub use filter::{CpuOpFilter, GpuOpFilter, OpFilter, WIDENING_SENTINEL};
pub use kernel::{DescriptorSource, KernelDescriptor, StaticDescriptorSource, TypeConstraint};
pub use registry::{BackendProfile, BackendRegistry};
