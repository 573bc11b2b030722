use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::capability::CapabilityTable;
use crate::dtype::ElemType;
use crate::error::{Error, Result};
use crate::filter::OpFilter;
use crate::kernel::{DescriptorSource, KernelDescriptor};

// BackendRegistry — Registration glue between capability data and filters
//
// The original design registers backends through a static table populated at
// module-initialization time. Here that table is an explicit object: built
// once during a single-threaded startup phase, frozen, then passed by
// reference into the compilation pipeline. Registration errors are
// configuration bugs — callers should treat them as fatal and halt startup.
//
// The pipeline obtains a compilable definition per (operation, backend) via
// load → validate → copy → apply: the canonical descriptor stays immutable,
// the filter rewrites a working copy, and the copy becomes the backend's
// definition only if the filter admits it.

/// One registered backend: its tag, capability list, and bound filter.
///
/// A borrowed view into the registry; profiles are immutable after
/// registration.
#[derive(Clone, Copy)]
pub struct BackendProfile<'a> {
    /// Unique backend identifier, e.g. "GPU_JIT".
    pub device_tag: &'a str,
    /// Element types the backend executes natively. Never empty.
    pub all_types: &'a IndexSet<ElemType>,
    filter: &'a dyn OpFilter,
}

impl BackendProfile<'_> {
    /// Run this backend's filter on a working copy of a descriptor.
    ///
    /// The copy may be mutated in place; the return value says whether the
    /// kernel is admitted for this backend.
    pub fn apply(&self, kdef: &mut KernelDescriptor) -> bool {
        self.filter.apply(kdef, self.all_types)
    }
}

/// Constructed-once registry of backends and their filters.
#[derive(Default)]
pub struct BackendRegistry {
    table: CapabilityTable,
    filters: IndexMap<String, Arc<dyn OpFilter>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single backend registration entry point; called once per backend
    /// during startup. Duplicate tags, empty capability lists, and
    /// registration after [`freeze`] are startup-fatal errors.
    ///
    /// [`freeze`]: BackendRegistry::freeze
    pub fn register_backend(
        &mut self,
        device_tag: impl Into<String>,
        all_types: impl IntoIterator<Item = ElemType>,
        filter: Arc<dyn OpFilter>,
    ) -> Result<()> {
        let device_tag = device_tag.into();
        self.table.register(device_tag.clone(), all_types)?;
        self.filters.insert(device_tag, filter);
        Ok(())
    }

    /// End the startup phase. After this the registry is read-only and can
    /// be shared across compilation sessions without locking. Idempotent.
    pub fn freeze(&mut self) {
        if !self.table.is_frozen() {
            log::info!("backend registry frozen with {} backends", self.table.len());
        }
        self.table.freeze();
    }

    /// Look up a registered backend, or `UnknownBackend`.
    pub fn profile(&self, device_tag: &str) -> Result<BackendProfile<'_>> {
        let all_types = self.table.lookup(device_tag)?;
        let (tag, filter) =
            self.filters
                .get_key_value(device_tag)
                .ok_or_else(|| Error::UnknownBackend {
                    device_tag: device_tag.to_string(),
                })?;
        Ok(BackendProfile {
            device_tag: tag.as_str(),
            all_types,
            filter: filter.as_ref(),
        })
    }

    /// The capability list for a backend, or `UnknownBackend`.
    pub fn capabilities(&self, device_tag: &str) -> Result<&IndexSet<ElemType>> {
        self.table.lookup(device_tag)
    }

    /// Registered backend tags, in registration order.
    pub fn device_tags(&self) -> impl Iterator<Item = &str> {
        self.table.device_tags()
    }

    /// Produce the backend-specific compilable definition for one operation:
    /// load the canonical descriptor, validate it, filter an owned copy.
    ///
    /// Returns `Ok(Some(_))` with the (possibly rewritten) copy if the
    /// filter admits the kernel, `Ok(None)` if it rejects it. Load and
    /// validation failures are recoverable: skip this operation for this
    /// backend, surface "not compilable" upstream, keep the session alive.
    pub fn filtered_descriptor(
        &self,
        source: &dyn DescriptorSource,
        op: &str,
        device_tag: &str,
    ) -> Result<Option<KernelDescriptor>> {
        let profile = self.profile(device_tag)?;
        let canonical = source.load(op)?;
        canonical.validate()?;
        let mut copy = canonical.clone();
        if profile.apply(&mut copy) {
            Ok(Some(copy))
        } else {
            log::debug!("operation {} rejected for backend {}", op, device_tag);
            Ok(None)
        }
    }
}
