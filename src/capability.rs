use indexmap::{IndexMap, IndexSet};

use crate::dtype::ElemType;
use crate::error::{Error, Result};

// CapabilityTable — Authoritative per-backend supported-type lists
//
// Each backend advertises the element types it can execute natively. This
// table is the single source of truth for that list: filters consult it to
// repair constraints, and the registration step advertises it upstream.
//
// LIFECYCLE: append-only during single-threaded startup, then frozen. After
// freeze() every accessor is read-only, so the table can be shared across
// compilation sessions without locking.

/// Ordered map from backend tag to its supported element types.
#[derive(Debug, Default)]
pub struct CapabilityTable {
    entries: IndexMap<String, IndexSet<ElemType>>,
    frozen: bool,
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend's capability list.
    ///
    /// Fails with `DuplicateBackend` if the tag is already present (the
    /// first registration stays intact), `InvalidCapability` if `all_types`
    /// is empty, and `RegistryFrozen` after [`freeze`].
    ///
    /// [`freeze`]: CapabilityTable::freeze
    pub fn register(
        &mut self,
        device_tag: impl Into<String>,
        all_types: impl IntoIterator<Item = ElemType>,
    ) -> Result<()> {
        let device_tag = device_tag.into();
        if self.frozen {
            return Err(Error::RegistryFrozen { device_tag });
        }
        if self.entries.contains_key(&device_tag) {
            return Err(Error::DuplicateBackend { device_tag });
        }
        let all_types: IndexSet<ElemType> = all_types.into_iter().collect();
        if all_types.is_empty() {
            return Err(Error::InvalidCapability { device_tag });
        }
        log::debug!(
            "registered backend {} with {} supported types",
            device_tag,
            all_types.len()
        );
        self.entries.insert(device_tag, all_types);
        Ok(())
    }

    /// The supported-type list for a backend, or `UnknownBackend`.
    pub fn lookup(&self, device_tag: &str) -> Result<&IndexSet<ElemType>> {
        self.entries
            .get(device_tag)
            .ok_or_else(|| Error::UnknownBackend {
                device_tag: device_tag.to_string(),
            })
    }

    /// One-way transition to the read-only state. Idempotent.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether the startup phase has ended.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Registered backend tags, in registration order.
    pub fn device_tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
