/// All errors that can occur within jitgate.
///
/// Two tiers share one enum: registration-time errors (duplicate backend,
/// empty capability list, frozen table) are configuration bugs the caller
/// should treat as fatal at startup, while per-operation errors (unknown
/// operation, malformed descriptor) are recoverable — the caller skips that
/// operation for that backend and moves on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A backend tag was registered twice. The first registration stays
    /// intact; proceeding with ambiguous backend state is a startup bug.
    #[error("backend already registered: {device_tag}")]
    DuplicateBackend { device_tag: String },

    /// A backend declared an empty capability list.
    #[error("backend {device_tag} declared an empty capability list")]
    InvalidCapability { device_tag: String },

    /// Registration attempted after the table was frozen.
    #[error("cannot register backend {device_tag}: registry is frozen")]
    RegistryFrozen { device_tag: String },

    /// Lookup of a backend tag that was never registered.
    #[error("unknown backend: {device_tag}")]
    UnknownBackend { device_tag: String },

    /// Lookup of an operation the descriptor source does not know.
    #[error("unknown operation: {op}")]
    UnknownOperation { op: String },

    /// A descriptor violates schema invariants (empty operation name or a
    /// duplicate parameter name). Surfaced before filtering; never repaired.
    #[error("malformed descriptor for {op}: {reason}")]
    MalformedDescriptor { op: String, reason: String },
}

/// Convenience Result type used throughout jitgate.
pub type Result<T> = std::result::Result<T, Error>;
