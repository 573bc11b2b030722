use std::collections::HashMap;

use indexmap::IndexSet;

use crate::dtype::ElemType;
use crate::error::{Error, Result};

// KernelDescriptor — One operation's declared compilability envelope
//
// A descriptor records, for each named type parameter of an operation, the
// set of element types the kernel claims to handle. The schema shape is an
// ordered list of {name, allowed_values} pairs, and allowed_values is itself
// insertion-ordered — the surrounding registry round-trips this shape, so
// order is preserved here even though membership checks are set-semantic.
//
// OWNERSHIP RULE: the descriptor source owns the canonical immutable
// descriptor. Filters mutate constraints in place, so every filtering
// session must clone its own working copy first; a canonical descriptor is
// never handed to a filter directly.

/// One named type parameter and the element types it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeConstraint {
    /// Parameter name from the operation signature (e.g. "T", "dtype").
    pub name: String,
    /// Allowed element types, insertion-ordered.
    pub allowed: IndexSet<ElemType>,
}

impl TypeConstraint {
    /// Create a constraint from a name and an ordered list of allowed types.
    pub fn new(name: impl Into<String>, allowed: impl IntoIterator<Item = ElemType>) -> Self {
        Self {
            name: name.into(),
            allowed: allowed.into_iter().collect(),
        }
    }

    /// Whether the allowed set is exactly one type equal to `ty`.
    pub fn is_singleton(&self, ty: ElemType) -> bool {
        self.allowed.len() == 1 && self.allowed.contains(&ty)
    }
}

/// The declared compile-time contract for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelDescriptor {
    /// Graph-node-type string, e.g. "ConcatV2". Immutable once loaded.
    op: String,
    /// Ordered constraints; parameter names unique within a descriptor.
    pub constraints: Vec<TypeConstraint>,
}

impl KernelDescriptor {
    /// Create a descriptor. Invariants are checked by [`validate`], which
    /// the filtering pipeline runs before any filter touches the copy.
    ///
    /// [`validate`]: KernelDescriptor::validate
    pub fn new(op: impl Into<String>, constraints: Vec<TypeConstraint>) -> Self {
        Self {
            op: op.into(),
            constraints,
        }
    }

    /// The operation name this descriptor belongs to.
    pub fn op(&self) -> &str {
        &self.op
    }

    /// Check schema invariants: non-empty operation name, no duplicate
    /// parameter names. Malformed descriptors are rejected, never repaired.
    pub fn validate(&self) -> Result<()> {
        if self.op.is_empty() {
            return Err(Error::MalformedDescriptor {
                op: "<unnamed>".to_string(),
                reason: "empty operation name".to_string(),
            });
        }
        let mut seen = IndexSet::new();
        for c in &self.constraints {
            if !seen.insert(c.name.as_str()) {
                return Err(Error::MalformedDescriptor {
                    op: self.op.clone(),
                    reason: format!("duplicate parameter name: {}", c.name),
                });
            }
        }
        Ok(())
    }

    /// Look up a constraint by parameter name.
    pub fn constraint(&self, name: &str) -> Option<&TypeConstraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Look up a constraint by parameter name, mutably.
    pub fn constraint_mut(&mut self, name: &str) -> Option<&mut TypeConstraint> {
        self.constraints.iter_mut().find(|c| c.name == name)
    }

    /// Force the named parameter's allowed set to exactly `{ty}`, adding the
    /// constraint if the parameter has none yet. Idempotent: tightening an
    /// already-tightened constraint is a no-op.
    pub fn set_single_type(&mut self, name: &str, ty: ElemType) {
        match self.constraint_mut(name) {
            Some(c) => {
                if !c.is_singleton(ty) {
                    c.allowed.clear();
                    c.allowed.insert(ty);
                }
            }
            None => self.constraints.push(TypeConstraint::new(name, [ty])),
        }
    }
}

// DescriptorSource — Narrow interface to the external operation registry
//
// The full kernel registry (name → schema descriptor) lives outside this
// crate. Filtering only needs one thing from it: the canonical descriptor
// for an operation name.

/// Provides canonical kernel descriptors by operation name.
///
/// Implementations own the canonical descriptors; callers clone a working
/// copy before filtering and never mutate what `load` returns.
pub trait DescriptorSource: Send + Sync {
    /// The schema-declared descriptor for `op`, or `UnknownOperation`.
    fn load(&self, op: &str) -> Result<&KernelDescriptor>;
}

/// An in-memory descriptor source backed by a map.
///
/// Descriptors are validated on insertion, so anything loaded from here is
/// already well-formed.
#[derive(Debug, Default)]
pub struct StaticDescriptorSource {
    descriptors: HashMap<String, KernelDescriptor>,
}

impl StaticDescriptorSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor, keyed by its operation name. A later insert for
    /// the same operation replaces the earlier one.
    pub fn insert(&mut self, kdef: KernelDescriptor) -> Result<()> {
        kdef.validate()?;
        self.descriptors.insert(kdef.op().to_string(), kdef);
        Ok(())
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl DescriptorSource for StaticDescriptorSource {
    fn load(&self, op: &str) -> Result<&KernelDescriptor> {
        self.descriptors.get(op).ok_or_else(|| Error::UnknownOperation {
            op: op.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat_descriptor() -> KernelDescriptor {
        KernelDescriptor::new(
            "ConcatV2",
            vec![
                TypeConstraint::new("T", [ElemType::F32, ElemType::I32]),
                TypeConstraint::new("Tidx", [ElemType::I32, ElemType::I64]),
            ],
        )
    }

    #[test]
    fn test_validate_ok() {
        assert!(concat_descriptor().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_op_name() {
        let kdef = KernelDescriptor::new("", vec![]);
        assert!(matches!(
            kdef.validate(),
            Err(Error::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn test_validate_duplicate_parameter() {
        let kdef = KernelDescriptor::new(
            "ConcatV2",
            vec![
                TypeConstraint::new("T", [ElemType::F32]),
                TypeConstraint::new("T", [ElemType::F64]),
            ],
        );
        match kdef.validate() {
            Err(Error::MalformedDescriptor { op, reason }) => {
                assert_eq!(op, "ConcatV2");
                assert!(reason.contains("duplicate parameter"));
            }
            other => panic!("expected MalformedDescriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_set_single_type_narrows() {
        let mut kdef = concat_descriptor();
        kdef.set_single_type("T", ElemType::Str);
        let c = kdef.constraint("T").unwrap();
        assert!(c.is_singleton(ElemType::Str));
    }

    #[test]
    fn test_set_single_type_adds_missing_parameter() {
        let mut kdef = KernelDescriptor::new("Const", vec![]);
        kdef.set_single_type("dtype", ElemType::Str);
        assert!(kdef.constraint("dtype").unwrap().is_singleton(ElemType::Str));
    }

    #[test]
    fn test_set_single_type_idempotent() {
        let mut kdef = concat_descriptor();
        kdef.set_single_type("T", ElemType::Str);
        let once = kdef.clone();
        kdef.set_single_type("T", ElemType::Str);
        assert_eq!(kdef, once);
    }

    #[test]
    fn test_allowed_preserves_insertion_order() {
        let c = TypeConstraint::new("T", [ElemType::F64, ElemType::F32, ElemType::I8]);
        let order: Vec<ElemType> = c.allowed.iter().copied().collect();
        assert_eq!(order, vec![ElemType::F64, ElemType::F32, ElemType::I8]);
    }

    #[test]
    fn test_static_source_unknown_operation() {
        let source = StaticDescriptorSource::new();
        assert!(matches!(
            source.load("NoSuchOp"),
            Err(Error::UnknownOperation { .. })
        ));
    }

    #[test]
    fn test_static_source_load() {
        let mut source = StaticDescriptorSource::new();
        source.insert(concat_descriptor()).unwrap();
        let kdef = source.load("ConcatV2").unwrap();
        assert_eq!(kdef.op(), "ConcatV2");
        assert_eq!(kdef.constraints.len(), 2);
    }
}
