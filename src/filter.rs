use indexmap::IndexSet;

use crate::dtype::ElemType;
use crate::kernel::KernelDescriptor;

// OpFilter — Per-backend correctness policy over kernel descriptors
//
// Declared constraints are static schema data and can be stale, overly
// narrow, or plain wrong for a particular backend. A filter is the backend's
// chance to inspect and rewrite a descriptor before the operation enters
// that backend's compilable set. Two rule families exist:
//
//   Tightening — some operations only compile correctly with a narrower
//   type than generically declared (a Const holding a string value, an
//   Assert message). The filter forces the named parameter to the fixed
//   singleton regardless of what was declared.
//
//   Widening repair — a constraint erroneously restricted to one type the
//   backend cannot execute at all is rewritten to the backend's full
//   capability list. Both conditions must hold before rewriting: singleton
//   AND foreign to the backend. Intentionally-singleton valid constraints
//   are left alone.
//
// Rules dispatch on operation name, so each rule is independently testable,
// and each rule only ever reads and writes its own named parameter.

/// The one singleton tag whose erroneous appearance triggers widening
/// repair. Other foreign singletons pass through untouched: widening on any
/// foreign singleton would silently change admitted types for unrelated
/// operations.
pub const WIDENING_SENTINEL: ElemType = ElemType::F8E4M3FN;

/// Backend-specific constraint policy, bound once at registration.
///
/// `apply` may mutate `kdef.constraints` in place and returns whether the
/// kernel should be registered for this backend at all. Callers must pass a
/// working copy they own exclusively, never the canonical schema-loaded
/// descriptor, and must check the return value rather than assume admission.
///
/// Pure and total over well-formed descriptors: applying the same filter to
/// the same descriptor twice yields the same result as applying it once.
pub trait OpFilter: Send + Sync {
    fn apply(&self, kdef: &mut KernelDescriptor, all_types: &IndexSet<ElemType>) -> bool;
}

/// The GPU JIT policy: Const/Assert tightening plus the ConcatV2 widening
/// repair. Admits every operation in this rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpuOpFilter;

impl OpFilter for GpuOpFilter {
    fn apply(&self, kdef: &mut KernelDescriptor, all_types: &IndexSet<ElemType>) -> bool {
        match kdef.op() {
            "Const" => kdef.set_single_type("dtype", ElemType::Str),
            "Assert" => kdef.set_single_type("T", ElemType::Str),
            // ConcatV2 kernels can arrive constrained to only F8E4M3FN even
            // though the GPU cannot execute it, shutting every real type out
            // of the compilable set. Detect that exact mis-narrowing and
            // expand the constraint to the backend's full capability list.
            "ConcatV2" => {
                if let Some(c) = kdef.constraint_mut("T") {
                    if c.is_singleton(WIDENING_SENTINEL) && !all_types.contains(&WIDENING_SENTINEL)
                    {
                        c.allowed = all_types.clone();
                    }
                }
            }
            _ => {}
        }
        true
    }
}

/// The CPU JIT policy: the same Const/Assert tightening, no widening repair
/// (CPU capability lists include every type the schema can mis-narrow to).
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuOpFilter;

impl OpFilter for CpuOpFilter {
    fn apply(&self, kdef: &mut KernelDescriptor, _all_types: &IndexSet<ElemType>) -> bool {
        match kdef.op() {
            "Const" => kdef.set_single_type("dtype", ElemType::Str),
            "Assert" => kdef.set_single_type("T", ElemType::Str),
            _ => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::TypeConstraint;

    fn gpu_types() -> IndexSet<ElemType> {
        [ElemType::F32, ElemType::F64, ElemType::I32, ElemType::I8]
            .into_iter()
            .collect()
    }

    fn concat(allowed: impl IntoIterator<Item = ElemType>) -> KernelDescriptor {
        KernelDescriptor::new("ConcatV2", vec![TypeConstraint::new("T", allowed)])
    }

    #[test]
    fn test_widening_repairs_foreign_singleton() {
        let mut kdef = concat([ElemType::F8E4M3FN]);
        assert!(GpuOpFilter.apply(&mut kdef, &gpu_types()));
        assert_eq!(kdef.constraint("T").unwrap().allowed, gpu_types());
    }

    #[test]
    fn test_widening_skips_multi_element_set() {
        let mut kdef = concat([ElemType::F32, ElemType::I32]);
        let before = kdef.clone();
        assert!(GpuOpFilter.apply(&mut kdef, &gpu_types()));
        assert_eq!(kdef, before);
    }

    #[test]
    fn test_widening_skips_valid_singleton() {
        // singleton, but the backend supports it: intentional narrowing
        let mut kdef = concat([ElemType::F32]);
        let before = kdef.clone();
        assert!(GpuOpFilter.apply(&mut kdef, &gpu_types()));
        assert_eq!(kdef, before);
    }

    #[test]
    fn test_widening_skips_other_foreign_singleton() {
        // foreign but not the sentinel: left untouched
        let mut kdef = concat([ElemType::Str]);
        let before = kdef.clone();
        assert!(GpuOpFilter.apply(&mut kdef, &gpu_types()));
        assert_eq!(kdef, before);
    }

    #[test]
    fn test_widening_idempotent() {
        let mut kdef = concat([ElemType::F8E4M3FN]);
        GpuOpFilter.apply(&mut kdef, &gpu_types());
        let once = kdef.clone();
        GpuOpFilter.apply(&mut kdef, &gpu_types());
        assert_eq!(kdef, once);
    }

    #[test]
    fn test_const_tightening_overrides_declared() {
        let mut kdef = KernelDescriptor::new(
            "Const",
            vec![TypeConstraint::new("dtype", [ElemType::F32, ElemType::I64])],
        );
        assert!(GpuOpFilter.apply(&mut kdef, &gpu_types()));
        assert!(kdef.constraint("dtype").unwrap().is_singleton(ElemType::Str));
    }

    #[test]
    fn test_assert_tightening() {
        let mut kdef =
            KernelDescriptor::new("Assert", vec![TypeConstraint::new("T", [ElemType::Bool])]);
        assert!(GpuOpFilter.apply(&mut kdef, &gpu_types()));
        assert!(kdef.constraint("T").unwrap().is_singleton(ElemType::Str));
    }

    #[test]
    fn test_tightening_idempotent() {
        let mut kdef = KernelDescriptor::new("Const", vec![]);
        GpuOpFilter.apply(&mut kdef, &gpu_types());
        let once = kdef.clone();
        GpuOpFilter.apply(&mut kdef, &gpu_types());
        assert_eq!(kdef, once);
    }

    #[test]
    fn test_unmatched_op_passes_through() {
        let mut kdef = KernelDescriptor::new(
            "MatMul",
            vec![TypeConstraint::new("T", [ElemType::F8E4M3FN])],
        );
        let before = kdef.clone();
        assert!(GpuOpFilter.apply(&mut kdef, &gpu_types()));
        assert_eq!(kdef, before);
    }

    #[test]
    fn test_cpu_filter_tightens_but_never_widens() {
        let cpu_types: IndexSet<ElemType> = [ElemType::F32, ElemType::F64].into_iter().collect();

        let mut konst = KernelDescriptor::new("Const", vec![]);
        assert!(CpuOpFilter.apply(&mut konst, &cpu_types));
        assert!(konst.constraint("dtype").unwrap().is_singleton(ElemType::Str));

        let mut kdef = concat([ElemType::F8E4M3FN]);
        let before = kdef.clone();
        assert!(CpuOpFilter.apply(&mut kdef, &cpu_types));
        assert_eq!(kdef, before);
    }
}
