//! Reduction operators for boundary accumulation.
//!
//! A [`ReductionOp`] must be associative and commutative with a two-sided
//! identity, so that contributions to shared and ghost slots can be combined
//! in any order by any number of concurrent tasks.

/// Rules for combining per-element value blocks of fixed width.
pub trait ReductionOp: Send + Sync + 'static {
    /// Overwrite `out` with the identity element.
    fn identity(out: &mut [f64]);

    /// `lhs ← lhs ⊕ rhs`.
    fn apply(lhs: &mut [f64], rhs: &[f64]);

    /// Combine two partial results: `rhs1 ← rhs1 ⊕ rhs2`.
    ///
    /// Equals [`apply`](Self::apply) for every operator shipped here; kept
    /// separate so an operator can fold partials differently from how it
    /// applies a contribution.
    #[inline]
    fn fold(rhs1: &mut [f64], rhs2: &[f64]) {
        Self::apply(rhs1, rhs2);
    }
}

/// Component-wise sum with identity zero.
#[derive(Copy, Clone, Debug, Default)]
pub struct SumReduction;

impl ReductionOp for SumReduction {
    #[inline]
    fn identity(out: &mut [f64]) {
        out.fill(0.0);
    }

    #[inline]
    fn apply(lhs: &mut [f64], rhs: &[f64]) {
        debug_assert_eq!(lhs.len(), rhs.len());
        for (l, r) in lhs.iter_mut().zip(rhs) {
            *l += r;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_neutral() {
        let mut acc = [1.0, -2.5, 3.0];
        let mut zero = [7.0; 3];
        SumReduction::identity(&mut zero);
        SumReduction::apply(&mut acc, &zero);
        assert_eq!(acc, [1.0, -2.5, 3.0]);
        SumReduction::apply(&mut zero, &acc);
        assert_eq!(zero, acc);
    }

    #[test]
    fn fold_matches_apply_for_sum() {
        let mut a = [1.0, 2.0];
        let mut b = [1.0, 2.0];
        SumReduction::apply(&mut a, &[0.5, 0.25]);
        SumReduction::fold(&mut b, &[0.5, 0.25]);
        assert_eq!(a, b);
    }
}
