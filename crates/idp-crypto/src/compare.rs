//! Constant-time comparison.

use subtle::ConstantTimeEq;

/// Compares two byte strings without short-circuiting on the first
/// mismatching byte.
///
/// Length differences are still observable.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
