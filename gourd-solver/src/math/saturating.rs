//! Capped 64-bit arithmetic.
//!
//! All interval arithmetic in the engine saturates at [`i64::MIN`]/[`i64::MAX`] instead of
//! wrapping; propagators treat the extremes as "unbounded" sentinels and must never observe two
//! large inputs wrapping into a small result.

/// Addition which saturates at the representable extremes.
pub fn cap_add(left: i64, right: i64) -> i64 {
    left.saturating_add(right)
}

/// Subtraction which saturates at the representable extremes.
pub fn cap_sub(left: i64, right: i64) -> i64 {
    left.saturating_sub(right)
}

/// Multiplication which saturates at the representable extremes.
pub fn cap_prod(left: i64, right: i64) -> i64 {
    left.saturating_mul(right)
}

/// Negation which saturates; `-i64::MIN` is `i64::MAX`.
pub fn cap_opp(value: i64) -> i64 {
    value.saturating_neg()
}
