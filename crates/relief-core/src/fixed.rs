use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Probabilities and random draws are carried in this type so outcome
/// resolution is bit-identical across platforms for a given seed.
pub type Fixed64 = I32F32;

/// Convert an f64 to Fixed64. Use only for configuration, never per dispatch.
///
/// Out-of-range values saturate; NaN maps to zero.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    if v.is_nan() {
        return Fixed64::ZERO;
    }
    Fixed64::saturating_from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and logging.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Clamp a value into the half-open unit interval `[0, 1)`.
#[inline]
pub fn clamp_unit(v: Fixed64) -> Fixed64 {
    if v < Fixed64::ZERO {
        Fixed64::ZERO
    } else if v >= Fixed64::ONE {
        Fixed64::ONE - Fixed64::DELTA
    } else {
        v
    }
}
