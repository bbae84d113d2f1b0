//! Fixed-point helpers shared by the triangle rasterizer and the clipper.
//!
//! Divisions by a small integer are done as a multiplication by a reciprocal
//! from a table, `RECIPROCALS[n] = 2^30 / n`, so edge walking and clipping
//! round the same way. Heights and widths outside the table fall back to a
//! real division with the same scaling.

pub const RECIPROCAL_SHIFT: u32 = 30;
const RECIPROCAL_TABLE_SIZE: usize = 2048;

static RECIPROCALS: [i32; RECIPROCAL_TABLE_SIZE] = build_reciprocals();

const fn build_reciprocals() -> [i32; RECIPROCAL_TABLE_SIZE] {
    let mut table = [0; RECIPROCAL_TABLE_SIZE];
    let mut i = 1;
    while i < RECIPROCAL_TABLE_SIZE {
        table[i] = (1 << RECIPROCAL_SHIFT) / i as i32;
        i += 1;
    }
    table
}

/// `2^30 / n`, with the sign of `n`. Zero maps to zero.
#[must_use]
pub fn reciprocal(n: i32) -> i64 {
    let magnitude = n.unsigned_abs() as usize;
    let r = RECIPROCALS
        .get(magnitude)
        .map_or_else(|| (1_i64 << RECIPROCAL_SHIFT) / magnitude as i64, |&r| i64::from(r));

    if n < 0 { -r } else { r }
}

/// `num / den` as a 2.30 fraction, zero when `den` is zero.
#[must_use]
pub fn ratio(num: i32, den: i32) -> i64 {
    i64::from(num) * reciprocal(den)
}

/// `dx / dy` in 16.16, zero when `dy` is zero.
#[must_use]
pub fn slope(dx: i32, dy: i32) -> i64 {
    ratio(dx, dy) >> (RECIPROCAL_SHIFT - 16)
}

/// Linear interpolation from `a` towards `b` by a 2.30 fraction, rounded to nearest.
#[must_use]
pub fn lerp(a: i32, b: i32, t: i64) -> i32 {
    let half = 1 << (RECIPROCAL_SHIFT - 1);
    a + ((i64::from(b - a) * t + half) >> RECIPROCAL_SHIFT) as i32
}

/// `ceil(v - 0.5)` for a 16.16 value: the first pixel whose center is at or after `v`.
#[must_use]
pub const fn first_pixel(v: i64) -> i64 {
    (v + 0x7FFF) >> 16
}
