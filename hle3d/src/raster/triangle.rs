//! Triangle scan conversion for the Drome engine.
//!
//! Vertices come in 1/8 pixel units. Slopes are derived in that space with the
//! reciprocal table, then the triangle is split at its middle vertex into two
//! trapezoids that are walked in output space (pixel coordinates times the
//! render scale, 16.16 fixed point). A pixel is covered when its center lies
//! inside: rows and columns both start at `ceil(edge - 0.5)` and stop before
//! the next edge, so triangles sharing an edge never overlap or leave a gap.

use super::fixed::{first_pixel, ratio, slope};
use crate::render::target::RenderTarget;

/// Fractional bits of vertex positions and texture coordinates.
pub const SUBPIXEL_BITS: u32 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
    pub u: i32,
    pub v: i32,
}

impl Vertex {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y, u: 0, v: 0 }
    }

    #[must_use]
    pub const fn textured(x: i32, y: i32, u: i32, v: i32) -> Self {
        Self { x, y, u, v }
    }
}

impl std::fmt::Display for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Source of texels for affine mapped triangles, addressed in whole texels.
pub trait Texture {
    fn texel(&self, u: i32, v: i32) -> u8;
}

impl<F: Fn(i32, i32) -> u8> Texture for F {
    fn texel(&self, u: i32, v: i32) -> u8 {
        self(u, v)
    }
}

/// Fixed three-element sorting network, top to bottom then left to right.
fn sort_by_y(mut v: [Vertex; 3]) -> [Vertex; 3] {
    let key = |v: &Vertex| (v.y, v.x);
    if key(&v[0]) > key(&v[1]) {
        v.swap(0, 1);
    }
    if key(&v[0]) > key(&v[2]) {
        v.swap(0, 2);
    }
    if key(&v[1]) > key(&v[2]) {
        v.swap(1, 2);
    }
    v
}

/// Converts a subpixel coordinate to 16.16 output space.
const fn to_output(c: i32, scale: i64) -> i64 {
    (c as i64 * scale) << (16 - SUBPIXEL_BITS)
}

/// A triangle edge walked in output space from its upper vertex.
#[derive(Clone, Copy)]
struct Edge {
    x: i64,
    y: i64,
    slope: i64,
}

impl Edge {
    fn new(from: Vertex, to: Vertex, scale: i64) -> Self {
        Self {
            x: to_output(from.x, scale),
            y: to_output(from.y, scale),
            slope: slope(to.x - from.x, to.y - from.y),
        }
    }

    const fn x_at(&self, y: i64) -> i64 {
        self.x + ((self.slope * (y - self.y)) >> 16)
    }
}

/// Calls `span(y, left, right)` for every row of output pixels the triangle
/// covers, with `[left, right)` already clipped to the target.
fn for_each_span(
    width: i32,
    height: i32,
    scale: i32,
    vertices: [Vertex; 3],
    mut span: impl FnMut(i32, i32, i32),
) {
    let [a, b, c] = sort_by_y(vertices);
    if a.y == c.y {
        return;
    }

    let scale = i64::from(scale);
    let ab = Edge::new(a, b, scale);
    let bc = Edge::new(b, c, scale);
    let ac = Edge::new(a, c, scale);

    let b_on_left = if a.y == b.y { b.x < a.x } else { ab.slope < ac.slope };

    let mut trapezoid = |top: Vertex, bottom: Vertex, left: &Edge, right: &Edge| {
        let first = first_pixel(to_output(top.y, scale)).max(0);
        let last = first_pixel(to_output(bottom.y, scale)).min(i64::from(height));

        for y in first..last {
            let center = (y << 16) + 0x8000;
            let l = first_pixel(left.x_at(center)).clamp(0, i64::from(width));
            let r = first_pixel(right.x_at(center)).clamp(0, i64::from(width));
            if l < r {
                span(y as i32, l as i32, r as i32);
            }
        }
    };

    if b_on_left {
        trapezoid(a, b, &ab, &ac);
        trapezoid(b, c, &bc, &ac);
    } else {
        trapezoid(a, b, &ac, &ab);
        trapezoid(b, c, &ac, &bc);
    }
}

pub fn fill_flat_triangle(target: &mut RenderTarget<'_>, vertices: [Vertex; 3], color: u8) {
    let (width, height, scale) = (target.width() as i32, target.height() as i32, target.scale() as i32);
    for_each_span(width, height, scale, vertices, |y, left, right| {
        target.fill_span(y, left, right, color);
    });
}

/// Texture coordinate plane `t(x, y) = t0 + dx * (x - x0) + dy * (y - y0)`,
/// positions in 16.16 subpixels, coordinates in 16.16 of their own units.
#[derive(Clone, Copy, Debug)]
struct Gradient {
    origin: i64,
    dx: i64,
    dy: i64,
}

impl Gradient {
    /// Derives the plane from the widest span, the one through the middle vertex.
    fn new(a: Vertex, b: Vertex, c: Vertex, coord: fn(&Vertex) -> i32) -> Self {
        let height_ab = b.y - a.y;

        let ac_x = slope(c.x - a.x, c.y - a.y);
        let ac_t = slope(coord(&c) - coord(&a), c.y - a.y);

        // Where AC crosses the row of B, and the coordinate there.
        let ac_x_at_b = (i64::from(a.x) << 16) + ac_x * i64::from(height_ab);
        let ac_t_at_b = (i64::from(coord(&a)) << 16) + ac_t * i64::from(height_ab);

        let span_width = (((i64::from(b.x) << 16) - ac_x_at_b + 0x8000) >> 16) as i32;
        let span_delta = (i64::from(coord(&b)) << 16) - ac_t_at_b;

        let dx = (span_delta * ratio(1, span_width)) >> 30;
        let dy = ac_t - ((dx * ac_x) >> 16);

        Self {
            origin: i64::from(coord(&a)) << 16,
            dx,
            dy,
        }
    }

    const fn at(&self, x: i64, y: i64) -> i64 {
        self.origin + ((self.dx * x) >> 16) + ((self.dy * y) >> 16)
    }
}

/// Fills with affine mapped texels. `u`/`v` share the 1/8 precision of positions.
pub fn fill_affine_triangle(target: &mut RenderTarget<'_>, vertices: [Vertex; 3], texture: &impl Texture) {
    let [a, b, c] = sort_by_y(vertices);
    if a.y == c.y {
        return;
    }

    let u = Gradient::new(a, b, c, |v| v.u);
    let v = Gradient::new(a, b, c, |v| v.v);

    let (width, height, scale) = (target.width() as i32, target.height() as i32, target.scale() as i32);
    let scale64 = i64::from(scale);

    // Center of an output pixel, in 16.16 subpixels relative to A.
    let to_subpixel = |p: i32, origin: i32| {
        ((((i64::from(p) << 16) + 0x8000) << SUBPIXEL_BITS) / scale64) - (i64::from(origin) << 16)
    };
    let u_step = (u.dx << SUBPIXEL_BITS) / scale64;
    let v_step = (v.dx << SUBPIXEL_BITS) / scale64;
    let shift = 16 + SUBPIXEL_BITS;

    for_each_span(width, height, scale, [a, b, c], |y, left, right| {
        let (sx, sy) = (to_subpixel(left, a.x), to_subpixel(y, a.y));
        let mut tu = u.at(sx, sy);
        let mut tv = v.at(sx, sy);

        if let Some(row) = target.span_mut(y, left, right) {
            for pixel in row {
                *pixel = texture.texel((tu >> shift) as i32, (tv >> shift) as i32);
                tu += u_step;
                tv += v_step;
            }
        }
    });
}
