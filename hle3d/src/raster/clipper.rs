//! Sutherland-Hodgman clipping of small convex polygons against the edges of
//! an axis-aligned viewport.
//!
//! Only the edges named in a primitive's clip flags are processed. The output
//! lives in a fixed scratch of [`CLIP_CAPACITY`] vertices: a triangle gains at
//! most one vertex per edge, so overflowing it means the input was not one of
//! the small shapes the engine produces.

use std::ops::BitOr;

use vecfixed::VecFixed;

use super::{
    fixed::{lerp, ratio},
    triangle::Vertex,
};

pub const CLIP_CAPACITY: usize = 64;

pub type Polygon = VecFixed<CLIP_CAPACITY, Vertex>;

/// Which viewport edges a primitive crosses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClipFlags(pub u8);

impl ClipFlags {
    pub const LEFT: Self = Self(1 << 0);
    pub const RIGHT: Self = Self(1 << 1);
    pub const TOP: Self = Self(1 << 2);
    pub const BOTTOM: Self = Self(1 << 3);
    pub const ALL: Self = Self(0b1111);

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ClipFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Clip rectangle in the same units as the vertices, all bounds inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

#[derive(Clone, Copy, Debug)]
enum ClipEdge {
    Left(i32),
    Right(i32),
    Top(i32),
    Bottom(i32),
}

impl ClipEdge {
    const fn inside(self, v: &Vertex) -> bool {
        match self {
            Self::Left(c) => v.x >= c,
            Self::Right(c) => v.x <= c,
            Self::Top(c) => v.y >= c,
            Self::Bottom(c) => v.y <= c,
        }
    }

    const fn is_vertical(self) -> bool {
        matches!(self, Self::Left(_) | Self::Right(_))
    }

    const fn threshold(self) -> i32 {
        match self {
            Self::Left(c) | Self::Right(c) | Self::Top(c) | Self::Bottom(c) => c,
        }
    }

    /// Point where `p`-`q` crosses the edge. Always interpolates from the end
    /// with the lower coordinate so a shared edge clips to the same vertex
    /// whichever polygon it belongs to.
    fn intersect(self, p: Vertex, q: Vertex) -> Vertex {
        let along = |v: &Vertex| if self.is_vertical() { v.x } else { v.y };
        let (from, to) = if along(&p) <= along(&q) { (p, q) } else { (q, p) };

        let c = self.threshold();
        let t = ratio(c - along(&from), along(&to) - along(&from));

        let mut out = Vertex {
            x: lerp(from.x, to.x, t),
            y: lerp(from.y, to.y, t),
            u: lerp(from.u, to.u, t),
            v: lerp(from.v, to.v, t),
        };
        if self.is_vertical() {
            out.x = c;
        } else {
            out.y = c;
        }
        out
    }
}

fn push(polygon: &mut Polygon, vertex: Vertex) {
    debug_assert!(!polygon.is_full(), "clip scratch overflow");
    if polygon.push(vertex).is_err() {
        tracing::warn!(capacity = CLIP_CAPACITY, "clip scratch overflow, dropping vertex");
    }
}

fn clip_edge(input: &Polygon, edge: ClipEdge) -> Polygon {
    let mut output = Polygon::new();
    let vertices = input.as_slice();

    for (i, &current) in vertices.iter().enumerate() {
        let previous = vertices[(i + vertices.len() - 1) % vertices.len()];

        match (edge.inside(&previous), edge.inside(&current)) {
            (true, true) => push(&mut output, current),
            (false, true) => {
                push(&mut output, edge.intersect(previous, current));
                push(&mut output, current);
            }
            (true, false) => push(&mut output, edge.intersect(previous, current)),
            (false, false) => {}
        }
    }

    output
}

/// Clips `polygon` against the flagged edges of `viewport`. Returns fewer than
/// three vertices when nothing is left to draw.
#[must_use]
pub fn clip_polygon(polygon: &Polygon, viewport: &Viewport, flags: ClipFlags) -> Polygon {
    let edges = [
        (ClipFlags::LEFT, ClipEdge::Left(viewport.left)),
        (ClipFlags::RIGHT, ClipEdge::Right(viewport.right)),
        (ClipFlags::TOP, ClipEdge::Top(viewport.top)),
        (ClipFlags::BOTTOM, ClipEdge::Bottom(viewport.bottom)),
    ];

    let mut current = *polygon;
    for (flag, edge) in edges {
        if current.len() < 3 {
            break;
        }
        if flags.contains(flag) {
            current = clip_edge(&current, edge);
        }
    }

    if current.len() < 3 {
        current.clear();
    }
    current
}

#[must_use]
pub fn clip_triangle(vertices: [Vertex; 3], viewport: &Viewport, flags: ClipFlags) -> Polygon {
    let mut polygon = Polygon::new();
    for vertex in vertices {
        push(&mut polygon, vertex);
    }
    clip_polygon(&polygon, viewport, flags)
}

/// Splits a convex polygon into the triangles `(0, i, i + 1)`, `i` going down
/// from `len - 2` to 1.
pub fn triangle_fan(polygon: &Polygon) -> impl Iterator<Item = [Vertex; 3]> + '_ {
    let vertices = polygon.as_slice();
    (1..vertices.len().saturating_sub(1))
        .rev()
        .map(move |i| [vertices[0], vertices[i], vertices[i + 1]])
}
