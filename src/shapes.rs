use arrayvec::ArrayVec;
use glam::Vec2;
use serde::Deserialize;

/// One directed edge of a shape with its outward unit normal.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Edge {
    pub start: Vec2,
    pub end: Vec2,
    /// Outward unit normal (points away from the shape's interior).
    pub normal: Vec2,
}

impl Edge {
    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }
}

/// Centered axis-aligned box (half extents along X/Y, non-negative).
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self { center, half_extents }
    }

    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Copy of this box moved by `d`. Boxes are rebuilt, never mutated in place.
    #[inline]
    pub fn translated(&self, d: Vec2) -> Self {
        Self {
            center: self.center + d,
            half_extents: self.half_extents,
        }
    }

    /// Project onto `axis`, returning the scalar interval `(min, max)`.
    #[inline]
    pub fn project(&self, axis: Vec2) -> (f32, f32) {
        let c = self.center.dot(axis);
        let r = (self.half_extents * axis).abs().element_sum();
        (c - r, c + r)
    }

    /// Corners counter-clockwise starting at the minimum corner.
    pub fn corners(&self) -> [Vec2; 4] {
        let min = self.min();
        let max = self.max();
        [
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ]
    }

    /// Bottom, right, top, left.
    pub fn edges(&self) -> [Edge; 4] {
        let [bl, br, tr, tl] = self.corners();
        [
            Edge { start: bl, end: br, normal: Vec2::NEG_Y },
            Edge { start: br, end: tr, normal: Vec2::X },
            Edge { start: tr, end: tl, normal: Vec2::Y },
            Edge { start: tl, end: bl, normal: Vec2::NEG_X },
        ]
    }

    /// Strict overlap; boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (amin, amax) = (self.min(), self.max());
        let (bmin, bmax) = (other.min(), other.max());
        amin.x < bmax.x && amax.x > bmin.x && amin.y < bmax.y && amax.y > bmin.y
    }

    pub fn is_well_formed(&self) -> bool {
        self.center.is_finite()
            && self.half_extents.is_finite()
            && self.half_extents.x >= 0.0
            && self.half_extents.y >= 0.0
    }
}

/// Triangle given by three vertices in either winding.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct Triangle {
    pub vertices: [Vec2; 3],
}

impl Triangle {
    pub fn new(a: Vec2, b: Vec2, c: Vec2) -> Self {
        Self { vertices: [a, b, c] }
    }

    /// Twice the signed area; positive for counter-clockwise winding.
    pub fn signed_area2(&self) -> f32 {
        let [a, b, c] = self.vertices;
        (b - a).perp_dot(c - a)
    }

    pub fn is_degenerate(&self) -> bool {
        !self.signed_area2().is_finite() || self.signed_area2().abs() <= f32::EPSILON
    }

    pub fn centroid(&self) -> Vec2 {
        let [a, b, c] = self.vertices;
        (a + b + c) / 3.0
    }

    pub fn project(&self, axis: Vec2) -> (f32, f32) {
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for v in self.vertices {
            let d = v.dot(axis);
            lo = lo.min(d);
            hi = hi.max(d);
        }
        (lo, hi)
    }

    /// Edge `i` runs from vertex `i` to vertex `i + 1`.
    pub fn edge(&self, i: usize) -> Edge {
        let start = self.vertices[i % 3];
        let end = self.vertices[(i + 1) % 3];
        let e = end - start;
        // (e.y, -e.x) is the right-hand normal, outward for CCW winding
        let n = Vec2::new(e.y, -e.x).normalize_or_zero();
        let normal = if self.signed_area2() < 0.0 { -n } else { n };
        Edge { start, end, normal }
    }

    pub fn edges(&self) -> [Edge; 3] {
        [self.edge(0), self.edge(1), self.edge(2)]
    }

    pub fn bounds(&self) -> Aabb {
        let [a, b, c] = self.vertices;
        Aabb::from_min_max(a.min(b).min(c), a.max(b).max(c))
    }

    /// Highest point of the triangle inside the vertical slab `x0..=x1`.
    pub fn max_y_in_slab(&self, x0: f32, x1: f32) -> Option<f32> {
        let mut top: Option<f32> = None;
        let mut consider = |y: f32| top = Some(top.map_or(y, |t| t.max(y)));
        for v in self.vertices {
            if v.x >= x0 && v.x <= x1 {
                consider(v.y);
            }
        }
        for edge in self.edges() {
            let (p, q) = (edge.start, edge.end);
            if p.x == q.x {
                continue;
            }
            for x in [x0, x1] {
                let s = (x - p.x) / (q.x - p.x);
                if (0.0..=1.0).contains(&s) {
                    consider(p.y + (q.y - p.y) * s);
                }
            }
        }
        top
    }

    pub fn is_well_formed(&self) -> bool {
        self.vertices.iter().all(|v| v.is_finite()) && !self.is_degenerate()
    }
}

/// Static level geometry: a closed set of shapes, matched exhaustively.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Box(Aabb),
    Triangle(Triangle),
}

impl Shape {
    #[inline]
    pub fn project(&self, axis: Vec2) -> (f32, f32) {
        match self {
            Shape::Box(b) => b.project(axis),
            Shape::Triangle(t) => t.project(axis),
        }
    }

    pub fn edges(&self) -> ArrayVec<Edge, 4> {
        match self {
            Shape::Box(b) => b.edges().into_iter().collect(),
            Shape::Triangle(t) => t.edges().into_iter().collect(),
        }
    }

    pub fn bounds(&self) -> Aabb {
        match self {
            Shape::Box(b) => *b,
            Shape::Triangle(t) => t.bounds(),
        }
    }

    /// Highest point of the shape over the horizontal span `x0..=x1`.
    pub fn top_over_span(&self, x0: f32, x1: f32) -> Option<f32> {
        match self {
            Shape::Box(b) => {
                let (min, max) = (b.min(), b.max());
                (min.x <= x1 && max.x >= x0).then_some(max.y)
            }
            Shape::Triangle(t) => t.max_y_in_slab(x0, x1),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        match self {
            Shape::Box(b) => b.is_well_formed(),
            Shape::Triangle(t) => t.is_well_formed(),
        }
    }
}

impl From<Aabb> for Shape {
    fn from(b: Aabb) -> Self {
        Shape::Box(b)
    }
}

impl From<Triangle> for Shape {
    fn from(t: Triangle) -> Self {
        Shape::Triangle(t)
    }
}
