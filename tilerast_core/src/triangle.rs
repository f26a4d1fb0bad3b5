//! Screen-space triangles and their rasterization setup.

use glam::{Vec2, Vec3};

/// Triangles whose absolute signed area (in square pixels) is below this value are degenerate.
pub const DEGENERATE_AREA: f32 = 1e-6;

/// A vertex after the perspective divide and viewport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenVertex {
    /// Position in pixels. Row 0 is the top of the framebuffer.
    pub position: Vec2,
    /// Normalized device depth, `z / w`.
    pub z: f32,
    /// Reciprocal of the clip-space `w`.
    pub rw: f32,
    pub uv: Vec2,
}

/// Identifies where a screen triangle came from: the input triangle index and which piece of it
/// this is after clipping. Keys are unique within a frame and independent of scheduling, which
/// makes them usable for deterministic tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TriangleKey {
    pub source: u32,
    pub part: u16,
}

/// An edge function `a * x + b * y + c`.
///
/// For the edge `p -> q`, the value at a point `s` is the 2D cross product `(q - p) x (s - p)`:
/// zero on the edge's line and with opposite signs on either side of it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeFunction {
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl EdgeFunction {
    /// The edge function of the directed edge `p -> q`.
    #[inline(always)]
    pub fn through(p: Vec2, q: Vec2) -> Self {
        Self {
            a: p.y - q.y,
            b: q.x - p.x,
            c: p.x * q.y - p.y * q.x,
        }
    }

    #[inline(always)]
    pub fn eval(&self, point: Vec2) -> f32 {
        self.a * point.x + self.b * point.y + self.c
    }
}

/// An axis aligned bounding box in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

/// A screen-space triangle ready for binning and rasterization.
///
/// Edge `i` is the edge opposite to vertex `i`, so that `edges[i]` evaluated at vertex `i` is the
/// signed area of the triangle. This makes `edges[i](p) / area` the barycentric weight of vertex `i`
/// at `p`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenTriangle {
    pub positions: [Vec2; 3],
    pub uvs: [Vec2; 3],
    /// `uv / w` of each vertex.
    pub rw_uvs: [Vec2; 3],
    /// `z / w` of each vertex.
    pub rwz: [f32; 3],
    /// `1 / w` of each vertex.
    pub rw: [f32; 3],
    pub edges: [EdgeFunction; 3],
    pub area: f32,
    pub rarea: f32,
    pub key: TriangleKey,
}

impl ScreenTriangle {
    /// Performs triangle setup. Returns [`None`] if the triangle is degenerate, i.e. its area is
    /// too small or not finite.
    pub fn new(vertices: [ScreenVertex; 3], key: TriangleKey) -> Option<Self> {
        let [p0, p1, p2] = vertices.map(|v| v.position);
        let area = (p1 - p0).perp_dot(p2 - p0);
        if !area.is_finite() || area.abs() < DEGENERATE_AREA {
            return None;
        }

        Some(Self {
            positions: [p0, p1, p2],
            uvs: vertices.map(|v| v.uv),
            rw_uvs: vertices.map(|v| v.uv * v.rw),
            rwz: vertices.map(|v| v.z),
            rw: vertices.map(|v| v.rw),
            edges: [
                EdgeFunction::through(p1, p2),
                EdgeFunction::through(p2, p0),
                EdgeFunction::through(p0, p1),
            ],
            area,
            rarea: area.recip(),
            key,
        })
    }

    /// Whether the triangle is front facing, i.e. counter-clockwise in normalized device
    /// coordinates. Screen space has Y pointing down, which flips the sign of the area.
    #[inline(always)]
    pub fn is_front_facing(&self) -> bool {
        self.area < 0.0
    }

    pub fn bounds(&self) -> Bounds {
        let [p0, p1, p2] = self.positions;
        Bounds {
            min: p0.min(p1).min(p2),
            max: p0.max(p1).max(p2),
        }
    }

    #[inline(always)]
    pub fn edge_values(&self, point: Vec2) -> Vec3 {
        Vec3::new(
            self.edges[0].eval(point),
            self.edges[1].eval(point),
            self.edges[2].eval(point),
        )
    }

    /// Inside test: all three edge values must agree with the winding of the triangle. Points
    /// exactly on an edge are inside.
    #[inline(always)]
    pub fn contains(&self, point: Vec2) -> bool {
        self.barycentric(point).is_some()
    }

    /// Barycentric weights of `point`, or [`None`] if it lies outside of the triangle.
    #[inline(always)]
    pub fn barycentric(&self, point: Vec2) -> Option<Vec3> {
        let values = self.edge_values(point);
        let inside = if self.area > 0.0 {
            values.cmpge(Vec3::ZERO).all()
        } else {
            values.cmple(Vec3::ZERO).all()
        };

        inside.then(|| values * self.rarea)
    }

    /// Interpolated `1 / w`, which is affine in screen space.
    #[inline(always)]
    pub fn interpolate_rw(&self, weights: Vec3) -> f32 {
        weights.dot(Vec3::from_array(self.rw))
    }

    /// Interpolated normalized device depth.
    #[inline(always)]
    pub fn interpolate_ndc_depth(&self, weights: Vec3) -> f32 {
        weights.dot(Vec3::from_array(self.rwz))
    }

    /// Perspective-correct texture coordinate, given the interpolated `1 / w`.
    #[inline(always)]
    pub fn interpolate_uv(&self, weights: Vec3, rw: f32) -> Vec2 {
        let rw_uv =
            self.rw_uvs[0] * weights.x + self.rw_uvs[1] * weights.y + self.rw_uvs[2] * weights.z;
        rw_uv / rw
    }
}
