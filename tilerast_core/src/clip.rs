//! The clip/transform stage.
//!
//! Every input triangle is transformed into homogeneous clip space and clipped against a
//! [`PlaneSet`]. What is left of it is fan-triangulated, perspective-divided, mapped to the
//! viewport and set up as [`ScreenTriangle`]s. Work items are independent of each other: the
//! kernels here take a single triangle and hand their output to a callback, which the pipeline
//! points at a shared compacting buffer.
//!
//! Two decompositions are available, see [`ClipStrategy`].

mod polygon;

pub use polygon::{Clippable, MAX_POLYGON_VERTICES, PingPong, Polygon, fan};

use crate::{
    geometry::{GeometryStore, Vertex},
    triangle::{ScreenTriangle, ScreenVertex, TriangleKey},
};
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::ops::{Add, AddAssign};
use strum::{IntoStaticStr, VariantArray};

/// A plane of the view volume in homogeneous clip space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, VariantArray, IntoStaticStr)]
pub enum ClipPlane {
    /// `z >= 0`, with a zero-to-one depth range.
    Near,
    /// `z <= w`
    Far,
    /// `x >= -w`
    Left,
    /// `x <= w`
    Right,
    /// `y >= -w`
    Bottom,
    /// `y <= w`
    Top,
}

impl ClipPlane {
    /// Signed distance of a homogeneous point to this plane. Non-negative values are inside.
    #[inline(always)]
    pub fn distance(self, point: Vec4) -> f32 {
        match self {
            Self::Near => point.z,
            Self::Far => point.w - point.z,
            Self::Left => point.x + point.w,
            Self::Right => point.w - point.x,
            Self::Bottom => point.y + point.w,
            Self::Top => point.w - point.y,
        }
    }
}

/// Which planes triangles are clipped against. The near plane is always part of the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, VariantArray, IntoStaticStr)]
pub enum PlaneSet {
    /// Only the near plane.
    #[default]
    Near,
    /// The near plane and the four side planes. Clipped geometry never leaves the viewport.
    Guard,
    /// Every plane of the view volume, including the far plane.
    Frustum,
}

impl PlaneSet {
    /// The planes of this set. The near plane always comes first.
    pub fn planes(self) -> &'static [ClipPlane] {
        match self {
            Self::Near => &[ClipPlane::Near],
            Self::Guard => &[
                ClipPlane::Near,
                ClipPlane::Left,
                ClipPlane::Right,
                ClipPlane::Bottom,
                ClipPlane::Top,
            ],
            Self::Frustum => ClipPlane::VARIANTS,
        }
    }

    /// The planes of this set other than the near plane.
    #[inline(always)]
    pub fn without_near(self) -> &'static [ClipPlane] {
        &self.planes()[1..]
    }
}

/// How the clip stage is decomposed into dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, VariantArray, IntoStaticStr)]
pub enum ClipStrategy {
    /// Clip against every plane in homogeneous space, then divide.
    #[default]
    SinglePass,
    /// Clip against the near plane in homogeneous space into an intermediate buffer of
    /// [`ClipTriangle`]s, then divide and clip against the remaining planes in normalized device
    /// coordinates.
    TwoPass,
}

impl ClipStrategy {
    /// The most screen triangles a single input triangle can be split into when clipped against
    /// `planes` with this strategy.
    pub fn max_sub_triangles(self, planes: PlaneSet) -> u32 {
        let planes = planes.planes().len() as u32;
        match self {
            // a polygon of `3 + planes` vertices
            Self::SinglePass => planes + 1,
            // two near pieces, each a polygon of `3 + (planes - 1)` vertices
            Self::TwoPass => 2 * planes,
        }
    }
}

/// Face culling. Front faces are counter-clockwise in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, VariantArray, IntoStaticStr)]
pub enum CullMode {
    #[default]
    None,
    Back,
    Front,
}

impl CullMode {
    #[inline(always)]
    pub fn culls(self, triangle: &ScreenTriangle) -> bool {
        match self {
            Self::None => false,
            Self::Back => !triangle.is_front_facing(),
            Self::Front => triangle.is_front_facing(),
        }
    }
}

/// The pixel dimensions normalized device coordinates are mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Maps normalized device coordinates to pixels. Row 0 is the top of the viewport.
    #[inline(always)]
    pub fn to_screen(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x * 0.5 + 0.5) * self.width as f32,
            (0.5 - ndc.y * 0.5) * self.height as f32,
        )
    }
}

/// Per-frame parameters of the clip stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSettings {
    pub planes: PlaneSet,
    pub cull: CullMode,
    pub viewport: Viewport,
    /// How many screen triangles a single input triangle may emit. Pieces past the budget are
    /// dropped and counted in [`ClipCounts::dropped`].
    pub max_sub_triangles: u32,
}

/// A vertex in homogeneous clip space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipVertex {
    pub position: Vec4,
    pub uv: Vec2,
    /// Whether this vertex was created by intersecting an edge with a clip plane.
    pub synthetic: bool,
}

impl ClipVertex {
    #[inline(always)]
    pub fn transform(vertex: Vertex, mvp: &Mat4) -> Self {
        Self {
            position: *mvp * vertex.position.extend(1.0),
            uv: vertex.uv,
            synthetic: false,
        }
    }

    /// Performs the perspective divide. Returns [`None`] if `w` is not strictly positive.
    #[inline(always)]
    pub fn divide(&self) -> Option<NdcVertex> {
        let w = self.position.w;
        if !(w > 0.0) {
            return None;
        }

        let rw = w.recip();
        Some(NdcVertex {
            position: self.position.truncate() * rw,
            rw,
            rw_uv: self.uv * rw,
            synthetic: self.synthetic,
        })
    }
}

impl Clippable for ClipVertex {
    #[inline(always)]
    fn distance(&self, plane: ClipPlane) -> f32 {
        plane.distance(self.position)
    }

    #[inline(always)]
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            uv: self.uv.lerp(other.uv, t),
            synthetic: true,
        }
    }
}

/// A vertex in normalized device coordinates. Every attribute is affine in screen space, so
/// clipping it is plain linear interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NdcVertex {
    pub position: Vec3,
    pub rw: f32,
    pub rw_uv: Vec2,
    pub synthetic: bool,
}

impl NdcVertex {
    #[inline(always)]
    pub fn to_screen(&self, viewport: Viewport) -> ScreenVertex {
        ScreenVertex {
            position: viewport.to_screen(self.position.truncate()),
            z: self.position.z,
            rw: self.rw,
            uv: self.rw_uv / self.rw,
        }
    }
}

impl Clippable for NdcVertex {
    #[inline(always)]
    fn distance(&self, plane: ClipPlane) -> f32 {
        plane.distance(self.position.extend(1.0))
    }

    #[inline(always)]
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            rw: self.rw + (other.rw - self.rw) * t,
            rw_uv: self.rw_uv.lerp(other.rw_uv, t),
            synthetic: true,
        }
    }
}

/// A near-clipped triangle in homogeneous clip space, the intermediate representation of
/// [`ClipStrategy::TwoPass`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipTriangle {
    pub vertices: [ClipVertex; 3],
    pub key: TriangleKey,
    /// Share of the sub-triangle budget of the input triangle this piece may use.
    pub budget: u32,
}

/// What happened to the triangles handled by a clip work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClipCounts {
    /// Screen triangles handed to the output.
    pub emitted: u32,
    /// Input triangles clipped away entirely, plus sub-triangles with a vertex at or behind the
    /// eye.
    pub rejected: u32,
    /// Sub-triangles with a (near) zero or non-finite area.
    pub degenerate: u32,
    /// Sub-triangles removed by face culling.
    pub culled: u32,
    /// Sub-triangles past the budget of their input triangle.
    pub dropped: u32,
}

impl Add for ClipCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            emitted: self.emitted + rhs.emitted,
            rejected: self.rejected + rhs.rejected,
            degenerate: self.degenerate + rhs.degenerate,
            culled: self.culled + rhs.culled,
            dropped: self.dropped + rhs.dropped,
        }
    }
}

impl AddAssign for ClipCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Transforms the vertices of a triangle of `geometry` into clip space.
#[inline(always)]
pub fn transform_triangle(geometry: &GeometryStore, index: u32, mvp: &Mat4) -> [ClipVertex; 3] {
    geometry
        .triangle(index as usize)
        .map(|vertex| ClipVertex::transform(vertex, mvp))
}

/// Fan-triangulates a clipped polygon, sets up every piece and emits the ones that survive, at
/// most `budget` of them. Pieces are keyed `base.part | j`, where `j` is the index of the piece
/// within the fan.
fn emit_fan<T: Copy>(
    polygon: &[T],
    base: TriangleKey,
    budget: u32,
    settings: &ClipSettings,
    to_screen: impl Fn(&T) -> Option<ScreenVertex>,
    emit: &mut impl FnMut(ScreenTriangle),
) -> ClipCounts {
    let mut counts = ClipCounts::default();
    for (j, [a, b, c]) in fan(polygon).enumerate() {
        let (Some(a), Some(b), Some(c)) = (to_screen(&a), to_screen(&b), to_screen(&c)) else {
            counts.rejected += 1;
            continue;
        };

        let key = TriangleKey {
            source: base.source,
            part: base.part | j as u16,
        };

        match ScreenTriangle::new([a, b, c], key) {
            None => counts.degenerate += 1,
            Some(triangle) if settings.cull.culls(&triangle) => counts.culled += 1,
            Some(_) if counts.emitted >= budget => counts.dropped += 1,
            Some(triangle) => {
                emit(triangle);
                counts.emitted += 1;
            }
        }
    }

    counts
}

/// [`ClipStrategy::SinglePass`] work item: clips input triangle `index` against every plane of
/// the set in clip space and emits its screen triangles.
pub fn clip_single_pass(
    geometry: &GeometryStore,
    index: u32,
    mvp: &Mat4,
    settings: &ClipSettings,
    mut emit: impl FnMut(ScreenTriangle),
) -> ClipCounts {
    let mut pingpong = PingPong::new(transform_triangle(geometry, index, mvp));
    let polygon = pingpong.clip(settings.planes.planes());
    if polygon.is_empty() {
        return ClipCounts {
            rejected: 1,
            ..Default::default()
        };
    }

    let base = TriangleKey {
        source: index,
        part: 0,
    };

    emit_fan(
        polygon,
        base,
        settings.max_sub_triangles,
        settings,
        |v| v.divide().map(|v| v.to_screen(settings.viewport)),
        &mut emit,
    )
}

/// First [`ClipStrategy::TwoPass`] work item: clips input triangle `index` against the near plane
/// and emits the pieces as [`ClipTriangle`]s. At most two pieces are emitted per input, and the
/// sub-triangle budget is split between them with the first piece getting the larger half.
pub fn clip_near_pass(
    geometry: &GeometryStore,
    index: u32,
    mvp: &Mat4,
    settings: &ClipSettings,
    mut emit: impl FnMut(ClipTriangle),
) -> ClipCounts {
    let mut pingpong = PingPong::new(transform_triangle(geometry, index, mvp));
    let polygon = pingpong.clip(&[ClipPlane::Near]);
    if polygon.is_empty() {
        return ClipCounts {
            rejected: 1,
            ..Default::default()
        };
    }

    let pieces = polygon.len() as u32 - 2;
    let budget = settings.max_sub_triangles;
    for (i, vertices) in (0u32..).zip(fan(polygon)) {
        emit(ClipTriangle {
            vertices,
            key: TriangleKey {
                source: index,
                part: i as u16,
            },
            budget: budget / pieces + u32::from(i < budget % pieces),
        });
    }

    ClipCounts::default()
}

/// Second [`ClipStrategy::TwoPass`] work item: divides a near-clipped triangle, clips it against
/// the remaining planes in normalized device coordinates and emits its screen triangles.
pub fn clip_ndc_pass(
    triangle: &ClipTriangle,
    settings: &ClipSettings,
    mut emit: impl FnMut(ScreenTriangle),
) -> ClipCounts {
    let [a, b, c] = triangle.vertices;
    let (Some(a), Some(b), Some(c)) = (a.divide(), b.divide(), c.divide()) else {
        return ClipCounts {
            rejected: 1,
            ..Default::default()
        };
    };

    let mut pingpong = PingPong::new([a, b, c]);
    let polygon = pingpong.clip(settings.planes.without_near());
    if polygon.is_empty() {
        return ClipCounts {
            rejected: 1,
            ..Default::default()
        };
    }

    let base = TriangleKey {
        source: triangle.key.source,
        part: triangle.key.part << 8,
    };

    emit_fan(
        polygon,
        base,
        triangle.budget,
        settings,
        |v| Some(v.to_screen(settings.viewport)),
        &mut emit,
    )
}
