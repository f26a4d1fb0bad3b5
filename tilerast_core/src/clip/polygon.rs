use super::ClipPlane;
use arrayvec::ArrayVec;
use strum::VariantArray;

/// Upper bound on the vertices of a clipped triangle: every plane can add at most one vertex to a
/// convex polygon.
pub const MAX_POLYGON_VERTICES: usize = 3 + ClipPlane::VARIANTS.len();

pub type Polygon<T> = ArrayVec<T, MAX_POLYGON_VERTICES>;

/// A vertex representation that can be clipped against [`ClipPlane`]s.
pub trait Clippable: Copy {
    /// Signed distance to `plane`. Non-negative values are inside.
    fn distance(&self, plane: ClipPlane) -> f32;

    /// Interpolates towards `other` by `t`. The result is a vertex created by clipping.
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

/// The two scratch polygons of the clipper. Each plane reads `current` and writes `next`, after
/// which the roles are swapped.
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    current: Polygon<T>,
    next: Polygon<T>,
}

impl<T: Clippable> PingPong<T> {
    pub fn new(triangle: [T; 3]) -> Self {
        Self {
            current: triangle.into_iter().collect(),
            next: Polygon::new(),
        }
    }

    #[inline(always)]
    pub fn current(&self) -> &[T] {
        &self.current
    }

    #[inline(always)]
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Clips the current polygon against a single plane. Returns `false` if nothing is left of it.
    pub fn clip_plane(&mut self, plane: ClipPlane) -> bool {
        let len = self.current.len();
        if len < 3 {
            self.current.clear();
            return false;
        }

        self.next.clear();
        for i in 0..len {
            let vertex = self.current[i];
            let following = self.current[(i + 1) % len];
            let d_vertex = vertex.distance(plane);
            let d_following = following.distance(plane);

            let inside = d_vertex >= 0.0;
            if inside && self.next.try_push(vertex).is_err() {
                self.current.clear();
                return false;
            }

            if inside != (d_following >= 0.0) {
                let t = d_vertex / (d_vertex - d_following);
                if self.next.try_push(vertex.lerp(&following, t)).is_err() {
                    self.current.clear();
                    return false;
                }
            }
        }

        self.swap();
        if self.current.len() < 3 {
            self.current.clear();
            return false;
        }

        true
    }

    /// Clips the current polygon against every plane in `planes`, returning what is left. The
    /// result is either empty or a convex polygon with at least 3 vertices.
    pub fn clip(&mut self, planes: &[ClipPlane]) -> &[T] {
        let all_inside = planes
            .iter()
            .all(|&plane| self.current.iter().all(|v| v.distance(plane) >= 0.0));

        if !all_inside {
            for &plane in planes {
                if !self.clip_plane(plane) {
                    break;
                }
            }
        }

        &self.current
    }
}

/// Fan-triangulates a convex polygon around its first vertex.
pub fn fan<T: Copy>(polygon: &[T]) -> impl Iterator<Item = [T; 3]> + '_ {
    (1..polygon.len().saturating_sub(1)).map(|i| [polygon[0], polygon[i], polygon[i + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Point(Vec4);

    impl Clippable for Point {
        fn distance(&self, plane: ClipPlane) -> f32 {
            plane.distance(self.0)
        }

        fn lerp(&self, other: &Self, t: f32) -> Self {
            Self(self.0.lerp(other.0, t))
        }
    }

    fn point(x: f32, y: f32, z: f32) -> Point {
        Point(Vec4::new(x, y, z, 1.0))
    }

    #[test]
    fn fully_inside_is_untouched() {
        let triangle = [point(0.0, 0.0, 0.5), point(0.5, 0.0, 0.5), point(0.0, 0.5, 0.5)];
        let mut pingpong = PingPong::new(triangle);

        assert_eq!(pingpong.clip(ClipPlane::VARIANTS), &triangle);
    }

    #[test]
    fn one_vertex_out_gives_quad() {
        let mut pingpong = PingPong::new([
            point(0.0, 0.0, 0.5),
            point(2.0, 0.0, 0.5),
            point(0.0, 0.5, 0.5),
        ]);

        let polygon = pingpong.clip(&[ClipPlane::Right]);
        assert_eq!(polygon.len(), 4);
        assert!(polygon.iter().all(|p| p.0.x <= 1.0 + 1e-6));
        assert_eq!(fan(polygon).count(), 2);
    }

    #[test]
    fn fully_outside_is_empty() {
        let mut pingpong = PingPong::new([
            point(0.0, 0.0, -0.5),
            point(0.5, 0.0, -0.1),
            point(0.0, 0.5, -0.2),
        ]);

        assert!(pingpong.clip(&[ClipPlane::Near]).is_empty());
    }

    #[test]
    fn every_plane_can_add_a_vertex() {
        // a large triangle that covers the whole view volume cross section
        let mut pingpong = PingPong::new([
            point(-10.0, -10.0, 0.5),
            point(30.0, -10.0, 0.5),
            point(-10.0, 30.0, 0.5),
        ]);

        let polygon = pingpong.clip(ClipPlane::VARIANTS);
        assert_eq!(polygon.len(), 4);
        assert!(polygon.len() <= MAX_POLYGON_VERTICES);
        assert!(
            polygon
                .iter()
                .all(|p| p.0.x.abs() <= 1.0 + 1e-5 && p.0.y.abs() <= 1.0 + 1e-5)
        );
    }
}
