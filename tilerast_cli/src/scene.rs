//! Procedural meshes and the camera path of the demo scenes.

use crate::cli::Scene;
use glam::{Mat4, Vec2, Vec3};

#[derive(Debug, Default)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Appends a quad. Vertices are given counter-clockwise as seen from the front.
    fn quad(&mut self, corners: [Vec3; 4], uvs: [Vec2; 4]) {
        let base = self.positions.len() as u32;
        self.positions.extend(corners);
        self.uvs.extend(uvs);
        self.indices
            .extend([0, 1, 2, 0, 2, 3].map(|index| base + index));
    }

    /// A unit cube centred at the origin, every face mapped to the whole texture.
    pub fn cube(&mut self) {
        // (normal, u, v) with u x v = normal, so faces are counter-clockwise from the outside
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        ];

        for (normal, u, v) in faces {
            let centre = normal * 0.5;
            let (u, v) = (u * 0.5, v * 0.5);
            self.quad(
                [
                    centre - u - v,
                    centre + u - v,
                    centre + u + v,
                    centre - u + v,
                ],
                [
                    Vec2::new(0.0, 1.0),
                    Vec2::new(1.0, 1.0),
                    Vec2::new(1.0, 0.0),
                    Vec2::new(0.0, 0.0),
                ],
            );
        }
    }

    /// A `cells x cells` grid on the `y = height` plane spanning `[-extent, extent]` on both
    /// axes. The texture repeats once per world unit.
    pub fn ground(&mut self, cells: u32, extent: f32, height: f32) {
        let step = 2.0 * extent / cells as f32;
        for z in 0..cells {
            for x in 0..cells {
                let x0 = -extent + x as f32 * step;
                let z0 = -extent + z as f32 * step;
                let (x1, z1) = (x0 + step, z0 + step);

                let corners = [
                    Vec3::new(x0, height, z1),
                    Vec3::new(x1, height, z1),
                    Vec3::new(x1, height, z0),
                    Vec3::new(x0, height, z0),
                ];
                self.quad(corners, corners.map(|c| Vec2::new(c.x, c.z)));
            }
        }
    }

    pub fn scene(scene: Scene) -> Self {
        let mut mesh = Self::default();
        match scene {
            Scene::Cube => mesh.cube(),
            Scene::Ground => mesh.ground(16, 40.0, -0.5),
            Scene::Both => {
                mesh.cube();
                mesh.ground(16, 40.0, -0.5);
            }
        }

        mesh
    }
}

/// View matrix of a camera orbiting the origin, `frame` steps along its path.
pub fn orbit_view(frame: u32) -> Mat4 {
    let angle = frame as f32 * 0.05 + 0.6;
    let eye = Vec3::new(angle.sin() * 2.5, 0.8, angle.cos() * 2.5);
    Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_faces_point_outwards() {
        let mut mesh = Mesh::default();
        mesh.cube();
        assert_eq!(mesh.indices.len(), 36);

        for triangle in mesh.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| mesh.positions[triangle[i] as usize]);
            let normal = (b - a).cross(c - a);
            let centre = (a + b + c) / 3.0;
            assert!(normal.dot(centre) > 0.0);
        }
    }

    #[test]
    fn ground_faces_up() {
        let mut mesh = Mesh::default();
        mesh.ground(2, 1.0, 0.0);
        assert_eq!(mesh.positions.len(), 16);

        let [a, b, c] = [0, 1, 2].map(|i| mesh.positions[mesh.indices[i] as usize]);
        assert!((b - a).cross(c - a).y > 0.0);
    }
}
