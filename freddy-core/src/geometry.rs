//! Procedural mesh primitives
//!
//! Meshes are plain triangle lists in model space. Generators build unit
//! shapes; callers size them with a placement matrix.
use std::f32::consts::{PI, TAU};

use nalgebra::{Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }

    pub fn from_parts(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the winding of the three positions.
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let [v0, v1, v2] = self.vertices.map(|v| v.position);
        (v1 - v0).cross(&(v2 - v0)).normalize()
    }

    /// Mean of the vertex normals. Independent of winding, which the
    /// parametric generators do not keep consistent.
    pub fn average_normal(&self) -> Vector3<f32> {
        let sum = self.vertices.iter().fold(Vector3::zeros(), |acc, v| acc + v.normal);
        sum.try_normalize(1e-8).unwrap_or_else(|| self.calculate_normal())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Sheet of `columns * rows` quads over (u, v) in [0, 1]^2, two
    /// triangles per quad.
    pub fn parametric<P, N>(columns: usize, rows: usize, point: P, normal: N) -> Self
    where
        P: Fn(f32, f32) -> Point3<f32>,
        N: Fn(f32, f32) -> Vector3<f32>,
    {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let vertex = |x: usize, y: usize| {
            let u = x as f32 / columns as f32;
            let v = y as f32 / rows as f32;
            Vertex::from_parts(point(u, v), normal(u, v))
        };

        let mut mesh = Self::with_capacity(columns * rows * 2);
        for y in 0..rows {
            for x in 0..columns {
                let a = vertex(x, y);
                let b = vertex(x + 1, y);
                let c = vertex(x + 1, y + 1);
                let d = vertex(x, y + 1);
                mesh.add_triangle(Triangle::new(a, b, c));
                mesh.add_triangle(Triangle::new(a, c, d));
            }
        }
        mesh
    }

    /// Unit sphere at the origin. `resolution` is the number of latitude
    /// bands; there are twice as many longitude segments.
    pub fn sphere(resolution: usize) -> Self {
        let point = |u: f32, v: f32| {
            let theta = u * TAU;
            let phi = (v - 0.5) * PI;
            Point3::new(phi.cos() * theta.cos(), phi.sin(), phi.cos() * theta.sin())
        };
        // On a unit sphere the normal is the position.
        Self::parametric(resolution * 2, resolution, point, |u, v| point(u, v).coords)
    }

    /// Open frustum along +X from radius 1 at x = 0 to radius `top_ratio`
    /// at x = 1. A ratio of zero gives a pointed cone.
    pub fn cone(steps: usize, top_ratio: f32) -> Self {
        let radius = move |v: f32| 1.0 + (top_ratio - 1.0) * v;
        Self::parametric(
            steps,
            1,
            move |u, v| {
                let angle = u * TAU;
                let r = radius(v);
                Point3::new(v, r * angle.cos(), r * angle.sin())
            },
            move |u, _| {
                let angle = u * TAU;
                Vector3::new(1.0 - top_ratio, angle.cos(), angle.sin()).normalize()
            },
        )
    }

    /// Open cylinder of radius 1 along +X from x = 0 to x = 1.
    pub fn tube(steps: usize) -> Self {
        Self::cone(steps, 1.0)
    }

    /// Axis-aligned cube centred at the origin.
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        // (normal, u, v) with u x v = normal, so each face winds outwards.
        let faces = [
            (Vector3::x(), Vector3::y(), Vector3::z()),
            (-Vector3::x(), Vector3::z(), Vector3::y()),
            (Vector3::y(), Vector3::z(), Vector3::x()),
            (-Vector3::y(), Vector3::x(), Vector3::z()),
            (Vector3::z(), Vector3::x(), Vector3::y()),
            (-Vector3::z(), Vector3::y(), Vector3::x()),
        ];

        let mut mesh = Self::with_capacity(12);
        for (normal, u, v) in faces {
            let corner = |su: f32, sv: f32| {
                Vertex::from_parts(Point3::from((normal + u * su + v * sv) * half), normal)
            };
            let quad = [corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0)];
            mesh.add_triangle(Triangle::new(quad[0], quad[1], quad[2]));
            mesh.add_triangle(Triangle::new(quad[0], quad[2], quad[3]));
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_faces_wind_outwards() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.len(), 12);
        for triangle in &cube.triangles {
            let n = triangle.calculate_normal();
            assert!((n - triangle.vertices[0].normal).norm() < 1e-5);
            for v in &triangle.vertices {
                assert!((v.position.coords.abs().max() - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_sphere_points_are_unit_length() {
        let sphere = Mesh::sphere(6);
        assert_eq!(sphere.len(), 6 * 12 * 2);
        for triangle in &sphere.triangles {
            for v in &triangle.vertices {
                assert!((v.position.coords.norm() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_cone_tapers_along_x() {
        let cone = Mesh::cone(8, 0.5);
        for triangle in &cone.triangles {
            for v in &triangle.vertices {
                let x = v.position.x;
                let r = (v.position.y.powi(2) + v.position.z.powi(2)).sqrt();
                assert!((0.0..=1.0).contains(&x));
                assert!((r - (1.0 - 0.5 * x)).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_tube_normals_are_radial() {
        let tube = Mesh::tube(6);
        for triangle in &tube.triangles {
            for v in &triangle.vertices {
                assert!(v.normal.x.abs() < 1e-6);
                assert!((v.normal.norm() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_average_normal_is_normalized() {
        let sphere = Mesh::sphere(4);
        let n = sphere.triangles[5].average_normal();
        assert!((n.norm() - 1.0).abs() < 1e-5);
    }
}
