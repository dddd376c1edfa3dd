//! Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::transform::MatrixCache;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Orbiting camera: it sits `zoom` units away from `target`, turned by
/// `spin` about the vertical axis and then `tilt` about its horizontal
/// axis. The view matrix is rebuilt only after one of those changes.
#[derive(Debug)]
pub struct Camera {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
    target: Point3<f32>,
    zoom: f32,
    spin: f32,
    tilt: f32,
    view: MatrixCache,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            aspect: width.max(1) as f32 / height.max(1) as f32,
            near: 0.1,
            far: 100.0,
            mode: ProjectionMode::Perspective,
            target: Point3::origin(),
            zoom: 5.0,
            spin: 0.0,
            tilt: 0.0,
            view: MatrixCache::new(),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn spin(&self) -> f32 {
        self.spin
    }

    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
        self.view.invalidate();
    }

    pub fn set_spin(&mut self, spin: f32) {
        self.spin = spin;
        self.view.invalidate();
    }

    /// Tilt is kept short of straight up or down.
    pub fn set_tilt(&mut self, tilt: f32) {
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        self.tilt = tilt.clamp(-limit, limit);
        self.view.invalidate();
    }

    pub fn set_target(&mut self, target: Point3<f32>) {
        self.target = target;
        self.view.invalidate();
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view.get(|| {
            Matrix4::new_translation(&Vector3::new(0.0, 0.0, -self.zoom))
                * Matrix4::from_axis_angle(&Vector3::x_axis(), self.tilt)
                * Matrix4::from_axis_angle(&Vector3::y_axis(), self.spin)
                * Matrix4::new_translation(&-self.target.coords)
        })
    }

    /// Camera position in world space.
    pub fn position(&self) -> Point3<f32> {
        self.view_matrix()
            .try_inverse()
            .map(|inverse| inverse.transform_point(&Point3::origin()))
            .unwrap_or(self.target)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = self.zoom;
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Project a model-space point to screen space. Returns `(x, y, depth)`
    /// with depth in normalized device coordinates, or `None` if the point
    /// is behind the camera or outside the view volume.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let mvp = self.projection_matrix() * self.view_matrix() * model_matrix;
        let clip = mvp * point.to_homogeneous();

        // Prevent division by near-zero or negative w
        if clip.w < 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || ndc.z.abs() > 1.0 {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert_eq!(camera.mode, ProjectionMode::Perspective);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_viewport_keeps_projection_valid() {
        let camera = Camera::new(0, 0);
        assert!(camera.aspect > 0.0);
        assert!(camera
            .project_to_screen(&Point3::origin(), &Matrix4::identity(), 1, 1)
            .is_some());
    }

    #[test]
    fn test_default_position_is_on_z_axis() {
        let camera = Camera::new(800, 600);
        assert!((camera.position() - Point3::new(0.0, 0.0, 5.0)).norm() < 1e-5);
    }

    #[test]
    fn test_spin_moves_camera_and_invalidates_view() {
        let mut camera = Camera::new(800, 600);
        let before = camera.view_matrix();
        camera.set_spin(std::f32::consts::FRAC_PI_2);
        assert!((camera.view_matrix() - before).norm() > 1e-3);
        assert!((camera.position() - Point3::new(-5.0, 0.0, 0.0)).norm() < 1e-4);
    }

    #[test]
    fn test_tilt_is_clamped() {
        let mut camera = Camera::new(800, 600);
        camera.set_tilt(10.0);
        assert!(camera.tilt() < std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_target_projects_to_centre() {
        let camera = Camera::new(100, 50);
        let (x, y, depth) = camera
            .project_to_screen(&Point3::origin(), &Matrix4::identity(), 100, 50)
            .unwrap();
        assert!((x - 50.0).abs() < 1e-3);
        assert!((y - 25.0).abs() < 1e-3);
        assert!(depth.abs() < 1.0);
    }

    #[test]
    fn test_points_behind_camera_are_rejected() {
        let camera = Camera::new(100, 100);
        let behind = Point3::new(0.0, 0.0, 10.0);
        assert!(camera
            .project_to_screen(&behind, &Matrix4::identity(), 100, 100)
            .is_none());
    }

    #[test]
    fn test_nearer_points_have_smaller_depth() {
        let camera = Camera::new(100, 100);
        let model = Matrix4::identity();
        let (_, _, near) = camera.project_to_screen(&Point3::new(0.0, 0.0, 1.0), &model, 100, 100).unwrap();
        let (_, _, far) = camera.project_to_screen(&Point3::new(0.0, 0.0, -1.0), &model, 100, 100).unwrap();
        assert!(near < far);
    }
}
