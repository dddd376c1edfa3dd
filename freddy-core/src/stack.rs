//! Model-view matrix stack
//!
//! An explicit context object passed down a draw traversal. Each frame
//! starts from `clear()` (or a fresh stack) and every `push` is paired with
//! a `pop`.
use nalgebra::{Matrix4, Vector3};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct MatrixStack {
    frames: Vec<Matrix4<f32>>,
}

impl MatrixStack {
    pub fn new() -> Self {
        Self::with_base(Matrix4::identity())
    }

    /// Stack whose bottom frame is `base`, e.g. a view matrix.
    pub fn with_base(base: Matrix4<f32>) -> Self {
        Self { frames: vec![base] }
    }

    pub fn top(&self) -> &Matrix4<f32> {
        // The base frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Matrix4<f32> {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Duplicates the top frame.
    pub fn push(&mut self) {
        let top = *self.top();
        self.frames.push(top);
    }

    pub fn pop(&mut self) {
        if self.frames.len() == 1 {
            warn!("matrix stack underflow ignored");
            return;
        }
        self.frames.pop();
    }

    /// Resets to a single identity frame.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.frames.push(Matrix4::identity());
    }

    /// Right-multiplies the top frame: `top = top * m`.
    pub fn transform(&mut self, m: &Matrix4<f32>) {
        let top = self.top_mut();
        *top *= m;
    }

    pub fn translate(&mut self, offset: &Vector3<f32>) {
        self.transform(&Matrix4::new_translation(offset));
    }

    pub fn scale(&mut self, factor: &Vector3<f32>) {
        self.transform(&Matrix4::new_nonuniform_scaling(factor));
    }

    pub fn scale_uniform(&mut self, factor: f32) {
        self.transform(&Matrix4::new_scaling(factor));
    }

    pub fn rotate(&mut self, angle: f32, axis: &Vector3<f32>) {
        self.transform(&Matrix4::new_rotation(axis.normalize() * angle));
    }

    pub fn rotate_x(&mut self, angle: f32) {
        self.transform(&Matrix4::from_axis_angle(&Vector3::x_axis(), angle));
    }

    pub fn rotate_y(&mut self, angle: f32) {
        self.transform(&Matrix4::from_axis_angle(&Vector3::y_axis(), angle));
    }

    pub fn rotate_z(&mut self, angle: f32) {
        self.transform(&Matrix4::from_axis_angle(&Vector3::z_axis(), angle));
    }
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}
