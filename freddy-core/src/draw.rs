//! Draw attachments for body parts
//!
//! The hierarchy never looks inside a drawable. A renderer implements
//! [`Canvas`]; parts carry [`Drawable`]s that emit meshes onto it using the
//! matrix stack as the current model transform.
use std::rc::Rc;

use nalgebra::{Matrix4, Vector3};

use crate::body::BodyPart;
use crate::geometry::Mesh;
use crate::stack::MatrixStack;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn scaled(self, k: f32) -> Self {
        Self::new(self.r * k, self.g * k, self.b * k)
    }
}

/// Sink for model-space meshes.
pub trait Canvas {
    fn draw_mesh(&mut self, mesh: &Mesh, model: &Matrix4<f32>, color: Rgb);
}

pub trait Drawable {
    fn draw(&self, stack: &mut MatrixStack, canvas: &mut dyn Canvas);
}

/// A mesh placed relative to the owning part.
#[derive(Debug, Clone)]
pub struct Shape {
    pub mesh: Rc<Mesh>,
    pub placement: Matrix4<f32>,
    pub color: Rgb,
}

impl Shape {
    pub fn new(mesh: Rc<Mesh>, color: Rgb) -> Self {
        Self {
            mesh,
            placement: Matrix4::identity(),
            color,
        }
    }

    pub fn scaled(mut self, factor: Vector3<f32>) -> Self {
        self.placement *= Matrix4::new_nonuniform_scaling(&factor);
        self
    }

    pub fn translated(mut self, offset: Vector3<f32>) -> Self {
        self.placement *= Matrix4::new_translation(&offset);
        self
    }
}

impl Drawable for Shape {
    fn draw(&self, stack: &mut MatrixStack, canvas: &mut dyn Canvas) {
        stack.push();
        stack.transform(&self.placement);
        canvas.draw_mesh(&self.mesh, stack.top(), self.color);
        stack.pop();
    }
}

/// Several shapes drawn in order.
#[derive(Debug, Clone, Default)]
pub struct Figure(pub Vec<Shape>);

impl Drawable for Figure {
    fn draw(&self, stack: &mut MatrixStack, canvas: &mut dyn Canvas) {
        for shape in &self.0 {
            shape.draw(stack, canvas);
        }
    }
}

/// Draws `part` and its subtree. Children go first, last to first, so
/// leaves land on the canvas before the parts holding them.
pub fn render_tree(part: &BodyPart, stack: &mut MatrixStack, canvas: &mut dyn Canvas) {
    stack.push();
    stack.transform(&part.local_matrix());
    for child in part.children().iter().rev() {
        render_tree(child, stack, canvas);
    }
    if let Some(drawable) = part.drawable() {
        drawable.draw(stack, canvas);
    }
    stack.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Translate;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(usize, Matrix4<f32>, Rgb)>,
    }

    impl Canvas for Recorder {
        fn draw_mesh(&mut self, mesh: &Mesh, model: &Matrix4<f32>, color: Rgb) {
            self.calls.push((mesh.len(), *model, color));
        }
    }

    const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);
    const BLUE: Rgb = Rgb::new(0.0, 0.0, 1.0);

    #[test]
    fn test_render_tree_uses_world_matrices() {
        let cube = Rc::new(Mesh::cube(1.0));
        let root = BodyPart::root("root");
        root.set_transform(Translate::new(Vector3::new(0.0, 1.0, 0.0)));
        root.set_drawable(Shape::new(cube.clone(), RED));

        let arm = BodyPart::new("arm");
        arm.set_transform(Translate::new(Vector3::new(2.0, 0.0, 0.0)));
        arm.set_drawable(Shape::new(cube, BLUE).scaled(Vector3::new(1.0, 0.5, 0.5)));
        arm.set_parent(&root).unwrap();

        let mut stack = MatrixStack::new();
        let mut canvas = Recorder::default();
        render_tree(&root, &mut stack, &mut canvas);

        assert_eq!(stack.depth(), 1);
        assert_eq!(canvas.calls.len(), 2);
        // child first
        assert_eq!(canvas.calls[0].2, BLUE);
        let expected = arm.world_matrix() * Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 0.5, 0.5));
        assert!((canvas.calls[0].1 - expected).norm() < 1e-6);
        assert!((canvas.calls[1].1 - root.world_matrix()).norm() < 1e-6);
    }

    #[test]
    fn test_figure_places_each_shape() {
        let sphere = Rc::new(Mesh::sphere(3));
        let figure = Figure(vec![
            Shape::new(sphere.clone(), RED),
            Shape::new(sphere, BLUE).translated(Vector3::x()).scaled(Vector3::repeat(0.2)),
        ]);

        let mut stack = MatrixStack::new();
        let mut canvas = Recorder::default();
        figure.draw(&mut stack, &mut canvas);

        let expected: Matrix4<f32> =
            Matrix4::new_translation(&Vector3::<f32>::x()) * Matrix4::new_scaling(0.2);
        assert!((canvas.calls[1].1 - expected).norm() < 1e-6);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_parts_without_drawable_are_skipped() {
        let root = BodyPart::root("root");
        root.add_child(&BodyPart::new("empty")).unwrap();
        let mut canvas = Recorder::default();
        render_tree(&root, &mut MatrixStack::new(), &mut canvas);
        assert!(canvas.calls.is_empty());
    }
}
