//! ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use freddy_core::{Camera, Canvas, Mesh, Rgb, Triangle};
use nalgebra::{Matrix3, Matrix4, Vector3};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

const AMBIENT: f32 = 0.15;

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Color>,
    light_dir: Vector3<f32>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![Color::Reset; size],
            light_dir: Vector3::new(0.4, 0.6, 1.0).normalize(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self {
            light_dir: self.light_dir,
            ..Self::new(width, height)
        };
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Color::Reset);
    }

    /// Canvas that rasterizes through `camera` into this renderer.
    pub fn canvas<'a>(&'a mut self, camera: &'a Camera) -> FrameCanvas<'a> {
        FrameCanvas {
            renderer: self,
            camera,
        }
    }

    /// Number of cells covered by geometry.
    pub fn covered(&self) -> usize {
        self.char_buffer.iter().filter(|c| **c != ' ').count()
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model: &Matrix4<f32>,
        normal_matrix: &Matrix3<f32>,
        color: Rgb,
        camera: &Camera,
    ) {
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match camera.project_to_screen(
                &vertex.position,
                model,
                self.width as u32,
                self.height as u32,
            ) {
                Some(coords) => *slot = coords,
                None => return, // Triangle is clipped
            }
        }

        // Two-sided lighting: generated meshes do not keep a consistent winding.
        let normal = (normal_matrix * triangle.average_normal())
            .try_normalize(1e-8)
            .unwrap_or_else(Vector3::z);
        let brightness = AMBIENT + (1.0 - AMBIENT) * normal.dot(&self.light_dir).abs();

        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let character = LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)];
        let shaded = color.scaled(0.5 + brightness);

        self.rasterize_triangle(&screen_coords, character, to_terminal_color(shaded));
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char, color: Color) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box, clipped to screen bounds
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                    self.color_buffer[idx] = color;
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                writer.queue(SetForegroundColor(self.color_buffer[idx]))?;
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    /// The character buffer as plain text, one line per row.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity((self.width + 1) * self.height);
        for row in self.char_buffer.chunks(self.width.max(1)) {
            text.extend(row.iter());
            text.push('\n');
        }
        text
    }
}

/// A renderer paired with the camera for one frame.
pub struct FrameCanvas<'a> {
    renderer: &'a mut AsciiRenderer,
    camera: &'a Camera,
}

impl Canvas for FrameCanvas<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh, model: &Matrix4<f32>, color: Rgb) {
        let linear: Matrix3<f32> = model.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear
            .try_inverse()
            .map(|inverse| inverse.transpose())
            .unwrap_or(linear);
        for triangle in &mesh.triangles {
            self.renderer
                .render_triangle(triangle, model, &normal_matrix, color, self.camera);
        }
    }
}

fn to_terminal_color(color: Rgb) -> Color {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0) as u8;
    Color::Rgb {
        r: channel(color.r),
        g: channel(color.g),
        b: channel(color.b),
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use freddy_core::{render_tree, Freddy, MatrixStack};

    #[test]
    fn test_barycentric_inside_and_outside() {
        let (a, b, c) = ((0.0, 0.0), (4.0, 0.0), (0.0, 4.0));
        let (w0, w1, w2) = barycentric(a, b, c, (1.0, 1.0)).unwrap();
        assert!(w0 > 0.0 && w1 > 0.0 && w2 > 0.0);
        let (w0, w1, w2) = barycentric(a, b, c, (5.0, 5.0)).unwrap();
        assert!(w0 < 0.0 || w1 < 0.0 || w2 < 0.0);
        assert!(barycentric(a, a, a, (0.0, 0.0)).is_none());
    }

    #[test]
    fn test_cube_covers_centre() {
        let camera = Camera::new(40, 20);
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer
            .canvas(&camera)
            .draw_mesh(&Mesh::cube(2.0), &Matrix4::identity(), Rgb::new(1.0, 1.0, 1.0));
        assert!(renderer.covered() > 0);
        let text = renderer.to_text();
        let centre = text.lines().nth(10).unwrap().chars().nth(20).unwrap();
        assert_ne!(centre, ' ');

        renderer.clear();
        assert_eq!(renderer.covered(), 0);
    }

    #[test]
    fn test_freddy_renders() {
        let freddy = Freddy::new().unwrap();
        let mut camera = Camera::new(80, 80);
        camera.set_zoom(8.0);
        let mut renderer = AsciiRenderer::new(80, 40);
        render_tree(freddy.root(), &mut MatrixStack::new(), &mut renderer.canvas(&camera));
        assert!(renderer.covered() > 50);
        assert_eq!(renderer.to_text().lines().count(), 40);
    }
}
