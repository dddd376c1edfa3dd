//! Terminal front end: Freddy walking in ASCII
use anyhow::{ensure, Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use freddy_core::{render_tree, Camera, Freddy, MatrixStack, Pose};
use std::io::{stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub mod renderer;

pub use renderer::AsciiRenderer;

const SPIN_STEP: f32 = 0.1;
const ZOOM_STEP: f32 = 0.5;

/// Settings the binary collects from the command line.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fps: u32,
    /// Joint angles pinned on top of the walk cycle.
    pub pose: Option<Pose>,
    /// Animation speed multiplier.
    pub speed: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            pose: None,
            speed: 1.0,
        }
    }
}

/// Terminal cells are roughly twice as tall as they are wide.
fn camera_for(width: u16, height: u16) -> Camera {
    let mut camera = Camera::new(width as u32, height as u32 * 2);
    camera.set_zoom(9.0);
    camera.set_spin(0.6);
    camera.set_tilt(0.25);
    camera
}

fn pose_freddy(freddy: &Freddy, time: f32, pose: Option<&Pose>) -> Result<()> {
    freddy.update(time);
    if let Some(pose) = pose {
        freddy.apply_pose(pose).context("applying pose")?;
    }
    Ok(())
}

/// Renders a single frame at animation `time` and returns it as text.
pub fn snapshot(width: u16, height: u16, time: f32, pose: Option<&Pose>) -> Result<String> {
    ensure!(width > 0 && height > 0, "snapshot size must be non-zero, got {width}x{height}");
    let freddy = Freddy::new().context("building freddy")?;
    pose_freddy(&freddy, time, pose)?;

    let camera = camera_for(width, height);
    let mut renderer = AsciiRenderer::new(width as usize, height as usize);
    render_tree(freddy.root(), &mut MatrixStack::new(), &mut renderer.canvas(&camera));
    debug!(covered = renderer.covered(), "rendered snapshot");
    Ok(renderer.to_text())
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    freddy: Freddy,
    config: AppConfig,
    camera: Camera,
    renderer: AsciiRenderer,
    running: bool,
    paused: bool,
    time: f32,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: AppConfig) -> Result<Self> {
        let (width, height) = terminal::size().context("querying terminal size")?;
        let freddy = Freddy::new().context("building freddy")?;
        pose_freddy(&freddy, 0.0, config.pose.as_ref())?;

        Ok(Self {
            freddy,
            config,
            camera: camera_for(width, height),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            running: true,
            paused: false,
            time: 0.0,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        info!(fps = self.config.fps, "starting terminal renderer");

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;
        info!("terminal renderer stopped");

        result
    }

    fn main_loop(&mut self) -> Result<()> {
        let target_frame_time = Duration::from_millis(1000 / self.config.fps.max(1) as u64);
        let mut previous = Instant::now();

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.update((frame_start - previous).as_secs_f32())?;
            previous = frame_start;

            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code),
            Event::Resize(width, height) => {
                debug!(width, height, "terminal resized");
                self.renderer.resize(width as usize, height as usize);
                self.camera.aspect = width.max(1) as f32 / (height.max(1) as f32 * 2.0);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        let camera = &mut self.camera;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('a') | KeyCode::Left => camera.set_spin(camera.spin() - SPIN_STEP),
            KeyCode::Char('d') | KeyCode::Right => camera.set_spin(camera.spin() + SPIN_STEP),
            KeyCode::Char('w') | KeyCode::Up => camera.set_tilt(camera.tilt() + SPIN_STEP),
            KeyCode::Char('s') | KeyCode::Down => camera.set_tilt(camera.tilt() - SPIN_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                camera.set_zoom((camera.zoom() - ZOOM_STEP).max(1.0))
            }
            KeyCode::Char('-') => camera.set_zoom(camera.zoom() + ZOOM_STEP),
            _ => {}
        }
    }

    fn update(&mut self, dt: f32) -> Result<()> {
        if self.paused {
            return Ok(());
        }
        self.time += dt * self.config.speed;
        pose_freddy(&self.freddy, self.time, self.config.pose.as_ref())
    }

    fn render(&mut self) -> Result<()> {
        self.renderer.clear();
        render_tree(
            self.freddy.root(),
            &mut MatrixStack::new(),
            &mut self.renderer.canvas(&self.camera),
        );

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Freddy | FPS: {:.1} | t={:.1}{} | WASD/Arrows=Orbit +/-=Zoom Space=Pause Q=Quit",
                self.fps,
                self.time,
                if self.paused { " (paused)" } else { "" }
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_has_requested_size() {
        let text = snapshot(60, 30, 0.5, None).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 30);
        assert!(lines.iter().all(|line| line.chars().count() == 60));
        assert!(text.chars().any(|c| c != ' ' && c != '\n'));
    }

    #[test]
    fn test_snapshot_rejects_empty_frame() {
        assert!(snapshot(0, 10, 0.0, None).is_err());
        assert!(snapshot(10, 0, 0.0, None).is_err());
    }

    #[test]
    fn test_zero_width_resize_keeps_rendering() {
        let mut renderer = AsciiRenderer::new(0, 10);
        let camera = camera_for(0, 10);
        let freddy = Freddy::new().unwrap();
        render_tree(freddy.root(), &mut MatrixStack::new(), &mut renderer.canvas(&camera));
        assert_eq!(renderer.covered(), 0);
    }

    #[test]
    fn test_snapshot_rejects_unknown_joint() {
        let pose = Pose::parse("tail=1.0").unwrap();
        assert!(snapshot(20, 10, 0.0, Some(&pose)).is_err());
    }

    #[test]
    fn test_pose_changes_snapshot() {
        let still = snapshot(60, 30, 0.0, None).unwrap();
        let pose = Pose::parse("shoulder=1.5, elbow=-1.2").unwrap();
        let posed = snapshot(60, 30, 0.0, Some(&pose)).unwrap();
        assert_ne!(still, posed);
    }
}
