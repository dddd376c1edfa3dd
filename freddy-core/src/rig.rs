//! Freddy, a small articulated character
//!
//! Every joint is a baked constant (its fixed offset and orientation)
//! followed by a `Rotate::z` bend that the animation drives. All toes share
//! one bend handle and all fingers share another, so a single update curls
//! the whole foot or hand.
use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, FRAC_PI_6, PI};
use std::rc::Rc;

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::body::BodyPart;
use crate::draw::{Figure, Rgb, Shape};
use crate::error::{HierarchyError, Result, RigError};
use crate::geometry::Mesh;
use crate::pose::Pose;
use crate::transform::{Parametrized, Rotate, Transform, Translate};

pub const UPPER_LENGTH: f32 = 1.0;
pub const LOWER_LENGTH: f32 = 0.7;
pub const PHALANX_LENGTH: f32 = 0.4;

const UPPER_WIDTH: f32 = 0.15;
const LOWER_WIDTH: f32 = 0.1;
const PHALANX_WIDTH: f32 = 0.075;
const BODY_DEPTH: f32 = 0.5;
const EYE_RADIUS: f32 = 0.2;

const GREY: Rgb = Rgb::new(0.6, 0.6, 0.6);
const BODY: Rgb = Rgb::new(0.4, 0.4, 0.4);
const EYE: Rgb = Rgb::new(0.1, 0.1, 0.5);
const JOINT: Rgb = Rgb::new(0.5, 0.1, 0.1);
const LIMB: Rgb = Rgb::new(0.5, 0.5, 0.1);

/// Shared meshes for every drawable on the rig.
struct Meshes {
    sphere: Rc<Mesh>,
    cone: Rc<Mesh>,
}

impl Meshes {
    fn new() -> Self {
        Self {
            sphere: Rc::new(Mesh::sphere(6)),
            cone: Rc::new(Mesh::cone(6, 0.8)),
        }
    }

    fn ball(&self, radius: f32, color: Rgb) -> Shape {
        Shape::new(self.sphere.clone(), color).scaled(Vector3::repeat(radius))
    }

    fn limb(&self, length: f32, width: f32) -> Shape {
        Shape::new(self.cone.clone(), LIMB).scaled(Vector3::new(length, width, width))
    }
}

pub struct Freddy {
    root: BodyPart,
    bends: Vec<(&'static str, Rotate)>,
}

impl Freddy {
    pub fn new() -> Result<Self, HierarchyError> {
        let meshes = Meshes::new();
        let root = BodyPart::root("root");
        root.set_drawable(meshes.ball(0.3, GREY));

        let body = BodyPart::new("body");
        body.set_drawable(body_figure(&meshes));
        body.set_parent(&root)?;

        let mut rig = Self {
            root,
            bends: Vec::new(),
        };

        // leg
        let hip = rig.joint(
            "hip",
            &body,
            Translate::new(Vector3::new(0.0, -1.0, 0.0))
                .then(Rotate::x(FRAC_PI_2))
                .then(Rotate::y(-FRAC_PI_2)),
            &meshes,
        )?;
        let upper_leg = limb("upper_leg", &hip, UPPER_LENGTH, UPPER_WIDTH, &meshes)?;
        let knee = rig.joint("knee", &upper_leg, along_x(UPPER_LENGTH), &meshes)?;
        let lower_leg = limb("lower_leg", &knee, LOWER_LENGTH, LOWER_WIDTH, &meshes)?;
        let ankle = rig.joint("ankle", &lower_leg, along_x(LOWER_LENGTH), &meshes)?;

        // arm
        let shoulder = rig.joint(
            "shoulder",
            &body,
            Translate::new(Vector3::new(0.0, 1.0, 0.0))
                .then(Rotate::x(FRAC_PI_2))
                .then(Rotate::y(FRAC_PI_2)),
            &meshes,
        )?;
        let upper_arm = limb("upper_arm", &shoulder, UPPER_LENGTH, UPPER_WIDTH, &meshes)?;
        let elbow = rig.joint("elbow", &upper_arm, along_x(UPPER_LENGTH), &meshes)?;
        let lower_arm = limb("lower_arm", &elbow, LOWER_LENGTH, LOWER_WIDTH, &meshes)?;
        let wrist = rig.joint("wrist", &lower_arm, along_x(LOWER_LENGTH), &meshes)?;

        let toes = Rotate::z(0.0);
        for (i, angle) in [FRAC_PI_4, -FRAC_PI_4, PI].into_iter().enumerate() {
            digit(&format!("toe_{i}"), &ankle, angle, &toes, &meshes)?;
        }
        rig.bends.push(("toes", toes));

        let fingers = Rotate::z(0.0);
        for (i, angle) in [FRAC_PI_3, FRAC_PI_3 * 3.0, FRAC_PI_3 * 5.0].into_iter().enumerate() {
            digit(&format!("finger_{i}"), &wrist, angle, &fingers, &meshes)?;
        }
        rig.bends.push(("fingers", fingers));

        debug!(joints = rig.bends.len(), "built freddy");
        Ok(rig)
    }

    /// A joint part: `fixed` baked to a constant, then a fresh bend.
    fn joint(
        &mut self,
        name: &'static str,
        parent: &BodyPart,
        fixed: Transform,
        meshes: &Meshes,
    ) -> Result<BodyPart, HierarchyError> {
        let bend = Rotate::z(0.0);
        let part = BodyPart::new(name);
        part.set_transform(fixed.to_constant().then(bend.clone()));
        part.set_drawable(meshes.ball(0.2, JOINT));
        part.set_parent(parent)?;
        self.bends.push((name, bend));
        Ok(part)
    }

    pub fn root(&self) -> &BodyPart {
        &self.root
    }

    pub fn part(&self, name: &str) -> Option<BodyPart> {
        self.root.find(name)
    }

    pub fn bend(&self, joint: &str) -> Option<&Rotate> {
        self.bends
            .iter()
            .find(|(name, _)| *name == joint)
            .map(|(_, bend)| bend)
    }

    pub fn joints(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bends.iter().map(|(name, _)| *name)
    }

    /// Walk cycle at `time` seconds.
    pub fn update(&self, time: f32) {
        self.set("hip", FRAC_PI_6 + time.sin() * FRAC_PI_3);
        self.set("knee", -((time + FRAC_PI_3).sin() + 1.0) * FRAC_PI_4);
        self.set("toes", -0.3 - 0.3 * (time - FRAC_PI_4).sin());
    }

    fn set(&self, joint: &str, angle: f32) {
        if let Some(bend) = self.bend(joint) {
            bend.set_angle(angle);
        }
    }

    /// Sets the named bends. Nothing changes if any name is unknown.
    pub fn apply_pose(&self, pose: &Pose) -> Result<()> {
        if let Some((name, _)) = pose.angles.iter().find(|(name, _)| self.bend(name).is_none()) {
            return Err(RigError::UnknownJoint(name.clone()));
        }
        for (name, angle) in &pose.angles {
            self.set(name, *angle);
        }
        Ok(())
    }
}

fn along_x(length: f32) -> Transform {
    Translate::new(Vector3::new(length, 0.0, 0.0)).into()
}

/// A limb segment whose point of interest is its far end.
fn limb(
    name: &str,
    parent: &BodyPart,
    length: f32,
    width: f32,
    meshes: &Meshes,
) -> Result<BodyPart, HierarchyError> {
    let part = BodyPart::new(name);
    part.set_local_position(Point3::new(length, 0.0, 0.0));
    part.set_drawable(meshes.limb(length, width));
    part.set_parent(parent)?;
    Ok(part)
}

/// Two phalanges fanned out at `angle` around the parent's X axis. Both
/// segments bend with the shared `curl`.
fn digit(
    name: &str,
    parent: &BodyPart,
    angle: f32,
    curl: &Rotate,
    meshes: &Meshes,
) -> Result<(), HierarchyError> {
    let base = BodyPart::new(format!("{name}_base"));
    base.set_transform(
        Rotate::x(angle)
            .then(Rotate::z(FRAC_PI_2))
            .to_constant()
            .then(curl.clone()),
    );
    base.set_local_position(Point3::new(PHALANX_LENGTH, 0.0, 0.0));
    base.set_drawable(meshes.limb(PHALANX_LENGTH, PHALANX_WIDTH));
    base.set_parent(parent)?;

    let tip = BodyPart::new(format!("{name}_tip"));
    tip.set_transform(Translate::new(Vector3::new(PHALANX_LENGTH, 0.0, 0.0)).then(curl.clone()));
    tip.set_local_position(Point3::new(PHALANX_LENGTH, 0.0, 0.0));
    tip.set_drawable(meshes.limb(PHALANX_LENGTH, PHALANX_WIDTH));
    tip.set_parent(&base)?;
    Ok(())
}

/// The torso is squashed in depth and the eyes sit in that squashed frame.
fn body_figure(meshes: &Meshes) -> Figure {
    let squash = Vector3::new(1.0, 1.0, BODY_DEPTH);
    let eye = |offset: Vector3<f32>| {
        Shape::new(meshes.sphere.clone(), EYE)
            .scaled(squash)
            .translated(offset.normalize())
            .scaled(Vector3::repeat(EYE_RADIUS))
    };
    Figure(vec![
        Shape::new(meshes.sphere.clone(), BODY).scaled(squash),
        eye(Vector3::new(0.7, 0.7, 1.0)),
        eye(Vector3::new(-0.7, 0.7, 1.0)),
    ])
}
