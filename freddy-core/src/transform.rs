//! Parametrized transformations and their composition
//!
//! Every transform yields a 4x4 column-major matrix. Leaf transforms
//! (translate, scale, rotate) live behind shared handles: cloning a handle
//! shares both the parameters and the cached matrix, so one setter call is
//! seen by every chain holding that leaf. Combinations never cache; they
//! multiply their components on every query and leave validity to the leaves.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use nalgebra::{Matrix4, Unit, Vector3};
use tracing::trace;

/// Anything that produces a transformation matrix.
pub trait Parametrized: Clone + Into<Transform> {
    /// Current matrix of this transformation.
    fn matrix(&self) -> Matrix4<f32>;

    /// Returns `left * self.matrix()`.
    fn apply(&self, left: &Matrix4<f32>) -> Matrix4<f32> {
        left * self.matrix()
    }

    /// Composes `self` (left operand) with `other` (right operand).
    ///
    /// For anything but a [`Combo`] this builds a new two-component combo.
    /// A combo appends `other` in place and hands back the same shared list.
    fn then<T: Into<Transform>>(self, other: T) -> Transform {
        Transform::Combo(Combo::new(self, other))
    }

    /// Freezes the current matrix into a [`Transform::Constant`].
    fn to_constant(&self) -> Transform {
        Transform::Constant(self.matrix())
    }
}

/// Principal rotation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Unit<Vector3<f32>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

/// Single-slot matrix cache guarded by a validity flag.
#[derive(Debug)]
pub(crate) struct MatrixCache {
    valid: Cell<bool>,
    value: Cell<Matrix4<f32>>,
}

impl MatrixCache {
    pub(crate) fn new() -> Self {
        Self {
            valid: Cell::new(false),
            value: Cell::new(Matrix4::identity()),
        }
    }

    pub(crate) fn get(&self, compute: impl FnOnce() -> Matrix4<f32>) -> Matrix4<f32> {
        if !self.valid.get() {
            self.value.set(compute());
            self.valid.set(true);
        }
        self.value.get()
    }

    pub(crate) fn invalidate(&self) {
        self.valid.set(false);
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.valid.get()
    }
}

trait Parameters: Copy + std::fmt::Debug {
    fn compute(&self) -> Matrix4<f32>;
}

#[derive(Debug, Clone, Copy)]
struct Offset(Vector3<f32>);

impl Parameters for Offset {
    fn compute(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Factor(Vector3<f32>);

impl Parameters for Factor {
    fn compute(&self) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&self.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct PrincipalAngle {
    axis: Axis,
    angle: f32,
}

impl Parameters for PrincipalAngle {
    fn compute(&self) -> Matrix4<f32> {
        Matrix4::from_axis_angle(&self.axis.unit(), self.angle)
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisAngle {
    axis: Vector3<f32>,
    angle: f32,
}

impl Parameters for AxisAngle {
    fn compute(&self) -> Matrix4<f32> {
        // A zero axis yields NaNs; inputs are not validated.
        Matrix4::from_axis_angle(&Unit::new_normalize(self.axis), self.angle)
    }
}

/// Parameters plus the matrix derived from them.
#[derive(Debug)]
struct Leaf<P: Parameters> {
    params: Cell<P>,
    cache: MatrixCache,
}

impl<P: Parameters> Leaf<P> {
    fn shared(params: P) -> Rc<Self> {
        Rc::new(Self {
            params: Cell::new(params),
            cache: MatrixCache::new(),
        })
    }

    fn params(&self) -> P {
        self.params.get()
    }

    fn update(&self, f: impl FnOnce(&mut P)) {
        let mut params = self.params.get();
        f(&mut params);
        self.params.set(params);
        self.cache.invalidate();
    }

    fn matrix(&self) -> Matrix4<f32> {
        self.cache.get(|| {
            let params = self.params.get();
            trace!(?params, "recomputing leaf matrix");
            params.compute()
        })
    }
}

/// Translation by an offset vector.
#[derive(Debug, Clone)]
pub struct Translate(Rc<Leaf<Offset>>);

impl Translate {
    pub fn new(offset: Vector3<f32>) -> Self {
        Self(Leaf::shared(Offset(offset)))
    }

    pub fn offset(&self) -> Vector3<f32> {
        self.0.params().0
    }

    pub fn set_offset(&self, offset: Vector3<f32>) {
        self.0.update(|p| p.0 = offset);
    }

    /// True while the cached matrix matches the current offset.
    pub fn is_cached(&self) -> bool {
        self.0.cache.is_valid()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Non-uniform scaling.
#[derive(Debug, Clone)]
pub struct Scale(Rc<Leaf<Factor>>);

impl Scale {
    pub fn new(factor: Vector3<f32>) -> Self {
        Self(Leaf::shared(Factor(factor)))
    }

    pub fn uniform(factor: f32) -> Self {
        Self::new(Vector3::repeat(factor))
    }

    pub fn factor(&self) -> Vector3<f32> {
        self.0.params().0
    }

    pub fn set_factor(&self, factor: Vector3<f32>) {
        self.0.update(|p| p.0 = factor);
    }

    pub fn is_cached(&self) -> bool {
        self.0.cache.is_valid()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Rotation about one of the principal axes. The axis is fixed at
/// construction; only the angle is animated.
#[derive(Debug, Clone)]
pub struct Rotate(Rc<Leaf<PrincipalAngle>>);

impl Rotate {
    pub fn new(axis: Axis, angle: f32) -> Self {
        Self(Leaf::shared(PrincipalAngle { axis, angle }))
    }

    pub fn x(angle: f32) -> Self {
        Self::new(Axis::X, angle)
    }

    pub fn y(angle: f32) -> Self {
        Self::new(Axis::Y, angle)
    }

    pub fn z(angle: f32) -> Self {
        Self::new(Axis::Z, angle)
    }

    pub fn axis(&self) -> Axis {
        self.0.params().axis
    }

    pub fn angle(&self) -> f32 {
        self.0.params().angle
    }

    pub fn set_angle(&self, angle: f32) {
        self.0.update(|p| p.angle = angle);
    }

    pub fn is_cached(&self) -> bool {
        self.0.cache.is_valid()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Rotation about an arbitrary axis. The axis is normalized when the
/// matrix is built.
#[derive(Debug, Clone)]
pub struct RotateAbout(Rc<Leaf<AxisAngle>>);

impl RotateAbout {
    pub fn new(angle: f32, axis: Vector3<f32>) -> Self {
        Self(Leaf::shared(AxisAngle { axis, angle }))
    }

    pub fn angle(&self) -> f32 {
        self.0.params().angle
    }

    pub fn set_angle(&self, angle: f32) {
        self.0.update(|p| p.angle = angle);
    }

    pub fn axis(&self) -> Vector3<f32> {
        self.0.params().axis
    }

    pub fn set_axis(&self, axis: Vector3<f32>) {
        self.0.update(|p| p.axis = axis);
    }

    pub fn is_cached(&self) -> bool {
        self.0.cache.is_valid()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Ordered, shared list of at least two transforms, multiplied left to
/// right: `components[0] * components[1] * ... * components[n - 1]`.
///
/// Clones of a `Combo` alias the same list. Appending through any clone is
/// visible through all of them.
#[derive(Debug, Clone)]
pub struct Combo(Rc<RefCell<Vec<Transform>>>);

impl Combo {
    /// A combo always starts from exactly two components and only grows.
    pub fn new<A: Into<Transform>, B: Into<Transform>>(first: A, second: B) -> Self {
        Self(Rc::new(RefCell::new(vec![first.into(), second.into()])))
    }

    /// Appends a component in place.
    ///
    /// # Panics
    ///
    /// Panics if `component` is this combo or contains it, since the matrix
    /// of such a combo would never finish computing.
    pub fn push<T: Into<Transform>>(&self, component: T) {
        let component = component.into();
        assert!(
            !component.contains_combo(self),
            "a combination cannot contain itself"
        );
        self.0.borrow_mut().push(component);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Never true; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn component(&self, index: usize) -> Option<Transform> {
        self.0.borrow().get(index).cloned()
    }

    /// Snapshot of the component handles. The handles still alias the live
    /// leaves.
    pub fn components(&self) -> Vec<Transform> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Parametrized for Combo {
    fn matrix(&self) -> Matrix4<f32> {
        let components = self.0.borrow();
        let mut iter = components.iter();
        let first = iter
            .next()
            .map(|component| component.matrix())
            .unwrap_or_else(Matrix4::identity);
        iter.fold(first, |acc, component| acc * component.matrix())
    }

    fn then<T: Into<Transform>>(self, other: T) -> Transform {
        self.push(other);
        Transform::Combo(self)
    }
}

/// Type-erased transform node.
#[derive(Debug, Clone, Default)]
pub enum Transform {
    #[default]
    Identity,
    /// Frozen snapshot, decoupled from whatever it was derived from.
    Constant(Matrix4<f32>),
    Translate(Translate),
    Scale(Scale),
    Rotate(Rotate),
    RotateAbout(RotateAbout),
    Combo(Combo),
}

impl Transform {
    pub fn identity() -> Self {
        Transform::Identity
    }

    pub fn as_translate(&self) -> Option<&Translate> {
        match self {
            Transform::Translate(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_scale(&self) -> Option<&Scale> {
        match self {
            Transform::Scale(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_rotate(&self) -> Option<&Rotate> {
        match self {
            Transform::Rotate(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_rotate_about(&self) -> Option<&RotateAbout> {
        match self {
            Transform::RotateAbout(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_combo(&self) -> Option<&Combo> {
        match self {
            Transform::Combo(c) => Some(c),
            _ => None,
        }
    }

    fn contains_combo(&self, combo: &Combo) -> bool {
        match self {
            Transform::Combo(c) => {
                c.ptr_eq(combo) || c.0.borrow().iter().any(|t| t.contains_combo(combo))
            }
            _ => false,
        }
    }
}

impl Parametrized for Transform {
    fn matrix(&self) -> Matrix4<f32> {
        match self {
            Transform::Identity => Matrix4::identity(),
            Transform::Constant(m) => *m,
            Transform::Translate(t) => t.matrix(),
            Transform::Scale(s) => s.matrix(),
            Transform::Rotate(r) => r.matrix(),
            Transform::RotateAbout(r) => r.matrix(),
            Transform::Combo(c) => c.matrix(),
        }
    }

    fn then<T: Into<Transform>>(self, other: T) -> Transform {
        match self {
            Transform::Combo(combo) => combo.then(other),
            first => Transform::Combo(Combo::new(first, other)),
        }
    }
}

macro_rules! leaf_transform {
    ($($leaf:ident),*) => {
        $(
            impl Parametrized for $leaf {
                fn matrix(&self) -> Matrix4<f32> {
                    self.0.matrix()
                }
            }

            impl From<$leaf> for Transform {
                fn from(leaf: $leaf) -> Self {
                    Transform::$leaf(leaf)
                }
            }
        )*
    };
}

leaf_transform!(Translate, Scale, Rotate, RotateAbout);

impl From<Combo> for Transform {
    fn from(combo: Combo) -> Self {
        Transform::Combo(combo)
    }
}

impl From<Matrix4<f32>> for Transform {
    fn from(matrix: Matrix4<f32>) -> Self {
        Transform::Constant(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn close(a: &Matrix4<f32>, b: &Matrix4<f32>) -> bool {
        (a - b).norm() < 1e-5
    }

    #[test]
    fn test_identity_then_translate() {
        let t = Transform::identity().then(Translate::new(Vector3::new(1.0, 0.0, 0.0)));
        let expected = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));
        assert!(close(&t.matrix(), &expected));
    }

    #[test]
    fn test_rotate_z_right_handed() {
        let r = Rotate::z(FRAC_PI_2);
        let p = r.matrix().transform_vector(&Vector3::x());
        assert!((p - Vector3::y()).norm() < 1e-6);
    }

    #[test]
    fn test_rotate_about_matches_principal_axis() {
        let general = RotateAbout::new(0.7, Vector3::new(0.0, 2.0, 0.0));
        let principal = Rotate::y(0.7);
        assert!(close(&general.matrix(), &principal.matrix()));
    }

    #[test]
    fn test_cache_tracks_setters() {
        let r = Rotate::x(0.0);
        assert!(!r.is_cached());
        assert!(close(&r.matrix(), &Matrix4::identity()));
        assert!(r.is_cached());

        r.set_angle(FRAC_PI_2);
        assert!(!r.is_cached());
        assert!(close(&r.matrix(), &Rotate::x(FRAC_PI_2).matrix()));

        let first = r.matrix();
        let second = r.matrix();
        assert_eq!(first, second);
    }

    #[test]
    fn test_translate_and_scale_setters() {
        let t = Translate::new(Vector3::zeros());
        t.matrix();
        t.set_offset(Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(t.offset(), Vector3::new(0.0, 2.0, 0.0));
        assert!(close(
            &t.matrix(),
            &Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0))
        ));

        let s = Scale::uniform(1.0);
        s.matrix();
        s.set_factor(Vector3::new(2.0, 3.0, 4.0));
        let p = s.matrix().transform_vector(&Vector3::repeat(1.0));
        assert!((p - Vector3::new(2.0, 3.0, 4.0)).norm() < 1e-6);
    }

    #[test]
    fn test_rotate_about_set_axis_invalidates() {
        let r = RotateAbout::new(FRAC_PI_2, Vector3::z());
        r.matrix();
        r.set_axis(Vector3::x());
        assert!(!r.is_cached());
        assert!(close(&r.matrix(), &Rotate::x(FRAC_PI_2).matrix()));
    }

    #[test]
    fn test_apply_multiplies_on_the_right() {
        let left = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));
        let s = Scale::uniform(2.0);
        assert!(close(&s.apply(&left), &(left * s.matrix())));
    }

    #[test]
    fn test_combo_is_left_to_right_product() {
        let t = Translate::new(Vector3::new(1.0, 0.0, 0.0));
        let r = Rotate::z(FRAC_PI_4);
        let s = Scale::uniform(3.0);
        let combo = t.clone().then(r.clone()).then(s.clone());
        let expected = t.matrix() * r.matrix() * s.matrix();
        assert!(close(&combo.matrix(), &expected));
    }

    #[test]
    fn test_then_on_leaf_builds_new_combo() {
        let a = Translate::new(Vector3::x());
        let c1 = a.clone().then(Rotate::z(0.0));
        let c2 = a.clone().then(Rotate::z(0.0));
        assert!(!c1.as_combo().unwrap().ptr_eq(c2.as_combo().unwrap()));
        assert_eq!(c1.as_combo().unwrap().len(), 2);
    }

    #[test]
    fn test_then_on_combo_appends_in_place() {
        let a = Translate::new(Vector3::x());
        let b = Rotate::z(0.1);
        let c1 = a.then(b);
        let alias = c1.clone();

        let c2 = c1.clone().then(Scale::uniform(2.0));
        assert!(c2.as_combo().unwrap().ptr_eq(c1.as_combo().unwrap()));
        assert_eq!(alias.as_combo().unwrap().len(), 3);

        let c3 = alias.clone().then(Rotate::x(0.2));
        assert!(c3.as_combo().unwrap().ptr_eq(c1.as_combo().unwrap()));
        assert_eq!(c1.as_combo().unwrap().len(), 4);
        assert!(close(&c1.matrix(), &c3.matrix()));
    }

    #[test]
    fn test_shared_leaf_updates_every_chain() {
        let bend = Rotate::z(0.0);
        let left = Translate::new(Vector3::x()).then(bend.clone());
        let right = Translate::new(Vector3::y()).then(bend.clone());
        left.matrix();
        right.matrix();

        bend.set_angle(FRAC_PI_2);
        let expected_left = Matrix4::new_translation(&Vector3::<f32>::x()) * bend.matrix();
        let expected_right = Matrix4::new_translation(&Vector3::<f32>::y()) * bend.matrix();
        assert!(close(&left.matrix(), &expected_left));
        assert!(close(&right.matrix(), &expected_right));
    }

    #[test]
    fn test_constant_is_frozen() {
        let bend = Rotate::z(0.0);
        let frozen = Scale::new(Vector3::new(2.0, 1.0, 1.0))
            .then(bend.clone())
            .to_constant();
        let scale = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 1.0, 1.0));
        assert!(close(&frozen.matrix(), &scale));

        bend.set_angle(FRAC_PI_2);
        assert!(close(&frozen.matrix(), &scale));
    }

    #[test]
    fn test_constant_then_bend() {
        let bend = Rotate::z(0.0);
        let joint = Translate::new(Vector3::x()).to_constant().then(bend.clone());
        let found = joint.as_combo().unwrap().component(1).unwrap();
        assert!(found.as_rotate().unwrap().ptr_eq(&bend));
    }

    #[test]
    #[should_panic(expected = "cannot contain itself")]
    fn test_combo_rejects_itself() {
        let combo = Combo::new(Rotate::x(0.0), Rotate::y(0.0));
        combo.push(combo.clone());
    }

    #[test]
    #[should_panic(expected = "cannot contain itself")]
    fn test_combo_rejects_nested_self() {
        let outer = Combo::new(Rotate::x(0.0), Rotate::y(0.0));
        let inner = Combo::new(Rotate::z(0.0), outer.clone());
        outer.push(inner);
    }
}
