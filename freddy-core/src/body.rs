//! Hierarchical body parts
//!
//! A `BodyPart` owns one [`Transform`] relative to its parent and a list of
//! children. Parents hold their children strongly and children point back
//! through a weak link, so a tree is dropped together with its root.
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use nalgebra::{Matrix4, Point3};
use tracing::debug;

use crate::draw::Drawable;
use crate::error::HierarchyError;
use crate::transform::{Parametrized, Transform};

/// A root never gains a parent; a regular part gains at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Regular,
    Root,
}

struct PartState {
    name: String,
    kind: NodeKind,
    transform: Transform,
    local_position: Point3<f32>,
    parent: Weak<RefCell<PartState>>,
    children: Vec<BodyPart>,
    drawable: Option<Rc<dyn Drawable>>,
}

/// Shared handle to a node of a body-part tree.
#[derive(Clone)]
pub struct BodyPart(Rc<RefCell<PartState>>);

impl BodyPart {
    /// An unattached regular part with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name.into(), NodeKind::Regular)
    }

    pub fn root(name: impl Into<String>) -> Self {
        Self::with_kind(name.into(), NodeKind::Root)
    }

    pub fn root_with_transform(name: impl Into<String>, transform: impl Into<Transform>) -> Self {
        let root = Self::root(name);
        root.set_transform(transform);
        root
    }

    fn with_kind(name: String, kind: NodeKind) -> Self {
        Self(Rc::new(RefCell::new(PartState {
            name,
            kind,
            transform: Transform::Identity,
            local_position: Point3::origin(),
            parent: Weak::new(),
            children: Vec::new(),
            drawable: None,
        })))
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn kind(&self) -> NodeKind {
        self.0.borrow().kind
    }

    pub fn is_root(&self) -> bool {
        self.kind() == NodeKind::Root
    }

    /// Handle to the local transform. Leaves inside it stay shared.
    pub fn transform(&self) -> Transform {
        self.0.borrow().transform.clone()
    }

    pub fn set_transform(&self, transform: impl Into<Transform>) {
        self.0.borrow_mut().transform = transform.into();
    }

    /// Point of interest in the part's own frame. Not animated by the
    /// part's transform.
    pub fn local_position(&self) -> Point3<f32> {
        self.0.borrow().local_position
    }

    pub fn set_local_position(&self, position: Point3<f32>) {
        self.0.borrow_mut().local_position = position;
    }

    pub fn drawable(&self) -> Option<Rc<dyn Drawable>> {
        self.0.borrow().drawable.clone()
    }

    pub fn set_drawable(&self, drawable: impl Drawable + 'static) {
        self.0.borrow_mut().drawable = Some(Rc::new(drawable));
    }

    pub fn share_drawable(&self, drawable: Rc<dyn Drawable>) {
        self.0.borrow_mut().drawable = Some(drawable);
    }

    pub fn parent(&self) -> Option<BodyPart> {
        self.0.borrow().parent.upgrade().map(BodyPart)
    }

    /// Children in insertion order.
    pub fn children(&self) -> Vec<BodyPart> {
        self.0.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    pub fn ptr_eq(&self, other: &BodyPart) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Links `self` under `parent`, appending it to the parent's children.
    /// Attachment is permanent.
    pub fn set_parent(&self, parent: &BodyPart) -> Result<(), HierarchyError> {
        if self.is_root() {
            return Err(HierarchyError::RootCannotHaveParent(self.name()));
        }
        if let Some(current) = self.parent() {
            return Err(HierarchyError::AlreadyAttached {
                child: self.name(),
                parent: current.name(),
            });
        }
        if self.ptr_eq(parent) || self.is_ancestor_of(parent) {
            return Err(HierarchyError::WouldCreateCycle {
                child: self.name(),
                parent: parent.name(),
            });
        }

        self.0.borrow_mut().parent = Rc::downgrade(&parent.0);
        parent.0.borrow_mut().children.push(self.clone());
        debug!(child = %self.name(), parent = %parent.name(), "attached body part");
        Ok(())
    }

    /// Same as `child.set_parent(self)`.
    pub fn add_child(&self, child: &BodyPart) -> Result<(), HierarchyError> {
        child.set_parent(self)
    }

    /// True if `self` appears on the parent chain of `other`.
    pub fn is_ancestor_of(&self, other: &BodyPart) -> bool {
        let mut cursor = other.parent();
        while let Some(part) = cursor {
            if part.ptr_eq(self) {
                return true;
            }
            cursor = part.parent();
        }
        false
    }

    pub fn local_matrix(&self) -> Matrix4<f32> {
        self.0.borrow().transform.matrix()
    }

    /// `parent.world_matrix() * self.local_matrix()`, or just the local
    /// matrix for a root. An unattached regular part is its own frame.
    pub fn world_matrix(&self) -> Matrix4<f32> {
        let (parent, local) = {
            let state = self.0.borrow();
            (state.parent.upgrade(), state.transform.matrix())
        };
        match parent {
            Some(parent) => BodyPart(parent).world_matrix() * local,
            None => local,
        }
    }

    pub fn world_position(&self) -> Point3<f32> {
        self.world_matrix().transform_point(&self.local_position())
    }

    /// Depth-first search by name, starting at `self`.
    pub fn find(&self, name: &str) -> Option<BodyPart> {
        if self.0.borrow().name == name {
            return Some(self.clone());
        }
        self.children().iter().find_map(|child| child.find(name))
    }

    /// Pre-order depth-first traversal, children in insertion order.
    pub fn visit<F: FnMut(&BodyPart)>(&self, f: &mut F) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    /// Like [`visit`](Self::visit), but also hands each part its world
    /// matrix, computed top-down once for the whole subtree.
    pub fn walk<F: FnMut(&BodyPart, &Matrix4<f32>)>(&self, f: &mut F) {
        let base = match self.parent() {
            Some(parent) => parent.world_matrix(),
            None => Matrix4::identity(),
        };
        self.walk_from(&base, f);
    }

    fn walk_from<F: FnMut(&BodyPart, &Matrix4<f32>)>(&self, parent_world: &Matrix4<f32>, f: &mut F) {
        let world = parent_world * self.local_matrix();
        f(self, &world);
        for child in self.children() {
            child.walk_from(&world, f);
        }
    }
}

impl fmt::Debug for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.borrow();
        f.debug_struct("BodyPart")
            .field("name", &state.name)
            .field("kind", &state.kind)
            .field("transform", &state.transform)
            .field("local_position", &state.local_position)
            .field("children", &state.children)
            .finish()
    }
}
