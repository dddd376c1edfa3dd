//! Error types for hierarchy construction, pose parsing and rig control
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("root part `{0}` cannot have a parent")]
    RootCannotHaveParent(String),
    #[error("part `{child}` is already attached to `{parent}`")]
    AlreadyAttached { child: String, parent: String },
    #[error("attaching `{child}` under `{parent}` would create a cycle")]
    WouldCreateCycle { child: String, parent: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PoseError {
    #[error("invalid pose syntax near `{0}`")]
    Syntax(String),
    #[error("angle for `{0}` is not finite")]
    NonFinite(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RigError {
    #[error("unknown joint `{0}`")]
    UnknownJoint(String),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

pub type Result<T, E = RigError> = std::result::Result<T, E>;
