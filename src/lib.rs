//! arcade-physics: discrete-time 2D rigid-body physics (impulse solver, spatial hash, sleeping)

pub mod types;
pub mod api;
pub mod world;
pub mod narrowphase;
pub mod math;
pub mod shape;
pub mod body;
pub mod grid;
pub mod solver;
pub mod constraint;
pub mod rope;
pub mod spring;
pub mod error;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::world::PhysicsWorld;
pub use crate::body::{BodyDesc, RigidBody};
pub use crate::shape::{Collider, Material, MassProperties, Shape};
pub use crate::math::{Aabb, Vec2Ext};
pub use crate::constraint::Constraint;
pub use crate::grid::{GridStats, SpatialHash};
pub use crate::narrowphase::Narrowphase;
pub use crate::rope::{RopePoint, VerletRope};
pub use crate::spring::{Spring1D, Spring2D};
pub use crate::error::PhysicsError;

pub use glam::Vec2;
