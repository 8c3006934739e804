//! Behavior tables: the rules deciding which mutations are legal.
//!
//! [`ContainerPolicy`] governs capacity and permissions per container kind;
//! [`ItemPolicy`] governs stacking and equip cardinality per item kind. Both
//! are read-only after startup and looked up through [`BehaviorTables`].
mod behavior;
mod container;
mod error;
mod item;
mod tables;

pub use behavior::{EquipBehavior, EquipBehaviors, NoEffect, TimedBooster};
pub use container::ContainerPolicy;
pub use error::PolicyError;
pub use item::{EquipAction, ItemPolicy};
pub use tables::{BehaviorTables, BehaviorTablesBuilder};
