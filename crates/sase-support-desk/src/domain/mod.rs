//! Domain layer
pub mod value_objects;
pub mod aggregates;
pub mod events;
pub mod services;

pub use events::{ChangeEvent, ChangeKind, Collection};
