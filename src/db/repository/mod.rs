//! Repository layer: entity-scoped database operations.

mod encounter;

pub use encounter::*;
