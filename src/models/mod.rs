pub mod checklist;
pub mod encounter;
pub mod enums;

pub use checklist::*;
pub use encounter::*;
pub use enums::*;
