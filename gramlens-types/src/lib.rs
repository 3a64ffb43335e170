pub mod enums;
pub mod models;
pub mod raw;

pub use enums::*;
pub use models::*;
pub use raw::*;
