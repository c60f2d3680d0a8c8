pub mod document;
pub mod enums;
pub mod finding;

pub use document::*;
pub use enums::*;
pub use finding::*;
