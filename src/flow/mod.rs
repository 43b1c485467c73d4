pub mod conversion;
pub mod definition;
mod document;

pub use conversion::*;
pub use definition::*;
