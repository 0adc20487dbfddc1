mod digit;
mod vertex;

pub use digit::*;
pub use vertex::*;
