pub mod confidence;
pub mod step;

pub use confidence::*;
pub use step::*;
