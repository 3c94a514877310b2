pub mod parse;
pub mod qa_filter;
pub mod rank;
pub mod segment;

pub use parse::*;
pub use qa_filter::*;
pub use rank::*;
pub use segment::*;
