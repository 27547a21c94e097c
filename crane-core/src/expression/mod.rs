mod filter;
mod op;
mod predicate;

pub use filter::*;
pub use op::*;
pub use predicate::*;
