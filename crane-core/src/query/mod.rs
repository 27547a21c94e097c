mod operation;
mod order_field;
mod query_field;
mod query_group;

pub use operation::*;
pub use order_field::*;
pub use query_field::*;
pub use query_group::*;
