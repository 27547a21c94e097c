mod context;
mod factory;

pub use context::*;
pub use factory::*;
