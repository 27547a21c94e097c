mod builder;
mod command_kind;
mod context;
mod request;

pub use builder::*;
pub use command_kind::*;
pub use context::*;
pub use request::*;
