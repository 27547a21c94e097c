pub use crane_core::*;
pub use crane_macros::*;
