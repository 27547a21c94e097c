mod as_value;
mod blocking;
mod cache;
mod command;
mod connection;
mod db_field;
mod engine;
mod entity;
mod error;
mod execution;
mod expression;
mod field;
mod helper;
mod metadata;
mod query;
mod record;
mod registry;
mod result_cache;
mod session;
mod setting;
mod statement;
mod trace;
mod util;
mod validator;
mod value;

pub use as_value::*;
pub use blocking::*;
pub use cache::*;
pub use command::*;
pub use connection::*;
pub use db_field::*;
pub use engine::*;
pub use entity::*;
pub use error::*;
pub use execution::*;
pub use expression::*;
pub use field::*;
pub use helper::*;
pub use metadata::*;
pub use query::*;
pub use record::*;
pub use registry::*;
pub use result_cache::*;
pub use session::*;
pub use setting::*;
pub use statement::*;
pub use trace::*;
pub use util::*;
pub use validator::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
