mod builder;
mod helper;
mod setting;
mod validator;

pub use builder::*;
pub use helper::*;
pub use setting::*;
pub use validator::*;

use crane_core::{Capabilities, Registry, Result};
use std::sync::Arc;

/// Provider key of SQLite connections.
pub const PROVIDER: &str = "sqlite";

/// Registers the SQLite capabilities, `force` replaces the ones already present.
pub fn register(registry: &Registry, force: bool) -> Result<()> {
    registry.register(
        PROVIDER,
        Capabilities::new(
            Arc::new(SqliteDbSetting),
            Arc::new(SqliteDbHelper),
            Arc::new(SqliteStatementBuilder),
        )
        .validator(Arc::new(SqliteDbValidator)),
        force,
    )?;
    log::debug!("Registered the `{PROVIDER}` capabilities");
    Ok(())
}
