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

/// Provider key of PostgreSQL connections.
pub const PROVIDER: &str = "postgres";

/// Registers the PostgreSQL capabilities, `force` replaces the ones already present.
pub fn register(registry: &Registry, force: bool) -> Result<()> {
    registry.register(
        PROVIDER,
        Capabilities::new(
            Arc::new(PostgresDbSetting),
            Arc::new(PostgresDbHelper),
            Arc::new(PostgresStatementBuilder),
        )
        .validator(Arc::new(PostgresDbValidator)),
        force,
    )?;
    log::debug!("Registered the `{PROVIDER}` capabilities");
    Ok(())
}
