use crate::{Parameter, Result};

/// Type rules of a database provider, checked on every bound value before a command is sent.
///
/// A rejected value fails the operation with [`crate::Error::InvalidValue`] and the connection is never touched.
pub trait DbValidator: Send + Sync {
    fn validate(&self, _parameter: &Parameter) -> Result<()> {
        Ok(())
    }
}

/// Accepts every value.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericDbValidator;

impl DbValidator for GenericDbValidator {}
