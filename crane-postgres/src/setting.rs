use convert_case::{Case, Casing};
use crane_core::DbSetting;

#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresDbSetting;

impl DbSetting for PostgresDbSetting {
    fn parameter_prefix(&self) -> &str {
        "$"
    }
    fn default_schema(&self) -> Option<&str> {
        Some("public")
    }
    fn table_name(&self, type_name: &str) -> String {
        type_name.to_case(Case::Snake)
    }
    /// Parameterized commands go through the extended protocol, one statement each.
    fn supports_multiple_statements(&self) -> bool {
        false
    }
    fn max_parameters(&self) -> usize {
        u16::MAX as usize
    }
}
