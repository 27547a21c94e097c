use convert_case::{Case, Casing};
use crane_core::DbSetting;

#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteDbSetting;

impl DbSetting for SqliteDbSetting {
    fn table_name(&self, type_name: &str) -> String {
        type_name.to_case(Case::Snake)
    }
    /// A prepared statement holds a single SQL statement.
    fn supports_multiple_statements(&self) -> bool {
        false
    }
    /// `SQLITE_MAX_VARIABLE_NUMBER` of builds older than 3.32.
    fn max_parameters(&self) -> usize {
        999
    }
}
