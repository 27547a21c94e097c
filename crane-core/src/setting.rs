/// Naming and capability conventions of a database provider.
pub trait DbSetting: Send + Sync {
    fn opening_quote(&self) -> &str {
        "\""
    }
    fn closing_quote(&self) -> &str {
        "\""
    }
    /// Prefix of named placeholders.
    fn parameter_prefix(&self) -> &str {
        "@"
    }
    /// Schema used when the entity declares none.
    fn default_schema(&self) -> Option<&str> {
        None
    }
    /// Table name of a type without an explicit mapping.
    fn table_name(&self, type_name: &str) -> String {
        type_name.to_string()
    }
    /// Whether one command can carry several statements, which the batched updates require.
    fn supports_multiple_statements(&self) -> bool {
        true
    }
    /// Highest number of parameters a single command can bind.
    fn max_parameters(&self) -> usize {
        2100
    }
}

/// Quotes identifiers with `"`, named `@` placeholders, type names kept as they are.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericDbSetting;

impl DbSetting for GenericDbSetting {}
