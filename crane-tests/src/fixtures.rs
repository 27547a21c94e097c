use crane::Entity;

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[crane(table = "customers")]
pub struct Customer {
    #[crane(primary_key, identity)]
    pub id: i64,
    pub name: String,
    #[crane(name = "email_address")]
    pub email: Option<String>,
    pub age: i32,
}

/// Keyed by naming convention, table named after the type.
#[derive(Entity, Debug, Default, Clone, PartialEq)]
pub struct Sku {
    pub sku_id: String,
    pub label: String,
    pub price: f64,
}

/// No key at all.
#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[crane(table = "audit_log")]
pub struct AuditEntry {
    pub message: String,
    pub level: i32,
}

impl Customer {
    pub fn named(name: &str, age: i32) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            age,
        }
    }
}
