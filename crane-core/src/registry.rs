use crate::{
    DbHelper, DbSetting, DbValidator, Entity, Error, GenericDbHelper, GenericDbSetting,
    GenericDbValidator, GenericStatementBuilder, Result, StatementBuilder,
};
use parking_lot::RwLock;
use std::{any::TypeId, collections::HashMap, hash::Hash, sync::Arc};

/// Provider key of the capabilities registered by [`Registry::with_generic`].
pub const GENERIC_PROVIDER: &str = "generic";

/// Every capability of one provider, registered together by [`Registry::register`].
#[derive(Clone)]
pub struct Capabilities {
    pub setting: Arc<dyn DbSetting>,
    pub helper: Arc<dyn DbHelper>,
    pub builder: Arc<dyn StatementBuilder>,
    pub validator: Arc<dyn DbValidator>,
}

impl Capabilities {
    /// Capabilities accepting every bound value.
    pub fn new(
        setting: Arc<dyn DbSetting>,
        helper: Arc<dyn DbHelper>,
        builder: Arc<dyn StatementBuilder>,
    ) -> Self {
        Self {
            setting,
            helper,
            builder,
            validator: Arc::new(GenericDbValidator),
        }
    }
    pub fn validator(mut self, validator: Arc<dyn DbValidator>) -> Self {
        self.validator = validator;
        self
    }
    pub fn generic() -> Self {
        Self::new(
            Arc::new(GenericDbSetting),
            Arc::new(GenericDbHelper),
            Arc::new(GenericStatementBuilder),
        )
    }
}

/// Capabilities by provider and mapping overrides by type.
///
/// Written at startup, read by every operation. Registering a key already present fails with
/// [`Error::AlreadyRegistered`] unless `force` is set, in which case the new value replaces the old one. Each map
/// is guarded by its own lock, so among racing registrations of the same key exactly one succeeds without `force`.
/// [`Registry::register`] holds the locks of the four capability maps at once: it writes all of them or none.
#[derive(Default)]
pub struct Registry {
    settings: RwLock<HashMap<String, Arc<dyn DbSetting>>>,
    helpers: RwLock<HashMap<String, Arc<dyn DbHelper>>>,
    builders: RwLock<HashMap<String, Arc<dyn StatementBuilder>>>,
    validators: RwLock<HashMap<String, Arc<dyn DbValidator>>>,
    tables: RwLock<HashMap<TypeId, String>>,
    columns: RwLock<HashMap<(TypeId, String), String>>,
    primaries: RwLock<HashMap<TypeId, String>>,
    identities: RwLock<HashMap<TypeId, String>>,
}

fn add<K, V>(
    map: &RwLock<HashMap<K, V>>,
    key: K,
    value: V,
    force: bool,
    capability: &'static str,
    describe: impl FnOnce(&K) -> String,
) -> Result<()>
where
    K: Eq + Hash,
{
    let mut map = map.write();
    if !force && map.contains_key(&key) {
        return Err(Error::AlreadyRegistered {
            capability,
            key: describe(&key),
        }
        .into());
    }
    map.insert(key, value);
    Ok(())
}

fn get<V: Clone>(
    map: &RwLock<HashMap<String, V>>,
    provider: &str,
    capability: &'static str,
) -> Result<V> {
    map.read().get(provider).cloned().ok_or_else(|| {
        Error::UnsupportedProvider {
            provider: provider.to_string(),
            capability,
        }
        .into()
    })
}

impl Registry {
    /// Empty registry, every provider must be registered before use.
    pub fn new() -> Self {
        Default::default()
    }

    /// Registry knowing the [`GENERIC_PROVIDER`].
    pub fn with_generic() -> Self {
        let result = Self::new();
        if let Err(error) = result.register(GENERIC_PROVIDER, Capabilities::generic(), false) {
            log::error!("{error:#}");
        }
        result
    }

    /// Registers every capability of `provider` at once. Without `force` nothing is written when any of them is
    /// already present.
    pub fn register(&self, provider: &str, capabilities: Capabilities, force: bool) -> Result<()> {
        let mut settings = self.settings.write();
        let mut helpers = self.helpers.write();
        let mut builders = self.builders.write();
        let mut validators = self.validators.write();
        if !force {
            let present = [
                ("db setting", settings.contains_key(provider)),
                ("db helper", helpers.contains_key(provider)),
                ("statement builder", builders.contains_key(provider)),
                ("db validator", validators.contains_key(provider)),
            ];
            if let Some((capability, _)) = present.into_iter().find(|(_, present)| *present) {
                return Err(Error::AlreadyRegistered {
                    capability,
                    key: provider.to_string(),
                }
                .into());
            }
        }
        settings.insert(provider.to_string(), capabilities.setting);
        helpers.insert(provider.to_string(), capabilities.helper);
        builders.insert(provider.to_string(), capabilities.builder);
        validators.insert(provider.to_string(), capabilities.validator);
        Ok(())
    }

    pub fn add_setting(&self, provider: &str, setting: Arc<dyn DbSetting>, force: bool) -> Result<()> {
        add(&self.settings, provider.to_string(), setting, force, "db setting", String::clone)
    }
    pub fn add_helper(&self, provider: &str, helper: Arc<dyn DbHelper>, force: bool) -> Result<()> {
        add(&self.helpers, provider.to_string(), helper, force, "db helper", String::clone)
    }
    pub fn add_builder(
        &self,
        provider: &str,
        builder: Arc<dyn StatementBuilder>,
        force: bool,
    ) -> Result<()> {
        add(&self.builders, provider.to_string(), builder, force, "statement builder", String::clone)
    }
    pub fn add_validator(
        &self,
        provider: &str,
        validator: Arc<dyn DbValidator>,
        force: bool,
    ) -> Result<()> {
        add(&self.validators, provider.to_string(), validator, force, "db validator", String::clone)
    }

    pub fn setting(&self, provider: &str) -> Result<Arc<dyn DbSetting>> {
        get(&self.settings, provider, "db setting")
    }
    pub fn helper(&self, provider: &str) -> Result<Arc<dyn DbHelper>> {
        get(&self.helpers, provider, "db helper")
    }
    pub fn builder(&self, provider: &str) -> Result<Arc<dyn StatementBuilder>> {
        get(&self.builders, provider, "statement builder")
    }
    /// Validator of `provider`, one accepting every value when none is registered.
    pub fn validator(&self, provider: &str) -> Arc<dyn DbValidator> {
        self.validators
            .read()
            .get(provider)
            .cloned()
            .unwrap_or_else(|| Arc::new(GenericDbValidator))
    }

    pub fn map_table<E: Entity>(&self, name: impl Into<String>, force: bool) -> Result<()> {
        add(&self.tables, TypeId::of::<E>(), name.into(), force, "table mapping", |_| {
            E::type_name().to_string()
        })
    }
    /// Column of `property` in `E`.
    pub fn map_column<E: Entity>(
        &self,
        property: &str,
        column: impl Into<String>,
        force: bool,
    ) -> Result<()> {
        add(
            &self.columns,
            (TypeId::of::<E>(), property.to_string()),
            column.into(),
            force,
            "column mapping",
            |(_, property)| format!("{}::{property}", E::type_name()),
        )
    }
    pub fn map_primary<E: Entity>(&self, property: &str, force: bool) -> Result<()> {
        add(&self.primaries, TypeId::of::<E>(), property.to_string(), force, "primary mapping", |_| {
            E::type_name().to_string()
        })
    }
    pub fn map_identity<E: Entity>(&self, property: &str, force: bool) -> Result<()> {
        add(&self.identities, TypeId::of::<E>(), property.to_string(), force, "identity mapping", |_| {
            E::type_name().to_string()
        })
    }

    pub fn table_of(&self, type_id: TypeId) -> Option<String> {
        self.tables.read().get(&type_id).cloned()
    }
    pub fn column_of(&self, type_id: TypeId, property: &str) -> Option<String> {
        self.columns
            .read()
            .get(&(type_id, property.to_string()))
            .cloned()
    }
    pub fn primary_of(&self, type_id: TypeId) -> Option<String> {
        self.primaries.read().get(&type_id).cloned()
    }
    pub fn identity_of(&self, type_id: TypeId) -> Option<String> {
        self.identities.read().get(&type_id).cloned()
    }

    /// Drops every type override of `E`.
    pub fn unmap<E: Entity>(&self) {
        let type_id = TypeId::of::<E>();
        self.tables.write().remove(&type_id);
        self.columns.write().retain(|(t, _), _| *t != type_id);
        self.primaries.write().remove(&type_id);
        self.identities.write().remove(&type_id);
    }
}
