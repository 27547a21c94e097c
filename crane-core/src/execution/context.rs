use crate::{
    CommandKind, DbField, Field, Getter, Parameter, Result, Setter, Value, batch_parameters,
};
use std::{fmt, sync::Arc};

/// Placeholder fed by one compiled getter.
pub struct Binding<T> {
    /// Base name, the name of each row comes from [`batch_parameters`].
    pub parameter: String,
    pub getter: Getter<T>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            parameter: self.parameter.clone(),
            getter: self.getter.clone(),
        }
    }
}

/// Compiled plan to bind instances of `T` to a generated statement and write the returned key back.
///
/// Holds closures only, never an instance of `T`, and is shared by every execution of the same shape.
pub struct ExecutionContext<T> {
    pub command_text: Arc<str>,
    pub kind: CommandKind,
    /// Bound columns, in statement order.
    pub fields: Arc<[Field]>,
    pub batch_size: usize,
    pub primary: Option<DbField>,
    pub identity: Option<DbField>,
    bindings: Arc<[Binding<T>]>,
    names: Arc<[Vec<String>]>,
    writeback: Option<Setter<T>>,
}

impl<T> ExecutionContext<T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        command_text: Arc<str>,
        kind: CommandKind,
        fields: Vec<Field>,
        batch_size: usize,
        primary: Option<DbField>,
        identity: Option<DbField>,
        bindings: Vec<Binding<T>>,
        writeback: Option<Setter<T>>,
    ) -> Self {
        let names = batch_parameters(
            &bindings.iter().map(|v| v.parameter.as_str()).collect::<Vec<_>>(),
            batch_size,
        );
        Self {
            command_text,
            kind,
            fields: fields.into(),
            batch_size,
            primary,
            identity,
            bindings: bindings.into(),
            names: names.into(),
            writeback,
        }
    }

    pub fn bindings(&self) -> &[Binding<T>] {
        &self.bindings
    }

    pub fn has_writeback(&self) -> bool {
        self.writeback.is_some()
    }

    /// Parameters of `items`, the i-th item binding the placeholders of row i.
    pub fn parameters<'a>(&self, items: impl IntoIterator<Item = &'a T>) -> Vec<Parameter>
    where
        T: 'a,
    {
        let items = items.into_iter().collect::<Vec<_>>();
        let longer;
        let names = if items.len() > self.names.len() {
            longer = batch_parameters(
                &self.bindings.iter().map(|v| v.parameter.as_str()).collect::<Vec<_>>(),
                items.len(),
            );
            &longer[..]
        } else {
            &self.names[..]
        };
        items
            .into_iter()
            .zip(names)
            .flat_map(|(item, names)| {
                self.bindings.iter().zip(names).map(move |(binding, name)| {
                    Parameter::new(name.clone(), (binding.getter)(item))
                })
            })
            .collect()
    }

    /// Stores the key returned by the database, a no op when nothing is written back.
    pub fn writeback(&self, item: &mut T, value: Value) -> Result<()> {
        match &self.writeback {
            Some(setter) => setter(item, value),
            None => Ok(()),
        }
    }

    /// Same plan bound to another text.
    pub fn with_command_text(&self, command_text: Arc<str>) -> Self {
        Self {
            command_text,
            kind: self.kind,
            fields: self.fields.clone(),
            batch_size: self.batch_size,
            primary: self.primary.clone(),
            identity: self.identity.clone(),
            bindings: self.bindings.clone(),
            names: self.names.clone(),
            writeback: self.writeback.clone(),
        }
    }
}

impl<T> fmt::Debug for ExecutionContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("command_text", &self.command_text)
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .field("batch_size", &self.batch_size)
            .field(
                "bindings",
                &self
                    .bindings
                    .iter()
                    .map(|v| v.parameter.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("writeback", &self.writeback.is_some())
            .finish()
    }
}
