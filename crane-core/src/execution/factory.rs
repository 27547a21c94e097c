use crate::{
    Bindable, Binding, CommandKind, CommandRequest, DbField, EntityMetadata, Error,
    ExecutionContext, Field, Result, sanitize_parameter,
};
use std::{any::type_name, sync::Arc};

/// Compiles the binding plan of the writing commands.
pub struct ExecutionContextFactory;

impl ExecutionContextFactory {
    pub fn create<T: Bindable>(
        request: &CommandRequest,
        metadata: &EntityMetadata,
        command_text: Arc<str>,
    ) -> Result<ExecutionContext<T>> {
        use CommandKind::*;
        let mut bindings = request
            .fields
            .iter()
            .map(|field| Self::binding(metadata, field, sanitize_parameter(field.name())))
            .collect::<Result<Vec<Binding<T>>>>()?;
        let writeback = match request.kind {
            Insert | InsertAll => Self::writeback(metadata, request.identity)?,
            Merge | MergeAll => Self::writeback(metadata, request.identity.or(request.primary))?,
            Update | UpdateAll => {
                for field in request.qualifiers {
                    bindings.push(Self::binding(
                        metadata,
                        field,
                        format!("_{}", sanitize_parameter(field.name())),
                    )?);
                }
                None
            }
            kind => {
                return Err(Error::mapping(format!(
                    "{kind} does not bind instances of `{}`",
                    type_name::<T>()
                )));
            }
        };
        Ok(ExecutionContext::new(
            command_text,
            request.kind,
            request.fields.to_vec(),
            request.batch_size,
            request.primary.cloned(),
            request.identity.cloned(),
            bindings,
            writeback,
        ))
    }

    fn property<'a>(metadata: &'a EntityMetadata, field: &'a Field) -> &'a str {
        metadata
            .column_named(field.name())
            .map(|v| v.property.as_ref())
            .unwrap_or(field.name())
    }

    fn binding<T: Bindable>(
        metadata: &EntityMetadata,
        field: &Field,
        parameter: String,
    ) -> Result<Binding<T>> {
        let property = Self::property(metadata, field);
        let getter = T::getter(property).ok_or_else(|| {
            Error::mapping(format!(
                "`{}` has no property `{property}` to bind column `{}` of `{}`",
                type_name::<T>(),
                field.name(),
                metadata.table
            ))
        })?;
        Ok(Binding { parameter, getter })
    }

    fn writeback<T: Bindable>(
        metadata: &EntityMetadata,
        key: Option<&DbField>,
    ) -> Result<Option<crate::Setter<T>>> {
        let Some(key) = key else {
            return Ok(None);
        };
        let property = metadata.property_of(key).unwrap_or(&key.name);
        T::setter(property).map(Some).ok_or_else(|| {
            Error::mapping(format!(
                "`{}` has no property `{property}` to receive key `{}` of `{}`",
                type_name::<T>(),
                key.name,
                metadata.table
            ))
        })
    }
}
