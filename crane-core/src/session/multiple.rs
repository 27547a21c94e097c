use crate::{Connection, Entity, QueryFilter, QueryOptions, Result, Session};
use std::{future::Future, marker::PhantomData};

/// One read of a [`Session::query_multiple`] composition.
pub struct EntityQuery<E> {
    pub filter: QueryFilter,
    pub options: QueryOptions,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityQuery<E> {
    pub fn new(filter: impl Into<QueryFilter>) -> Self {
        Self {
            filter: filter.into(),
            options: Default::default(),
            entity: PhantomData,
        }
    }
    pub fn all() -> Self {
        Self::new(QueryFilter::None)
    }
    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }
}

/// Tuple of two to four [`EntityQuery`], read in order into a tuple of vectors.
pub trait QueryMultiple {
    type Output;
    fn query<C: Connection>(
        self,
        session: &mut Session<'_, C>,
    ) -> impl Future<Output = Result<Self::Output>>;
}

macro_rules! impl_query_multiple {
    ($($entity:ident $query:ident),+) => {
        impl<$($entity: Entity),+> QueryMultiple for ($(EntityQuery<$entity>,)+) {
            type Output = ($(Vec<$entity>,)+);
            async fn query<C: Connection>(self, session: &mut Session<'_, C>) -> Result<Self::Output> {
                let ($($query,)+) = self;
                Ok(($(
                    session
                        .query::<$entity>($query.filter, $query.options)
                        .await?,
                )+))
            }
        }
    };
}

impl_query_multiple!(A a, B b);
impl_query_multiple!(A a, B b, C2 c);
impl_query_multiple!(A a, B b, C2 c, D d);

impl<'s, C: Connection> Session<'s, C> {
    /// Reads several entity types in one call, each query going through the caches like [`Session::query`].
    pub async fn query_multiple<Q: QueryMultiple>(&mut self, queries: Q) -> Result<Q::Output> {
        queries.query(self).await
    }
}
