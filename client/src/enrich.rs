//! Entity enrichment: fetch a parent list, then per-parent detail.
//!
//! Every parent costs one extra child fetch (the N+1 pattern); upstream has
//! no batch-detail endpoint. How those child fetches are scheduled is a
//! [`FanOut`] strategy. Results always come back in parent order.

use std::future::Future;
use std::num::NonZeroUsize;

use futures::{stream, StreamExt, TryStreamExt};
use serde_json::Value;

use crate::error::ParleyError;
use crate::normalize::RecordId;

/// Scheduling strategy for per-parent child fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FanOut {
    /// One child fetch at a time, in parent order.
    #[default]
    Sequential,
    /// Up to `n` child fetches in flight; results keep parent order.
    Bounded(NonZeroUsize),
}

impl FanOut {
    /// `Sequential` for a limit of 0 or 1, `Bounded` otherwise.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        match NonZeroUsize::new(limit) {
            Some(n) if n.get() > 1 => Self::Bounded(n),
            _ => Self::Sequential,
        }
    }

    /// Apply `f` to every input under this strategy, failing fast.
    ///
    /// # Errors
    /// Returns the first error any call produced; remaining calls are dropped.
    pub async fn try_map<I, T, F, Fut>(
        &self,
        inputs: Vec<I>,
        mut f: F,
    ) -> Result<Vec<T>, ParleyError>
    where
        F: FnMut(I) -> Fut,
        Fut: Future<Output = Result<T, ParleyError>>,
    {
        match self {
            Self::Sequential => {
                let mut out = Vec::with_capacity(inputs.len());
                for input in inputs {
                    out.push(f(input).await?);
                }
                Ok(out)
            }
            Self::Bounded(limit) => {
                stream::iter(inputs)
                    .map(f)
                    .buffered(limit.get())
                    .try_collect()
                    .await
            }
        }
    }
}

/// How a one-to-one detail record is merged into its parent.
#[derive(Debug, Clone, Copy)]
pub enum Merge<'a> {
    /// The detail replaces the parent outright.
    Replace,
    /// The detail is attached under the given field.
    Nest(&'a str),
    /// The listed fields are copied from the detail onto the parent. Every
    /// field must be present in the detail.
    Copy(&'a [&'a str]),
}

impl Merge<'_> {
    fn apply(self, parent: &mut Value, detail: Value) -> Result<(), ParleyError> {
        match self {
            Self::Replace => *parent = detail,
            Self::Nest(field) => {
                object_mut(parent, field)?.insert(field.to_string(), detail);
            }
            Self::Copy(fields) => {
                for field in fields {
                    let Some(value) = detail.get(*field) else {
                        return Err(ParleyError::malformed_record(field, "absent from detail"));
                    };
                    object_mut(parent, field)?.insert((*field).to_string(), value.clone());
                }
            }
        }
        Ok(())
    }
}

fn object_mut<'v>(
    record: &'v mut Value,
    field: &str,
) -> Result<&'v mut serde_json::Map<String, Value>, ParleyError> {
    record
        .as_object_mut()
        .ok_or_else(|| ParleyError::malformed_record(field, "record is not a JSON object"))
}

/// Read every parent's id up front so a bad parent fails before any child fetch.
///
/// # Errors
/// Returns [`ParleyError::MalformedRecord`] for the first parent without a
/// usable id.
pub fn parent_ids(parents: &[Value], id_field: &str) -> Result<Vec<RecordId>, ParleyError> {
    parents
        .iter()
        .map(|parent| RecordId::from_record(parent, id_field))
        .collect()
}

/// One-to-one enrichment: fetch detail for each parent and merge it in.
///
/// # Errors
/// Fails fast on the first id or fetch error, or on a detail missing a field
/// that `merge` copies; no partial list is returned.
pub async fn enrich_each<F, Fut>(
    mut parents: Vec<Value>,
    id_field: &str,
    merge: Merge<'_>,
    fan_out: &FanOut,
    fetch: F,
) -> Result<Vec<Value>, ParleyError>
where
    F: FnMut(RecordId) -> Fut,
    Fut: Future<Output = Result<Value, ParleyError>>,
{
    let ids = parent_ids(&parents, id_field)?;
    let details = fan_out.try_map(ids, fetch).await?;
    for (parent, detail) in parents.iter_mut().zip(details) {
        merge.apply(parent, detail)?;
    }
    Ok(parents)
}

/// One-to-many enrichment: fetch each parent's children, tag every child with
/// the parent's id under `tag_field`, and flatten in parent-then-child order.
///
/// The tag carries the id exactly as the parent's JSON held it.
///
/// # Errors
/// Fails fast on the first id or fetch error, or on a child that is not an object.
pub async fn flatten_tagged<F, Fut>(
    parents: &[Value],
    id_field: &str,
    tag_field: &str,
    fan_out: &FanOut,
    fetch: F,
) -> Result<Vec<Value>, ParleyError>
where
    F: FnMut(RecordId) -> Fut,
    Fut: Future<Output = Result<Vec<Value>, ParleyError>>,
{
    let ids = parent_ids(parents, id_field)?;
    let tags: Vec<Value> = ids.iter().map(RecordId::to_json).collect();
    let children = fan_out.try_map(ids, fetch).await?;

    let mut flattened = Vec::with_capacity(children.iter().map(Vec::len).sum());
    for (tag, group) in tags.into_iter().zip(children) {
        for mut child in group {
            object_mut(&mut child, tag_field)?.insert(tag_field.to_string(), tag.clone());
            flattened.push(child);
        }
    }
    Ok(flattened)
}
