//! Pagination strategies.
//!
//! The strategy is part of a [`ResourceApi`](super::ResourceApi)'s type, so
//! list iteration for each kind is fixed at compile time.

use serde_json::Value;

use super::error::{ApiError, Result};
use super::transport::Query;

/// How a collection is paged.
pub trait Pagination: Send + Sync + 'static {
    /// Position of a page within the collection.
    type Cursor: Clone + std::fmt::Debug + Send + Sync;

    /// Adds the cursor (if any) to a list query.
    fn apply(query: &mut Query, cursor: Option<&Self::Cursor>);

    /// Returns the cursor of the following page, or `None` on the last one.
    fn next_cursor(
        body: &Value,
        cursor: Option<&Self::Cursor>,
        returned: usize,
    ) -> Option<Self::Cursor>;
}

/// Numeric offset paging driven by `query.offset`, `query.length` and
/// `query.found`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offset;

/// Opaque cursor paging: the server returns `query.next` and expects it back
/// as the `next` parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keyset;

/// The whole collection comes back as one bare array.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpaged;

impl Pagination for Offset {
    type Cursor = usize;

    fn apply(query: &mut Query, cursor: Option<&usize>) {
        if let Some(offset) = cursor {
            query.set("offset", offset);
        }
    }

    fn next_cursor(body: &Value, cursor: Option<&usize>, returned: usize) -> Option<usize> {
        if returned == 0 {
            return None;
        }

        let meta = body.get("query");
        let number = |key: &str| {
            meta.and_then(|m| m.get(key))
                .and_then(Value::as_u64)
                .map(|n| n as usize)
        };

        let offset = number("offset").or(cursor.copied()).unwrap_or(0);
        let length = number("length").unwrap_or(returned);
        let found = number("found").or_else(|| number("total"))?;

        let next = offset + length.max(returned);
        (next < found).then_some(next)
    }
}

impl Pagination for Keyset {
    type Cursor = String;

    fn apply(query: &mut Query, cursor: Option<&String>) {
        if let Some(next) = cursor {
            query.set("next", next);
        }
    }

    fn next_cursor(body: &Value, cursor: Option<&String>, _returned: usize) -> Option<String> {
        let next = body
            .get("query")
            .and_then(|m| m.get("next"))
            .and_then(Value::as_str)
            .filter(|next| !next.is_empty())?;

        // A server repeating the cursor would loop forever.
        if cursor.map(String::as_str) == Some(next) {
            return None;
        }
        Some(next.to_string())
    }
}

impl Pagination for Unpaged {
    type Cursor = ();

    fn apply(_query: &mut Query, _cursor: Option<&()>) {}

    fn next_cursor(_body: &Value, _cursor: Option<&()>, _returned: usize) -> Option<()> {
        None
    }
}

/// One page of a list call.
#[derive(Debug, Clone)]
pub struct Page<P: Pagination> {
    pub items: Vec<Value>,
    pub next: Option<P::Cursor>,
}

impl<P: Pagination> Page<P> {
    /// Builds a page from a list response body.
    pub fn from_body(body: Option<Value>, list_key: &str, cursor: Option<&P::Cursor>) -> Result<Self> {
        let Some(body) = body else {
            return Ok(Self {
                items: Vec::new(),
                next: None,
            });
        };

        let items = extract_items(&body, list_key)?;
        let next = P::next_cursor(&body, cursor, items.len());
        Ok(Self { items, next })
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// Pulls the items out of a list response: either a bare array or the array
/// under `list_key`.
fn extract_items(body: &Value, list_key: &str) -> Result<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items.clone()),
        Value::Object(fields) => match fields.get(list_key) {
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(ApiError::Decode(format!(
                "expected '{}' to be an array, got {}",
                list_key, other
            ))),
        },
        other => Err(ApiError::Decode(format!(
            "expected a list response, got {}",
            other
        ))),
    }
}
