//! Per-kind resource capability.

use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use super::error::{ApiError, Result};
use super::pagination::{Page, Pagination};
use super::transport::{ApiRequest, Query, Transport};
use crate::model::{Addressing, ResourceKind};

/// CRUD and lookup calls for one collection, paged by `P`.
pub struct ResourceApi<P: Pagination> {
    transport: Arc<dyn Transport>,
    kind: ResourceKind,
    path: String,
    _pagination: PhantomData<P>,
}

impl<P: Pagination> Clone for ResourceApi<P> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            kind: self.kind,
            path: self.path.clone(),
            _pagination: PhantomData,
        }
    }
}

impl<P: Pagination> std::fmt::Debug for ResourceApi<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceApi")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .finish()
    }
}

impl<P: Pagination> ResourceApi<P> {
    pub fn new(transport: Arc<dyn Transport>, kind: ResourceKind, path: impl Into<String>) -> Self {
        Self {
            transport,
            kind,
            path: path.into(),
            _pagination: PhantomData,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn item_path(&self, key: &str) -> String {
        format!("{}/{}", self.path, key)
    }

    /// Fetches one page of the collection.
    pub async fn list_page(&self, query: &Query, cursor: Option<&P::Cursor>) -> Result<Page<P>> {
        let mut query = query.clone();
        P::apply(&mut query, cursor);

        let body = self
            .transport
            .send(ApiRequest::get(self.path.clone()).with_query(query))
            .await?;
        Page::from_body(body, self.kind.list_key(), cursor)
    }

    /// Fetches every page of the collection.
    pub async fn list_all(&self, query: &Query) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut cursor: Option<P::Cursor> = None;

        loop {
            let page = self.list_page(query, cursor.as_ref()).await?;
            items.extend(page.items);
            match page.next {
                Some(next) => {
                    log::trace!("{}: fetching next page at {:?}", self.path, next);
                    cursor = Some(next);
                }
                None => break,
            }
        }

        log::debug!("{}: listed {} item(s)", self.path, items.len());
        Ok(items)
    }

    pub async fn get(&self, key: &str) -> Result<Value> {
        let path = self.item_path(key);
        self.transport
            .send(ApiRequest::get(path.clone()))
            .await?
            .ok_or_else(|| ApiError::Decode(format!("empty response for {}", path)))
    }

    /// Creates a resource and returns it as stored.
    ///
    /// Name-addressed kinds are created with `PUT <path>/<name>`, the others
    /// with `POST <path>`. An empty response echoes `body`.
    pub async fn create(&self, body: &Value) -> Result<Value> {
        let request = match self.kind.addressing() {
            Addressing::ByName => {
                let name = self.identifier_of(body).ok_or(ApiError::MissingKey {
                    kind: self.kind,
                    field: self.kind.identifier_field(),
                })?;
                ApiRequest::put(self.item_path(name), body.clone())
            }
            Addressing::ById => ApiRequest::post(self.path.clone(), body.clone()),
        };

        let created = self.transport.send(request).await?;
        Ok(created.unwrap_or_else(|| body.clone()))
    }

    pub async fn update(&self, key: &str, body: &Value) -> Result<Value> {
        let updated = self
            .transport
            .send(ApiRequest::put(self.item_path(key), body.clone()))
            .await?;
        Ok(updated.unwrap_or_else(|| body.clone()))
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.transport
            .send(ApiRequest::delete(self.item_path(key)))
            .await?;
        Ok(())
    }

    /// Finds a resource by exact name (or title, for services).
    ///
    /// Name-addressed kinds are fetched directly. Otherwise the collection is
    /// listed, with a server-side `name` filter where the kind supports one,
    /// and the first exact match wins.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Value> {
        if self.kind.addressing() == Addressing::ByName {
            return self.get(identifier).await;
        }

        let field = self.kind.identifier_field();
        let query = match field {
            "name" => Query::new().with("name", identifier),
            _ => Query::new(),
        };

        let items = self.list_all(&query).await?;
        items
            .into_iter()
            .find(|item| item.get(field).and_then(Value::as_str) == Some(identifier))
            .ok_or_else(|| ApiError::NotFound {
                path: format!("{}?{}={}", self.path, field, identifier),
            })
    }

    /// Returns the key that addresses `resource` in request paths.
    pub fn key_of(&self, resource: &Value) -> Result<String> {
        match self.kind.addressing() {
            Addressing::ByName => self
                .identifier_of(resource)
                .map(str::to_string)
                .ok_or(ApiError::MissingKey {
                    kind: self.kind,
                    field: self.kind.identifier_field(),
                }),
            Addressing::ById => match resource.get("id") {
                Some(Value::Number(id)) => Ok(id.to_string()),
                Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
                _ => Err(ApiError::MissingKey {
                    kind: self.kind,
                    field: "id",
                }),
            },
        }
    }

    /// Returns the name (or title) of `resource`.
    pub fn identifier_of<'a>(&self, resource: &'a Value) -> Option<&'a str> {
        resource
            .get(self.kind.identifier_field())
            .and_then(Value::as_str)
            .filter(|identifier| !identifier.is_empty())
    }
}
