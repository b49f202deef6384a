//! Paged list responses.
//!
//! ARM list operations return `{"value": [...], "nextLink": "..."}`. The
//! `*_complete` operations follow `nextLink` until it is absent or empty and
//! keep the items a [`Predicate`] accepts.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{RequestOptions, ResourceManagerClient};
use crate::error::ClientError;

/// One page of a list operation. A missing or null `value` is an empty page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub value: Vec<T>,
    #[serde(default, rename = "nextLink")]
    pub next_link: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl<T> Page<T> {
    /// The link to the next page, if there is one.
    pub fn next_link(&self) -> Option<&str> {
        self.next_link.as_deref().filter(|link| !link.is_empty())
    }
}

/// Decides whether a listed item is kept.
pub trait Predicate<T> {
    fn matches(&self, item: &T) -> bool;
}

/// Keeps every item.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchAll;

impl<T> Predicate<T> for MatchAll {
    fn matches(&self, _item: &T) -> bool {
        true
    }
}

/// `None` matches anything; `Some(v)` requires the field to be present and equal.
pub(crate) fn field_matches<T: PartialEq>(expected: &Option<T>, actual: &Option<T>) -> bool {
    match expected {
        None => true,
        Some(expected) => actual.as_ref() == Some(expected),
    }
}

impl ResourceManagerClient {
    /// Load the first page of a list operation.
    pub async fn list_page<T: DeserializeOwned>(
        &self,
        operation: &str,
        options: RequestOptions,
    ) -> Result<Page<T>, ClientError> {
        let response = self.execute(operation, options).await?;
        self.decode(operation, &response)
    }

    /// Load the page behind a `nextLink`.
    pub async fn next_page<T: DeserializeOwned>(
        &self,
        operation: &str,
        next_link: &str,
    ) -> Result<Page<T>, ClientError> {
        let response = self.get_url(operation, next_link, &[200]).await?;
        self.decode(operation, &response)
    }

    /// Load every page and keep the items `predicate` accepts.
    pub async fn list_complete<T, P>(
        &self,
        operation: &str,
        options: RequestOptions,
        predicate: &P,
    ) -> Result<Vec<T>, ClientError>
    where
        T: DeserializeOwned,
        P: Predicate<T>,
    {
        let page_error = |page: usize, source: ClientError| ClientError::Page {
            operation: format!("{}#{}", self.name(), operation),
            page,
            source: Box::new(source),
        };

        let mut items = Vec::new();
        let mut page_number = 1;
        let mut page: Page<T> = self
            .list_page(operation, options)
            .await
            .map_err(|e| page_error(page_number, e))?;

        loop {
            debug!(
                client = self.name(),
                operation,
                page = page_number,
                items = page.value.len(),
                "loaded page"
            );
            let next_link = page.next_link().map(str::to_string);
            items.extend(page.value.into_iter().filter(|item| predicate.matches(item)));

            let Some(next_link) = next_link else {
                return Ok(items);
            };
            page_number += 1;
            page = self
                .next_page(operation, &next_link)
                .await
                .map_err(|e| page_error(page_number, e))?;
        }
    }
}
