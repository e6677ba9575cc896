//! Lazily paginated resource collections.
//!
//! A [`ResourceCollection`] is an iterator over the resources of one kind,
//! optionally narrowed by filters. Pages are requested with a
//! `Range: items=<start>-<end>` header, and the server answers with a
//! `Content-Range: items <start>-<end>/<total>` header giving the total
//! number of items.
//!
//! # Cursor
//!
//! The cursor is either the offset of the next unfetched page or exhausted.
//! The first page is fetched eagerly on construction so
//! [`size`](ResourceCollection::size) is known before iterating. A page that
//! ends before the reported total advances the cursor by one page; any
//! other page exhausts it.
//!
//! A `416 Range Not Satisfiable` answer (the collection shrank below the
//! cursor) also exhausts the cursor. The size is then taken from the
//! `Content-Range: items */<total>` header of the error response when
//! present, and set to zero otherwise.
//!
//! Items are yielded at most once; [`reset`](ResourceCollection::reset)
//! starts over from the first page.
//!
//! # Example
//!
//! ```rust,ignore
//! use varda_client::rest::resources::SampleFilters;
//!
//! let mut samples = session.samples(SampleFilters::default().public(true))?;
//! println!("{} public samples", samples.size());
//! for sample in &mut samples {
//!     println!("{}", sample?.uri());
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::clients::ApiError;
use crate::rest::errors::{FieldError, ResourceError};
use crate::rest::fields::ResourceRef;
use crate::rest::resource::{Resource, RestResource};
use crate::rest::resources::ResourceKind;
use crate::session::Session;

/// Filter parameters of a collection kind.
///
/// Filters are sent as the JSON body of every page request. Implementors
/// serialize to an object and skip parameters without a value.
pub trait CollectionFilters: Serialize + Clone + Default + fmt::Debug {
    /// Returns the filter parameters in wire form.
    fn to_wire(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(filters)) => filters,
            _ => Map::new(),
        }
    }

    /// Checks that every link parameter points to a resource of the kind
    /// the server filters on.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::WrongType`] for a link of another kind.
    fn validate(&self) -> Result<(), FieldError> {
        Ok(())
    }
}

/// Checks that every link given for the filter `name` is of `kind`.
pub(crate) fn check_filter_link<'a>(
    name: &str,
    links: impl IntoIterator<Item = &'a ResourceRef>,
    kind: ResourceKind,
) -> Result<(), FieldError> {
    match links.into_iter().find(|link| link.kind() != kind) {
        Some(_) => Err(FieldError::WrongType {
            field: name.to_string(),
            expected: kind.link_description(),
        }),
        None => Ok(()),
    }
}

/// Filters of collections that cannot be filtered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NoFilters;

impl CollectionFilters for NoFilters {}

/// An iterator over the resources of one kind.
///
/// Each item is a `Result`: a failed page request is yielded once as an
/// error, after which the collection is exhausted until
/// [`reset`](Self::reset).
pub struct ResourceCollection<R: RestResource> {
    session: Session,
    filters: R::Filters,
    next: Option<u64>,
    buffer: VecDeque<R>,
    size: u64,
    page_size: u64,
}

impl<R: RestResource> ResourceCollection<R> {
    /// Opens a collection and fetches its first page.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Field`] if a filter links to the wrong kind
    /// of resource, and [`ResourceError`] if the first page cannot be
    /// fetched.
    pub fn new(session: &Session, filters: R::Filters) -> Result<Self, ResourceError> {
        filters.validate()?;
        let page_size = u64::try_from(session.config().collection_cache_size()).unwrap_or(u64::MAX);
        let mut collection = Self {
            session: session.clone(),
            filters,
            next: Some(0),
            buffer: VecDeque::new(),
            size: 0,
            page_size,
        };
        collection.reset()?;
        Ok(collection)
    }

    /// Returns the total number of items as last reported by the server.
    ///
    /// This may differ from the number of items the iterator yields if the
    /// collection changes on the server while iterating.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns the filters this collection was opened with.
    #[must_use]
    pub const fn filters(&self) -> &R::Filters {
        &self.filters
    }

    /// Returns the number of items requested per page.
    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Returns `true` if no further pages will be requested.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }

    /// Restarts iteration from the first item and fetches the first page.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError`] if the first page cannot be fetched.
    pub fn reset(&mut self) -> Result<(), ResourceError> {
        self.next = Some(0);
        self.buffer.clear();
        self.fetch_more()
    }

    fn fetch_more(&mut self) -> Result<(), ResourceError> {
        let Some(start) = self.next else {
            return Ok(());
        };
        let result = self.fetch_page(start);
        if result.is_err() {
            self.next = None;
        }
        result
    }

    fn fetch_page(&mut self, start: u64) -> Result<(), ResourceError> {
        let key = R::KIND.collection_key();
        let endpoint = self.session.endpoint(key)?.to_string();
        let end = start + self.page_size.saturating_sub(1);

        let mut headers = HashMap::new();
        headers.insert("Range".to_string(), format!("items={start}-{end}"));

        let filters = self.filters.to_wire();
        let data = (!filters.is_empty()).then_some(Value::Object(filters));

        tracing::debug!(collection = key, start, end, "Fetching collection page");

        let response = match self.session.get(&endpoint, data, headers) {
            Ok(response) => response,
            Err(ResourceError::Api(ApiError::UnsatisfiableRange { content_range, .. })) => {
                self.size = content_range.map_or(0, |range| range.length);
                self.next = None;
                tracing::debug!(
                    collection = key,
                    start,
                    size = self.size,
                    "Range not satisfiable, collection exhausted"
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let content_range = response
            .content_range()
            .ok_or_else(|| ResourceError::invalid_response("missing or malformed Content-Range"))?;

        let body = response.into_json()?;
        let items = body
            .get(key)
            .and_then(|collection| collection.get("items"))
            .and_then(Value::as_array)
            .ok_or_else(|| ResourceError::invalid_response(format!("response has no '{key}' items")))?;

        for item in items {
            let resource = Resource::from_wire(&self.session, R::KIND, item)?;
            self.buffer.push_back(R::from_resource(resource));
        }

        self.size = content_range.length;
        self.next = match content_range.stop {
            Some(stop) if stop < content_range.length => Some(start + self.page_size),
            _ => None,
        };
        Ok(())
    }
}

impl<R: RestResource> Iterator for ResourceCollection<R> {
    type Item = Result<R, ResourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            if let Err(e) = self.fetch_more() {
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

impl<R: RestResource> fmt::Debug for ResourceCollection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCollection")
            .field("kind", &R::KIND.key())
            .field("filters", &self.filters)
            .field("next", &self.next)
            .field("buffered", &self.buffer.len())
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_filters_is_empty() {
        assert!(NoFilters.to_wire().is_empty());
    }

    #[derive(Clone, Debug, Default, Serialize)]
    struct ExampleFilters {
        #[serde(skip_serializing_if = "Option::is_none")]
        public: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    }

    impl CollectionFilters for ExampleFilters {}

    #[test]
    fn test_filters_skip_missing_values() {
        let filters = ExampleFilters {
            public: Some(true),
            user: None,
        };
        assert_eq!(Value::Object(filters.to_wire()), json!({"public": true}));
        assert!(ExampleFilters::default().to_wire().is_empty());
    }
}
