//! Pagination strategies built on top of a [`ResourceClient`].
//!
//! Two incompatible conventions are supported:
//!
//! - **Link-following**: each page carries a `links` array; the entry with
//!   relation `page.next` points at the following page. A page shorter than
//!   the configured maximum ends the walk.
//! - **Skip/take window**: the caller advances `Skip` by `Take` until a page
//!   comes back with fewer than `Take` items.
//!
//! Both are explicit loops over a page cursor ([`LinkPages`], [`WindowPages`])
//! so arbitrarily long result sets never grow the call stack. The cursors are
//! public for callers that want one page at a time.
//!
//! A window whose true size is an exact multiple of `Take` costs one trailing
//! request that returns an empty page. That is the expected request count,
//! not a defect; [`WindowTermination::TotalResults`] opts out of it.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::client::ResourceClient;
use crate::error::ParleyError;
use crate::query::QueryParams;

/// Relation name marking the next page in a linked page.
pub const NEXT_PAGE_REL: &str = "page.next";
pub const SKIP_KEY: &str = "Skip";
pub const TAKE_KEY: &str = "Take";
const TOTAL_RESULTS_KEY: &str = "totalResults";

/// How a skip/take walk decides it has reached the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowTermination {
    /// Stop only on a page shorter than `Take`.
    #[default]
    ShortPage,
    /// Also stop once `Skip + Take` reaches a `totalResults` field, when present.
    TotalResults,
}

/// One decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    /// Remaining top-level fields of the body (links, totals, ...).
    pub head: Map<String, Value>,
}

impl Page {
    fn parse(path: &str, body: Value) -> Result<Self, ParleyError> {
        let Value::Object(mut head) = body else {
            return Err(ParleyError::malformed_page(path, "body is not a JSON object"));
        };
        let items = match head.remove("items") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(ParleyError::malformed_page(path, "'items' is not an array")),
            None => return Err(ParleyError::malformed_page(path, "missing 'items'")),
        };
        Ok(Self { items, head })
    }

    /// The href of the first `page.next` link.
    ///
    /// # Errors
    /// Returns [`ParleyError::MalformedPage`] if the page has no `links` array.
    pub fn next_link(&self, path: &str) -> Result<Option<String>, ParleyError> {
        let links = match self.head.get("links") {
            Some(Value::Array(links)) => links,
            Some(_) => return Err(ParleyError::malformed_page(path, "'links' is not an array")),
            None => return Err(ParleyError::malformed_page(path, "missing 'links'")),
        };
        Ok(links
            .iter()
            .find(|link| link.get("rel").and_then(Value::as_str) == Some(NEXT_PAGE_REL))
            .and_then(|link| link.get("href"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn total_results(&self) -> Option<usize> {
        self.head
            .get(TOTAL_RESULTS_KEY)
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
    }
}

/// The ordered concatenation of every page's items for one logical fetch.
///
/// No deduplication is performed: records repeated or shifted across pages
/// upstream appear repeated here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedResult {
    pub items: Vec<Value>,
    /// Top-level fields of the first page, minus `items`.
    pub head: Map<String, Value>,
    /// Number of requests issued.
    pub pages: usize,
}

impl AggregatedResult {
    fn push(&mut self, page: Page) {
        if self.pages == 0 {
            self.head = page.head;
        }
        self.items.extend(page.items);
        self.pages += 1;
    }

    #[must_use]
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

/// Owns a resource client plus the domain's page size and runs both
/// pagination strategies against it.
#[derive(Clone)]
pub struct Pager {
    client: Arc<dyn ResourceClient>,
    page_size_max: usize,
    termination: WindowTermination,
}

impl Pager {
    pub fn new(client: Arc<dyn ResourceClient>, page_size_max: usize) -> Self {
        Self {
            client,
            page_size_max,
            termination: WindowTermination::default(),
        }
    }

    #[must_use]
    pub fn with_termination(mut self, termination: WindowTermination) -> Self {
        self.termination = termination;
        self
    }

    #[must_use]
    pub const fn page_size_max(&self) -> usize {
        self.page_size_max
    }

    /// Single fetch with no pagination.
    ///
    /// # Errors
    /// Propagates any [`ResourceClient`] failure unchanged.
    pub async fn fetch(&self, path: &str, params: &QueryParams) -> Result<Value, ParleyError> {
        self.client.fetch(path, params).await
    }

    /// Cursor over linked pages starting at `path`.
    #[must_use]
    pub fn link_pages(&self, path: &str, params: &QueryParams) -> LinkPages<'_> {
        LinkPages {
            pager: self,
            next: Some((path.to_string(), params.clone())),
        }
    }

    /// Cursor over skip/take windows of `path`.
    ///
    /// `Skip` and `Take` in `params` seed the window (defaulting to 0 and the
    /// configured page size) and are not passed through twice.
    ///
    /// # Errors
    /// Returns [`ParleyError::Configuration`] for a zero, negative or
    /// non-integer window value.
    pub fn window_pages(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<WindowPages<'_>, ParleyError> {
        let mut rest = params.clone();
        let skip = take_count(&mut rest, SKIP_KEY)?.unwrap_or(0);
        let take = take_count(&mut rest, TAKE_KEY)?.unwrap_or(self.page_size_max);
        if take == 0 {
            return Err(ParleyError::Configuration(format!(
                "{TAKE_KEY} must be at least 1 for {path}"
            )));
        }
        Ok(WindowPages {
            pager: self,
            path: path.to_string(),
            params: rest,
            skip,
            take,
            done: false,
        })
    }

    /// Walk every linked page of `path` and concatenate their items.
    ///
    /// # Errors
    /// Fails on the first [`ParleyError`]; no partial items are returned.
    pub async fn paginate_by_link(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<AggregatedResult, ParleyError> {
        let mut pages = self.link_pages(path, params);
        let mut result = AggregatedResult::default();
        while let Some(page) = pages.next_page().await? {
            result.push(page);
        }
        tracing::debug!(
            path,
            pages = result.pages,
            items = result.items.len(),
            "link pagination finished"
        );
        Ok(result)
    }

    /// Walk skip/take windows of `path` until a short page and concatenate
    /// their items.
    ///
    /// # Errors
    /// Fails on the first [`ParleyError`]; no partial items are returned.
    pub async fn paginate_by_window(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<AggregatedResult, ParleyError> {
        let mut pages = self.window_pages(path, params)?;
        let mut result = AggregatedResult::default();
        while let Some(page) = pages.next_page().await? {
            result.push(page);
        }
        tracing::debug!(
            path,
            pages = result.pages,
            items = result.items.len(),
            "window pagination finished"
        );
        Ok(result)
    }
}

fn take_count(params: &mut QueryParams, key: &str) -> Result<Option<usize>, ParleyError> {
    params
        .remove(key)
        .map(|value| {
            value.as_count().ok_or_else(|| {
                let reason = format!("{key} must be a non-negative integer, got '{value}'");
                ParleyError::Configuration(reason)
            })
        })
        .transpose()
}

/// Page cursor following `page.next` links.
///
/// Parameters apply to the first request only; a next-page href already
/// encodes the full page state.
pub struct LinkPages<'a> {
    pager: &'a Pager,
    next: Option<(String, QueryParams)>,
}

impl LinkPages<'_> {
    /// Fetch the next page, or `None` once the final page has been returned.
    ///
    /// # Errors
    /// Propagates client failures; a page without `links` is
    /// [`ParleyError::MalformedPage`].
    pub async fn next_page(&mut self) -> Result<Option<Page>, ParleyError> {
        let Some((path, params)) = self.next.take() else {
            return Ok(None);
        };
        let body = self.pager.client.fetch(&path, &params).await?;
        let page = Page::parse(&path, body)?;
        let next_href = page.next_link(&path)?;

        if page.items.len() >= self.pager.page_size_max {
            self.next = next_href.map(|href| (href, QueryParams::new()));
        }
        Ok(Some(page))
    }
}

/// Page cursor advancing a skip/take window.
pub struct WindowPages<'a> {
    pager: &'a Pager,
    path: String,
    params: QueryParams,
    skip: usize,
    take: usize,
    done: bool,
}

impl WindowPages<'_> {
    /// Current `(skip, take)` window.
    #[must_use]
    pub const fn window(&self) -> (usize, usize) {
        (self.skip, self.take)
    }

    /// Fetch the next window, or `None` once a short page has been returned.
    ///
    /// # Errors
    /// Propagates client failures; a body without `items` is
    /// [`ParleyError::MalformedPage`].
    pub async fn next_page(&mut self) -> Result<Option<Page>, ParleyError> {
        if self.done {
            return Ok(None);
        }
        let mut params = QueryParams::new()
            .with(SKIP_KEY, self.skip)
            .with(TAKE_KEY, self.take);
        params.extend(&self.params);

        let body = self.pager.client.fetch(&self.path, &params).await?;
        let page = Page::parse(&self.path, body)?;

        let reached_total = self.pager.termination == WindowTermination::TotalResults
            && page
                .total_results()
                .is_some_and(|total| self.skip + self.take >= total);

        if page.items.len() < self.take || reached_total {
            self.done = true;
        } else {
            self.skip += self.take;
        }
        Ok(Some(page))
    }
}
