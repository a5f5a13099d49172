// Pagination over GitHub list endpoints.
// Follows `Link: rel="next"` headers one page at a time, with a cap against runaway cursors.

use std::collections::HashSet;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::{CachedResponse, request_key};
use crate::context::RunContext;
use crate::error::{FellowError, Result};

use super::client::{GitHubClient, decode};

/// Upper bound on pages fetched by one cursor.
pub const MAX_PAGES: usize = 1000;

/// Extract the `rel="next"` target from a `Link` header.
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut sections = part.split(';');
        let target = sections.next()?.trim();
        let is_next = sections.any(|param| {
            let param = param.trim();
            param == r#"rel="next""# || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

/// Lazy, restartable cursor over the pages of a list endpoint.
///
/// Each call to [`Pages::next_page`] performs at most one fetch (which may be
/// served from the cache). Dropping the cursor early simply stops pagination.
pub struct Pages<'a> {
    client: &'a GitHubClient,
    first: Url,
    next: Option<Url>,
    seen: HashSet<String>,
    fetched: usize,
    max_pages: usize,
}

impl<'a> Pages<'a> {
    pub fn new(client: &'a GitHubClient, first: Url) -> Self {
        Self {
            client,
            next: Some(first.clone()),
            first,
            seen: HashSet::new(),
            fetched: 0,
            max_pages: MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn pages_fetched(&self) -> usize {
        self.fetched
    }

    /// Go back to the first page.
    pub fn restart(&mut self) {
        self.next = Some(self.first.clone());
        self.seen.clear();
        self.fetched = 0;
    }

    /// Fetch the next page, or `None` once the endpoint reports no more pages.
    pub async fn next_page(&mut self, ctx: &mut RunContext) -> Result<Option<CachedResponse>> {
        let Some(url) = self.next.take() else {
            return Ok(None);
        };

        if !self.seen.insert(url.to_string()) {
            warn!(%url, "pagination revisited a page, stopping");
            ctx.record_failure();
            return Err(FellowError::PaginationLoop(url.to_string()));
        }
        if self.fetched >= self.max_pages {
            warn!(max_pages = self.max_pages, "pagination cap reached, stopping");
            ctx.record_failure();
            return Err(FellowError::PageLimit(self.max_pages));
        }

        let page = self.client.fetch_url(ctx, url).await?;
        self.fetched += 1;

        if let Some(next) = &page.next {
            match Url::parse(next) {
                Ok(next) => self.next = Some(next),
                Err(e) => {
                    ctx.record_failure();
                    return Err(FellowError::Other(format!(
                        "invalid next page link {}: {}",
                        next, e
                    )));
                }
            }
        }

        Ok(Some(page))
    }

    /// Drop the cached pages of this listing, following the `next` links stored
    /// with each cached page. Later pages are often addressed by account id
    /// rather than login, so a key prefix cannot find them. Returns the number removed.
    pub fn invalidate(&self) -> Result<usize> {
        let cache = self.client.cache();
        let mut visited = HashSet::new();
        let mut next = Some(self.first.to_string());
        let mut removed = 0;

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) || visited.len() > self.max_pages {
                break;
            }
            let key = request_key("GET", &url);
            next = cache.get(&key)?.and_then(|entry| entry.data.next);
            if cache.remove(&key)? {
                removed += 1;
            }
        }
        debug!(url = %self.first, removed, "invalidated cached pages");
        Ok(removed)
    }

    /// Drain the cursor, decoding every page as a JSON array.
    pub async fn collect_all<T: DeserializeOwned>(mut self, ctx: &mut RunContext) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page(ctx).await? {
            let batch: Vec<T> = decode(ctx, &page.body)?;
            items.extend(batch);
        }
        debug!(url = %self.first, pages = self.fetched, items = items.len(), "pagination complete");
        Ok(items)
    }
}
