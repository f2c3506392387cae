//! Paginated requests.
//!
//! A [`PagedRequest`] knows how to compile the route of any page and how to
//! decode the items of one page. Pages are fetched on demand, either one at a
//! time with [`PagedRequest::page`] or in order with [`PagedRequest::stream`].
//!
//! # Example
//!
//! ```rust,ignore
//! let pages = client.gallery().hot(GallerySort::Viral, GalleryTimeWindow::Day);
//! let first = pages.first().await?;
//! let second = pages.page(first.next_index()).await?;
//! ```

use crate::request::{Decoder, RequestInfo};
use crate::requester::Requester;
use crate::result::AsyncResult;
use crate::transport::RawResponse;
use futures::Stream;
use imgur_rest_core::{CompiledRoute, ParsingError, RestError};
use std::fmt;
use std::sync::Arc;

/// Compiles the route of a page
pub type PageRoute = Arc<dyn Fn(u32) -> Result<CompiledRoute, RestError> + Send + Sync>;

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Zero-based page index
    pub index: u32,
    /// Items on this page
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Index of the following page.
    #[must_use]
    pub const fn next_index(&self) -> u32 {
        self.index.saturating_add(1)
    }

    /// Whether the page holds no items, which marks the end of the listing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A request for any page of a paginated listing
pub struct PagedRequest<T> {
    requester: Requester,
    route: PageRoute,
    decoder: Decoder<Vec<T>>,
}

impl<T> PagedRequest<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Build from a page → route function and a decoder for the items of a
    /// page.
    pub fn new<R, D>(requester: Requester, route: R, decoder: D) -> Self
    where
        R: Fn(u32) -> Result<CompiledRoute, RestError> + Send + Sync + 'static,
        D: Fn(&RequestInfo, &RawResponse) -> Result<Vec<T>, ParsingError> + Send + Sync + 'static,
    {
        Self {
            requester,
            route: Arc::new(route),
            decoder: Arc::new(decoder),
        }
    }

    /// Route of page `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Validation`] when the route cannot be compiled.
    pub fn route_for(&self, index: u32) -> Result<CompiledRoute, RestError> {
        (self.route)(index)
    }

    /// Fetch page `index`.
    #[must_use]
    pub fn page(&self, index: u32) -> AsyncResult<Page<T>> {
        match self.route_for(index) {
            Ok(route) => self
                .requester
                .submit(route, None, Arc::clone(&self.decoder), None)
                .map(move |items| Page { index, items }),
            Err(err) => AsyncResult::failed(err),
        }
    }

    /// Fetch the first page.
    #[must_use]
    pub fn first(&self) -> AsyncResult<Page<T>> {
        self.page(0)
    }

    /// Pages from `start` onwards, in order.
    ///
    /// Ends after the first empty page (which is not yielded) or after the
    /// first failure (which is).
    pub fn stream(&self, start: u32) -> impl Stream<Item = Result<Page<T>, RestError>> + Send + 'static {
        let pages = self.clone();
        async_stream::stream! {
            let mut index = start;
            loop {
                match pages.page(index).await {
                    Ok(page) if page.is_empty() => break,
                    Ok(page) => {
                        index = page.next_index();
                        yield Ok(page);
                    }
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        }
    }
}

impl<T> Clone for PagedRequest<T> {
    fn clone(&self) -> Self {
        Self {
            requester: self.requester.clone(),
            route: Arc::clone(&self.route),
            decoder: Arc::clone(&self.decoder),
        }
    }
}

impl<T> fmt::Debug for PagedRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedRequest")
            .field("requester", &self.requester)
            .finish_non_exhaustive()
    }
}
