use super::models::Page;
use super::GraphClient;
use crate::error::{Error, SyncResult};
use futures::{Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone)]
enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Lazily walks a Graph collection by following `@odata.nextLink`.
///
/// Nothing is fetched until a page is asked for. A failed fetch leaves the
/// cursor where it was, and [`Pager::reset`] starts over from the first
/// request.
pub struct Pager<'a, T> {
    client: &'a GraphClient,
    first: Url,
    cursor: Cursor,
    pages_fetched: usize,
    _item: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> Pager<'a, T> {
    pub fn new(client: &'a GraphClient, first: Url) -> Self {
        Self {
            client,
            first,
            cursor: Cursor::Start,
            pages_fetched: 0,
            _item: PhantomData,
        }
    }

    /// Fetch the next page, `None` once the collection is exhausted
    pub async fn next_page(&mut self) -> SyncResult<Option<Vec<T>>> {
        let url = match &self.cursor {
            Cursor::Start => self.first.to_string(),
            Cursor::Next(next) => next.clone(),
            Cursor::Done => return Ok(None),
        };

        let page: Page<T> = self.client.get_json(&url).await?;
        self.pages_fetched += 1;
        debug!(
            "Fetched page {} with {} items from {}",
            self.pages_fetched,
            page.value.len(),
            self.first.path()
        );

        self.cursor = match page.next_link {
            Some(next) => Cursor::Next(next),
            None => Cursor::Done,
        };
        Ok(Some(page.value))
    }

    /// Start again from the first page
    pub fn reset(&mut self) {
        self.cursor = Cursor::Start;
        self.pages_fetched = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.cursor, Cursor::Done)
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Pages as a stream, pulled on demand
    pub fn into_stream(self) -> impl Stream<Item = SyncResult<Vec<T>>> + 'a
    where
        T: 'a,
    {
        futures::stream::try_unfold(self, |mut pager| async move {
            let page = pager.next_page().await?;
            Ok::<_, Error>(page.map(|items| (items, pager)))
        })
    }

    /// Follow every continuation link and flatten the pages
    pub async fn collect_all(self) -> SyncResult<Vec<T>>
    where
        T: 'a,
    {
        self.into_stream().try_concat().await
    }
}
