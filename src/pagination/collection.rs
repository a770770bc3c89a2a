//! Lazily-paginated, network-backed collection

use super::index::PagedIndex;
use super::types::{
    prefetch_threshold, FetchStatus, LoadProgress, PageCursor, PageParser, RequestFactory,
};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpResponse};
use crate::ordered_map::OrderedMap;
use crate::publisher::{Publisher, Subscription};
use futures::stream::{self, Stream, TryStreamExt};
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Bounds required of a page token
pub trait PageToken: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static> PageToken for T {}

struct State<T, Tok> {
    items: Vec<T>,
    cursor: PageCursor<Tok>,
    fetching: bool,
    /// Every token requested so far, with the outcome of its latest attempt
    ledger: OrderedMap<Option<Tok>, FetchStatus>,
    requests_issued: Vec<Option<Tok>>,
    fetches_completed: u64,
    last_error: Option<Error>,
}

impl<T, Tok: PageToken> State<T, Tok> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: PageCursor::First,
            fetching: false,
            ledger: OrderedMap::new(),
            requests_issued: Vec::new(),
            fetches_completed: 0,
            last_error: None,
        }
    }

    fn end_index(&self) -> PagedIndex {
        if self.cursor.is_exhausted() {
            PagedIndex::new(self.items.len())
        } else {
            PagedIndex::indefinite(self.items.len())
        }
    }

    fn progress(&self) -> LoadProgress {
        LoadProgress {
            loaded: self.items.len(),
            end: self.end_index(),
            fetching: self.fetching,
            fetches_completed: self.fetches_completed,
            last_error: self.last_error.clone(),
        }
    }

    /// Pending or already-applied tokens are never requested again
    fn is_settled(&self, token: &Option<Tok>) -> bool {
        matches!(
            self.ledger.get(token),
            Some(FetchStatus::Pending | FetchStatus::Completed { .. })
        )
    }
}

struct Inner<T, Tok> {
    client: Box<dyn HttpClient>,
    requests: Box<dyn RequestFactory<Tok>>,
    parser: Box<dyn PageParser<T, Tok>>,
    state: Mutex<State<T, Tok>>,
    progress: Publisher<LoadProgress>,
}

impl<T, Tok> Inner<T, Tok>
where
    T: Clone + Send + Sync + 'static,
    Tok: PageToken,
{
    fn lock(&self) -> MutexGuard<'_, State<T, Tok>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue a request for the cursor's page unless one is in flight or
    /// the page was already loaded. Returns whether a request went out.
    fn start_fetch(self: &Arc<Self>, state: &mut State<T, Tok>) -> bool {
        if state.fetching {
            return false;
        }
        let Some(token) = state.cursor.request_token().map(|t| t.cloned()) else {
            return false;
        };
        if state.is_settled(&token) {
            return false;
        }

        let request = self.requests.build(token.as_ref());
        debug!(token = ?token, url = %request.url, "Requesting page");

        state.requests_issued.push(token.clone());
        state.ledger.insert(token.clone(), FetchStatus::Pending);
        state.fetching = true;

        let response = self.client.send(request);
        let collection = Arc::downgrade(self);
        tokio::spawn(async move {
            let outcome = response.await;
            if let Some(inner) = collection.upgrade() {
                inner.finish_fetch(token, outcome);
            }
        });

        self.progress.update(state.progress());
        true
    }

    fn finish_fetch(&self, token: Option<Tok>, outcome: Result<HttpResponse>) {
        let parsed = outcome.and_then(|response| {
            if !response.is_success() {
                return Err(Error::http_status(response.status, response.text()));
            }
            self.parser.parse(&response.body)
        });

        let mut state = self.lock();
        state.fetching = false;
        state.fetches_completed += 1;

        match parsed {
            Ok(page) => {
                let count = page.items.len();
                state.items.extend(page.items);
                state
                    .ledger
                    .insert(token.clone(), FetchStatus::Completed { items: count });
                state.cursor = match page.next_token {
                    None => PageCursor::Exhausted,
                    Some(next) if state.is_settled(&Some(next.clone())) => {
                        warn!(token = ?next, "Source repeated a page token, treating as last page");
                        PageCursor::Exhausted
                    }
                    Some(next) => PageCursor::Next(next),
                };
                state.last_error = None;
                debug!(
                    token = ?token,
                    items = count,
                    loaded = state.items.len(),
                    exhausted = state.cursor.is_exhausted(),
                    "Page loaded"
                );
            }
            Err(error) => {
                warn!(token = ?token, error = %error, "Page fetch failed");
                state.ledger.insert(token, FetchStatus::Failed);
                state.last_error = Some(error);
            }
        }

        self.progress.update(state.progress());
        if state.cursor.is_exhausted() {
            self.progress.finish();
        }
    }

    /// Prefetch the next page once `index` reaches the threshold
    fn maybe_prefetch(self: &Arc<Self>, state: &mut State<T, Tok>, index: usize) {
        if index >= prefetch_threshold(state.items.len())
            && matches!(state.cursor, PageCursor::Next(_))
        {
            self.start_fetch(state);
        }
    }
}

/// Wait until a fetch newer than `after` completes and report its outcome.
async fn wait_for_fetch(mut progress: Subscription<LoadProgress>, after: u64) -> Result<()> {
    while let Some(update) = progress.next().await {
        if update.fetches_completed > after {
            return match update.last_error {
                Some(error) => Err(error),
                None => Ok(()),
            };
        }
    }
    Ok(())
}

/// A random-access collection over a cursor-paginated remote source.
///
/// The first page is requested as soon as the collection is created.
/// Accessing an index at or beyond 75% of the buffered items requests the
/// next page in the background; accessing an index that is not buffered
/// yet waits for it. At most one request is in flight at any time and
/// pages are appended strictly in the order their tokens were produced.
///
/// Handles are cheap to clone and share the same buffer.
///
/// ```rust,ignore
/// let items = PagedCollection::new(client, factory, parser);
/// let first = items.get(0).await?;
/// let everything: Vec<_> = items.collect_all().await?;
/// ```
pub struct PagedCollection<T, Tok = String> {
    inner: Arc<Inner<T, Tok>>,
}

impl<T, Tok> Clone for PagedCollection<T, Tok> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, Tok> PagedCollection<T, Tok>
where
    T: Clone + Send + Sync + 'static,
    Tok: PageToken,
{
    /// Create the collection and request the first page.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime; fetches run on spawned
    /// tasks.
    pub fn new<C, R, P>(client: C, request_factory: R, parser: P) -> Self
    where
        C: HttpClient + 'static,
        R: RequestFactory<Tok> + 'static,
        P: PageParser<T, Tok> + 'static,
    {
        let inner = Arc::new(Inner {
            client: Box::new(client),
            requests: Box::new(request_factory),
            parser: Box::new(parser),
            state: Mutex::new(State::new()),
            progress: Publisher::new(),
        });

        {
            let mut state = inner.lock();
            inner.start_fetch(&mut state);
        }

        Self { inner }
    }

    pub fn start_index(&self) -> PagedIndex {
        PagedIndex::new(0)
    }

    /// Indefinite until the source reports there are no more pages
    pub fn end_index(&self) -> PagedIndex {
        self.inner.lock().end_index()
    }

    /// Number of buffered items; never triggers a fetch
    pub fn underestimated_count(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.inner.lock().cursor.is_exhausted()
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.lock().fetching
    }

    /// Page tokens in the order they were requested, retries included
    pub fn requests_issued(&self) -> Vec<Option<Tok>> {
        self.inner.lock().requests_issued.clone()
    }

    /// Outcome of the latest request for `token` (`None` is the first page)
    pub fn fetch_status(&self, token: Option<&Tok>) -> Option<FetchStatus> {
        self.inner.lock().ledger.get(&token.cloned()).copied()
    }

    pub fn last_error(&self) -> Option<Error> {
        self.inner.lock().last_error.clone()
    }

    /// Buffered items; never fetches and never waits
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.lock().items.clone()
    }

    /// Load progress updates; finishes once the last page is loaded
    pub fn progress(&self) -> Subscription<LoadProgress> {
        self.inner.progress.subscription()
    }

    /// Item at `index` if it is already buffered.
    ///
    /// Applies the prefetch rule like any other access but never waits.
    pub fn get_buffered(&self, index: usize) -> Option<T> {
        let mut state = self.inner.lock();
        self.inner.maybe_prefetch(&mut state, index);
        state.items.get(index).cloned()
    }

    /// Item at `index`, waiting for pages to load as needed.
    ///
    /// Returns `Ok(None)` when the source is exhausted before `index`.
    /// A failed fetch is returned to every caller waiting on it; the
    /// buffer is left untouched and the next access that needs the page
    /// requests it again.
    pub async fn lookup(&self, index: usize) -> Result<Option<T>> {
        loop {
            let (progress, after) = {
                let mut state = self.inner.lock();
                if let Some(item) = state.items.get(index).cloned() {
                    self.inner.maybe_prefetch(&mut state, index);
                    return Ok(Some(item));
                }
                if state.cursor.is_exhausted() {
                    return Ok(None);
                }
                if !state.fetching && !self.inner.start_fetch(&mut state) {
                    return Ok(None);
                }
                (self.inner.progress.subscription(), state.fetches_completed)
            };

            wait_for_fetch(progress, after).await?;
        }
    }

    /// Item at `index`, waiting for pages to load as needed.
    ///
    /// # Panics
    ///
    /// Panics if the source is exhausted before `index`. Callers must not
    /// read past a definite [`end_index`](Self::end_index).
    pub async fn get(&self, index: usize) -> Result<T> {
        match self.lookup(index).await? {
            Some(item) => Ok(item),
            None => panic!(
                "Index out of range: tried to get item at {index}, but the collection ends at {}",
                self.underestimated_count()
            ),
        }
    }

    /// Wait for the in-flight fetch, if any, and return its outcome
    pub async fn settle(&self) -> Result<()> {
        let (progress, after) = {
            let state = self.inner.lock();
            if !state.fetching {
                return Ok(());
            }
            (self.inner.progress.subscription(), state.fetches_completed)
        };
        wait_for_fetch(progress, after).await
    }

    /// Iterate from the start, loading pages as the iteration advances.
    ///
    /// Ends at the definite end of the collection, or right after
    /// yielding the first error.
    pub fn stream(&self) -> impl Stream<Item = Result<T>> + Send + 'static {
        stream::unfold(
            (self.clone(), 0usize, false),
            |(collection, index, failed)| async move {
                if failed {
                    return None;
                }
                match collection.lookup(index).await {
                    Ok(Some(item)) => Some((Ok(item), (collection, index + 1, false))),
                    Ok(None) => None,
                    Err(error) => Some((Err(error), (collection, index, true))),
                }
            },
        )
    }

    /// Load every page and return all items
    pub async fn collect_all(&self) -> Result<Vec<T>> {
        self.stream().try_collect().await
    }
}

impl<T, Tok> fmt::Debug for PagedCollection<T, Tok>
where
    T: Clone + Send + Sync + 'static,
    Tok: PageToken,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("PagedCollection")
            .field("loaded", &state.items.len())
            .field("end", &state.end_index())
            .field("cursor", &state.cursor)
            .field("fetching", &state.fetching)
            .finish_non_exhaustive()
    }
}
