//! URL-keyed cache of decoded avatars.
//!
//! Each key owns a `OnceCell`, so concurrent fetches of one URL share a single network
//! call. Failures leave nothing behind and the next fetch tries again. There is no eviction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use tokio::sync::OnceCell;
use url::Url;

use crate::api::ApiClient;
use crate::imaging::Avatar;

type Entries = HashMap<Url, Arc<OnceCell<Avatar>>>;

#[derive(Debug)]
pub struct ImageCache {
    api: ApiClient,
    entries: Mutex<Entries>,
    /// Maximum number of keys admitted. `None` is unbounded.
    capacity: Option<usize>,
}

impl ImageCache {
    /// Cache fetching through `api`.
    ///
    /// With `capacity`, once that many URLs are held new URLs are fetched but not stored.
    pub fn new(api: ApiClient, capacity: Option<usize>) -> Self {
        Self {
            api,
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The avatar for `url` if it has already been resolved.
    pub fn cached(&self, url: &Url) -> Option<Avatar> {
        self.entries().get(url).and_then(|cell| cell.get().cloned())
    }

    /// Number of resolved avatars.
    pub fn len(&self) -> usize {
        self.entries()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve `url` to an avatar, hitting the network at most once per key.
    ///
    /// Returns `None` on any failure (transport, status, decode).
    pub async fn fetch(&self, url: &Url) -> Option<Avatar> {
        let Some(cell) = self.cell_for(url) else {
            // Over capacity: resolve without admitting the key.
            return self.load(url).await;
        };

        let result = cell
            .get_or_try_init(|| async { self.load(url).await.ok_or(()) })
            .await
            .cloned();

        if result.is_err() {
            let mut entries = self.entries();
            if entries
                .get(url)
                .is_some_and(|current| Arc::ptr_eq(current, &cell) && !current.initialized())
            {
                entries.remove(url);
            }
        }
        result.ok()
    }

    fn cell_for(&self, url: &Url) -> Option<Arc<OnceCell<Avatar>>> {
        let mut entries = self.entries();
        if let Some(cell) = entries.get(url) {
            return Some(Arc::clone(cell));
        }
        if self.capacity.is_some_and(|cap| entries.len() >= cap) {
            debug!("ImageCache: at capacity, not caching {url}");
            return None;
        }
        let cell = Arc::new(OnceCell::new());
        entries.insert(url.clone(), Arc::clone(&cell));
        Some(cell)
    }

    async fn load(&self, url: &Url) -> Option<Avatar> {
        let bytes = match self.api.fetch_bytes(url).await {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!("ImageCache: fetch {url} failed: {err}");
                return None;
            }
        };

        match tokio::task::spawn_blocking(move || Avatar::decode(&bytes)).await {
            Ok(Ok(avatar)) => Some(avatar),
            Ok(Err(err)) => {
                debug!("ImageCache: {url}: {err}");
                None
            }
            Err(err) => {
                warn!("ImageCache: decode task for {url} failed: {err}");
                None
            }
        }
    }
}
