//! Cursor-based pagination over `GET /users`.
//!
//! [`UserPager`] is pure state: starting a load hands back a [`PageLoad`] that the caller runs
//! on a background task, and the finished [`PageResult`] comes back through
//! [`UserPager::apply_page`] on the owning context. Only page 1 is addressed by number;
//! every later page is whatever `links.next_url` said.
//!
//! Loads are single-flight through a [`TaskSlot`]. `load_initial` supersedes an in-flight load
//! and bumps the epoch, so results and avatars from before the reset are dropped.

use log::{debug, error, info};
use roster_states::{TaskHandle, TaskId, TaskSlot};
use url::Url;

use crate::api::{ApiClient, UserDto, UsersResponse};
use crate::error::ApiError;
use crate::imaging::Avatar;

/// A listed user plus its lazily resolved avatar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub position_id: Option<i64>,
    pub email: String,
    pub phone: String,
    pub photo_url: Url,
    avatar: Option<Avatar>,
}

impl UserRecord {
    /// The decoded photo, once resolved.
    pub fn avatar(&self) -> Option<&Avatar> {
        self.avatar.as_ref()
    }

    /// Set the avatar once. Later calls are ignored and return false.
    pub fn set_avatar(&mut self, avatar: Avatar) -> bool {
        if self.avatar.is_some() {
            return false;
        }
        self.avatar = Some(avatar);
        true
    }
}

impl From<UserDto> for UserRecord {
    fn from(dto: UserDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            position: dto.position,
            position_id: dto.position_id,
            email: dto.email,
            phone: dto.phone,
            photo_url: dto.photo,
            avatar: None,
        }
    }
}

/// Where the next page lives, if anywhere.
///
/// `has_more` is false once the server stops sending `next_url` or a load fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor {
    next: Option<Url>,
    has_more: bool,
    page: Option<u32>,
    total_pages: Option<u32>,
}

impl PageCursor {
    fn start(first: Url) -> Self {
        Self {
            next: Some(first),
            has_more: true,
            page: None,
            total_pages: None,
        }
    }

    fn advance(&mut self, envelope: &UsersResponse) {
        self.next = envelope.links.next_url.clone();
        self.has_more = self.next.is_some();
        self.page = Some(envelope.page);
        self.total_pages = Some(envelope.total_pages);
    }

    fn close(&mut self) {
        self.next = None;
        self.has_more = false;
    }

    /// URL of the next page exactly as the server sent it.
    ///
    /// `None` before the first page resolves, after the last page, and after a failed fetch.
    pub fn next(&self) -> Option<&Url> {
        self.next.as_ref()
    }

    /// Whether another page can be requested without a reset.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Last page number the server reported.
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// Total page count from the last envelope.
    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }
}

/// A page fetch ready to run off the owning context.
#[derive(Debug, Clone)]
pub struct PageLoad {
    handle: TaskHandle,
    epoch: u64,
    url: Url,
}

impl PageLoad {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn id(&self) -> TaskId {
        self.handle.id()
    }

    /// Fetch the page. Returns `None` if the load was superseded before it finished.
    pub async fn run(self, api: &ApiClient) -> Option<PageResult> {
        let token = self.handle.cancellation_token();
        tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!("PageLoad {}: cancelled", self.handle.id());
                None
            }
            outcome = api.fetch_users_page(&self.url) => Some(PageResult {
                task: self.handle.id(),
                epoch: self.epoch,
                outcome,
            }),
        }
    }
}

#[derive(Debug)]
pub struct PageResult {
    pub task: TaskId,
    pub epoch: u64,
    pub outcome: Result<UsersResponse, ApiError>,
}

/// Avatar to resolve for the record at `index`, valid only within `epoch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarRequest {
    pub epoch: u64,
    pub index: usize,
    pub url: Url,
}

#[derive(Debug)]
pub struct UserPager {
    first_page: Url,
    records: Vec<UserRecord>,
    cursor: PageCursor,
    error: Option<String>,
    epoch: u64,
    slot: TaskSlot,
}

impl UserPager {
    /// `first_page` is the fully built URL of page 1 (page number and count included).
    pub fn new(first_page: Url) -> Self {
        Self {
            cursor: PageCursor::start(first_page.clone()),
            first_page,
            records: Vec::new(),
            error: None,
            epoch: 0,
            slot: TaskSlot::new("users_page"),
        }
    }

    /// Reset to an empty list and start loading page 1.
    ///
    /// Any load still in flight is cancelled and its result will be ignored.
    pub fn load_initial(&mut self) -> PageLoad {
        self.epoch += 1;
        self.records.clear();
        self.error = None;
        self.cursor = PageCursor::start(self.first_page.clone());
        let handle = self.slot.begin();
        info!("UserPager: initial load ({})", handle.id());
        PageLoad {
            handle,
            epoch: self.epoch,
            url: self.first_page.clone(),
        }
    }

    /// Start the next page when `index` is the last record, more pages exist and nothing
    /// is loading. Otherwise do nothing.
    pub fn load_more_if_at_end(&mut self, index: usize) -> Option<PageLoad> {
        if self.records.len().checked_sub(1) != Some(index) || !self.cursor.has_more {
            return None;
        }
        let url = self.cursor.next.clone()?;
        let handle = self.slot.try_begin()?;
        self.error = None;
        info!("UserPager: loading {url} ({})", handle.id());
        Some(PageLoad {
            handle,
            epoch: self.epoch,
            url,
        })
    }

    /// Apply a finished load. Returns the avatars to resolve for newly appended records.
    pub fn apply_page(&mut self, result: PageResult) -> Vec<AvatarRequest> {
        let PageResult {
            task,
            epoch,
            outcome,
        } = result;

        if epoch != self.epoch || !self.slot.finish(task) {
            debug!("UserPager: dropping stale page result {task}");
            return Vec::new();
        }

        match outcome {
            Ok(envelope) => {
                let start = self.records.len();
                self.cursor.advance(&envelope);
                self.records
                    .extend(envelope.users.into_iter().map(UserRecord::from));
                info!(
                    "UserPager: page {}/{} applied, {} users total, has_more={}",
                    envelope.page,
                    envelope.total_pages,
                    self.records.len(),
                    self.cursor.has_more
                );
                self.records[start..]
                    .iter()
                    .enumerate()
                    .map(|(offset, record)| AvatarRequest {
                        epoch,
                        index: start + offset,
                        url: record.photo_url.clone(),
                    })
                    .collect()
            }
            Err(err) => {
                error!("UserPager: page load failed: {err}");
                self.error = Some(err.to_string());
                self.cursor.close();
                Vec::new()
            }
        }
    }

    /// Attach a resolved avatar. Ignored for stale epochs, unknown indices or records that
    /// already have one.
    pub fn set_avatar(&mut self, epoch: u64, index: usize, avatar: Avatar) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.records
            .get_mut(index)
            .is_some_and(|record| record.set_avatar(avatar))
    }

    /// Cancel the in-flight load, if any.
    pub fn cancel(&mut self) {
        self.slot.cancel();
    }

    /// Loaded users in server order.
    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.slot.is_busy()
    }

    /// Message from the last failed page load, cleared by `load_initial`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Bumped by every `load_initial`. Results carrying an older epoch are dropped.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
