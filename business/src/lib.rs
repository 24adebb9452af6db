//! Session engine for the roster directory client.
//!
//! Pages through the remote user listing, resolves and caches avatars, keeps the
//! short-lived registration token, and submits validated sign-up forms. Everything is
//! driven from a single owning [`Session`].

mod config;
mod error;

pub mod api;
pub mod connectivity;
pub mod http;
pub mod image_cache;
pub mod imaging;
pub mod positions;
pub mod registration;
pub mod session;
pub mod token;
pub mod users;

#[cfg(test)]
mod test_utils;

pub use api::{ApiClient, Position};
pub use config::{
    BusinessConfig, ConfigError, DEFAULT_API_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_TOKEN_TTL,
};
pub use connectivity::{ConnectivityMonitor, Reachability, ReachabilityProbe, ReachabilitySender};
pub use error::ApiError;
pub use http::{HttpError, HttpGateway, ReqwestGateway};
pub use image_cache::ImageCache;
pub use imaging::Avatar;
pub use positions::PositionCatalog;
pub use registration::{
    Field, RegistrationDraft, RegistrationForm, RegistrationSubmitter, SubmitOutcome,
    SubmitStatus, ValidationErrors,
};
pub use session::{Session, SessionUpdate};
pub use token::{AuthToken, TokenManager};
pub use users::{PageCursor, UserPager, UserRecord};
