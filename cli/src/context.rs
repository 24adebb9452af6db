//! Session construction and task draining for one CLI invocation.

use anyhow::{Context as _, Result};
use roster_business::{BusinessConfig, Session};
use tracing::instrument;

use crate::output::Output;

/// Config from `ROSTER_*` variables, with `--api-url` taking precedence.
pub fn load_config(api_url: Option<&str>) -> Result<BusinessConfig> {
    let config = BusinessConfig::from_env().context("Invalid ROSTER_* environment")?;
    match api_url {
        Some(url) => {
            let base = BusinessConfig::from_base_url(url)
                .with_context(|| format!("Invalid --api-url: {url}"))?;
            Ok(BusinessConfig {
                api_base_url: base.api_base_url,
                ..config
            })
        }
        None => Ok(config),
    }
}

pub fn build_session(config: BusinessConfig) -> Result<Session> {
    Session::new(config).context("Failed to build HTTP client")
}

/// Await every in-flight task and warn if the backend looked unreachable.
#[instrument(skip_all, name = "settle")]
pub async fn settle(session: &mut Session, out: &Output) {
    session.settle().await;
    if !session.is_connected() {
        out.warning("No internet connection: the directory API is unreachable");
    }
}
