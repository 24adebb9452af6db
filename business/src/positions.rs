use log::{debug, error, info};
use roster_states::{TaskHandle, TaskId, TaskSlot};

use crate::api::{ApiClient, Position};
use crate::error::ApiError;

/// The list of positions a registrant can pick from.
///
/// Replaced wholesale on every successful refresh; a failed refresh keeps the old list.
#[derive(Debug)]
pub struct PositionCatalog {
    positions: Vec<Position>,
    error: Option<String>,
    slot: TaskSlot,
}

impl Default for PositionCatalog {
    fn default() -> Self {
        Self::from_positions(Vec::new())
    }
}

/// A positions fetch ready to run off the owning context.
#[derive(Debug, Clone)]
pub struct PositionsLoad {
    handle: TaskHandle,
}

impl PositionsLoad {
    /// Fetch the catalog. Returns `None` if the load was cancelled first.
    pub async fn run(self, api: &ApiClient) -> Option<PositionsResult> {
        let token = self.handle.cancellation_token();
        tokio::select! {
            biased;
            () = token.cancelled() => None,
            outcome = api.fetch_positions() => Some(PositionsResult {
                task: self.handle.id(),
                outcome,
            }),
        }
    }
}

#[derive(Debug)]
pub struct PositionsResult {
    pub task: TaskId,
    pub outcome: Result<Vec<Position>, ApiError>,
}

impl PositionCatalog {
    /// A catalog preloaded with `positions`, for callers that already have them.
    pub fn from_positions(positions: Vec<Position>) -> Self {
        Self {
            positions,
            error: None,
            slot: TaskSlot::new("positions"),
        }
    }

    /// Start a refresh unless one is already running.
    pub fn refresh(&mut self) -> Option<PositionsLoad> {
        let handle = self.slot.try_begin()?;
        info!("PositionCatalog: refreshing ({})", handle.id());
        Some(PositionsLoad { handle })
    }

    /// Install the result of a refresh.
    ///
    /// A success replaces the list wholesale. A failure keeps the previous list and records
    /// the error. Results from a cancelled or superseded refresh are ignored.
    pub fn apply(&mut self, result: PositionsResult) {
        if !self.slot.finish(result.task) {
            debug!("PositionCatalog: dropping stale result {}", result.task);
            return;
        }
        match result.outcome {
            Ok(positions) => {
                info!("PositionCatalog: {} positions", positions.len());
                self.positions = positions;
                self.error = None;
            }
            Err(err) => {
                error!("PositionCatalog: refresh failed: {err}");
                self.error = Some(err.to_string());
            }
        }
    }

    /// Whether `id` names a position in the current list.
    pub fn contains(&self, id: i64) -> bool {
        self.positions.iter().any(|p| p.id == id)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Message from the last failed refresh, cleared by the next success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.slot.is_busy()
    }

    pub fn cancel(&mut self) {
        self.slot.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::BusinessConfig;
    use crate::test_utils::ScriptedGateway;

    fn api(gateway: &ScriptedGateway) -> ApiClient {
        let config = BusinessConfig::from_base_url("https://api.test/api/v1").unwrap();
        ApiClient::new(Arc::new(gateway.clone()), &config)
    }

    fn positions_json() -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "positions": [
                {"id": 1, "name": "Lawyer"},
                {"id": 2, "name": "Content manager"},
                {"id": 3, "name": "Security"},
                {"id": 4, "name": "Designer"}
            ]
        })
    }

    #[tokio::test]
    async fn refresh_replaces_list() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(200, positions_json());
        let api = api(&gateway);
        let mut catalog = PositionCatalog::from_positions(vec![Position {
            id: 9,
            name: "Old".to_owned(),
        }]);

        let load = catalog.refresh().unwrap();
        assert!(catalog.refresh().is_none(), "refresh already in flight");
        catalog.apply(load.run(&api).await.unwrap());

        assert_eq!(catalog.positions().len(), 4);
        assert!(catalog.contains(4));
        assert!(!catalog.contains(9));
        assert!(!catalog.is_loading());
        assert!(gateway.requests()[0].url().ends_with("/positions"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_list() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(200, positions_json());
        gateway.push_json(500, serde_json::json!({"message": "down"}));
        let api = api(&gateway);
        let mut catalog = PositionCatalog::default();

        let load = catalog.refresh().unwrap();
        catalog.apply(load.run(&api).await.unwrap());
        let load = catalog.refresh().unwrap();
        catalog.apply(load.run(&api).await.unwrap());

        assert_eq!(catalog.positions().len(), 4);
        assert_eq!(catalog.error(), Some("Unexpected response: down"));
    }

    #[test]
    fn positions_without_success_flag_decode() {
        let body: crate::api::PositionsResponse =
            serde_json::from_value(serde_json::json!({"positions": [{"id": 1, "name": "Lawyer"}]}))
                .unwrap();
        assert!(body.success);
        assert_eq!(body.positions.len(), 1);
    }
}
