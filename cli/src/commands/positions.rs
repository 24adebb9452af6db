//! List positions command.

use anyhow::{Result, bail};
use roster_business::Session;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::instrument;

use crate::context::settle;
use crate::output::Output;

#[derive(Tabled)]
struct PositionRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Position")]
    name: String,
}

#[instrument(skip_all, name = "positions")]
pub async fn run_positions(mut session: Session) -> Result<()> {
    let out = Output::new();

    session.refresh_positions();
    settle(&mut session, &out).await;

    if let Some(err) = session.positions_error() {
        out.error(format!("Error loading positions: {err}"));
        session.shutdown().await;
        bail!("failed to load positions");
    }

    let rows: Vec<PositionRow> = session
        .positions()
        .iter()
        .map(|p| PositionRow {
            id: p.id,
            name: p.name.clone(),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    out.newline();
    out.print(table.to_string());
    out.total("Total", rows.len(), "position");

    session.shutdown().await;
    Ok(())
}
