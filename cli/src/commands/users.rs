//! List users command.

use anyhow::{Result, bail};
use roster_business::{Session, UserRecord};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::instrument;

use crate::context::settle;
use crate::output::Output;

#[derive(Tabled)]
pub struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Avatar")]
    avatar: String,
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    } else {
        s.to_owned()
    }
}

pub fn user_rows(users: &[UserRecord]) -> Vec<UserRow> {
    users
        .iter()
        .map(|user| UserRow {
            id: user.id,
            name: truncate_str(&user.name, 24),
            position: user.position.clone(),
            email: truncate_str(&user.email, 32),
            phone: user.phone.clone(),
            avatar: user
                .avatar()
                .map(|a| format!("{}x{}", a.width, a.height))
                .unwrap_or_else(|| "-".to_owned()),
        })
        .collect()
}

pub fn print_users(out: &Output, session: &Session) {
    let users = session.users();
    if users.is_empty() {
        out.dim("No users found.");
        return;
    }

    let mut table = Table::new(user_rows(users));
    table.with(Style::rounded());
    out.newline();
    out.print(table.to_string());

    let cursor = session.users_cursor();
    if let (Some(page), Some(total)) = (cursor.page(), cursor.total_pages()) {
        out.dim(format!("Page {page} of {total}"));
    }
    out.total("Total", users.len(), "user");
}

#[instrument(skip_all, name = "users", fields(pages = pages))]
pub async fn run_users(mut session: Session, pages: u32) -> Result<()> {
    let out = Output::new();

    session.load_initial_users();
    settle(&mut session, &out).await;

    let mut loaded = 1;
    while loaded < pages && session.users_has_more() {
        let Some(last) = session.users().len().checked_sub(1) else {
            break;
        };
        session.load_more_users_if_at_end(last);
        settle(&mut session, &out).await;
        loaded += 1;
    }

    let failed = session.users_error().map(str::to_owned);
    print_users(&out, &session);
    session.shutdown().await;

    if let Some(err) = failed {
        out.error(format!("Error loading users: {err}"));
        bail!("failed to load users");
    }
    Ok(())
}
