//! Register a user from the command line.

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use roster_business::{RegistrationDraft, Session, SubmitOutcome};
use tracing::{info, instrument};

use crate::commands::users::print_users;
use crate::context::settle;
use crate::output::Output;

pub struct RegisterArgs {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position_id: Option<i64>,
    pub photo: Option<PathBuf>,
}

#[instrument(skip_all, name = "register", fields(position_id = args.position_id))]
pub async fn run_register(mut session: Session, args: RegisterArgs) -> Result<()> {
    let out = Output::new();

    // The catalog backs the position check.
    session.refresh_positions();
    settle(&mut session, &out).await;
    if let Some(err) = session.positions_error() {
        out.warning(format!("Could not load positions: {err}"));
    }

    let photo = match &args.photo {
        Some(path) => Some(
            tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read photo: {}", path.display()))?,
        ),
        None => None,
    };

    let draft = RegistrationDraft {
        name: args.name,
        email: args.email,
        phone: args.phone,
        position_id: args.position_id,
        photo,
    };

    let outcome = match session.submit(&draft).await {
        Ok(outcome) => outcome,
        Err(errors) => {
            out.error("The form has errors:");
            for error in errors.errors() {
                out.field_error(error.field, &error.message);
            }
            session.shutdown().await;
            bail!("{} field(s) failed validation", errors.len());
        }
    };

    let result = match &outcome {
        SubmitOutcome::Success { user_id } => {
            info!(user_id, "registered");
            out.success(&outcome);
            settle(&mut session, &out).await;
            print_users(&out, &session);
            Ok(())
        }
        SubmitOutcome::EmailExists => {
            out.error(&outcome);
            Err(anyhow::anyhow!("email or phone already registered"))
        }
        SubmitOutcome::TokenExpired => {
            out.error(&outcome);
            Err(anyhow::anyhow!("registration token was rejected"))
        }
        SubmitOutcome::Validation(message) => {
            out.error(format!("Server rejected the form: {message}"));
            Err(anyhow::anyhow!("server-side validation failed"))
        }
        SubmitOutcome::Other(message) => {
            out.error(format!("Registration failed: {message}"));
            Err(anyhow::anyhow!("registration failed"))
        }
    };

    session.shutdown().await;
    result
}
