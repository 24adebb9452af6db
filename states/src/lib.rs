//! Single-owner state plumbing for roster.
//!
//! Session state is owned by exactly one context (the UI thread, a CLI loop, a test).
//! Background work never touches that state directly: it receives an [`Updater`] and
//! sends typed updates, which the owner drains from its [`Mailbox`] and applies.
//!
//! [`TaskSlot`] tags in-flight work with a generation so superseded results can be
//! recognised and dropped, and [`StateRuntime`] keeps the spawned tasks in a `JoinSet`
//! so the owner can await them.

mod error;
mod runtime;
mod task;
mod updater;

pub use error::Error;
pub use runtime::StateRuntime;
pub use task::{TaskHandle, TaskId, TaskSlot};
pub use updater::{Mailbox, Updater};
