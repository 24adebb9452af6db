//! Typed update channel between background tasks and the owning context.

use flume::{Receiver, Sender};
use log::warn;

use crate::Error;

/// Sending half handed to background tasks.
///
/// Cloning is cheap. Sending never blocks (the channel is unbounded).
#[derive(Debug)]
pub struct Updater<U> {
    send: Sender<U>,
}

impl<U> Clone for Updater<U> {
    fn clone(&self) -> Self {
        Self {
            send: self.send.clone(),
        }
    }
}

impl<U> Updater<U> {
    /// Queue an update for the owner. Dropped with a warning if the owner is gone.
    pub fn set(&self, update: U) {
        if let Err(err) = self.try_set(update) {
            warn!("Updater: {err}");
        }
    }

    /// Queue an update, failing if the owner is gone.
    pub fn try_set(&self, update: U) -> Result<(), Error> {
        self.send
            .send(update)
            .map_err(|flume::SendError(_)| Error::MailboxClosed)
    }

    /// Returns true if the owning mailbox no longer exists.
    pub fn is_closed(&self) -> bool {
        self.send.is_disconnected()
    }
}

/// Receiving half, kept by the owner.
#[derive(Debug)]
pub struct Mailbox<U> {
    send: Sender<U>,
    recv: Receiver<U>,
}

impl<U> Default for Mailbox<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> Mailbox<U> {
    pub fn new() -> Self {
        let (send, recv) = flume::unbounded();
        Self { send, recv }
    }

    /// A new sending half. Every updater feeds this one mailbox.
    pub fn updater(&self) -> Updater<U> {
        Updater {
            send: self.send.clone(),
        }
    }

    /// Take every update queued so far, in send order.
    pub fn drain(&self) -> Vec<U> {
        self.recv.try_iter().collect()
    }

    /// Number of updates waiting to be drained.
    pub fn pending(&self) -> usize {
        self.recv.len()
    }
}
