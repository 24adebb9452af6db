use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Background task panicked: {message}")]
    TaskPanicked { message: String },
    #[error("Mailbox closed, update discarded")]
    MailboxClosed,
}

impl Error {
    pub fn task_panicked(message: impl Into<String>) -> Self {
        Self::TaskPanicked {
            message: message.into(),
        }
    }
}
