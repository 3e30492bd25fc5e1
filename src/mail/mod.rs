pub mod gmail;
pub mod types;

#[cfg(test)]
pub mod fake;

pub use gmail::GmailClient;
pub use types::{Header, Message, OutgoingMessage, Profile, Thread, ThreadPage, ThreadRef};

use crate::error::TransportError;

/// The operations the triage run needs from a mail service.
///
/// Calls are made one at a time; implementations need not be shareable
/// across tasks.
pub trait MailService {
    /// The account replies are sent on behalf of.
    async fn get_profile(&self) -> Result<Profile, TransportError>;

    /// One page of threads matching `query`. `None` requests the first page.
    async fn list_threads(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<ThreadPage, TransportError>;

    /// A thread with its messages, oldest first.
    async fn get_thread(&self, id: &str) -> Result<Thread, TransportError>;

    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
}
