//! Reply construction and sending

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::{DispatchError, InputError};
use crate::mail::{MailService, OutgoingMessage};

use super::prompt::Confirm;
use super::resolver::PendingReply;

/// A reply ready to be encoded for the send endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPayload {
    pub from: String,
    pub to: String,
    pub in_reply_to: String,
    pub subject: String,
    /// Subject of the message being answered, shown when prompting
    pub original_subject: String,
    pub body: String,
}

impl ReplyPayload {
    pub fn new(reply: &PendingReply, operator: &str, body: &str) -> Self {
        Self {
            from: operator.to_string(),
            to: reply.recipient.clone(),
            in_reply_to: reply.in_reply_to.clone(),
            subject: format!("Re: {}", reply.subject),
            original_subject: reply.subject.clone(),
            body: body.to_string(),
        }
    }

    /// Header block and body as sent on the wire.
    pub fn to_rfc5322(&self) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nIn-Reply-To: {}\r\nSubject: {}\r\n\r\n{}",
            self.from, self.to, self.in_reply_to, self.subject, self.body
        )
    }

    /// URL-safe base64 of the message with trailing `=` padding removed.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_rfc5322())
    }
}

/// What happened to one pending reply.
#[derive(Debug)]
pub enum DispatchOutcome {
    Sent,
    Skipped,
    Failed(DispatchError),
}

/// Sends pending replies on behalf of the operator.
pub struct Dispatcher<'a, S, C> {
    service: &'a S,
    operator: &'a str,
    body: &'a str,
    confirm: &'a mut C,
}

impl<'a, S: MailService, C: Confirm> Dispatcher<'a, S, C> {
    pub fn new(service: &'a S, operator: &'a str, body: &'a str, confirm: &'a mut C) -> Self {
        Self {
            service,
            operator,
            body,
            confirm,
        }
    }

    /// Build, confirm and send one reply.
    ///
    /// A failed send is returned as `DispatchOutcome::Failed` so the caller
    /// can move on. Only losing the console is an error.
    pub async fn dispatch(&mut self, reply: &PendingReply) -> Result<DispatchOutcome, InputError> {
        let payload = ReplyPayload::new(reply, self.operator, self.body);

        if !self.confirm.confirm(&payload)? {
            tracing::debug!("Skipped reply to {} in thread {}", reply.recipient, reply.thread_id);
            return Ok(DispatchOutcome::Skipped);
        }

        let message = OutgoingMessage {
            raw: payload.encode(),
            thread_id: Some(reply.thread_id.clone()),
        };

        match self.service.send_message(&message).await {
            Ok(()) => {
                tracing::debug!("Sent reply to {} in thread {}", reply.recipient, reply.thread_id);
                Ok(DispatchOutcome::Sent)
            }
            Err(source) => Ok(DispatchOutcome::Failed(DispatchError {
                recipient: reply.recipient.clone(),
                in_reply_to: reply.in_reply_to.clone(),
                source,
            })),
        }
    }
}
