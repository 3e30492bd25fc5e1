//! In-memory mail service for tests

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::error::TransportError;

use super::MailService;
use super::types::{Header, Message, MessagePart, OutgoingMessage, Profile, Thread, ThreadPage, ThreadSummary};

#[derive(Default)]
pub struct FakeMailService {
    pub address: String,
    pub pages: Vec<ThreadPage>,
    pub threads: HashMap<String, Thread>,
    /// Ids of threads added with `with_thread`, listed as one page when no
    /// explicit pages were given
    pub thread_order: Vec<String>,
    /// Sends for these thread ids fail with a 500
    pub failing_threads: HashSet<String>,
    /// Page index whose request fails
    pub failing_page: Option<usize>,
    pub list_calls: RefCell<Vec<(String, Option<String>)>>,
    pub sent: RefCell<Vec<OutgoingMessage>>,
}

impl FakeMailService {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, ids: &[&str], next_page_token: &str) -> Self {
        self.pages.push(page(ids, next_page_token));
        self
    }

    pub fn with_thread(mut self, thread: Thread) -> Self {
        self.thread_order.push(thread.id.clone());
        self.threads.insert(thread.id.clone(), thread);
        self
    }

    fn status_error(endpoint: &str) -> TransportError {
        TransportError::Status {
            endpoint: endpoint.to_string(),
            status: 500,
            body: "backend error".to_string(),
        }
    }
}

impl MailService for FakeMailService {
    async fn get_profile(&self) -> Result<Profile, TransportError> {
        Ok(Profile {
            email_address: self.address.clone(),
        })
    }

    async fn list_threads(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<ThreadPage, TransportError> {
        let index = self.list_calls.borrow().len();
        self.list_calls
            .borrow_mut()
            .push((query.to_string(), page_token.map(str::to_string)));
        if self.failing_page == Some(index) {
            return Err(Self::status_error("threads.list"));
        }
        if self.pages.is_empty() && index == 0 {
            let ids: Vec<&str> = self.thread_order.iter().map(String::as_str).collect();
            return Ok(page(&ids, ""));
        }
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }

    async fn get_thread(&self, id: &str) -> Result<Thread, TransportError> {
        self.threads.get(id).cloned().ok_or_else(|| TransportError::Status {
            endpoint: "threads.get".to_string(),
            status: 404,
            body: format!("thread {} not found", id),
        })
    }

    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        if let Some(thread_id) = &message.thread_id
            && self.failing_threads.contains(thread_id)
        {
            return Err(Self::status_error("messages.send"));
        }
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }
}

pub fn page(ids: &[&str], next_page_token: &str) -> ThreadPage {
    ThreadPage {
        threads: ids
            .iter()
            .map(|id| ThreadSummary { id: id.to_string() })
            .collect(),
        next_page_token: next_page_token.to_string(),
    }
}

/// Message with From, Subject and Message-ID headers
pub fn message(from: &str, subject: &str, message_id: &str) -> Message {
    Message {
        internal_date: None,
        payload: MessagePart {
            headers: vec![
                Header::new("From", from),
                Header::new("Subject", subject),
                Header::new("Message-ID", message_id),
            ],
        },
    }
}

pub fn thread(id: &str, messages: Vec<Message>) -> Thread {
    Thread {
        id: id.to_string(),
        messages,
    }
}
