//! Leaf-reply resolution
//!
//! Walks a thread from its newest message backwards and records, per
//! sender, the most recent message that came after the operator's last
//! reply. Those are the messages still owed an answer.

use std::collections::BTreeMap;

use crate::mail::{Header, Message, Thread, ThreadRef};

/// The three header fields the resolver looks at.
/// Missing headers are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageHeaderView {
    pub from: String,
    pub subject: String,
    pub message_id: String,
}

impl MessageHeaderView {
    pub fn from_headers(headers: &[Header]) -> Self {
        let mut view = Self::default();
        // Later duplicates overwrite earlier ones
        for header in headers {
            let slot = if header.name.eq_ignore_ascii_case("From") {
                &mut view.from
            } else if header.name.eq_ignore_ascii_case("Subject") {
                &mut view.subject
            } else if header.name.eq_ignore_ascii_case("Message-ID") {
                &mut view.message_id
            } else {
                continue;
            };
            slot.clone_from(&header.value);
        }
        view
    }
}

/// One reply owed to one sender in one thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub recipient: String,
    pub in_reply_to: String,
    pub subject: String,
    pub thread_id: ThreadRef,
}

/// Pending replies for a thread keyed by sender, at most one per sender.
pub type PendingReplies = BTreeMap<String, PendingReply>;

/// Resolve which senders in `thread` still need a reply from `operator`.
pub fn resolve(thread: &Thread, operator: &str) -> PendingReplies {
    let operator = operator.to_ascii_lowercase();
    let mut pending = PendingReplies::new();

    for message in chronological(thread).into_iter().rev() {
        let view = MessageHeaderView::from_headers(message.headers());

        if is_from_operator(&view.from, &operator) {
            // Everything older was answered by this message
            break;
        }

        pending.entry(view.from.clone()).or_insert_with(|| PendingReply {
            recipient: view.from,
            in_reply_to: view.message_id,
            subject: view.subject,
            thread_id: thread.id.clone(),
        });
    }

    pending
}

fn is_from_operator(from: &str, operator_lower: &str) -> bool {
    from.to_ascii_lowercase().contains(operator_lower)
}

/// The thread's messages oldest first.
///
/// The service is expected to return them in that order already. When every
/// message carries a timestamp the order is checked, and restored with a
/// stable sort if it was violated.
fn chronological(thread: &Thread) -> Vec<&Message> {
    let mut messages: Vec<&Message> = thread.messages.iter().collect();

    let Some(dates) = messages
        .iter()
        .map(|m| m.internal_date_ms())
        .collect::<Option<Vec<i64>>>()
    else {
        return messages;
    };

    if dates.windows(2).any(|pair| pair[0] > pair[1]) {
        tracing::warn!(
            "Messages of thread {} are not in chronological order, sorting by date",
            thread.id
        );
        messages.sort_by_key(|m| m.internal_date_ms());
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::fake::{message, thread};

    const OPERATOR: &str = "me@example.com";

    fn dated(mut msg: Message, ms: i64) -> Message {
        msg.internal_date = Some(ms.to_string());
        msg
    }

    #[test]
    fn test_header_view_extracts_fields() {
        let headers = vec![
            Header::new("Received", "by mx"),
            Header::new("From", "Alice <a@x.com>"),
            Header::new("Subject", "Hi"),
            Header::new("Message-Id", "<1@x.com>"),
        ];
        let view = MessageHeaderView::from_headers(&headers);
        assert_eq!(view.from, "Alice <a@x.com>");
        assert_eq!(view.subject, "Hi");
        assert_eq!(view.message_id, "<1@x.com>");
    }

    #[test]
    fn test_header_view_missing_headers_are_empty() {
        let view = MessageHeaderView::from_headers(&[Header::new("From", "a@x.com")]);
        assert_eq!(view.subject, "");
        assert_eq!(view.message_id, "");
    }

    #[test]
    fn test_header_view_last_duplicate_wins() {
        let headers = vec![
            Header::new("Subject", "first"),
            Header::new("Subject", "second"),
        ];
        assert_eq!(MessageHeaderView::from_headers(&headers).subject, "second");
    }

    #[test]
    fn test_empty_thread() {
        assert!(resolve(&thread("t", vec![]), OPERATOR).is_empty());
    }

    #[test]
    fn test_newest_from_operator_yields_nothing() {
        let t = thread(
            "t",
            vec![
                message("a@x.com", "Hi", "<1>"),
                message("Me <me@example.com>", "Re: Hi", "<2>"),
            ],
        );
        assert!(resolve(&t, OPERATOR).is_empty());
    }

    #[test]
    fn test_thread_entirely_from_operator() {
        let t = thread(
            "t",
            vec![
                message(OPERATOR, "Note", "<1>"),
                message(OPERATOR, "Note 2", "<2>"),
            ],
        );
        assert!(resolve(&t, OPERATOR).is_empty());
    }

    #[test]
    fn test_distinct_senders_each_get_a_reply() {
        let t = thread(
            "t",
            vec![message("a@x.com", "Hi", "<1>"), message("b@x.com", "Hi", "<2>")],
        );
        let pending = resolve(&t, OPERATOR);
        assert_eq!(pending.len(), 2);
        assert_eq!(
            pending["a@x.com"],
            PendingReply {
                recipient: "a@x.com".to_string(),
                in_reply_to: "<1>".to_string(),
                subject: "Hi".to_string(),
                thread_id: "t".to_string(),
            }
        );
        assert_eq!(pending["b@x.com"].in_reply_to, "<2>");
    }

    #[test]
    fn test_repeated_sender_gets_newest_message() {
        let t = thread(
            "t",
            vec![
                message("a@x.com", "Hi", "<1>"),
                message("a@x.com", "Hi again", "<2>"),
            ],
        );
        let pending = resolve(&t, OPERATOR);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending["a@x.com"].in_reply_to, "<2>");
        assert_eq!(pending["a@x.com"].subject, "Hi again");
    }

    #[test]
    fn test_stops_at_operator_reply() {
        let t = thread(
            "t",
            vec![
                message("old@x.com", "Hi", "<1>"),
                message(OPERATOR, "Re: Hi", "<2>"),
                message("a@x.com", "Re: Hi", "<3>"),
            ],
        );
        let pending = resolve(&t, OPERATOR);
        assert_eq!(pending.keys().collect::<Vec<_>>(), vec!["a@x.com"]);
    }

    #[test]
    fn test_operator_match_ignores_case() {
        let t = thread("t", vec![message("Me <ME@Example.com>", "Hi", "<1>")]);
        assert!(resolve(&t, OPERATOR).is_empty());
    }

    #[test]
    fn test_one_entry_per_sender() {
        let senders = ["a@x.com", "b@x.com", "a@x.com", "c@x.com", "b@x.com", "a@x.com"];
        let messages = senders
            .iter()
            .enumerate()
            .map(|(i, s)| message(s, "Hi", &format!("<{}>", i)))
            .collect();
        let pending = resolve(&thread("t", messages), OPERATOR);
        assert_eq!(pending.len(), 3);
        assert_eq!(pending["a@x.com"].in_reply_to, "<5>");
        assert_eq!(pending["b@x.com"].in_reply_to, "<4>");
        assert_eq!(pending["c@x.com"].in_reply_to, "<3>");
    }

    #[test]
    fn test_out_of_order_messages_are_sorted_by_date() {
        // Returned newest first: the operator's reply is actually the latest
        let t = thread(
            "t",
            vec![
                dated(message(OPERATOR, "Re: Hi", "<2>"), 2_000),
                dated(message("a@x.com", "Hi", "<1>"), 1_000),
            ],
        );
        assert!(resolve(&t, OPERATOR).is_empty());
    }

    #[test]
    fn test_order_trusted_without_dates() {
        let t = thread(
            "t",
            vec![
                dated(message(OPERATOR, "Re: Hi", "<2>"), 2_000),
                message("a@x.com", "Hi", "<1>"),
            ],
        );
        let pending = resolve(&t, OPERATOR);
        assert_eq!(pending["a@x.com"].in_reply_to, "<1>");
    }
}
