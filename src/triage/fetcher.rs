//! Paginated thread search

use futures::{Stream, TryStreamExt, stream};

use crate::error::TransportError;
use crate::mail::{MailService, ThreadRef};

enum Cursor {
    First,
    Next(String),
    Done,
}

/// Lazily request pages of thread ids matching `query`.
///
/// Pagination ends after a page with no continuation token or with no
/// threads. Every poll of a fresh stream issues new requests.
pub fn thread_pages<'a, S: MailService>(
    service: &'a S,
    query: &'a str,
) -> impl Stream<Item = Result<Vec<ThreadRef>, TransportError>> + 'a {
    stream::try_unfold(Cursor::First, move |cursor| next_page(service, query, cursor))
}

async fn next_page<S: MailService>(
    service: &S,
    query: &str,
    cursor: Cursor,
) -> Result<Option<(Vec<ThreadRef>, Cursor)>, TransportError> {
    let token = match cursor {
        Cursor::Done => return Ok(None),
        Cursor::First => None,
        Cursor::Next(token) => Some(token),
    };

    let page = service.list_threads(query, token.as_deref()).await?;
    tracing::debug!(
        "Fetched page of {} threads (more: {})",
        page.threads.len(),
        !page.next_page_token.is_empty()
    );

    let next = if page.threads.is_empty() || page.next_page_token.is_empty() {
        Cursor::Done
    } else {
        Cursor::Next(page.next_page_token)
    };
    let ids = page.threads.into_iter().map(|t| t.id).collect();
    Ok(Some((ids, next)))
}

/// All thread ids matching `query`. Fails if any page request fails.
pub async fn list_threads<S: MailService>(
    service: &S,
    query: &str,
) -> Result<Vec<ThreadRef>, TransportError> {
    thread_pages(service, query).try_concat().await
}
