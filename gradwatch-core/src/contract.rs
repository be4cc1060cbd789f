//! # contract: interfaces to the external collaborators
//!
//! The pipeline talks to three services only through the traits below:
//! - [`DocumentSource`]: fetches the markdown document listings are parsed from.
//! - [`RecordStore`]: the tracking database records are created in, listed
//!   from, and whose age field is refreshed.
//! - [`Notifier`]: best-effort announcement channel.
//!
//! All methods are async and return boxed errors. The traits are annotated for
//! `mockall` so tests can drive the flows without network access.

use async_trait::async_trait;
use mockall::automock;
use tracing::debug;

use crate::posting::{truncate_chars, Posting};

pub type ContractError = Box<dyn std::error::Error + Send + Sync>;

const MAX_TITLE_CHARS: usize = 100;
const MAX_COMPANY_CHARS: usize = 200;

/// Fields of a record to create in the store for a newly published posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    /// Job title, at most 100 characters.
    pub title: String,
    /// Company name, at most 200 characters.
    pub company: String,
    /// Source link; correlates the record back to its posting.
    pub url: String,
    /// Canonical "<N>d" age.
    pub age: String,
    pub location: String,
}

impl NewRecord {
    /// Build the record payload for `posting`, or `None` when it has no url.
    pub fn from_posting(posting: &Posting) -> Option<Self> {
        let url = posting.url.clone()?;
        Some(Self {
            title: truncate_chars(&posting.title, MAX_TITLE_CHARS),
            company: truncate_chars(&posting.company, MAX_COMPANY_CHARS),
            url,
            age: posting.age_days.clone(),
            location: posting.location.clone(),
        })
    }
}

/// A record as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    /// Store-assigned identifier.
    pub id: String,
    /// Stored copy of the posting url, if the record has one.
    pub source_link: Option<String>,
    pub age: Option<String>,
}

/// One page of a record query.
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<RemoteRecord>,
    /// Cursor for the following page; `None` on the last page.
    pub next_cursor: Option<String>,
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the full markdown document as UTF-8 text.
    async fn fetch_document(&self) -> Result<String, ContractError>;
}

/// The external tracking store.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create one record.
    async fn create_record(&self, record: NewRecord) -> Result<RemoteRecord, ContractError>;

    /// Fetch one page of existing records, starting at `cursor` (or the first page).
    async fn query_records(&self, cursor: Option<String>) -> Result<RecordPage, ContractError>;

    /// Overwrite the age field of the record with `record_id`.
    async fn update_age(&self, record_id: &str, age: &str) -> Result<(), ContractError>;
}

/// Fire-and-forget notification channel. Callers ignore failures.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), ContractError>;
}

/// Notifier used when no notification endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, text: &str) -> Result<(), ContractError> {
        debug!(len = text.len(), "Notification disabled, dropping message");
        Ok(())
    }
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Box<N> {
    async fn notify(&self, text: &str) -> Result<(), ContractError> {
        (**self).notify(text).await
    }
}

/// Query every page of the store, following cursors until none is returned.
pub async fn fetch_all_records<S>(store: &S) -> Result<Vec<RemoteRecord>, ContractError>
where
    S: RecordStore + ?Sized,
{
    let mut records = Vec::new();
    let mut cursor = None;
    loop {
        let page = store.query_records(cursor).await?;
        records.extend(page.records);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    debug!(count = records.len(), "Fetched all records from store");
    Ok(records)
}
