//! Notion record store: bridges the core `RecordStore` contract to the Notion REST API.
//!
//! Each published posting becomes one page in a Notion database with the
//! properties `Job Title` (title), `Company`, `Source Link` (url), `Age` and
//! `Location` (rich text). Existing pages are listed through the database
//! query endpoint, following `next_cursor` one page at a time, and the age
//! refresh patches the `Age` property in place.

use std::time::Duration;

use async_trait::async_trait;
use gradwatch_core::contract::{ContractError, NewRecord, RecordPage, RecordStore, RemoteRecord};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::load_config::NotionSettings;

pub const NOTION_API_URL: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

const TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SIZE: u32 = 100;

const PROP_TITLE: &str = "Job Title";
const PROP_COMPANY: &str = "Company";
const PROP_SOURCE_LINK: &str = "Source Link";
const PROP_AGE: &str = "Age";
const PROP_LOCATION: &str = "Location";

pub struct NotionStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
    database_id: String,
}

impl NotionStore {
    pub fn new(settings: &NotionSettings) -> Result<Self, ContractError> {
        let client = reqwest::Client::builder().timeout(TIMEOUT).build()?;
        tracing::info!(
            database_id = %settings.database_id,
            api_url = %settings.api_url,
            "Initialized NotionStore"
        );
        Ok(Self {
            client,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            database_id: settings.database_id.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }
}

#[derive(Deserialize)]
struct CreatedPage {
    id: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<PageObject>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct PageObject {
    id: String,
    #[serde(default)]
    properties: PageProperties,
}

#[derive(Deserialize, Default)]
struct PageProperties {
    #[serde(rename = "Source Link")]
    source_link: Option<UrlProperty>,
    #[serde(rename = "Age")]
    age: Option<RichTextProperty>,
}

#[derive(Deserialize)]
struct UrlProperty {
    url: Option<String>,
}

#[derive(Deserialize)]
struct RichTextProperty {
    #[serde(default)]
    rich_text: Vec<RichText>,
}

#[derive(Deserialize)]
struct RichText {
    #[serde(default)]
    plain_text: String,
}

impl From<PageObject> for RemoteRecord {
    fn from(page: PageObject) -> Self {
        let age = page.properties.age.map(|p| {
            p.rich_text
                .into_iter()
                .map(|t| t.plain_text)
                .collect::<String>()
        });
        RemoteRecord {
            id: page.id,
            source_link: page.properties.source_link.and_then(|p| p.url),
            age,
        }
    }
}

fn rich_text(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": content } }] })
}

fn page_properties(record: &NewRecord) -> Value {
    json!({
        PROP_TITLE: { "title": [{ "text": { "content": record.title } }] },
        PROP_COMPANY: rich_text(&record.company),
        PROP_SOURCE_LINK: { "url": record.url },
        PROP_AGE: rich_text(&record.age),
        PROP_LOCATION: rich_text(&record.location),
    })
}

/// Turn a non-success response into an error carrying the status and body.
async fn check_status(
    response: reqwest::Response,
    operation: &str,
) -> Result<reqwest::Response, ContractError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::error!(%status, body = %body, operation, "Notion API error");
    Err(format!("Notion API error during {operation}: {status}: {body}").into())
}

#[async_trait]
impl RecordStore for NotionStore {
    async fn create_record(&self, record: NewRecord) -> Result<RemoteRecord, ContractError> {
        tracing::info!(url = %record.url, title = %record.title, "Creating Notion page");
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": page_properties(&record),
        });

        let response = self
            .request(reqwest::Method::POST, "/pages")
            .json(&body)
            .send()
            .await?;
        let page: CreatedPage = check_status(response, "create_record").await?.json().await?;

        tracing::info!(page_id = %page.id, "Successfully created Notion page");
        Ok(RemoteRecord {
            id: page.id,
            source_link: Some(record.url),
            age: Some(record.age),
        })
    }

    async fn query_records(&self, cursor: Option<String>) -> Result<RecordPage, ContractError> {
        tracing::debug!(cursor = ?cursor, "Querying Notion database page");
        let mut body = json!({ "page_size": PAGE_SIZE });
        if let Some(cursor) = cursor {
            body["start_cursor"] = Value::String(cursor);
        }

        let path = format!("/databases/{}/query", self.database_id);
        let response = self
            .request(reqwest::Method::POST, &path)
            .json(&body)
            .send()
            .await?;
        let page: QueryResponse = check_status(response, "query_records").await?.json().await?;

        let next_cursor = if page.has_more { page.next_cursor } else { None };
        let records: Vec<RemoteRecord> = page.results.into_iter().map(RemoteRecord::from).collect();
        tracing::debug!(count = records.len(), has_more = next_cursor.is_some(), "Fetched Notion page");
        Ok(RecordPage {
            records,
            next_cursor,
        })
    }

    async fn update_age(&self, record_id: &str, age: &str) -> Result<(), ContractError> {
        tracing::debug!(record_id, age, "Updating Notion page age");
        let body = json!({ "properties": { PROP_AGE: rich_text(age) } });
        let response = self
            .request(reqwest::Method::PATCH, &format!("/pages/{record_id}"))
            .json(&body)
            .send()
            .await?;
        check_status(response, "update_age").await?;
        Ok(())
    }
}
