//! Wiki pages: the document side of the mirror.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::entity::source_kind::SourceKind;
use crate::error::{MirrorError, Result};
use crate::page_stream::Page;

use super::client::ApiClient;
use super::resource::PagedResource;
use super::types::RemoteItem;
use super::ItemSource;

const ORIGIN: &str = "pages";

/// A wiki page as the service serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct WirePage {
    /// Numeric page id.
    pub id: i64,
    #[serde(default)]
    pub title: String,
    /// Page body. The wiki calls this `content`.
    #[serde(default)]
    pub content: Option<String>,
    /// Monotonic revision counter.
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

fn to_remote_item(page: WirePage) -> Result<RemoteItem> {
    if page.id <= 0 {
        return Err(MirrorError::parse(ORIGIN, "id", page.id.to_string()));
    }
    Ok(RemoteItem {
        remote_id: page.id.to_string(),
        title: page.title,
        body: page.content.unwrap_or_default(),
        revision: page.version,
        created_at: page.created,
        updated_at: page.updated,
    })
}

/// Wiki page listing scoped by space.
pub struct PageSource {
    resource: PagedResource<WirePage>,
}

impl PageSource {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            resource: PagedResource::new(client, "/api/pages", "space"),
        }
    }
}

#[async_trait]
impl ItemSource for PageSource {
    fn source_kind(&self) -> SourceKind {
        SourceKind::WikiPage
    }

    async fn fetch_page(
        &self,
        scope_key: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Page<RemoteItem>> {
        let page = self.resource.fetch_page(scope_key, offset, limit).await?;
        let is_last = page.is_last;
        let items = page
            .items
            .into_iter()
            .map(to_remote_item)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, is_last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::remote::client::StaticRemoteConfig;
    use crate::retry::RetryConfig;
    use crate::transport::{HttpMethod, MockTransport};

    const BASE: &str = "https://tracker.example.com";

    fn source(transport: &MockTransport) -> PageSource {
        let client = Arc::new(
            ApiClient::new(
                Arc::new(transport.clone()),
                Arc::new(StaticRemoteConfig::new(BASE, None)),
            )
            .with_retry_config(RetryConfig::default().with_jitter(false)),
        );
        PageSource::new(client)
    }

    #[test]
    fn wire_page_converts_id_to_remote_id() {
        let page: WirePage =
            serde_json::from_str(r#"{"id": 9001, "title": "Runbook", "version": 12}"#)
                .expect("decode");
        let item = to_remote_item(page).expect("convert");
        assert_eq!(item.remote_id, "9001");
        assert_eq!(item.title, "Runbook");
        assert_eq!(item.revision, Some(12));
    }

    #[test]
    fn non_positive_id_is_a_parse_failure() {
        let page = WirePage {
            id: 0,
            title: String::new(),
            content: None,
            version: None,
            created: None,
            updated: None,
        };
        let err = to_remote_item(page).expect_err("bad id");
        assert_eq!(err.tag(), "parse");
    }

    #[tokio::test]
    async fn fetch_page_decodes_the_space_listing() {
        let transport = MockTransport::new();
        transport.push_status(
            HttpMethod::Get,
            format!("{BASE}/api/pages?space=DOCS&offset=0&limit=50"),
            200,
            r#"{"items": [
                {"id": 1, "title": "Home", "content": "Welcome"},
                {"id": 2, "title": "Oncall", "content": "Page the pager", "version": 4}
            ], "isLast": true}"#,
        );

        let page = source(&transport)
            .fetch_page("DOCS", 0, 50)
            .await
            .expect("page");
        assert!(page.is_last);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].remote_id, "1");
        assert_eq!(page.items[1].body, "Page the pager");
        assert_eq!(page.items[1].revision, Some(4));
    }

    #[tokio::test]
    async fn malformed_item_fails_the_whole_page() {
        let transport = MockTransport::new();
        transport.push_status(
            HttpMethod::Get,
            format!("{BASE}/api/pages?space=DOCS&offset=0&limit=50"),
            200,
            r#"{"items": [{"id": 1, "title": "Ok"}, {"id": -3, "title": "Broken"}], "isLast": true}"#,
        );

        let err = source(&transport)
            .fetch_page("DOCS", 0, 50)
            .await
            .expect_err("bad item");
        assert_eq!(err.tag(), "parse");
    }
}
