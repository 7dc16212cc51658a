//! Tracked issues: the issue-tracker side of the mirror.

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

const ORIGIN: &str = "issues";

/// An issue as the tracker serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct WireIssue {
    /// Issue key, e.g. `OPS-41`.
    pub key: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub revision: Option<i64>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

fn to_remote_item(issue: WireIssue) -> Result<RemoteItem> {
    if issue.key.trim().is_empty() {
        return Err(MirrorError::parse(ORIGIN, "key", issue.key));
    }
    Ok(RemoteItem {
        remote_id: issue.key,
        title: issue.summary,
        body: issue.description.unwrap_or_default(),
        revision: issue.revision,
        created_at: issue.created,
        updated_at: issue.updated,
    })
}

/// Issue listing scoped by project, plus the assign mutation used for
/// fan-out batches.
pub struct IssueSource {
    resource: PagedResource<WireIssue>,
    client: Arc<ApiClient>,
}

impl IssueSource {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            resource: PagedResource::new(Arc::clone(&client), "/api/issues", "project"),
            client,
        }
    }

    /// Assign one issue to `assignee`.
    pub async fn assign(&self, issue_key: &str, assignee: &str) -> Result<()> {
        if issue_key.trim().is_empty() {
            return Err(MirrorError::validation(ORIGIN, "issue_key", issue_key));
        }
        let path = format!("/api/issues/{issue_key}/assignee");
        self.client
            .post_json(&path, &serde_json::json!({ "assignee": assignee }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ItemSource for IssueSource {
    fn source_kind(&self) -> SourceKind {
        SourceKind::TrackedIssue
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
