//! Generic paged resource over the API client.
//!
//! Every listing endpoint shares the same shape: a path, a scope query
//! parameter, and the `{items, isLast}` envelope. One parameterized helper
//! carries that wiring so entity modules never duplicate it.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::page_stream::Page;

use super::client::ApiClient;
use super::types::PageEnvelope;

/// A paginated listing endpoint returning records of type `T`.
pub struct PagedResource<T> {
    client: Arc<ApiClient>,
    path: &'static str,
    scope_param: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> PagedResource<T> {
    pub fn new(client: Arc<ApiClient>, path: &'static str, scope_param: &'static str) -> Self {
        Self {
            client,
            path,
            scope_param,
            _marker: PhantomData,
        }
    }

    /// Fetch one page of the listing for `scope`.
    pub async fn fetch_page(&self, scope: &str, offset: u64, limit: u64) -> Result<Page<T>> {
        let path = format!(
            "{}?{}={}&offset={}&limit={}",
            self.path, self.scope_param, scope, offset, limit
        );
        let envelope: PageEnvelope<T> = self.client.get_json(&path).await?;
        Ok(Page::new(envelope.items, envelope.is_last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::remote::client::StaticRemoteConfig;
    use crate::retry::RetryConfig;
    use crate::transport::{HttpMethod, MockTransport};

    const BASE: &str = "https://tracker.example.com";

    fn resource(transport: &MockTransport) -> PagedResource<u32> {
        let client = Arc::new(
            ApiClient::new(
                Arc::new(transport.clone()),
                Arc::new(StaticRemoteConfig::new(BASE, None)),
            )
            .with_retry_config(RetryConfig::default().with_jitter(false)),
        );
        PagedResource::new(client, "/api/widgets", "bin")
    }

    #[tokio::test]
    async fn builds_the_offset_limit_query() {
        let transport = MockTransport::new();
        transport.push_status(
            HttpMethod::Get,
            format!("{BASE}/api/widgets?bin=B7&offset=200&limit=100"),
            200,
            r#"{"items": [1, 2], "isLast": true}"#,
        );

        let page = resource(&transport)
            .fetch_page("B7", 200, 100)
            .await
            .expect("page should decode");
        assert_eq!(page.items, vec![1, 2]);
        assert!(page.is_last);
    }

    #[tokio::test]
    async fn decode_failure_surfaces_as_parse() {
        let transport = MockTransport::new();
        transport.push_status(
            HttpMethod::Get,
            format!("{BASE}/api/widgets?bin=B7&offset=0&limit=50"),
            200,
            r#"{"unexpected": "shape"}"#,
        );

        let err = resource(&transport)
            .fetch_page("B7", 0, 50)
            .await
            .expect_err("bad envelope");
        assert_eq!(err.tag(), "parse");
    }
}
