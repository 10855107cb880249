//! Alfresco REST repository
//!
//! Implements [`ContentRepository`] over the public REST API v1 of an Alfresco
//! Content Services server, with basic authentication and retries with
//! exponential backoff for transient failures.

use super::models::{
    split_version_id, ClassEntry, Entry, IdEntry, NodeEntry, Paged, SearchRequest, TagEntry,
    VersionEntry,
};
use crate::adapters::repository::{ContentRepository, ContentStatus, ModifiedQuery, NodeSummary};
use crate::config::RepositoryConfig;
use crate::domain::{
    BulkExportError, DateRange, NodeId, NodeRecord, PropertyDefinition, PropertyValue,
    RepositoryError, Result, Revision,
};
use crate::log_retry_attempt;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use futures::StreamExt;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Path of the core API below the server URL
const CORE_API: [&str; 7] = [
    "alfresco", "api", "-default-", "public", "alfresco", "versions", "1",
];

/// Path of the search API below the server URL
const SEARCH_API: [&str; 7] = [
    "alfresco", "api", "-default-", "public", "search", "versions", "1",
];

/// Page size of child, version and tag listings
const LIST_PAGE_SIZE: usize = 100;

/// Node fields requested on every node read
const NODE_INCLUDE: &str = "aspectNames,properties,path";

/// Alfresco REST repository
///
/// # Example
///
/// ```no_run
/// use bulk_export::adapters::{AlfrescoRepository, ContentRepository};
/// use bulk_export::config::RepositoryConfig;
/// use bulk_export::domain::NodeId;
///
/// # async fn example() -> bulk_export::domain::Result<()> {
/// let repository = AlfrescoRepository::new(RepositoryConfig::default())?;
/// let root = NodeId::new("8f2105b4-daaf-4874-9e8a-2152569d109b").expect("valid node id");
/// for child in repository.children(&root).await? {
///     println!("{child}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct AlfrescoRepository {
    base_url: Url,
    client: Client,
    config: RepositoryConfig,
}

impl AlfrescoRepository {
    /// Creates a repository client
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is malformed or the HTTP
    /// client cannot be built.
    pub fn new(config: RepositoryConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            BulkExportError::Configuration(format!(
                "Invalid repository.base_url '{}': {e}",
                config.base_url
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(BulkExportError::Configuration(format!(
                "Invalid repository.base_url '{}'",
                config.base_url
            )));
        }

        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            tracing::warn!("TLS certificate verification is disabled for the repository");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            BulkExportError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            base_url,
            client,
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, api: &[&str], segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BulkExportError::Configuration(format!(
                    "Invalid repository.base_url '{}'",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(api)
            .extend(segments);
        Ok(url)
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        self.url(&CORE_API, segments)
    }

    /// Build authorization header value
    fn auth_header_value(&self) -> Option<String> {
        use secrecy::ExposeSecret;

        match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => {
                let password: &str = password.expose_secret().as_ref();
                let credentials = format!("{username}:{password}");
                let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                Some(format!("Basic {encoded}"))
            }
            _ => None,
        }
    }

    /// Retry a request with exponential backoff
    ///
    /// Only transient repository errors are retried.
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.config.retry.max_retries.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    let transient =
                        matches!(&e, BulkExportError::Repository(r) if r.is_transient());
                    if !transient || attempt >= max_retries {
                        return Err(e);
                    }

                    let factor = self
                        .config
                        .retry
                        .backoff_multiplier
                        .powi(attempt as i32 - 1);
                    let delay_ms = ((self.config.retry.initial_delay_ms as f64) * factor) as u64;
                    let delay_ms = delay_ms.min(self.config.retry.max_delay_ms);

                    log_retry_attempt!(attempt, max_retries, delay_ms, e);

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match self.auth_header_value() {
            Some(auth) => request.header("Authorization", auth),
            None => request,
        };

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                BulkExportError::Repository(RepositoryError::Timeout(e.to_string()))
            } else {
                BulkExportError::Repository(RepositoryError::ConnectionFailed(e.to_string()))
            }
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        self.retry_request(|| async {
            let resp = self.send(self.client.get(url.clone())).await?;
            let resp = check_status(resp).await?;
            resp.json::<T>().await.map_err(invalid_response)
        })
        .await
    }

    /// Like `get_json`, with 404 mapped to `None`
    async fn get_json_opt<T: DeserializeOwned>(&self, url: &Url) -> Result<Option<T>> {
        match self.get_json(url).await {
            Ok(value) => Ok(Some(value)),
            Err(BulkExportError::Repository(RepositoryError::NodeNotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Every entry of a paged listing
    async fn list_all<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut skip = 0;

        loop {
            let mut url = self.api_url(segments)?;
            url.query_pairs_mut()
                .extend_pairs(params)
                .append_pair("skipCount", &skip.to_string())
                .append_pair("maxItems", &LIST_PAGE_SIZE.to_string());

            let page: Paged<T> = self.get_json(&url).await?;
            let count = page.list.entries.len();
            items.extend(page.list.entries.into_iter().map(|e| e.entry));

            if !page.list.pagination.has_more_items || count == 0 {
                break;
            }
            skip += count;
        }

        Ok(items)
    }

    async fn fetch_entry(&self, id: &str) -> Result<NodeEntry> {
        let mut url = self.api_url(&["nodes", id])?;
        url.query_pairs_mut().append_pair("include", NODE_INCLUDE);
        let entry: Entry<NodeEntry> = self.get_json(&url).await?;
        Ok(entry.entry)
    }

    /// Node record without the tag lookup, from a single entry fetch
    async fn untagged(&self, id: &NodeId) -> Result<NodeRecord> {
        if split_version_id(id).is_some() {
            return self.node(id).await;
        }
        Ok(self.fetch_entry(id.as_str()).await?.to_domain(id.clone()))
    }

    /// Display names of a node's tags
    async fn tag_names(&self, id: &str) -> Result<Vec<String>> {
        let tags: Vec<TagEntry> = self.list_all(&["nodes", id, "tags"], &[]).await?;
        Ok(tags.into_iter().map(|t| t.tag).collect())
    }

    /// Content URL of a live node or a frozen revision
    fn content_url(&self, id: &NodeId) -> Result<Url> {
        match split_version_id(id) {
            Some((node, label)) => self.api_url(&["nodes", node, "versions", label, "content"]),
            None => self.api_url(&["nodes", id.as_str(), "content"]),
        }
    }

    /// Opens the content download; `None` when the node has no content
    async fn open_content(&self, id: &NodeId) -> Result<Option<Response>> {
        let url = self.content_url(id)?;
        self.retry_request(|| async {
            let resp = self.send(self.client.get(url.clone())).await?;
            match resp.status() {
                status if status.is_success() => Ok(Some(resp)),
                StatusCode::NOT_FOUND => Ok(None),
                StatusCode::UNAUTHORIZED => {
                    Err(BulkExportError::Repository(RepositoryError::AuthenticationFailed(id.to_string())))
                }
                status if status.is_server_error() => Err(BulkExportError::Repository(status_error(resp).await)),
                status => {
                    tracing::debug!(node_id = %id, status = %status, "Content read refused");
                    Err(BulkExportError::Repository(RepositoryError::ContentUnavailable(id.to_string())))
                }
            }
        })
        .await
    }
}

/// AFTS query selecting the descendants of `query.root` modified in range
pub fn afts_query(query: &ModifiedQuery) -> String {
    format!(
        "ANCESTOR:\"workspace://SpacesStore/{}\" AND cm:modified:{}",
        query.root,
        afts_range(&query.range)
    )
}

fn afts_range(range: &DateRange) -> String {
    let bound = |instant: Option<chrono::DateTime<chrono::Utc>>, open: &str| match instant {
        Some(dt) => format!("\"{}\"", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
        None => open.to_string(),
    };
    format!(
        "[{} TO {}]",
        bound(range.from_instant(), "MIN"),
        bound(range.to_instant(), "MAX")
    )
}

fn invalid_response(e: impl ToString) -> BulkExportError {
    BulkExportError::Repository(RepositoryError::InvalidResponse(e.to_string()))
}

/// Passes successful responses through and maps the rest to errors
async fn check_status(resp: Response) -> Result<Response> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(BulkExportError::Repository(status_error(resp).await))
    }
}

async fn status_error(resp: Response) -> RepositoryError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RepositoryError::AuthenticationFailed(format!("status {status}: {body}"))
        }
        StatusCode::NOT_FOUND => RepositoryError::NodeNotFound(body),
        s if s.is_server_error() => RepositoryError::ServerError {
            status: s.as_u16(),
            message: body,
        },
        s => RepositoryError::ClientError {
            status: s.as_u16(),
            message: body,
        },
    }
}

#[async_trait]
impl ContentRepository for AlfrescoRepository {
    async fn children(&self, id: &NodeId) -> Result<Vec<NodeId>> {
        let entries: Vec<IdEntry> = self
            .list_all(&["nodes", id.as_str(), "children"], &[("fields", "id")])
            .await?;
        entries
            .into_iter()
            .map(|e| NodeId::new(e.id).map_err(invalid_response))
            .collect()
    }

    async fn is_folder(&self, id: &NodeId) -> Result<bool> {
        Ok(self.untagged(id).await?.is_folder)
    }

    async fn node_type(&self, id: &NodeId) -> Result<String> {
        Ok(self.untagged(id).await?.node_type)
    }

    async fn aspects(&self, id: &NodeId) -> Result<Vec<String>> {
        Ok(self.untagged(id).await?.aspects)
    }

    async fn properties(&self, id: &NodeId) -> Result<BTreeMap<String, PropertyValue>> {
        Ok(self.node(id).await?.properties)
    }

    async fn path(&self, id: &NodeId) -> Result<String> {
        Ok(self.untagged(id).await?.path)
    }

    async fn summary(&self, id: &NodeId) -> Result<NodeSummary> {
        let record = self.untagged(id).await?;
        Ok(NodeSummary {
            node_type: record.node_type,
            is_folder: record.is_folder,
        })
    }

    async fn node(&self, id: &NodeId) -> Result<NodeRecord> {
        if let Some((node, label)) = split_version_id(id) {
            let live = self.fetch_entry(node).await?;
            let mut url = self.api_url(&["nodes", node, "versions", label])?;
            url.query_pairs_mut()
                .append_pair("include", "aspectNames,properties");
            let version: Entry<VersionEntry> = self.get_json(&url).await?;
            return Ok(version.entry.to_domain(id.clone(), live.display_path()));
        }

        let entry = self.fetch_entry(id.as_str()).await?;
        let mut record = entry.to_domain(id.clone());
        if entry.is_taggable() {
            let tags = self.tag_names(id.as_str()).await?;
            record
                .properties
                .insert("cm:taggable".to_string(), PropertyValue::List(tags));
        }
        Ok(record)
    }

    async fn version_history(&self, id: &NodeId) -> Result<Option<HashMap<String, Revision>>> {
        let entry = self.fetch_entry(id.as_str()).await?;
        if !entry.is_versionable() {
            return Ok(None);
        }

        let versions: Vec<VersionEntry> = self
            .list_all(&["nodes", id.as_str(), "versions"], &[])
            .await?;

        let mut history = HashMap::with_capacity(versions.len());
        for version in &versions {
            history.insert(version.id.clone(), version.to_revision(id)?);
        }
        Ok(Some(history))
    }

    async fn query_page(
        &self,
        query: &ModifiedQuery,
        skip: usize,
        max: usize,
    ) -> Result<Vec<NodeId>> {
        let url = self.url(&SEARCH_API, &["search"])?;
        let request = SearchRequest::afts(afts_query(query), skip, max);

        tracing::debug!(query = %request.query.query, skip = skip, max = max, "Executing search");

        let page: Paged<IdEntry> = self
            .retry_request(|| async {
                let resp = self
                    .send(self.client.post(url.clone()).json(&request))
                    .await?;
                let resp = check_status(resp).await.map_err(|e| match e {
                    BulkExportError::Repository(RepositoryError::ClientError {
                        status,
                        message,
                    }) => BulkExportError::Repository(RepositoryError::QueryFailed(format!(
                        "search failed with status {status}: {message}"
                    ))),
                    other => other,
                })?;
                resp.json::<Paged<IdEntry>>()
                    .await
                    .map_err(invalid_response)
            })
            .await?;

        page.list
            .entries
            .into_iter()
            .map(|e| {
                NodeId::new(e.entry.id).map_err(invalid_response)
            })
            .collect()
    }

    async fn read_content(&self, id: &NodeId) -> Result<Option<Vec<u8>>> {
        let Some(resp) = self.open_content(id).await? else {
            return Ok(None);
        };
        let bytes = resp.bytes().await.map_err(|e| {
            tracing::debug!(node_id = %id, error = %e, "Content download failed");
            RepositoryError::ContentUnavailable(id.to_string())
        })?;
        Ok(Some(bytes.to_vec()))
    }

    async fn write_content_to_file(&self, id: &NodeId, dest: &Path) -> Result<ContentStatus> {
        let Some(resp) = self.open_content(id).await? else {
            return Ok(ContentStatus::Absent);
        };

        let io_error =
            |e: std::io::Error| BulkExportError::Io(format!("Failed to write {}: {e}", dest.display()));
        let mut file = tokio::fs::File::create(dest).await.map_err(io_error)?;

        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                tracing::debug!(node_id = %id, error = %e, "Content download failed");
                RepositoryError::ContentUnavailable(id.to_string())
            })?;
            file.write_all(&chunk).await.map_err(io_error)?;
        }
        file.flush().await.map_err(io_error)?;

        Ok(ContentStatus::Written)
    }

    async fn property_definitions(
        &self,
        class_name: &str,
    ) -> Result<Option<Vec<PropertyDefinition>>> {
        for kind in ["types", "aspects"] {
            let url = self.api_url(&[kind, class_name])?;
            if let Some(class) = self.get_json_opt::<Entry<ClassEntry>>(&url).await? {
                return Ok(Some(class.entry.to_domain()));
            }
        }
        tracing::debug!(class = %class_name, "Class not found in dictionary");
        Ok(None)
    }
}
