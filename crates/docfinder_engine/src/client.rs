use std::time::Duration;

use docfinder_core::{
    display_name, ActionOutcome, IngestFolderReport, IngestReport, PendingAction, RemoteFolder,
    SearchQuery, SearchResults,
};
use docfinder_logging::{df_debug, df_warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{FailureKind, ServiceError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:7777";
const EVENT_STREAM: &str = "text/event-stream";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to every call except the streaming endpoints, which run
    /// until they finish or are cancelled.
    pub request_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Answer of `POST /agent/`.
#[derive(Debug)]
pub enum AgentReply {
    /// Event-stream body, not yet read.
    Stream(Response),
    /// The backend declined the prompt; run a plain search instead.
    NotAgentTask,
}

/// Typed, stateless wrapper around the indexing service's HTTP surface.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base: Url,
    request_timeout: Duration,
}

impl ServiceClient {
    pub fn new(settings: ServiceSettings) -> Result<Self, ServiceError> {
        let mut base = Url::parse(&settings.base_url)
            .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            http,
            base,
            request_timeout: settings.request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `GET /folders/`: the backend's full inventory.
    pub async fn list_folders(&self) -> Result<Vec<RemoteFolder>, ServiceError> {
        let url = self.endpoint("folders/")?;
        let response = self.send(self.http.get(url), true).await?;
        let inventory: InventoryResponse = read_json(response).await?;
        Ok(inventory
            .folders
            .into_iter()
            .map(|folder| RemoteFolder {
                name: folder
                    .name
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| display_name(&folder.path)),
                files: folder.files.into_iter().map(|file| file.file_name).collect(),
                path: folder.path,
            })
            .collect())
    }

    /// `POST /dir/` with every path in one batch.
    pub async fn ingest(&self, paths: &[String]) -> Result<IngestReport, ServiceError> {
        let url = self.endpoint("dir/")?;
        let body = encode_body(&IngestBody { folder_path: paths })?;
        let response = self.send(self.json_post(url, body), true).await?;
        let reply: IngestResponse = read_json(response).await?;
        Ok(IngestReport {
            completed: reply.folder_paths,
            folders: reply
                .results
                .into_iter()
                .map(|result| IngestFolderReport {
                    path: result.folder_path,
                    status: result.status,
                    processed_count: result.processed_count,
                    total_attempted: result.total_attempted,
                    failed_files: result.failed_files,
                })
                .collect(),
        })
    }

    /// `DELETE /folder/`. Returns the number of files removed from the index.
    pub async fn delete_folder(&self, path: &str) -> Result<u64, ServiceError> {
        let url = self.endpoint("folder/")?;
        let body = encode_body(&DeleteBody { folder_path: path })?;
        let request = self
            .http
            .delete(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let response = self.send(request, true).await?;
        let reply: DeleteResponse = read_json(response).await?;
        Ok(reply.deleted_count)
    }

    /// `GET /query`. Folder lists are sent JSON-encoded and only when
    /// non-empty.
    pub async fn query(&self, query: &SearchQuery) -> Result<SearchResults, ServiceError> {
        let mut url = self.endpoint("query")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query_text", &query.text);
            pairs.append_pair("match_count", &query.match_count.to_string());
            if !query.folders.is_empty() {
                pairs.append_pair("folders", &encode_list(&query.folders)?);
            }
            if !query.archived_folders.is_empty() {
                pairs.append_pair("archived_folders", &encode_list(&query.archived_folders)?);
            }
        }
        let response = self.send(self.http.get(url), true).await?;
        read_json(response).await
    }

    /// `POST /agent/`. The body is returned unread when it is an event stream.
    pub async fn start_agent(
        &self,
        prompt: &str,
        match_count: u32,
    ) -> Result<AgentReply, ServiceError> {
        let url = self.endpoint("agent/")?;
        let body = encode_body(&AgentBody {
            prompt,
            match_count,
        })?;
        let request = self.json_post(url, body).header(ACCEPT, EVENT_STREAM);
        let response = self.send(request, false).await?;
        if is_event_stream(&response) {
            return Ok(AgentReply::Stream(response));
        }

        let reply: AgentStatus = read_json(response).await?;
        match reply.status.as_deref() {
            Some("not_agent_task") => Ok(AgentReply::NotAgentTask),
            other => Err(ServiceError::new(
                FailureKind::Decode,
                format!("unexpected agent reply status {other:?}"),
            )),
        }
    }

    /// `POST /summarize-file/`. Returns the event-stream response unread.
    pub async fn summarize_file(
        &self,
        file_name: &str,
        file_path: &str,
        content: Option<&str>,
    ) -> Result<Response, ServiceError> {
        let url = self.endpoint("summarize-file/")?;
        let body = encode_body(&SummarizeBody {
            file_name,
            file_path,
            content,
        })?;
        let request = self.json_post(url, body).header(ACCEPT, EVENT_STREAM);
        self.send(request, false).await
    }

    /// `POST /actions/execute` with the descriptor exactly as received.
    pub async fn execute_action(
        &self,
        action: &PendingAction,
    ) -> Result<ActionOutcome, ServiceError> {
        let url = self.endpoint("actions/execute")?;
        let body = encode_body(action.as_json())?;
        let response = self.send(self.json_post(url, body), true).await?;
        read_json(response).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base
            .join(path)
            .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn json_post(&self, url: Url, body: Vec<u8>) -> RequestBuilder {
        self.http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        bounded: bool,
    ) -> Result<Response, ServiceError> {
        let request = if bounded {
            request.timeout(self.request_timeout)
        } else {
            request
        };
        let request = request.build().map_err(map_reqwest_error)?;
        df_debug!("{} {}", request.method(), request.url().path());
        let response = self
            .http
            .execute(request)
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let path = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = error_detail(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    df_warn!("{path} returned {status}: {message}");
    Err(ServiceError::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

/// FastAPI-style `{"detail": "..."}` or a short plain-text body.
fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return value
            .get("detail")
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned);
    }
    Some(trimmed.chars().take(200).collect())
}

fn is_event_stream(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains(EVENT_STREAM))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|err| ServiceError::new(FailureKind::Decode, err.to_string()))
}

fn encode_body<T: Serialize + ?Sized>(body: &T) -> Result<Vec<u8>, ServiceError> {
    serde_json::to_vec(body).map_err(|err| ServiceError::new(FailureKind::Decode, err.to_string()))
}

fn encode_list(items: &[String]) -> Result<String, ServiceError> {
    serde_json::to_string(items)
        .map_err(|err| ServiceError::new(FailureKind::Decode, err.to_string()))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ServiceError::new(FailureKind::Decode, err.to_string());
    }
    ServiceError::new(FailureKind::Network, err.to_string())
}

#[derive(Deserialize)]
struct InventoryResponse {
    #[serde(default)]
    folders: Vec<WireFolder>,
}

#[derive(Deserialize)]
struct WireFolder {
    path: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    files: Vec<WireFile>,
}

#[derive(Deserialize)]
struct WireFile {
    file_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestBody<'a> {
    folder_path: &'a [String],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngestResponse {
    #[serde(default)]
    folder_paths: Vec<String>,
    #[serde(default)]
    results: Vec<WireIngestResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIngestResult {
    folder_path: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    processed_count: u64,
    #[serde(default)]
    total_attempted: u64,
    #[serde(default)]
    failed_files: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteBody<'a> {
    folder_path: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteResponse {
    #[serde(default)]
    deleted_count: u64,
}

#[derive(Serialize)]
struct AgentBody<'a> {
    prompt: &'a str,
    match_count: u32,
}

#[derive(Deserialize)]
struct AgentStatus {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummarizeBody<'a> {
    file_name: &'a str,
    file_path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}
