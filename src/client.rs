use std::pin::Pin;
use std::time::Instant;

use bytes::Bytes;
use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};

/// A streamed answer body, chunk by chunk, as it arrives from the service.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// The JSON body posted to the answering service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionRequest {
    /// The trimmed question typed by the user.
    pub question: String,
}

impl QuestionRequest {
    /// Create a new `QuestionRequest`.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }

    /// Encode the request as the JSON body of the POST.
    pub fn to_body(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A remote service that answers one question with a streamed text body.
#[async_trait::async_trait]
pub trait AnswerService: Send + Sync {
    /// Dispatch `question` and return the answer body.
    ///
    /// Resolves once the service has confirmed it will stream an answer; a
    /// failure status or a response without a body is an error.
    async fn ask(&self, question: &str) -> Result<ByteStream>;
}

/// HTTP client for the answering service.
#[derive(Debug, Clone)]
pub struct AnswerClient {
    client: ReqwestClient,
    endpoint: Url,
}

impl AnswerClient {
    /// Create a client that posts questions to `endpoint`.
    pub fn new(endpoint: Url) -> Result<Self> {
        let client = ReqwestClient::builder().build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {e}"),
                Some(Box::new(e)),
            )
        })?;
        Ok(Self::with_http_client(endpoint, client))
    }

    /// Create a client from an endpoint string.
    pub fn from_endpoint(endpoint: &str) -> Result<Self> {
        Self::new(Url::parse(endpoint)?)
    }

    /// Create a client around a preconfigured reqwest client.
    pub fn with_http_client(endpoint: Url, client: ReqwestClient) -> Self {
        Self { client, endpoint }
    }

    /// The URL questions are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/plain, */*"));
        headers
    }

    /// Convert a failure response into `RequestFailed`, logging what the service said.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        match response.text().await {
            Ok(body) => {
                let excerpt: String = body.chars().take(200).collect();
                tracing::warn!(status = status.as_u16(), body = %excerpt, "answering service rejected question");
            }
            Err(e) => {
                tracing::warn!(status = status.as_u16(), error = %e, "answering service rejected question");
            }
        }
        Error::request_failed(status.as_u16())
    }
}

#[async_trait::async_trait]
impl AnswerService for AnswerClient {
    async fn ask(&self, question: &str) -> Result<ByteStream> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        tracing::debug!(endpoint = %self.endpoint, "posting question");
        let body = QuestionRequest::new(question).to_body()?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(Self::default_headers())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                if e.is_connect() {
                    Error::connection(e.to_string(), Some(Box::new(e)))
                } else if e.is_timeout() {
                    Error::connection(format!("timed out: {e}"), Some(Box::new(e)))
                } else {
                    Error::http_client(e.to_string(), Some(Box::new(e)))
                }
            })?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let status = response.status();
        if !status.is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }
        if !has_body(status) {
            CLIENT_REQUEST_ERRORS.click();
            tracing::warn!(status = status.as_u16(), "answer response carries no body");
            return Err(Error::request_failed(status.as_u16()));
        }

        let stream = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                Error::stream_read_failed(e.to_string(), Some(Box::new(e)))
            })
        });
        Ok(Box::pin(stream))
    }
}

/// Statuses whose responses never carry a body.
fn has_body(status: StatusCode) -> bool {
    !matches!(
        status,
        StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
    )
}
