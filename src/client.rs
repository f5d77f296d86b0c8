use std::env;
use std::fmt;
use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::{ErrorDetail, process_sse};
use crate::types::{GenerateContentRequest, GenerateContentResponse, Model};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// The environment variable the API key is read from.
pub const API_KEY_VARIABLE: &str = "GOOGLE_API_KEY";

/// A boxed stream of response chunks for a single request.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>;

/// The remote side of a chat: turns a request into a stream of response chunks.
///
/// [`Gemini`] is the production implementation; the chat session only ever
/// talks to this trait.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Open a streaming generation request.
    ///
    /// Returns once the service has accepted the request. Errors that occur
    /// after that point are delivered through the stream.
    async fn stream_generate_content(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<ResponseStream>;
}

/// Client for the Gemini API.
#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
}

impl Gemini {
    /// Create a new Gemini client with the given API key.
    ///
    /// No request timeout is configured.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(Some(api_key.into()), None, None)
    }

    /// Create a new client from the `GOOGLE_API_KEY` environment variable.
    ///
    /// Fails with [`Error::MissingCredential`] if the variable is unset or blank.
    pub fn from_env() -> Result<Self> {
        let api_key = api_key_from(env::var(API_KEY_VARIABLE).ok())?;
        Self::new(api_key)
    }

    /// Create a new client with custom settings.
    ///
    /// A missing `api_key` is read from the environment; a missing `base_url`
    /// targets the public endpoint.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => api_key_from(Some(key))?,
            None => api_key_from(env::var(API_KEY_VARIABLE).ok())?,
        };

        let base_url = base_url.as_deref().unwrap_or(DEFAULT_API_URL);
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {e}"),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
        })
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        let mut key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| Error::authentication("API key contains invalid characters"))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);
        Ok(headers)
    }

    /// The URL of `method` on `model`, e.g. `models/gemini-1.5-pro-latest:streamGenerateContent`.
    fn endpoint(&self, model: &Model, method: &str) -> Result<Url> {
        let model = model.to_string();
        let path = if model.contains('/') {
            format!("{model}:{method}")
        } else {
            format!("models/{model}:{method}")
        };
        Ok(self.base_url.join(&path)?)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_status = detail.as_ref().and_then(|e| e.status.clone());
        let error_message = detail
            .and_then(|e| e.message)
            .unwrap_or_else(|| error_body.clone());

        match status_code {
            400 => Error::bad_request(error_message),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::request_timeout(error_message),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(status_code, error_message, retry_after),
            _ => Error::api(status_code, error_status, error_message),
        }
    }

    /// Send a request to `streamGenerateContent` and stream the response chunks.
    pub async fn stream(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<impl Stream<Item = Result<GenerateContentResponse>> + Send + 'static> {
        let mut url = self.endpoint(model, "streamGenerateContent")?;
        url.query_pairs_mut().append_pair("alt", "sse");

        tracing::debug!(
            %model,
            turns = request.contents.len(),
            "sending streamGenerateContent request"
        );
        CLIENT_REQUESTS.click();
        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .headers(self.default_headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {e}"),
                        self.timeout.map(|t| t.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(e.to_string(), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
                }
            })?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response).await;
            tracing::debug!(error = %err, "streamGenerateContent rejected");
            return Err(err);
        }

        Ok(process_sse(response.bytes_stream()))
    }
}

#[async_trait::async_trait]
impl ChatBackend for Gemini {
    async fn stream_generate_content(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<ResponseStream> {
        let stream = self.stream(model, request).await?;
        Ok(Box::pin(stream))
    }
}

impl fmt::Debug for Gemini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gemini")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Validate a candidate API key, treating absent and blank keys alike.
fn api_key_from(value: Option<String>) -> Result<String> {
    value
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| Error::missing_credential(API_KEY_VARIABLE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;

    #[test]
    fn client_creation() {
        let client = Gemini::new("test-key").unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url.as_str(), DEFAULT_API_URL);
        assert_eq!(client.timeout, None);

        let client = Gemini::with_options(
            Some("test-key".to_string()),
            Some("http://127.0.0.1:9999/v1beta".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url.as_str(), "http://127.0.0.1:9999/v1beta/");
        assert_eq!(client.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn blank_key_is_missing_credential() {
        assert!(api_key_from(None).unwrap_err().is_missing_credential());
        assert!(
            api_key_from(Some("   ".to_string()))
                .unwrap_err()
                .is_missing_credential()
        );
        assert_eq!(api_key_from(Some(" k ".to_string())).unwrap(), "k");
        assert!(Gemini::new("").unwrap_err().is_missing_credential());
    }

    #[test]
    fn endpoint_for_known_and_tuned_models() {
        let client = Gemini::new("test-key").unwrap();

        let url = client
            .endpoint(
                &Model::Known(KnownModel::Gemini15ProLatest),
                "streamGenerateContent",
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro-latest:streamGenerateContent"
        );

        let url = client
            .endpoint(&Model::from("tunedModels/pirate-7"), "streamGenerateContent")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/tunedModels/pirate-7:streamGenerateContent"
        );
    }

    #[tokio::test]
    async fn refused_connection_is_reported_once() {
        let client = Gemini::with_options(
            Some("test-key".to_string()),
            Some("http://127.0.0.1:1/v1beta".to_string()),
            None,
        )
        .unwrap();
        let request = GenerateContentRequest::new(vec![crate::types::Content::user("Hello")]);

        let err = match client.stream(&Model::default(), &request).await {
            Ok(_) => panic!("expected the connection to be refused"),
            Err(err) => err,
        };

        assert!(matches!(err, Error::Connection { .. }), "{err:?}");
        let message = err.to_string();
        assert!(message.starts_with("Connection error: "), "{message}");
        assert_eq!(message.matches("Connection error").count(), 1, "{message}");
    }

    #[test]
    fn debug_redacts_key() {
        let client = Gemini::new("super-secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
