//! Transport seam between the pipeline and the network
//!
//! `Transport` performs one authenticated exchange and hands back the raw
//! status and body; classifying the result is the pipeline's job.
//! `HttpTransport` is the real implementation: reqwest plus a SigV4 signer
//! that is created on first use and then shared by every request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use atmosphere_auth::{RequestSigner, SharedCredentialsProvider, SigV4Signer, SigningScope};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Url};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Upper bound on one HTTP exchange, connect through last body byte.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One request to the service. Reused unchanged across retries.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the endpoint, starting with `/`.
    pub path: String,
    pub body: serde_json::Value,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method,
            path: path.into(),
            body,
        }
    }
}

/// Raw outcome of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub status_text: Option<String>,
    pub body: String,
}

/// Sends one request and returns the service's raw answer.
///
/// Uses `Pin<Box<dyn Future>>` so clients can hold an `Arc<dyn Transport>`.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: &'a ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResponse>> + Send + 'a>>;
}

/// Where the signer comes from when it is first needed.
struct SignerSource {
    /// `None` loads the default AWS credential chain.
    credentials: Option<SharedCredentialsProvider>,
    scope: SigningScope,
}

/// HTTPS transport signing every request with SigV4.
pub struct HttpTransport {
    endpoint: Url,
    http: reqwest::Client,
    signer: OnceCell<Arc<dyn RequestSigner>>,
    source: Option<SignerSource>,
}

impl HttpTransport {
    /// Transport signing with the default AWS credential chain, loaded on the
    /// first request.
    pub fn new(endpoint: &str, scope: SigningScope) -> Result<Self> {
        Self::build(
            endpoint,
            Some(SignerSource {
                credentials: None,
                scope,
            }),
            OnceCell::new(),
        )
    }

    /// Transport whose signer draws on `credentials`.
    pub fn with_credentials(
        endpoint: &str,
        credentials: SharedCredentialsProvider,
        scope: SigningScope,
    ) -> Result<Self> {
        Self::build(
            endpoint,
            Some(SignerSource {
                credentials: Some(credentials),
                scope,
            }),
            OnceCell::new(),
        )
    }

    /// Transport using an already-built signer.
    pub fn with_signer(endpoint: &str, signer: Arc<dyn RequestSigner>) -> Result<Self> {
        Self::build(endpoint, None, OnceCell::new_with(Some(signer)))
    }

    fn build(
        endpoint: &str,
        source: Option<SignerSource>,
        signer: OnceCell<Arc<dyn RequestSigner>>,
    ) -> Result<Self> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            http: http_client(DEFAULT_REQUEST_TIMEOUT)?,
            signer,
            source,
        })
    }

    /// Bound each HTTP exchange by `timeout` instead of `DEFAULT_REQUEST_TIMEOUT`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = http_client(timeout)?;
        Ok(self)
    }

    /// Replace the underlying reqwest client (proxies, timeouts, TLS roots).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The shared signer, created at most once even under concurrent first use.
    async fn signer(&self) -> Result<&Arc<dyn RequestSigner>> {
        self.signer
            .get_or_try_init(|| async {
                let source = self.source.as_ref().ok_or_else(|| {
                    atmosphere_auth::Error::MissingCredentials("no request signer configured".into())
                })?;
                let (credentials, chain) = match &source.credentials {
                    Some(provider) => (provider.clone(), "supplied"),
                    None => (
                        atmosphere_auth::default_chain(Some(source.scope.region.as_str())).await?,
                        "default",
                    ),
                };
                info!(
                    credentials = chain,
                    region = %source.scope.region,
                    service = %source.scope.service,
                    "request signer initialized"
                );
                let signer: Arc<dyn RequestSigner> =
                    Arc::new(SigV4Signer::new(credentials, source.scope.clone()));
                Ok::<_, Error>(signer)
            })
            .await
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| Error::Transport(Box::new(e)))
    }

    async fn send_signed(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let signer = self.signer().await?;
        let url = self.url_for(&request.path)?;
        let body = serde_json::to_vec(&request.body)
            .map_err(|e| Error::Decode(format!("encoding request body: {e}")))?;

        let mut http_request = self
            .http
            .request(request.method.clone(), url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .build()
            .map_err(|e| Error::Transport(Box::new(e)))?;
        signer.sign(&mut http_request).await?;

        debug!(method = %request.method, path = %request.path, "sending request");
        let response = self
            .http
            .execute(http_request)
            .await
            .map_err(|e| Error::Transport(Box::new(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(Box::new(e)))?;
        debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            "response received"
        );

        Ok(ApiResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().map(str::to_owned),
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: &'a ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResponse>> + Send + 'a>> {
        Box::pin(self.send_signed(request))
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Transport(Box::new(e)))
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint).map_err(|e| Error::Transport(Box::new(e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Transport(
            format!("endpoint must use http or https, got {other}://").into(),
        )),
    }
}
