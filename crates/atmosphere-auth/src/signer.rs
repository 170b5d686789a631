//! The signing capability handed to the client
//!
//! The client never looks at credentials. It owns an `Arc<dyn RequestSigner>`
//! and calls `sign()` on each request right before it goes out.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, SystemTime};

use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningParams, SigningSettings, sign};
use aws_sigv4::sign::v4;
use reqwest::header::{HeaderName, HeaderValue};
use tokio::sync::Mutex;
use tracing::debug;

use crate::credentials::{self, Credentials, SharedCredentialsProvider};
use crate::error::{Error, Result};

/// Default service name used in the credential scope for API Gateway endpoints.
pub const DEFAULT_SERVICE: &str = "execute-api";

/// Cached credentials are refreshed once they are this close to expiring.
const REFRESH_BEFORE_EXPIRY: Duration = Duration::from_secs(300);

/// Authenticates an outgoing HTTP request by adding headers to it.
pub trait RequestSigner: Send + Sync {
    fn sign<'a>(
        &'a self,
        request: &'a mut reqwest::Request,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Region and service the signature is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningScope {
    pub region: String,
    pub service: String,
}

impl SigningScope {
    pub fn new(region: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
        }
    }
}

/// SigV4 signer over a credential provider.
///
/// Credentials are fetched on first use and reused until they near expiry.
#[derive(Debug)]
pub struct SigV4Signer {
    provider: SharedCredentialsProvider,
    scope: SigningScope,
    cached: Mutex<Option<Credentials>>,
}

impl SigV4Signer {
    pub fn new(provider: SharedCredentialsProvider, scope: SigningScope) -> Self {
        Self {
            provider,
            scope,
            cached: Mutex::new(None),
        }
    }

    pub fn scope(&self) -> &SigningScope {
        &self.scope
    }

    async fn credentials(&self, now: SystemTime) -> Result<Credentials> {
        let mut cached = self.cached.lock().await;
        if let Some(current) = cached.as_ref() {
            if !expires_soon(current, now) {
                return Ok(current.clone());
            }
        }
        let fresh = credentials::resolve(&self.provider).await?;
        debug!(
            access_key_id = fresh.access_key_id(),
            expires = ?fresh.expiry(),
            "signing credentials resolved"
        );
        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    /// Sign with an explicit timestamp instead of the current time.
    pub async fn sign_at(&self, request: &mut reqwest::Request, time: SystemTime) -> Result<()> {
        let identity = self.credentials(time).await?.into();
        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.scope.region)
            .name(&self.scope.service)
            .time(time)
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| Error::Signing(e.to_string()))?
            .into();

        let body = match request.body() {
            None => &[][..],
            Some(body) => body
                .as_bytes()
                .ok_or_else(|| Error::Signing("streaming request bodies cannot be signed".into()))?,
        };
        let headers = request
            .headers()
            .iter()
            .map(|(name, value)| {
                value
                    .to_str()
                    .map(|value| (name.as_str(), value))
                    .map_err(|_| Error::Signing(format!("header {name} is not valid text")))
            })
            .collect::<Result<Vec<_>>>()?;
        let signable = SignableRequest::new(
            request.method().as_str(),
            request.url().as_str(),
            headers.into_iter(),
            SignableBody::Bytes(body),
        )
        .map_err(|e| Error::Signing(e.to_string()))?;
        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| Error::Signing(e.to_string()))?
            .into_parts();

        for (name, value) in instructions.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Signing(format!("signing header {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Signing(format!("signing header {name}: {e}")))?;
            request.headers_mut().insert(name, value);
        }
        Ok(())
    }
}

fn expires_soon(credentials: &Credentials, now: SystemTime) -> bool {
    let horizon = now.checked_add(REFRESH_BEFORE_EXPIRY);
    credentials
        .expiry()
        .is_some_and(|expiry| horizon.is_some_and(|horizon| expiry <= horizon))
}

impl RequestSigner for SigV4Signer {
    fn sign<'a>(
        &'a self,
        request: &'a mut reqwest::Request,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.sign_at(request, SystemTime::now()))
    }
}
