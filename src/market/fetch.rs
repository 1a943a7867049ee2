use crate::error::FetchError;
use crate::market::types::FetchConfig;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("marketdesk/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// One HTTP GET. Implementations report transport failures only; status handling
/// and retries belong to [`ResilientClient`].
pub trait HttpTransport: Send + Sync {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, FetchError>>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, FetchError>> {
        async move {
            let response = self
                .client
                .get(url)
                .header(ACCEPT, "application/json")
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?.to_vec();
            Ok(HttpResponse { status, body })
        }
        .boxed()
    }
}

#[derive(Clone)]
pub struct ResilientClient {
    transport: Arc<dyn HttpTransport>,
    config: FetchConfig,
}

impl ResilientClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: FetchConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> FetchConfig {
        self.config
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let attempts = self.config.max_retries + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay_ms = self.config.backoff_base_ms * u64::from(attempt);
                debug!(url, attempt, delay_ms, "backing off before retry");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            match self.fetch_once(url).await {
                Ok(mut body) => return decode(&mut body),
                Err(error) if error.is_retryable() => {
                    warn!(url, attempt = attempt + 1, attempts, %error, "upstream request failed");
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        Err(FetchError::Exhausted {
            attempts,
            last: Box::new(
                last_error.unwrap_or_else(|| FetchError::Transport("no attempt made".to_string())),
            ),
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let timeout_ms = self.config.timeout_ms;
        let response =
            match tokio::time::timeout(Duration::from_millis(timeout_ms), self.transport.get(url))
                .await
            {
                Ok(Ok(response)) => response,
                Ok(Err(FetchError::Timeout { .. })) | Err(_) => {
                    return Err(FetchError::Timeout { timeout_ms })
                }
                Ok(Err(error)) => return Err(error),
            };

        match response.status {
            200..=299 => Ok(response.body),
            429 => Err(FetchError::RateLimited),
            status => Err(FetchError::Status { status }),
        }
    }
}

fn decode<T: DeserializeOwned>(body: &mut [u8]) -> Result<T, FetchError> {
    simd_json::serde::from_slice(body).map_err(|error| FetchError::Malformed(error.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    pub enum Scripted {
        Respond(HttpResponse),
        Fail(FetchError),
        Hang,
    }

    #[derive(Default)]
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn new(script: Vec<Scripted>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn always_failing() -> Self {
            Self::default()
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }
    }

    impl HttpTransport for ScriptedTransport {
        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, FetchError>> {
            self.requests.lock().push(url.to_string());
            let next = self.script.lock().pop_front();
            async move {
                match next {
                    Some(Scripted::Respond(response)) => Ok(response),
                    Some(Scripted::Fail(error)) => Err(error),
                    Some(Scripted::Hang) => std::future::pending().await,
                    None => Err(FetchError::Transport("connection refused".to_string())),
                }
            }
            .boxed()
        }
    }
}
