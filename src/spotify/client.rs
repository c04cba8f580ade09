use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{
    config,
    error::{AuthError, CatalogError},
    management::TokenManager,
    types::AccessToken,
    utils, warning,
};

const RETRY_AFTER_CAP: Duration = Duration::from_secs(30);

/// Connection and retry settings for [`CatalogClient`].
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub api_url: String,
    pub market: String,
    /// Whole-request timeout for a single HTTP attempt.
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_url: config::DEFAULT_TOKEN_URL.to_string(),
            api_url: config::DEFAULT_API_URL.to_string(),
            market: "US".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

/// Client for the remote catalog. One instance is shared by every connection;
/// the only mutable state is the token held by its [`TokenManager`].
pub struct CatalogClient {
    pub(crate) http: Client,
    pub(crate) config: CatalogConfig,
    tokens: TokenManager,
}

enum Attempt {
    Done(Response),
    Retry(Option<Duration>),
    Reauth(AccessToken),
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(CatalogError::Transport)?;

        let tokens = TokenManager::new(
            http.clone(),
            config.token_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        );

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// Fetches a new token and publishes it, replacing any current one.
    pub async fn authenticate(&self) -> Result<(), AuthError> {
        let token = self.tokens.authenticate().await?;
        self.tokens.set_token(token).await;
        Ok(())
    }

    pub async fn ensure_valid_token(&self) -> Result<AccessToken, AuthError> {
        self.tokens.get_valid_token().await
    }

    pub async fn set_token(&self, token: AccessToken) {
        self.tokens.set_token(token).await;
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{base}/{path}",
            base = self.config.api_url.trim_end_matches('/'),
            path = path.trim_start_matches('/')
        )
    }

    /// Sends an authenticated GET built by `build` and decodes the JSON body.
    ///
    /// Transient failures (timeouts, connection errors, 429 and 5xx gateway
    /// statuses) are retried up to `max_retries` times. A 401 invalidates the
    /// token that was used and is retried once with a fresh one.
    pub(crate) async fn get_json<T, F>(&self, build: F) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt: u32 = 0;
        let mut reauthenticated = false;

        loop {
            let token = self.tokens.get_valid_token().await?;
            let outcome = self
                .send_once(build(&self.http).bearer_auth(token.value()), &token)
                .await?;

            match outcome {
                Attempt::Done(response) => return decode(response).await,
                Attempt::Reauth(stale) if !reauthenticated => {
                    warning!("Catalog rejected the access token, re-authenticating");
                    self.tokens.invalidate(&stale).await;
                    reauthenticated = true;
                }
                Attempt::Reauth(_) => {
                    return Err(CatalogError::Status {
                        status: StatusCode::UNAUTHORIZED.as_u16(),
                        message: "access token rejected after refresh".to_string(),
                    });
                }
                Attempt::Retry(wait) if attempt < self.config.max_retries => {
                    let delay = wait
                        .map(|w| w.min(RETRY_AFTER_CAP))
                        .unwrap_or_else(|| utils::backoff_delay(self.config.retry_backoff, attempt));
                    attempt += 1;
                    warning!(
                        "Catalog request failed, retry {}/{} in {}ms",
                        attempt,
                        self.config.max_retries,
                        delay.as_millis()
                    );
                    sleep(delay).await;
                }
                Attempt::Retry(_) => {
                    return Err(CatalogError::Status {
                        status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                        message: format!(
                            "catalog still unavailable after {} retries",
                            self.config.max_retries
                        ),
                    });
                }
            }
        }
    }

    async fn send_once(
        &self,
        request: RequestBuilder,
        token: &AccessToken,
    ) -> Result<Attempt, CatalogError> {
        let response = match request.send().await {
            Ok(resp) => resp,
            Err(err) if err.is_timeout() || err.is_connect() => {
                return Ok(Attempt::Retry(None));
            }
            Err(err) => return Err(CatalogError::Transport(err)),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(Attempt::Done(response));
        }

        match status {
            StatusCode::UNAUTHORIZED => Ok(Attempt::Reauth(token.clone())),
            StatusCode::TOO_MANY_REQUESTS => {
                let wait = utils::parse_retry_after(
                    response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok()),
                );
                Ok(Attempt::Retry(wait))
            }
            StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => Ok(Attempt::Retry(None)),
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(
                response.url().path().to_string(),
            )),
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(CatalogError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CatalogError> {
    let body = response.text().await.map_err(CatalogError::Transport)?;
    serde_json::from_str(&body).map_err(|e| CatalogError::Parse(e.to_string()))
}
