// In crates/terminal-client/src/gateway.rs

use app_config::TerminalSettings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::types::{GatewayError, OpenSessionRequest};
use crate::{Credentials, Error, RawAccountInfo, RawDeal, RawPosition, Result, Terminal};

/// Extra time on top of the terminal's login timeout before the HTTP call gives up.
const GATEWAY_GRACE: Duration = Duration::from_secs(5);

/// A `Terminal` reached through the local gateway process that hosts the
/// native terminal API.
#[derive(Debug)]
pub struct GatewayTerminal {
    http_client: Client,
    base_url: String,
    /// Login of the open session, if any.
    session: Option<u64>,
}

impl GatewayTerminal {
    /// Constructs a new gateway client from `TerminalSettings`.
    pub fn new(settings: &TerminalSettings) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(settings.connect_timeout().saturating_add(GATEWAY_GRACE))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: settings.gateway_url.trim_end_matches('/').to_string(),
            session: None,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn ensure_session(&self) -> Result<()> {
        match self.session {
            Some(_) => Ok(()),
            None => Err(Error::NotConnected),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, i64)]) -> Result<T> {
        let response = self
            .http_client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let text = response.text().await.map_err(Error::RequestFailed)?;
        serde_json::from_str(&text).map_err(Error::DeserializationFailed)
    }
}

/// Turns a non-success response into the terminal's error pair when the body
/// carries one, and into `UnexpectedStatus` otherwise.
async fn error_from_response(response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<GatewayError>(&body) {
        Ok(err) => Error::Terminal { code: err.code, msg: err.message },
        Err(_) => Error::UnexpectedStatus { status, body },
    }
}

#[async_trait]
impl Terminal for GatewayTerminal {
    async fn open(&mut self, credentials: &Credentials, timeout: Duration) -> Result<()> {
        if let Some(login) = self.session {
            return Err(Error::SessionBusy(login));
        }

        let body = OpenSessionRequest {
            login: credentials.login,
            password: &credentials.password,
            server: &credentials.server,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        };

        let response = self
            .http_client
            .post(self.url("session"))
            .json(&body)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        self.session = Some(credentials.login);
        tracing::debug!(login = credentials.login, server = %credentials.server, "Terminal session opened.");
        Ok(())
    }

    async fn account_info(&mut self) -> Result<Option<RawAccountInfo>> {
        self.ensure_session()?;

        let response = self
            .http_client
            .get(self.url("account"))
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => return Err(error_from_response(response).await),
            _ => {}
        }

        let text = response.text().await.map_err(Error::RequestFailed)?;
        // Some gateways answer `null` instead of 204.
        let info: Option<RawAccountInfo> = serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;
        Ok(info)
    }

    async fn positions(&mut self) -> Result<Vec<RawPosition>> {
        self.ensure_session()?;
        self.get_json("positions", &[]).await
    }

    async fn deals(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<RawDeal>> {
        self.ensure_session()?;
        self.get_json("deals", &[("from", from.timestamp()), ("to", to.timestamp())])
            .await
    }

    async fn close(&mut self) -> Result<()> {
        // The slot is released even if the gateway call fails.
        let Some(login) = self.session.take() else {
            return Ok(());
        };

        let response = self
            .http_client
            .delete(self.url("session"))
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        tracing::debug!(login, "Terminal session closed.");
        Ok(())
    }
}
