//! WeCom contacts REST API client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::{
    DepartmentListBody, Envelope, TokenBody, UserListBody, WeComDepartment, WeComUser,
};
use super::DirectoryClient;
use crate::config::WeComConfig;
use crate::errors::{CoreError, WeComError};

/// Asynchronous WeCom API client.
///
/// The access token is fetched on first use and kept for the lifetime of
/// the client. Tokens are valid for two hours, which outlasts a single
/// export run.
pub struct WeComClient {
    http: reqwest::Client,
    api_url: String,
    corp_id: String,
    corp_secret: String,
    token: Mutex<Option<String>>,
}

impl WeComClient {
    pub fn new(
        api_url: impl Into<String>,
        corp_id: impl Into<String>,
        corp_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WeComError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("orgsync/0.1"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        info!(api_url = %api_url, "created WeComClient");
        Ok(Self {
            http,
            api_url,
            corp_id: corp_id.into(),
            corp_secret: corp_secret.into(),
            token: Mutex::new(None),
        })
    }

    /// Build a client from resolved configuration.
    ///
    /// Fails with [`ConfigError::EnvVarMissing`] (wrapped) when the corp
    /// secret was not resolved.
    pub fn from_config(config: &WeComConfig) -> Result<Self, CoreError> {
        let secret = config.secret()?;
        let client = Self::new(
            &config.api_url,
            &config.corp_id,
            secret,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(client)
    }

    /// Return the cached access token, fetching one if needed.
    #[instrument(skip(self))]
    async fn access_token(&self) -> Result<String, WeComError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        if self.corp_secret.is_empty() {
            return Err(WeComError::AuthenticationFailed(
                "corp secret is empty".into(),
            ));
        }

        let url = format!("{}/cgi-bin/gettoken", self.api_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("corpid", self.corp_id.as_str()),
                ("corpsecret", self.corp_secret.as_str()),
            ])
            .send()
            .await?;
        let env: Envelope<TokenBody> = decode(resp).await?;
        if env.errcode != 0 || env.body.access_token.is_empty() {
            warn!(errcode = env.errcode, errmsg = %env.errmsg, "token request rejected");
            return Err(WeComError::AuthenticationFailed(format!(
                "{}: {}",
                env.errcode, env.errmsg
            )));
        }

        debug!(corp_id = %self.corp_id, "obtained access token");
        *cached = Some(env.body.access_token.clone());
        Ok(env.body.access_token)
    }

    /// GET an authenticated endpoint and unwrap the `errcode` envelope.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeComError> {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.api_url, path);
        let resp = self
            .http
            .get(&url)
            .query(&[("access_token", token.as_str())])
            .query(query)
            .send()
            .await?;
        let env: Envelope<T> = decode(resp).await?;
        if env.errcode != 0 {
            warn!(path, errcode = env.errcode, errmsg = %env.errmsg, "WeCom API error");
            return Err(WeComError::ApiError {
                errcode: env.errcode,
                errmsg: env.errmsg,
            });
        }
        Ok(env.body)
    }
}

impl DirectoryClient for WeComClient {
    #[instrument(skip(self))]
    async fn list_departments(&self) -> Result<Vec<WeComDepartment>, WeComError> {
        let body: DepartmentListBody = self.get("/cgi-bin/department/list", &[]).await?;
        debug!(count = body.department.len(), "fetched departments");
        Ok(body.department)
    }

    #[instrument(skip(self))]
    async fn list_users(
        &self,
        department_id: i64,
        include_descendants: bool,
    ) -> Result<Vec<WeComUser>, WeComError> {
        let fetch_child = if include_descendants { "1" } else { "0" };
        let body: UserListBody = self
            .get(
                "/cgi-bin/user/list",
                &[
                    ("department_id", department_id.to_string()),
                    ("fetch_child", fetch_child.to_string()),
                ],
            )
            .await?;
        debug!(count = body.userlist.len(), department_id, "fetched users");
        Ok(body.userlist)
    }
}

/// Check the HTTP status and parse the JSON body.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, WeComError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "WeCom returned HTTP error");
        return Err(WeComError::ApiStatus {
            status: status.as_u16(),
            body,
        });
    }
    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| WeComError::ParseError(e.to_string()))
}
