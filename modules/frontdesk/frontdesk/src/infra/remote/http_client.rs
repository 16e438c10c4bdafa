//! REST client for the remote directory.
//!
//! Authentication is an OAuth2 password grant against the configured login
//! subdomain; the grant returns a bearer token plus the instance base URL
//! all data requests go to. Sessions expire server-side, so every request
//! retries exactly once through a fresh login on 401.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::RemoteConfig;
use crate::domain::ports::{RemoteCreated, RemoteDirectory, RemoteError, RemoteRecord};

const API_VERSION: &str = "v57.0";

#[derive(Clone)]
struct Session {
    access_token: String,
    instance_url: Url,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    instance_url: String,
}

#[derive(Deserialize)]
struct DescribeResponse {
    fields: Vec<DescribeField>,
}

#[derive(Deserialize)]
struct DescribeField {
    name: String,
    #[serde(default)]
    createable: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    records: Vec<Value>,
    #[serde(default)]
    done: bool,
    #[serde(rename = "nextRecordsUrl")]
    next_records_url: Option<String>,
}

pub struct HttpRemoteDirectory {
    http: reqwest::Client,
    login_url: Url,
    config: RemoteConfig,
    // Neither lock is ever held across an await point.
    session: RwLock<Option<Session>>,
    describe_cache: RwLock<HashMap<String, HashSet<String>>>,
}

impl HttpRemoteDirectory {
    /// Build a client from config, deriving the login URL from the
    /// configured subdomain.
    ///
    /// # Errors
    /// When the derived login URL is invalid or the HTTP client cannot be
    /// constructed.
    pub fn new(config: RemoteConfig) -> anyhow::Result<Self> {
        let login_url = Url::parse(&format!(
            "https://{}.salesforce.com/services/oauth2/token",
            config.domain
        ))?;
        Self::with_login_url(config, login_url)
    }

    /// Build a client against an explicit login URL. Used by tests to point
    /// at a local mock server.
    ///
    /// # Errors
    /// When the HTTP client cannot be constructed.
    pub fn with_login_url(config: RemoteConfig, login_url: Url) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            login_url,
            config,
            session: RwLock::new(None),
            describe_cache: RwLock::new(HashMap::new()),
        })
    }

    async fn login(&self) -> Result<Session, RemoteError> {
        let password = format!(
            "{}{}",
            self.config.password.expose_secret(),
            self.config.security_token.expose_secret()
        );
        let form = [
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("username", self.config.username.as_str()),
            ("password", password.as_str()),
        ];

        let resp = self
            .http
            .post(self.login_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(transport_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Unavailable(format!(
                "login failed with status {status}"
            )));
        }
        let body: LoginResponse = resp
            .json()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("malformed login response: {e}")))?;
        let session = Session {
            access_token: body.access_token,
            instance_url: Url::parse(&body.instance_url).map_err(|e| {
                RemoteError::Unavailable(format!("malformed instance URL: {e}"))
            })?,
        };

        *self.session.write() = Some(session.clone());
        // The schema cache belongs to the session that fetched it.
        self.describe_cache.write().clear();
        debug!(instance = %session.instance_url, "logged in to remote directory");
        Ok(session)
    }

    async fn session(&self) -> Result<Session, RemoteError> {
        let cached = self.session.read().clone();
        match cached {
            Some(s) => Ok(s),
            None => self.login().await,
        }
    }

    /// Send a request built from the current session, retrying once through
    /// a fresh login on 401.
    async fn send(
        &self,
        method: Method,
        path: &[&str],
        query: Option<(&str, &str)>,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, RemoteError> {
        let mut session = self.session().await?;
        let mut renewed = false;
        loop {
            let mut url = session.instance_url.clone();
            url.path_segments_mut()
                .map_err(|()| RemoteError::Unavailable("invalid instance URL".to_owned()))?
                .extend(path);
            if let Some((k, v)) = query {
                url.query_pairs_mut().append_pair(k, v);
            }

            let mut req = self
                .http
                .request(method.clone(), url)
                .bearer_auth(&session.access_token);
            if let Some(b) = body {
                req = req.json(b);
            }
            let resp = req.send().await.map_err(transport_err)?;

            if resp.status() == StatusCode::UNAUTHORIZED && !renewed {
                renewed = true;
                session = self.login().await?;
                continue;
            }
            return Ok(resp);
        }
    }
}

#[async_trait]
impl RemoteDirectory for HttpRemoteDirectory {
    #[instrument(skip(self))]
    async fn describe(&self, object_type: &str) -> Result<HashSet<String>, RemoteError> {
        if let Some(cached) = self.describe_cache.read().get(object_type) {
            return Ok(cached.clone());
        }

        let resp = self
            .send(
                Method::GET,
                &[
                    "services",
                    "data",
                    API_VERSION,
                    "sobjects",
                    object_type,
                    "describe",
                ],
                None,
                None,
            )
            .await?;
        let resp = check(resp).await?;
        let body: DescribeResponse = resp
            .json()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("malformed describe response: {e}")))?;

        let fields: HashSet<String> = body
            .fields
            .into_iter()
            .filter(|f| f.createable)
            .map(|f| f.name)
            .collect();
        self.describe_cache
            .write()
            .insert(object_type.to_owned(), fields.clone());
        Ok(fields)
    }

    #[instrument(skip(self, fields))]
    async fn create(
        &self,
        object_type: &str,
        fields: RemoteRecord,
    ) -> Result<RemoteCreated, RemoteError> {
        let payload = Value::Object(prune_empty(fields));
        let resp = self
            .send(
                Method::POST,
                &["services", "data", API_VERSION, "sobjects", object_type],
                None,
                Some(&payload),
            )
            .await?;
        let resp = check(resp).await?;
        let mut body: RemoteRecord = resp
            .json()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("malformed create response: {e}")))?;

        let id = match body.remove("id") {
            Some(Value::String(id)) => id,
            _ => {
                return Err(RemoteError::Unavailable(
                    "create response carried no record id".to_owned(),
                ))
            }
        };
        Ok(RemoteCreated { id, fields: body })
    }

    #[instrument(skip(self, fields))]
    async fn update(
        &self,
        object_type: &str,
        id: &str,
        fields: RemoteRecord,
    ) -> Result<(), RemoteError> {
        let payload = Value::Object(fields);
        let resp = self
            .send(
                Method::PATCH,
                &[
                    "services",
                    "data",
                    API_VERSION,
                    "sobjects",
                    object_type,
                    id,
                ],
                None,
                Some(&payload),
            )
            .await?;
        check(resp).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, object_type: &str, id: &str) -> Result<bool, RemoteError> {
        let resp = self
            .send(
                Method::DELETE,
                &[
                    "services",
                    "data",
                    API_VERSION,
                    "sobjects",
                    object_type,
                    id,
                ],
                None,
                None,
            )
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(resp).await?;
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn query(&self, soql: &str) -> Result<Vec<RemoteRecord>, RemoteError> {
        let mut records = Vec::new();
        let mut next: Option<String> = None;

        loop {
            let resp = match next.as_deref() {
                None => {
                    self.send(
                        Method::GET,
                        &["services", "data", API_VERSION, "query"],
                        Some(("q", soql)),
                        None,
                    )
                    .await?
                }
                Some(path) => {
                    // The continuation is a server-issued absolute path.
                    let segments: Vec<&str> =
                        path.split('/').filter(|s| !s.is_empty()).collect();
                    self.send(Method::GET, &segments, None, None).await?
                }
            };
            let resp = check(resp).await?;
            let body: QueryResponse = resp.json().await.map_err(|e| {
                RemoteError::Unavailable(format!("malformed query response: {e}"))
            })?;

            records.extend(body.records.into_iter().filter_map(|r| match r {
                Value::Object(mut map) => {
                    map.remove("attributes");
                    Some(map)
                }
                _ => None,
            }));

            match (body.done, body.next_records_url) {
                (false, Some(url)) => next = Some(url),
                _ => break,
            }
        }
        Ok(records)
    }
}

/// Map a transport failure (connect, timeout, TLS) to `Unavailable`.
fn transport_err(e: reqwest::Error) -> RemoteError {
    RemoteError::Unavailable(e.to_string())
}

/// Resolve a non-success status into the error taxonomy: 5xx and the
/// transient 4xx statuses (expired session, timeout, throttling) mean the
/// remote is unavailable, other non-success means it refused the request.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let raw = resp.text().await.unwrap_or_default();
    let message = rejection_message(&raw);
    let transient = matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS
    );
    if status.is_server_error() || transient {
        Err(RemoteError::Unavailable(format!("status {status}: {message}")))
    } else {
        Err(RemoteError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Error bodies are an array of `{message, errorCode}` objects; fall back
/// to the raw body when they are not.
fn rejection_message(raw: &str) -> String {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) {
        let messages: Vec<&str> = items
            .iter()
            .filter_map(|i| i.get("message").and_then(Value::as_str))
            .collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }
    raw.to_owned()
}

/// Drop fields the remote API would misread as explicit blanking: nulls,
/// empty strings, and empty lists.
fn prune_empty(fields: RemoteRecord) -> RemoteRecord {
    fields
        .into_iter()
        .filter(|(_, v)| match v {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prune_drops_nulls_empty_strings_and_lists() {
        let mut fields = RemoteRecord::new();
        fields.insert("keep".to_owned(), json!("x"));
        fields.insert("zero".to_owned(), json!(0));
        fields.insert("null".to_owned(), Value::Null);
        fields.insert("blank".to_owned(), json!(""));
        fields.insert("empty_list".to_owned(), json!([]));

        let pruned = prune_empty(fields);
        assert_eq!(pruned.len(), 2);
        assert!(pruned.contains_key("keep"));
        assert!(pruned.contains_key("zero"));
    }

    #[test]
    fn rejection_message_prefers_structured_errors() {
        let raw = r#"[{"message":"Required fields are missing","errorCode":"REQUIRED_FIELD_MISSING"}]"#;
        assert_eq!(rejection_message(raw), "Required fields are missing");
        assert_eq!(rejection_message("plain text"), "plain text");
    }
}
