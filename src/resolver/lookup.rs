//! Upstream user lookup.
//!
//! # Responsibilities
//! - Ask the v5 users endpoint for the ID behind a login name
//! - Classify failures: bad Client-ID vs. everything else
//!
//! # Upstream Contract
//! ```text
//! GET {base_url}{users_path}?login=<name>
//! Accept: application/vnd.twitchtv.v5+json
//! Client-ID: <client id>
//!
//! 200 {"users":[{"_id":"22484632", ...}]}                      → Some(22484632)
//! 200 {"users":[]}                                             → None
//! 400 {"message":"Invalid client id specified", ...}           → InvalidCredential
//! anything else                                                → Upstream
//! ```

use async_trait::async_trait;
use axum::http::{header::ACCEPT, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::config::UpstreamConfig;
use crate::resolver::types::{ResolveError, ResolveResult, UserId};

/// Header carrying the API credential.
pub const CLIENT_ID_HEADER: &str = "Client-ID";

/// `message` values the upstream uses for a missing or invalid Client-ID.
const CREDENTIAL_ERRORS: [&str; 2] = ["No client id specified", "Invalid client id specified"];

/// Source of truth for login → user ID translation.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// Returns `Ok(None)` if the upstream knows no user with this login.
    async fn lookup(&self, login: &str) -> ResolveResult<Option<UserId>>;
}

/// Looks logins up on the v5 users endpoint.
#[derive(Debug, Clone)]
pub struct KrakenUserLookup {
    client: reqwest::Client,
    endpoint: Url,
    accept: String,
    client_id: String,
}

impl KrakenUserLookup {
    pub fn new(client: reqwest::Client, config: &UpstreamConfig) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(&config.base_url)?.join(&config.users_path)?;
        Ok(Self {
            client,
            endpoint,
            accept: config.accept.clone(),
            client_id: config.client_id.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl UserLookup for KrakenUserLookup {
    async fn lookup(&self, login: &str) -> ResolveResult<Option<UserId>> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("login", login)])
            .header(ACCEPT, self.accept.as_str())
            .header(CLIENT_ID_HEADER, self.client_id.as_str())
            .send()
            .await
            .map_err(|e| ResolveError::Upstream(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ResolveError::Upstream(format!("failed to read users response: {}", e)))?;

        parse_users_response(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    users: Vec<UserEntry>,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    #[serde(rename = "_id")]
    id: RawId,
}

/// `_id` is sent as a string, but a bare number is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Interpret a users endpoint response.
pub fn parse_users_response(status: StatusCode, body: &[u8]) -> ResolveResult<Option<UserId>> {
    if status == StatusCode::BAD_REQUEST {
        if let Ok(ErrorBody { message: Some(message) }) = serde_json::from_slice::<ErrorBody>(body) {
            if CREDENTIAL_ERRORS.contains(&message.as_str()) {
                return Err(ResolveError::InvalidCredential(message));
            }
        }
    }

    if status != StatusCode::OK {
        return Err(ResolveError::Upstream(format!("Bad response - {}", status)));
    }

    let parsed: UsersResponse = serde_json::from_slice(body)
        .map_err(|e| ResolveError::Upstream(format!("malformed users response: {}", e)))?;

    let Some(user) = parsed.users.first() else {
        return Ok(None);
    };

    let id = match &user.id {
        RawId::Number(n) => *n,
        RawId::Text(text) => text
            .parse::<u64>()
            .map_err(|e| ResolveError::Upstream(format!("non-numeric user id {:?}: {}", text, e)))?,
    };
    Ok(Some(UserId(id)))
}
