//! Client for the shared state store: a remote, subscribable tree of JSON
//! values acting as the single source of truth between client and device.
//!
//! - Blocking client using `ureq` (no async).
//! - Subtrees are addressed by slash-separated paths; a missing subtree reads
//!   as JSON `null`.
//! - The client never assumes exclusive write access: the device or another
//!   client instance may change any field at any time.

use serde_json::Value;

#[derive(Debug)]
pub enum StoreError {
    Transport(String),
    Http { status: u16, message: String },
    Json(serde_json::Error),
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StoreError::Transport(s) => write!(f, "transport error: {}", s),
            StoreError::Http { status, message } => write!(f, "http {}: {}", status, message),
            StoreError::Json(e) => write!(f, "json error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Json(value)
    }
}

/// Point reads, point writes/merges, and deletes against the store tree.
///
/// Components are written against this trait; the REST client below is the
/// production implementation and tests substitute an in-memory tree.
pub trait StoreBackend {
    /// Read the subtree at `path`. A missing subtree yields `Value::Null`.
    fn read(&self, path: &str) -> Result<Value, StoreError>;
    /// Overwrite the subtree at `path`.
    fn write(&self, path: &str, value: &Value) -> Result<(), StoreError>;
    /// Shallow-merge `value` into the object at `path` (non-object targets
    /// are overwritten).
    fn merge(&self, path: &str, value: &Value) -> Result<(), StoreError>;
    /// Delete the subtree at `path`.
    fn remove(&self, path: &str) -> Result<(), StoreError>;
}

/// REST client for the store's JSON-over-HTTP surface: GET reads, PUT
/// overwrites, PATCH shallow-merges, DELETE removes.
pub struct RestStore {
    agent: ureq::Agent,
    base_url: String,
    auth_token: Option<String>,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new().build();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        RestStore {
            agent,
            base_url,
            auth_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    fn with_auth(&self, req: ureq::Request) -> ureq::Request {
        match &self.auth_token {
            Some(token) => req.query("auth", token),
            None => req,
        }
    }

    fn expect_ok(resp: Result<ureq::Response, ureq::Error>) -> Result<ureq::Response, StoreError> {
        match resp {
            Ok(res) => Ok(res),
            Err(ureq::Error::Transport(t)) => Err(StoreError::Transport(t.to_string())),
            Err(ureq::Error::Status(status, res)) => {
                let body = res.into_string().unwrap_or_else(|_| String::from("<no body>"));
                Err(StoreError::Http { status, message: body })
            }
        }
    }
}

impl StoreBackend for RestStore {
    fn read(&self, path: &str) -> Result<Value, StoreError> {
        let req = self.with_auth(self.agent.get(&self.url(path)).set("Accept", "application/json"));
        let res = Self::expect_ok(req.call())?;
        let body = res.into_string().map_err(|e| StoreError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(StoreError::Json)
    }

    fn write(&self, path: &str, value: &Value) -> Result<(), StoreError> {
        let req = self.with_auth(self.agent.put(&self.url(path)));
        Self::expect_ok(req.send_json(value)).map(|_| ())
    }

    fn merge(&self, path: &str, value: &Value) -> Result<(), StoreError> {
        let req = self.with_auth(self.agent.request("PATCH", &self.url(path)));
        Self::expect_ok(req.send_json(value)).map(|_| ())
    }

    fn remove(&self, path: &str) -> Result<(), StoreError> {
        let req = self.with_auth(self.agent.delete(&self.url(path)));
        Self::expect_ok(req.call()).map(|_| ())
    }
}
