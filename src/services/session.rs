//! Local session discovery: one plain HTTP GET to a configured local
//! address expecting a JSON body. No retry at this layer.

use core::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum SessionError {
    Transport(String),
    Http { status: u16, message: String },
    /// The response carried a non-JSON content type; treated as a hard
    /// failure of this single fetch.
    ContentType(String),
    Parse(String),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Transport(s) => write!(f, "transport error: {}", s),
            SessionError::Http { status, message } => write!(f, "http {}: {}", status, message),
            SessionError::ContentType(ct) => write!(f, "expected application/json, got {}", ct),
            SessionError::Parse(e) => write!(f, "invalid session body: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

pub fn fetch_sessions(url: &str) -> Result<Vec<String>, SessionError> {
    let agent = ureq::AgentBuilder::new().build();
    match agent.get(url).set("Accept", "application/json").call() {
        Ok(res) => {
            let content_type = res.content_type().to_string();
            if !content_type.contains("application/json") {
                return Err(SessionError::ContentType(content_type));
            }
            res.into_json::<Vec<String>>().map_err(|e| SessionError::Parse(e.to_string()))
        }
        Err(ureq::Error::Transport(t)) => Err(SessionError::Transport(t.to_string())),
        Err(ureq::Error::Status(status, res)) => {
            let body = res.into_string().unwrap_or_else(|_| String::from("<no body>"));
            Err(SessionError::Http { status, message: body })
        }
    }
}
