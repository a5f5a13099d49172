// Scripted transport for unit tests.
// Serves canned responses per method and URL and records every request it sees.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};

use crate::cache::MemoryCache;
use crate::error::{FellowError, Result};

use super::client::GitHubClient;
use super::transport::{RawResponse, Transport};

pub const BASE: &str = "https://api.github.com";

/// Build a response with a status, body, and extra headers.
pub fn response(status: u16, body: &str, headers: &[(&str, &str)]) -> RawResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    RawResponse {
        status: StatusCode::from_u16(status).unwrap(),
        headers: map,
        body: body.to_string(),
    }
}

pub fn ok(body: &str) -> RawResponse {
    response(200, body, &[])
}

/// JSON array of listing entries for the given logins.
pub fn logins_json(logins: &[&str]) -> String {
    let entries: Vec<String> = logins
        .iter()
        .enumerate()
        .map(|(id, login)| format!(r#"{{"id":{},"login":"{}","type":"User"}}"#, id + 1, login))
        .collect();
    format!("[{}]", entries.join(","))
}

/// One scripted answer: a response, or a connection that fails before one arrives.
#[derive(Clone)]
pub enum Reply {
    Response(RawResponse),
    Disconnect,
}

/// A transport-level error as reqwest reports it.
fn network_error() -> FellowError {
    let error = reqwest::Client::new().get("http://").build().unwrap_err();
    FellowError::Network(error)
}

#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<(Method, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue responses for a route. The last one keeps being served once the queue drains.
    pub fn route(self, method: Method, url: &str, responses: Vec<RawResponse>) -> Self {
        self.replies(method, url, responses.into_iter().map(Reply::Response).collect())
    }

    pub fn replies(self, method: Method, url: &str, replies: Vec<Reply>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method, url.to_string()), replies.into());
        self
    }

    pub fn get(self, url: &str, responses: Vec<RawResponse>) -> Self {
        self.route(Method::GET, url, responses)
    }

    pub fn requests(&self) -> Vec<(Method, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &Method, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, u)| m == method && u == url)
            .count()
    }

    pub fn count_method(&self, method: &Method) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, method: Method, url: Url) -> Result<RawResponse> {
        let url = url.to_string();
        self.requests.lock().unwrap().push((method.clone(), url.clone()));

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&(method, url)) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Disconnect) => Err(network_error()),
            None => Ok(response_not_found()),
        }
    }
}

fn response_not_found() -> RawResponse {
    response(404, r#"{"message":"Not Found"}"#, &[])
}

/// Client over a scripted transport and a fresh memory cache.
pub fn client(transport: ScriptedTransport) -> (GitHubClient, Arc<ScriptedTransport>, Arc<MemoryCache>) {
    let transport = Arc::new(transport);
    let cache = Arc::new(MemoryCache::new());
    let client = GitHubClient::new(transport.clone(), cache.clone());
    (client, transport, cache)
}
