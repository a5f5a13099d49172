// GitHub API response types.
// Defines structs for deserializing user listings, profiles, and rate limit data.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// Account type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AccountType {
    #[default]
    User,
    Organization,
    Bot,
    #[serde(other)]
    Unknown,
}

/// Entry of a followers/following listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: u64,
    pub login: String,
    #[serde(rename = "type", default)]
    pub account_type: AccountType,
    pub html_url: Option<String>,
}

/// Full user profile from `/users/{login}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub public_repos: u64,
    pub html_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// User as shown in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub public_repos: Option<u64>,
    pub html_url: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserSummary {
    /// Summary with nothing but the login, for users that were not looked up.
    pub fn bare(login: &str) -> Self {
        Self {
            username: login.to_string(),
            name: None,
            bio: None,
            followers: None,
            following: None,
            public_repos: None,
            html_url: format!("https://github.com/{}", login),
            created_at: None,
        }
    }
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        let html_url = user
            .html_url
            .unwrap_or_else(|| format!("https://github.com/{}", user.login));
        Self {
            username: user.login,
            name: user.name.filter(|n| !n.is_empty()),
            bio: user.bio.filter(|b| !b.is_empty()),
            followers: Some(user.followers),
            following: Some(user.following),
            public_repos: Some(user.public_repos),
            html_url,
            created_at: user.created_at,
        }
    }
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}

impl RateLimit {
    /// Read `x-ratelimit-*` headers. Returns `None` when the response carries none.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| -> Option<u64> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
        };

        let remaining = read("x-ratelimit-remaining")?;
        Some(Self {
            limit: read("x-ratelimit-limit").unwrap_or_default(),
            remaining,
            reset: read("x-ratelimit-reset").unwrap_or_default(),
        })
    }

    /// When the current window resets.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.reset as i64, 0)
    }
}

/// Response of `/rate_limit`.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimit,
}
