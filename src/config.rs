// Runtime configuration.
// Command-line flags with environment fallbacks, resolved into the settings a run is built from.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::{debug, info};

use crate::backoff::RetryPolicy;
use crate::cache::{CacheStore, DiskCache};
use crate::context::{Limits, RunContext};
use crate::error::{FellowError, Result};
use crate::github::GitHubClient;

/// Flags shared by the command line and the web server.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// GitHub personal access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Account to analyze, defaults to the owner of the token
    #[arg(long, env = "GITHUB_USERNAME")]
    pub username: Option<String>,

    /// How long cached API responses stay fresh
    #[arg(long, env = "FELLOW_CACHE_TTL", default_value = "1h", value_parser = humantime::parse_duration)]
    pub cache_ttl: Duration,

    /// Directory for cached API responses
    #[arg(long, env = "FELLOW_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Failed API calls tolerated before a run is aborted
    #[arg(long, env = "FELLOW_MAX_ERRORS", default_value_t = 10)]
    pub max_errors: u32,

    /// Retries of a rate-limited or failing request
    #[arg(long, env = "FELLOW_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Delay before the first retry
    #[arg(long, env = "FELLOW_BACKOFF_BASE", default_value = "1s", value_parser = humantime::parse_duration)]
    pub backoff_base: Duration,

    /// Longest delay between retries
    #[arg(long, env = "FELLOW_BACKOFF_MAX", default_value = "60s", value_parser = humantime::parse_duration)]
    pub backoff_max: Duration,

    /// API requests allowed in one run
    #[arg(long, env = "MAX_API_REQUESTS", default_value_t = 2500)]
    pub max_requests: u32,

    /// Users looked up or unfollowed per run
    #[arg(long, env = "MAX_USERS_TO_PROCESS", default_value_t = 200)]
    pub max_users: usize,

    /// Pause between unfollow requests
    #[arg(long, env = "FELLOW_UNFOLLOW_DELAY", default_value = "500ms", value_parser = humantime::parse_duration)]
    pub unfollow_delay: Duration,
}

/// Resolved configuration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub token: Option<String>,
    pub username: Option<String>,
    pub cache_ttl: Duration,
    pub cache_dir: Option<PathBuf>,
    pub retry: RetryPolicy,
    pub limits: Limits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: None,
            username: None,
            cache_ttl: crate::cache::DEFAULT_TTL,
            cache_dir: None,
            retry: RetryPolicy::default(),
            limits: Limits::default(),
        }
    }
}

impl From<ConfigArgs> for Settings {
    fn from(args: ConfigArgs) -> Self {
        Self {
            token: args.token.filter(|t| !t.trim().is_empty()),
            username: args.username.filter(|u| !u.trim().is_empty()),
            cache_ttl: args.cache_ttl,
            cache_dir: args.cache_dir,
            retry: RetryPolicy {
                max_retries: args.max_retries,
                base_delay: args.backoff_base,
                max_delay: args.backoff_max.max(args.backoff_base),
            },
            limits: Limits {
                max_errors: args.max_errors,
                max_requests: args.max_requests,
                max_users_to_process: args.max_users,
                unfollow_delay: args.unfollow_delay,
            },
        }
    }
}

impl Settings {
    pub fn token(&self) -> Result<&str> {
        self.token.as_deref().ok_or(FellowError::MissingToken)
    }

    /// Disk cache at the configured directory, or the platform cache directory.
    pub fn cache(&self) -> Result<Arc<dyn CacheStore>> {
        let cache = match &self.cache_dir {
            Some(dir) => DiskCache::new(dir),
            None => DiskCache::default_location()?,
        };
        debug!(dir = %cache.dir().display(), "using response cache");
        Ok(Arc::new(cache))
    }

    /// Client over the real GitHub API using the configured token and policies.
    pub fn client(&self, cache: Arc<dyn CacheStore>) -> Result<GitHubClient> {
        Ok(self.configure(GitHubClient::with_token(self.token()?, cache)?))
    }

    /// Apply the retry policy and TTL to a client.
    pub fn configure(&self, client: GitHubClient) -> GitHubClient {
        client
            .with_retry_policy(self.retry)
            .with_ttl(self.cache_ttl)
    }

    pub fn run_context(&self) -> RunContext {
        RunContext::new(self.limits)
    }

    /// The configured account, or the owner of the token.
    pub async fn resolve_username(
        &self,
        client: &GitHubClient,
        ctx: &mut RunContext,
    ) -> Result<String> {
        if let Some(username) = &self.username {
            return Ok(username.clone());
        }
        let user = client.get_current_user(ctx).await?;
        info!(user = %user.login, "resolved account from token");
        Ok(user.login)
    }
}
