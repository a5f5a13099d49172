// GitHub API endpoint functions.
// Typed methods for the follower graph: listings, profiles, unfollowing, and rate limit status.

use std::collections::BTreeSet;

use reqwest::StatusCode;
use tracing::info;

use crate::context::RunContext;
use crate::error::Result;

use super::client::GitHubClient;
use super::pagination::Pages;
use super::types::{RateLimit, RateLimitResponse, User, UserRef};

const PER_PAGE: &str = "100";

impl GitHubClient {
    /// Page cursor over a list endpoint, 100 entries per page.
    pub fn pages(&self, path: &str) -> Result<Pages<'_>> {
        let first = self.url(path, &[("per_page", PER_PAGE)])?;
        Ok(Pages::new(self, first))
    }

    /// Get the authenticated user.
    pub async fn get_current_user(&self, ctx: &mut RunContext) -> Result<User> {
        self.get_json(ctx, "/user", &[]).await
    }

    /// Get a user's public profile.
    pub async fn get_user(&self, ctx: &mut RunContext, login: &str) -> Result<User> {
        self.get_json(ctx, &format!("/users/{}", login), &[]).await
    }

    /// Logins of everyone following `login`.
    pub async fn get_followers(
        &self,
        ctx: &mut RunContext,
        login: &str,
    ) -> Result<BTreeSet<String>> {
        let users: Vec<UserRef> = self
            .pages(&format!("/users/{}/followers", login))?
            .collect_all(ctx)
            .await?;
        info!(user = login, count = users.len(), "loaded followers");
        Ok(users.into_iter().map(|u| u.login).collect())
    }

    /// Logins of everyone `login` follows.
    pub async fn get_following(
        &self,
        ctx: &mut RunContext,
        login: &str,
    ) -> Result<BTreeSet<String>> {
        let users: Vec<UserRef> = self
            .pages(&format!("/users/{}/following", login))?
            .collect_all(ctx)
            .await?;
        info!(user = login, count = users.len(), "loaded following");
        Ok(users.into_iter().map(|u| u.login).collect())
    }

    /// Unfollow a user as the authenticated account. Returns true on 204.
    pub async fn unfollow(&self, ctx: &mut RunContext, login: &str) -> Result<bool> {
        let status = self
            .delete(ctx, &format!("/user/following/{}", login))
            .await?;
        Ok(status == StatusCode::NO_CONTENT)
    }

    /// Drop cached following pages of `login`, e.g. after unfollowing.
    pub fn invalidate_following(&self, login: &str) -> Result<usize> {
        let path = format!("/users/{}/following", login);
        let chained = self.pages(&path)?.invalidate()?;
        Ok(chained + self.invalidate(&path)?)
    }

    /// Current core rate limit, always fetched live.
    pub async fn get_rate_limit(&self, ctx: &mut RunContext) -> Result<RateLimit> {
        let response: RateLimitResponse = self.get_json_fresh(ctx, "/rate_limit").await?;
        ctx.update_rate_limit(response.resources.core.clone());
        Ok(response.resources.core)
    }
}
