// Follower analysis.
// Set arithmetic over followers and following, and the report built on top of it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::{RequestStatus, RunContext};
use crate::error::Result;
use crate::github::{GitHubClient, UserSummary};

/// The follower graph of one account split into its groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowAnalysis {
    pub followers: BTreeSet<String>,
    pub following: BTreeSet<String>,
    /// Followed and following back.
    pub mutual: BTreeSet<String>,
    /// Followed but not following back.
    pub one_sided: BTreeSet<String>,
    /// Following but not followed back.
    pub not_following_back: BTreeSet<String>,
}

/// Group sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowStats {
    pub total_followers: usize,
    pub total_following: usize,
    pub mutual_follows: usize,
    pub one_sided_follows: usize,
    pub not_following_back: usize,
}

impl FollowAnalysis {
    pub fn compute(followers: BTreeSet<String>, following: BTreeSet<String>) -> Self {
        let mutual = following.intersection(&followers).cloned().collect();
        let one_sided = following.difference(&followers).cloned().collect();
        let not_following_back = followers.difference(&following).cloned().collect();

        Self {
            followers,
            following,
            mutual,
            one_sided,
            not_following_back,
        }
    }

    pub fn stats(&self) -> FollowStats {
        FollowStats {
            total_followers: self.followers.len(),
            total_following: self.following.len(),
            mutual_follows: self.mutual.len(),
            one_sided_follows: self.one_sided.len(),
            not_following_back: self.not_following_back.len(),
        }
    }
}

/// How much of each group was looked up in detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingLimits {
    pub max_users_to_process: usize,
    pub one_sided_truncated: bool,
    pub not_following_back_truncated: bool,
}

/// Full analysis report for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowReport {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub stats: FollowStats,
    pub request_status: RequestStatus,
    pub processing_limits: ProcessingLimits,
    pub one_sided: Vec<UserSummary>,
    pub not_following_back: Vec<UserSummary>,
    pub mutual: Vec<String>,
}

/// Fetch both lists of `user` and split them into groups.
pub async fn analyze(
    client: &GitHubClient,
    ctx: &mut RunContext,
    user: &str,
) -> Result<FollowAnalysis> {
    let followers = client.get_followers(ctx, user).await?;
    let following = client.get_following(ctx, user).await?;

    let analysis = FollowAnalysis::compute(followers, following);
    let stats = analysis.stats();
    info!(
        user,
        followers = stats.total_followers,
        following = stats.total_following,
        mutual = stats.mutual_follows,
        one_sided = stats.one_sided_follows,
        "analysis complete"
    );
    Ok(analysis)
}

/// Look up profile details for up to `limit` users. Users past the limit, and
/// users whose lookup fails, are listed by login only.
pub async fn enrich<'a>(
    client: &GitHubClient,
    ctx: &mut RunContext,
    logins: impl IntoIterator<Item = &'a String>,
    limit: usize,
) -> Result<Vec<UserSummary>> {
    let mut summaries = Vec::new();
    for (index, login) in logins.into_iter().enumerate() {
        if index >= limit {
            summaries.push(UserSummary::bare(login));
            continue;
        }

        match client.get_user(ctx, login).await {
            Ok(user) => summaries.push(user.into()),
            Err(e) if e.is_budget() => return Err(e),
            Err(e) => {
                warn!(user = %login, error = %e, "could not load user details");
                summaries.push(UserSummary::bare(login));
            }
        }
    }
    Ok(summaries)
}

/// Build the report for an analysis, enriching the asymmetric groups.
pub async fn build_report(
    client: &GitHubClient,
    ctx: &mut RunContext,
    user: &str,
    analysis: &FollowAnalysis,
) -> Result<FollowReport> {
    let limit = ctx.limits().max_users_to_process;

    let one_sided = enrich(client, ctx, &analysis.one_sided, limit).await?;
    let not_following_back = enrich(client, ctx, &analysis.not_following_back, limit).await?;

    Ok(FollowReport {
        timestamp: Utc::now(),
        user: user.to_string(),
        stats: analysis.stats(),
        request_status: ctx.request_status(),
        processing_limits: ProcessingLimits {
            max_users_to_process: limit,
            one_sided_truncated: analysis.one_sided.len() > limit,
            not_following_back_truncated: analysis.not_following_back.len() > limit,
        },
        one_sided,
        not_following_back,
        mutual: analysis.mutual.iter().cloned().collect(),
    })
}
