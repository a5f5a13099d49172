// Cleanup of one-sided follows.
// Unfollows accounts that do not follow back, or only logs what would happen in a dry run.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::context::RunContext;
use crate::github::GitHubClient;

/// Result of a cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupOutcome {
    pub dry_run: bool,
    /// Number of users handled (unfollowed, failed, or simulated).
    pub processed: usize,
    /// Users handled, in order.
    pub users: Vec<String>,
    pub unfollowed: Vec<String>,
    pub failed: Vec<String>,
    /// Users not attempted: past the processing limit or after an abort.
    pub skipped: Vec<String>,
    /// Set when the error budget stopped the pass early.
    pub partial: bool,
    pub aborted: Option<String>,
}

/// Unfollow every login in `one_sided`, at most `max_users_to_process` of them.
///
/// Failures are recorded and do not stop the pass unless the run's error
/// budget is exceeded, in which case the remaining users are skipped.
pub async fn cleanup(
    client: &GitHubClient,
    ctx: &mut RunContext,
    user: &str,
    one_sided: &BTreeSet<String>,
    dry_run: bool,
) -> CleanupOutcome {
    let limit = ctx.limits().max_users_to_process;
    let delay = ctx.limits().unfollow_delay;
    let mut attempted = 0;
    let mut outcome = CleanupOutcome {
        dry_run,
        ..Default::default()
    };

    for (index, login) in one_sided.iter().enumerate() {
        if outcome.aborted.is_some() || index >= limit {
            outcome.skipped.push(login.clone());
            continue;
        }

        if dry_run {
            info!(user = %login, "dry run: would unfollow");
            outcome.users.push(login.clone());
            continue;
        }

        if let Err(e) = ctx.ensure_budget() {
            error!(error = %e, "stopping cleanup");
            outcome.partial = true;
            outcome.aborted = Some(e.to_string());
            outcome.skipped.push(login.clone());
            continue;
        }

        // Bursts of mutations trip GitHub's secondary rate limit.
        if attempted > 0 && !delay.is_zero() {
            sleep(delay).await;
        }
        attempted += 1;

        match client.unfollow(ctx, login).await {
            Ok(true) => {
                info!(user = %login, "unfollowed");
                outcome.unfollowed.push(login.clone());
            }
            Ok(false) => {
                warn!(user = %login, "unfollow returned an unexpected status");
                ctx.record_failure();
                outcome.failed.push(login.clone());
            }
            Err(e) if e.is_budget() => {
                error!(user = %login, error = %e, "stopping cleanup");
                outcome.partial = true;
                outcome.aborted = Some(e.to_string());
                outcome.skipped.push(login.clone());
                continue;
            }
            Err(e) => {
                warn!(user = %login, error = %e, "failed to unfollow");
                outcome.failed.push(login.clone());
            }
        }
        outcome.users.push(login.clone());
    }
    outcome.processed = outcome.users.len();

    if !outcome.unfollowed.is_empty() {
        if let Err(e) = client.invalidate_following(user) {
            warn!(error = %e, "failed to invalidate cached following list");
        }
    }

    info!(
        dry_run,
        processed = outcome.processed,
        unfollowed = outcome.unfollowed.len(),
        failed = outcome.failed.len(),
        skipped = outcome.skipped.len(),
        "cleanup finished"
    );
    outcome
}
