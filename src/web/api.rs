// JSON endpoints of the dashboard.
// Each request runs with a fresh run context against the shared cache.

use std::sync::Arc;

use poem::http::StatusCode;
use poem::web::{Data, Json};
use poem::{IntoResponse, Response, handler};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::analyze::{FollowReport, analyze, build_report};
use crate::cleanup::{CleanupOutcome, cleanup};

use super::error::ApiError;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
}

fn default_dry_run() -> bool {
    true
}

fn respond<T: Serialize + Send>(result: Result<T, ApiError>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(error) => error.into_response(),
    }
}

#[handler]
#[instrument(skip_all)]
pub async fn get_status(Data(state): Data<&Arc<AppState>>) -> Response {
    respond(status(state).await)
}

async fn status(state: &AppState) -> Result<Value, ApiError> {
    let client = state.client()?;
    let mut ctx = state.settings.run_context();
    let rate_limit = client.get_rate_limit(&mut ctx).await?;

    Ok(json!({
        "rate_limit": rate_limit,
        "reset_at": rate_limit.reset_at(),
        "request_status": ctx.request_status(),
    }))
}

#[handler]
#[instrument(skip_all)]
pub async fn get_analyze(Data(state): Data<&Arc<AppState>>) -> Response {
    respond(report(state).await)
}

async fn report(state: &AppState) -> Result<FollowReport, ApiError> {
    let client = state.client()?;
    let mut ctx = state.settings.run_context();
    let user = state.settings.resolve_username(&client, &mut ctx).await?;

    let analysis = analyze(&client, &mut ctx, &user).await?;
    Ok(build_report(&client, &mut ctx, &user, &analysis).await?)
}

#[handler]
#[instrument(skip_all)]
pub async fn post_cleanup(
    Data(state): Data<&Arc<AppState>>,
    request: Option<Json<CleanupRequest>>,
) -> Response {
    let dry_run = request.is_none_or(|Json(request)| request.dry_run);
    info!(dry_run, "cleanup requested");

    match run_cleanup(state, dry_run).await {
        Ok(outcome) if outcome.partial => Json(json!({
            "error": outcome.aborted,
            "outcome": outcome,
        }))
        .with_status(StatusCode::TOO_MANY_REQUESTS)
        .into_response(),
        result => respond(result),
    }
}

async fn run_cleanup(state: &AppState, dry_run: bool) -> Result<CleanupOutcome, ApiError> {
    let client = state.client()?;
    let mut ctx = state.settings.run_context();
    let user = state.settings.resolve_username(&client, &mut ctx).await?;

    let analysis = analyze(&client, &mut ctx, &user).await?;
    Ok(cleanup(&client, &mut ctx, &user, &analysis.one_sided, dry_run).await)
}

#[handler]
#[instrument(skip_all)]
pub async fn get_cache_stats(Data(state): Data<&Arc<AppState>>) -> Response {
    respond(
        state
            .cache
            .stats(state.settings.cache_ttl)
            .map_err(ApiError::from),
    )
}

#[handler]
#[instrument(skip_all)]
pub async fn post_cache_clear(Data(state): Data<&Arc<AppState>>) -> Response {
    respond(
        state
            .cache
            .clear()
            .map(|cleared| json!({ "cleared": cleared }))
            .map_err(ApiError::from),
    )
}
