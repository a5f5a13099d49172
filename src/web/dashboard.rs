// Dashboard page.
// A single page that calls the JSON endpoints and renders their results client-side.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use poem::handler;
use poem::web::Html;
use tracing::instrument;

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; margin: 20px; background: #f5f5f5; }
.container { max-width: 1200px; margin: 0 auto; background: white; padding: 20px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
h1, h2 { color: #333; }
.stats { display: flex; gap: 20px; margin: 20px 0; }
.stat-card { background: #007acc; color: white; padding: 15px; border-radius: 8px; text-align: center; flex: 1; }
.user-card { border: 1px solid #ddd; padding: 15px; margin: 10px 0; border-radius: 8px; background: #fafafa; }
.user-stats { color: #666; font-size: 0.9em; margin-top: 10px; }
.btn { background: #007acc; color: white; border: none; padding: 10px 20px; border-radius: 5px; cursor: pointer; margin: 5px; }
.btn:hover { background: #005a9e; }
.btn-danger { background: #dc3545; }
.btn-danger:hover { background: #c82333; }
.notice { padding: 15px; border-radius: 8px; margin: 20px 0; }
.notice-dry { background: #fff3cd; }
.notice-done { background: #d1edff; }
.notice-error { background: #f8d7da; }
.loading { text-align: center; padding: 20px; }
.hidden { display: none; }
.muted { color: #666; font-size: 0.9em; }
"#;

const SCRIPT: &str = r#"
function escapeHtml(value) {
    return String(value ?? '').replace(/[&<>"']/g, c => ({
        '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'
    }[c]));
}

async function request(url, options) {
    const response = await fetch(url, options);
    const data = await response.json();
    if (!response.ok && !data.outcome) {
        throw new Error(data.error || response.statusText);
    }
    return data;
}

async function run(task) {
    document.getElementById('loading').classList.remove('hidden');
    document.getElementById('results').classList.add('hidden');
    try {
        await task();
    } catch (error) {
        show(`<div class="notice notice-error"><strong>Error:</strong> ${escapeHtml(error.message)}</div>`);
    } finally {
        document.getElementById('loading').classList.add('hidden');
    }
}

function show(html) {
    const results = document.getElementById('results');
    results.innerHTML = html;
    results.classList.remove('hidden');
}

function statCard(value, label) {
    return `<div class="stat-card"><h3>${value}</h3><p>${label}</p></div>`;
}

function userCard(user) {
    const counts = user.followers == null ? '' : `
        <div class="user-stats">
            ${user.followers} followers | ${user.following} following | ${user.public_repos} repos
            ${user.created_at ? ` | since ${new Date(user.created_at).toLocaleDateString()}` : ''}
        </div>`;
    return `
        <div class="user-card">
            <h3><a href="${escapeHtml(user.html_url)}" target="_blank">${escapeHtml(user.username)}</a></h3>
            ${user.name ? `<p><strong>${escapeHtml(user.name)}</strong></p>` : ''}
            ${user.bio ? `<p>${escapeHtml(user.bio)}</p>` : ''}
            ${counts}
        </div>`;
}

function loadAnalysis() {
    run(async () => {
        const data = await request('/api/analyze');
        const s = data.stats;
        const r = data.request_status;
        show(`
            <p>Account: <strong>${escapeHtml(data.user)}</strong></p>
            <div class="stats">
                ${statCard(s.total_followers, 'Followers')}
                ${statCard(s.total_following, 'Following')}
                ${statCard(s.mutual_follows, 'Mutual')}
                ${statCard(s.one_sided_follows, 'One-sided')}
                ${statCard(s.not_following_back, 'Not followed back')}
            </div>
            <p class="muted">API requests: ${r.current_requests}/${r.max_requests},
                cache hits: ${r.cache_hits}, retried: ${r.retries}, failed: ${r.failures}</p>
            <h2>One-sided follows (${data.one_sided.length})</h2>
            <p>These users do not follow back:</p>
            ${data.one_sided.map(userCard).join('')}
            <h2>Followers not followed back (${data.not_following_back.length})</h2>
            <p>These users follow you, but you do not follow them:</p>
            ${data.not_following_back.map(userCard).join('')}
        `);
    });
}

function performCleanup(dryRun) {
    if (!dryRun && !confirm('Unfollow every account that does not follow back?')) {
        return;
    }
    run(async () => {
        const data = await request('/api/cleanup', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({ dry_run: dryRun })
        });
        const outcome = data.outcome || data;
        const failed = outcome.failed.length
            ? `<p>Failed: ${outcome.failed.map(escapeHtml).join(', ')}</p>` : '';
        const aborted = data.error
            ? `<p><strong>Stopped early:</strong> ${escapeHtml(data.error)}</p>` : '';
        show(`
            <div class="notice ${outcome.dry_run ? 'notice-dry' : 'notice-done'}">
                <h2>${outcome.dry_run ? 'Dry run results' : 'Cleanup finished'}</h2>
                <p><strong>${outcome.processed}</strong> users processed</p>
                ${outcome.dry_run ? '<p>Nothing was unfollowed.</p>' : `<p>Unfollowed: ${outcome.unfollowed.length}</p>`}
                ${failed}
                ${aborted}
                <ul>${outcome.users.map(user => `<li>${escapeHtml(user)}</li>`).join('')}</ul>
            </div>
        `);
    });
}

function loadCacheStats() {
    run(async () => {
        const stats = await request('/api/cache/stats');
        show(`
            <div class="notice notice-done">
                <h2>Cache</h2>
                <p>${stats.entries} entries, ${stats.expired} expired, ${stats.total_bytes} bytes</p>
                <p class="muted">${escapeHtml(stats.location)}</p>
            </div>
        `);
    });
}

function clearCache() {
    run(async () => {
        const data = await request('/api/cache/clear', { method: 'POST' });
        show(`<div class="notice notice-done"><p>Removed ${data.cleared} cache entries.</p></div>`);
    });
}
"#;

pub fn page() -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Follow-Fellow Dashboard" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                div.container {
                    h1 { "Follow-Fellow Dashboard" }
                    p { "Find and clean up GitHub follows that are not returned." }

                    div.actions {
                        button.btn onclick="loadAnalysis()" { "Analyze" }
                        button.btn.btn-danger onclick="performCleanup(true)" { "Dry run" }
                        button.btn.btn-danger onclick="performCleanup(false)" { "Clean up" }
                        button.btn onclick="loadCacheStats()" { "Cache stats" }
                        button.btn onclick="clearCache()" { "Clear cache" }
                    }

                    div #loading .loading .hidden { p { "Loading..." } }
                    div #results .hidden {}
                }
                script { (PreEscaped(SCRIPT)) }
            }
        }
    }
}

#[handler]
#[instrument(skip_all)]
pub async fn index() -> Html<String> {
    Html(page().into_string())
}
