//! `/api/jar/*` routes: the jar panel and its four actions.
//!
//! Every mutating route answers with the re-rendered `#star-jar` panel
//! followed by the collection grid as an out-of-band swap.

use tracing::warn;

use crate::app::{StarJarApp, with_app};
use crate::error::JarError;
use crate::jar::mask;
use crate::jar::view::ShakeReport;
use crate::render::{self, Notice};
use crate::routes::not_initialized;
use crate::routes::util::{get_param, parse_form_body, parse_query};

fn panel_with_dex(app: &StarJarApp, notice: Notice<'_>, shaken: &[ShakeReport]) -> String {
    let mut html = render::render_jar(app, notice, shaken);
    html.push_str(&render::render_dex_oob(app));
    html
}

// ── GET /api/jar ───────────────────────────────────────────────────

/// Handle GET /api/jar
/// Returns the jar panel for the current persisted state.
pub fn handle_jar_get(_query: &str) -> String {
    with_app(|app| render::render_jar(app, Notice::None, &[])).unwrap_or_else(not_initialized)
}

// ── POST /api/jar/spawn ────────────────────────────────────────────

/// Handle POST /api/jar/spawn
/// Fills an empty jar with one star per catalog entry. A jar that already
/// holds (or held) stars is re-rendered unchanged.
pub fn handle_spawn_post(_body: &str) -> String {
    let mask = mask::acquire();
    with_app(|app| {
        let spawned = app.jar.borrow_mut().spawn(mask.as_deref());
        if let Err(err) = spawned {
            warn!(%err, "spawn ignored");
        }
        panel_with_dex(app, Notice::None, &[])
    })
    .unwrap_or_else(not_initialized)
}

// ── POST /api/jar/shake ────────────────────────────────────────────

/// Handle POST /api/jar/shake
/// Jiggles the stars; the panel carries each star's waypoints in
/// `data-path` for the client to animate.
pub fn handle_shake_post(_body: &str) -> String {
    let mask = mask::acquire();
    with_app(|app| {
        let shaken = app.jar.borrow_mut().shake(mask.as_deref());
        render::render_jar(app, Notice::None, &shaken)
    })
    .unwrap_or_else(not_initialized)
}

// ── POST /api/jar/wish ─────────────────────────────────────────────

/// Handle POST /api/jar/wish
/// Shakes, draws one star and reveals its compliment.
pub fn handle_wish_post(_body: &str) -> String {
    let mask = mask::acquire();
    with_app(|app| {
        let wished = app.jar.borrow_mut().wish(mask.as_deref());
        match wished {
            Ok(outcome) => panel_with_dex(
                app,
                Notice::Revealed(&outcome.compliment),
                &outcome.shaken,
            ),
            Err(JarError::UnmatchedImage(filename)) => {
                warn!(filename = filename.as_str(), "star has no matching compliment");
                panel_with_dex(app, Notice::None, &[])
            }
            Err(_) => panel_with_dex(app, Notice::None, &[]),
        }
    })
    .unwrap_or_else(not_initialized)
}

// ── POST /api/jar/reset ────────────────────────────────────────────

/// Handle POST /api/jar/reset
/// Body params:
///   - secret={phrase} → must match the configured reset phrase
pub fn handle_reset_post(body: &str) -> String {
    let params = parse_form_body(body);
    let secret = get_param(&params, "secret").unwrap_or("");
    with_app(|app| {
        let reset = app.jar.borrow_mut().reset(secret);
        match reset {
            Ok(()) => panel_with_dex(app, Notice::None, &[]),
            Err(_) => render::render_jar(app, Notice::ResetDenied, &[]),
        }
    })
    .unwrap_or_else(not_initialized)
}

// ── GET /api/jar/detail ────────────────────────────────────────────

/// Handle GET /api/jar/detail?text={compliment}
/// Detail dialog for a just-revealed compliment. Unknown text falls back to
/// the default image and a generic description.
pub fn handle_detail_get(query: &str) -> String {
    let params = parse_query(query);
    let text = get_param(&params, "text").unwrap_or("");
    with_app(|app| render::render_detail(app, text, app.catalog.find_by_text(text)))
        .unwrap_or_else(not_initialized)
}
