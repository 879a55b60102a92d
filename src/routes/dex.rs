//! `/api/dex/*` routes: the collection grid.

use crate::app::with_app;
use crate::render;
use crate::routes::not_initialized;
use crate::routes::util::{get_param, parse_query};

/// Handle GET /api/dex
pub fn handle_dex_get(_query: &str) -> String {
    with_app(|app| render::render_dex(app, &app.dex.borrow())).unwrap_or_else(not_initialized)
}

/// Handle POST /api/dex/refresh
/// Re-reads both collection keys before rendering.
pub fn handle_refresh_post(_body: &str) -> String {
    with_app(|app| {
        app.dex.borrow_mut().reload();
        render::render_dex(app, &app.dex.borrow())
    })
    .unwrap_or_else(not_initialized)
}

/// Handle GET /api/dex/detail?text={compliment}
/// Locked or unknown entries render nothing.
pub fn handle_detail_get(query: &str) -> String {
    let params = parse_query(query);
    let text = get_param(&params, "text").unwrap_or("");
    with_app(|app| {
        let dex = app.dex.borrow();
        dex.select(text)
            .map(|entry| render::render_detail(app, &entry.text, Some(entry)))
            .unwrap_or_default()
    })
    .unwrap_or_else(not_initialized)
}
