//! Cross-tab storage notifications and the onboarding flag.

use crate::app::with_app;
use crate::render;
use crate::routes::not_initialized;
use crate::routes::util::{get_param, parse_form_body};

/// Handle POST /api/store/changed
/// Body params:
///   - key={storage key} → omitted when another tab cleared storage
///
/// The page forwards every `storage` event here. Collection keys reload the
/// grid and return it; anything else returns an empty body.
pub fn handle_changed_post(body: &str) -> String {
    let params = parse_form_body(body);
    let key = get_param(&params, "key");
    with_app(|app| {
        if app.on_storage_event(key) {
            render::render_dex(app, &app.dex.borrow())
        } else {
            String::new()
        }
    })
    .unwrap_or_else(not_initialized)
}

/// Handle GET /api/intro
/// Returns `show` or `hide`.
pub fn handle_intro_get(_query: &str) -> String {
    with_app(|app| {
        let verdict = if app.should_show_intro() { "show" } else { "hide" };
        verdict.to_string()
    })
    .unwrap_or_else(not_initialized)
}

/// Handle POST /api/intro/dismiss
pub fn handle_dismiss_post(_body: &str) -> String {
    with_app(|app| {
        app.dismiss_intro();
        "hide".to_string()
    })
    .unwrap_or_else(not_initialized)
}
