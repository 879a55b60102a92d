//! Star jar in-browser WASM server.
//!
//! Exports `handle_request(method, path, query, body)` for the page's HTMX
//! bridge to call, plus `init_app` / `load_mask` / `clear_mask` for setup.
//! Uses `matchit` for URL routing, the same router engine that powers Axum.
//!
//! All state lives in this WASM instance (see [`app`]) and in
//! `localStorage`, which is what keeps several open tabs in sync.

use wasm_bindgen::prelude::*;

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod jar;
pub mod logging;
pub mod render;
pub mod routes;

/// Mount the app. `config_json` may be empty for defaults; `catalog_json` is
/// the compliment list.
///
/// # Returns
/// `"ok"`, or `"error: …"` with the reason. A failed init leaves any
/// previously mounted app in place.
#[wasm_bindgen]
pub fn init_app(config_json: &str, catalog_json: &str) -> String {
    logging::init();
    match app::init_from_json(config_json, catalog_json) {
        Ok(()) => "ok".to_string(),
        Err(err) => {
            tracing::error!(%err, "init_app failed");
            format!("error: {err}")
        }
    }
}

/// Hand over the jar-interior raster as RGBA bytes (`width * height * 4`).
/// Until this is called (or if it fails) stars go to the fallback point.
#[wasm_bindgen]
pub fn load_mask(rgba: &[u8], width: u32, height: u32) -> bool {
    jar::mask::install(rgba, width, height)
}

#[wasm_bindgen]
pub fn clear_mask() {
    jar::mask::clear();
}

/// Process an HTTP-like request and return an HTML fragment.
///
/// # Arguments
/// * `method` — HTTP method ("GET" or "POST")
/// * `path`   — URL path (e.g., "/api/jar/wish")
/// * `query`  — Query string (e.g., "?text=Kind")
/// * `body`   — Form-encoded POST body. Empty string for GET requests.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    let mut router = matchit::Router::new();

    router.insert("/api/jar", "jar").ok();
    router.insert("/api/jar/spawn", "jar_spawn").ok();
    router.insert("/api/jar/shake", "jar_shake").ok();
    router.insert("/api/jar/wish", "jar_wish").ok();
    router.insert("/api/jar/reset", "jar_reset").ok();
    router.insert("/api/jar/detail", "jar_detail").ok();

    router.insert("/api/dex", "dex").ok();
    router.insert("/api/dex/refresh", "dex_refresh").ok();
    router.insert("/api/dex/detail", "dex_detail").ok();

    router.insert("/api/store/changed", "store_changed").ok();
    router.insert("/api/intro", "intro").ok();
    router.insert("/api/intro/dismiss", "intro_dismiss").ok();

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            ("jar", "GET") => routes::jar::handle_jar_get(query),
            ("jar_detail", "GET") => routes::jar::handle_detail_get(query),
            ("jar_spawn", "POST") => routes::jar::handle_spawn_post(body),
            ("jar_shake", "POST") => routes::jar::handle_shake_post(body),
            ("jar_wish", "POST") => routes::jar::handle_wish_post(body),
            ("jar_reset", "POST") => routes::jar::handle_reset_post(body),

            ("dex", "GET") => routes::dex::handle_dex_get(query),
            ("dex_detail", "GET") => routes::dex::handle_detail_get(query),
            ("dex_refresh", "POST") => routes::dex::handle_refresh_post(body),

            ("store_changed", "POST") => routes::store::handle_changed_post(body),
            ("intro", "GET") => routes::store::handle_intro_get(query),
            ("intro_dismiss", "POST") => routes::store::handle_dismiss_post(body),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> String {
    r#"<span class="text-red-600">404 — route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="text-red-600">405 — method not allowed</span>"#.to_string()
}
