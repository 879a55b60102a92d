pub mod dex;
pub mod jar;
pub mod store;
pub mod util;

/// Fragment returned when a request arrives before `init_app`.
pub(crate) fn not_initialized() -> String {
    r#"<span class="text-red-600">Star jar not initialized</span>"#.to_string()
}
