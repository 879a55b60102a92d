//! HTML fragments for the jar and collection panels.
//!
//! The page hosts three swap targets: `#star-jar` (the jar panel, swapped
//! outerHTML), `#star-dex` (collection grid, innerHTML) and `#star-modal`
//! (detail dialogs, innerHTML). Mutating jar routes also return the
//! collection grid as an out-of-band swap so both tabs of the page stay in
//! step without a second request.

use crate::app::StarJarApp;
use crate::catalog::CatalogEntry;
use crate::jar::dex::CollectionView;
use crate::jar::view::{JarPhase, ShakeReport};
use crate::routes::util::{escape_html, percent_encode};

/// Extra content shown under the jar after an action.
pub enum Notice<'a> {
    None,
    Revealed(&'a str),
    ResetDenied,
}

const RESET_DENIED: &str = "Why you trying to break the law";

/// `onerror` handler swapping in the default image. The URL sits in a
/// single-quoted JS string inside a double-quoted attribute, so it is
/// JS-escaped first and the whole handler HTML-escaped after.
fn fallback_onerror(app: &StarJarApp) -> String {
    let url = app
        .config
        .asset(&app.config.default_image)
        .replace('\\', "\\\\")
        .replace('\'', "\\'");
    escape_html(&format!("this.onerror=null;this.src='{url}'"))
}

/// Render the jar panel. `shaken` attaches each star's waypoints as
/// `data-path="x,y x,y …"` for the JS animator; stars are placed at their
/// settled positions either way.
pub fn render_jar(app: &StarJarApp, notice: Notice<'_>, shaken: &[ShakeReport]) -> String {
    let config = &app.config;
    let jar = app.jar.borrow();
    let phase = jar.phase();
    let half = config.item_size / 2.0;
    let onerror = fallback_onerror(app);
    let mut html = String::with_capacity(4096);

    html.push_str(r#"<div id="star-jar" class="flex flex-col items-center mt-10">"#);
    html.push_str(&format!(
        r#"<div class="relative" style="width:{size}px;height:{size}px">"#,
        size = config.raster_size
    ));
    html.push_str(&format!(
        r#"<img src="{}" alt="jar back" class="absolute inset-0 w-full h-full object-contain z-0">"#,
        escape_html(&config.asset("/jar/back.PNG"))
    ));

    for star in jar.items() {
        let path = shaken
            .iter()
            .find(|r| r.id == star.id)
            .map(|r| {
                r.path
                    .waypoints
                    .iter()
                    .map(|p| format!("{:.1},{:.1}", p.x, p.y))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        html.push_str(&format!(
            r#"<img src="{src}" alt="star" data-star-id="{id}" data-path="{path}" class="absolute w-8 h-8 pointer-events-none" style="left:{left:.1}px;top:{top:.1}px;z-index:5" onerror="{onerror}">"#,
            src = escape_html(&config.asset(&star.image)),
            id = escape_html(&star.id),
            path = path,
            left = star.position.x - half,
            top = star.position.y - half,
            onerror = onerror,
        ));
    }

    html.push_str(&format!(
        r#"<img src="{}" alt="jar lid" class="absolute inset-0 w-full h-full object-contain z-10">"#,
        escape_html(&config.asset("/jar/lid.PNG"))
    ));
    html.push_str("</div>");

    // Controls
    html.push_str(r#"<div class="flex gap-4 mt-6 flex-wrap justify-center">"#);
    if phase == JarPhase::Empty {
        html.push_str(
            r##"<button class="bg-[#D8D1EF] hover:bg-[#CFC6EA] text-[#5C5575] text-lg px-6 py-3 rounded-full shadow-md font-semibold transition hover:scale-105" hx-post="/api/jar/spawn" hx-target="#star-jar" hx-swap="outerHTML">Press me!</button>"##,
        );
    } else {
        html.push_str(
            r##"<button class="bg-white/30 backdrop-blur-md border border-[#D1D9EC] text-sm text-[#555] px-4 py-2 rounded-full shadow-sm hover:bg-white/50 hover:scale-105 transition" hx-post="/api/jar/shake" hx-target="#star-jar" hx-swap="outerHTML">Shake me</button>"##,
        );
        let disabled = if phase == JarPhase::Exhausted { " disabled" } else { "" };
        html.push_str(&format!(
            r##"<button class="bg-[#bdaddb] hover:bg-[#b2d0f7] text-white text-lg px-6 py-3 rounded-full font-semibold shadow-md transition hover:scale-105 disabled:opacity-50" hx-post="/api/jar/wish" hx-target="#star-jar" hx-swap="outerHTML"{}>Make a wish!</button>"##,
            disabled
        ));
    }
    html.push_str("</div>");

    // Reveal area
    html.push_str(r#"<div id="wish-result" class="mt-7 text-center h-24 flex items-center justify-center">"#);
    match notice {
        Notice::Revealed(text) => {
            html.push_str(r#"<div class="text-center flex flex-col items-center gap-2">"#);
            html.push_str(&format!(
                r#"<p class="text-[#6D679D] text-xl font-semibold">✨ {} ✨</p>"#,
                escape_html(text)
            ));
            html.push_str(&format!(
                r##"<button class="mt-1 px-3 py-1 rounded-full text-sm bg-white text-[#6D679D] border border-[#d6d2e8] hover:bg-[#f3f0fa] transition" hx-get="/api/jar/detail?text={}" hx-target="#star-modal" hx-swap="innerHTML">Read more</button>"##,
                percent_encode(text)
            ));
            html.push_str("</div>");
        }
        Notice::ResetDenied => {
            html.push_str(&format!(
                r#"<p role="alert" class="text-sm text-red-600">{}</p>"#,
                RESET_DENIED
            ));
        }
        Notice::None => {}
    }
    html.push_str("</div>");

    // Reset form (password-gated)
    if phase != JarPhase::Empty {
        html.push_str(
            r##"<form class="fixed bottom-4 right-4 flex gap-2 z-50" hx-post="/api/jar/reset" hx-target="#star-jar" hx-swap="outerHTML">"##,
        );
        html.push_str(
            r#"<input type="password" name="secret" placeholder="Password" class="px-3 py-2 border border-gray-300 rounded text-sm">"#,
        );
        html.push_str(
            r#"<button type="submit" class="bg-[#D3DCE6] hover:bg-[#C6D0DB] text-sm text-black px-4 py-2 rounded-full shadow">Reset Jar</button>"#,
        );
        html.push_str("</form>");
    }

    html.push_str("</div>");
    html
}

/// The collection grid with its header and "n/total collected" footer.
pub fn render_dex(app: &StarJarApp, dex: &CollectionView) -> String {
    let onerror = fallback_onerror(app);
    let mut html = String::with_capacity(4096);

    html.push_str(r#"<div class="max-w-xl mx-auto px-4 pt-4 pb-12">"#);
    html.push_str(r#"<div class="flex items-center justify-between mb-4">"#);
    html.push_str(r#"<h2 class="text-xl font-semibold text-[#6D679D]">I like you for...</h2>"#);
    html.push_str(
        r##"<button class="text-sm px-3 py-1 rounded-full border border-[#d6d2e8] bg-white hover:bg-[#f3f0fa] transition" hx-post="/api/dex/refresh" hx-target="#star-dex" hx-swap="innerHTML">Refresh</button>"##,
    );
    html.push_str("</div>");

    html.push_str(r#"<div class="grid grid-cols-3 sm:grid-cols-4 gap-4">"#);
    for item in dex.entries() {
        let entry = item.entry;
        let img = escape_html(&app.config.asset(&entry.image));
        if item.unlocked {
            let text = escape_html(&entry.text);
            html.push_str(&format!(
                r##"<button type="button" title="{text}" class="relative rounded-xl p-3 border shadow-sm text-left transition bg-white hover:shadow cursor-pointer" hx-get="/api/dex/detail?text={q}" hx-target="#star-modal" hx-swap="innerHTML">"##,
                text = text,
                q = percent_encode(&entry.text),
            ));
            html.push_str(&format!(
                r#"<div class="w-14 h-14 mx-auto relative"><img src="{img}" alt="{text}" class="w-full h-full object-contain" onerror="{onerror}"></div>"#
            ));
            html.push_str(&format!(
                r#"<div class="mt-2 text-center"><div class="text-xs font-medium text-[#6D679D]">{text}</div><div class="text-[11px] text-gray-500 line-clamp-2 mt-1">{}</div></div>"#,
                escape_html(&entry.description)
            ));
        } else {
            html.push_str(
                r#"<button type="button" disabled title="Locked!" class="relative rounded-xl p-3 border shadow-sm text-left transition bg-gray-50 cursor-not-allowed">"#,
            );
            html.push_str(&format!(
                r#"<div class="w-14 h-14 mx-auto relative"><img src="{img}" alt="Locked star" class="w-full h-full object-contain opacity-50 saturate-0" onerror="{onerror}">"#
            ));
            html.push_str(
                r#"<div class="absolute inset-0 flex items-center justify-center"><span class="px-2 py-0.5 text-[11px] font-medium rounded-full bg-white/85 border border-gray-200 text-gray-600">Locked</span></div></div>"#,
            );
            html.push_str(
                r#"<div class="mt-2 text-center"><div class="text-xs font-medium text-[#6D679D]">XXX</div><div class="text-[11px] text-gray-400 mt-1">Secret!</div></div>"#,
            );
        }
        html.push_str("</button>");
    }
    html.push_str("</div>");

    html.push_str(&format!(
        r#"<p class="text-center text-xs text-gray-500 mt-4">{}/{} collected</p>"#,
        dex.collected(),
        dex.total()
    ));
    html.push_str("</div>");
    html
}

/// Collection grid wrapped for an HTMX out-of-band swap into `#star-dex`.
pub fn render_dex_oob(app: &StarJarApp) -> String {
    let dex = app.dex.borrow();
    format!(
        r#"<div id="star-dex" hx-swap-oob="innerHTML">{}</div>"#,
        render_dex(app, &dex)
    )
}

/// Detail dialog. `entry == None` renders the generic "keep collecting" card
/// used when a revealed text is no longer in the catalog.
pub fn render_detail(app: &StarJarApp, text: &str, entry: Option<&CatalogEntry>) -> String {
    let image = entry
        .map(|e| e.image.as_str())
        .unwrap_or(app.config.default_image.as_str());
    let description = entry.map(|e| e.description.as_str()).unwrap_or(
        "This star reflects one of your amazing qualities. Keep collecting more!",
    );
    let text = escape_html(text);
    let mut html = String::with_capacity(1024);
    html.push_str(
        r#"<div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 backdrop-blur-sm" role="dialog" aria-modal="true" onclick="if(event.target===this)this.remove()">"#,
    );
    html.push_str(r#"<div class="bg-white rounded-xl shadow-lg p-6 max-w-sm w-full relative">"#);
    html.push_str(
        r#"<button class="absolute top-2 right-2 text-gray-400 hover:text-gray-600" aria-label="Close" onclick="this.closest('[role=dialog]').remove()">✕</button>"#,
    );
    html.push_str(r#"<div class="flex flex-col items-center text-center">"#);
    html.push_str(&format!(
        r#"<img src="{}" alt="{}" class="w-16 h-16 mb-3" onerror="{}">"#,
        escape_html(&app.config.asset(image)),
        text,
        fallback_onerror(app)
    ));
    html.push_str(&format!(
        r#"<h3 class="text-lg font-bold text-[#6D679D]">{}</h3>"#,
        text
    ));
    html.push_str(&format!(
        r#"<p class="text-sm text-gray-600 mt-2">{}</p>"#,
        escape_html(description)
    ));
    html.push_str("</div></div></div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::sample_catalog;
    use crate::config::JarConfig;
    use crate::jar::mask::AlphaMask;
    use crate::jar::store::MemoryStorage;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::rc::Rc;

    fn app_with(config: JarConfig, n: usize) -> StarJarApp {
        StarJarApp::new(
            config,
            sample_catalog(n),
            Rc::new(MemoryStorage::new()),
            StdRng::seed_from_u64(1),
        )
    }

    #[test]
    fn empty_jar_buttons_target_the_panel() {
        let app = app_with(JarConfig::default(), 2);
        let html = render_jar(&app, Notice::None, &[]);
        assert!(html.contains(r##"hx-post="/api/jar/spawn" hx-target="#star-jar" hx-swap="outerHTML">Press me!"##));
        assert!(!html.contains("/api/jar/reset"));
    }

    #[test]
    fn spawned_jar_buttons_target_the_panel() {
        let app = app_with(JarConfig::default(), 2);
        let mask = AlphaMask::filled(300, 300, 255);
        app.jar.borrow_mut().spawn(Some(&mask)).unwrap();
        let html = render_jar(&app, Notice::None, &[]);
        for action in ["shake", "wish", "reset"] {
            let attr = format!(r##"hx-post="/api/jar/{action}" hx-target="#star-jar""##);
            assert!(html.contains(&attr), "missing {attr}");
        }
        assert!(html.contains(r#"type="password" name="secret""#));
    }

    #[test]
    fn revealed_notice_opens_modal() {
        let app = app_with(JarConfig::default(), 1);
        let html = render_jar(&app, Notice::Revealed("Kind & brave"), &[]);
        assert!(html.contains("✨ Kind &amp; brave ✨"));
        assert!(html.contains(
            r##"hx-get="/api/jar/detail?text=Kind%20%26%20brave" hx-target="#star-modal""##
        ));
    }

    #[test]
    fn reset_denied_notice() {
        let app = app_with(JarConfig::default(), 1);
        let html = render_jar(&app, Notice::ResetDenied, &[]);
        assert!(html.contains(r#"role="alert""#));
        assert!(html.contains("Why you trying to break the law"));
    }

    #[test]
    fn stars_are_offset_by_half_their_size() {
        let app = app_with(JarConfig::default(), 1);
        app.jar.borrow_mut().spawn(None).unwrap();
        let html = render_jar(&app, Notice::None, &[]);
        // fallback point (150, 180)
        assert!(html.contains("left:134.0px;top:164.0px"));
    }

    #[test]
    fn fallback_image_handler_is_escaped() {
        let config = JarConfig {
            public_url: r#"/it's "x""#.to_string(),
            ..JarConfig::default()
        };
        let app = app_with(config, 1);
        let html = render_dex(&app, &app.dex.borrow());
        assert!(html.contains(
            r#"onerror="this.onerror=null;this.src=&#39;/it\&#39;s &quot;x&quot;/stars/default.PNG?v=2025-08-11-1&#39;""#
        ));
    }

    #[test]
    fn detail_for_unknown_text_uses_default_card() {
        let app = app_with(JarConfig::default(), 1);
        let html = render_detail(&app, "<b>new</b>", None);
        assert!(html.contains("&lt;b&gt;new&lt;/b&gt;"));
        assert!(html.contains("/stars/default.PNG?v="));
        assert!(html.contains("Keep collecting more!"));
    }
}
