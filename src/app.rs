//! The mounted application: one jar view and one collection view over a
//! shared store and change bus.
//!
//! Lives in a `thread_local!` for the lifetime of the page, the same way the
//! WASM instance itself does. `init_app` replaces it wholesale.

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::JarConfig;
use crate::error::ConfigError;
use crate::jar::bus::{ChangeBus, SubscriptionToken, Topic};
use crate::jar::dex::CollectionView;
use crate::jar::store::{CollectionStore, KeyValueStore};
use crate::jar::view::{JarPhase, JarView};

pub struct StarJarApp {
    pub config: JarConfig,
    pub catalog: Rc<Catalog>,
    pub store: CollectionStore,
    pub bus: ChangeBus,
    pub jar: Rc<RefCell<JarView>>,
    pub dex: Rc<RefCell<CollectionView>>,
    subscriptions: [SubscriptionToken; 2],
}

impl StarJarApp {
    pub fn new(
        config: JarConfig,
        catalog: Catalog,
        backend: Rc<dyn KeyValueStore>,
        rng: StdRng,
    ) -> Self {
        let catalog = Rc::new(catalog);
        let store = CollectionStore::new(config.storage_keys(), &config.storage_version, backend);
        let bus = ChangeBus::new();
        let (jar, jar_subscription) = JarView::mount(
            Rc::clone(&catalog),
            store.clone(),
            bus.clone(),
            &config,
            rng,
        )
        .into_shared();
        let (dex, dex_subscription) =
            CollectionView::mount(Rc::clone(&catalog), store.clone(), &bus);
        info!(
            entries = catalog.len(),
            namespace = config.namespace().as_str(),
            phase = ?jar.borrow().phase(),
            "star jar mounted"
        );
        Self {
            config,
            catalog,
            store,
            bus,
            jar,
            dex,
            subscriptions: [jar_subscription, dex_subscription],
        }
    }

    /// A `storage` event from another tab. Only the two collection keys (or
    /// a full clear, `key == None`) reload both views. Returns whether it did.
    pub fn on_storage_event(&self, key: Option<&str>) -> bool {
        if !self.store.keys().is_collection_key(key) {
            debug!(key, "ignoring storage event");
            return false;
        }
        self.bus.publish(Topic::Updated);
        true
    }

    /// The onboarding deck shows until dismissed, and only before a spawn.
    pub fn should_show_intro(&self) -> bool {
        !self.store.intro_dismissed() && self.jar.borrow().phase() == JarPhase::Empty
    }

    pub fn dismiss_intro(&self) {
        self.store.dismiss_intro();
    }
}

impl Drop for StarJarApp {
    fn drop(&mut self) {
        for token in self.subscriptions {
            self.bus.unsubscribe(token);
        }
    }
}

thread_local! {
    static APP: RefCell<Option<StarJarApp>> = const { RefCell::new(None) };
}

pub fn install(app: StarJarApp) {
    APP.with(|a| *a.borrow_mut() = Some(app));
}

pub fn uninstall() {
    APP.with(|a| *a.borrow_mut() = None);
}

/// Read access to the mounted app. `None` before `init_app`.
pub fn with_app<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&StarJarApp) -> R,
{
    APP.with(|a| a.borrow().as_ref().map(f))
}

/// Build and install the app from the page's config and catalog JSON,
/// backed by `localStorage` in the browser.
pub fn init_from_json(config_json: &str, catalog_json: &str) -> Result<(), ConfigError> {
    let config = JarConfig::from_json(config_json)?;
    let catalog = Catalog::from_json(catalog_json)?;
    let backend = default_backend()?;
    install(StarJarApp::new(config, catalog, backend, StdRng::from_entropy()));
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn default_backend() -> Result<Rc<dyn KeyValueStore>, ConfigError> {
    Ok(Rc::new(crate::jar::store::BrowserStorage::open()?))
}

#[cfg(not(target_arch = "wasm32"))]
fn default_backend() -> Result<Rc<dyn KeyValueStore>, ConfigError> {
    Ok(Rc::new(crate::jar::store::MemoryStorage::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::sample_catalog;
    use crate::jar::mask::AlphaMask;
    use crate::jar::store::MemoryStorage;

    /// One browser tab: its own app (views, bus) over a shared origin storage.
    fn tab(origin: &MemoryStorage, n: usize, seed: u64) -> StarJarApp {
        StarJarApp::new(
            JarConfig::default(),
            sample_catalog(n),
            Rc::new(origin.clone()),
            StdRng::seed_from_u64(seed),
        )
    }

    fn flags(app: &StarJarApp) -> Vec<(String, bool)> {
        app.dex
            .borrow()
            .entries()
            .iter()
            .map(|e| (e.entry.text.clone(), e.unlocked))
            .collect()
    }

    #[test]
    fn scenario_spawn_wish_exhaust_reset() {
        let origin = MemoryStorage::new();
        let app = tab(&origin, 3, 1);
        let mask = AlphaMask::filled(300, 300, 255);

        // spawn: three stars, nothing collected yet
        assert_eq!(app.jar.borrow_mut().spawn(Some(&mask)), Ok(3));
        assert!(flags(&app).iter().all(|(_, unlocked)| !unlocked));
        assert!(app.store.load().unlocked.is_empty());

        // first wish: exactly the revealed entry unlocks
        let first = app.jar.borrow_mut().wish(Some(&mask)).unwrap().compliment;
        assert_eq!(app.jar.borrow().items().len(), 2);
        let unlocked: Vec<String> = app.store.load().unlocked.iter().map(String::from).collect();
        assert_eq!(unlocked, vec![first.clone()]);
        let f = flags(&app);
        assert_eq!(f[0], (first.clone(), true));
        assert!(f[1..].iter().all(|(_, unlocked)| !unlocked));

        // exhaust: everything unlocked through the empty-jar fallback
        while !app.jar.borrow().items().is_empty() {
            app.jar.borrow_mut().wish(Some(&mask)).unwrap();
        }
        assert_eq!(app.store.load().unlocked.len(), 3);
        assert!(flags(&app).iter().all(|(_, unlocked)| *unlocked));

        // reset: wrong secret changes nothing, right secret clears
        let before = origin.snapshot();
        assert!(app.jar.borrow_mut().reset("nope").is_err());
        assert_eq!(origin.snapshot(), before);
        app.jar.borrow_mut().reset("kakalove0608").unwrap();
        assert_eq!(app.jar.borrow().phase(), JarPhase::Empty);
        assert!(flags(&app).iter().all(|(_, unlocked)| !unlocked));
    }

    #[test]
    fn unlocked_set_only_grows_between_wishes() {
        let origin = MemoryStorage::new();
        let app = tab(&origin, 5, 3);
        let mask = AlphaMask::filled(300, 300, 255);
        app.jar.borrow_mut().spawn(Some(&mask)).unwrap();
        let mut previous: Vec<String> = Vec::new();
        while !app.jar.borrow().items().is_empty() {
            app.jar.borrow_mut().wish(Some(&mask)).unwrap();
            let now: Vec<String> = app.store.load().unlocked.iter().map(String::from).collect();
            assert_eq!(now.len(), previous.len() + 1);
            assert!(previous.iter().all(|p| now.contains(p)));
            previous = now;
        }
    }

    #[test]
    fn second_tab_follows_after_storage_event() {
        let origin = MemoryStorage::new();
        let tab_a = tab(&origin, 3, 7);
        let tab_b = tab(&origin, 3, 8);
        let mask = AlphaMask::filled(300, 300, 255);

        tab_a.jar.borrow_mut().spawn(Some(&mask)).unwrap();
        tab_a.jar.borrow_mut().wish(Some(&mask)).unwrap();
        // tab B's views have not heard anything yet
        assert_ne!(flags(&tab_a), flags(&tab_b));

        let keys = tab_b.store.keys().clone();
        assert!(!tab_b.on_storage_event(Some(&keys.intro)));
        assert!(tab_b.on_storage_event(Some(&keys.unlocked)));
        assert_eq!(flags(&tab_a), flags(&tab_b));
    }

    #[test]
    fn second_tab_jar_follows_and_refuses_respawn() {
        let origin = MemoryStorage::new();
        let tab_a = tab(&origin, 3, 7);
        let tab_b = tab(&origin, 3, 8);
        let mask = AlphaMask::filled(300, 300, 255);

        tab_a.jar.borrow_mut().spawn(Some(&mask)).unwrap();
        tab_a.jar.borrow_mut().wish(Some(&mask)).unwrap();
        assert_eq!(tab_b.jar.borrow().phase(), JarPhase::Empty);

        let stars = tab_b.store.keys().stars.clone();
        assert!(tab_b.on_storage_event(Some(&stars)));
        assert_eq!(tab_b.jar.borrow().phase(), JarPhase::Spawned);
        assert_eq!(tab_b.jar.borrow().items(), tab_a.jar.borrow().items());

        // tab B must not overwrite tab A's jar or return wished stars
        assert_eq!(
            tab_b.jar.borrow_mut().spawn(Some(&mask)),
            Err(crate::error::JarError::AlreadySpawned)
        );
        assert_eq!(tab_a.store.load().items.len(), 2);
    }

    #[test]
    fn second_tab_jar_empties_after_reset_elsewhere() {
        let origin = MemoryStorage::new();
        let tab_a = tab(&origin, 2, 1);
        let tab_b = tab(&origin, 2, 2);
        tab_a.jar.borrow_mut().spawn(None).unwrap();
        tab_b.on_storage_event(None);
        assert_eq!(tab_b.jar.borrow().phase(), JarPhase::Spawned);

        tab_a.jar.borrow_mut().reset("kakalove0608").unwrap();
        tab_b.on_storage_event(None);
        assert_eq!(tab_b.jar.borrow().phase(), JarPhase::Empty);
        assert_eq!(tab_b.dex.borrow().collected(), 0);
    }

    #[test]
    fn storage_clear_event_reloads() {
        let origin = MemoryStorage::new();
        let tab_a = tab(&origin, 2, 1);
        let tab_b = tab(&origin, 2, 2);
        let mask = AlphaMask::filled(300, 300, 255);
        tab_a.jar.borrow_mut().spawn(Some(&mask)).unwrap();
        tab_a.jar.borrow_mut().wish(Some(&mask)).unwrap();
        assert!(tab_b.on_storage_event(None));
        assert_eq!(tab_b.dex.borrow().collected(), 1);
    }

    #[test]
    fn intro_visibility() {
        let origin = MemoryStorage::new();
        let app = tab(&origin, 2, 1);
        assert!(app.should_show_intro());
        app.jar.borrow_mut().spawn(None).unwrap();
        assert!(!app.should_show_intro());
        app.jar.borrow_mut().reset("kakalove0608").unwrap();
        assert!(app.should_show_intro());
        app.dismiss_intro();
        assert!(!app.should_show_intro());
    }

    #[test]
    fn dropping_app_detaches_dex() {
        let origin = MemoryStorage::new();
        let app = tab(&origin, 1, 1);
        let bus = app.bus.clone();
        assert_eq!(bus.subscriber_count(Topic::Updated), 2);
        drop(app);
        assert_eq!(bus.subscriber_count(Topic::Updated), 0);
    }

    #[test]
    fn init_from_json_installs_app() {
        uninstall();
        assert!(with_app(|_| ()).is_none());
        init_from_json(
            r#"{"public_url":"/gift"}"#,
            r#"[{"text":"Kind","image":"/stars/a.PNG","description":"d"}]"#,
        )
        .unwrap();
        let ns = with_app(|app| app.config.namespace()).unwrap();
        assert_eq!(ns, "/gift:starjar");
        assert!(init_from_json("", "[{").is_err());
        uninstall();
    }
}
