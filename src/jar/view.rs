//! Jar view — spawning, shaking and wishing stars out of the jar.
//!
//! ```text
//!            spawn()                 wish() × n
//!   Empty ───────────▶ Spawned ─────────────────▶ Exhausted
//!     ▲                   │                           │
//!     └──── reset() ──────┴────────── reset() ────────┘
//! ```
//!
//! `Exhausted` is `Spawned` with zero stars left: wishing is disabled and
//! spawning stays refused until a reset. A jar persisted empty loads back as
//! `Empty`.

use std::cell::RefCell;
use std::rc::Rc;

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::catalog::{Catalog, image_filename};
use crate::config::JarConfig;
use crate::error::JarError;
use crate::jar::ActiveItem;
use crate::jar::bus::{ChangeBus, SubscriptionToken, Topic};
use crate::jar::mask::AlphaMask;
use crate::jar::sampler::{PositionSampler, SamplerParams, ShakePath};
use crate::jar::store::CollectionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JarPhase {
    Empty,
    Spawned,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
enum JarState {
    Empty,
    /// Possibly with no stars left.
    Spawned(Vec<ActiveItem>),
}

/// One star's movement during a shake.
#[derive(Debug, Clone, PartialEq)]
pub struct ShakeReport {
    pub id: String,
    pub path: ShakePath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WishOutcome {
    /// The revealed compliment text.
    pub compliment: String,
    /// The star that left the jar.
    pub item: ActiveItem,
    pub shaken: Vec<ShakeReport>,
}

pub struct JarView {
    catalog: Rc<Catalog>,
    store: CollectionStore,
    bus: ChangeBus,
    params: SamplerParams,
    reset_secret: String,
    rng: StdRng,
    state: JarState,
}

impl JarView {
    /// Mount the view and load whatever jar is already persisted.
    pub fn mount(
        catalog: Rc<Catalog>,
        store: CollectionStore,
        bus: ChangeBus,
        config: &JarConfig,
        rng: StdRng,
    ) -> Self {
        let mut view = Self {
            catalog,
            store,
            bus,
            params: SamplerParams::from(config),
            reset_secret: config.reset_secret.clone(),
            rng,
            state: JarState::Empty,
        };
        view.reload();
        view
    }

    /// Share the view and reload it on every `Topic::Updated` raised
    /// elsewhere: another view, or another tab through the storage event.
    /// The view's own publishes arrive while it is mutably borrowed and are
    /// skipped, since it already holds what it just wrote.
    pub fn into_shared(self) -> (Rc<RefCell<Self>>, SubscriptionToken) {
        let bus = self.bus.clone();
        let view = Rc::new(RefCell::new(self));
        let weak = Rc::downgrade(&view);
        let token = bus.subscribe(Topic::Updated, move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match shared.try_borrow_mut() {
                Ok(mut view) => view.reload(),
                Err(_) => debug!("jar view busy, own change skipped"),
            }
        });
        (view, token)
    }

    pub fn reload(&mut self) {
        let items = self.store.load().items;
        self.state = if items.is_empty() {
            JarState::Empty
        } else {
            JarState::Spawned(items)
        };
    }

    pub fn phase(&self) -> JarPhase {
        match &self.state {
            JarState::Empty => JarPhase::Empty,
            JarState::Spawned(items) if items.is_empty() => JarPhase::Exhausted,
            JarState::Spawned(_) => JarPhase::Spawned,
        }
    }

    pub fn items(&self) -> &[ActiveItem] {
        match &self.state {
            JarState::Empty => &[],
            JarState::Spawned(items) => items,
        }
    }

    /// Fill the jar with one star per catalog entry. Placement is sequential
    /// so each star avoids every earlier one. Returns the star count.
    pub fn spawn(&mut self, mask: Option<&AlphaMask>) -> Result<usize, JarError> {
        if self.phase() != JarPhase::Empty {
            debug!(phase = ?self.phase(), "spawn declined");
            return Err(JarError::AlreadySpawned);
        }
        let sampler = PositionSampler::new(mask, self.params);
        let positions = sampler.sample_many(self.catalog.len(), &mut self.rng);
        let items: Vec<ActiveItem> = self
            .catalog
            .entries()
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(i, (entry, position))| ActiveItem {
                id: format!("star-{}", i),
                image: entry.image.clone(),
                position,
                compliment: entry.text.clone(),
            })
            .collect();
        let count = items.len();

        self.store.save_items(&items);
        self.state = JarState::Spawned(items);
        self.bus.publish(Topic::Updated);
        info!(count, "jar spawned");
        Ok(count)
    }

    /// Jiggle every star and persist where each settles. Without a mask
    /// nothing moves and nothing is written.
    pub fn shake(&mut self, mask: Option<&AlphaMask>) -> Vec<ShakeReport> {
        let JarState::Spawned(items) = &mut self.state else {
            return Vec::new();
        };
        let sampler = PositionSampler::new(mask, self.params);
        let mut reports = Vec::with_capacity(items.len());
        for item in items.iter_mut() {
            if let Some(path) = sampler.shake(item.position, &mut self.rng) {
                item.position = path.settled;
                reports.push(ShakeReport {
                    id: item.id.clone(),
                    path,
                });
            }
        }
        if !reports.is_empty() {
            self.store.save_items(items);
        }
        reports
    }

    /// Shake, then draw one star uniformly, reveal its compliment and add it
    /// to the collection.
    ///
    /// The compliment is resolved by the star's image filename, not its id.
    /// If no catalog entry has that filename the wish is dropped: the star
    /// stays in the jar and nothing is unlocked.
    pub fn wish(&mut self, mask: Option<&AlphaMask>) -> Result<WishOutcome, JarError> {
        if self.items().is_empty() {
            debug!(phase = ?self.phase(), "wish declined");
            return Err(JarError::NothingToWish);
        }
        let shaken = self.shake(mask);

        let JarState::Spawned(items) = &self.state else {
            return Err(JarError::NothingToWish);
        };
        let idx = self.rng.gen_range(0..items.len());
        let picked = &items[idx];
        let Some(entry) = self.catalog.find_by_image(&picked.image) else {
            let filename = image_filename(&picked.image).to_string();
            debug!(filename = filename.as_str(), "wish matched no catalog entry");
            return Err(JarError::UnmatchedImage(filename));
        };
        let compliment = entry.text.clone();

        let mut next = items.clone();
        let item = next.remove(idx);

        // Both keys are durable before anyone hears about it.
        self.store.save_items(&next);
        let mut unlocked = self.store.load_unlocked();
        unlocked.insert(&compliment);
        self.store.save_unlocked(&unlocked);
        self.state = JarState::Spawned(next);
        self.bus.publish(Topic::Updated);

        info!(
            compliment = compliment.as_str(),
            remaining = self.items().len(),
            "wish granted"
        );
        Ok(WishOutcome {
            compliment,
            item,
            shaken,
        })
    }

    /// Empty the jar and the collection. `secret` must match the configured
    /// confirmation phrase; otherwise nothing changes.
    pub fn reset(&mut self, secret: &str) -> Result<(), JarError> {
        if secret != self.reset_secret {
            info!("reset refused: wrong secret");
            return Err(JarError::ResetDenied);
        }
        self.store.clear();
        self.state = JarState::Empty;
        self.bus.publish(Topic::Updated);
        info!("jar reset");
        Ok(())
    }
}
