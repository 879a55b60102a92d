//! Collection view ("Star Dex") — which compliments have been collected.
//!
//! Holds a private copy of the unlocked list and of the compliments still in
//! the jar, refreshed from the store on mount and on every `Topic::Updated`.
//! Classification is a pure function of those two sets:
//!
//! - jar non-empty: unlocked iff in the unlocked list OR no longer in the jar
//! - jar empty: unlocked iff in the unlocked list
//!
//! The empty-jar rule keeps a never-spawned (or freshly reset) jar from
//! reading as "everything collected".

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::catalog::{Catalog, CatalogEntry};
use crate::jar::bus::{ChangeBus, SubscriptionToken, Topic};
use crate::jar::store::{CollectionStore, UnlockedSet};

/// One catalog entry with its collection status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexEntry<'c> {
    pub entry: &'c CatalogEntry,
    pub unlocked: bool,
}

pub struct CollectionView {
    catalog: Rc<Catalog>,
    store: CollectionStore,
    unlocked: UnlockedSet,
    remaining: HashSet<String>,
}

impl CollectionView {
    pub fn new(catalog: Rc<Catalog>, store: CollectionStore) -> Self {
        let mut view = Self {
            catalog,
            store,
            unlocked: UnlockedSet::default(),
            remaining: HashSet::new(),
        };
        view.reload();
        view
    }

    /// Mount on a bus: the returned view reloads itself on every publish.
    pub fn mount(
        catalog: Rc<Catalog>,
        store: CollectionStore,
        bus: &ChangeBus,
    ) -> (Rc<RefCell<Self>>, SubscriptionToken) {
        let view = Rc::new(RefCell::new(Self::new(catalog, store)));
        let weak = Rc::downgrade(&view);
        let token = bus.subscribe(Topic::Updated, move || {
            if let Some(view) = weak.upgrade() {
                view.borrow_mut().reload();
            }
        });
        (view, token)
    }

    pub fn reload(&mut self) {
        let state = self.store.load();
        self.unlocked = state.unlocked;
        self.remaining = state
            .items
            .into_iter()
            .map(|item| item.compliment)
            .filter(|c| !c.is_empty())
            .collect();
    }

    pub fn is_unlocked(&self, text: &str) -> bool {
        self.unlocked.contains(text)
            || (!self.remaining.is_empty() && !self.remaining.contains(text))
    }

    /// Every catalog entry, unlocked first, catalog order within each group.
    pub fn entries(&self) -> Vec<DexEntry<'_>> {
        let mut entries: Vec<DexEntry<'_>> = self
            .catalog
            .entries()
            .iter()
            .map(|entry| DexEntry {
                entry,
                unlocked: self.is_unlocked(&entry.text),
            })
            .collect();
        entries.sort_by_key(|e| !e.unlocked);
        entries
    }

    pub fn collected(&self) -> usize {
        self.catalog
            .entries()
            .iter()
            .filter(|e| self.is_unlocked(&e.text))
            .count()
    }

    pub fn total(&self) -> usize {
        self.catalog.len()
    }

    /// Open an entry's detail. Locked or unknown entries cannot be opened.
    pub fn select(&self, text: &str) -> Option<&CatalogEntry> {
        self.catalog
            .find_by_text(text)
            .filter(|e| self.is_unlocked(&e.text))
    }
}
