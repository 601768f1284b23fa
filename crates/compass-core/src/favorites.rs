// The favorites list: one shared, persisted, ordered set of recipe summaries
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::models::RecipeSummary;
use crate::persistence::{lock, FavoritesBackend};
use crate::StoreWarning;

/// Favorited recipes, oldest first, at most one entry per id.
///
/// Immutable once built: every change produces a new set, so a snapshot
/// handed to a view never shifts underneath it. Cloning is cheap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesSet {
    entries: Arc<Vec<RecipeSummary>>,
}

impl FavoritesSet {
    /// Build a set, dropping later duplicates of an id
    pub fn from_entries(entries: Vec<RecipeSummary>) -> Self {
        let mut unique: Vec<RecipeSummary> = Vec::with_capacity(entries.len());
        for entry in entries {
            if unique.iter().any(|e| e.id == entry.id) {
                debug!("Dropping duplicate favorite {}", entry.id);
                continue;
            }
            unique.push(entry);
        }
        Self {
            entries: Arc::new(unique),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&RecipeSummary> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// The set after toggling `summary`, and whether it ended up favorited.
    ///
    /// Absent ids are appended at the end; present ids are removed, along
    /// with their stored fields.
    pub fn toggled(&self, summary: RecipeSummary) -> (FavoritesSet, bool) {
        if self.contains(&summary.id) {
            let remaining = self
                .entries
                .iter()
                .filter(|e| e.id != summary.id)
                .cloned()
                .collect();
            (
                FavoritesSet {
                    entries: Arc::new(remaining),
                },
                false,
            )
        } else {
            let mut grown = Vec::with_capacity(self.entries.len() + 1);
            grown.extend(self.entries.iter().cloned());
            grown.push(summary);
            (
                FavoritesSet {
                    entries: Arc::new(grown),
                },
                true,
            )
        }
    }

    /// Entries whose name fuzzy-matches `pattern`, in set order
    pub fn matching(&self, pattern: &str) -> Vec<&RecipeSummary> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return self.entries.iter().collect();
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        self.entries
            .iter()
            .filter(|e| matcher.fuzzy_match(&e.name, pattern).is_some())
            .collect()
    }

    pub fn to_vec(&self) -> Vec<RecipeSummary> {
        self.entries.as_ref().clone()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl Deref for FavoritesSet {
    type Target = [RecipeSummary];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl Serialize for FavoritesSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FavoritesSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<RecipeSummary>::deserialize(deserializer).map(FavoritesSet::from_entries)
    }
}

/// What a toggle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// True when the recipe is a favorite after the call
    pub favorited: bool,
    /// Set when the new list could not be written out; memory still changed
    pub warning: Option<StoreWarning>,
}

/// Owner of the favorites list.
///
/// Build one per application and hand an `Arc` of it to every view. Views
/// read through [`list`](Self::list) or [`is_favorited`](Self::is_favorited),
/// or [`subscribe`](Self::subscribe) to hear about every change.
///
/// Writers are serialized: the backend mutex is held across computing the
/// new set, persisting it and publishing it, so readers only ever see a
/// fully committed set and the slot always matches what was published.
pub struct FavoritesStore {
    backend: Mutex<Box<dyn FavoritesBackend>>,
    current: watch::Sender<FavoritesSet>,
}

impl FavoritesStore {
    /// Load persisted favorites. Never fails: unreadable or corrupt state
    /// is logged, reported back as a warning, and replaced by an empty set.
    pub fn open<B>(backend: B) -> (Self, Option<StoreWarning>)
    where
        B: FavoritesBackend + 'static,
    {
        let (initial, warning) = match backend.load() {
            Ok(Some(raw)) if !raw.trim().is_empty() => match FavoritesSet::from_json(&raw) {
                Ok(set) => {
                    info!("Loaded {} favorites", set.len());
                    (set, None)
                }
                Err(e) => {
                    error!("Failed to parse persisted favorites: {}", e);
                    (
                        FavoritesSet::default(),
                        Some(StoreWarning::CorruptState(e.to_string())),
                    )
                }
            },
            Ok(_) => {
                debug!("No persisted favorites, starting empty");
                (FavoritesSet::default(), None)
            }
            Err(e) => {
                warn!("Failed to read persisted favorites: {}", e);
                (
                    FavoritesSet::default(),
                    Some(StoreWarning::ReadFailed(e.to_string())),
                )
            }
        };

        let (current, _) = watch::channel(initial);
        let store = Self {
            backend: Mutex::new(Box::new(backend)),
            current,
        };
        (store, warning)
    }

    /// Snapshot of the current set
    pub fn list(&self) -> FavoritesSet {
        self.current.borrow().clone()
    }

    pub fn is_favorited(&self, id: &str) -> bool {
        self.current.borrow().contains(id)
    }

    pub fn len(&self) -> usize {
        self.current.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.borrow().is_empty()
    }

    /// Receiver that sees every committed set from now on
    pub fn subscribe(&self) -> watch::Receiver<FavoritesSet> {
        self.current.subscribe()
    }

    /// Add the recipe if absent, remove it if present.
    ///
    /// Only id, name, thumbnail, category and area are kept from the input.
    pub fn toggle(&self, recipe: impl Into<RecipeSummary>) -> ToggleOutcome {
        let summary = recipe.into();
        let mut backend = lock(&self.backend);

        let (next, favorited) = self.current.borrow().toggled(summary);
        let warning = persist(&mut **backend, &next);
        self.current.send_replace(next);

        ToggleOutcome { favorited, warning }
    }

    /// Drop every favorite
    pub fn clear(&self) -> Option<StoreWarning> {
        let mut backend = lock(&self.backend);

        let next = FavoritesSet::default();
        let warning = persist(&mut **backend, &next);
        self.current.send_replace(next);

        warning
    }
}

fn persist(backend: &mut dyn FavoritesBackend, set: &FavoritesSet) -> Option<StoreWarning> {
    let result = set
        .to_json()
        .map_err(crate::Error::from)
        .and_then(|json| backend.save(&json));

    match result {
        Ok(()) => {
            debug!("Persisted {} favorites", set.len());
            None
        }
        Err(e) => {
            warn!("Failed to save favorites: {}", e);
            Some(StoreWarning::WriteFailed(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryBackend;

    fn summary(id: &str, name: &str) -> RecipeSummary {
        RecipeSummary {
            id: id.to_string(),
            name: name.to_string(),
            thumbnail_url: format!("https://img/{}.jpg", id),
            category: "Seafood".to_string(),
            area: "Greek".to_string(),
        }
    }

    fn ids(set: &FavoritesSet) -> Vec<&str> {
        set.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_toggled_leaves_original_untouched() {
        let empty = FavoritesSet::default();
        let (one, favorited) = empty.toggled(summary("1", "Baked salmon"));

        assert!(favorited);
        assert!(empty.is_empty());
        assert_eq!(ids(&one), vec!["1"]);

        let (none, favorited) = one.toggled(summary("1", "Baked salmon"));
        assert!(!favorited);
        assert!(none.is_empty());
        assert_eq!(ids(&one), vec!["1"]);
    }

    #[test]
    fn test_removal_matches_on_id_only() {
        let (set, _) = FavoritesSet::default().toggled(summary("1", "Baked salmon"));
        // Display fields differ but the id is the same: still a removal
        let (set, favorited) = set.toggled(summary("1", "Renamed upstream"));

        assert!(!favorited);
        assert!(set.is_empty());
    }

    #[test]
    fn test_from_entries_drops_duplicates_keeping_first() {
        let set = FavoritesSet::from_entries(vec![
            summary("1", "first"),
            summary("2", "second"),
            summary("1", "again"),
        ]);

        assert_eq!(ids(&set), vec!["1", "2"]);
        assert_eq!(set.get("1").map(|e| e.name.as_str()), Some("first"));
    }

    #[test]
    fn test_matching_is_fuzzy_and_ordered() {
        let set = FavoritesSet::from_entries(vec![
            summary("1", "Teriyaki Chicken Casserole"),
            summary("2", "Baked salmon with fennel"),
            summary("3", "Chicken Handi"),
        ]);

        let hits: Vec<_> = set.matching("chkn").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(hits, vec!["1", "3"]);

        assert_eq!(set.matching("  ").len(), 3);
        assert!(set.matching("zzzz").is_empty());
    }

    #[test]
    fn test_json_is_plain_array() {
        let set = FavoritesSet::from_entries(vec![summary("1", "Baked salmon")]);
        let json = set.to_json().unwrap();

        assert!(json.starts_with('['));
        assert!(json.contains("\"thumbnailUrl\""));
        assert_eq!(FavoritesSet::from_json(&json).unwrap(), set);
    }

    #[test]
    fn test_blank_slot_is_treated_as_absent() {
        let (store, warning) = FavoritesStore::open(MemoryBackend::with_value("   "));
        assert!(store.is_empty());
        assert_eq!(warning, None);
    }

    #[test]
    fn test_clear_persists_empty_list() {
        let backend = MemoryBackend::new();
        let (store, _) = FavoritesStore::open(backend.clone());

        store.toggle(summary("1", "Baked salmon"));
        store.toggle(summary("2", "Chicken Handi"));
        assert_eq!(store.len(), 2);

        assert_eq!(store.clear(), None);
        assert!(store.is_empty());
        assert_eq!(backend.value().as_deref(), Some("[]"));
    }

    #[test]
    fn test_snapshot_is_detached_from_later_toggles() {
        let (store, _) = FavoritesStore::open(MemoryBackend::new());
        store.toggle(summary("1", "Baked salmon"));

        let before = store.list();
        store.toggle(summary("2", "Chicken Handi"));

        assert_eq!(ids(&before), vec!["1"]);
        assert_eq!(ids(&store.list()), vec!["1", "2"]);

        // Mutating a copy leaves the store alone
        let mut copy = before.to_vec();
        copy.clear();
        assert_eq!(store.len(), 2);
    }
}
