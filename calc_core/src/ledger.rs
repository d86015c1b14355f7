//! # Recent-Conversion Ledger
//!
//! Bounded, append-only history of conversions for one session. The oldest
//! entry is evicted once the ledger is at capacity, and [`Ledger::list`]
//! returns entries newest-first.
//!
//! Storage is injected through [`LedgerStore`]: [`MemoryStore`] for a
//! session-only ledger, or `file_io::JsonFileStore` for one that survives
//! restarts. The ledger itself never touches a specific storage API.
//!
//! ## Concurrency
//!
//! `record` takes `&mut self`, so append and eviction happen as one step.
//! Share a ledger between threads behind a `Mutex`.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::ledger::Ledger;
//! use calc_core::units::CategoryId;
//!
//! let mut ledger = Ledger::in_memory(20)?;
//! let result = ledger.record_conversion(CategoryId::Temperature, "celsius", "fahrenheit", 100.0)?;
//! assert_eq!(result, 212.0);
//! assert_eq!(ledger.list()[0].to_unit, "fahrenheit");
//! # Ok::<(), calc_core::errors::CalcError>(())
//! ```

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CalcError, CalcResult};
use crate::units::{convert_by_id, CategoryId};

/// Default number of entries kept
pub const DEFAULT_LEDGER_CAPACITY: usize = 25;

/// Largest accepted capacity
pub const MAX_LEDGER_CAPACITY: usize = 500;

/// A record of one conversion event.
///
/// Units are referenced by id and resolved against the catalog at display
/// time; an id that no longer exists simply fails to resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentConversion {
    pub id: Uuid,
    pub category: CategoryId,
    pub from_unit: String,
    pub to_unit: String,
    pub value: f64,
    pub result: f64,
    pub timestamp: DateTime<Utc>,
}

impl RecentConversion {
    /// Create an entry stamped with the current time.
    pub fn new(
        category: CategoryId,
        from_unit: impl Into<String>,
        to_unit: impl Into<String>,
        value: f64,
        result: f64,
    ) -> Self {
        RecentConversion {
            id: Uuid::new_v4(),
            category,
            from_unit: from_unit.into(),
            to_unit: to_unit.into(),
            value,
            result,
            timestamp: Utc::now(),
        }
    }

    /// Whether this entry is for the given (category, from, to) pair
    pub fn is_pair(&self, category: CategoryId, from_unit: &str, to_unit: &str) -> bool {
        self.category == category && self.from_unit == from_unit && self.to_unit == to_unit
    }
}

/// Backing storage for a ledger. Entries are passed oldest-first.
pub trait LedgerStore {
    /// Load persisted entries, oldest first. An empty store yields an empty list.
    fn load(&self) -> CalcResult<Vec<RecentConversion>>;

    /// Replace the stored entries.
    fn save(&mut self, entries: &[RecentConversion]) -> CalcResult<()>;

    /// Remove every stored entry.
    fn clear(&mut self) -> CalcResult<()>;

    /// Read the stored entries, apply `change`, and store the result as one
    /// step. Returns what was stored. Stores shared between handles must
    /// hold their lock across the whole read-modify-write.
    fn update<F>(&mut self, change: F) -> CalcResult<Vec<RecentConversion>>
    where
        F: FnOnce(Vec<RecentConversion>) -> Vec<RecentConversion>,
    {
        let next = change(self.load()?);
        self.save(&next)?;
        Ok(next)
    }
}

/// Session-scoped store; contents vanish with the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Vec<RecentConversion>,
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> CalcResult<Vec<RecentConversion>> {
        Ok(self.entries.clone())
    }

    fn save(&mut self, entries: &[RecentConversion]) -> CalcResult<()> {
        self.entries = entries.to_vec();
        Ok(())
    }

    fn clear(&mut self) -> CalcResult<()> {
        self.entries.clear();
        Ok(())
    }
}

/// How often a unit pair appears in the ledger
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairUsage {
    pub category: CategoryId,
    pub from_unit: String,
    pub to_unit: String,
    pub count: usize,
    pub last_used: DateTime<Utc>,
}

/// Bounded FIFO history of conversions.
#[derive(Debug)]
pub struct Ledger<S: LedgerStore = MemoryStore> {
    entries: VecDeque<RecentConversion>,
    capacity: usize,
    store: S,
}

impl Ledger<MemoryStore> {
    /// A fresh session-only ledger.
    pub fn in_memory(capacity: usize) -> CalcResult<Self> {
        Ledger::open(MemoryStore::default(), capacity)
    }
}

impl<S: LedgerStore> Ledger<S> {
    /// Open a ledger over `store`, keeping only the newest `capacity`
    /// persisted entries.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a capacity outside `1..=MAX_LEDGER_CAPACITY`, or
    /// whatever the store reports while loading.
    pub fn open(store: S, capacity: usize) -> CalcResult<Self> {
        validate_capacity(capacity)?;
        let entries = newest_in_order(store.load()?, capacity);
        Ok(Ledger {
            entries,
            capacity,
            store,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Append an entry, evicting the oldest when at capacity.
    ///
    /// Append and eviction run against the store's current contents inside
    /// [`LedgerStore::update`], so entries written by another handle on the
    /// same store are kept. The timestamp is raised to the newest existing
    /// one if the clock went backwards. The in-memory entries are replaced
    /// only after the store accepts the new snapshot, so a failed save
    /// leaves the ledger unchanged.
    pub fn record(&mut self, entry: RecentConversion) -> CalcResult<()> {
        if !entry.value.is_finite() {
            return Err(CalcError::non_finite("value", entry.value));
        }
        if !entry.result.is_finite() {
            return Err(CalcError::non_finite("result", entry.result));
        }

        let capacity = self.capacity;
        let saved = self.store.update(|stored| {
            let mut next = newest_in_order(stored, capacity);
            let mut entry = entry;
            if let Some(newest) = next.back() {
                if entry.timestamp < newest.timestamp {
                    entry.timestamp = newest.timestamp;
                }
            }
            next.push_back(entry);
            while next.len() > capacity {
                next.pop_front();
            }
            next.into()
        })?;

        self.entries = saved.into();
        Ok(())
    }

    /// Convert through the built-in catalog and record the result.
    /// Nothing is recorded when the conversion fails.
    pub fn record_conversion(
        &mut self,
        category: CategoryId,
        from_unit: &str,
        to_unit: &str,
        value: f64,
    ) -> CalcResult<f64> {
        let result = convert_by_id(value, category, from_unit, to_unit)?;
        self.record(RecentConversion::new(category, from_unit, to_unit, value, result))?;
        Ok(result)
    }

    /// Entries newest-first.
    pub fn list(&self) -> Vec<&RecentConversion> {
        self.entries.iter().rev().collect()
    }

    /// Distinct input values recently used for a pair, newest first.
    pub fn recent_values(&self, category: CategoryId, from_unit: &str, to_unit: &str, limit: usize) -> Vec<f64> {
        let mut values: Vec<f64> = Vec::new();
        for entry in self.entries.iter().rev() {
            if values.len() == limit {
                break;
            }
            if entry.is_pair(category, from_unit, to_unit) && !values.contains(&entry.value) {
                values.push(entry.value);
            }
        }
        values
    }

    /// Most-used pairs, ties broken by most recent use.
    pub fn frequent_pairs(&self, limit: usize) -> Vec<PairUsage> {
        let mut usage: HashMap<(CategoryId, &str, &str), PairUsage> = HashMap::new();
        for entry in &self.entries {
            let key = (entry.category, entry.from_unit.as_str(), entry.to_unit.as_str());
            usage
                .entry(key)
                .and_modify(|u| {
                    u.count += 1;
                    u.last_used = u.last_used.max(entry.timestamp);
                })
                .or_insert_with(|| PairUsage {
                    category: entry.category,
                    from_unit: entry.from_unit.clone(),
                    to_unit: entry.to_unit.clone(),
                    count: 1,
                    last_used: entry.timestamp,
                });
        }

        let mut pairs: Vec<PairUsage> = usage.into_values().collect();
        pairs.sort_by(|a, b| b.count.cmp(&a.count).then(b.last_used.cmp(&a.last_used)));
        pairs.truncate(limit);
        pairs
    }

    /// Drop every entry, in storage and in memory.
    pub fn clear(&mut self) -> CalcResult<()> {
        self.store.clear()?;
        self.entries.clear();
        Ok(())
    }
}

/// Keep the newest `capacity` entries and raise any timestamp that is
/// older than its predecessor's.
fn newest_in_order(entries: Vec<RecentConversion>, capacity: usize) -> VecDeque<RecentConversion> {
    let mut entries: VecDeque<RecentConversion> = entries.into();
    while entries.len() > capacity {
        entries.pop_front();
    }
    let mut newest: Option<DateTime<Utc>> = None;
    for entry in entries.iter_mut() {
        if let Some(previous) = newest {
            if entry.timestamp < previous {
                entry.timestamp = previous;
            }
        }
        newest = Some(entry.timestamp);
    }
    entries
}

pub(crate) fn validate_capacity(capacity: usize) -> CalcResult<()> {
    if capacity == 0 || capacity > MAX_LEDGER_CAPACITY {
        return Err(CalcError::invalid_input(
            "ledger.capacity",
            capacity.to_string(),
            format!("Capacity must be between 1 and {}", MAX_LEDGER_CAPACITY),
        ));
    }
    Ok(())
}
