//! Pinned Command List
//!
//! Ordered, unique list of favorite command identifiers. Order controls
//! display order in the command bar. The replication machinery lives in
//! the application layer; this type only enforces the list invariants.

/// Default pinned commands used when the durable store has no prior value.
pub const DEFAULT_PINNED: [&str; 2] = ["sc", "dt"];

/// Ordered set of pinned command ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedList {
    ids: Vec<String>,
}

impl PinnedList {
    /// Create the fixed default list.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            ids: DEFAULT_PINNED.iter().map(ToString::to_string).collect(),
        }
    }

    /// Build from stored ids, dropping duplicates while preserving the
    /// first occurrence of each.
    #[must_use]
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self { ids: Vec::new() };
        for id in ids {
            let id = id.into();
            if !list.is_pinned(&id) {
                list.ids.push(id);
            }
        }
        list
    }

    /// Check whether a command is pinned.
    #[must_use]
    pub fn is_pinned(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// Add the command if absent, remove it if present.
    ///
    /// Returns `true` when the command is pinned after the call.
    pub fn toggle(&mut self, id: &str) -> bool {
        if let Some(pos) = self.ids.iter().position(|existing| existing == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    /// Move the command at `from` to position `to`.
    ///
    /// Out-of-bounds indices leave the list untouched and return `false`.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.ids.len() || to >= self.ids.len() {
            return false;
        }
        let id = self.ids.remove(from);
        self.ids.insert(to, id);
        true
    }

    /// Replace the whole list with an externally-replicated value.
    pub fn replace<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self = Self::from_ids(ids);
    }

    /// Pinned ids in display order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of pinned commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check whether nothing is pinned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for PinnedList {
    fn default() -> Self {
        Self::with_defaults()
    }
}
