//! Navigation stack and the context restored on back-navigation

use alloy_primitives::Address;

use super::Screen;

/// Selection that was active on the origin screen when a drill-down happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavContext {
    Block(u64),
    Transaction(String),
    History(u64),
    Account(Address),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub screen: Screen,
    pub context: Option<NavContext>,
}

/// LIFO record of origin screens.
#[derive(Debug, Default, Clone)]
pub struct NavigationStack {
    entries: Vec<NavEntry>,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, screen: Screen, context: Option<NavContext>) {
        self.entries.push(NavEntry { screen, context });
    }

    pub fn pop(&mut self) -> Option<NavEntry> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<&NavEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Origin screens from bottom to top, for breadcrumbs.
    pub fn screens(&self) -> impl Iterator<Item = Screen> + '_ {
        self.entries.iter().map(|entry| entry.screen)
    }
}
