//! Player inventory model.
//!
//! # Invariants
//! - Item names are non-empty; quantities are unsigned.
//! - `character_cards` maps a character id to its collected card count.

use crate::model::account::{AccountId, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Starter items granted to a new account.
pub const STARTER_ITEMS: &[(&str, u32)] = &[("wood", 10), ("stone", 5), ("diamond", 1)];

/// Starter home decorations as `(emoji, name)` pairs.
pub const STARTER_DECORATIONS: &[(&str, &str)] = &[
    ("\u{1F3C6}", "Trophy"),
    ("\u{2B50}", "Star"),
    ("\u{1F3A8}", "Painting"),
];

/// One decoration placed in the player's home.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    pub emoji: String,
    pub name: String,
}

impl Decoration {
    pub fn new(emoji: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            emoji: emoji.into(),
            name: name.into(),
        }
    }
}

/// Inventory owned one-to-one by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub account_id: AccountId,
    pub items: BTreeMap<String, u32>,
    pub home_decorations: Vec<Decoration>,
    pub character_cards: BTreeMap<String, u32>,
    pub unlocked_characters: Vec<String>,
}

impl Inventory {
    /// Empty inventory with no items, decorations or characters.
    pub fn empty(account_id: AccountId) -> Self {
        Self {
            account_id,
            items: BTreeMap::new(),
            home_decorations: Vec::new(),
            character_cards: BTreeMap::new(),
            unlocked_characters: Vec::new(),
        }
    }

    /// Fresh-account inventory with the starter items and decorations.
    pub fn starter(account_id: AccountId) -> Self {
        let mut inventory = Self::empty(account_id);
        inventory.items = STARTER_ITEMS
            .iter()
            .map(|(name, quantity)| ((*name).to_string(), *quantity))
            .collect();
        inventory.home_decorations = STARTER_DECORATIONS
            .iter()
            .map(|(emoji, name)| Decoration::new(*emoji, *name))
            .collect();
        inventory
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.items.keys().any(|name| name.trim().is_empty()) {
            return Err(ModelValidationError::EmptyItemName);
        }
        Ok(())
    }
}
