// Item Registry - in-memory CRUD store
//
// Identity is a sequential integer handed out by a counter that only grows,
// so an id is never reused after its item is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::{PoisonError, RwLock};

use crate::error::{MetisError, Result};

// ============================================================================
// ITEM TYPES
// ============================================================================

/// A stored item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    /// Set once by the registry on create
    pub created_at: DateTime<Utc>,
}

/// Payload for creating an item (`POST /items/`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
}

impl NewItem {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        NewItem {
            name: name.into(),
            description: None,
            price,
        }
    }

    /// Builder pattern: add optional description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update payload (`PUT /items/{id}`)
///
/// Omitted fields are left alone. `description` distinguishes "omitted"
/// (`None`) from an explicit `null` (`Some(None)`), which clears it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub price: Option<f64>,
}

fn explicit_null<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price.is_none()
    }

    /// Apply supplied fields onto `item`. `id` and `created_at` never change.
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(price) = self.price {
            item.price = price;
        }
    }
}

// ============================================================================
// ITEM REGISTRY
// ============================================================================

struct RegistryState {
    items: Vec<Item>,
    next_id: u64,
}

/// Ordered in-memory collection of items
///
/// The list and the id counter sit behind a single lock so each operation is
/// atomic with respect to the others.
pub struct ItemRegistry {
    state: RwLock<RegistryState>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        ItemRegistry {
            state: RwLock::new(RegistryState {
                items: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// All items in insertion order
    pub fn list(&self) -> Vec<Item> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.items.clone()
    }

    pub fn get(&self, id: u64) -> Result<Item> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| missing(id))
    }

    pub fn create(&self, new_item: NewItem) -> Item {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let item = Item {
            id: state.next_id,
            name: new_item.name,
            description: new_item.description,
            price: new_item.price,
            created_at: Utc::now(),
        };
        state.next_id += 1;
        state.items.push(item.clone());

        tracing::debug!(id = item.id, "item created");
        item
    }

    /// Apply a partial update in place, keeping the item's position
    pub fn update(&self, id: u64, update: ItemUpdate) -> Result<Item> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let item = state
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| missing(id))?;

        update.apply_to(item);
        Ok(item.clone())
    }

    pub fn delete(&self, id: u64) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let index = state
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| missing(id))?;

        state.items.remove(index);
        tracing::debug!(id, "item deleted");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn missing(id: u64) -> MetisError {
    tracing::warn!(id, "item not found");
    MetisError::ItemNotFound(id)
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
