//! Pet catalog.
//!
//! Every purchasable companion lives here. A [`PetId`] can only be obtained
//! by resolving a string against the catalog, so an id that reaches the
//! ledger always names a real pet.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Identifier of a pet in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PetId(String);

impl PetId {
    /// Resolve a user-supplied id (case-insensitive) against the catalog.
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        Catalog::get(raw)
            .map(|entry| PetId(entry.id.to_string()))
            .ok_or_else(|| LedgerError::UnknownItem(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The free starter pet every new profile owns.
    pub fn starter() -> Self {
        PetId(STARTER_PET.to_string())
    }

    /// Catalog entry for this id.
    pub fn entry(&self) -> Option<&'static PetEntry> {
        Catalog::get(&self.0)
    }

    /// Rebuild an id read back from storage.
    pub(crate) fn from_stored(raw: String) -> Self {
        PetId(raw)
    }
}

impl TryFrom<String> for PetId {
    type Error = LedgerError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        PetId::parse(&raw)
    }
}

impl From<PetId> for String {
    fn from(id: PetId) -> Self {
        id.0
    }
}

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PetEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: &'static str,
    pub image: &'static str,
    pub price: u64,
}

const STARTER_PET: &str = "cat";

const PETS: &[PetEntry] = &[
    PetEntry {
        id: "cat",
        name: "Cat",
        kind: "Classic",
        image: "cat_idle",
        price: 0,
    },
    PetEntry {
        id: "dog",
        name: "Dog",
        kind: "Classic",
        image: "dog_idle",
        price: 500,
    },
    PetEntry {
        id: "bird",
        name: "Bird",
        kind: "Flying",
        image: "bird_idle",
        price: 1000,
    },
    PetEntry {
        id: "fox",
        name: "Fox",
        kind: "Wild",
        image: "fox_idle",
        price: 1500,
    },
];

/// Built-in pet catalog.
pub struct Catalog;

impl Catalog {
    pub fn all() -> &'static [PetEntry] {
        PETS
    }

    pub fn get(id: &str) -> Option<&'static PetEntry> {
        PETS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }
}
