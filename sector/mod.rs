/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! User-declared sector/profile classification attached to each speed-test result.
//!
//! A [`Sector`] is a plain string on the wire. Most values come from the fixed
//! [`SectorCategory`] list; the catch-all category carries a free-text detail and
//! is committed as `"Autres: <detail>"`.

pub mod prompt;
pub mod store;

use std::fmt;

pub use prompt::{SectorDraft, SectorPrompt, SectorPromptState, SectorValidationError};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, SectorStore, StoreError};

/// Label of the catch-all category; committed values start with it.
pub const CATCH_ALL_LABEL: &str = "Autres";

/// The enumerated sector choices offered by the prompt, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectorCategory {
    CivilSociety,
    PublicAdministration,
    LocalAuthorities,
    PrivateSector,
    Health,
    Education,
    Media,
    Regulator,
    Other,
}

impl SectorCategory {
    pub const ALL: [SectorCategory; 9] = [
        SectorCategory::CivilSociety,
        SectorCategory::PublicAdministration,
        SectorCategory::LocalAuthorities,
        SectorCategory::PrivateSector,
        SectorCategory::Health,
        SectorCategory::Education,
        SectorCategory::Media,
        SectorCategory::Regulator,
        SectorCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SectorCategory::CivilSociety => "Consommateur / Société civile",
            SectorCategory::PublicAdministration => "Administration / Service public",
            SectorCategory::LocalAuthorities => "Régions / Collectivités",
            SectorCategory::PrivateSector => "Entreprise / Secteur privé",
            SectorCategory::Health => "Secteur Santé",
            SectorCategory::Education => "Secteur Education",
            SectorCategory::Media => "Presse / Médias",
            SectorCategory::Regulator => "ARTCI",
            SectorCategory::Other => CATCH_ALL_LABEL,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.label() == label)
    }

    /// Whether choosing this category requires the free-text detail field.
    pub fn is_catch_all(self) -> bool {
        matches!(self, SectorCategory::Other)
    }
}

impl fmt::Display for SectorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A resolved sector value, never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sector(String);

impl Sector {
    /// Wrap a raw value (launch parameter, stored entry). Blank input yields `None`.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return None;
        }
        Some(Self(value))
    }

    pub fn from_category(category: SectorCategory) -> Self {
        Self(category.label().to_string())
    }

    /// Catch-all value with its free-text detail. Blank detail yields `None`.
    pub fn other(detail: &str) -> Option<Self> {
        let detail = detail.trim();
        if detail.is_empty() {
            return None;
        }
        Some(Self(format!("{CATCH_ALL_LABEL}: {detail}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Catch-all values are never written to the durable store.
    pub fn is_catch_all(&self) -> bool {
        self.0.starts_with(CATCH_ALL_LABEL)
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Sector {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
