/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Sector-acquisition prompt state machine.
//!
//! The prompt has no timeout: it stays in [`SectorPromptState::Prompting`] until the
//! user submits a valid choice or dismisses it. Invalid submissions keep the draft.

use std::fmt;

use super::{Sector, SectorCategory};

/// Selection being edited while the prompt is open.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectorDraft {
    selected: Option<SectorCategory>,
    other_detail: String,
}

impl SectorDraft {
    pub fn selected(&self) -> Option<SectorCategory> {
        self.selected
    }

    pub fn other_detail(&self) -> &str {
        &self.other_detail
    }

    /// Whether the free-text field is shown.
    pub fn other_detail_visible(&self) -> bool {
        self.selected.is_some_and(SectorCategory::is_catch_all)
    }

    fn validate(&self) -> Result<Sector, SectorValidationError> {
        let category = self
            .selected
            .ok_or(SectorValidationError::NoCategorySelected)?;
        if category.is_catch_all() {
            Sector::other(&self.other_detail).ok_or(SectorValidationError::MissingOtherDetail)
        } else {
            Ok(Sector::from_category(category))
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SectorPromptState {
    #[default]
    Closed,
    Prompting(SectorDraft),
    Resolved(Sector),
}

#[derive(Debug, Default)]
pub struct SectorPrompt {
    state: SectorPromptState,
    /// Draft restored on the next `open`; updated on dismiss and on submit.
    last_draft: SectorDraft,
}

impl SectorPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SectorPromptState {
        &self.state
    }

    pub fn is_prompting(&self) -> bool {
        matches!(self.state, SectorPromptState::Prompting(_))
    }

    pub fn draft(&self) -> Option<&SectorDraft> {
        match &self.state {
            SectorPromptState::Prompting(draft) => Some(draft),
            _ => None,
        }
    }

    /// Enter `Prompting` with the draft left by the previous dismiss or submit.
    /// Returns `false` if already prompting, in which case the current draft is kept.
    pub fn open(&mut self) -> bool {
        if self.is_prompting() {
            return false;
        }
        self.state = SectorPromptState::Prompting(self.last_draft.clone());
        true
    }

    /// Record the chosen category. Returns whether the free-text field should be
    /// visible, or `None` when the prompt is not open.
    pub fn select(&mut self, category: SectorCategory) -> Option<bool> {
        let SectorPromptState::Prompting(draft) = &mut self.state else {
            return None;
        };
        draft.selected = Some(category);
        Some(draft.other_detail_visible())
    }

    pub fn set_other_detail(&mut self, detail: &str) -> bool {
        let SectorPromptState::Prompting(draft) = &mut self.state else {
            return false;
        };
        draft.other_detail = detail.to_string();
        true
    }

    /// Validate the draft and move to `Resolved` on success.
    pub fn submit(&mut self) -> Result<Sector, SectorValidationError> {
        let SectorPromptState::Prompting(draft) = &self.state else {
            return Err(SectorValidationError::PromptClosed);
        };
        let sector = draft.validate()?;
        self.last_draft = draft.clone();
        self.state = SectorPromptState::Resolved(sector.clone());
        Ok(sector)
    }

    /// Close without resolving. Returns `false` if the prompt was not open.
    pub fn dismiss(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            SectorPromptState::Prompting(draft) => {
                self.last_draft = draft;
                true
            },
            other => {
                self.state = other;
                false
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectorValidationError {
    NoCategorySelected,
    MissingOtherDetail,
    PromptClosed,
}

impl SectorValidationError {
    /// Inline message shown next to the prompt.
    pub fn user_message(self) -> &'static str {
        match self {
            SectorValidationError::NoCategorySelected => "Veuillez sélectionner un secteur.",
            SectorValidationError::MissingOtherDetail => "Veuillez préciser votre secteur.",
            SectorValidationError::PromptClosed => "",
        }
    }
}

impl fmt::Display for SectorValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectorValidationError::NoCategorySelected => write!(f, "no sector category selected"),
            SectorValidationError::MissingOtherDetail => {
                write!(f, "catch-all sector selected without detail")
            },
            SectorValidationError::PromptClosed => write!(f, "sector prompt is not open"),
        }
    }
}

impl std::error::Error for SectorValidationError {}
