/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use log::debug;

use super::RawResult;

/// Single-capacity holder for a result waiting on sector resolution.
///
/// Last write wins. Not synchronized: callers own it from one logical actor.
#[derive(Debug, Default)]
pub struct PendingResultSlot {
    slot: Option<RawResult>,
}

impl PendingResultSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `result`, silently replacing any earlier pending one.
    pub fn set(&mut self, result: RawResult) {
        if let Some(dropped) = self.slot.replace(result) {
            debug!(
                "Pending result superseded before sector resolution (dropped test id {:?})",
                dropped.test_id()
            );
        }
    }

    pub fn take_and_clear(&mut self) -> Option<RawResult> {
        self.slot.take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
