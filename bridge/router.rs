/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Origin-checked entry point for inbound frame messages.
//!
//! Pure routing: foreign, malformed and unknown messages are dropped with a log
//! line and a counter bump, never surfaced to the caller.

use log::debug;

use super::protocol::{ActionParseError, DEFAULT_ALLOWED_ORIGINS, InboundAction, MessageEnvelope};

/// Counters for messages seen by the router.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub accepted: u64,
    pub dropped_untrusted: u64,
    pub dropped_malformed: u64,
    pub ignored_unknown: u64,
    pub dropped_closed: u64,
}

#[derive(Debug)]
pub struct MessageRouter {
    allowed_origins: Vec<String>,
    closed: bool,
    stats: RouterStats,
}

impl MessageRouter {
    pub fn new<I, S>(allowed_origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: allowed_origins.into_iter().map(Into::into).collect(),
            closed: false,
            stats: RouterStats::default(),
        }
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stop routing; every later message is dropped.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Validate `envelope` and return the action to dispatch, if any.
    pub fn route(&mut self, envelope: &MessageEnvelope) -> Option<InboundAction> {
        if self.closed {
            self.stats.dropped_closed += 1;
            return None;
        }
        if !self.is_origin_allowed(&envelope.origin) {
            self.stats.dropped_untrusted += 1;
            debug!("Dropped message from untrusted origin {}", envelope.origin);
            return None;
        }
        match InboundAction::parse(&envelope.data) {
            Ok(action) => {
                self.stats.accepted += 1;
                debug!("Received action {}", action.tag());
                Some(action)
            },
            Err(ActionParseError::Unknown(action)) => {
                self.stats.ignored_unknown += 1;
                debug!("Ignored unknown action {action}");
                None
            },
            Err(e) => {
                self.stats.dropped_malformed += 1;
                debug!("Dropped malformed message from {}: {e}", envelope.origin);
                None
            },
        }
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_ORIGINS)
    }
}
