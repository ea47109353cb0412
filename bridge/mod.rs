/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Cross-document message channel between the host page and the speed-test frame.

pub mod protocol;
pub mod router;

pub use protocol::{
    ActionParseError, DEFAULT_ALLOWED_ORIGINS, InboundAction, MessageEnvelope, ResponsiveMode,
};
pub use router::{MessageRouter, RouterStats};
