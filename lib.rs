/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Host-side bridge for an embedded nPerf speed-test frame.
//!
//! Frame messages pass an origin check in [`bridge`], results are tagged with the
//! user's [`sector`] (asking for one when it is unknown) and forwarded to the
//! results collector by [`results`]. [`widget::WidgetController`] owns the
//! whole flow.

#![forbid(unsafe_code)]

pub mod bridge;
pub mod launch;
pub mod prefs;
pub mod results;
pub mod sector;
pub mod widget;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use bridge::{MessageEnvelope, MessageRouter};
pub use launch::LaunchParams;
pub use results::{HttpResultSink, ResultSink, SubmissionPayload};
pub use sector::{Sector, SectorCategory};
pub use widget::{WidgetController, WidgetIntent, WidgetView};
