/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The embedded speed-test widget: controller plus the view boundary it drives.

pub mod controller;
pub mod view;

pub use controller::{WidgetController, WidgetIntent};
pub use view::{FrameSpec, ProfileFooter, WidgetView};
