/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Presentation boundary: the shell that owns the frame element, the profile
//! footer and the sector prompt chrome.

use url::Url;

use crate::bridge::ResponsiveMode;
use crate::sector::Sector;

pub const FRAME_HEIGHT_SMART_PX: u32 = 500;
pub const FRAME_HEIGHT_COMPACT_PX: u32 = 400;
pub const FRAME_MAX_WIDTH_PX: u32 = 600;

const UNKNOWN_SECTOR_LABEL: &str = "Non défini";
const EDIT_PROFILE_TITLE: &str = "Modifier le profil";
const DEFINE_PROFILE_TITLE: &str = "Définir le profil";

/// Embedded speed-test frame as the shell should mount it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSpec {
    pub url: Url,
    pub height_px: u32,
    pub max_width_px: u32,
}

impl FrameSpec {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            height_px: FRAME_HEIGHT_SMART_PX,
            max_width_px: FRAME_MAX_WIDTH_PX,
        }
    }

    pub fn height_for(mode: &ResponsiveMode) -> u32 {
        match mode {
            ResponsiveMode::Smart => FRAME_HEIGHT_SMART_PX,
            ResponsiveMode::Other(_) => FRAME_HEIGHT_COMPACT_PX,
        }
    }
}

/// Footer line showing the current sector and its edit affordance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileFooter {
    pub sector_label: String,
    pub edit_title: &'static str,
}

impl ProfileFooter {
    pub fn for_sector(sector: Option<&Sector>) -> Self {
        match sector {
            Some(sector) => Self {
                sector_label: sector.to_string(),
                edit_title: EDIT_PROFILE_TITLE,
            },
            None => Self {
                sector_label: UNKNOWN_SECTOR_LABEL.to_string(),
                edit_title: DEFINE_PROFILE_TITLE,
            },
        }
    }
}

/// Calls the controller makes into the widget shell.
///
/// The shell reports user actions back as
/// [`WidgetIntent`](crate::widget::WidgetIntent)s.
pub trait WidgetView {
    fn mount_frame(&mut self, frame: &FrameSpec);
    fn set_frame_height(&mut self, height_px: u32);
    fn render_profile_footer(&mut self, footer: &ProfileFooter);
    fn show_sector_prompt(&mut self);
    fn hide_sector_prompt(&mut self);
    fn set_other_detail_visible(&mut self, visible: bool);
    fn show_validation_message(&mut self, message: &str);
}
