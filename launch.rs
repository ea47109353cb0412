/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Launch parameters carried by the host page URL, read once at construction.

use log::debug;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::sector::Sector;

const UUID_PARAM: &str = "uuid";
const CONTEXT_PARAM: &str = "context";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchParams {
    /// Fallback external identifier when the frame reports no device uuid.
    pub external_uuid: Option<String>,
    /// Transient sector for this session; never persisted.
    pub context_sector: Option<Sector>,
}

impl LaunchParams {
    /// Parse a raw query string (with or without the leading `?`).
    ///
    /// Only the first occurrence of each parameter counts; an empty first value
    /// means absent. `context` is percent-decoded once more after query decoding.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut uuid = None;
        let mut context = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                UUID_PARAM if uuid.is_none() => uuid = Some(value.into_owned()),
                CONTEXT_PARAM if context.is_none() => context = Some(value.into_owned()),
                _ => {},
            }
        }
        Self {
            external_uuid: uuid.filter(|uuid| !uuid.is_empty()),
            context_sector: context.and_then(|context| Sector::new(decode_context(context))),
        }
    }

    pub fn from_url(url: &Url) -> Self {
        url.query().map(Self::from_query).unwrap_or_default()
    }
}

/// Second percent-decoding pass; `+` stays literal. Keeps `value` unchanged when
/// the result is not UTF-8.
fn decode_context(value: String) -> String {
    match percent_decode_str(&value).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!("Keeping context parameter as received: {e}");
            value
        },
    }
}
