/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Wire vocabulary of the embedded frame's cross-document messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ACTION_LOADED: &str = "nPerfLoaded";
pub const ACTION_READY: &str = "nPerfReady";
pub const ACTION_ERROR: &str = "nPerfError";
pub const ACTION_TEST_STARTED: &str = "nPerfTestStarted";
pub const ACTION_TEST_COMPLETED: &str = "nPerfTestCompleted";
pub const ACTION_GET_LAST_RESULT: &str = "nPerfGetLastResult";
pub const ACTION_RESPONSIVE_SWITCH: &str = "nPerfResponsiveSwitch";

/// Origins the speed-test frame is served from.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "https://ws.nperf.com",
    "https://ws-cdn.nperf.com",
    "http://ws-nossl.nperf.com",
];

const SMART_MODE: &str = "smart";

/// One inbound message: sender origin plus the posted data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub origin: String,
    #[serde(default)]
    pub data: Value,
}

impl MessageEnvelope {
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponsiveMode {
    Smart,
    Other(String),
}

impl ResponsiveMode {
    fn from_value(mode: Option<&Value>) -> Self {
        match mode {
            Some(Value::String(mode)) if mode == SMART_MODE => ResponsiveMode::Smart,
            Some(Value::String(mode)) => ResponsiveMode::Other(mode.clone()),
            Some(Value::Null) | None => ResponsiveMode::Other(String::new()),
            Some(other) => ResponsiveMode::Other(other.to_string()),
        }
    }
}

/// Recognized frame actions with their action-specific fields.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundAction {
    Loaded,
    Ready,
    Error { kind: Option<String> },
    TestStarted,
    /// The whole message data; result fields sit next to `action`.
    TestCompleted(Value),
    LastResult(Option<Value>),
    ResponsiveSwitch(ResponsiveMode),
}

impl InboundAction {
    pub fn parse(data: &Value) -> Result<Self, ActionParseError> {
        let Value::Object(fields) = data else {
            return Err(ActionParseError::NotAnObject);
        };
        let action = match fields.get("action") {
            Some(Value::String(action)) if !action.is_empty() => action.as_str(),
            Some(Value::Null) | Some(Value::Bool(false)) | None => {
                return Err(ActionParseError::MissingAction);
            },
            Some(Value::String(_)) => return Err(ActionParseError::MissingAction),
            Some(other) => return Err(ActionParseError::Unknown(other.to_string())),
        };

        let parsed = match action {
            ACTION_LOADED => InboundAction::Loaded,
            ACTION_READY => InboundAction::Ready,
            ACTION_ERROR => InboundAction::Error {
                kind: fields.get("type").and_then(|kind| match kind {
                    Value::Null => None,
                    Value::String(kind) => Some(kind.clone()),
                    other => Some(other.to_string()),
                }),
            },
            ACTION_TEST_STARTED => InboundAction::TestStarted,
            ACTION_TEST_COMPLETED => InboundAction::TestCompleted(data.clone()),
            ACTION_GET_LAST_RESULT => InboundAction::LastResult(
                fields
                    .get("lastResult")
                    .filter(|last| !last.is_null())
                    .cloned(),
            ),
            ACTION_RESPONSIVE_SWITCH => {
                InboundAction::ResponsiveSwitch(ResponsiveMode::from_value(fields.get("mode")))
            },
            unknown => return Err(ActionParseError::Unknown(unknown.to_string())),
        };
        Ok(parsed)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            InboundAction::Loaded => ACTION_LOADED,
            InboundAction::Ready => ACTION_READY,
            InboundAction::Error { .. } => ACTION_ERROR,
            InboundAction::TestStarted => ACTION_TEST_STARTED,
            InboundAction::TestCompleted(_) => ACTION_TEST_COMPLETED,
            InboundAction::LastResult(_) => ACTION_GET_LAST_RESULT,
            InboundAction::ResponsiveSwitch(_) => ACTION_RESPONSIVE_SWITCH,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionParseError {
    NotAnObject,
    MissingAction,
    Unknown(String),
}

impl std::fmt::Display for ActionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionParseError::NotAnObject => write!(f, "message data is not an object"),
            ActionParseError::MissingAction => write!(f, "message has no action"),
            ActionParseError::Unknown(action) => write!(f, "unknown action {action}"),
        }
    }
}

impl std::error::Error for ActionParseError {}
