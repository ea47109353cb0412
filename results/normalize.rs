/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Canonicalization of heterogeneous result payloads.
//!
//! The frame reports results in two shapes: `nPerfTestCompleted` carries the result
//! fields on the envelope itself, `nPerfGetLastResult` nests them under `lastResult`.
//! Both shapes are then probed through the same ordered field paths.

use serde::Serialize;
use serde_json::{Number, Value};

use crate::sector::Sector;

type FieldPath = &'static [&'static str];

const TEST_ID_PATHS: &[FieldPath] = &[&["resultId"], &["id"], &["result", "id"]];
const DEVICE_UUID_PATHS: &[FieldPath] = &[&["device", "uuid"]];

/// Largest float magnitude below which every integral value is exact.
const MAX_EXACT_FLOAT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Raw result exactly as received, tagged by the action that produced it.
#[derive(Clone, Debug, PartialEq)]
pub enum RawResult {
    /// Fields of an `nPerfTestCompleted` envelope.
    TestCompleted(Value),
    /// The `lastResult` object of an `nPerfGetLastResult` envelope.
    LastResult(Value),
}

impl RawResult {
    pub fn payload(&self) -> &Value {
        match self {
            RawResult::TestCompleted(value) | RawResult::LastResult(value) => value,
        }
    }

    /// First present test identifier, or an empty string.
    pub fn test_id(&self) -> String {
        first_identifier(self.payload(), TEST_ID_PATHS).unwrap_or_default()
    }

    /// Device identifier reported by the frame, if any.
    pub fn device_uuid(&self) -> Option<String> {
        first_identifier(self.payload(), DEVICE_UUID_PATHS)
    }
}

/// Canonical body posted to the results collector. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    nperf_test_id: String,
    external_uuid: Option<String>,
    sector: String,
}

impl SubmissionPayload {
    pub fn new(
        nperf_test_id: impl Into<String>,
        external_uuid: Option<String>,
        sector: impl Into<String>,
    ) -> Self {
        Self {
            nperf_test_id: nperf_test_id.into(),
            external_uuid,
            sector: sector.into(),
        }
    }

    pub fn nperf_test_id(&self) -> &str {
        &self.nperf_test_id
    }

    pub fn external_uuid(&self) -> Option<&str> {
        self.external_uuid.as_deref()
    }

    pub fn sector(&self) -> &str {
        &self.sector
    }
}

/// Build the submission for `raw` under the resolved `sector`.
///
/// The device id falls back to the identifier captured from the launch parameters.
pub fn normalize(
    raw: &RawResult,
    sector: &Sector,
    fallback_uuid: Option<&str>,
) -> SubmissionPayload {
    let external_uuid = raw.device_uuid().or_else(|| {
        fallback_uuid
            .filter(|uuid| !uuid.is_empty())
            .map(str::to_string)
    });
    SubmissionPayload::new(raw.test_id(), external_uuid, sector.as_str())
}

fn first_identifier(value: &Value, paths: &[FieldPath]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| lookup(value, path).and_then(identifier_text))
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// Scalar identifiers only; empty strings, zero, `false` and `null` count as absent.
fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) if number.as_f64() != Some(0.0) => Some(number_text(number)),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Integral floats print without a fractional part, so `4242.0` reads `4242`.
fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(float)
            if number.is_f64() && float.fract() == 0.0 && float.abs() < MAX_EXACT_FLOAT_INTEGER =>
        {
            format!("{}", float as i64)
        },
        _ => number.to_string(),
    }
}
