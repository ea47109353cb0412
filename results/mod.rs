/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Result pipeline: pending slot, normalization and best-effort submission.

pub mod normalize;
pub mod pending;
pub mod submit;

pub use normalize::{RawResult, SubmissionPayload, normalize};
pub use pending::PendingResultSlot;
pub use submit::{HttpResultSink, RESULTS_PATH, ResultSink, SubmitError, results_endpoint};
