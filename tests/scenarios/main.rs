/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! End-to-end widget flows driven through the public API.

use std::cell::RefCell;
use std::rc::Rc;

use nperf_bridge::bridge::DEFAULT_ALLOWED_ORIGINS;
use nperf_bridge::sector::store::SECTOR_STORAGE_KEY;
use nperf_bridge::sector::{JsonFileStore, KeyValueStore, MemoryStore};
use nperf_bridge::widget::{FrameSpec, ProfileFooter};
use nperf_bridge::{
    LaunchParams, MessageEnvelope, MessageRouter, ResultSink, SectorCategory, SubmissionPayload,
    WidgetController, WidgetIntent, WidgetView,
};
use serde_json::{Value, json};
use tempfile::TempDir;

#[derive(Default)]
struct FooterView {
    footers: Vec<String>,
    prompts_shown: usize,
    messages: Vec<String>,
}

impl WidgetView for FooterView {
    fn mount_frame(&mut self, _frame: &FrameSpec) {}
    fn set_frame_height(&mut self, _height_px: u32) {}
    fn render_profile_footer(&mut self, footer: &ProfileFooter) {
        self.footers.push(footer.sector_label.clone());
    }
    fn show_sector_prompt(&mut self) {
        self.prompts_shown += 1;
    }
    fn hide_sector_prompt(&mut self) {}
    fn set_other_detail_visible(&mut self, _visible: bool) {}
    fn show_validation_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Collects submissions; clones share the list so the test keeps a handle.
#[derive(Clone, Default)]
struct CollectingSink(Rc<RefCell<Vec<SubmissionPayload>>>);

impl CollectingSink {
    fn bodies(&self) -> Vec<Value> {
        self.0
            .borrow()
            .iter()
            .map(|payload| serde_json::to_value(payload).unwrap())
            .collect()
    }
}

impl ResultSink for CollectingSink {
    fn submit(&self, payload: SubmissionPayload) {
        self.0.borrow_mut().push(payload);
    }
}

type Widget = WidgetController<FooterView, CollectingSink>;

fn widget(store: impl KeyValueStore + 'static, launch: LaunchParams) -> (Widget, CollectingSink) {
    let sink = CollectingSink::default();
    let frame = FrameSpec::new(url::Url::parse("https://ws.nperf.com/partner/frame?l=x").unwrap());
    let widget = WidgetController::new(
        MessageRouter::default(),
        Box::new(store),
        launch,
        frame,
        FooterView::default(),
        sink.clone(),
    );
    (widget, sink)
}

fn from_frame(data: Value) -> MessageEnvelope {
    MessageEnvelope::new(DEFAULT_ALLOWED_ORIGINS[0], data)
}

fn choose(category: SectorCategory) -> Vec<WidgetIntent> {
    vec![
        WidgetIntent::SelectSectorCategory { category },
        WidgetIntent::SubmitSectorPrompt,
    ]
}

#[test]
fn launch_context_submits_without_prompting() {
    let store = MemoryStore::new();
    let launch = LaunchParams::from_query("?context=ARTCI");
    let (mut widget, sink) = widget(store.clone(), launch);

    widget.handle_message(&from_frame(json!({
        "action": "nPerfTestCompleted",
        "resultId": "t1",
        "device": { "uuid": "d1" },
    })));

    assert_eq!(
        sink.bodies(),
        vec![json!({ "nperf_test_id": "t1", "external_uuid": "d1", "sector": "ARTCI" })]
    );
    assert_eq!(widget.view().prompts_shown, 0);
    assert!(store.snapshot().is_empty());
}

#[test]
fn pre_encoded_launch_context_is_sent_decoded() {
    let launch = LaunchParams::from_url(
        &url::Url::parse("https://host.test/ci-perf?context=Secteur%2520Sant%25C3%25A9&uuid=u-1")
            .unwrap(),
    );
    let (mut widget, sink) = widget(MemoryStore::new(), launch);

    widget.handle_message(&from_frame(json!({ "action": "nPerfTestCompleted", "resultId": "t0" })));

    assert_eq!(
        sink.bodies(),
        vec![json!({ "nperf_test_id": "t0", "external_uuid": "u-1", "sector": "Secteur Santé" })]
    );
}

#[test]
fn catch_all_answer_uses_launch_uuid_and_is_not_persisted() {
    let store = MemoryStore::with_entry(SECTOR_STORAGE_KEY, "");
    let launch = LaunchParams::from_query("uuid=u-9");
    let (mut widget, sink) = widget(store.clone(), launch);

    widget.handle_message(&from_frame(json!({ "action": "nPerfTestCompleted", "id": "t2" })));
    assert!(widget.is_prompting());

    widget.apply_intents([
        WidgetIntent::SelectSectorCategory {
            category: SectorCategory::Other,
        },
        WidgetIntent::SetOtherDetail {
            text: "Freelance".to_string(),
        },
        WidgetIntent::SubmitSectorPrompt,
    ]);

    assert_eq!(
        sink.bodies(),
        vec![json!({ "nperf_test_id": "t2", "external_uuid": "u-9", "sector": "Autres: Freelance" })]
    );
    assert_eq!(store.snapshot().get(SECTOR_STORAGE_KEY), None);
    assert_eq!(
        widget.current_sector().map(|s| s.as_str()),
        Some("Autres: Freelance")
    );
}

#[test]
fn missing_identifiers_serialize_as_empty_and_null() {
    let (mut widget, sink) = widget(MemoryStore::new(), LaunchParams::default());

    widget.handle_message(&from_frame(json!({ "action": "nPerfTestCompleted" })));
    widget.apply_intents(choose(SectorCategory::CivilSociety));

    assert_eq!(
        sink.bodies(),
        vec![json!({
            "nperf_test_id": "",
            "external_uuid": null,
            "sector": "Consommateur / Société civile",
        })]
    );
}

#[test]
fn only_latest_of_two_queued_results_is_sent() {
    let (mut widget, sink) = widget(MemoryStore::new(), LaunchParams::default());

    widget.handle_message(&from_frame(json!({ "action": "nPerfTestCompleted", "resultId": "t3" })));
    widget.handle_message(&from_frame(json!({
        "action": "nPerfGetLastResult",
        "lastResult": { "result": { "id": "t4" } },
    })));
    assert_eq!(widget.view().prompts_shown, 1);

    widget.apply_intents(choose(SectorCategory::Health));

    let bodies = sink.bodies();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["nperf_test_id"], "t4");
}

#[test]
fn foreign_origin_changes_nothing() {
    let store = MemoryStore::new();
    let (mut widget, sink) = widget(store.clone(), LaunchParams::default());

    widget.handle_message(&MessageEnvelope::new(
        "https://evil.example",
        json!({ "action": "nPerfTestCompleted", "resultId": "t5" }),
    ));

    assert!(!widget.is_prompting());
    assert!(!widget.has_pending_result());
    assert!(sink.bodies().is_empty());
    assert!(store.snapshot().is_empty());
    assert_eq!(widget.router_stats().dropped_untrusted, 1);
}

#[test]
fn dismissed_prompt_keeps_result_for_next_answer() {
    let (mut widget, sink) = widget(MemoryStore::new(), LaunchParams::default());

    widget.handle_message(&from_frame(json!({ "action": "nPerfTestCompleted", "resultId": "t6" })));
    widget.apply_intent(WidgetIntent::DismissSectorPrompt);
    assert!(sink.bodies().is_empty());
    assert!(widget.current_sector().is_none());

    widget.handle_message(&from_frame(json!({ "action": "nPerfTestCompleted", "resultId": "t7" })));
    assert_eq!(widget.view().prompts_shown, 2);
    widget.apply_intents(choose(SectorCategory::Education));

    let bodies = sink.bodies();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["nperf_test_id"], "t7");
}

#[test]
fn editing_profile_without_result_only_commits() {
    let store = MemoryStore::with_entry(SECTOR_STORAGE_KEY, "ARTCI");
    let (mut widget, sink) = widget(store.clone(), LaunchParams::default());

    widget.apply_intent(WidgetIntent::OpenSectorPrompt);
    widget.apply_intents(choose(SectorCategory::Media));

    assert!(sink.bodies().is_empty());
    assert_eq!(
        store.snapshot().get(SECTOR_STORAGE_KEY).map(String::as_str),
        Some("Presse / Médias")
    );
    assert_eq!(
        widget.view().footers,
        vec!["ARTCI".to_string(), "Presse / Médias".to_string()]
    );
}

#[test]
fn persisted_sector_skips_prompt_next_session() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");

    {
        let store = JsonFileStore::open(path.clone()).unwrap();
        let (mut widget, _sink) = widget(store, LaunchParams::default());
        widget.handle_message(&from_frame(json!({ "action": "nPerfTestCompleted", "resultId": "a" })));
        widget.apply_intents(choose(SectorCategory::PrivateSector));
    }

    let store = JsonFileStore::open(path).unwrap();
    let (mut widget, sink) = widget(store, LaunchParams::default());
    widget.handle_message(&from_frame(json!({ "action": "nPerfTestCompleted", "resultId": "b" })));

    assert_eq!(widget.view().prompts_shown, 0);
    assert_eq!(
        sink.bodies(),
        vec![json!({ "nperf_test_id": "b", "external_uuid": null, "sector": "Entreprise / Secteur privé" })]
    );
}

#[test]
fn empty_submission_shows_inline_message() {
    let (mut widget, sink) = widget(MemoryStore::new(), LaunchParams::default());
    widget.handle_message(&from_frame(json!({ "action": "nPerfTestCompleted", "resultId": "t8" })));

    widget.apply_intent(WidgetIntent::SubmitSectorPrompt);

    assert_eq!(widget.view().messages, vec!["Veuillez sélectionner un secteur."]);
    assert!(widget.is_prompting());
    assert!(sink.bodies().is_empty());
}
