/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Single-actor reducer tying the router, the sector flow, the pending slot and
//! the submitter together.
//!
//! Everything runs on the caller's thread. Frame messages and user actions both
//! become [`WidgetIntent`]s and are applied in order; only the submitter leaves
//! the thread, and it never reports back.

use log::{debug, info, warn};

use crate::bridge::{InboundAction, MessageEnvelope, MessageRouter, ResponsiveMode, RouterStats};
use crate::launch::LaunchParams;
use crate::results::{PendingResultSlot, RawResult, ResultSink, normalize};
use crate::sector::{
    KeyValueStore, Sector, SectorCategory, SectorPrompt, SectorPromptState, SectorStore,
};

use super::view::{FrameSpec, ProfileFooter, WidgetView};

/// State changes requested by the frame or by the user.
#[derive(Clone, Debug, PartialEq)]
pub enum WidgetIntent {
    FrameLoaded,
    FrameReady,
    FrameError { kind: Option<String> },
    TestStarted,
    /// A completion or last-result event; both take the same path.
    ResultArrived(RawResult),
    ResponsiveSwitch { mode: ResponsiveMode },
    /// The profile footer's edit affordance.
    OpenSectorPrompt,
    SelectSectorCategory { category: SectorCategory },
    SetOtherDetail { text: String },
    SubmitSectorPrompt,
    DismissSectorPrompt,
}

impl WidgetIntent {
    /// Map a routed frame action. `None` for a last-result message without a result.
    pub fn from_action(action: InboundAction) -> Option<Self> {
        let intent = match action {
            InboundAction::Loaded => WidgetIntent::FrameLoaded,
            InboundAction::Ready => WidgetIntent::FrameReady,
            InboundAction::Error { kind } => WidgetIntent::FrameError { kind },
            InboundAction::TestStarted => WidgetIntent::TestStarted,
            InboundAction::TestCompleted(data) => {
                WidgetIntent::ResultArrived(RawResult::TestCompleted(data))
            },
            InboundAction::LastResult(Some(last)) => {
                WidgetIntent::ResultArrived(RawResult::LastResult(last))
            },
            InboundAction::LastResult(None) => {
                debug!("Last-result message without a result; ignoring");
                return None;
            },
            InboundAction::ResponsiveSwitch(mode) => WidgetIntent::ResponsiveSwitch { mode },
        };
        Some(intent)
    }
}

pub struct WidgetController<V: WidgetView, S: ResultSink> {
    router: MessageRouter,
    sectors: SectorStore,
    prompt: SectorPrompt,
    pending: PendingResultSlot,
    external_uuid: Option<String>,
    frame: FrameSpec,
    view: V,
    sink: S,
}

impl<V: WidgetView, S: ResultSink> WidgetController<V, S> {
    /// Resolve the initial sector, mount the frame and render the footer.
    pub fn new(
        router: MessageRouter,
        durable: Box<dyn KeyValueStore>,
        launch: LaunchParams,
        frame: FrameSpec,
        view: V,
        sink: S,
    ) -> Self {
        let LaunchParams {
            external_uuid,
            context_sector,
        } = launch;
        let sectors = SectorStore::new(durable, context_sector);
        let mut controller = Self {
            router,
            sectors,
            prompt: SectorPrompt::new(),
            pending: PendingResultSlot::new(),
            external_uuid,
            frame,
            view,
            sink,
        };
        controller.view.mount_frame(&controller.frame);
        controller.render_footer();
        controller
    }

    pub fn current_sector(&self) -> Option<&Sector> {
        self.sectors.current_sector()
    }

    pub fn prompt_state(&self) -> &SectorPromptState {
        self.prompt.state()
    }

    pub fn is_prompting(&self) -> bool {
        self.prompt.is_prompting()
    }

    pub fn has_pending_result(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn router_stats(&self) -> RouterStats {
        self.router.stats()
    }

    pub fn frame(&self) -> &FrameSpec {
        &self.frame
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Route one inbound envelope. Untrusted or malformed envelopes change nothing.
    pub fn handle_message(&mut self, envelope: &MessageEnvelope) {
        let Some(action) = self.router.route(envelope) else {
            return;
        };
        if let Some(intent) = WidgetIntent::from_action(action) {
            self.apply_intent(intent);
        }
    }

    pub fn apply_intents<I>(&mut self, intents: I)
    where
        I: IntoIterator<Item = WidgetIntent>,
    {
        for intent in intents {
            self.apply_intent(intent);
        }
    }

    pub fn apply_intent(&mut self, intent: WidgetIntent) {
        match intent {
            WidgetIntent::FrameLoaded => info!("nPerf frame loaded"),
            WidgetIntent::FrameReady => debug!("nPerf frame ready"),
            WidgetIntent::FrameError { kind } => {
                warn!("nPerf frame error: {}", kind.as_deref().unwrap_or("unknown"));
            },
            WidgetIntent::TestStarted => debug!("nPerf test started"),
            WidgetIntent::ResultArrived(raw) => self.accept_result(raw),
            WidgetIntent::ResponsiveSwitch { mode } => {
                let height_px = FrameSpec::height_for(&mode);
                if height_px != self.frame.height_px {
                    self.frame.height_px = height_px;
                    self.view.set_frame_height(height_px);
                }
            },
            WidgetIntent::OpenSectorPrompt => self.open_prompt(),
            WidgetIntent::SelectSectorCategory { category } => {
                if let Some(visible) = self.prompt.select(category) {
                    self.view.set_other_detail_visible(visible);
                }
            },
            WidgetIntent::SetOtherDetail { text } => {
                self.prompt.set_other_detail(&text);
            },
            WidgetIntent::SubmitSectorPrompt => self.resolve_prompt(),
            WidgetIntent::DismissSectorPrompt => {
                if self.prompt.dismiss() {
                    self.view.hide_sector_prompt();
                    if !self.pending.is_empty() {
                        debug!("Sector prompt dismissed; result stays queued");
                    }
                }
            },
        }
    }

    /// Stop routing frame messages. The sink is left to its owner.
    pub fn shutdown(&mut self) {
        if !self.router.is_closed() {
            self.router.close();
            info!("nPerf widget stopped listening for frame messages");
        }
    }

    /// Hand the controller's parts back, e.g. to shut the sink down.
    pub fn into_parts(self) -> (V, S) {
        (self.view, self.sink)
    }

    fn accept_result(&mut self, raw: RawResult) {
        info!("nPerf result received");
        match self.sectors.current_sector().cloned() {
            Some(sector) => self.submit(&raw, &sector),
            None => {
                self.pending.set(raw);
                self.open_prompt();
            },
        }
    }

    fn open_prompt(&mut self) {
        if self.prompt.open() {
            let detail_visible = self
                .prompt
                .draft()
                .is_some_and(|draft| draft.other_detail_visible());
            self.view.set_other_detail_visible(detail_visible);
            self.view.show_sector_prompt();
        }
    }

    fn resolve_prompt(&mut self) {
        let sector = match self.prompt.submit() {
            Ok(sector) => sector,
            Err(e) => {
                debug!("Sector prompt submission rejected: {e}");
                if self.prompt.is_prompting() {
                    self.view.show_validation_message(e.user_message());
                }
                return;
            },
        };
        self.sectors.commit(sector.clone());
        self.render_footer();
        self.view.hide_sector_prompt();
        if let Some(raw) = self.pending.take_and_clear() {
            self.submit(&raw, &sector);
        }
    }

    fn submit(&self, raw: &RawResult, sector: &Sector) {
        let payload = normalize(raw, sector, self.external_uuid.as_deref());
        self.sink.submit(payload);
    }

    fn render_footer(&mut self) {
        let footer = ProfileFooter::for_sector(self.sectors.current_sector());
        self.view.render_profile_footer(&footer);
    }
}
