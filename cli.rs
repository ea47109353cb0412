/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use log::{error, info, warn};
use nperf_bridge::bridge::MessageRouter;
use nperf_bridge::prefs::{
    AppPreferences, ArgumentParsingResult, WidgetConfig, parse_command_line_arguments,
};
use nperf_bridge::results::HttpResultSink;
use nperf_bridge::sector::{JsonFileStore, KeyValueStore, MemoryStore, SectorCategory};
use nperf_bridge::widget::{FrameSpec, ProfileFooter, WidgetController, WidgetIntent, WidgetView};
use nperf_bridge::{MessageEnvelope, VERSION};
use tracing_subscriber::EnvFilter;

/// Event-stream line that opens the profile editor, like the footer's edit link.
const EDIT_PROFILE_COMMAND: &str = "!profile";

pub fn main() {
    // Skip the first argument, which is the binary name.
    let args: Vec<String> = env::args().skip(1).collect();
    let preferences = match parse_command_line_arguments(&args) {
        ArgumentParsingResult::Run(preferences) => preferences,
        ArgumentParsingResult::Exit => std::process::exit(0),
        ArgumentParsingResult::ErrorParsing => std::process::exit(1),
    };

    init_tracing(preferences.log_filter.as_deref());

    if let Err(e) = run(preferences) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(preferences: AppPreferences) -> Result<(), Box<dyn std::error::Error>> {
    let AppPreferences {
        config,
        launch,
        events,
        ..
    } = preferences;

    let sink = HttpResultSink::spawn(config.results_endpoint()?, config.submit_timeout())?;
    let frame = FrameSpec::new(config.frame_url()?);
    let router = MessageRouter::new(config.allowed_origins.iter().cloned());
    let durable = open_store(&config);
    info!("nPerf widget {VERSION} loaded (API: {})", config.api_base_url);

    let mut widget = WidgetController::new(
        router,
        durable,
        launch,
        frame,
        TerminalView::default(),
        sink,
    );

    // The prompt reads from the terminal when the event stream owns stdin.
    let (stream, mut answers): (Box<dyn BufRead>, Box<dyn BufRead>) = match &events {
        Some(path) => (
            Box::new(BufReader::new(File::open(path)?)),
            Box::new(io::stdin().lock()),
        ),
        None => (Box::new(io::stdin().lock()), open_terminal()),
    };

    for (index, line) in stream.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == EDIT_PROFILE_COMMAND {
            widget.apply_intent(WidgetIntent::OpenSectorPrompt);
        } else {
            match serde_json::from_str::<MessageEnvelope>(line) {
                Ok(envelope) => widget.handle_message(&envelope),
                Err(e) => warn!("Skipping line {}: {e}", index + 1),
            }
        }
        if widget.is_prompting() {
            ask_sector(&mut widget, answers.as_mut())?;
        }
    }

    widget.shutdown();
    let stats = widget.router_stats();
    info!(
        "Messages: {} accepted, {} untrusted, {} malformed, {} unknown",
        stats.accepted, stats.dropped_untrusted, stats.dropped_malformed, stats.ignored_unknown
    );
    let (_, sink) = widget.into_parts();
    sink.shutdown();
    Ok(())
}

fn open_store(config: &WidgetConfig) -> Box<dyn KeyValueStore> {
    match config.resolved_storage_path().and_then(JsonFileStore::open) {
        Ok(store) => {
            info!("Sector store at {}", store.path().display());
            Box::new(store)
        },
        Err(e) => {
            warn!("Sector store unavailable, keeping the sector in memory: {e}");
            Box::new(MemoryStore::new())
        },
    }
}

fn open_terminal() -> Box<dyn BufRead> {
    match File::open("/dev/tty") {
        Ok(tty) => Box::new(BufReader::new(tty)),
        Err(e) => {
            warn!("No terminal for the sector prompt: {e}");
            Box::new(io::empty())
        },
    }
}

/// Drive the open prompt from `answers` until it resolves or is dismissed.
/// An empty line or end of input dismisses it.
fn ask_sector(
    widget: &mut WidgetController<TerminalView, HttpResultSink>,
    answers: &mut dyn BufRead,
) -> io::Result<()> {
    while widget.is_prompting() {
        for (number, category) in SectorCategory::ALL.iter().enumerate() {
            println!("  {}. {category}", number + 1);
        }
        let Some(choice) = read_answer(answers, "Votre secteur (1-9, vide pour fermer) : ")?
        else {
            widget.apply_intent(WidgetIntent::DismissSectorPrompt);
            break;
        };
        let category = choice
            .parse::<usize>()
            .ok()
            .and_then(|number| number.checked_sub(1))
            .and_then(|index| SectorCategory::ALL.get(index).copied());
        let Some(category) = category else {
            println!("Choix invalide : {choice}");
            continue;
        };
        widget.apply_intent(WidgetIntent::SelectSectorCategory { category });
        if category.is_catch_all() {
            let detail = read_answer(answers, "Précisez : ")?.unwrap_or_default();
            widget.apply_intent(WidgetIntent::SetOtherDetail { text: detail });
        }
        widget.apply_intent(WidgetIntent::SubmitSectorPrompt);
    }
    Ok(())
}

fn read_answer(answers: &mut dyn BufRead, question: &str) -> io::Result<Option<String>> {
    print!("{question}");
    io::stdout().flush()?;
    let mut line = String::new();
    if answers.read_line(&mut line)? == 0 {
        println!();
        return Ok(None);
    }
    let line = line.trim();
    Ok((!line.is_empty()).then(|| line.to_string()))
}

/// Prints widget state changes to stdout.
#[derive(Default)]
struct TerminalView;

impl WidgetView for TerminalView {
    fn mount_frame(&mut self, frame: &FrameSpec) {
        println!(
            "[frame] {} ({}px high, max {}px wide)",
            frame.url, frame.height_px, frame.max_width_px
        );
    }

    fn set_frame_height(&mut self, height_px: u32) {
        println!("[frame] height {height_px}px");
    }

    fn render_profile_footer(&mut self, footer: &ProfileFooter) {
        println!("[profil] Secteur : {} ({})", footer.sector_label, footer.edit_title);
    }

    fn show_sector_prompt(&mut self) {
        println!("[profil] Quel est votre secteur ?");
    }

    fn hide_sector_prompt(&mut self) {}

    fn set_other_detail_visible(&mut self, _visible: bool) {}

    fn show_validation_message(&mut self, message: &str) {
        println!("[profil] {message}");
    }
}
