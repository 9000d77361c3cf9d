//! Media command presentation: generate and strip text/json.

use crate::cell::{CellState, MediaCell};
use crate::marquee::{Direction, LoopCompositor, LoopSlot, SpeedTier};
use comfy_table::{presets, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Outcome of `generate`
#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    pub prompt: String,
    pub state: &'static str,
    pub attempts: u32,
    pub mime: Option<String>,
    pub fingerprint: Option<String>,
    pub payload_len: Option<usize>,
    pub written_to: Option<String>,
}

impl GenerateReport {
    pub fn from_cell(cell: &MediaCell) -> Self {
        let asset = match cell.state() {
            CellState::Ready(asset) => Some(asset),
            _ => None,
        };
        Self {
            prompt: cell.prompt().to_string(),
            state: cell.state().label(),
            attempts: cell.attempts(),
            mime: asset.map(|a| a.mime_hint.clone()),
            fingerprint: asset.map(|a| a.fingerprint()),
            payload_len: asset.map(|a| a.encoded_payload.len()),
            written_to: None,
        }
    }
}

/// One row of a strip report
#[derive(Debug, Clone, Serialize)]
pub struct SlotReport {
    #[serde(flatten)]
    pub slot: LoopSlot,
    pub prompt: String,
    pub state: &'static str,
    pub attempts: u32,
    pub fingerprint: Option<String>,
}

/// Outcome of `strip`
#[derive(Debug, Clone, Serialize)]
pub struct StripReport {
    pub direction: Direction,
    pub speed: SpeedTier,
    pub cycle_secs: u64,
    pub timed_out: bool,
    pub slots: Vec<SlotReport>,
}

impl StripReport {
    pub fn from_compositor(compositor: &LoopCompositor, timed_out: bool) -> Self {
        let slots = compositor
            .slots()
            .iter()
            .zip(compositor.cells())
            .map(|(slot, cell)| SlotReport {
                slot: *slot,
                prompt: cell.prompt().to_string(),
                state: cell.state().label(),
                attempts: cell.attempts(),
                fingerprint: match cell.state() {
                    CellState::Ready(asset) => Some(asset.fingerprint()),
                    _ => None,
                },
            })
            .collect();
        Self {
            direction: compositor.direction(),
            speed: compositor.speed(),
            cycle_secs: compositor.cycle_duration().as_secs(),
            timed_out,
            slots,
        }
    }

    fn count(&self, state: &str) -> usize {
        self.slots.iter().filter(|s| s.state == state).count()
    }
}

fn state_color(state: &str) -> Color {
    match state {
        "ready" => Color::Green,
        "error" => Color::Red,
        _ => Color::Yellow,
    }
}

pub fn format_generate_result_text(report: &GenerateReport) -> String {
    let mut output = format!("Prompt: {}\n", report.prompt);
    let state = match report.state {
        "ready" => report.state.green().to_string(),
        "error" => report.state.red().to_string(),
        other => other.yellow().to_string(),
    };
    output.push_str(&format!("State: {}\n", state));
    output.push_str(&format!("Attempts: {}\n", report.attempts));
    if let Some(mime) = &report.mime {
        output.push_str(&format!("MIME: {}\n", mime));
    }
    if let Some(fingerprint) = &report.fingerprint {
        output.push_str(&format!("Fingerprint: {}\n", &fingerprint[..16.min(fingerprint.len())]));
    }
    if let Some(len) = report.payload_len {
        output.push_str(&format!("Payload: {} base64 chars\n", len));
    }
    if let Some(path) = &report.written_to {
        output.push_str(&format!("Written to: {}\n", path));
    }
    output
}

pub fn format_generate_result_json(report: &GenerateReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_strip_result_text(report: &StripReport) -> String {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.set_header(vec!["Slot", "Prompt", "Copy", "State", "Attempts", "Fingerprint"]);
    for row in &report.slots {
        let fingerprint = row
            .fingerprint
            .as_deref()
            .map(|f| &f[..12.min(f.len())])
            .unwrap_or("-");
        table.add_row(vec![
            Cell::new(row.slot.index),
            Cell::new(&row.prompt),
            Cell::new(row.slot.pass + 1),
            Cell::new(row.state).fg(state_color(row.state)),
            Cell::new(row.attempts),
            Cell::new(fingerprint),
        ]);
    }

    let heading = format!(
        "Strip: {} slot(s), {:?}/{:?}, cycle {}s",
        report.slots.len(),
        report.direction,
        report.speed,
        report.cycle_secs
    );
    let mut output = format!("{}\n{}\n", heading.bold(), table);
    output.push_str(&format!(
        "\nReady: {}  Error: {}  Loading: {}\n",
        report.count("ready"),
        report.count("error"),
        report.count("loading")
    ));
    if report.timed_out {
        output.push_str("Timed out before every slot settled.\n");
    }
    output
}

pub fn format_strip_result_json(report: &StripReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}
