//! Placement state machine.
//!
//! `PlacementSession` owns the one pending result awaiting a placement
//! decision and the one pending upload awaiting a merge decision, and
//! walks each through its protocol: propose, detect collision, confirm or
//! deny, commit. The protocol phase is an explicit sum type threaded
//! through every entry point — there is no ambient flag state.
//!
//! Failure policy: a host failure mid-commit becomes a message and clears
//! the pending slot. Losing one placement opportunity beats wedging the
//! protocol; the user can re-run the command.

use sheetpilot_config::PlacementSettings;
use sheetpilot_core::{CellAddress, Region};
use sheetpilot_grid::{GridHost, ImagePlacement};
use sheetpilot_protocol::{ChartPayload, UploadReply};

use crate::error::PlacementError;
use crate::image;
use crate::resolver;
use crate::write::{self, Destination, WriteOutcome};

/// One backend-produced artifact awaiting a placement decision.
#[derive(Debug, Clone)]
pub struct PendingResult {
    /// Result text; may embed a leading numeric token
    pub note: String,
    /// Chart image, when the backend produced one
    pub chart: Option<ChartPayload>,
    /// Column-name hint extracted from the triggering command
    pub suggested_column: Option<String>,
}

impl PendingResult {
    pub fn is_chart(&self) -> bool {
        self.chart.is_some()
    }
}

/// One uploaded table awaiting a merge decision.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub file_id: String,
    pub file_name: String,
    pub headers: Vec<String>,
    /// Header-free data rows
    pub rows: Vec<Vec<String>>,
}

impl From<UploadReply> for PendingUpload {
    fn from(reply: UploadReply) -> Self {
        Self {
            file_id: reply.file_id,
            file_name: reply.original_name,
            headers: reply.headers,
            rows: reply.rows,
        }
    }
}

/// Placement protocol phase.
#[derive(Debug, Clone)]
pub enum SessionState {
    Idle,
    /// Result pending, no prompt outstanding
    AwaitingAction(PendingResult),
    /// The next text input is a cell address
    AwaitingCell(PendingResult),
    /// The next text input is the overwrite confirmation for this address
    AwaitingOverwrite(PendingResult, CellAddress),
}

/// The five user-selectable placement actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultAction {
    /// Suggested column when hinted, A1 otherwise; charts self-place
    Place,
    /// Prompt for a specific cell address
    PlaceInCell,
    /// Append to the current results sheet
    PlaceOnResultsSheet,
    /// Mint a fresh results sheet and place there
    PlaceOnNewResultsSheet,
    /// Discard without writing
    Discard,
}

/// The four single-shot upload merge actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadAction {
    /// New sheet named from the sanitized filename
    NewSheet,
    /// Write to the active sheet if empty, else append below
    ActiveSheet,
    /// Append to the right of existing columns, never below
    HorizontalAppend,
    /// Discard the upload
    Cancel,
}

/// Router verdict for a line of user text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Consumed by the placement protocol; show this message
    Reply(String),
    /// Session idle: send this text to the backend as a new command
    Forward(String),
}

pub struct PlacementSession {
    state: SessionState,
    upload: Option<PendingUpload>,
    settings: PlacementSettings,
    /// Image anchoring mode, probed once per host
    chart_mode: Option<ImagePlacement>,
}

impl PlacementSession {
    pub fn new(settings: PlacementSettings) -> Self {
        Self {
            state: SessionState::Idle,
            upload: None,
            settings,
            chart_mode: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SessionState::Idle)
    }

    pub fn pending_upload(&self) -> Option<&PendingUpload> {
        self.upload.as_ref()
    }

    // ---- protocol entry points ----

    /// A backend reply arrived. Installs the pending result and returns the
    /// prompt to show; rejected when a result is already pending.
    pub fn on_command_reply(
        &mut self,
        note: impl Into<String>,
        chart: Option<ChartPayload>,
        suggested_column: Option<String>,
    ) -> String {
        if !self.is_idle() {
            return "A result is already awaiting placement. Finish that one first."
                .to_string();
        }
        let pending = PendingResult {
            note: note.into(),
            chart,
            suggested_column,
        };
        let menu = if pending.is_chart() {
            "Place the chart, place on a results sheet, or don't place?"
        } else {
            "Place it, place in a cell, place on a results sheet, or don't place?"
        };
        let prompt = format!("{}\n{}", pending.note, menu);
        self.state = SessionState::AwaitingAction(pending);
        prompt
    }

    /// An upload finished parsing. Same single-slot rule as results.
    pub fn on_upload(&mut self, reply: UploadReply) -> String {
        if self.upload.is_some() {
            return "An upload is already awaiting a merge decision.".to_string();
        }
        let upload = PendingUpload::from(reply);
        let prompt = format!(
            "Parsed {} ({} columns, {} rows). New sheet, active sheet, append right, or cancel?",
            upload.file_name,
            upload.headers.len(),
            upload.rows.len(),
        );
        self.upload = Some(upload);
        prompt
    }

    /// One of the five placement actions, chosen by the user.
    pub fn on_result_action(&mut self, action: ResultAction, host: &mut dyn GridHost) -> String {
        let pending = match self.take_pending() {
            Some(p) => p,
            None => return "Nothing is awaiting placement.".to_string(),
        };
        match action {
            ResultAction::Discard => "Result discarded. Nothing was written.".to_string(),
            ResultAction::Place => self.place_auto(pending, host),
            ResultAction::PlaceInCell => {
                self.state = SessionState::AwaitingCell(pending);
                "Which cell? Type an address like B4.".to_string()
            }
            ResultAction::PlaceOnResultsSheet => {
                self.place_on_results_sheet(pending, host, false)
            }
            ResultAction::PlaceOnNewResultsSheet => {
                self.place_on_results_sheet(pending, host, true)
            }
        }
    }

    /// One of the four upload actions. Single shot: the slot is cleared no
    /// matter which branch runs.
    pub fn on_upload_action(&mut self, action: UploadAction, host: &mut dyn GridHost) -> String {
        let upload = match self.upload.take() {
            Some(u) => u,
            None => return "No upload is awaiting a decision.".to_string(),
        };
        match action {
            UploadAction::Cancel => "Upload discarded. Nothing was written.".to_string(),
            UploadAction::NewSheet => match self.merge_into_new_sheet(&upload, host) {
                Ok(name) => format!("Created sheet {} with {} rows.", name, upload.rows.len()),
                Err(e) => format!("Could not create the sheet: {}", e),
            },
            UploadAction::ActiveSheet => match self.merge_into_active_sheet(&upload, host) {
                Ok(msg) => msg,
                Err(e) => format!("Could not write the upload: {}", e),
            },
            UploadAction::HorizontalAppend => match self.merge_right(&upload, host) {
                Ok(addr) => format!("Appended {} columns starting at {}.", upload.headers.len(), addr),
                Err(e) => format!("Could not append the upload: {}", e),
            },
        }
    }

    /// Raw text from the chat box. Dispatch priority: overwrite
    /// confirmation, then cell address entry, then the pending-result
    /// guard, then forward to the backend.
    pub fn on_text(&mut self, input: &str, host: &mut dyn GridHost) -> Routed {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::AwaitingOverwrite(pending, addr) => {
                if overwrite_phrase_matches(input, addr) {
                    Routed::Reply(self.commit(pending, addr, true, host))
                } else {
                    let prompt = overwrite_prompt(addr);
                    self.state = SessionState::AwaitingOverwrite(pending, addr);
                    Routed::Reply(prompt)
                }
            }
            SessionState::AwaitingCell(pending) => match CellAddress::parse_a1(input) {
                None => {
                    self.state = SessionState::AwaitingCell(pending);
                    Routed::Reply(
                        "That doesn't look like a cell address. Try something like B4."
                            .to_string(),
                    )
                }
                Some(addr) => Routed::Reply(self.place_in_cell(pending, addr, host)),
            },
            SessionState::AwaitingAction(pending) => {
                self.state = SessionState::AwaitingAction(pending);
                Routed::Reply(
                    "Finish placing the current result first (or choose don't place)."
                        .to_string(),
                )
            }
            SessionState::Idle => Routed::Forward(input.to_string()),
        }
    }

    // ---- transitions ----

    /// Transition 1 and 2: auto placement. Charts self-place on the active
    /// sheet and never consult the resolver. Non-charts follow the column
    /// hint when present, A1 unconditionally when not.
    fn place_auto(&mut self, pending: PendingResult, host: &mut dyn GridHost) -> String {
        if pending.is_chart() {
            return match self.insert_pending_chart(&pending, host.active_sheet(), host) {
                Ok(()) => "Chart placed on the active sheet.".to_string(),
                Err(e) => format!("Could not place the chart: {}", e),
            };
        }

        let sheet = host.active_sheet();
        let hint = match pending.suggested_column.clone() {
            Some(h) => h,
            None => {
                // No hint: A1, no occupancy check.
                let dest = Destination {
                    sheet,
                    origin: CellAddress::new(0, 0),
                    overwrite: true,
                };
                let value = resolver::extract_cell_value(&pending.note);
                return match write::write_single_value(host, dest, value) {
                    Ok(_) => "Placed in cell A1.".to_string(),
                    Err(e) => format!("Could not write the result: {}", e),
                };
            }
        };

        let contents = match host.read_used_region(sheet) {
            Ok(data) => data.values,
            Err(e) => return format!("Could not read the sheet: {}", e),
        };
        match resolver::find_column_cell(&hint, &contents) {
            None => format!("Could not find a column matching \"{}\".", hint),
            Some(hit) if hit.occupied => {
                let prompt = overwrite_prompt(hit.addr);
                self.state = SessionState::AwaitingOverwrite(pending, hit.addr);
                prompt
            }
            Some(hit) => self.commit(pending, hit.addr, false, host),
        }
    }

    /// Transition 3, second half: a valid address was typed.
    fn place_in_cell(
        &mut self,
        pending: PendingResult,
        addr: CellAddress,
        host: &mut dyn GridHost,
    ) -> String {
        let sheet = host.active_sheet();
        let occupied = match host.read_region(sheet, Region::cell(addr)) {
            Ok(data) => data
                .values
                .first()
                .and_then(|row| row.first())
                .map(|v| !v.is_empty())
                .unwrap_or(false),
            Err(e) => return format!("Could not read the sheet: {}", e),
        };
        if occupied {
            let prompt = overwrite_prompt(addr);
            self.state = SessionState::AwaitingOverwrite(pending, addr);
            return prompt;
        }
        self.commit(pending, addr, false, host)
    }

    /// Transition 4: results sheets are append-only; no occupancy checks.
    fn place_on_results_sheet(
        &mut self,
        pending: PendingResult,
        host: &mut dyn GridHost,
        force_new: bool,
    ) -> String {
        let names = match host.list_sheet_names() {
            Ok(names) => names,
            Err(e) => return format!("Could not list sheets: {}", e),
        };
        let name = if force_new {
            resolver::next_results_sheet_name(&names)
        } else {
            resolver::last_results_sheet(&names)
                .unwrap_or_else(|| resolver::next_results_sheet_name(&names))
        };
        let sheet = match host.sheet_index(&name) {
            Some(idx) => idx,
            None => match host.create_sheet(&name) {
                Ok(idx) => idx,
                Err(e) => return format!("Could not create {}: {}", name, e),
            },
        };
        if pending.is_chart() {
            return match self.insert_pending_chart(&pending, sheet, host) {
                Ok(()) => format!("Chart placed on {}.", name),
                Err(e) => format!("Could not place the chart: {}", e),
            };
        }
        let text = resolver::clean_note_text(&pending.note);
        match write::append_result_note(host, sheet, &text) {
            Ok(addr) => format!("Appended to {} at {}.", name, addr),
            Err(e) => format!("Could not append the result: {}", e),
        }
    }

    /// The deferred or immediate single-target commit. Charts insert as
    /// images; notes write their extracted value.
    fn commit(
        &mut self,
        pending: PendingResult,
        addr: CellAddress,
        overwrite: bool,
        host: &mut dyn GridHost,
    ) -> String {
        let sheet = host.active_sheet();
        if pending.is_chart() {
            return match self.insert_pending_chart(&pending, sheet, host) {
                Ok(()) => "Chart placed on the active sheet.".to_string(),
                Err(e) => format!("Could not place the chart: {}", e),
            };
        }
        let value = resolver::extract_cell_value(&pending.note);
        let dest = Destination { sheet, origin: addr, overwrite };
        match write::write_single_value(host, dest, value) {
            Ok(WriteOutcome::Written) => format!("Placed in cell {}.", addr),
            Ok(WriteOutcome::Collision) => {
                // Cell filled since the proposal; re-enter confirmation.
                let prompt = overwrite_prompt(addr);
                self.state = SessionState::AwaitingOverwrite(pending, addr);
                prompt
            }
            Err(e) => format!("Could not write the result: {}", e),
        }
    }

    fn insert_pending_chart(
        &mut self,
        pending: &PendingResult,
        sheet: usize,
        host: &mut dyn GridHost,
    ) -> Result<(), PlacementError> {
        let chart = match &pending.chart {
            Some(c) => c,
            None => return Ok(()),
        };
        let mode = self.resolve_chart_mode(host);
        image::insert_chart(host, sheet, chart, mode, &self.settings)?;
        Ok(())
    }

    fn resolve_chart_mode(&mut self, host: &dyn GridHost) -> ImagePlacement {
        if let Some(mode) = self.chart_mode {
            return mode;
        }
        let mode = image::resolve_placement_mode(host);
        self.chart_mode = Some(mode);
        mode
    }

    fn take_pending(&mut self) -> Option<PendingResult> {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Idle => None,
            SessionState::AwaitingAction(p)
            | SessionState::AwaitingCell(p)
            | SessionState::AwaitingOverwrite(p, _) => Some(p),
        }
    }

    // ---- upload merges ----

    fn merge_into_new_sheet(
        &mut self,
        upload: &PendingUpload,
        host: &mut dyn GridHost,
    ) -> Result<String, PlacementError> {
        let names = host.list_sheet_names()?;
        let name = unique_sheet_name(&sanitize_sheet_name(&upload.file_name), &names);
        let sheet = host.create_sheet(&name)?;
        write::write_table(host, sheet, CellAddress::new(0, 0), &upload.headers, &upload.rows)?;
        Ok(name)
    }

    fn merge_into_active_sheet(
        &mut self,
        upload: &PendingUpload,
        host: &mut dyn GridHost,
    ) -> Result<String, PlacementError> {
        let sheet = host.active_sheet();
        let contents = host.read_used_region(sheet)?;
        if resolver::empty_sheet_guard(&contents.values) {
            write::write_table(host, sheet, CellAddress::new(0, 0), &upload.headers, &upload.rows)?;
            return Ok(format!("Wrote {} rows to the active sheet.", upload.rows.len()));
        }
        let dest = resolver::vertical_append_destination(&contents.values);
        let origin = CellAddress::new(dest.header_row, 0);
        write::write_table(host, sheet, origin, &upload.headers, &upload.rows)?;
        Ok(format!(
            "Appended {} rows below the existing data (headers at row {}).",
            upload.rows.len(),
            dest.header_row + 1,
        ))
    }

    fn merge_right(
        &mut self,
        upload: &PendingUpload,
        host: &mut dyn GridHost,
    ) -> Result<CellAddress, PlacementError> {
        let sheet = host.active_sheet();
        let contents = host.read_used_region(sheet)?;
        let origin = resolver::horizontal_append_destination(&contents.values);
        write::write_table(host, sheet, origin, &upload.headers, &upload.rows)?;
        Ok(origin)
    }
}

fn overwrite_prompt(addr: CellAddress) -> String {
    format!(
        "Cell {} already has data. Type \"overwrite\" or \"overwrite {}\" to replace it.",
        addr, addr,
    )
}

/// Exactly `overwrite`, or `overwrite <addr>` where the address matches
/// the one pending confirmation. Case-insensitive; anything else fails.
fn overwrite_phrase_matches(input: &str, pending: CellAddress) -> bool {
    let text = input.trim();
    if text.eq_ignore_ascii_case("overwrite") {
        return true;
    }
    let lower = text.to_lowercase();
    if let Some(rest) = lower.strip_prefix("overwrite ") {
        if let Some(addr) = CellAddress::parse_a1(rest.trim()) {
            return addr == pending;
        }
    }
    false
}

/// Sheet name from an upload filename: extension dropped, every run of
/// non-alphanumeric characters collapsed to a single underscore.
fn sanitize_sheet_name(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    let mut name = String::with_capacity(stem.len());
    let mut last_was_sep = false;
    for c in stem.chars() {
        if c.is_alphanumeric() {
            name.push(c);
            last_was_sep = false;
        } else if !last_was_sep && !name.is_empty() {
            name.push('_');
            last_was_sep = true;
        }
    }
    let name = name.trim_end_matches('_').to_string();
    if name.is_empty() {
        "Upload".to_string()
    } else {
        name
    }
}

/// Disambiguate against existing sheet names: `data`, `data_1`, `data_2`.
fn unique_sheet_name(base: &str, existing: &[String]) -> String {
    if !existing.iter().any(|n| n == base) {
        return base.to_string();
    }
    let mut suffix = 1;
    loop {
        let candidate = format!("{}_{}", base, suffix);
        if !existing.iter().any(|n| n == &candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
