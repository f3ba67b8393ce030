// SheetPilot CLI - conversational placement REPL, headless
//
// Natural-language commands are answered by a backend (a local stand-in
// here) and the reply is walked through the placement protocol: the result
// is never written over existing data without the typed confirmation.

mod backend;
mod exit_codes;
mod router;
mod upload;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use sheetpilot_config::Settings;
use sheetpilot_core::{col_to_letters, CellValue};
use sheetpilot_grid::{GridHost, MemoryWorkbook};
use sheetpilot_placement::{PlacementSession, ResultAction, UploadAction};

use backend::LocalBackend;
use exit_codes::{EXIT_ERROR, EXIT_IO_ERROR, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "spilot")]
#[command(about = "Conversational spreadsheet assistant (headless placement engine)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat REPL against an in-memory workbook
    #[command(after_help = "\
Examples:
  spilot repl --load sales.csv
  > sum of Amount
  > /place
  > /quit")]
    Repl {
        /// Seed the active sheet from a CSV file
        #[arg(long)]
        load: Option<PathBuf>,
    },

    /// Replay newline-separated REPL input from a file
    #[command(after_help = "\
Examples:
  spilot script demo.txt --load sales.csv")]
    Script {
        /// File with one REPL line per line
        file: PathBuf,

        /// Seed the active sheet from a CSV file
        #[arg(long)]
        load: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Some(Commands::Repl { load }) => run_repl(load),
        Some(Commands::Script { file, load }) => run_script(&file, load),
        None => run_repl(None),
    };
    match result {
        Ok(code) => ExitCode::from(code),
        Err((code, message)) => {
            eprintln!("error: {}", message);
            ExitCode::from(code)
        }
    }
}

fn run_repl(load: Option<PathBuf>) -> Result<u8, (u8, String)> {
    let mut app = App::new(load).map_err(|e| (EXIT_IO_ERROR, e))?;
    println!("SheetPilot. Type a command, /help for commands, /quit to exit.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| (EXIT_ERROR, e.to_string()))?;
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => return Err((EXIT_ERROR, e.to_string())),
        }
        match app.handle_line(line.trim()) {
            LineOutcome::Output(text) => {
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
            LineOutcome::Quit => break,
        }
    }
    Ok(EXIT_SUCCESS)
}

fn run_script(file: &Path, load: Option<PathBuf>) -> Result<u8, (u8, String)> {
    let contents = std::fs::read_to_string(file)
        .map_err(|e| (EXIT_IO_ERROR, format!("Could not read {}: {}", file.display(), e)))?;
    let mut app = App::new(load).map_err(|e| (EXIT_IO_ERROR, e))?;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        println!("> {}", line);
        match app.handle_line(line) {
            LineOutcome::Output(text) => {
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
            LineOutcome::Quit => break,
        }
    }
    Ok(EXIT_SUCCESS)
}

enum LineOutcome {
    Output(String),
    Quit,
}

struct App {
    wb: MemoryWorkbook,
    session: PlacementSession,
    backend: LocalBackend,
}

impl App {
    fn new(load: Option<PathBuf>) -> Result<Self, String> {
        let mut wb = MemoryWorkbook::new();
        if let Some(path) = load {
            seed_from_csv(&mut wb, &path)?;
        }
        let settings = Settings::load();
        Ok(Self {
            wb,
            session: PlacementSession::new(settings.placement),
            backend: LocalBackend::new(),
        })
    }

    fn handle_line(&mut self, line: &str) -> LineOutcome {
        if line.is_empty() {
            return LineOutcome::Output(String::new());
        }
        if let Some(command) = line.strip_prefix('/') {
            return self.handle_slash(command);
        }
        // Free text: the router decides whether the placement protocol
        // consumes it or the backend answers it.
        self.refresh_backend_context();
        let reply = router::route(&mut self.session, &mut self.backend, &mut self.wb, line);
        LineOutcome::Output(reply)
    }

    fn handle_slash(&mut self, command: &str) -> LineOutcome {
        let mut parts = command.splitn(2, ' ');
        let verb = parts.next().unwrap_or("");
        let arg = parts.next().map(str::trim).unwrap_or("");
        let output = match verb {
            "quit" | "exit" => return LineOutcome::Quit,
            "help" => help_text(),
            "place" => self.session.on_result_action(ResultAction::Place, &mut self.wb),
            "cell" => self.session.on_result_action(ResultAction::PlaceInCell, &mut self.wb),
            "results" => self
                .session
                .on_result_action(ResultAction::PlaceOnResultsSheet, &mut self.wb),
            "results-new" => self
                .session
                .on_result_action(ResultAction::PlaceOnNewResultsSheet, &mut self.wb),
            "discard" => self.session.on_result_action(ResultAction::Discard, &mut self.wb),
            "sheet-new" => self.session.on_upload_action(UploadAction::NewSheet, &mut self.wb),
            "merge" => self.session.on_upload_action(UploadAction::ActiveSheet, &mut self.wb),
            "merge-right" => self
                .session
                .on_upload_action(UploadAction::HorizontalAppend, &mut self.wb),
            "cancel-upload" => self.session.on_upload_action(UploadAction::Cancel, &mut self.wb),
            "upload" => {
                if arg.is_empty() {
                    "Usage: /upload <file.csv>".to_string()
                } else {
                    match upload::read_csv_upload(Path::new(arg)) {
                        Ok(reply) => self.session.on_upload(reply),
                        Err(e) => e,
                    }
                }
            }
            "sheets" => match self.wb.list_sheet_names() {
                Ok(names) => names.join("\n"),
                Err(e) => format!("{}", e),
            },
            "show" => self.render_sheet(arg),
            other => format!("Unknown command /{}. Try /help.", other),
        };
        LineOutcome::Output(output)
    }

    fn refresh_backend_context(&mut self) {
        let active = self.wb.active_sheet();
        let contents = self
            .wb
            .read_used_region(active)
            .map(|data| data.values)
            .unwrap_or_default();
        self.backend.set_context(contents);
    }

    fn render_sheet(&self, name: &str) -> String {
        let sheet = if name.is_empty() {
            self.wb.active_sheet()
        } else {
            match self.wb.sheet_index(name) {
                Some(idx) => idx,
                None => return format!("No such sheet: {}", name),
            }
        };
        let data = match self.wb.read_used_region(sheet) {
            Ok(data) => data,
            Err(e) => return format!("{}", e),
        };
        if data.is_empty() {
            return "(empty sheet)".to_string();
        }

        let mut widths = vec![0usize; data.col_count];
        let cells: Vec<Vec<String>> = data
            .values
            .iter()
            .map(|row| row.iter().map(CellValue::to_display).collect())
            .collect();
        for row in &cells {
            for (c, text) in row.iter().enumerate() {
                widths[c] = widths[c].max(text.len()).max(2);
            }
        }

        let mut out = String::new();
        out.push_str("    ");
        for (c, width) in widths.iter().enumerate() {
            out.push_str(&format!("{:<width$}  ", col_to_letters(c), width = width));
        }
        for (r, row) in cells.iter().enumerate() {
            out.push('\n');
            out.push_str(&format!("{:>3} ", r + 1));
            for (c, text) in row.iter().enumerate() {
                out.push_str(&format!("{:<width$}  ", text, width = widths[c]));
            }
        }
        out
    }
}

fn seed_from_csv(wb: &mut MemoryWorkbook, path: &Path) -> Result<(), String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("Could not open {}: {}", path.display(), e))?;
    let sheet = wb.active_sheet();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| format!("Bad CSV record: {}", e))?;
        for (col, field) in record.iter().enumerate() {
            wb.set_cell(sheet, row, col, CellValue::from_input(field));
        }
    }
    Ok(())
}

fn help_text() -> String {
    "\
Commands: type any question (e.g. \"sum of Amount\", \"chart of Total\").
Pending result:   /place  /cell  /results  /results-new  /discard
Pending upload:   /sheet-new  /merge  /merge-right  /cancel-upload
Workbook:         /upload <file.csv>  /sheets  /show [sheet]
Session:          /help  /quit"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with_data() -> App {
        let mut app = App::new(None).unwrap();
        app.wb.set_cell(0, 0, 0, CellValue::text("Name"));
        app.wb.set_cell(0, 0, 1, CellValue::text("Amount"));
        app.wb.set_cell(0, 1, 0, CellValue::text("a"));
        app.wb.set_cell(0, 1, 1, CellValue::Number(10.0));
        app.wb.set_cell(0, 2, 0, CellValue::text("b"));
        app.wb.set_cell(0, 2, 1, CellValue::Number(32.5));
        app
    }

    fn output(app: &mut App, line: &str) -> String {
        match app.handle_line(line) {
            LineOutcome::Output(text) => text,
            LineOutcome::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_command_then_place_flow() {
        let mut app = app_with_data();
        let reply = output(&mut app, "sum of Amount");
        assert!(reply.contains("Sum of Amount: 42.5"), "got: {}", reply);

        let reply = output(&mut app, "/place");
        assert!(reply.contains("B5"), "got: {}", reply);
        assert_eq!(app.wb.cell(0, 4, 1), CellValue::Number(42.5));
    }

    #[test]
    fn test_free_text_blocked_while_pending() {
        let mut app = app_with_data();
        output(&mut app, "sum of Amount");
        let reply = output(&mut app, "count of Amount");
        assert!(reply.contains("Finish placing"), "got: {}", reply);
        output(&mut app, "/discard");
        let reply = output(&mut app, "count of Amount");
        assert!(reply.contains("Count of Amount: 2"), "got: {}", reply);
    }

    #[test]
    fn test_results_sheet_flow() {
        let mut app = app_with_data();
        output(&mut app, "sum of Amount");
        let reply = output(&mut app, "/results");
        assert!(reply.contains("AI_Results_1"), "got: {}", reply);
        let sheet = app.wb.sheet_index("AI_Results_1").unwrap();
        assert_eq!(
            app.wb.cell(sheet, 0, 0),
            CellValue::text("Sum of Amount: 42.5")
        );
    }

    #[test]
    fn test_specific_cell_flow_with_overwrite() {
        let mut app = app_with_data();
        output(&mut app, "sum of Amount");
        output(&mut app, "/cell");
        let reply = output(&mut app, "B2");
        assert!(reply.contains("already has data"), "got: {}", reply);
        let reply = output(&mut app, "no thanks");
        assert!(reply.contains("overwrite"), "got: {}", reply);
        output(&mut app, "overwrite B2");
        assert_eq!(app.wb.cell(0, 1, 1), CellValue::Number(42.5));
    }

    #[test]
    fn test_unknown_slash_command() {
        let mut app = app_with_data();
        let reply = output(&mut app, "/frobnicate");
        assert!(reply.contains("Unknown command"), "got: {}", reply);
    }

    #[test]
    fn test_show_renders_grid() {
        let mut app = app_with_data();
        let reply = output(&mut app, "/show");
        assert!(reply.contains("Amount"));
        assert!(reply.contains("32.5"));
    }
}
