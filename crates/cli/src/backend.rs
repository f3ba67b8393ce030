//! Local stand-in for the remote inference backend.
//!
//! Implements the `Backend` trait against a context snapshot of the active
//! sheet, answering simple aggregate questions (`sum of Amount`) and
//! `chart ...` requests. The caller refreshes the context before each
//! command; the backend never touches the host directly.

use sheetpilot_core::CellValue;
use sheetpilot_protocol::{Backend, BackendError, ChartPayload, CommandReply};

/// 1x1 transparent PNG, used as the chart artifact.
const PLACEHOLDER_CHART: &str = "data:image/png;base64,\
iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregate {
    Sum,
    Average,
    Count,
    Max,
    Min,
}

impl Aggregate {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "sum" | "total" => Some(Aggregate::Sum),
            "average" | "avg" | "mean" => Some(Aggregate::Average),
            "count" => Some(Aggregate::Count),
            "max" | "maximum" | "largest" => Some(Aggregate::Max),
            "min" | "minimum" | "smallest" => Some(Aggregate::Min),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Aggregate::Sum => "Sum",
            Aggregate::Average => "Average",
            Aggregate::Count => "Count",
            Aggregate::Max => "Max",
            Aggregate::Min => "Min",
        }
    }
}

/// Backend stand-in computing over a snapshot of the active sheet.
#[derive(Default)]
pub struct LocalBackend {
    context: Vec<Vec<CellValue>>,
}

impl LocalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sheet snapshot the next command is answered against.
    pub fn set_context(&mut self, contents: Vec<Vec<CellValue>>) {
        self.context = contents;
    }

    fn find_column(&self, name: &str) -> Option<usize> {
        let needle = name.to_lowercase();
        let header = self.context.first()?;
        header.iter().position(|cell| {
            !cell.is_empty() && cell.to_display().to_lowercase().contains(&needle)
        })
    }

    fn column_numbers(&self, col: usize) -> Vec<f64> {
        self.context
            .iter()
            .skip(1)
            .filter_map(|row| match row.get(col) {
                Some(CellValue::Number(n)) => Some(*n),
                _ => None,
            })
            .collect()
    }

    fn answer_aggregate(&self, agg: Aggregate, column: &str) -> CommandReply {
        let col = match self.find_column(column) {
            Some(c) => c,
            None => {
                return CommandReply::failure(format!(
                    "I couldn't find a column named \"{}\".",
                    column
                ))
            }
        };
        let numbers = self.column_numbers(col);
        if numbers.is_empty() && agg != Aggregate::Count {
            return CommandReply::failure(format!(
                "Column \"{}\" has no numeric values.",
                column
            ));
        }
        let value = match agg {
            Aggregate::Sum => numbers.iter().sum(),
            Aggregate::Average => numbers.iter().sum::<f64>() / numbers.len() as f64,
            Aggregate::Count => numbers.len() as f64,
            Aggregate::Max => numbers.iter().cloned().fold(f64::MIN, f64::max),
            Aggregate::Min => numbers.iter().cloned().fold(f64::MAX, f64::min),
        };
        CommandReply::text(format!(
            "{} of {}: {}",
            agg.label(),
            column,
            CellValue::Number(value).to_display(),
        ))
    }
}

impl Backend for LocalBackend {
    fn send_command(&mut self, text: &str) -> Result<CommandReply, BackendError> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();

        if words.iter().any(|w| *w == "chart" || *w == "plot") {
            let column = crate::router::extract_column_hint(text)
                .unwrap_or_else(|| "data".to_string());
            return Ok(CommandReply {
                ok: true,
                note: format!("Chart of {}", column),
                chart: Some(ChartPayload::new(PLACEHOLDER_CHART)),
            });
        }

        let agg = words.iter().find_map(|w| Aggregate::from_word(w));
        let column = crate::router::extract_column_hint(text);
        match (agg, column) {
            (Some(agg), Some(column)) => Ok(self.answer_aggregate(agg, &column)),
            (Some(_), None) => Ok(CommandReply::failure(
                "Which column? Try \"sum of Amount\".",
            )),
            _ => Ok(CommandReply::failure(
                "I can answer sum/average/count/max/min of a column, or chart it.",
            )),
        }
    }
}
