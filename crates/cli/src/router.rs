//! Command router: free text goes to the placement protocol first, and
//! only reaches the backend when nothing is pending.

use sheetpilot_grid::GridHost;
use sheetpilot_placement::{PlacementSession, Routed};
use sheetpilot_protocol::Backend;

/// Route one line of chat input. Pending placement/upload protocols
/// consume the line; otherwise it becomes a backend command whose reply
/// (with a column hint mined from the command) installs a pending result.
pub fn route(
    session: &mut PlacementSession,
    backend: &mut dyn Backend,
    host: &mut dyn GridHost,
    text: &str,
) -> String {
    match session.on_text(text, host) {
        Routed::Reply(msg) => msg,
        Routed::Forward(command) => {
            let hint = extract_column_hint(&command);
            match backend.send_command(&command) {
                Ok(reply) if reply.ok => session.on_command_reply(reply.note, reply.chart, hint),
                Ok(reply) => reply.note,
                Err(e) => format!("{}", e),
            }
        }
    }
}

fn strip_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Mine a column-name hint from command text. Two shapes are recognized:
/// `... of <name>` and `... <name> column ...`; articles are skipped.
pub fn extract_column_hint(command: &str) -> Option<String> {
    let words: Vec<&str> = command.split_whitespace().collect();

    // "<name> column"
    if let Some(pos) = words
        .iter()
        .position(|w| strip_punctuation(w).eq_ignore_ascii_case("column"))
    {
        if pos > 0 {
            let candidate = strip_punctuation(words[pos - 1]);
            if !candidate.is_empty() && !is_article(candidate) {
                return Some(candidate.to_string());
            }
        }
    }

    // "of <name>"
    if let Some(pos) = words
        .iter()
        .position(|w| strip_punctuation(w).eq_ignore_ascii_case("of"))
    {
        for word in &words[pos + 1..] {
            let candidate = strip_punctuation(word);
            if candidate.is_empty() || is_article(candidate) {
                continue;
            }
            return Some(candidate.to_string());
        }
    }

    None
}

fn is_article(word: &str) -> bool {
    matches!(word.to_lowercase().as_str(), "the" | "a" | "an" | "my")
}
