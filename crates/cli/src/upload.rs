//! CSV upload stand-in: turns a local file into the upload contract the
//! placement engine consumes.

use std::path::Path;

use sheetpilot_protocol::UploadReply;

/// Parse a CSV file into an `UploadReply`. The first record is the header
/// row; remaining records are header-free data rows.
pub fn read_csv_upload(path: &Path) -> Result<UploadReply, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("Could not open {}: {}", path.display(), e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("Could not read headers: {}", e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| format!("Bad CSV record: {}", e))?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    let original_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(UploadReply {
        file_id: uuid::Uuid::new_v4().to_string(),
        original_name,
        parsed_row_count: rows.len(),
        headers,
        rows,
    })
}
