//! Static data importer for exported JSON/CSV message files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ts_domain::error::{Error, Result};
use ts_domain::message::MessageInput;

/// Import messages from a JSON array file.
pub fn import_json(path: &Path) -> Result<Vec<MessageInput>> {
    let file = File::open(path).map_err(Error::Io)?;
    let messages = serde_json::from_reader(BufReader::new(file))?;
    Ok(messages)
}

/// Import messages from a CSV file with a header row.
pub fn import_csv(path: &Path) -> Result<Vec<MessageInput>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::Other(format!("opening {}: {e}", path.display())))?;

    let mut messages = Vec::new();
    for record in reader.deserialize() {
        let message: MessageInput =
            record.map_err(|e| Error::Other(format!("parsing {}: {e}", path.display())))?;
        messages.push(message);
    }
    Ok(messages)
}

/// Import from a file, dispatching on the extension.
pub fn import_file(path: &Path) -> Result<Vec<MessageInput>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => import_json(path),
        Some("csv") => import_csv(path),
        _ => Err(Error::Config(format!(
            "unsupported import format: {}",
            path.display()
        ))),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
