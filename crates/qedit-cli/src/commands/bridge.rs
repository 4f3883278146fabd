//! Host messaging over stdio
//!
//! Each stdin line is one host message; each reply is written as one stdout
//! line. Logs stay on stderr.

use qedit_core::{EditorMessage, EditorSession, QeditError, Result};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

pub async fn bridge_command(config_path: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path, None)?;
    let mut session = EditorSession::new(config)?;
    emit(&session.start())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut handled = 0usize;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(bytes = line.len(), "Host message received");
        emit(&session.handle_json(line))?;
        handled += 1;
    }

    info!(handled, "Host closed the bridge");
    Ok(())
}

fn emit(message: &EditorMessage) -> Result<()> {
    let line = serde_json::to_string(message)
        .map_err(|e| QeditError::message_error(format!("Failed to encode reply: {e}")))?;
    println!("{line}");
    Ok(())
}
