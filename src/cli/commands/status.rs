//! Status command implementation.

use crate::cli::commands::Workspace;
use crate::error::Result;
use crate::sync::{JsonOffsetStore, get_sync_status, print_status};

/// Execute the status command.
///
/// Reads local state only; no token or network access is needed.
///
/// # Errors
///
/// Returns an error if the offset file is corrupt or the output directory
/// cannot be read.
pub fn execute(ws: &Workspace, json: bool) -> Result<()> {
    let store = JsonOffsetStore::new(&ws.offset_file);
    let status = get_sync_status(&store, &ws.output_dir, ws.extension())?;

    if json {
        let output = serde_json::json!({
            "config": ws.config.path.display().to_string(),
            "config_found": ws.config.found,
            "databases": ws.config.config.databases_id,
            "output_dir": ws.output_dir.display().to_string(),
            "offset_file": ws.offset_file.display().to_string(),
            "status": status,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    print_status(&status);
    println!();
    println!("Config:      {}", ws.config.path.display());
    println!("Databases:   {}", ws.config.config.databases_id.len());
    println!("Output dir:  {}", ws.output_dir.display());
    println!("Offset file: {}", ws.offset_file.display());
    Ok(())
}
