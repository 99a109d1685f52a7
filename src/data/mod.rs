use std::{fs, path::Path};

use log::debug;

use crate::layout::Layout;
use crate::status::SheetResult;

mod convert;
/// Structs meant for data conversion
mod structs;

/// Writes the page template snapshot, the one artifact other tools read.
pub fn write(file: &Path, layout: &Layout) -> SheetResult<()> {
    let snap = structs::Snapshot::from(layout);
    fs::write(file, serde_json::to_string_pretty(&snap)?)?;
    debug!("wrote layout snapshot to {}", file.display());
    Ok(())
}
