use crate::model::RunIdentity;
use crate::output::{accent, bold, info, muted, number};
use std::io::Write;

#[derive(Debug, Clone)]
pub struct DetectionRow {
    pub entity: String,
    pub template: String,
    pub at: RunIdentity,
}

pub fn print_detections(mut w: impl Write, rows: &[DetectionRow]) -> std::io::Result<()> {
    if rows.is_empty() {
        writeln!(w, "{} {}", info("i"), muted("No template matches found."))?;
        return Ok(());
    }

    for row in rows {
        writeln!(
            w,
            "{} {} at build {} (item {})",
            bold(&row.template),
            accent(&row.entity),
            number(&row.at.container_id.to_string()),
            number(&row.at.item_id.to_string())
        )?;
    }

    Ok(())
}
