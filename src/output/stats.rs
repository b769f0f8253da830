use crate::model::OutcomeCode;
use crate::output::{accent, failure, format_duration_ms, info, number, strip, warning};
use crate::record::RunRecord;
use std::io::Write;
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct StatsRow {
    pub name: String,
    pub window_runs: usize,
    pub fail_percent: String,
    pub critical_fail_percent: String,
    pub lifetime_runs: u64,
    pub lifetime_fail_percent: String,
    pub average_duration_ms: u64,
    pub latest: Vec<OutcomeCode>,
    pub flaky: Option<String>,
    pub last_updated: Option<OffsetDateTime>,
}

impl StatsRow {
    pub fn from_record(record: &RunRecord) -> Self {
        let last_updated = match record.last_updated_ms() {
            0 => None,
            ms => OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok(),
        };

        Self {
            name: record.name().to_string(),
            window_runs: record.runs_count(),
            fail_percent: record.fail_percent_printable(),
            critical_fail_percent: record.critical_fail_percent_printable(),
            lifetime_runs: record.runs_all_hist(),
            lifetime_fail_percent: record.fail_percent_all_hist_printable(),
            average_duration_ms: record.average_duration_ms(),
            latest: record.latest_results(),
            flaky: record.flakiness_report(),
            last_updated,
        }
    }
}

pub fn print_stats(mut w: impl Write, rows: &[StatsRow]) -> std::io::Result<()> {
    if rows.is_empty() {
        writeln!(w, "{} No recorded runs yet.", info("i"))?;
        return Ok(());
    }

    for (idx, row) in rows.iter().enumerate() {
        let fail = format!("{}%", row.fail_percent);
        let headline = if row.flaky.is_some() {
            warning("~ flaky")
        } else if row.latest.last() == Some(&OutcomeCode::Ok) {
            String::new()
        } else {
            failure("x failing")
        };

        writeln!(w, "{} {}", accent(&row.name), headline)?;
        writeln!(
            w,
            "  recent: {} of {} runs failed",
            number(&fail),
            number(&row.window_runs.to_string())
        )?;
        writeln!(
            w,
            "  critical: {}",
            number(&format!("{}%", row.critical_fail_percent))
        )?;
        writeln!(
            w,
            "  all time: {} over {} runs",
            number(&format!("{}%", row.lifetime_fail_percent)),
            number(&row.lifetime_runs.to_string())
        )?;

        if row.average_duration_ms > 0 {
            writeln!(
                w,
                "  avg duration: {}",
                number(&format_duration_ms(row.average_duration_ms))
            )?;
        }

        if let Some(updated) = row.last_updated {
            let text = updated
                .format(&time::macros::format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second]"
                ))
                .unwrap_or_else(|_| "-".to_string());
            writeln!(w, "  updated (UTC): {text}")?;
        }

        if !row.latest.is_empty() {
            writeln!(w, "  latest: {}", strip(&row.latest))?;
        }

        if let Some(comment) = &row.flaky {
            writeln!(w, "  {}", warning(comment))?;
        }

        if idx + 1 < rows.len() {
            writeln!(w)?;
        }
    }

    Ok(())
}
