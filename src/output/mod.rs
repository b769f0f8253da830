mod detections;
mod stats;
mod style;

pub use detections::{DetectionRow, print_detections};
pub use stats::{StatsRow, print_stats};
pub use style::{
    accent, bold, colors_enabled, configure, failure, info, muted, number, strip, success,
    warning,
};

pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        return format!("{ms}ms");
    }

    if ms % 1000 == 0 {
        return format!("{}s", ms / 1000);
    }

    format!("{:.3}s", ms as f64 / 1000.0)
}
