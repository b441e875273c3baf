pub mod formatter;
pub mod report;

pub use formatter::{format_score, format_zone_detail, format_zone_table, should_use_colors};
pub use report::{to_report_json, write_output, Report};
