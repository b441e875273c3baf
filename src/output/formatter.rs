use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::scoring::{CandidateZone, ScoreCategory};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a 0-100 score with one decimal, dropping a trailing ".0"
pub fn format_score(score: f64) -> String {
    let formatted = format!("{:.1}", score);
    match formatted.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => formatted,
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn category_cell(zone: &CandidateZone, category: ScoreCategory, label: char) -> String {
    match zone.scores.get(&category) {
        Some(score) => format!("{}{:>3.0}", label, score),
        None => format!("{}  -", label),
    }
}

/// Format ranked zones as a table, one line per zone.
/// Columns: rank, total score, center, per-category scores (D/C/M), first insight.
/// Insight text is truncated to the terminal width; pipes get it in full.
pub fn format_zone_table(zones: &[CandidateZone], use_colors: bool) -> String {
    format_zone_table_with_width(zones, use_colors, get_terminal_width())
}

fn format_zone_table_with_width(
    zones: &[CandidateZone],
    use_colors: bool,
    term_width: Option<usize>,
) -> String {
    if zones.is_empty() {
        return "No candidate zones found.".to_string();
    }

    let score_width = 5;
    let separator = "  ";

    zones
        .iter()
        .map(|zone| {
            let rank_str = format!("{:>2}.", zone.rank);
            let score_str = format!("{:>width$}", format_score(zone.total_score), width = score_width);
            let center_str = format!("{:>9.4},{:<10.4}", zone.center.lat, zone.center.lng);
            let categories = [
                category_cell(zone, ScoreCategory::Demographics, 'D'),
                category_cell(zone, ScoreCategory::Competition, 'C'),
                category_cell(zone, ScoreCategory::MarketSignals, 'M'),
            ]
            .join(" ");

            let insight = zone.insights.first().map(String::as_str).unwrap_or("");
            let fixed_width = rank_str.len()
                + 1
                + score_width
                + center_str.len()
                + categories.len()
                + separator.len() * 3;
            let insight = match term_width {
                Some(width) if width > fixed_width + 10 => truncate_text(insight, width - fixed_width),
                // Very narrow terminal
                Some(_) => truncate_text(insight, 20),
                None => insight.to_string(),
            };

            if use_colors {
                let score_colored = if zone.total_score >= 70.0 {
                    score_str.green().bold().to_string()
                } else if zone.total_score >= 50.0 {
                    score_str.yellow().bold().to_string()
                } else {
                    score_str.red().bold().to_string()
                };
                format!(
                    "{} {}{}{}{}{}{}{}",
                    rank_str.dimmed(),
                    score_colored,
                    separator,
                    center_str.cyan(),
                    separator,
                    categories,
                    separator,
                    insight.dimmed()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    rank_str, score_str, separator, center_str, separator, categories, separator, insight
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Multi-line zone output with every insight (for verbose mode)
pub fn format_zone_detail(zone: &CandidateZone, use_colors: bool) -> String {
    let header = format!(
        "#{} {} (score {}, radius {} mi)",
        zone.rank,
        zone.id,
        format_score(zone.total_score),
        format_score(zone.radius_miles)
    );
    let header = if use_colors {
        header.bold().to_string()
    } else {
        header
    };

    let mut lines = vec![header];
    for (category, score) in &zone.scores {
        lines.push(format!("  {:?}: {}", category, format_score(*score)));
    }
    for insight in &zone.insights {
        lines.push(format!("  - {}", insight));
    }
    lines.join("\n")
}
