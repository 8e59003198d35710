//! Output formatting for CLI

use crate::{
    game::GameState,
    training::{GameStats, VerificationReport},
};

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

pub fn format_stats(stats: &GameStats) -> String {
    format!(
        "W:{} D:{} L:{} ({:.1}% wins, {:.1}% losses)",
        stats.wins,
        stats.draws,
        stats.losses,
        stats.win_rate() * 100.0,
        stats.loss_rate() * 100.0
    )
}

/// Print one line per verification opponent
pub fn print_verification(report: &VerificationReport) {
    for (kind, stats) in &report.results {
        let status = if stats.losses == 0 { "PASS" } else { "FAIL" };
        print_kv(kind.name(), &format!("{status} {}", format_stats(stats)));
    }
}

/// Print a board with row and column indices
pub fn print_board(state: &GameState) {
    let header: Vec<String> = (0..state.size()).map(|c| c.to_string()).collect();
    println!("    {}", header.join(" "));
    for (row, line) in state.to_string().lines().enumerate() {
        println!("  {row} {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(5_478), "5,478");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_stats() {
        let stats = GameStats {
            wins: 3,
            draws: 1,
            losses: 0,
        };
        assert_eq!(format_stats(&stats), "W:3 D:1 L:0 (75.0% wins, 0.0% losses)");
    }
}
