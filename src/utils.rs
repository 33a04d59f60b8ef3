use colored::Colorize;

use crate::chain::{Asset, Symbol};

/// Format a currency amount with color
pub fn format_asset(amount: i64, symbol: &Symbol) -> String {
    Asset::new(amount, symbol.clone()).to_string().yellow().to_string()
}

/// Format a byte count with a readable unit
pub fn format_bytes(bytes: i64) -> String {
    const KIB: f64 = 1024.0;
    let value = bytes as f64;
    if bytes.unsigned_abs() < 1024 {
        format!("{} B", bytes)
    } else if value.abs() < KIB * KIB {
        format!("{:.2} KiB", value / KIB)
    } else {
        format!("{:.2} MiB", value / (KIB * KIB))
    }
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Prompt user for yes/no confirmation
pub fn confirm_action(prompt: &str) -> std::io::Result<bool> {
    use std::io::{self, Write};

    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (i, col) in columns.iter().enumerate() {
        if i < widths.len() {
            row.push_str(&format!("{:<width$}  ", col, width = widths[i]));
        }
    }
    println!("{}", row.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(3010), "2.94 KiB");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MiB");
        assert_eq!(format_bytes(-512), "-512 B");
        assert!(format_bytes(i64::MIN).ends_with("MiB"));
    }
}
