use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::error::PipelineResult;
use crate::util::format_number;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> PipelineResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> PipelineResult<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

pub fn write_text(path: &Path, text: &str) -> PipelineResult<()> {
    fs::write(path, text)?;
    Ok(())
}

/// Markdown table of the first `max_rows` rows.
pub fn markdown_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", markdown_table(rows, max_rows));
}

/// Horizontal text bar chart with a log10 scale, one group of bars per
/// category and one bar per series. Only the drawn length is scaled; the
/// printed values are the stored ones.
pub fn render_log_chart(
    title: &str,
    series: &[&str],
    bars: &[(String, Vec<f64>)],
    width: usize,
) -> String {
    const MARKS: [char; 4] = ['#', '=', '+', '*'];
    let scale = |v: f64| (v.max(0.0) + 1.0).log10();
    let max = bars
        .iter()
        .flat_map(|(_, values)| values.iter().copied())
        .map(scale)
        .fold(0.0_f64, f64::max);
    let label_width = bars.iter().map(|(c, _)| c.len()).max().unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "{}", title);
    let legend: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{} {}", MARKS[i % MARKS.len()], name))
        .collect();
    let _ = writeln!(out, "(log10 scale; {})", legend.join(", "));
    let _ = writeln!(out);
    if bars.is_empty() {
        let _ = writeln!(out, "(no data)");
        return out;
    }

    for (category, values) in bars {
        for (i, v) in values.iter().enumerate() {
            let len = if max > 0.0 {
                ((scale(*v) / max) * width as f64).round() as usize
            } else {
                0
            };
            let name = if i == 0 { category.as_str() } else { "" };
            let mark = MARKS[i % MARKS.len()].to_string();
            let _ = writeln!(
                out,
                "{:<lw$} | {} {}",
                name,
                mark.repeat(len),
                format_number(*v, 0),
                lw = label_width
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NonStandardRow;

    #[test]
    fn chart_uses_log_lengths_and_raw_labels() {
        let bars = vec![
            ("TORNADO".to_string(), vec![999.0, 9.0]),
            ("HEAT".to_string(), vec![0.0, 99.0]),
        ];
        let chart = render_log_chart("Health impact", &["Fatalities", "Injuries"], &bars, 30);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], "Health impact");
        assert!(lines[1].contains("# Fatalities"));
        // log10(1000) = 3 fills the width; log10(10) = 1 is a third of it.
        assert_eq!(lines[3], format!("TORNADO | {} 999", "#".repeat(30)));
        assert_eq!(lines[4], format!("        | {} 9", "=".repeat(10)));
        assert_eq!(lines[5], "HEAT    |  0");
        assert_eq!(lines[6], format!("        | {} 99", "=".repeat(20)));
    }

    #[test]
    fn empty_chart_says_so() {
        let chart = render_log_chart("Economic impact", &["Property"], &[], 40);
        assert!(chart.ends_with("(no data)\n"));
    }

    #[test]
    fn writers_create_files() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![NonStandardRow { category: "OTHER".into(), records: 3 }];
        write_csv(&dir.path().join("r.csv"), &rows).unwrap();
        write_json(&dir.path().join("r.json"), &serde_json::json!({ "ok": true })).unwrap();
        let csv = fs::read_to_string(dir.path().join("r.csv")).unwrap();
        assert_eq!(csv, "EventType,Records\nOTHER,3\n");
        assert!(markdown_table(&rows, 5).contains("| OTHER"));
        assert_eq!(markdown_table::<NonStandardRow>(&[], 5), "(no rows)");
    }
}
