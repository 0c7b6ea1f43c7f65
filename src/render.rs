//! Text, JSON, and Markdown rendering of result tables.

use coevo_core::OutputFormat;
use coevo_history::table::ResultTable;
use serde_json::{json, Value};

/// Render `tables` in `format`. Output ends with a newline.
pub fn render(tables: &[ResultTable], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(text(tables)),
        OutputFormat::Markdown => Ok(markdown(tables)),
        OutputFormat::Json => json_output(tables),
    }
}

fn text(tables: &[ResultTable]) -> String {
    let mut out = String::new();
    for (i, table) in tables.iter().enumerate() {
        if tables.len() > 1 {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("== {} ==\n", table.analysis));
        }
        if table.is_empty() {
            out.push_str("(no rows)\n");
            continue;
        }

        let cells: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        let widths: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .map(|(col, name)| {
                cells
                    .iter()
                    .map(|row| row.get(col).map_or(0, |c| c.chars().count()))
                    .fold(name.chars().count(), usize::max)
            })
            .collect();

        push_text_row(&mut out, table.columns.iter().map(String::as_str), &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_text_row(&mut out, rule.iter().map(String::as_str), &widths);
        for row in &cells {
            push_text_row(&mut out, row.iter().map(String::as_str), &widths);
        }
    }
    out
}

fn push_text_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn markdown(tables: &[ResultTable]) -> String {
    let mut out = String::new();
    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("## {}\n\n", table.analysis));
        if table.is_empty() {
            out.push_str("No rows.\n");
            continue;
        }
        out.push_str(&format!("| {} |\n", table.columns.join(" | ")));
        let rule: Vec<&str> = table.columns.iter().map(|_| "---").collect();
        out.push_str(&format!("| {} |\n", rule.join(" | ")));
        for row in &table.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| cell.to_string().replace('|', "\\|"))
                .collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
    }
    out
}

fn json_output(tables: &[ResultTable]) -> Result<String, serde_json::Error> {
    let values: Vec<Value> = tables
        .iter()
        .map(|table| {
            json!({
                "analysis": table.analysis,
                "columns": table.columns,
                "rows": table.records(),
            })
        })
        .collect();
    let value = match <[Value; 1]>::try_from(values) {
        Ok([single]) => single,
        Err(many) => Value::Array(many),
    };
    let mut out = serde_json::to_string_pretty(&value)?;
    out.push('\n');
    Ok(out)
}
