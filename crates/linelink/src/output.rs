use std::io::{IsTerminal, Write};
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table as TextTable};
use linelink_table::{Table, WireTable};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput {
    kind: &'static str,
    peer: String,
    size: usize,
    payload: String,
    timestamp: String,
}

/// Cells use the wire text (`"1e0"`, `"NaN"`, `"-inf"`), which JSON numbers
/// cannot carry without loss.
#[derive(Serialize)]
struct TableOutput {
    kind: &'static str,
    peer: String,
    rows: usize,
    columns: usize,
    data: Vec<Vec<String>>,
    timestamp: String,
}

impl TableOutput {
    fn new(table: &Table, peer: SocketAddr) -> Self {
        Self {
            kind: "table",
            peer: peer.to_string(),
            rows: table.row_count(),
            columns: table.column_count(),
            data: WireTable::from(table).data,
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_message(payload: &[u8], peer: SocketAddr, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                kind: "message",
                peer: peer.to_string(),
                size: payload.len(),
                payload: payload_preview(payload),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = TextTable::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PEER", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    peer.to_string(),
                    payload.len().to_string(),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "peer={} size={} payload={:?}",
                peer,
                payload.len(),
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => {
            print_raw(payload);
        }
    }
}

pub fn print_table(table: &Table, peer: SocketAddr, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = TableOutput::new(table, peer);
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            println!("{}", render_table(table));
        }
        OutputFormat::Pretty => {
            println!(
                "peer={} rows={} columns={}",
                peer,
                table.row_count(),
                table.column_count()
            );
            for row in table.rows() {
                let cells: Vec<String> = row.iter().map(f64::to_string).collect();
                println!("  [{}]", cells.join(", "));
            }
        }
        OutputFormat::Raw => match linelink_table::serialize(table) {
            Ok(payload) => print_raw(&payload),
            Err(err) => tracing::warn!(error = %err, "failed to encode table"),
        },
    }
}

fn render_table(table: &Table) -> TextTable {
    let mut text = TextTable::new();
    text.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header((0..table.column_count()).map(|c| format!("COL {c}")));
    for row in table.rows() {
        text.add_row(row.iter().map(f64::to_string));
    }
    text
}

/// Write a payload followed by a newline.
pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_preview_marks_binary() {
        assert_eq!(payload_preview(b"ping"), "ping");
        assert_eq!(payload_preview(&[0xff, 0xfe]), "<binary 2 bytes>");
    }

    #[test]
    fn json_table_keeps_non_finite_cells() {
        let table = Table::new(vec![vec![8.0, f64::NAN], vec![f64::INFINITY, -f64::INFINITY]])
            .unwrap();
        let peer: SocketAddr = "127.0.0.1:10000".parse().unwrap();

        let value = serde_json::to_value(TableOutput::new(&table, peer)).unwrap();
        assert_eq!(value["kind"], "table");
        assert_eq!(value["peer"], "127.0.0.1:10000");
        assert_eq!(
            value["data"],
            serde_json::json!([["8e0", "NaN"], ["inf", "-inf"]])
        );
    }

    #[test]
    fn rendered_table_has_one_header_per_column() {
        let table = Table::new(vec![vec![1.0, 2.5], vec![3.0, -4.0]]).unwrap();
        let rendered = render_table(&table).to_string();
        assert!(rendered.contains("COL 0"));
        assert!(rendered.contains("COL 1"));
        assert!(rendered.contains("2.5"));
        assert!(rendered.contains("-4"));
    }
}
