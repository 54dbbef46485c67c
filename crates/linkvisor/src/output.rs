use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use linkvisor_engine::LinkStats;
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
struct PayloadOutput<'a> {
    event: &'static str,
    link: &'a str,
    payload_size: usize,
    payload: String,
    timestamp: String,
}

/// Print one received payload.
pub fn print_payload(payload: &[u8], link: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PayloadOutput {
                event: "payload",
                link,
                payload_size: payload.len(),
                payload: payload_preview(payload),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["LINK", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    link.to_string(),
                    payload.len().to_string(),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "link={} size={} payload={}",
                link,
                payload.len(),
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    event: &'static str,
    link: &'a str,
    reason: &'a str,
    stats: LinkStats,
}

/// Print the final link counters when a command exits.
pub fn print_summary(stats: &LinkStats, link: &str, reason: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SummaryOutput {
                event: "summary",
                link,
                reason,
                stats: *stats,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COUNTER", "VALUE"]);
            for (name, value) in counters(stats) {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let fields: Vec<String> = counters(stats)
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!("link={link} reason={reason} {}", fields.join(" "));
        }
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn counters(stats: &LinkStats) -> [(&'static str, u64); 9] {
    [
        ("pings_sent", stats.pings_sent),
        ("pongs_received", stats.pongs_received),
        ("pongs_sent", stats.pongs_sent),
        ("payloads_received", stats.payloads_received),
        ("payloads_sent", stats.payloads_sent),
        ("payload_errors", stats.payload_errors),
        ("mailbox_dropped", stats.mailbox_dropped),
        ("resets", stats.resets),
        ("reset_failures", stats.reset_failures),
    ]
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
    fn preview_falls_back_for_binary() {
        assert_eq!(payload_preview(b"hello"), "hello");
        assert_eq!(payload_preview(&[0xff, 0xfe]), "<binary 2 bytes>");
    }

    #[test]
    fn counters_cover_every_stat() {
        let stats = LinkStats {
            resets: 2,
            ..LinkStats::default()
        };
        let table = counters(&stats);
        assert_eq!(table.len(), 9);
        assert!(table.contains(&("resets", 2)));
    }
}
