pub mod harvest;
pub mod one;

use std::path::PathBuf;

use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use geoharvest_geogratis::{OutputStyle, RecordTarget, RunOptions};

use crate::config::Config;

/// Where records and the audit report go
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Write records to this JSON Lines file instead of stdout
    #[arg(short = 'f', long)]
    pub json_file: Option<PathBuf>,

    /// Write the audit report (CSV) to this file
    #[arg(short, long)]
    pub report_file: Option<PathBuf>,

    /// Do not write records at all
    #[arg(short, long)]
    pub no_print: bool,

    /// Pretty-print records (default on stdout)
    #[arg(long, conflicts_with = "compact")]
    pub pretty: bool,

    /// One record per line (default in files)
    #[arg(long)]
    pub compact: bool,
}

impl OutputArgs {
    pub fn run_options(&self, config: &Config) -> RunOptions {
        let records = match (&self.json_file, self.no_print) {
            (_, true) => RecordTarget::Suppressed,
            (Some(path), false) => RecordTarget::File(path.clone()),
            (None, false) => RecordTarget::Stdout,
        };
        let style = if self.pretty {
            Some(OutputStyle::Pretty)
        } else if self.compact {
            Some(OutputStyle::Compact)
        } else {
            config.output.pretty.map(|pretty| {
                if pretty {
                    OutputStyle::Pretty
                } else {
                    OutputStyle::Compact
                }
            })
        };
        RunOptions {
            records,
            style,
            report: self.report_file.clone(),
        }
    }
}

/// Print a key-value table on stderr
pub fn print_table(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}

/// `geoharvest config`
pub fn show_config(config: &Config) {
    let harvest = config.geogratis.to_harvest_config();
    let http = config.http.to_http_config();
    print_table(
        "Setting",
        &[
            ("Base URL", harvest.base_url.clone()),
            ("Collection", harvest.collection.clone()),
            ("Item delay", format!("{}ms", harvest.item_delay.as_millis())),
            ("Cursor file", harvest.state_file.display().to_string()),
            (
                "Excluded product types",
                if harvest.excluded_product_types.is_empty() {
                    "none".to_string()
                } else {
                    harvest.excluded_product_types.join(", ")
                },
            ),
            (
                "Lookup tables",
                harvest
                    .lookups
                    .as_ref()
                    .map_or_else(|| "built-in".to_string(), |p| p.display().to_string()),
            ),
            (
                "Record style",
                match config.output.pretty {
                    Some(true) => "pretty",
                    Some(false) => "compact",
                    None => "pretty on stdout, compact in files",
                }
                .to_string(),
            ),
            ("Timeout", format!("{}s", http.timeout.as_secs())),
            ("Connect timeout", format!("{}s", http.connect_timeout.as_secs())),
            ("User agent", http.user_agent),
        ],
    );
}
