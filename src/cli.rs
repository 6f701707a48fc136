use std::path::PathBuf;

use clap::Parser;

use crate::config::MergeConfig;
use crate::models::EmptyValuePolicy;

/// Merge a CSV file into a `{{placeholder}}` template and preview every result
#[derive(Parser, Debug)]
#[command(name = "mmt", version, about)]
pub(crate) struct CliArgs {
    /// Template file with `{{...}}` placeholders
    #[arg(value_name = "TEMPLATE")]
    pub(crate) template: PathBuf,

    /// CSV file whose header row names the columns
    #[arg(value_name = "DATA")]
    pub(crate) data: PathBuf,

    /// Config file to use instead of ~/.config/mmt/config.yaml
    #[arg(long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,

    /// Output directory for exported documents
    #[arg(short, long, value_name = "DIR")]
    pub(crate) out: Option<PathBuf>,

    /// Replace placeholders whose mapped value is empty with nothing
    #[arg(long)]
    pub(crate) blank_empty: bool,

    /// Map a placeholder to a column, e.g. --map '{{name}}=first_name'
    #[arg(short, long = "map", value_name = "TOKEN=COLUMN", value_parser = parse_mapping)]
    pub(crate) mappings: Vec<(String, String)>,

    /// Export every row and exit without opening the preview
    #[arg(long)]
    pub(crate) export: bool,
}

impl CliArgs {
    pub(crate) fn apply(&self, config: &mut MergeConfig) {
        if let Some(out) = &self.out {
            config.export.dir = out.clone();
        }
        if self.blank_empty {
            config.empty_value = EmptyValuePolicy::Blank;
        }
    }
}

/// Accepts `{{name}}=col` or the bare `name=col`. Splits on the last `=` so tokens may contain one.
fn parse_mapping(raw: &str) -> Result<(String, String), String> {
    let (token, column) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected TOKEN=COLUMN, got '{raw}'"))?;
    let token = token.trim();
    if token.is_empty() {
        return Err(format!("missing placeholder in '{raw}'"));
    }
    let token = if token.starts_with("{{") && token.ends_with("}}") {
        token.to_string()
    } else {
        format!("{{{{{token}}}}}")
    };
    Ok((token, column.trim().to_string()))
}
