use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arboard::Clipboard;

use crate::config::ExportConfig;
use crate::models::{Table, Template};
use crate::navigator::PreviewNavigator;

const DEFAULT_EXTENSION: &str = "txt";

pub(crate) fn load_template(path: &Path) -> Result<Template> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read template {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Template::from_bytes(&name, bytes)?)
}

pub(crate) fn load_table(path: &Path, delimiter: u8) -> Result<Table> {
    let content =
        fs::read(path).with_context(|| format!("Failed to read data {}", path.display()))?;
    parse_table(&content, delimiter).with_context(|| format!("Invalid data in {}", path.display()))
}

/// The header row names the columns; records may be shorter than the header.
pub(crate) fn parse_table(content: &[u8], delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content);

    let columns: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records: Vec<Vec<String>> = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error in record {}", line + 1))?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(Table::from_records(columns, records)?)
}

/// Writes one file per row and returns the paths in row order.
pub(crate) fn export_all(navigator: &PreviewNavigator, export: &ExportConfig) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&export.dir)
        .with_context(|| format!("Failed to create output directory {}", export.dir.display()))?;

    let template = navigator.template();
    let template_path = Path::new(&template.name);
    let stem = template_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "output".to_string());
    let extension = export
        .extension
        .clone()
        .or_else(|| {
            template_path
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(navigator.row_count());
    for result in navigator.render_all() {
        let named = export
            .name_column
            .as_deref()
            .and_then(|column| navigator.row_value(result.position - 1, column))
            .map(sanitize_file_name)
            .filter(|name| !name.is_empty());
        let base = match named {
            Some(name) => name,
            None => format!("{stem}-{:04}", result.position),
        };
        let file_name = unique_name(&mut used, &base, result.position);
        let path = export.dir.join(format!("{file_name}.{extension}"));
        fs::write(&path, &result.body)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    tracing::info!(
        count = written.len(),
        dir = %export.dir.display(),
        "exported merged documents"
    );
    Ok(written)
}

/// Names are compared ignoring ASCII case so `Ana` and `ana` cannot overwrite each other on
/// case-insensitive file systems.
fn unique_name(used: &mut HashSet<String>, base: &str, position: usize) -> String {
    let mut candidate = base.to_string();
    let mut attempt = 1;
    while !used.insert(candidate.to_ascii_lowercase()) {
        candidate = if attempt == 1 {
            format!("{base}-{position:04}")
        } else {
            format!("{base}-{position:04}-{attempt}")
        };
        attempt += 1;
    }
    candidate
}

fn sanitize_file_name(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

pub(crate) fn set_clipboard(text: &str) -> Result<()> {
    Clipboard::new()
        .and_then(|mut cb| cb.set_text(text.to_string()))
        .context("Copy failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmptyValuePolicy, Placeholder};
    use pretty_assertions::assert_eq;

    fn navigator(name: &str, body: &str, csv: &str) -> PreviewNavigator {
        let table = parse_table(csv.as_bytes(), b',').unwrap();
        let mut navigator =
            PreviewNavigator::new(Template::new(name, body), table, EmptyValuePolicy::KeepToken);
        navigator.auto_map();
        navigator
    }

    #[test]
    fn parse_table_reads_header_and_records() {
        let table = parse_table(b"name,code\nAna,42\n\"Bo, Jr\",7\n", b',').unwrap();
        assert_eq!(table.columns, vec!["name".to_string(), "code".to_string()]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].get("name"), Some("Bo, Jr"));
    }

    #[test]
    fn parse_table_accepts_other_delimiters_and_short_rows() {
        let table = parse_table(b"name;code\nAna\n", b';').unwrap();
        assert_eq!(table.rows[0].get("name"), Some("Ana"));
        assert_eq!(table.rows[0].get("code"), None);
    }

    #[test]
    fn parse_table_rejects_long_rows() {
        assert!(parse_table(b"name\nAna,extra\n", b',').is_err());
    }

    #[test]
    fn load_template_rejects_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mail.html");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(load_template(&path).is_err());

        fs::write(&path, "<p>{{name}}</p>").unwrap();
        let template = load_template(&path).unwrap();
        assert_eq!(template.name, "mail.html");
        assert_eq!(template.body, "<p>{{name}}</p>");
    }

    #[test]
    fn export_writes_one_file_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let navigator = navigator("mail.html", "<p>{{name}}</p>", "name\nAna\nBo\n");
        let export = ExportConfig {
            dir: dir.path().join("out"),
            ..ExportConfig::default()
        };
        let written = export_all(&navigator, &export).unwrap();
        assert_eq!(
            written,
            vec![
                export.dir.join("mail-0001.html"),
                export.dir.join("mail-0002.html")
            ]
        );
        assert_eq!(fs::read_to_string(&written[1]).unwrap(), "<p>Bo</p>");
    }

    #[test]
    fn export_names_files_from_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut navigator = navigator(
            "letter",
            "Dear {{name}}",
            "name,email\nAna,ana@x.io\nBo,\nCy,ana@x.io\n",
        );
        navigator
            .assign(&Placeholder::new("{{name}}"), "name")
            .unwrap();
        let export = ExportConfig {
            dir: dir.path().to_path_buf(),
            extension: Some("eml".to_string()),
            name_column: Some("email".to_string()),
        };
        let written = export_all(&navigator, &export).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["ana_x.io.eml", "letter-0002.eml", "ana_x.io-0003.eml"]
        );
    }

    fn exported_names(written: &[PathBuf]) -> Vec<String> {
        written
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn export_never_reuses_a_name_taken_by_an_earlier_row() {
        let dir = tempfile::tempdir().unwrap();
        let navigator = navigator("out.txt", "{{v}}", "file,v\nx,A\nx-0003,B\nx,C\n");
        let export = ExportConfig {
            dir: dir.path().to_path_buf(),
            extension: None,
            name_column: Some("file".to_string()),
        };
        let written = export_all(&navigator, &export).unwrap();
        assert_eq!(
            exported_names(&written),
            vec!["x.txt", "x-0003.txt", "x-0003-2.txt"]
        );
        let bodies: Vec<String> = written
            .iter()
            .map(|path| fs::read_to_string(path).unwrap())
            .collect();
        assert_eq!(bodies, vec!["A", "B", "C"]);
    }

    #[test]
    fn export_names_differing_only_in_case_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let navigator = navigator("out.txt", "{{v}}", "file,v\nAna,A\nana,B\n");
        let export = ExportConfig {
            dir: dir.path().to_path_buf(),
            extension: None,
            name_column: Some("file".to_string()),
        };
        let written = export_all(&navigator, &export).unwrap();
        assert_eq!(exported_names(&written), vec!["Ana.txt", "ana-0002.txt"]);
        assert_eq!(fs::read_to_string(&written[1]).unwrap(), "B");
    }

    #[test]
    fn sanitize_replaces_path_characters() {
        assert_eq!(sanitize_file_name(" ../etc/passwd "), "_etc_passwd");
        assert_eq!(sanitize_file_name("Ana María"), "Ana_Mar_a");
    }
}
