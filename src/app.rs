use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::MergeConfig;
use crate::models::Placeholder;
use crate::navigator::PreviewNavigator;
use crate::system::{export_all, load_table, load_template, set_clipboard};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum View {
    Mapping,
    Preview,
    Error,
}

#[derive(Clone, Debug)]
pub(crate) struct StatusMessage {
    pub(crate) text: String,
    pub(crate) since: Instant,
}

/// Reads both inputs and applies the automatic and preset mappings.
pub(crate) fn open_navigator(
    template_path: &Path,
    data_path: &Path,
    config: &MergeConfig,
    presets: &[(String, String)],
) -> Result<PreviewNavigator> {
    let template = load_template(template_path)?;
    let table = load_table(data_path, config.delimiter_byte()?)?;
    tracing::info!(
        template = %template_path.display(),
        data = %data_path.display(),
        rows = table.len(),
        "inputs loaded"
    );
    let mut navigator = PreviewNavigator::new(template, table, config.empty_value);
    apply_mappings(&mut navigator, config, presets)?;
    Ok(navigator)
}

fn apply_mappings(
    navigator: &mut PreviewNavigator,
    config: &MergeConfig,
    presets: &[(String, String)],
) -> Result<()> {
    if config.auto_map {
        let assigned = navigator.auto_map();
        tracing::debug!(assigned, "auto-mapped placeholders");
    }
    for (token, column) in presets {
        if !navigator.columns().iter().any(|known| known == column) {
            bail!(
                "Unknown column '{column}' for {token} (available: {})",
                navigator.columns().join(", ")
            );
        }
        navigator.assign(&Placeholder::new(token), column)?;
    }
    Ok(())
}

/// Loads, maps and writes every row without the preview. Refuses to write while any placeholder is
/// unmapped.
pub(crate) fn export_headless(
    template_path: &Path,
    data_path: &Path,
    config: &MergeConfig,
    presets: &[(String, String)],
) -> Result<Vec<PathBuf>> {
    let navigator = open_navigator(template_path, data_path, config, presets)?;
    let unmapped: Vec<String> = navigator
        .mapping()
        .unmapped()
        .iter()
        .map(|placeholder| placeholder.to_string())
        .collect();
    if !unmapped.is_empty() {
        bail!(
            "Unmapped placeholders: {} (use --map TOKEN=COLUMN)",
            unmapped.join(", ")
        );
    }
    export_all(&navigator, &config.export).context("Export failed")
}

#[derive(Debug)]
pub(crate) struct App {
    pub(crate) template_path: PathBuf,
    pub(crate) data_path: PathBuf,
    pub(crate) config: MergeConfig,
    pub(crate) presets: Vec<(String, String)>,
    pub(crate) navigator: Option<PreviewNavigator>,
    pub(crate) view: View,
    pub(crate) selected: usize,
    pub(crate) list_scroll: usize,
    pub(crate) preview_scroll: u16,
    pub(crate) error_message: Option<String>,
    pub(crate) status: Option<StatusMessage>,
    pub(crate) should_quit: bool,
}

impl App {
    pub(crate) fn load(
        template_path: PathBuf,
        data_path: PathBuf,
        config: MergeConfig,
        presets: Vec<(String, String)>,
    ) -> Self {
        let mut app = Self {
            template_path,
            data_path,
            config,
            presets,
            navigator: None,
            view: View::Mapping,
            selected: 0,
            list_scroll: 0,
            preview_scroll: 0,
            error_message: None,
            status: None,
            should_quit: false,
        };
        app.open();
        app
    }

    fn open(&mut self) {
        match open_navigator(&self.template_path, &self.data_path, &self.config, &self.presets) {
            Ok(navigator) => {
                self.navigator = Some(navigator);
                self.view = View::Mapping;
                self.error_message = None;
            }
            Err(err) => {
                tracing::error!("{err:#}");
                self.navigator = None;
                self.view = View::Error;
                self.error_message = Some(format!("{err:#}"));
            }
        }
        self.selected = 0;
        self.list_scroll = 0;
        self.preview_scroll = 0;
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) {
        match self.view {
            View::Mapping => self.on_key_mapping(key),
            View::Preview => self.on_key_preview(key),
            View::Error => self.on_key_error(key),
        }
    }

    fn on_key_error(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }

    fn on_key_mapping(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Right | KeyCode::Char('l') => self.cycle_column(1),
            KeyCode::Left | KeyCode::Char('h') => self.cycle_column(-1),
            KeyCode::Backspace | KeyCode::Delete => self.clear_selected(),
            KeyCode::Char('a') => self.auto_map(),
            KeyCode::Enter | KeyCode::Char('p') => self.open_preview(),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }

    fn on_key_preview(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.view = View::Mapping,
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.copy_current()
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => self.step(true),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => self.step(false),
            KeyCode::Char('g') | KeyCode::Home => self.jump_first(),
            KeyCode::Char('G') | KeyCode::End => self.jump_last(),
            KeyCode::Down | KeyCode::Char('j') => {
                self.preview_scroll = self.preview_scroll.saturating_add(1)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.preview_scroll = self.preview_scroll.saturating_sub(1)
            }
            KeyCode::Char('x') => self.export(),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self
            .navigator
            .as_ref()
            .map(|navigator| navigator.placeholders().len())
            .unwrap_or(0);
        if len == 0 {
            return;
        }
        let next = (self.selected as isize + delta).clamp(0, (len - 1) as isize);
        self.selected = next as usize;
    }

    fn selected_placeholder(&self) -> Option<Placeholder> {
        self.navigator
            .as_ref()
            .and_then(|navigator| navigator.placeholders().get(self.selected))
            .cloned()
    }

    /// Steps through `unset` followed by every column, wrapping at both ends.
    fn cycle_column(&mut self, delta: isize) {
        let Some(placeholder) = self.selected_placeholder() else {
            return;
        };
        let Some(navigator) = self.navigator.as_mut() else {
            return;
        };
        let columns = navigator.columns().to_vec();
        if columns.is_empty() {
            self.set_status("The data file has no columns");
            return;
        }
        let slots = columns.len() as isize + 1;
        let current = navigator
            .mapping()
            .get(&placeholder)
            .and_then(|column| columns.iter().position(|name| name == column))
            .map(|index| index as isize + 1)
            .unwrap_or(0);
        let next = (current + delta).rem_euclid(slots) as usize;
        let column = if next == 0 { "" } else { columns[next - 1].as_str() };
        if let Err(err) = navigator.assign(&placeholder, column) {
            self.set_status(&err.to_string());
        }
    }

    fn clear_selected(&mut self) {
        let Some(placeholder) = self.selected_placeholder() else {
            return;
        };
        if let Some(navigator) = self.navigator.as_mut() {
            if let Err(err) = navigator.clear(&placeholder) {
                self.set_status(&err.to_string());
            }
        }
    }

    fn auto_map(&mut self) {
        let Some(navigator) = self.navigator.as_mut() else {
            return;
        };
        let assigned = navigator.auto_map();
        self.set_status(&format!("Auto-mapped {assigned} placeholder(s)"));
    }

    fn open_preview(&mut self) {
        let Some(navigator) = self.navigator.as_mut() else {
            return;
        };
        if !navigator.mapping().is_complete() {
            let unmapped: Vec<String> = navigator
                .mapping()
                .unmapped()
                .iter()
                .map(|placeholder| placeholder.to_string())
                .collect();
            self.set_status(&format!("Unmapped: {}", unmapped.join(", ")));
            return;
        }
        match navigator.refresh() {
            Ok(_) => {
                self.preview_scroll = 0;
                self.view = View::Preview;
            }
            Err(err) => self.set_status(&format!("Nothing to preview: {err}")),
        }
    }

    fn step(&mut self, forward: bool) {
        let Some(navigator) = self.navigator.as_mut() else {
            return;
        };
        let before = navigator.position();
        if forward {
            navigator.move_next();
        } else {
            navigator.move_previous();
        }
        if navigator.position() != before {
            self.preview_scroll = 0;
        }
    }

    fn jump_first(&mut self) {
        self.jump(|_| 0);
    }

    fn jump_last(&mut self) {
        self.jump(|rows| rows.saturating_sub(1));
    }

    fn jump(&mut self, target: impl Fn(usize) -> usize) {
        let Some(navigator) = self.navigator.as_mut() else {
            return;
        };
        let index = target(navigator.row_count());
        match navigator.jump_to(index) {
            Ok(_) => self.preview_scroll = 0,
            Err(err) => self.set_status(&err.to_string()),
        }
    }

    fn copy_current(&mut self) {
        let body = self
            .navigator
            .as_ref()
            .and_then(|navigator| navigator.current())
            .map(|result| result.body.clone());
        let Some(body) = body else {
            return;
        };
        match set_clipboard(&body) {
            Ok(()) => self.set_status("Copied"),
            Err(err) => self.set_status(&format!("{err:#}")),
        }
    }

    fn export(&mut self) {
        let Some(navigator) = self.navigator.as_ref() else {
            return;
        };
        match export_all(navigator, &self.config.export) {
            Ok(written) => {
                let text = format!(
                    "Exported {} file(s) to {}",
                    written.len(),
                    self.config.export.dir.display()
                );
                self.set_status(&text);
            }
            Err(err) => {
                tracing::error!("{err:#}");
                self.set_status(&format!("{err:#}"));
            }
        }
    }

    fn reload(&mut self) {
        tracing::info!("reloading inputs");
        self.open();
        if self.view == View::Mapping {
            self.set_status("Reloaded");
        }
    }

    pub(crate) fn set_status(&mut self, text: &str) {
        self.status = Some(StatusMessage {
            text: text.to_string(),
            since: Instant::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(dir: &Path, template: &str, csv: &str, auto_map: bool) -> App {
        let template_path = dir.join("mail.txt");
        let data_path = dir.join("people.csv");
        fs::write(&template_path, template).unwrap();
        fs::write(&data_path, csv).unwrap();
        let config = MergeConfig {
            auto_map,
            export: crate::config::ExportConfig {
                dir: dir.join("out"),
                ..Default::default()
            },
            ..MergeConfig::default()
        };
        App::load(template_path, data_path, config, Vec::new())
    }

    fn preview_body(app: &App) -> Option<String> {
        app.navigator
            .as_ref()
            .and_then(|navigator| navigator.current())
            .map(|result| result.body.clone())
    }

    #[test]
    fn missing_files_show_error_view() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::load(
            dir.path().join("nope.txt"),
            dir.path().join("nope.csv"),
            MergeConfig::default(),
            Vec::new(),
        );
        assert_eq!(app.view, View::Error);
        assert!(app.error_message.is_some());
    }

    #[test]
    fn preview_is_blocked_until_mapping_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path(), "Hi {{name}}, {{code}}", "name,code\nAna,42\n", false);
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.view, View::Mapping);
        assert!(app.status.as_ref().unwrap().text.contains("{{name}}"));

        app.on_key(key(KeyCode::Right));
        app.on_key(key(KeyCode::Down));
        app.on_key(key(KeyCode::Right));
        app.on_key(key(KeyCode::Right));
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.view, View::Preview);
        assert_eq!(preview_body(&app).as_deref(), Some("Hi Ana, 42"));
    }

    #[test]
    fn column_cycle_wraps_through_unset() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path(), "{{x}}", "a,b\n1,2\n", false);
        let x = Placeholder::new("{{x}}");
        let column = |app: &App| {
            app.navigator
                .as_ref()
                .and_then(|navigator| navigator.mapping().get(&x).map(str::to_string))
        };
        app.on_key(key(KeyCode::Left));
        assert_eq!(column(&app).as_deref(), Some("b"));
        app.on_key(key(KeyCode::Right));
        assert_eq!(column(&app), None);
        app.on_key(key(KeyCode::Right));
        assert_eq!(column(&app).as_deref(), Some("a"));
        app.on_key(key(KeyCode::Backspace));
        assert_eq!(column(&app), None);
    }

    #[test]
    fn preview_navigation_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path(), "#{{n}}", "n\n1\n2\n3\n", true);
        app.on_key(key(KeyCode::Enter));
        assert_eq!(preview_body(&app).as_deref(), Some("#1"));

        app.on_key(key(KeyCode::Char('G')));
        assert_eq!(preview_body(&app).as_deref(), Some("#3"));
        app.on_key(key(KeyCode::Right));
        assert_eq!(preview_body(&app).as_deref(), Some("#3"));
        app.on_key(key(KeyCode::Left));
        assert_eq!(preview_body(&app).as_deref(), Some("#2"));
        app.on_key(key(KeyCode::Char('g')));
        assert_eq!(preview_body(&app).as_deref(), Some("#1"));

        app.on_key(key(KeyCode::Char('x')));
        let exported = fs::read_to_string(dir.path().join("out").join("mail-0003.txt")).unwrap();
        assert_eq!(exported, "#3");

        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.view, View::Mapping);
    }

    #[test]
    fn reload_picks_up_new_template() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path(), "{{n}}", "n\n1\n", true);
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.view, View::Preview);

        fs::write(dir.path().join("mail.txt"), "{{n}} and {{m}}").unwrap();
        app.on_key(key(KeyCode::Char('r')));
        assert_eq!(app.view, View::Mapping);
        let navigator = app.navigator.as_ref().unwrap();
        assert_eq!(navigator.placeholders().len(), 2);
        assert!(navigator.current().is_none());
    }

    #[test]
    fn empty_table_cannot_be_previewed() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path(), "plain text", "name\n", true);
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.view, View::Mapping);
        assert!(app.status.as_ref().unwrap().text.starts_with("Nothing to preview"));
    }

    #[test]
    fn unknown_preset_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.txt"), "{{a}}").unwrap();
        fs::write(dir.path().join("d.csv"), "a\n1\n").unwrap();
        let err = open_navigator(
            &dir.path().join("t.txt"),
            &dir.path().join("d.csv"),
            &MergeConfig::default(),
            &[("{{b}}".to_string(), "a".to_string())],
        )
        .unwrap_err();
        assert!(format!("{err}").contains("{{b}}"));
    }

    #[test]
    fn preset_with_unknown_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.txt"), "{{a}}").unwrap();
        fs::write(dir.path().join("d.csv"), "a,b\n1,2\n").unwrap();
        let err = open_navigator(
            &dir.path().join("t.txt"),
            &dir.path().join("d.csv"),
            &MergeConfig::default(),
            &[("{{a}}".to_string(), "nmae".to_string())],
        )
        .unwrap_err();
        let message = format!("{err}");
        assert!(message.contains("'nmae'"));
        assert!(message.contains("{{a}}"));
        assert!(message.contains("a, b"));
    }

    #[test]
    fn headless_export_names_every_unmapped_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.txt"), "{{name}} {{code}} {{city}}").unwrap();
        fs::write(dir.path().join("d.csv"), "first,code\nAna,42\n").unwrap();
        let config = MergeConfig {
            export: crate::config::ExportConfig {
                dir: dir.path().join("out"),
                ..Default::default()
            },
            ..MergeConfig::default()
        };
        let err = export_headless(
            &dir.path().join("t.txt"),
            &dir.path().join("d.csv"),
            &config,
            &[],
        )
        .unwrap_err();
        let message = format!("{err}");
        assert!(message.contains("{{name}}"));
        assert!(message.contains("{{city}}"));
        assert!(!message.contains("{{code}}"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn headless_export_writes_every_row_once_mapped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.txt"), "Hi {{name}}, {{code}}").unwrap();
        fs::write(dir.path().join("d.csv"), "first,code\nAna,42\nBo,7\n").unwrap();
        let out = dir.path().join("out");
        let config = MergeConfig {
            export: crate::config::ExportConfig {
                dir: out.clone(),
                ..Default::default()
            },
            ..MergeConfig::default()
        };
        let written = export_headless(
            &dir.path().join("t.txt"),
            &dir.path().join("d.csv"),
            &config,
            &[("{{name}}".to_string(), "first".to_string())],
        )
        .unwrap();
        assert_eq!(written, vec![out.join("t-0001.txt"), out.join("t-0002.txt")]);
        assert_eq!(fs::read_to_string(&written[1]).unwrap(), "Hi Bo, 7");
    }
}
