use tracing::debug;

use crate::error::{MergeError, MergeResult};
use crate::mapping::MappingRegistry;
use crate::models::{EmptyValuePolicy, Placeholder, RenderResult, Table, Template};
use crate::parser::{distinct_placeholders, extract_placeholders, render_template};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor {
    Empty,
    Positioned(usize),
}

/// Walks the rendered outputs one row at a time.
///
/// Owns the template, the table and the mapping so that a reload can reset all three together.
/// The exposed result is dropped on every mapping change and only comes back through an explicit
/// `refresh` or a successful move.
#[derive(Clone, Debug)]
pub(crate) struct PreviewNavigator {
    template: Template,
    table: Table,
    placeholders: Vec<Placeholder>,
    mapping: MappingRegistry,
    policy: EmptyValuePolicy,
    cursor: Cursor,
    current: Option<RenderResult>,
}

impl PreviewNavigator {
    pub(crate) fn new(template: Template, table: Table, policy: EmptyValuePolicy) -> Self {
        let mut navigator = Self {
            template: Template::new("", ""),
            table: Table::default(),
            placeholders: Vec::new(),
            mapping: MappingRegistry::default(),
            policy,
            cursor: Cursor::Empty,
            current: None,
        };
        navigator.reload(template, table);
        navigator
    }

    pub(crate) fn reload(&mut self, template: Template, table: Table) {
        self.placeholders = distinct_placeholders(&extract_placeholders(&template.body));
        self.mapping.initialize(&self.placeholders);
        self.cursor = if table.is_empty() {
            Cursor::Empty
        } else {
            Cursor::Positioned(0)
        };
        self.current = None;
        debug!(
            template = %template.name,
            placeholders = self.placeholders.len(),
            rows = table.len(),
            "navigator reloaded"
        );
        self.template = template;
        self.table = table;
    }

    pub(crate) fn template(&self) -> &Template {
        &self.template
    }

    pub(crate) fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    pub(crate) fn columns(&self) -> &[String] {
        &self.table.columns
    }

    pub(crate) fn row_count(&self) -> usize {
        self.table.len()
    }

    pub(crate) fn row_value(&self, index: usize, column: &str) -> Option<&str> {
        self.table.rows.get(index).and_then(|row| row.get(column))
    }

    pub(crate) fn mapping(&self) -> &MappingRegistry {
        &self.mapping
    }

    pub(crate) fn assign(&mut self, placeholder: &Placeholder, column: &str) -> MergeResult<()> {
        self.mapping.set(placeholder, column)?;
        self.current = None;
        Ok(())
    }

    pub(crate) fn clear(&mut self, placeholder: &Placeholder) -> MergeResult<()> {
        self.mapping.clear(placeholder)?;
        self.current = None;
        Ok(())
    }

    pub(crate) fn auto_map(&mut self) -> usize {
        let assigned = self.mapping.auto_map(&self.table.columns);
        if assigned > 0 {
            self.current = None;
        }
        assigned
    }

    pub(crate) fn position(&self) -> Option<usize> {
        match self.cursor {
            Cursor::Empty => None,
            Cursor::Positioned(index) => Some(index),
        }
    }

    pub(crate) fn current(&self) -> Option<&RenderResult> {
        self.current.as_ref()
    }

    /// Re-renders the row under the cursor.
    pub(crate) fn refresh(&mut self) -> MergeResult<&RenderResult> {
        let index = match self.cursor {
            Cursor::Empty => return Err(MergeError::RowIndex { index: 0, len: 0 }),
            Cursor::Positioned(index) => index,
        };
        self.show(index)
    }

    /// Clamped: at the last row this leaves the cursor and the exposed result alone.
    pub(crate) fn move_next(&mut self) -> Option<&RenderResult> {
        if let Cursor::Positioned(index) = self.cursor {
            if index + 1 < self.table.len() {
                return self.show(index + 1).ok();
            }
        }
        self.current.as_ref()
    }

    /// Clamped at the first row.
    pub(crate) fn move_previous(&mut self) -> Option<&RenderResult> {
        if let Cursor::Positioned(index) = self.cursor {
            if index > 0 {
                return self.show(index - 1).ok();
            }
        }
        self.current.as_ref()
    }

    pub(crate) fn jump_to(&mut self, index: usize) -> MergeResult<&RenderResult> {
        self.show(index)
    }

    /// Renders any row without touching the cursor.
    pub(crate) fn render_at(&self, index: usize) -> MergeResult<RenderResult> {
        let row = self.table.rows.get(index).ok_or(MergeError::RowIndex {
            index,
            len: self.table.len(),
        })?;
        Ok(RenderResult {
            body: render_template(&self.template, &self.mapping, row, self.policy),
            position: index + 1,
            total: self.table.len(),
        })
    }

    /// Every row in table order, independent of the cursor.
    pub(crate) fn render_all(&self) -> impl Iterator<Item = RenderResult> + '_ {
        let total = self.table.len();
        self.table
            .rows
            .iter()
            .enumerate()
            .map(move |(index, row)| RenderResult {
                body: render_template(&self.template, &self.mapping, row, self.policy),
                position: index + 1,
                total,
            })
    }

    fn show(&mut self, index: usize) -> MergeResult<&RenderResult> {
        let result = self.render_at(index)?;
        debug!(position = result.position, total = result.total, "preview rendered");
        self.cursor = Cursor::Positioned(index);
        Ok(&*self.current.insert(result))
    }
}
