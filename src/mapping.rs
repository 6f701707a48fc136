use crate::error::{MergeError, MergeResult};
use crate::models::Placeholder;

#[derive(Clone, Debug, PartialEq, Eq)]
struct MappingEntry {
    placeholder: Placeholder,
    column: Option<String>,
}

/// Placeholder to column assignments for the current template.
///
/// Keys are fixed by the last `initialize`; entries keep first-appearance order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct MappingRegistry {
    entries: Vec<MappingEntry>,
}

impl MappingRegistry {
    pub(crate) fn initialize(&mut self, placeholders: &[Placeholder]) {
        self.entries.clear();
        for placeholder in placeholders {
            if self.position(placeholder).is_some() {
                continue;
            }
            self.entries.push(MappingEntry {
                placeholder: placeholder.clone(),
                column: None,
            });
        }
    }

    /// An empty `column` clears the entry.
    pub(crate) fn set(&mut self, placeholder: &Placeholder, column: &str) -> MergeResult<()> {
        let index = self
            .position(placeholder)
            .ok_or_else(|| MergeError::UnknownPlaceholder {
                placeholder: placeholder.to_string(),
            })?;
        self.entries[index].column = if column.is_empty() {
            None
        } else {
            Some(column.to_string())
        };
        Ok(())
    }

    pub(crate) fn clear(&mut self, placeholder: &Placeholder) -> MergeResult<()> {
        self.set(placeholder, "")
    }

    pub(crate) fn get(&self, placeholder: &Placeholder) -> Option<&str> {
        self.position(placeholder)
            .and_then(|index| self.entries[index].column.as_deref())
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.entries.iter().all(|entry| entry.column.is_some())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&Placeholder, Option<&str>)> {
        self.entries
            .iter()
            .map(|entry| (&entry.placeholder, entry.column.as_deref()))
    }

    pub(crate) fn unmapped(&self) -> Vec<&Placeholder> {
        self.entries
            .iter()
            .filter(|entry| entry.column.is_none())
            .map(|entry| &entry.placeholder)
            .collect()
    }

    pub(crate) fn unused_columns<'a>(&self, columns: &'a [String]) -> Vec<&'a str> {
        columns
            .iter()
            .filter(|column| {
                !self
                    .entries
                    .iter()
                    .any(|entry| entry.column.as_deref() == Some(column.as_str()))
            })
            .map(String::as_str)
            .collect()
    }

    /// Fills unset entries whose trimmed inner text names a column, ignoring ASCII case.
    /// Returns how many entries were assigned.
    pub(crate) fn auto_map(&mut self, columns: &[String]) -> usize {
        let mut assigned = 0;
        for entry in self.entries.iter_mut().filter(|entry| entry.column.is_none()) {
            let wanted = entry.placeholder.inner().trim();
            if let Some(column) = columns
                .iter()
                .find(|column| column.trim().eq_ignore_ascii_case(wanted))
            {
                entry.column = Some(column.clone());
                assigned += 1;
            }
        }
        assigned
    }

    fn position(&self, placeholder: &Placeholder) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.placeholder == *placeholder)
    }
}
