use crate::mapping::MappingRegistry;
use crate::models::{EmptyValuePolicy, Placeholder, Row, Template};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Every `{{...}}` token in scan order, duplicates included.
pub(crate) fn extract_placeholders(body: &str) -> Vec<Placeholder> {
    let mut found = Vec::new();
    let mut index = 0;
    while let Some(rel) = body[index..].find(OPEN) {
        let start = index + rel;
        let inner_start = start + OPEN.len();
        let inner_end = body[inner_start..]
            .find('}')
            .map(|len| inner_start + len)
            .unwrap_or(body.len());
        if inner_end > inner_start && body[inner_end..].starts_with(CLOSE) {
            let end = inner_end + CLOSE.len();
            found.push(Placeholder::new(&body[start..end]));
            index = end;
        } else {
            // `{` is one byte, so this stays on a char boundary.
            index = start + 1;
        }
    }
    found
}

pub(crate) fn distinct_placeholders(placeholders: &[Placeholder]) -> Vec<Placeholder> {
    let mut distinct: Vec<Placeholder> = Vec::new();
    for placeholder in placeholders {
        if distinct.contains(placeholder) {
            continue;
        }
        distinct.push(placeholder.clone());
    }
    distinct
}

pub(crate) fn render_template(
    template: &Template,
    mapping: &MappingRegistry,
    row: &Row,
    policy: EmptyValuePolicy,
) -> String {
    let substitutions = collect_substitutions(mapping, row, policy);
    if substitutions.is_empty() {
        return template.body.clone();
    }

    let body = template.body.as_str();
    let mut output = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(start) = rest.find(OPEN) {
        output.push_str(&rest[..start]);
        let tail = &rest[start..];
        let matched = substitutions
            .iter()
            .filter(|(token, _)| tail.starts_with(*token))
            .max_by_key(|(token, _)| token.len());
        match matched {
            Some((token, value)) => {
                output.push_str(value);
                rest = &tail[token.len()..];
            }
            None => {
                output.push('{');
                rest = &tail[1..];
            }
        }
    }
    output.push_str(rest);
    output
}

fn collect_substitutions<'a>(
    mapping: &'a MappingRegistry,
    row: &'a Row,
    policy: EmptyValuePolicy,
) -> Vec<(&'a str, &'a str)> {
    let mut substitutions = Vec::new();
    for (placeholder, column) in mapping.entries() {
        let Some(column) = column else {
            continue;
        };
        let value = row.get(column).unwrap_or("");
        if value.is_empty() && policy == EmptyValuePolicy::KeepToken {
            continue;
        }
        substitutions.push((placeholder.as_str(), value));
    }
    substitutions
}
