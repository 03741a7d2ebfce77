//! Block form validation and transform.
//!
//! Turns the "new block" form into a validated `BlockType`. The content of a
//! block is written as a one-line template:
//!
//! ```text
//! move {steps=10} steps [dir:left|right] --- then wait
//! ```
//!
//! - plain text becomes a `Text` item,
//! - `{field}` / `{field=default}` becomes an editable `Value` field,
//! - `[field:a|b|c]` becomes a `Selector` with `a` selected,
//! - `---` becomes a `Separator`.
//!
//! The output template may reference fields as `{field}`.

use crate::error::ValidationError;
use crate::id::BlockId;
use crate::model::*;
use crate::store::validate_name;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use winnow::combinator::{alt, delimited, opt, preceded, separated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

const SEPARATOR: &str = "---";

// ─── Form types ──────────────────────────────────────────────────────────

/// Raw user input from the block form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockForm {
    pub name: String,
    pub kind: BlockKind,
    #[serde(default)]
    pub connection: Connection,
    /// Content template, see module docs.
    #[serde(default)]
    pub template: String,
    /// Output template; empty means no output.
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default = "yes")]
    pub draggable: bool,
    #[serde(default = "yes")]
    pub editable: bool,
    #[serde(default = "yes")]
    pub deletable: bool,
}

fn yes() -> bool {
    true
}

impl BlockForm {
    pub fn new(name: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            name: name.into(),
            kind,
            connection: Connection::default(),
            template: String::new(),
            output: String::new(),
            width: None,
            height: None,
            draggable: true,
            editable: true,
            deletable: true,
        }
    }

    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    #[must_use]
    pub fn output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }
}

/// Which form field a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Name,
    Template,
    Output,
    Size,
    Connection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormSeverity {
    /// Blocks submission.
    Error,
    Warning,
}

/// A single finding on the form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDiagnostic {
    pub field: FormField,
    /// Short rule identifier (e.g. "name-unique").
    pub rule: &'static str,
    pub message: String,
    pub severity: FormSeverity,
}

impl FormDiagnostic {
    fn error(field: FormField, rule: &'static str, message: String) -> Self {
        Self {
            field,
            rule,
            message,
            severity: FormSeverity::Error,
        }
    }

    fn warning(field: FormField, rule: &'static str, message: String) -> Self {
        Self {
            field,
            rule,
            message,
            severity: FormSeverity::Warning,
        }
    }
}

/// Template syntax error at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unexpected input at offset {offset}: '{snippet}'")]
pub struct TemplateError {
    pub offset: usize,
    pub snippet: String,
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Validate the form against the blocks already in the project.
#[must_use]
pub fn validate_form<'a>(
    form: &BlockForm,
    existing: impl IntoIterator<Item = &'a Block>,
) -> Vec<FormDiagnostic> {
    let mut diags = Vec::new();

    match validate_name(&form.name) {
        Err(ValidationError::MissingName) => diags.push(FormDiagnostic::error(
            FormField::Name,
            "name-required",
            "A block name is required.".into(),
        )),
        Err(e) => diags.push(FormDiagnostic::error(FormField::Name, "name-format", e.to_string())),
        Ok(()) => {
            if existing.into_iter().any(|b| b.name == form.name) {
                diags.push(FormDiagnostic::error(
                    FormField::Name,
                    "name-unique",
                    format!("A block named '{}' already exists.", form.name),
                ));
            }
        }
    }

    let fields: Option<Vec<ContentItem>> = match parse_template(&form.template) {
        Ok(items) => Some(items),
        Err(e) => {
            diags.push(FormDiagnostic::error(
                FormField::Template,
                "template-syntax",
                e.to_string(),
            ));
            None
        }
    };

    if let Some(items) = &fields {
        let mut seen = HashSet::new();
        for item in items {
            if !seen.insert(item.id.as_str()) {
                diags.push(FormDiagnostic::error(
                    FormField::Template,
                    "duplicate-field",
                    format!("Field '{}' is declared more than once.", item.id),
                ));
            }
        }

        match output_placeholders(&form.output) {
            Ok(refs) => {
                let declared: HashSet<&str> = items
                    .iter()
                    .filter(|i| i.is_field())
                    .map(|i| i.id.as_str())
                    .collect();
                for name in refs {
                    if !declared.contains(name) {
                        diags.push(FormDiagnostic::error(
                            FormField::Output,
                            "unknown-placeholder",
                            format!("Output references '{{{name}}}' but no such field exists."),
                        ));
                    }
                }
            }
            Err(e) => diags.push(FormDiagnostic::error(
                FormField::Output,
                "output-syntax",
                e.to_string(),
            )),
        }
    }

    for (label, value) in [("width", form.width), ("height", form.height)] {
        if let Some(v) = value
            && (!v.is_finite() || v <= 0.0)
        {
            diags.push(FormDiagnostic::error(
                FormField::Size,
                "size-positive",
                format!("The {label} must be a positive number."),
            ));
        }
    }
    if form.width.is_some() != form.height.is_some() {
        diags.push(FormDiagnostic::warning(
            FormField::Size,
            "size-partial",
            "Only one dimension is set; the default size will be used.".into(),
        ));
    }

    if form.kind == BlockKind::Value
        && matches!(form.connection, Connection::Input | Connection::Both)
    {
        diags.push(FormDiagnostic::warning(
            FormField::Connection,
            "value-on-spine",
            "Value blocks are bound into slots and never join a chain.".into(),
        ));
    }

    diags
}

/// Validate the form and, if it has no errors, build the block type.
pub fn form_to_block_type<'a>(
    form: &BlockForm,
    existing: impl IntoIterator<Item = &'a Block>,
) -> Result<BlockType, Vec<FormDiagnostic>> {
    let diags = validate_form(form, existing);
    if diags.iter().any(|d| d.severity == FormSeverity::Error) {
        return Err(diags);
    }
    // Checked above: the template parses.
    let content = parse_template(&form.template).unwrap_or_default();

    let size = match (form.width, form.height) {
        (Some(width), Some(height)) => Some(Size::new(width, height)),
        _ => None,
    };
    let output = (!form.output.trim().is_empty()).then(|| form.output.clone());

    Ok(BlockType {
        id: BlockId::intern(&format!("type_{}", slug(&form.name))),
        name: form.name.clone(),
        kind: form.kind,
        content: content.into_iter().collect(),
        connection: form.connection,
        draggable: form.draggable,
        editable: form.editable,
        deletable: form.deletable,
        size,
        output,
    })
}

/// Parse a content template into content items.
pub fn parse_template(template: &str) -> Result<Vec<ContentItem>, TemplateError> {
    let mut rest = template;
    let mut items = Vec::new();
    let (mut texts, mut seps) = (0usize, 0usize);

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let offset = template.len() - rest.len();
        let token = template_token
            .parse_next(&mut rest)
            .map_err(|_| TemplateError {
                offset,
                snippet: rest.chars().take(12).collect(),
            })?;
        let item = match token {
            Token::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                texts += 1;
                ContentItem::text(format!("text_{texts}"), text)
            }
            Token::Value { id, default } => ContentItem {
                id: id.to_string(),
                data: ContentData::Value {
                    value: default.unwrap_or_default().trim().to_string(),
                    placeholder: Some(id.to_string()),
                },
            },
            Token::Selector { id, options } => {
                ContentItem::selector(id, options.iter().map(|o| o.trim().to_string()).collect())
            }
            Token::Separator => {
                seps += 1;
                ContentItem::separator(format!("sep_{seps}"))
            }
        };
        items.push(item);
    }
    Ok(items)
}

/// Field names referenced as `{name}` in an output template.
pub fn output_placeholders(output: &str) -> Result<Vec<&str>, TemplateError> {
    let mut rest = output;
    let mut refs = Vec::new();
    while !rest.is_empty() {
        let offset = output.len() - rest.len();
        let fail = |rest: &str| TemplateError {
            offset,
            snippet: rest.chars().take(12).collect(),
        };
        if rest.starts_with('{') {
            let name = delimited('{', identifier, '}')
                .parse_next(&mut rest)
                .map_err(|_: ErrMode<ContextError>| fail(rest))?;
            refs.push(name);
        } else {
            take_till::<_, _, ContextError>(1.., '{')
                .parse_next(&mut rest)
                .map_err(|_| fail(rest))?;
        }
    }
    Ok(refs)
}

// ─── Low-level parsers ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Text(&'a str),
    Value {
        id: &'a str,
        default: Option<&'a str>,
    },
    Selector {
        id: &'a str,
        options: Vec<&'a str>,
    },
    Separator,
}

fn template_token<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    alt((
        SEPARATOR.value(Token::Separator),
        value_field,
        selector_field,
        text_run.map(Token::Text),
    ))
    .parse_next(input)
}

fn identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)
}

fn value_field<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    delimited(
        '{',
        (identifier, opt(preceded('=', take_till(0.., '}')))),
        '}',
    )
    .map(|(id, default)| Token::Value { id, default })
    .parse_next(input)
}

fn selector_field<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    let option = take_till(1.., ['|', ']']);
    delimited(
        '[',
        (identifier, preceded(':', separated(1.., option, '|'))),
        ']',
    )
    .map(|(id, options): (&str, Vec<&str>)| Token::Selector { id, options })
    .parse_next(input)
}

/// Free text up to the next field opener or separator.
fn text_run<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let s = *input;
    let mut end = 0;
    while end < s.len() {
        let rest = &s[end..];
        if rest.starts_with('{') || rest.starts_with('[') || rest.starts_with(SEPARATOR) {
            break;
        }
        end += rest.chars().next().map_or(1, char::len_utf8);
    }
    if end == 0 {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    *input = &s[end..];
    Ok(&s[..end])
}

fn slug(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}
