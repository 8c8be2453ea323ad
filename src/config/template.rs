//! `${{ name }}` interpolation over raw file text.
//!
//! Runs before YAML parsing, so placeholders may sit anywhere in a file,
//! including inside quoted scalars. Values are inserted verbatim: there is no
//! escaping of any kind.
//!
//! - `${{ name }}` looks `name` up in the data context; dots walk into nested
//!   objects and arrays (`author.name`, `somelist.0`). `${{ . }}` is the
//!   current context.
//! - `${{& name }}` and `${{{ name }}}` are the same as `${{ name }}`.
//! - Missing and `null` values render as the empty string.
//! - Objects and arrays render as compact JSON, which YAML reads as flow syntax.
//! - `${{! comment }}` renders to nothing.
//! - `${{# name }}…${{/ name }}` renders its body once per list item, once
//!   with an object pushed as context, once for any other truthy value, and
//!   not at all for `false`, `null`, `0`, `""`, `[]` or a missing name.
//!   `${{^ name }}…${{/ name }}` renders only when `name` is falsy. Names
//!   inside a section resolve against the innermost context first.
//! - Partials (`${{> x }}`) and delimiter changes (`${{= … =}}`) are rejected.

use regex_lite::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// Opening interpolation delimiter.
pub const OPEN_TAG: &str = "${{";
/// Closing interpolation delimiter.
pub const CLOSE_TAG: &str = "}}";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed tag at line {line}")]
    Unclosed { line: usize },

    #[error("empty tag at line {line}")]
    EmptyTag { line: usize },

    #[error("unsupported tag at line {line}")]
    UnsupportedTag { line: usize },

    #[error("section '{name}' opened at line {line} is never closed")]
    UnclosedSection { name: String, line: usize },

    #[error("unexpected closing tag '{name}' at line {line}")]
    UnbalancedSection { name: String, line: usize },
}

/// Triple braces first so `${{{ x }}}` is not read as `${{` + `{ x` + `}}`.
fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\$\{\{\{([^}]*)\}\}\}|\$\{\{(.*?)\}\}")
            .expect("interpolation pattern is valid")
    })
}

#[derive(Debug)]
enum Node<'t> {
    Text(&'t str),
    Variable(&'t str),
    Section {
        name: &'t str,
        inverted: bool,
        children: Vec<Node<'t>>,
    },
}

struct OpenSection<'t> {
    name: &'t str,
    inverted: bool,
    line: usize,
    children: Vec<Node<'t>>,
}

/// Render `text` against `context`.
pub fn render(text: &str, context: &Value) -> Result<String, TemplateError> {
    let nodes = parse(text)?;
    let mut out = String::with_capacity(text.len());
    let mut stack = vec![context];
    render_nodes(&nodes, &mut stack, &mut out);
    Ok(out)
}

fn parse(text: &str) -> Result<Vec<Node<'_>>, TemplateError> {
    let mut root = Vec::new();
    let mut open: Vec<OpenSection<'_>> = Vec::new();
    let mut last = 0;

    for caps in tag_pattern().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let (triple, inner) = match (caps.get(1), caps.get(2)) {
            (Some(inner), _) => (true, inner),
            (None, Some(inner)) => (false, inner),
            (None, None) => continue,
        };
        check_unclosed(text, last, whole.start())?;
        check_unclosed(text, inner.start(), inner.end())?;
        push_text(current(&mut root, &mut open), &text[last..whole.start()]);
        last = whole.end();

        let line = line_of(text, whole.start());
        let tag = inner.as_str().trim();
        if triple {
            let name = non_empty(tag, line)?;
            current(&mut root, &mut open).push(Node::Variable(name));
            continue;
        }

        let mut chars = tag.chars();
        match chars.next() {
            None => return Err(TemplateError::EmptyTag { line }),
            Some('!') => {}
            Some('&') => {
                let name = non_empty(chars.as_str().trim(), line)?;
                current(&mut root, &mut open).push(Node::Variable(name));
            }
            Some(sigil @ ('#' | '^')) => open.push(OpenSection {
                name: non_empty(chars.as_str().trim(), line)?,
                inverted: sigil == '^',
                line,
                children: Vec::new(),
            }),
            Some('/') => {
                let name = chars.as_str().trim();
                let section = match open.pop() {
                    Some(section) if section.name == name => section,
                    _ => {
                        return Err(TemplateError::UnbalancedSection {
                            name: name.to_string(),
                            line,
                        });
                    }
                };
                current(&mut root, &mut open).push(Node::Section {
                    name: section.name,
                    inverted: section.inverted,
                    children: section.children,
                });
            }
            // `{` here is a triple-brace opener without its third closing brace.
            Some('{') => return Err(TemplateError::Unclosed { line }),
            Some('>' | '=') => return Err(TemplateError::UnsupportedTag { line }),
            Some(_) => current(&mut root, &mut open).push(Node::Variable(tag)),
        }
    }

    check_unclosed(text, last, text.len())?;
    push_text(current(&mut root, &mut open), &text[last..]);

    if let Some(section) = open.pop() {
        return Err(TemplateError::UnclosedSection {
            name: section.name.to_string(),
            line: section.line,
        });
    }
    Ok(root)
}

fn current<'a, 't>(
    root: &'a mut Vec<Node<'t>>,
    open: &'a mut [OpenSection<'t>],
) -> &'a mut Vec<Node<'t>> {
    match open.last_mut() {
        Some(section) => &mut section.children,
        None => root,
    }
}

fn push_text<'t>(nodes: &mut Vec<Node<'t>>, text: &'t str) {
    if !text.is_empty() {
        nodes.push(Node::Text(text));
    }
}

fn non_empty(name: &str, line: usize) -> Result<&str, TemplateError> {
    if name.is_empty() {
        Err(TemplateError::EmptyTag { line })
    } else {
        Ok(name)
    }
}

fn check_unclosed(text: &str, from: usize, to: usize) -> Result<(), TemplateError> {
    match text[from..to].find(OPEN_TAG) {
        Some(offset) => Err(TemplateError::Unclosed {
            line: line_of(text, from + offset),
        }),
        None => Ok(()),
    }
}

fn line_of(text: &str, pos: usize) -> usize {
    text[..pos].matches('\n').count() + 1
}

fn render_nodes<'v>(nodes: &[Node<'_>], stack: &mut Vec<&'v Value>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable(name) => {
                if let Some(value) = resolve_name(stack, name) {
                    push_value(out, value);
                }
            }
            Node::Section {
                name,
                inverted,
                children,
            } => {
                let value = resolve_name(stack, name);
                match value {
                    _ if *inverted => {
                        if !is_truthy(value) {
                            render_nodes(children, stack, out);
                        }
                    }
                    Some(Value::Array(items)) => {
                        for item in items {
                            stack.push(item);
                            render_nodes(children, stack, out);
                            stack.pop();
                        }
                    }
                    Some(value) if is_truthy(Some(value)) => {
                        stack.push(value);
                        render_nodes(children, stack, out);
                        stack.pop();
                    }
                    _ => {}
                }
            }
        }
    }
}

/// The first segment is looked up from the innermost context outwards; the
/// rest must resolve from there. Walking into a scalar yields nothing.
fn resolve_name<'v>(stack: &[&'v Value], name: &str) -> Option<&'v Value> {
    if name == "." {
        return stack.last().copied();
    }
    let mut segments = name.split('.');
    let first = segments.next()?;
    let start = stack.iter().rev().find_map(|context| step(context, first))?;
    segments.try_fold(start, |current, segment| step(current, segment))
}

fn step<'v>(current: &'v Value, segment: &str) -> Option<&'v Value> {
    match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::Bool(true)) | Some(Value::Object(_)) => true,
    }
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Array(_) | Value::Object(_) => out.push_str(&value.to_string()),
    }
}
