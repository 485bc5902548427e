//! Deterministic template rendering.
//!
//! Binds a JSON data mapping into a template string. Supported constructs are
//! `{{ path }}` interpolation (dotted paths traverse nested objects),
//! `{% for item in list %} ... {% endfor %}` and
//! `{% if path %} ... {% else %} ... {% endif %}`. Nothing else evaluates -
//! template text may originate from other users' public templates, so the
//! construct set stays closed.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::PipelineError;

lazy_static! {
    static ref TAG_RE: Regex =
        Regex::new(r"\{\{\s*([^{}%]+?)\s*\}\}|\{%\s*([^{}%]+?)\s*%\}").expect("template tag regex");
    static ref PATH_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z0-9_]+)*$")
        .expect("template path regex");
}

/// Stateless renderer. Identical template + data always yields identical
/// output; no external calls are made.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render `template` against `data`. Every `{{ path }}` reference and
    /// every `{% for %}` source must resolve, or the first unresolved
    /// reference is reported as [`PipelineError::MissingVariable`].
    pub fn render(&self, template: &str, data: &Value) -> Result<String, PipelineError> {
        let tokens = scan(template)?;
        let mut stream = tokens.into_iter();
        let (nodes, terminator) = parse_nodes(&mut stream, &[])?;
        debug_assert!(terminator.is_none());

        let mut output = String::with_capacity(template.len());
        let mut scopes = Vec::new();
        eval_nodes(&nodes, data, &mut scopes, &mut output)?;
        Ok(output)
    }
}

#[derive(Debug)]
enum Token {
    Text(String),
    Var(String),
    For { var: String, list: String },
    EndFor,
    If(String),
    Else,
    EndIf,
}

#[derive(Debug)]
enum Node {
    Text(String),
    Var(String),
    For {
        var: String,
        list: String,
        body: Vec<Node>,
    },
    If {
        cond: String,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    EndFor,
    Else,
    EndIf,
}

fn scan(template: &str) -> Result<Vec<Token>, PipelineError> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for capture in TAG_RE.captures_iter(template) {
        let whole = capture.get(0).expect("regex match has a whole group");
        if whole.start() > cursor {
            tokens.push(Token::Text(template[cursor..whole.start()].to_string()));
        }
        cursor = whole.end();

        if let Some(expr) = capture.get(1) {
            tokens.push(Token::Var(checked_path(expr.as_str())?));
        } else if let Some(tag) = capture.get(2) {
            tokens.push(block_token(tag.as_str())?);
        }
    }

    if cursor < template.len() {
        tokens.push(Token::Text(template[cursor..].to_string()));
    }
    Ok(tokens)
}

fn checked_path(expr: &str) -> Result<String, PipelineError> {
    if PATH_RE.is_match(expr) {
        Ok(expr.to_string())
    } else {
        Err(PipelineError::TemplateSyntax(format!(
            "invalid variable reference '{expr}'"
        )))
    }
}

fn block_token(tag: &str) -> Result<Token, PipelineError> {
    let words: Vec<&str> = tag.split_whitespace().collect();
    match words.as_slice() {
        ["for", var, "in", list] => Ok(Token::For {
            var: checked_path(var)?,
            list: checked_path(list)?,
        }),
        ["endfor"] => Ok(Token::EndFor),
        ["if", cond] => Ok(Token::If(checked_path(cond)?)),
        ["else"] => Ok(Token::Else),
        ["endif"] => Ok(Token::EndIf),
        _ => Err(PipelineError::TemplateSyntax(format!(
            "unrecognized block tag '{{% {tag} %}}'"
        ))),
    }
}

fn parse_nodes(
    stream: &mut std::vec::IntoIter<Token>,
    terminators: &[Terminator],
) -> Result<(Vec<Node>, Option<Terminator>), PipelineError> {
    let mut nodes = Vec::new();

    while let Some(token) = stream.next() {
        match token {
            Token::Text(text) => nodes.push(Node::Text(text)),
            Token::Var(path) => nodes.push(Node::Var(path)),
            Token::For { var, list } => {
                let (body, end) = parse_nodes(stream, &[Terminator::EndFor])?;
                if end != Some(Terminator::EndFor) {
                    return Err(PipelineError::TemplateSyntax(
                        "unclosed {% for %} block".into(),
                    ));
                }
                nodes.push(Node::For { var, list, body });
            }
            Token::If(cond) => {
                let (then_branch, end) =
                    parse_nodes(stream, &[Terminator::Else, Terminator::EndIf])?;
                let else_branch = match end {
                    Some(Terminator::Else) => {
                        let (branch, end) = parse_nodes(stream, &[Terminator::EndIf])?;
                        if end != Some(Terminator::EndIf) {
                            return Err(PipelineError::TemplateSyntax(
                                "unclosed {% if %} block".into(),
                            ));
                        }
                        branch
                    }
                    Some(Terminator::EndIf) => Vec::new(),
                    _ => {
                        return Err(PipelineError::TemplateSyntax(
                            "unclosed {% if %} block".into(),
                        ))
                    }
                };
                nodes.push(Node::If {
                    cond,
                    then_branch,
                    else_branch,
                });
            }
            Token::EndFor => {
                return close_block(Terminator::EndFor, terminators, nodes, "{% endfor %}")
            }
            Token::Else => return close_block(Terminator::Else, terminators, nodes, "{% else %}"),
            Token::EndIf => {
                return close_block(Terminator::EndIf, terminators, nodes, "{% endif %}")
            }
        }
    }

    if terminators.is_empty() {
        Ok((nodes, None))
    } else {
        Err(PipelineError::TemplateSyntax("unclosed block".into()))
    }
}

fn close_block(
    found: Terminator,
    expected: &[Terminator],
    nodes: Vec<Node>,
    tag: &str,
) -> Result<(Vec<Node>, Option<Terminator>), PipelineError> {
    if expected.contains(&found) {
        Ok((nodes, Some(found)))
    } else {
        Err(PipelineError::TemplateSyntax(format!("unexpected {tag}")))
    }
}

fn eval_nodes(
    nodes: &[Node],
    root: &Value,
    scopes: &mut Vec<(String, Value)>,
    output: &mut String,
) -> Result<(), PipelineError> {
    for node in nodes {
        match node {
            Node::Text(text) => output.push_str(text),
            Node::Var(path) => {
                let value = lookup(path, root, scopes)
                    .ok_or_else(|| PipelineError::MissingVariable(path.clone()))?;
                output.push_str(&value_text(&value));
            }
            Node::For { var, list, body } => {
                let value = lookup(list, root, scopes)
                    .ok_or_else(|| PipelineError::MissingVariable(list.clone()))?;
                let items = match value {
                    Value::Array(items) => items,
                    _ => return Err(PipelineError::MissingVariable(list.clone())),
                };
                for item in items {
                    scopes.push((var.clone(), item));
                    let result = eval_nodes(body, root, scopes, output);
                    scopes.pop();
                    result?;
                }
            }
            Node::If {
                cond,
                then_branch,
                else_branch,
            } => {
                // Absent keys are falsy here; only interpolation and
                // iteration treat them as hard errors.
                let truthy = lookup(cond, root, scopes)
                    .map(|v| is_truthy(&v))
                    .unwrap_or(false);
                let branch = if truthy { then_branch } else { else_branch };
                eval_nodes(branch, root, scopes, output)?;
            }
        }
    }
    Ok(())
}

fn lookup(path: &str, root: &Value, scopes: &[(String, Value)]) -> Option<Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;

    let mut current = scopes
        .iter()
        .rev()
        .find(|(name, _)| name == first)
        .map(|(_, value)| value)
        .or_else(|| root.get(first))?;

    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current.clone())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
    }
}
