//! Template permutations and `{{ expression }}` substitution.
//!
//! A configuration declares `template_values`, a mapping from variable name
//! to the list of values it may take. Every combination of those values is a
//! [`Permutation`]; templated fields are rendered once per permutation.
//!
//! Permutations come out in nested-loop order with the first declared
//! variable varying slowest: `{a: [1, 2], b: [3, 4]}` expands to
//! `(1,3) (1,4) (2,3) (2,4)`. Deduplication keeps the first occurrence, so
//! this order decides which rendering survives.

mod expr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").unwrap());

/// Errors raised while rendering a template.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Unknown template variable '{name}'")]
    UnknownVariable { name: String },

    #[error("Invalid template expression '{expression}': {message}")]
    Syntax { expression: String, message: String },

    #[error("Cannot evaluate '{expression}': {message}")]
    Evaluation { expression: String, message: String },
}

/// Declared template variables and their candidate values, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateValues(Map<String, Value>);

impl TemplateValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` with the given candidate values, replacing any earlier declaration.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Value>) {
        self.0.insert(name.into(), Value::Array(values));
    }

    /// Merges another set of declarations into this one; later keys win.
    pub fn extend(&mut self, other: TemplateValues) {
        for (name, values) in other.0 {
            self.0.insert(name, values);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates variables with their candidate values.
    ///
    /// A scalar declaration counts as a single candidate.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Vec<&Value>)> {
        self.0.iter().map(|(name, values)| {
            let candidates = match values {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            (name.as_str(), candidates)
        })
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<Value>)> for TemplateValues {
    fn from_iter<I: IntoIterator<Item = (K, Vec<Value>)>>(iter: I) -> Self {
        let mut values = TemplateValues::new();
        for (name, candidates) in iter {
            values.insert(name, candidates);
        }
        values
    }
}

/// One concrete binding of every template variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Permutation(Map<String, Value>);

impl Permutation {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Expands template values into the cartesian product of their candidates.
///
/// No declared variables yields exactly one empty permutation. A variable
/// with no candidates yields none.
pub fn expand_permutations(values: &TemplateValues) -> Vec<Permutation> {
    let mut permutations = vec![Permutation::default()];

    for (name, candidates) in values.iter() {
        permutations = permutations
            .into_iter()
            .flat_map(|base| {
                candidates.iter().map(move |candidate| {
                    let mut permutation = base.clone();
                    permutation.bind(name, (*candidate).clone());
                    permutation
                })
            })
            .collect();
    }

    permutations
}

/// Renders every `{{ expression }}` in `template` against one permutation.
pub fn render(template: &str, permutation: &Permutation) -> Result<String, TemplateError> {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;

    for caps in RE_PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        rendered.push_str(&template[last..whole.start()]);
        let value = expr::evaluate(inner.as_str(), permutation)?;
        rendered.push_str(&display_value(&value));
        last = whole.end();
    }

    rendered.push_str(&template[last..]);
    Ok(rendered)
}

/// Renders `template` once per permutation, dropping repeated results.
pub fn render_all_permutations(
    template: &str,
    permutations: &[Permutation],
) -> Result<Vec<String>, TemplateError> {
    let mut seen = HashSet::new();
    let mut rendered = Vec::new();

    for permutation in permutations {
        let value = render(template, permutation)?;
        if seen.insert(value.clone()) {
            rendered.push(value);
        }
    }

    Ok(rendered)
}

/// Renders the string fields at `field_paths` of `object` once per permutation.
///
/// Paths are dot-separated. Missing, null or non-string fields are left
/// untouched. Objects that render identically are collapsed, keeping the
/// first occurrence.
pub fn render_object_all_permutations(
    object: &Map<String, Value>,
    field_paths: &[&str],
    permutations: &[Permutation],
) -> Result<Vec<Map<String, Value>>, TemplateError> {
    let mut rendered: Vec<Map<String, Value>> = Vec::new();

    for permutation in permutations {
        let mut copy = object.clone();
        for path in field_paths {
            if let Some(Value::String(template)) = field_mut(&mut copy, path) {
                *template = render(template, permutation)?;
            }
        }
        if !rendered.contains(&copy) {
            rendered.push(copy);
        }
    }

    Ok(rendered)
}

fn field_mut<'a>(object: &'a mut Map<String, Value>, path: &str) -> Option<&'a mut Value> {
    let mut segments = path.split('.');
    let mut current = object.get_mut(segments.next()?)?;
    for segment in segments {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}

/// Formats a value the way it appears inside rendered text.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            // `1.0` renders as `1`.
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
