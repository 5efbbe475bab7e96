//! Resource URI patterns and matching
//!
//! A pattern is either a literal URI (`greeting://test`) or a template with a
//! single `{placeholder}` segment (`greeting://{name}`). Literal patterns are
//! always tried before templates.

use std::collections::HashMap;

use regex::Regex;

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct ResourcePattern {
    template: String,
    kind: PatternKind,
}

#[derive(Debug, Clone)]
enum PatternKind {
    Literal,
    Templated { placeholder: String, matcher: Regex },
}

impl ResourcePattern {
    pub fn parse(template: &str) -> Result<Self, AppError> {
        let invalid = |reason: &'static str| AppError::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let Some(open) = template.find('{') else {
            if template.contains('}') {
                return Err(invalid("unbalanced braces"));
            }
            return Ok(Self {
                template: template.to_string(),
                kind: PatternKind::Literal,
            });
        };

        let close = template[open..]
            .find('}')
            .map(|offset| open + offset)
            .ok_or_else(|| invalid("unbalanced braces"))?;

        let prefix = &template[..open];
        let placeholder = &template[open + 1..close];
        let suffix = &template[close + 1..];

        if prefix.contains('}') {
            return Err(invalid("unbalanced braces"));
        }
        if suffix.contains('{') || suffix.contains('}') {
            return Err(invalid("at most one placeholder is supported"));
        }
        if !is_identifier(placeholder) {
            return Err(invalid("placeholder must be an identifier"));
        }

        let matcher = Regex::new(&format!(
            "^{}(?P<value>[^/]+){}$",
            regex::escape(prefix),
            regex::escape(suffix)
        ))
        .map_err(|_| invalid("template does not compile"))?;

        Ok(Self {
            template: template.to_string(),
            kind: PatternKind::Templated {
                placeholder: placeholder.to_string(),
                matcher,
            },
        })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, PatternKind::Literal)
    }

    pub fn placeholder(&self) -> Option<&str> {
        match &self.kind {
            PatternKind::Literal => None,
            PatternKind::Templated { placeholder, .. } => Some(placeholder),
        }
    }

    /// Returns the captured placeholder value when `uri` matches a template.
    fn capture(&self, uri: &str) -> Option<String> {
        match &self.kind {
            PatternKind::Literal => None,
            PatternKind::Templated { matcher, .. } => matcher
                .captures(uri)
                .and_then(|captures| captures.name("value"))
                .map(|value| value.as_str().to_string()),
        }
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Resolves concrete URIs to registry slots.
#[derive(Debug, Default)]
pub struct ResourceMatcher {
    literals: HashMap<String, usize>,
    templates: Vec<(ResourcePattern, usize)>,
}

impl ResourceMatcher {
    pub fn insert(&mut self, pattern: ResourcePattern, slot: usize) {
        if pattern.is_literal() {
            self.literals.insert(pattern.template, slot);
        } else {
            self.templates.push((pattern, slot));
        }
    }

    /// Literal match first, then templates in insertion order.
    pub fn match_uri(&self, uri: &str) -> Result<(usize, Option<(String, String)>), AppError> {
        if let Some(slot) = self.literals.get(uri) {
            return Ok((*slot, None));
        }

        self.templates
            .iter()
            .find_map(|(pattern, slot)| {
                let value = pattern.capture(uri)?;
                let placeholder = pattern.placeholder()?.to_string();
                Some((*slot, Some((placeholder, value))))
            })
            .ok_or_else(|| AppError::NoMatch {
                uri: uri.to_string(),
            })
    }
}
