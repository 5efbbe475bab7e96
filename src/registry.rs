//! Explicit handler registry
//!
//! Maps `(category, name)` pairs to handlers. The registry is filled once by
//! [`crate::domain::build_registry`] before the listener is bound and is only
//! read afterwards, so it is shared across requests behind an `Arc`.

use std::{collections::HashMap, fmt, sync::Arc};

use serde_json::Value;

use crate::dispatch::Arguments;
use crate::errors::AppError;
use crate::output::HandlerOutput;
use crate::resource_uri::{ResourceMatcher, ResourcePattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Tool,
    Resource,
    Prompt,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Resource => "resource",
            Self::Prompt => "prompt",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    Integer,
}

impl ParamKind {
    pub fn json_type(self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Integer => "integer",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: Option<&'static str>,
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            description: None,
            default: None,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind, default: Value) -> Self {
        Self {
            name,
            kind,
            description: None,
            default: Some(default),
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

pub type HandlerFn = Arc<dyn Fn(&Arguments) -> Result<HandlerOutput, AppError> + Send + Sync>;

#[derive(Clone)]
pub struct Handler {
    pub category: Category,
    /// Registry key: tool name, prompt name, or resource URI / URI template.
    pub name: String,
    pub label: String,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
    pub mime_type: Option<&'static str>,
    func: HandlerFn,
}

impl Handler {
    pub fn new<F>(
        category: Category,
        name: impl Into<String>,
        description: &'static str,
        func: F,
    ) -> Self
    where
        F: Fn(&Arguments) -> Result<HandlerOutput, AppError> + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            category,
            label: name.clone(),
            name,
            description,
            params: Vec::new(),
            mime_type: None,
            func: Arc::new(func),
        }
    }

    pub fn tool<F>(name: &str, description: &'static str, func: F) -> Self
    where
        F: Fn(&Arguments) -> Result<HandlerOutput, AppError> + Send + Sync + 'static,
    {
        Self::new(Category::Tool, name, description, func)
    }

    pub fn prompt<F>(name: &str, description: &'static str, func: F) -> Self
    where
        F: Fn(&Arguments) -> Result<HandlerOutput, AppError> + Send + Sync + 'static,
    {
        Self::new(Category::Prompt, name, description, func)
    }

    pub fn resource<F>(uri: &str, label: &str, description: &'static str, func: F) -> Self
    where
        F: Fn(&Arguments) -> Result<HandlerOutput, AppError> + Send + Sync + 'static,
    {
        let mut handler = Self::new(Category::Resource, uri, description, func);
        handler.label = label.to_string();
        handler
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn mime_type(mut self, mime_type: &'static str) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    pub fn call(&self, arguments: &Arguments) -> Result<HandlerOutput, AppError> {
        (self.func)(arguments)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("category", &self.category)
            .field("name", &self.name)
            .field("label", &self.label)
            .field("params", &self.params)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

pub struct ResourceMatch<'a> {
    pub handler: &'a Arc<Handler>,
    pub captured: Option<(String, String)>,
}

#[derive(Debug, Default)]
pub struct Registry {
    handlers: Vec<Arc<Handler>>,
    index: HashMap<(Category, String), usize>,
    resources: ResourceMatcher,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Handler) -> Result<(), AppError> {
        let key = (handler.category, handler.name.clone());
        if self.index.contains_key(&key) {
            return Err(AppError::DuplicateName {
                category: handler.category,
                name: handler.name,
            });
        }

        let slot = self.handlers.len();
        if handler.category == Category::Resource {
            let pattern = ResourcePattern::parse(&handler.name)?;
            if let Some(placeholder) = pattern.placeholder() {
                if !handler.params.iter().any(|param| param.name == placeholder) {
                    return Err(AppError::InvalidTemplate {
                        template: handler.name,
                        reason: "placeholder is not a declared parameter",
                    });
                }
            }
            self.resources.insert(pattern, slot);
        }

        self.index.insert(key, slot);
        self.handlers.push(Arc::new(handler));
        Ok(())
    }

    pub fn lookup(&self, category: Category, name: &str) -> Result<&Arc<Handler>, AppError> {
        self.index
            .get(&(category, name.to_string()))
            .map(|slot| &self.handlers[*slot])
            .ok_or_else(|| AppError::not_found(category, name))
    }

    pub fn match_resource(&self, uri: &str) -> Result<ResourceMatch<'_>, AppError> {
        let (slot, captured) = self.resources.match_uri(uri)?;
        Ok(ResourceMatch {
            handler: &self.handlers[slot],
            captured,
        })
    }

    /// Handlers of one category in registration order.
    pub fn handlers(&self, category: Category) -> impl Iterator<Item = &Handler> {
        self.handlers
            .iter()
            .map(Arc::as_ref)
            .filter(move |handler| handler.category == category)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Handler> {
        self.handlers(Category::Resource)
            .filter(|handler| !handler.name.contains('{'))
    }

    pub fn resource_templates(&self) -> impl Iterator<Item = &Handler> {
        self.handlers(Category::Resource)
            .filter(|handler| handler.name.contains('{'))
    }
}
