//! Config file rendering from chain templates.
//!
//! Templates use `{{NAME}}` tokens drawn from a closed set of placeholders.
//! Rendering never leaves a token behind: an unknown name, a missing value or
//! an unterminated token is an error.

use std::collections::BTreeMap;

use crate::errors::TemplateError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Placeholder {
    PeerPort,
    RpcPort,
    RpcUsername,
    RpcPassword,
}

impl Placeholder {
    pub const ALL: [Placeholder; 4] = [
        Placeholder::PeerPort,
        Placeholder::RpcPort,
        Placeholder::RpcUsername,
        Placeholder::RpcPassword,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::PeerPort => "PEER_PORT",
            Placeholder::RpcPort => "RPC_PORT",
            Placeholder::RpcUsername => "RPC_USERNAME",
            Placeholder::RpcPassword => "RPC_PASSWORD",
        }
    }

    pub fn token(&self) -> String {
        format!("{}{}{}", OPEN, self.name(), CLOSE)
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Values substituted into a template, keyed by placeholder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateValues {
    values: BTreeMap<Placeholder, String>,
}

impl TemplateValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, placeholder: Placeholder, port: u16) -> Self {
        self.values.insert(placeholder, port.to_string());
        self
    }

    pub fn with_value(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.values.insert(placeholder, value.into());
        self
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(String::as_str)
    }
}

/// Substitute every placeholder in `template` and trim surrounding whitespace.
pub fn render(template: &str, values: &TemplateValues) -> Result<String, TemplateError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    let mut consumed = 0;

    while let Some(start) = rest.find(OPEN) {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open.find(CLOSE).ok_or(TemplateError::Unterminated {
            offset: consumed + start,
        })?;
        let name = &after_open[..end];

        let placeholder = Placeholder::from_name(name).ok_or_else(|| {
            TemplateError::UnknownPlaceholder {
                name: name.to_string(),
            }
        })?;
        let value = values
            .get(placeholder)
            .ok_or_else(|| TemplateError::MissingValue {
                placeholder: placeholder.token(),
            })?;
        output.push_str(value);

        let advance = start + OPEN.len() + end + CLOSE.len();
        consumed += advance;
        rest = &rest[advance..];
    }
    output.push_str(rest);

    Ok(output.trim().to_string())
}
