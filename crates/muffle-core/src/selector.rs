use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::tree::{Node, NodeSpec, TreeError};

const ATTRIBUTE_PATTERN: &str =
    r#"^\[\s*([A-Za-z_][\w:.-]*)\s*(?:=\s*(?:'([^']*)'|"([^"]*)"|([^\s'"\]]+))\s*)?\]$"#;
const ID_PATTERN: &str = r"^#([A-Za-z_][\w-]*)$";

/// The structural selectors the pipeline needs: `[name]`, `[name=value]`
/// (value optionally single- or double-quoted) and `#id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Attribute { name: String, value: Option<String> },
    Id(String),
}

impl Selector {
    #[must_use]
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Self::Attribute { name, value: None } => node.attribute(name).is_some(),
            Self::Attribute {
                name,
                value: Some(expected),
            } => node.attribute(name) == Some(expected.as_str()),
            Self::Id(id) => node.attribute("id") == Some(id.as_str()),
        }
    }

    /// Add whatever attribute makes `spec` match this selector.
    #[must_use]
    pub fn stamp(&self, spec: NodeSpec) -> NodeSpec {
        match self {
            Self::Attribute { name, value } => {
                spec.attr(name.clone(), value.clone().unwrap_or_default())
            }
            Self::Id(id) => spec.attr("id", id.clone()),
        }
    }
}

impl FromStr for Selector {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = || TreeError::InvalidSelector(s.to_string());

        let id_re = Regex::new(ID_PATTERN).map_err(|_| invalid())?;
        if let Some(caps) = id_re.captures(input) {
            return Ok(Self::Id(caps[1].to_string()));
        }

        let attr_re = Regex::new(ATTRIBUTE_PATTERN).map_err(|_| invalid())?;
        let caps = attr_re.captures(input).ok_or_else(invalid)?;
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string());

        Ok(Self::Attribute {
            name: caps[1].to_string(),
            value,
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute { name, value: None } => write!(f, "[{name}]"),
            Self::Attribute {
                name,
                value: Some(value),
            } => write!(f, "[{name}='{value}']"),
            Self::Id(id) => write!(f, "#{id}"),
        }
    }
}
