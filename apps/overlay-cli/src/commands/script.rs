//! Event scripts for `overlay simulate`
//!
//! A script is a list of events separated by whitespace or commas:
//! `click:<key>`, `dblclick:<key>`, `over:<key>`, `out:<key>` and `map`.
//! Lines starting with `#` are comments.

use std::fmt;
use std::str::FromStr;

use super::common::CliError;

/// One scripted pointer event, addressing geometries by feature key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEvent {
    Click(String),
    DblClick(String),
    Over(String),
    Out(String),
    Map,
}

impl ScriptEvent {
    /// Feature key the event targets
    pub fn target(&self) -> Option<&str> {
        match self {
            ScriptEvent::Click(key)
            | ScriptEvent::DblClick(key)
            | ScriptEvent::Over(key)
            | ScriptEvent::Out(key) => Some(key),
            ScriptEvent::Map => None,
        }
    }
}

impl FromStr for ScriptEvent {
    type Err = CliError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CliError::Script {
            token: token.to_string(),
            reason: reason.to_string(),
        };

        if token == "map" {
            return Ok(ScriptEvent::Map);
        }
        let (kind, key) = token
            .split_once(':')
            .ok_or_else(|| invalid("expected <event>:<key> or 'map'"))?;
        if key.is_empty() {
            return Err(invalid("missing feature key"));
        }

        let key = key.to_string();
        match kind {
            "click" => Ok(ScriptEvent::Click(key)),
            "dblclick" | "dbclick" => Ok(ScriptEvent::DblClick(key)),
            "over" | "mouseover" => Ok(ScriptEvent::Over(key)),
            "out" | "mouseout" => Ok(ScriptEvent::Out(key)),
            _ => Err(invalid("unknown event kind")),
        }
    }
}

impl fmt::Display for ScriptEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptEvent::Click(key) => write!(f, "click:{key}"),
            ScriptEvent::DblClick(key) => write!(f, "dblclick:{key}"),
            ScriptEvent::Over(key) => write!(f, "over:{key}"),
            ScriptEvent::Out(key) => write!(f, "out:{key}"),
            ScriptEvent::Map => write!(f, "map"),
        }
    }
}

/// Parse a whole script
pub fn parse_script(script: &str) -> Result<Vec<ScriptEvent>, CliError> {
    script
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .flat_map(|line| line.split(|c: char| c.is_whitespace() || c == ','))
        .filter(|token| !token.is_empty())
        .map(str::parse::<ScriptEvent>)
        .collect()
}
