use std::collections::BTreeMap;
use std::fmt;

use crate::tool::{OptionKind, ToolSpec, OUTPUT_FORMAT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Choice(String),
    Flag(bool),
    Integer(i64),
    Text(String),
}

impl OptionValue {
    /// Parses user text into the value type a schema entry expects.
    ///
    /// Closed-set membership is not checked here; `JobOptions::set` does that.
    pub fn parse_for(kind: OptionKind, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match kind {
            OptionKind::Choice { .. } => Some(OptionValue::Choice(raw.to_string())),
            OptionKind::Flag { .. } => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(OptionValue::Flag(true)),
                "false" | "no" | "off" | "0" => Some(OptionValue::Flag(false)),
                _ => None,
            },
            OptionKind::Integer { .. } => raw.parse().ok().map(OptionValue::Integer),
            OptionKind::Text { .. } => Some(OptionValue::Text(raw.to_string())),
        }
    }

    fn default_for(kind: OptionKind) -> Self {
        match kind {
            OptionKind::Choice { default, .. } => OptionValue::Choice(default.to_string()),
            OptionKind::Flag { default } => OptionValue::Flag(default),
            OptionKind::Integer { default } => OptionValue::Integer(default),
            OptionKind::Text { default } => OptionValue::Text(default.to_string()),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Choice(value) | OptionValue::Text(value) => f.write_str(value),
            OptionValue::Flag(value) => write!(f, "{value}"),
            OptionValue::Integer(value) => write!(f, "{value}"),
        }
    }
}

/// Named settings for the active tool.
///
/// Always holds a value for every key in the tool's schema, plus
/// `output_format`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobOptions {
    values: BTreeMap<String, OptionValue>,
}

impl JobOptions {
    pub fn defaults_for(tool: &ToolSpec) -> Self {
        let mut values = BTreeMap::new();
        values.insert(
            OUTPUT_FORMAT.to_string(),
            OptionValue::Choice(tool.default_format.to_string()),
        );
        for spec in tool.options {
            values.insert(spec.key.to_string(), OptionValue::default_for(spec.kind));
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn choice(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(OptionValue::Choice(value)) => Some(value),
            _ => None,
        }
    }

    pub fn output_format(&self) -> &str {
        self.choice(OUTPUT_FORMAT).unwrap_or_default()
    }

    /// Applies `value` if the tool's schema allows it. Returns whether it did.
    ///
    /// Unknown keys, mismatched types and out-of-set choices are ignored.
    pub fn set(&mut self, tool: &ToolSpec, key: &str, value: OptionValue) -> bool {
        let Some(kind) = tool.option_kind(key) else {
            return false;
        };
        let accepted = match (kind, value) {
            (OptionKind::Choice { allowed, .. }, OptionValue::Choice(wanted)) => allowed
                .iter()
                .find(|candidate| candidate.eq_ignore_ascii_case(&wanted))
                .map(|canonical| OptionValue::Choice(canonical.to_string())),
            (OptionKind::Flag { .. }, value @ OptionValue::Flag(_))
            | (OptionKind::Integer { .. }, value @ OptionValue::Integer(_))
            | (OptionKind::Text { .. }, value @ OptionValue::Text(_)) => Some(value),
            _ => None,
        };
        match accepted {
            Some(value) => {
                self.values.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolKey;

    #[test]
    fn defaults_cover_schema_and_output_format() {
        let spec = ToolKey::Compress.spec();
        let options = JobOptions::defaults_for(spec);
        assert_eq!(options.output_format(), "PDF");
        assert_eq!(options.choice("compression"), Some("medium"));
        assert_eq!(options.get("resize"), Some(&OptionValue::Flag(true)));
        assert_eq!(options.iter().count(), spec.options.len() + 1);
    }

    #[test]
    fn choices_are_canonicalized() {
        let spec = ToolKey::PdfToImage.spec();
        let mut options = JobOptions::defaults_for(spec);
        assert!(options.set(spec, OUTPUT_FORMAT, OptionValue::Choice("png".into())));
        assert_eq!(options.output_format(), "PNG");
    }

    #[test]
    fn invalid_values_are_ignored() {
        let spec = ToolKey::PdfToImage.spec();
        let mut options = JobOptions::defaults_for(spec);
        let before = options.clone();

        assert!(!options.set(spec, OUTPUT_FORMAT, OptionValue::Choice("PDF".into())));
        assert!(!options.set(spec, "quality", OptionValue::Choice("ultra".into())));
        assert!(!options.set(spec, "dpi", OptionValue::Text("300".into())));
        assert!(!options.set(spec, "colour", OptionValue::Flag(true)));
        assert_eq!(options, before);
    }

    #[test]
    fn free_form_values_are_unconstrained() {
        let spec = ToolKey::PdfToImage.spec();
        let mut options = JobOptions::defaults_for(spec);
        assert!(options.set(spec, "dpi", OptionValue::Integer(-5)));
        assert!(options.set(spec, "page_range", OptionValue::Text("1-3, 9".into())));
        assert_eq!(options.get("dpi"), Some(&OptionValue::Integer(-5)));
    }

    #[test]
    fn parse_follows_schema_kind() {
        let flag = OptionKind::Flag { default: false };
        assert_eq!(OptionValue::parse_for(flag, "Yes"), Some(OptionValue::Flag(true)));
        assert_eq!(OptionValue::parse_for(flag, "maybe"), None);
        let int = OptionKind::Integer { default: 0 };
        assert_eq!(OptionValue::parse_for(int, " 300 "), Some(OptionValue::Integer(300)));
    }
}
