//! Parse configuration.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;

/// Options shared by [`parse`](crate::parse) and [`convert`](crate::convert).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Reported in errors.
    pub filename: Option<String>,
    /// Compile the component as a custom element.
    pub custom_element: bool,
    /// How styles are emitted. Stored for code generation; the parser does
    /// not act on it.
    pub css: CssMode,
}

/// Style output mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CssMode {
    #[default]
    Injected,
    External,
    None,
}

impl<'de> Deserialize<'de> for CssMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CssModeVisitor;

        impl Visitor<'_> for CssModeVisitor {
            type Value = CssMode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(r#""injected", "external", "none" or a boolean"#)
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<CssMode, E> {
                Ok(if value {
                    CssMode::Injected
                } else {
                    CssMode::None
                })
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<CssMode, E> {
                match value {
                    "injected" => Ok(CssMode::Injected),
                    "external" => Ok(CssMode::External),
                    "none" => Ok(CssMode::None),
                    other => Err(E::unknown_variant(other, &["injected", "external", "none"])),
                }
            }
        }

        deserializer.deserialize_any(CssModeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options: ParseOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ParseOptions::default());
        assert_eq!(options.css, CssMode::Injected);
    }

    #[test]
    fn test_camel_case_fields() {
        let options: ParseOptions =
            serde_json::from_str(r#"{"filename": "App.weft", "customElement": true, "css": "external"}"#)
                .unwrap();
        assert_eq!(options.filename.as_deref(), Some("App.weft"));
        assert!(options.custom_element);
        assert_eq!(options.css, CssMode::External);
    }

    #[test]
    fn test_css_mode_booleans() {
        let on: CssMode = serde_json::from_str("true").unwrap();
        let off: CssMode = serde_json::from_str("false").unwrap();
        assert_eq!(on, CssMode::Injected);
        assert_eq!(off, CssMode::None);
        assert!(serde_json::from_str::<CssMode>(r#""inline""#).is_err());
    }
}
