//! Locale resolution and string tables.
//!
//! Tables are embedded JSON, one file per locale. Resolution never fails:
//! an unknown hint falls back to the language-prefix match, then to the
//! configured default locale.

use std::collections::HashMap;

use serde::Deserialize;

use crate::{errors::Error, event::Event, Result};

const EN_US: &str = include_str!("../locales/en_US.json");
const PT_BR: &str = include_str!("../locales/pt_BR.json");

#[derive(Debug, Deserialize)]
struct LocaleFile {
    locale: String,
    strings: HashMap<String, String>,
}

pub struct Locales {
    tables: HashMap<String, HashMap<String, String>>,
    default_locale: String,
}

impl Locales {
    /// Load the compiled-in locale tables.
    pub fn embedded(default_locale: &str) -> Result<Self> {
        let mut tables = HashMap::new();
        for raw in [EN_US, PT_BR] {
            let file: LocaleFile = serde_json::from_str(raw)?;
            tables.insert(file.locale, file.strings);
        }
        if !tables.contains_key(default_locale) {
            return Err(Error::Config(format!(
                "default locale '{default_locale}' has no string table"
            )));
        }
        Ok(Self {
            tables,
            default_locale: default_locale.to_string(),
        })
    }

    /// Derive the locale context for one dispatch cycle. Single lookup, no
    /// side effects.
    pub fn resolve(&self, ev: &Event) -> LocaleContext<'_> {
        let locale = self.pick(ev.locale_hint());
        LocaleContext {
            locale,
            table: &self.tables[locale],
        }
    }

    fn pick(&self, hint: Option<&str>) -> &str {
        let Some(hint) = hint else {
            return &self.default_locale;
        };
        let norm = hint.replace('-', "_");

        if let Some(key) = self.tables.keys().find(|k| k.eq_ignore_ascii_case(&norm)) {
            return key;
        }

        // Language-prefix match: "pt" and "pt_PT" both land on "pt_BR".
        let lang = norm
            .split('_')
            .next()
            .unwrap_or(norm.as_str())
            .to_ascii_lowercase();
        let prefixed = format!("{lang}_");
        if let Some(key) = self.tables.keys().find(|k| {
            let kl = k.to_ascii_lowercase();
            kl == lang || kl.starts_with(&prefixed)
        }) {
            return key;
        }

        &self.default_locale
    }
}

/// Per-event view over one string table; lifetime is one dispatch cycle.
pub struct LocaleContext<'a> {
    locale: &'a str,
    table: &'a HashMap<String, String>,
}

impl LocaleContext<'_> {
    pub fn locale(&self) -> &str {
        self.locale
    }

    /// Look up `key`. A missing key is a programmer error: it panics under
    /// debug assertions and is error-logged (with the key echoed back) in
    /// release builds.
    pub fn text(&self, key: &str) -> String {
        match self.table.get(key) {
            Some(template) => template.clone(),
            None => {
                tracing::error!(locale = self.locale, key, "missing localization key");
                debug_assert!(
                    false,
                    "missing localization key '{key}' for locale '{}'",
                    self.locale
                );
                key.to_string()
            }
        }
    }

    /// Look up `key` and substitute named `{placeholder}`s.
    pub fn format(&self, key: &str, substitutions: &[(&str, &str)]) -> String {
        let mut out = self.text(key);
        for (name, value) in substitutions {
            out = out.replace(&format!("{{{name}}}"), value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChatKind;
    use crate::testutil::msg_event_with_locale;

    #[test]
    fn embedded_tables_load() {
        assert!(Locales::embedded("en_US").is_ok());
        assert!(Locales::embedded("pt_BR").is_ok());
        assert!(Locales::embedded("xx_XX").is_err());
    }

    #[test]
    fn resolves_exact_prefix_and_fallback() {
        let locales = Locales::embedded("en_US").unwrap();

        let ev = msg_event_with_locale(1, ChatKind::Private, Some(1), "hi", Some("pt-BR"));
        assert_eq!(locales.resolve(&ev).locale(), "pt_BR");

        let ev = msg_event_with_locale(1, ChatKind::Private, Some(1), "hi", Some("pt"));
        assert_eq!(locales.resolve(&ev).locale(), "pt_BR");

        let ev = msg_event_with_locale(1, ChatKind::Private, Some(1), "hi", Some("de"));
        assert_eq!(locales.resolve(&ev).locale(), "en_US");

        let ev = msg_event_with_locale(1, ChatKind::Private, Some(1), "hi", None);
        assert_eq!(locales.resolve(&ev).locale(), "en_US");
    }

    #[test]
    fn formats_named_placeholders() {
        let locales = Locales::embedded("en_US").unwrap();
        let ev = msg_event_with_locale(1, ChatKind::Private, Some(1), "hi", None);
        let strings = locales.resolve(&ev);

        let out = strings.format("user_banned", &[("name", "alice"), ("id", "42")]);
        assert!(out.contains("alice"), "got: {out}");
        assert!(out.contains("42"), "got: {out}");
    }

    #[test]
    #[should_panic(expected = "missing localization key")]
    fn missing_key_is_loud_in_tests() {
        let locales = Locales::embedded("en_US").unwrap();
        let ev = msg_event_with_locale(1, ChatKind::Private, Some(1), "hi", None);
        let _ = locales.resolve(&ev).text("no_such_key");
    }
}
