//! Translation tables and message resolution.
//!
//! Tables are loaded once at startup and are read-only afterwards, so a
//! `Translations` can be shared behind an `Arc` by any number of requests.
//! Resolution never fails: a key missing from the requested language falls
//! back to the default language and finally to the key itself.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Name of the per-language file inside a locales directory.
pub const TRANSLATION_FILE: &str = "translation.json";

const EMBEDDED: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/translation.json")),
    ("id", include_str!("../locales/id/translation.json")),
];

#[derive(Debug, thiserror::Error)]
pub enum I18nError {
    #[error("failed to read translations from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid translation file for `{language}`: {source}")]
    Parse {
        language: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("translation file for `{language}` must contain a JSON object")]
    NotAnObject { language: String },
    #[error("no translations loaded for default language `{0}`")]
    MissingDefault(String),
}

#[derive(Debug, Clone)]
pub struct Translations {
    default_language: String,
    tables: HashMap<String, HashMap<String, String>>,
}

impl Translations {
    /// Empty table set. Use [`Translations::add_json`] to fill it.
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: normalize_tag(&default_language.into()),
            tables: HashMap::new(),
        }
    }

    /// Tables compiled into the binary (`en`, `id`).
    pub fn embedded(default_language: &str) -> Result<Self, I18nError> {
        let mut translations = Self::new(default_language);
        for (language, source) in EMBEDDED {
            translations.add_json(language, source)?;
        }
        translations.ensure_default()?;
        Ok(translations)
    }

    /// Load every `<dir>/<lng>/translation.json`.
    pub fn load_dir(dir: &Path, default_language: &str) -> Result<Self, I18nError> {
        let entries = fs::read_dir(dir).map_err(|source| I18nError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut translations = Self::new(default_language);
        for entry in entries {
            let entry = entry.map_err(|source| I18nError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let file = entry.path().join(TRANSLATION_FILE);
            if !file.is_file() {
                continue;
            }
            let language = entry.file_name().to_string_lossy().into_owned();
            let source = fs::read_to_string(&file).map_err(|source| I18nError::Io {
                path: file.clone(),
                source,
            })?;
            translations.add_json(&language, &source)?;
            tracing::debug!(language = %language, path = %file.display(), "Loaded translations");
        }
        translations.ensure_default()?;
        Ok(translations)
    }

    /// Merge a nested JSON document into the table for `language`.
    ///
    /// Nested objects become dotted keys: `{"errors": {"not_found": ".."}}`
    /// is stored as `errors.not_found`.
    pub fn add_json(&mut self, language: &str, source: &str) -> Result<(), I18nError> {
        let language = normalize_tag(language);
        let value: Value = serde_json::from_str(source).map_err(|source| I18nError::Parse {
            language: language.clone(),
            source,
        })?;
        if !value.is_object() {
            return Err(I18nError::NotAnObject { language });
        }
        let table = self.tables.entry(language).or_default();
        flatten_into(String::new(), &value, table);
        Ok(())
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Loaded languages, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }

    /// Canonical loaded tag matching `tag` exactly or by its primary subtag.
    pub fn supported(&self, tag: &str) -> Option<&str> {
        candidate_tags(tag)
            .into_iter()
            .find_map(|candidate| self.tables.get_key_value(&candidate).map(|(k, _)| k.as_str()))
    }

    /// Resolve `key` for `language`, falling back to the default language and
    /// then to the key itself.
    pub fn resolve(&self, language: Option<&str>, key: &str) -> String {
        self.resolve_with(language, key, &[])
    }

    /// Like [`Translations::resolve`], substituting `{{name}}` placeholders.
    pub fn resolve_with(&self, language: Option<&str>, key: &str, vars: &[(&str, &str)]) -> String {
        match self.lookup(language, key) {
            Some(template) => interpolate(template, vars),
            None => key.to_string(),
        }
    }

    fn lookup(&self, language: Option<&str>, key: &str) -> Option<&str> {
        let requested = language.into_iter().flat_map(candidate_tags);
        requested
            .chain(std::iter::once(self.default_language.clone()))
            .find_map(|tag| self.tables.get(&tag).and_then(|table| table.get(key)))
            .map(String::as_str)
    }

    fn ensure_default(&self) -> Result<(), I18nError> {
        if self.tables.contains_key(&self.default_language) {
            Ok(())
        } else {
            Err(I18nError::MissingDefault(self.default_language.clone()))
        }
    }
}

fn flatten_into(prefix: String, value: &Value, table: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                let key = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                flatten_into(key, child, table);
            }
        }
        Value::String(text) => {
            table.insert(prefix, text.clone());
        }
        Value::Number(_) | Value::Bool(_) => {
            table.insert(prefix, value.to_string());
        }
        Value::Null | Value::Array(_) => {
            tracing::debug!(key = %prefix, "Skipping non-scalar translation value");
        }
    }
}

/// `id-ID` -> [`id-id`, `id`]; `en` -> [`en`].
fn candidate_tags(tag: &str) -> Vec<String> {
    let normalized = normalize_tag(tag);
    if normalized.is_empty() {
        return Vec::new();
    }
    let mut candidates = vec![normalized.clone()];
    if let Some(primary) = normalized.split('-').next() {
        if primary != normalized {
            candidates.push(primary.to_string());
        }
    }
    candidates
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}

fn interpolate(template: &str, vars: &[(&str, &str)]) -> String {
    if vars.is_empty() || !template.contains("{{") {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };
        let name = after[..end].trim();
        match vars.iter().find(|(var, _)| *var == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}
