//! Flat key/value configuration files layered per environment.
//!
//! A file holds `key=value` (or `key: value`) lines under one implicit
//! section. `#` and `;` start comment lines, indented lines continue the
//! previous value. Declaring more than one `[section]` is a format error.
//! Values may reference other keys of the same file as `%(key)s`; `%%` is a
//! literal percent sign.
//!
//! For a base file `config.ini` and environment `prod`, the overlay is
//! `config_prod.ini`; overlay values replace base values key by key.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Name of the section every file implicitly starts in.
const DEFAULT_SECTION: &str = "DEFAULT";

const MAX_INTERPOLATION_DEPTH: usize = 10;

/// A flat string → string mapping with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigMap(BTreeMap<String, String>);

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a single file. A missing file is [`Error::ConfigNotFound`](crate::Error::ConfigNotFound).
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                crate::Error::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                crate::Error::ConfigRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::parse(path, &content)
    }

    /// Parse file content; `path` is only used in error messages.
    pub fn parse(path: &Path, content: &str) -> crate::Result<Self> {
        let mut entries: BTreeMap<String, String> = BTreeMap::new();
        let mut sections: Vec<String> = Vec::new();
        let mut last_key: Option<String> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                // Blank lines end a multi-line value.
                if trimmed.is_empty() {
                    last_key = None;
                }
                continue;
            }

            if raw.starts_with(char::is_whitespace)
                && let Some(key) = &last_key
            {
                if let Some(value) = entries.get_mut(key) {
                    value.push('\n');
                    value.push_str(trimmed);
                }
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or_else(|| format_error(path, line_no, "unterminated section header"))?
                    .trim();
                if name != DEFAULT_SECTION && !sections.iter().any(|s| s == name) {
                    sections.push(name.to_owned());
                }
                if sections.len() > 1 {
                    return Err(crate::Error::MultipleSections {
                        path: path.to_path_buf(),
                        sections,
                    });
                }
                last_key = None;
                continue;
            }

            let split_at = trimmed
                .find(['=', ':'])
                .ok_or_else(|| format_error(path, line_no, "expected `key=value`"))?;
            let key = trimmed[..split_at].trim();
            let value = trimmed[split_at + 1..].trim();

            if key.is_empty() {
                return Err(format_error(path, line_no, "empty key"));
            }
            if entries.contains_key(key) {
                return Err(format_error(
                    path,
                    line_no,
                    &format!("duplicate key `{key}`"),
                ));
            }

            entries.insert(key.to_owned(), value.to_owned());
            last_key = Some(key.to_owned());
        }

        let mut resolved = BTreeMap::new();
        for (key, value) in &entries {
            resolved.insert(key.clone(), interpolate(path, &entries, key, value, 1)?);
        }
        Ok(Self(resolved))
    }

    /// Read `base` and its environment overlay and merge them.
    ///
    /// The base file is required; a missing overlay counts as empty.
    pub fn load_layered(base: &Path, environment: &str) -> crate::Result<Self> {
        let base_map = Self::load(base)?;
        let overlay_path = environment_path(base, environment);
        let overlay = match Self::load(&overlay_path) {
            Ok(map) => map,
            Err(crate::Error::ConfigNotFound { path }) => {
                tracing::debug!(path = %path.display(), "no environment overlay; using base only");
                Self::new()
            }
            Err(e) => return Err(e),
        };
        Ok(merge(base_map, overlay))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Union of both maps; `overlay` wins on key collision.
pub fn merge(base: ConfigMap, overlay: ConfigMap) -> ConfigMap {
    let mut merged = base.0;
    merged.extend(overlay.0);
    ConfigMap(merged)
}

/// `config.ini` + `prod` → `config_prod.ini`.
pub fn environment_path(base: &Path, environment: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match base.extension() {
        Some(ext) => format!("{stem}_{environment}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{environment}"),
    };
    base.with_file_name(file_name)
}

/// Expand `%(name)s` references to other keys of the same file and `%%`
/// to a literal `%`. Any other `%` is an error.
fn interpolate(
    path: &Path,
    entries: &BTreeMap<String, String>,
    key: &str,
    value: &str,
    depth: usize,
) -> crate::Result<String> {
    if depth > MAX_INTERPOLATION_DEPTH {
        return Err(interpolation_error(path, key, "references nest too deeply"));
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];

        if let Some(after) = tail.strip_prefix('%') {
            out.push('%');
            rest = after;
        } else if let Some(reference) = tail.strip_prefix('(') {
            let (name, after) = reference
                .split_once(')')
                .and_then(|(name, after)| Some((name, after.strip_prefix('s')?)))
                .filter(|(name, _)| !name.is_empty())
                .ok_or_else(|| interpolation_error(path, key, "bad `%(name)s` reference"))?;
            let target = entries.get(name).ok_or_else(|| {
                interpolation_error(path, key, &format!("`{name}` is not defined"))
            })?;
            out.push_str(&interpolate(path, entries, key, target, depth + 1)?);
            rest = after;
        } else {
            return Err(interpolation_error(
                path,
                key,
                "`%` must be followed by `%` or `(`",
            ));
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn interpolation_error(path: &Path, key: &str, reason: &str) -> crate::Error {
    crate::Error::ConfigInterpolation {
        path: path.to_path_buf(),
        key: key.to_owned(),
        reason: reason.to_owned(),
    }
}

fn format_error(path: &Path, line: usize, reason: &str) -> crate::Error {
    crate::Error::ConfigFormat {
        path: path.to_path_buf(),
        line,
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> crate::Result<ConfigMap> {
        ConfigMap::parse(Path::new("test.ini"), content)
    }

    #[test]
    fn parses_flat_pairs() {
        let map = parse("db_host = db.internal\nreplicas=3\nmode: fast\n").unwrap();
        assert_eq!(map.get("db_host"), Some("db.internal"));
        assert_eq!(map.get("replicas"), Some("3"));
        assert_eq!(map.get("mode"), Some("fast"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn keeps_key_case() {
        let map = parse("LogLevel=debug").unwrap();
        assert_eq!(map.get("LogLevel"), Some("debug"));
        assert_eq!(map.get("loglevel"), None);
    }

    #[test]
    fn value_may_contain_delimiters() {
        let map = parse("url=http://host:8080/path?a=b").unwrap();
        assert_eq!(map.get("url"), Some("http://host:8080/path?a=b"));
    }

    #[test]
    fn skips_comments_and_blanks() {
        let map = parse("# comment\n; other\n\nkey=value\n").unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn indented_lines_continue_previous_value() {
        let map = parse("hosts=a\n  b\n  c\nnext=1").unwrap();
        assert_eq!(map.get("hosts"), Some("a\nb\nc"));
        assert_eq!(map.get("next"), Some("1"));
    }

    #[test]
    fn single_declared_section_is_accepted() {
        let map = parse("[app]\nkey=value\n").unwrap();
        assert_eq!(map.get("key"), Some("value"));
    }

    #[test]
    fn explicit_default_section_is_the_implicit_one() {
        let map = parse("[DEFAULT]\na=1\n[app]\nb=2\n").unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn two_sections_are_a_format_error() {
        let err = parse("[one]\na=1\n[two]\nb=2\n").unwrap_err();
        assert!(err.is_format(), "got: {err}");
        assert!(matches!(
            err,
            crate::Error::MultipleSections { ref sections, .. } if sections == &["one", "two"]
        ));
    }

    #[test]
    fn line_without_delimiter_is_rejected() {
        let err = parse("just-a-word").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigFormat { line: 1, .. }));
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let err = parse("a=1\na=2").unwrap_err();
        assert!(err.to_string().contains("duplicate key"), "got: {err}");
    }

    #[test]
    fn expands_references_within_the_file() {
        let map = parse("url=postgres://%(host)s:5432/%(db)s\nhost=db.internal\ndb=orders\n")
            .unwrap();
        assert_eq!(map.get("url"), Some("postgres://db.internal:5432/orders"));
    }

    #[test]
    fn nested_references_and_escaped_percent() {
        let map = parse("base=%(host)s:80\nhost=web\nurl=http://%(base)s/?q=100%%\n").unwrap();
        assert_eq!(map.get("url"), Some("http://web:80/?q=100%"));
    }

    #[test]
    fn lone_percent_is_rejected() {
        let err = parse("ratio=50%\n").unwrap_err();
        assert!(err.is_format(), "got: {err}");
        assert!(matches!(err, crate::Error::ConfigInterpolation { ref key, .. } if key == "ratio"));
    }

    #[test]
    fn undefined_reference_is_rejected() {
        let err = parse("url=%(host)s\n").unwrap_err();
        assert!(err.to_string().contains("`host` is not defined"), "got: {err}");
    }

    #[test]
    fn reference_keys_are_case_sensitive() {
        assert!(parse("Host=web\nurl=%(host)s\n").is_err());
    }

    #[test]
    fn cyclic_references_are_rejected() {
        let err = parse("a=%(b)s\nb=%(a)s\n").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigInterpolation { .. }));
    }

    #[test]
    fn environment_path_inserts_suffix_before_extension() {
        assert_eq!(
            environment_path(Path::new("res/config.ini"), "prod"),
            PathBuf::from("res/config_prod.ini")
        );
        assert_eq!(
            environment_path(Path::new("res/settings"), "dev"),
            PathBuf::from("res/settings_dev")
        );
    }

    #[test]
    fn merge_prefers_overlay() {
        let base: ConfigMap = [("a", "1"), ("b", "2")].into_iter().collect();
        let overlay: ConfigMap = [("b", "20"), ("c", "30")].into_iter().collect();
        let merged = merge(base, overlay);
        assert_eq!(merged.get("a"), Some("1"));
        assert_eq!(merged.get("b"), Some("20"));
        assert_eq!(merged.get("c"), Some("30"));
        assert_eq!(merged.len(), 3);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeMap;

        fn map() -> impl Strategy<Value = BTreeMap<String, String>> {
            proptest::collection::btree_map("[a-z]{1,4}", "[a-z0-9]{0,6}", 0..8)
        }

        proptest! {
            #[test]
            fn merge_is_union_with_overlay_precedence(base in map(), overlay in map()) {
                let merged = merge(
                    base.clone().into_iter().collect(),
                    overlay.clone().into_iter().collect(),
                );

                for (k, v) in &overlay {
                    prop_assert_eq!(merged.get(k), Some(v.as_str()));
                }
                for (k, v) in &base {
                    if !overlay.contains_key(k) {
                        prop_assert_eq!(merged.get(k), Some(v.as_str()));
                    }
                }
                let expected: std::collections::BTreeSet<&String> =
                    base.keys().chain(overlay.keys()).collect();
                prop_assert_eq!(merged.len(), expected.len());
            }
        }
    }
}
