use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::PathPatternError;

lazy_static! {
    static ref PATTERN: Regex = Regex::new(r"\{(\p{Ll}+)=([^}]+)\}").unwrap();
}

/// Expands `{name=value}` patterns in destination paths.
///
/// - `d`: the current local time formatted with the strftime pattern `value`
/// - `e`: the value of environment variable `value`
/// - `f`: the content of the file at `value`
#[derive(Debug, Default, Clone, Copy)]
pub struct PathDecoder;

impl PathDecoder {
    pub fn decode(&self, path: &str) -> Result<String, PathPatternError> {
        self.decode_at(path, Local::now())
    }

    /// Like [`decode`](Self::decode) with a fixed clock.
    pub fn decode_at(&self, path: &str, now: DateTime<Local>) -> Result<String, PathPatternError> {
        let mut out = String::with_capacity(path.len());
        let mut previous = 0;
        for caps in PATTERN.captures_iter(path) {
            let (Some(whole), Some(name), Some(value)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            out.push_str(&path[previous..whole.start()]);
            out.push_str(&self.expand(name.as_str(), value.as_str(), &now)?);
            previous = whole.end();
        }
        out.push_str(&path[previous..]);
        Ok(out)
    }

    /// Decodes `path` then applies `extension`.
    pub fn decode_with(
        &self,
        path: &str,
        extension: &ExtensionBuilder,
    ) -> Result<String, PathPatternError> {
        Ok(extension.apply(&self.decode(path)?))
    }

    fn expand(
        &self,
        name: &str,
        value: &str,
        now: &DateTime<Local>,
    ) -> Result<String, PathPatternError> {
        match name {
            "d" => format_date(value, now),
            "e" => std::env::var(value).map_err(|_| PathPatternError::MissingEnvVar {
                name: value.to_string(),
            }),
            "f" => read_file(value),
            other => Err(PathPatternError::UnknownPattern {
                name: other.to_string(),
            }),
        }
    }
}

fn format_date(value: &str, now: &DateTime<Local>) -> Result<String, PathPatternError> {
    let items: Vec<Item<'_>> = StrftimeItems::new(value).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(PathPatternError::InvalidDatePattern {
            value: value.to_string(),
        });
    }
    Ok(now.format_with_items(items.into_iter()).to_string())
}

fn read_file(value: &str) -> Result<String, PathPatternError> {
    let path = Path::new(value);
    if !path.is_file() {
        return Err(PathPatternError::MissingFile {
            path: value.to_string(),
        });
    }
    std::fs::read_to_string(path).map_err(|e| PathPatternError::UnreadableFile {
        path: value.to_string(),
        reason: e.to_string(),
    })
}

/// Appends an extension to paths whose file name has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionBuilder {
    extension: String,
}

impl ExtensionBuilder {
    /// `extension` is given without its leading dot, e.g. `sql.gz`.
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    pub fn has_extension(path: &str) -> bool {
        Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().contains('.'))
            .unwrap_or(false)
    }

    pub fn apply(&self, path: &str) -> String {
        if Self::has_extension(path) {
            path.to_string()
        } else {
            format!("{path}.{}", self.extension)
        }
    }
}
