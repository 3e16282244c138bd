use std::collections::HashMap;
use std::path::Path;

use crate::error::AcModelError;

/// Context separators of HTK triphone names (`l-c+r`).
pub const LEFT_CONTEXT: char = '-';
pub const RIGHT_CONTEXT: char = '+';

/// Two-way phone substitution table, e.g. SAMPA symbols to names HTK accepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhoneMap {
    forward: HashMap<String, String>,
    reverse: HashMap<String, String>,
}

impl PhoneMap {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::default();
        for (key, value) in pairs {
            map.insert(key.into(), value.into());
        }
        map
    }

    /// One `key value` pair per line; blank lines and `#` comments are skipped.
    pub fn load(path: &Path) -> Result<Self, AcModelError> {
        let data =
            std::fs::read_to_string(path).map_err(|e| AcModelError::io("read phone map", e))?;
        Self::parse(&data, &path.display().to_string())
    }

    pub fn parse(text: &str, source_name: &str) -> Result<Self, AcModelError> {
        let mut map = Self::default();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut columns = line.split_whitespace();
            match (columns.next(), columns.next(), columns.next()) {
                (Some(key), Some(value), None) => map.insert(key.to_string(), value.to_string()),
                _ => {
                    return Err(AcModelError::format(
                        source_name,
                        n + 1,
                        "expected two columns",
                    ))
                }
            }
        }
        Ok(map)
    }

    fn insert(&mut self, key: String, value: String) {
        self.reverse.insert(value.clone(), key.clone());
        self.forward.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.forward.get(key).map(String::as_str)
    }

    pub fn get_reverse(&self, value: &str) -> Option<&str> {
        self.reverse.get(value).map(String::as_str)
    }

    /// Maps one phone; unknown phones pass through unchanged.
    pub fn map_phone<'a>(&'a self, phone: &'a str, reverse: bool) -> &'a str {
        let mapped = if reverse {
            self.get_reverse(phone)
        } else {
            self.get(phone)
        };
        mapped.unwrap_or(phone)
    }

    /// Maps every phone of a possibly context-dependent HMM name.
    pub fn map_name(&self, name: &str, reverse: bool) -> String {
        let mut out = String::with_capacity(name.len());
        let mut phone_start = 0;
        for (i, c) in name.char_indices() {
            if c == LEFT_CONTEXT || c == RIGHT_CONTEXT {
                if i > phone_start {
                    out.push_str(self.map_phone(&name[phone_start..i], reverse));
                }
                out.push(c);
                phone_start = i + c.len_utf8();
            }
        }
        if phone_start < name.len() {
            out.push_str(self.map_phone(&name[phone_start..], reverse));
        }
        out
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// `true` for triphone/biphone names such as `a-b+c`.
pub fn has_context(name: &str) -> bool {
    name.contains(LEFT_CONTEXT) || name.contains(RIGHT_CONTEXT)
}
