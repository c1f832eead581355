//! Registry export (`.reg`) parsing
//!
//! Reads the text exports produced by `reg export` / regedit into an
//! in-memory, read-only hive that answers the same questions the live
//! registry would: which subkeys a key has and what a value holds.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const HEADER_V5: &str = "Windows Registry Editor Version 5.00";
const HEADER_V4: &str = "REGEDIT4";

const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// `hex(N):` kinds that carry UTF-16LE text
const REG_SZ: u32 = 1;
const REG_EXPAND_SZ: u32 = 2;

#[derive(Error, Debug)]
pub enum RegFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid text encoding: {0}")]
    Encoding(String),
    #[error("Line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("Line {line}: invalid hex data")]
    HexValue { line: usize },
}

/// Data of a registry value
#[derive(Debug, Clone, PartialEq)]
pub enum RegValue {
    String(String),
    Dword(u32),
    Binary(Vec<u8>),
    /// `hex(N):` data of any other registry type
    Typed { kind: u32, data: Vec<u8> },
}

impl RegValue {
    /// Raw bytes of binary-typed values
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(data) | Self::Typed { data, .. } => Some(data.as_slice()),
            _ => None,
        }
    }

    /// Text of string-typed values
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::String(text) => Some(text.clone()),
            Self::Typed { kind, data } if *kind == REG_SZ || *kind == REG_EXPAND_SZ => {
                let units: Vec<u16> = data
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .take_while(|&unit| unit != 0)
                    .collect();
                String::from_utf16(&units).ok()
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct RegKey {
    children: Vec<String>,
    values: Vec<(String, RegValue)>,
}

/// Read-only registry tree loaded from an export
#[derive(Debug, Clone, Default)]
pub struct RegistryHive {
    /// Keys by lower-cased full path
    keys: HashMap<String, RegKey>,
}

impl RegistryHive {
    /// Load an export from disk
    pub fn load(path: &Path) -> Result<Self, RegFileError> {
        let bytes = std::fs::read(path)?;
        let hive = Self::from_bytes(&bytes)?;
        debug!(path = %path.display(), keys = hive.keys.len(), "Registry export loaded");
        Ok(hive)
    }

    /// Parse an export in UTF-16LE (with BOM) or UTF-8
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RegFileError> {
        let text = if let Some(body) = bytes.strip_prefix(&UTF16LE_BOM) {
            if body.len() % 2 != 0 {
                return Err(RegFileError::Encoding("odd UTF-16 byte count".to_string()));
            }
            let units: Vec<u16> = body
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).map_err(|e| RegFileError::Encoding(e.to_string()))?
        } else {
            let body = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
            String::from_utf8(body.to_vec()).map_err(|e| RegFileError::Encoding(e.to_string()))?
        };
        Self::parse(&text)
    }

    /// Parse export text
    pub fn parse(text: &str) -> Result<Self, RegFileError> {
        let mut hive = Self::default();
        let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

        // Header
        let header = loop {
            match lines.next() {
                Some((_, line)) if line.trim().is_empty() => continue,
                Some((number, line)) => break (number, line.trim()),
                None => {
                    return Err(RegFileError::Syntax {
                        line: 1,
                        message: "empty registry export".to_string(),
                    })
                }
            }
        };
        if header.1 != HEADER_V5 && header.1 != HEADER_V4 {
            return Err(RegFileError::Syntax {
                line: header.0,
                message: format!("unrecognized header: {}", header.1),
            });
        }

        // None while inside a deleted key
        let mut current: Option<String> = None;
        let mut seen_key = false;

        while let Some((number, raw_line)) = lines.next() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            if let Some(inner) = line.strip_prefix('[') {
                let path = inner.strip_suffix(']').ok_or_else(|| RegFileError::Syntax {
                    line: number,
                    message: "unterminated key header".to_string(),
                })?;
                seen_key = true;
                if path.starts_with('-') {
                    current = None;
                } else {
                    current = Some(hive.ensure_key(path));
                }
                continue;
            }

            // Hex data may continue over several lines
            let mut logical = line.to_string();
            if is_hex_assignment(line, number) {
                while logical.ends_with('\\') {
                    logical.pop();
                    match lines.next() {
                        Some((_, next)) => logical.push_str(next.trim()),
                        None => break,
                    }
                }
            }

            if !seen_key {
                return Err(RegFileError::Syntax {
                    line: number,
                    message: "value outside of a key".to_string(),
                });
            }
            let Some(key_path) = current.as_deref() else {
                continue;
            };

            let (name, data) = parse_name(&logical, number)?;
            let Some(value) = parse_data(data, number)? else {
                continue;
            };
            hive.set_value(key_path, name, value);
        }

        Ok(hive)
    }

    pub fn key_exists(&self, path: &str) -> bool {
        self.keys.contains_key(&normalize(path))
    }

    /// Names of the subkeys of `path`, in file order
    pub fn subkey_names(&self, path: &str) -> Option<&[String]> {
        self.keys
            .get(&normalize(path))
            .map(|key| key.children.as_slice())
    }

    /// Value `name` under `path`; `""` names the default value
    pub fn value(&self, path: &str, name: &str) -> Option<&RegValue> {
        self.keys.get(&normalize(path)).and_then(|key| {
            key.values
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    /// Register `path` and every ancestor, returning its normalized form
    fn ensure_key(&mut self, path: &str) -> String {
        let path = path.trim_end_matches('\\');
        let mut parent: Option<String> = None;
        for (end, _) in path
            .match_indices('\\')
            .chain(std::iter::once((path.len(), "")))
        {
            let full = &path[..end];
            let normalized = normalize(full);
            if !self.keys.contains_key(&normalized) {
                self.keys.insert(normalized.clone(), RegKey::default());
                if let Some(parent) = &parent {
                    let name = &full[full.rfind('\\').map_or(0, |i| i + 1)..];
                    if let Some(parent_key) = self.keys.get_mut(parent) {
                        parent_key.children.push(name.to_string());
                    }
                }
            }
            parent = Some(normalized);
        }
        normalize(path)
    }

    fn set_value(&mut self, key_path: &str, name: String, value: RegValue) {
        if let Some(key) = self.keys.get_mut(key_path) {
            match key.values.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
                Some(slot) => slot.1 = value,
                None => key.values.push((name, value)),
            }
        }
    }
}

fn normalize(path: &str) -> String {
    path.trim_end_matches('\\').to_lowercase()
}

/// Whether the data after the value name is `hex:` or `hex(N):`
fn is_hex_assignment(line: &str, number: usize) -> bool {
    parse_name(line, number)
        .map(|(_, data)| data.starts_with("hex"))
        .unwrap_or(false)
}

/// Split a value line into its name and the data after `=`
fn parse_name(line: &str, number: usize) -> Result<(String, &str), RegFileError> {
    let (name, rest) = if let Some(rest) = line.strip_prefix('@') {
        (String::new(), rest)
    } else if line.starts_with('"') {
        parse_quoted(line, number)?
    } else {
        return Err(RegFileError::Syntax {
            line: number,
            message: "expected a value name".to_string(),
        });
    };

    let data = rest
        .trim_start()
        .strip_prefix('=')
        .ok_or_else(|| RegFileError::Syntax {
            line: number,
            message: "expected '=' after value name".to_string(),
        })?;
    Ok((name, data.trim()))
}

/// Parse a quoted string with `\\` and `\"` escapes, returning the rest
fn parse_quoted(input: &str, number: usize) -> Result<(String, &str), RegFileError> {
    let mut text = String::new();
    let mut chars = input.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((text, &input[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped)) => text.push(escaped),
                None => break,
            },
            _ => text.push(c),
        }
    }
    Err(RegFileError::Syntax {
        line: number,
        message: "unterminated string".to_string(),
    })
}

/// Parse value data; `None` for value deletions
fn parse_data(data: &str, number: usize) -> Result<Option<RegValue>, RegFileError> {
    if data == "-" {
        return Ok(None);
    }
    if data.starts_with('"') {
        let (text, rest) = parse_quoted(data, number)?;
        if !rest.trim().is_empty() {
            return Err(RegFileError::Syntax {
                line: number,
                message: "trailing characters after string".to_string(),
            });
        }
        return Ok(Some(RegValue::String(text)));
    }
    if let Some(digits) = data.strip_prefix("dword:") {
        return u32::from_str_radix(digits.trim(), 16)
            .map(|v| Some(RegValue::Dword(v)))
            .map_err(|_| RegFileError::HexValue { line: number });
    }
    if let Some(bytes) = data.strip_prefix("hex:") {
        return parse_hex(bytes, number).map(|b| Some(RegValue::Binary(b)));
    }
    if let Some(typed) = data.strip_prefix("hex(") {
        let (kind, bytes) = typed
            .split_once("):")
            .ok_or(RegFileError::HexValue { line: number })?;
        let kind = u32::from_str_radix(kind, 16).map_err(|_| RegFileError::HexValue { line: number })?;
        let data = parse_hex(bytes, number)?;
        return Ok(Some(RegValue::Typed { kind, data }));
    }
    Err(RegFileError::Syntax {
        line: number,
        message: format!("unsupported value data: {}", data),
    })
}

/// Comma-separated two digit hex bytes
fn parse_hex(bytes: &str, number: usize) -> Result<Vec<u8>, RegFileError> {
    let mut digits = String::new();
    for token in bytes.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if token.len() != 2 {
            return Err(RegFileError::HexValue { line: number });
        }
        digits.push_str(token);
    }
    hex::decode(&digits).map_err(|_| RegFileError::HexValue { line: number })
}
