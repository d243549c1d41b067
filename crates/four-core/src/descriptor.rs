//! Descriptor (`.four`) parsing.
//!
//! The descriptor is line oriented. Each line is classified by the current
//! [`LineState`]:
//!
//! | state | line handling |
//! |---|---|
//! | `Directives` | trimmed; blank and `->` comment lines skipped; one directive per line |
//! | `StringExport` | raw line appended to an open multi-line string until a line ends in its closing marker (`"]`, or `"]]` for `string[...]`) |
//! | `Payload` | raw line appended to the payload, forever |
//!
//! `DEFINE` moves the parser into `Payload` and nothing moves it back out,
//! so directive-looking lines after it are payload text.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{FourError, Result};
use crate::project::{ExportValue, FileCopy, ProjectModel, normalize_path, sanitize_name};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Marker that starts a comment line.
pub const COMMENT_MARKER: &str = "->";

/// Marker that closes a string literal.
const STRING_CLOSE: &str = "\"]";
/// Marker that closes a string literal written as `name[string["..."]]`.
const NESTED_STRING_CLOSE: &str = "\"]]";

/// Type tags that may also be written inside the brackets, e.g. `n[numero[42]]`.
const NESTED_TAGS: [&str; 4] = ["string", "numero", "float", "bool"];

static PROJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^PROJECT\s+"([^"]+)"$"#).unwrap());
static CONFIGURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^CONFIGURE\[\s*"([^"]+)"\s*,\s*"([^"]*)"\s*\]$"#).unwrap()
});
static EXPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^EXPORT\s+(\w+)(?:\s+(string|numero|float|bool))?\s*\[(.*)$").unwrap()
});
static FOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^FOLDER\s+"([^"]+)"$"#).unwrap());
static FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^FILE\s+"([^"]+)"\s+"([^"]+)"$"#).unwrap());
static DEFINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^DEFINE\s+(\w+)$").unwrap());
static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());
static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+(\.\d*)?$").unwrap());

/// Decode descriptor bytes, tolerating a BOM and legacy Windows encodings.
///
/// UTF-8 is tried first. Anything that is not valid UTF-8 is read as
/// Windows-1252, with its five undefined bytes passed through as the
/// matching ISO-8859-1 code points, so decoding never fails.
pub fn decode_source(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            tracing::debug!("descriptor is not UTF-8, decoding as Windows-1252");
            bytes.iter().copied().map(windows_1252).collect()
        }
    }
}

fn windows_1252(byte: u8) -> char {
    const HIGH: [char; 32] = [
        '€', '\u{81}', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\u{8D}', 'Ž',
        '\u{8F}', '\u{90}', '‘', '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ',
        '\u{9D}', 'ž', 'Ÿ',
    ];
    match byte {
        0x80..=0x9F => HIGH[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

/// Read, decode and parse a descriptor file.
///
/// # Errors
///
/// Returns [`FourError::FileNotFound`] if `path` does not exist, any other
/// I/O error as [`FourError::Io`], and parse errors from [`parse`].
pub fn parse_file(path: &Path) -> Result<ProjectModel> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FourError::FileNotFound(path.to_path_buf()),
        _ => FourError::Io(e),
    })?;
    parse(&decode_source(&bytes))
}

/// Parse descriptor text into a [`ProjectModel`].
///
/// # Errors
///
/// Returns [`FourError::Syntax`] for malformed or unknown directives and
/// [`FourError::DuplicateProject`] for a second `PROJECT` line.
pub fn parse(source: &str) -> Result<ProjectModel> {
    let mut parser = DescriptorParser::default();
    for (index, line) in source.lines().enumerate() {
        parser.feed(index + 1, line)?;
    }
    Ok(parser.finish())
}

/// Where the parser is within the descriptor.
#[derive(Debug, Default)]
enum LineState {
    #[default]
    Directives,
    StringExport {
        name: String,
        pieces: Vec<String>,
        opened_at: usize,
        close: &'static str,
    },
    Payload,
}

#[derive(Debug, Default)]
struct DescriptorParser {
    model: ProjectModel,
    state: LineState,
}

impl DescriptorParser {
    fn feed(&mut self, line_no: usize, raw: &str) -> Result<()> {
        match &mut self.state {
            LineState::Payload => {
                self.model.payload.push_str(raw);
                self.model.payload.push('\n');
                Ok(())
            }
            LineState::StringExport { pieces, close, .. } => {
                match raw.trim_end().strip_suffix(*close) {
                    Some(tail) => {
                        if !tail.is_empty() {
                            pieces.push(tail.to_string());
                        }
                        self.close_string_export();
                    }
                    None => pieces.push(raw.to_string()),
                }
                Ok(())
            }
            LineState::Directives => {
                let line = raw.trim();
                if line.is_empty() || line.starts_with(COMMENT_MARKER) {
                    return Ok(());
                }
                self.directive(line_no, line)
            }
        }
    }

    fn finish(mut self) -> ProjectModel {
        if let LineState::StringExport { name, opened_at, .. } = &self.state {
            tracing::warn!(
                export = %name,
                line = opened_at,
                "string export never closed, keeping collected text"
            );
            self.close_string_export();
        }
        self.model
    }

    fn close_string_export(&mut self) {
        if let LineState::StringExport { name, pieces, .. } = std::mem::take(&mut self.state) {
            self.model
                .exports
                .insert(name, ExportValue::Str(pieces.join("\n")));
        }
    }

    fn directive(&mut self, line_no: usize, line: &str) -> Result<()> {
        let keyword = line
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or_default();

        match keyword {
            "PROJECT" => self.project(line_no, line),
            "CONFIGURE" => self.configure(line_no, line),
            "EXPORT" => self.export(line_no, line),
            "FOLDER" => {
                let caps = FOLDER_RE
                    .captures(line)
                    .ok_or_else(|| FourError::syntax(line_no, "FOLDER", "expected FOLDER \"<path>\""))?;
                self.model.folders.push(normalize_path(&caps[1]));
                Ok(())
            }
            "FILE" => {
                let caps = FILE_RE.captures(line).ok_or_else(|| {
                    FourError::syntax(line_no, "FILE", "expected FILE \"<source>\" \"<dest>\"")
                })?;
                self.model.files.push(FileCopy {
                    source: normalize_path(&caps[1]),
                    dest: normalize_path(&caps[2]),
                });
                Ok(())
            }
            "DEFINE" => {
                let caps = DEFINE_RE
                    .captures(line)
                    .ok_or_else(|| FourError::syntax(line_no, "DEFINE", "expected DEFINE <name>"))?;
                self.model.entry = Some(caps[1].to_string());
                self.state = LineState::Payload;
                Ok(())
            }
            _ => {
                let shown = if keyword.is_empty() {
                    line.split_whitespace().next().unwrap_or(line)
                } else {
                    keyword
                };
                Err(FourError::syntax(line_no, shown, "unknown directive"))
            }
        }
    }

    fn project(&mut self, line_no: usize, line: &str) -> Result<()> {
        if self.model.name.is_some() {
            return Err(FourError::DuplicateProject { line: line_no });
        }
        let caps = PROJECT_RE
            .captures(line)
            .ok_or_else(|| FourError::syntax(line_no, "PROJECT", "expected PROJECT \"<name>\""))?;
        self.model.name = Some(sanitize_name(&caps[1]));
        Ok(())
    }

    fn configure(&mut self, line_no: usize, line: &str) -> Result<()> {
        let caps = CONFIGURE_RE.captures(line).ok_or_else(|| {
            FourError::syntax(line_no, "CONFIGURE", "expected CONFIGURE[\"<key>\", \"<value>\"]")
        })?;
        let key = &caps[1];
        let value = &caps[2];

        let value = match (key, self.model.exports.get(value)) {
            ("readme", Some(export)) => export.to_string(),
            _ => value.to_string(),
        };
        self.model.config.set(key, value);
        Ok(())
    }

    fn export(&mut self, line_no: usize, line: &str) -> Result<()> {
        let caps = EXPORT_RE
            .captures(line)
            .ok_or_else(|| FourError::syntax(line_no, "EXPORT", "expected EXPORT <name>[<value>]"))?;
        let name = caps[1].to_string();
        let mut tag = caps.get(2).map(|m| m.as_str());
        let mut body = caps.get(3).map_or("", |m| m.as_str());
        let mut close = STRING_CLOSE;

        if let (None, Some((nested, inner))) = (tag, nested_tag(body)) {
            tag = Some(nested);
            if nested == "string" {
                body = inner;
                close = NESTED_STRING_CLOSE;
            } else {
                body = inner
                    .strip_suffix(']')
                    .ok_or_else(|| FourError::syntax(line_no, "EXPORT", "missing closing ']]'"))?;
            }
        }

        let value = match tag {
            Some("string") => return self.string_export(line_no, name, body, close),
            None if body.starts_with('"') => return self.string_export(line_no, name, body, close),
            Some("numero") => ExportValue::Int(parse_integer(line_no, scalar_body(line_no, body)?)?),
            Some("float") => ExportValue::Float(parse_decimal(line_no, scalar_body(line_no, body)?)?),
            Some("bool") => ExportValue::Bool(parse_bool(line_no, scalar_body(line_no, body)?)?),
            _ => infer_scalar(line_no, scalar_body(line_no, body)?)?,
        };
        self.model.exports.insert(name, value);
        Ok(())
    }

    /// `body` is everything after the opening `[`, quote included. `close`
    /// ends the literal, on this line or a later one.
    fn string_export(
        &mut self,
        line_no: usize,
        name: String,
        body: &str,
        close: &'static str,
    ) -> Result<()> {
        let Some(rest) = body.strip_prefix('"') else {
            return Err(FourError::syntax(line_no, "EXPORT", "expected a quoted string literal"));
        };

        if let Some(text) = rest.strip_suffix(close) {
            self.model.exports.insert(name, ExportValue::Str(text.to_string()));
            return Ok(());
        }

        let mut pieces = Vec::new();
        if !rest.is_empty() {
            pieces.push(rest.to_string());
        }
        self.state = LineState::StringExport {
            name,
            pieces,
            opened_at: line_no,
            close,
        };
        Ok(())
    }
}

/// Split a `numero[42]]`-style body into its tag and the text after the
/// inner `[`.
fn nested_tag(body: &str) -> Option<(&'static str, &str)> {
    NESTED_TAGS.into_iter().find_map(|tag| {
        body.strip_prefix(tag)?
            .strip_prefix('[')
            .map(|inner| (tag, inner))
    })
}

/// Strip the closing `]` of a scalar literal.
fn scalar_body(line_no: usize, body: &str) -> Result<&str> {
    body.strip_suffix(']')
        .map(str::trim)
        .ok_or_else(|| FourError::syntax(line_no, "EXPORT", "missing closing ']'"))
}

fn parse_integer(line_no: usize, text: &str) -> Result<i64> {
    if !INTEGER_RE.is_match(text) {
        return Err(FourError::syntax(line_no, "EXPORT", format!("'{text}' is not an integer")));
    }
    text.parse()
        .map_err(|e| FourError::syntax(line_no, "EXPORT", format!("'{text}': {e}")))
}

fn parse_decimal(line_no: usize, text: &str) -> Result<f64> {
    if !DECIMAL_RE.is_match(text) {
        return Err(FourError::syntax(line_no, "EXPORT", format!("'{text}' is not a decimal")));
    }
    text.parse()
        .map_err(|e| FourError::syntax(line_no, "EXPORT", format!("'{text}': {e}")))
}

fn parse_bool(line_no: usize, text: &str) -> Result<bool> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(FourError::syntax(line_no, "EXPORT", format!("'{text}' is not true or false"))),
    }
}

/// Untagged, unquoted literal: boolean, then integer, then decimal.
fn infer_scalar(line_no: usize, text: &str) -> Result<ExportValue> {
    if let Ok(b) = parse_bool(line_no, text) {
        return Ok(ExportValue::Bool(b));
    }
    if INTEGER_RE.is_match(text) {
        return parse_integer(line_no, text).map(ExportValue::Int);
    }
    if DECIMAL_RE.is_match(text) {
        return parse_decimal(line_no, text).map(ExportValue::Float);
    }
    Err(FourError::syntax(
        line_no,
        "EXPORT",
        format!("cannot infer the type of '{text}'"),
    ))
}
