//! Wildcard re-export rewriting
//!
//! Generated glue ends with lines such as
//!
//! ```text
//! export * from "./lz4.internal.js";
//! ```
//!
//! which leak every `__wbg_*` helper of the internal module into the public
//! API. [`ExportRewriter`] replaces each of them with an explicit list of the
//! public top-level declarations found in the referenced module.
//!
//! Declarations are found with a small lexer rather than pattern matching:
//! comments, string, template and regular-expression literals are skipped and
//! only `export` at nesting depth zero is considered.

use std::collections::HashSet;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::SlimError;
use crate::infra::{FileSystem, RealFileSystem};

use super::GlueSource;

/// File-name suffixes that mark a module as internal
pub const INTERNAL_MODULE_SUFFIXES: &[&str] = &[".internal.js", ".internal.mjs"];

/// Leading character of implementation-private names
pub const PRIVATE_PREFIX: char = '_';

/// Declaration keywords whose names are exported
const DECLARATION_KEYWORDS: &[&str] = &["const", "function", "class"];

/// Keywords after which a `/` starts a regular expression
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// A wildcard re-export of an internal module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReExportDirective {
    /// Byte range of the statement line, without its terminator
    pub span: Range<usize>,
    /// Quote character around the path
    pub quote: char,
    /// Path as written in the statement
    pub path: String,
}

/// Parse one line as `export * from "<path>.internal.(m)js";`
///
/// Returns the quote character and the referenced path.
///
/// # Examples
///
/// ```
/// use wasm_inline_slim::glue::parse_reexport;
///
/// assert_eq!(
///     parse_reexport("export * from './lz4.internal.js';"),
///     Some(('\'', "./lz4.internal.js"))
/// );
/// assert_eq!(parse_reexport("export * from './lz4.js';"), None);
/// ```
pub fn parse_reexport(line: &str) -> Option<(char, &str)> {
    let rest = line.trim().strip_prefix("export")?;
    let rest = strip_required_whitespace(rest)?.strip_prefix('*')?;
    let rest = strip_required_whitespace(rest)?.strip_prefix("from")?;
    let rest = strip_required_whitespace(rest)?;

    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &rest[1..];
    let close = rest.find(quote)?;
    let path = &rest[..close];

    if path.is_empty() || path.chars().any(char::is_whitespace) {
        return None;
    }
    if !INTERNAL_MODULE_SUFFIXES
        .iter()
        .any(|suffix| path.ends_with(suffix))
    {
        return None;
    }

    let tail = &rest[close + 1..];
    let tail = tail.strip_prefix(';').unwrap_or(tail);
    if !tail.trim().is_empty() {
        return None;
    }

    Some((quote, path))
}

fn strip_required_whitespace(s: &str) -> Option<&str> {
    let trimmed = s.trim_start();
    (trimmed.len() < s.len()).then_some(trimmed)
}

/// Locate every wildcard re-export line in `text`
pub fn find_reexports(text: &str) -> Vec<ReExportDirective> {
    let mut directives = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let body = line
            .strip_suffix('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or(line);
        if let Some((quote, path)) = parse_reexport(body) {
            directives.push(ReExportDirective {
                span: offset..offset + body.len(),
                quote,
                path: path.to_string(),
            });
        }
        offset += line.len();
    }

    directives
}

/// Render an explicit named re-export
///
/// ```
/// use wasm_inline_slim::glue::format_named_exports;
///
/// let names = vec!["compress".to_string(), "decompress".to_string()];
/// assert_eq!(
///     format_named_exports(&names, '"', "./lz4.internal.js"),
///     "export {\n  compress,\n  decompress,\n} from \"./lz4.internal.js\";"
/// );
/// ```
pub fn format_named_exports(names: &[String], quote: char, path: &str) -> String {
    let mut out = String::from("export {\n");
    for name in names {
        out.push_str("  ");
        out.push_str(name);
        out.push_str(",\n");
    }
    out.push_str("} from ");
    out.push(quote);
    out.push_str(path);
    out.push(quote);
    out.push(';');
    out
}

/// Public top-level `const`/`function`/`class` names of a module
///
/// Names starting with `_` are skipped. Each name appears once, in order of
/// first declaration.
///
/// # Examples
///
/// ```
/// use wasm_inline_slim::glue::scan_exports;
///
/// let module = "export function foo() {}\nexport const _bar = 1;\nexport class Baz {}\n";
/// assert_eq!(scan_exports(module), ["foo", "Baz"]);
/// ```
pub fn scan_exports(source: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    Scanner::new(source)
        .declarations()
        .into_iter()
        .filter(|name| !name.starts_with(PRIVATE_PREFIX))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Byte-level JavaScript scanner that tracks nesting and skips literals
struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Open `{`, `(`, `[` and template substitutions (`$`)
    nesting: Vec<u8>,
    regex_allowed: bool,
    after_dot: bool,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            nesting: Vec::new(),
            regex_allowed: true,
            after_dot: false,
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn declarations(mut self) -> Vec<&'a str> {
        let mut names = Vec::new();

        while let Some(b) = self.peek(0) {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment(),
                b'/' if self.regex_allowed && self.skip_regex() => {
                    self.regex_allowed = false;
                    self.after_dot = false;
                }
                b'"' | b'\'' => {
                    self.skip_string(b);
                    self.regex_allowed = false;
                    self.after_dot = false;
                }
                b'`' => {
                    self.pos += 1;
                    self.skip_template();
                    self.regex_allowed = false;
                    self.after_dot = false;
                }
                b'{' | b'(' | b'[' => {
                    self.nesting.push(b);
                    self.pos += 1;
                    self.regex_allowed = true;
                    self.after_dot = false;
                }
                b'}' => {
                    self.pos += 1;
                    if self.nesting.pop() == Some(b'$') {
                        self.skip_template();
                    }
                    self.regex_allowed = false;
                    self.after_dot = false;
                }
                b')' | b']' => {
                    self.nesting.pop();
                    self.pos += 1;
                    self.regex_allowed = false;
                    self.after_dot = false;
                }
                b'0'..=b'9' => {
                    self.skip_number();
                    self.regex_allowed = false;
                    self.after_dot = false;
                }
                b if is_ident_byte(b) => {
                    let was_after_dot = self.after_dot;
                    let ident = self.read_ident();
                    self.after_dot = false;
                    self.regex_allowed = EXPRESSION_KEYWORDS.contains(&ident);

                    if ident == "export" && !was_after_dot && self.nesting.is_empty() {
                        if let Some(name) = self.declaration_name() {
                            names.push(name);
                        }
                    }
                }
                b'.' => {
                    self.pos += 1;
                    self.regex_allowed = true;
                    self.after_dot = true;
                }
                _ => {
                    self.pos += 1;
                    self.regex_allowed = true;
                    self.after_dot = false;
                }
            }
        }

        names
    }

    /// Read the name declared after `export`, if it is a recognized kind
    fn declaration_name(&mut self) -> Option<&'a str> {
        let start = self.pos;
        self.skip_trivia();

        let keyword = self.read_ident();
        if !DECLARATION_KEYWORDS.contains(&keyword) {
            self.pos = start;
            return None;
        }

        self.skip_trivia();
        if keyword == "function" && self.peek(0) == Some(b'*') {
            self.pos += 1;
            self.skip_trivia();
        }

        let name = self.read_ident();
        self.regex_allowed = false;
        (!name.is_empty()).then_some(name)
    }

    fn read_ident(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek(0).is_some_and(|b| is_ident_byte(b) || b.is_ascii_digit()) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(0), self.peek(1)) {
                (Some(b' ' | b'\t' | b'\r' | b'\n'), _) => self.pos += 1,
                (Some(b'/'), Some(b'/')) => self.skip_line_comment(),
                (Some(b'/'), Some(b'*')) => self.skip_block_comment(),
                _ => return,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while self.peek(0).is_some_and(|b| b != b'\n') {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while let Some(b) = self.peek(0) {
            if b == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }

    fn skip_string(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            self.pos += 1;
            match b {
                b'\\' => self.pos += 1,
                b'\n' => return,
                _ if b == quote => return,
                _ => {}
            }
        }
    }

    /// Skip template text up to the closing backtick or the next `${`
    fn skip_template(&mut self) {
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    return;
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.nesting.push(b'$');
                    self.regex_allowed = true;
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Skip a regular-expression literal; false leaves the position unchanged
    fn skip_regex(&mut self) -> bool {
        let mut i = self.pos + 1;
        let mut in_class = false;

        loop {
            match self.bytes.get(i) {
                None | Some(b'\n') => return false,
                Some(b'\\') => i += 2,
                Some(b'[') => {
                    in_class = true;
                    i += 1;
                }
                Some(b']') => {
                    in_class = false;
                    i += 1;
                }
                Some(b'/') if !in_class => {
                    i += 1;
                    break;
                }
                Some(_) => i += 1,
            }
        }

        while self.bytes.get(i).is_some_and(|b| b.is_ascii_alphabetic()) {
            i += 1;
        }
        self.pos = i;
        true
    }

    fn skip_number(&mut self) {
        while self
            .peek(0)
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_')
        {
            self.pos += 1;
        }
    }
}

/// Identifier start byte; non-ASCII bytes are taken as part of a name
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

/// Resolve a re-exported path against the directory of the glue file
pub fn resolve_internal_path(glue_dir: &Path, path: &str) -> PathBuf {
    glue_dir.join(path).components().collect()
}

/// Result of rewriting a glue file's re-exports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRewrite {
    /// Rewritten text
    pub text: String,
    /// Number of wildcard statements replaced
    pub rewritten: usize,
}

/// Replaces wildcard re-exports of internal modules with named exports
pub struct ExportRewriter<FS: FileSystem = RealFileSystem> {
    fs: FS,
}

impl ExportRewriter<RealFileSystem> {
    /// Rewriter reading internal modules from disk
    pub fn new() -> Self {
        Self::with_fs(RealFileSystem)
    }
}

impl Default for ExportRewriter<RealFileSystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl<FS: FileSystem> ExportRewriter<FS> {
    /// Rewriter with a custom filesystem
    pub fn with_fs(fs: FS) -> Self {
        Self { fs }
    }

    /// Rewrite every wildcard re-export in `source`
    ///
    /// Text outside the rewritten statements is preserved byte-for-byte. A
    /// source without wildcard re-exports comes back unchanged.
    ///
    /// # Errors
    /// [`SlimError::Io`] when a referenced internal module cannot be read.
    pub fn rewrite(&self, source: &GlueSource) -> Result<ExportRewrite, SlimError> {
        let text = source.text();
        let directives = find_reexports(text);

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for directive in &directives {
            let internal = resolve_internal_path(source.dir(), &directive.path);
            let module = self.fs.read_to_string(&internal).map_err(|e| {
                SlimError::io(format!("reading internal module {}", internal.display()), e)
            })?;

            let names = scan_exports(&module);
            log::debug!(
                "{}: {} public exports from {}",
                source.path().display(),
                names.len(),
                internal.display()
            );

            out.push_str(&text[cursor..directive.span.start]);
            out.push_str(&format_named_exports(&names, directive.quote, &directive.path));
            cursor = directive.span.end;
        }
        out.push_str(&text[cursor..]);

        Ok(ExportRewrite {
            text: out,
            rewritten: directives.len(),
        })
    }
}
