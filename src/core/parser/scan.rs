//! Lightweight lexical scans over Kotlin/Java source text.
//!
//! Nothing here parses the language. Delimiters are located with a small
//! depth counter that steps over string literals, char literals and comments,
//! and names are picked up with anchored regexes.

use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpackage\s+([A-Za-z_][\w.]*)").expect("package pattern"));

static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bclass\s+(\w+)").expect("class pattern"));

/// `@Test`, optionally followed by other annotations and modifiers, then the
/// declaration keyword and the method name (plain or backtick-quoted).
static TEST_METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"@Test\b(?:\s*\([^)]*\))?(?:\s+@\w+(?:\([^)]*\))?)*(?:\s+(?:public|protected|private|internal|open|override|suspend|final|static))*\s+(?:fun|void)\s+(`[^`\n]+`|\w+)\s*\(",
    )
    .expect("test method pattern")
});

/// What may sit between a test method's `)` and the `{` opening its body:
/// a return type, a `throws` clause, or `= wrapper` / `= wrapper(args)` as
/// in `= runTest {`
static BODY_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?::\s*[\w.?<>, ]+?\s*)?(?:throws\s+[\w.]+(?:\s*,\s*[\w.]+)*\s*)?(?:=\s*[\w.]+\s*(?:\([^()]*\))?\s*)?$",
    )
    .expect("body prefix pattern")
});

/// Start of an expression body: optional return type, then `=`
static EXPRESSION_BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?::\s*[\w.?<>, ]+?\s*)?=\s*").expect("expression body pattern"));

/// Positions of `{`, `}`, `(` and `)` that sit in code rather than in a
/// string, char literal or comment
pub struct DelimiterScanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DelimiterScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::starting_at(text, 0)
    }

    pub fn starting_at(text: &'a str, pos: usize) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos,
        }
    }

    fn skip_string(&self, start: usize) -> usize {
        let bytes = self.bytes;
        if bytes[start..].starts_with(b"\"\"\"") {
            return find_bytes(bytes, start + 3, b"\"\"\"")
                .map(|end| end + 3)
                .unwrap_or(bytes.len());
        }

        let mut i = start + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' | b'\n' => return i + 1,
                _ => i += 1,
            }
        }
        bytes.len()
    }

    fn skip_char_literal(&self, start: usize) -> usize {
        let bytes = self.bytes;
        let limit = (start + 10).min(bytes.len());
        let mut i = start + 1;
        while i < limit {
            match bytes[i] {
                b'\\' => i += 2,
                b'\'' => return i + 1,
                b'\n' => break,
                _ => i += 1,
            }
        }
        // Not a char literal after all (e.g. an apostrophe in odd places)
        start + 1
    }

    /// End of the comment opening at `start`, if one does
    fn comment_end(&self, start: usize) -> Option<usize> {
        let bytes = self.bytes;
        match bytes.get(start + 1) {
            Some(b'/') => Some(find_bytes(bytes, start + 2, b"\n").unwrap_or(bytes.len())),
            Some(b'*') => Some(
                find_bytes(bytes, start + 2, b"*/")
                    .map(|end| end + 2)
                    .unwrap_or(bytes.len()),
            ),
            _ => None,
        }
    }
}

impl Iterator for DelimiterScanner<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.bytes;
        while self.pos < bytes.len() {
            let i = self.pos;
            match bytes[i] {
                b'"' => self.pos = self.skip_string(i),
                b'\'' => self.pos = self.skip_char_literal(i),
                b'/' => self.pos = self.comment_end(i).unwrap_or(i + 1),
                c @ (b'{' | b'}' | b'(' | b')') => {
                    self.pos = i + 1;
                    return Some((i, c));
                }
                _ => self.pos = i + 1,
            }
        }
        None
    }
}

fn find_bytes(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

/// Byte ranges covered by `//` and `/* */` comments
pub fn comment_ranges(text: &str) -> Vec<Range<usize>> {
    let scanner = DelimiterScanner::new(text);
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        i = match bytes[i] {
            b'"' => scanner.skip_string(i),
            b'\'' => scanner.skip_char_literal(i),
            b'/' => match scanner.comment_end(i) {
                Some(end) => {
                    ranges.push(i..end);
                    end
                }
                None => i + 1,
            },
            _ => i + 1,
        };
    }
    ranges
}

/// Find the delimiter that closes the `{` or `(` at byte offset `open`
pub fn find_matching_delimiter(text: &str, open: usize) -> Option<usize> {
    let (open_ch, close_ch) = match text.as_bytes().get(open)? {
        b'{' => (b'{', b'}'),
        b'(' => (b'(', b')'),
        _ => return None,
    };

    let mut depth = 0usize;
    for (pos, ch) in DelimiterScanner::starting_at(text, open) {
        if ch == open_ch {
            depth += 1;
        } else if ch == close_ch {
            depth -= 1;
            if depth == 0 {
                return Some(pos);
            }
        }
    }
    None
}

/// Byte offset of the last `}` that returns brace depth to zero
///
/// For a well-formed file this is the enclosing class's closing brace.
/// Returns `None` when no brace block closes at top level.
pub fn find_last_top_level_close(text: &str) -> Option<usize> {
    let mut depth: i64 = 0;
    let mut last = None;

    for (pos, ch) in DelimiterScanner::new(text) {
        match ch {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    last = Some(pos);
                } else if depth < 0 {
                    // stray closer; restart counting from here
                    depth = 0;
                }
            }
            _ => {}
        }
    }
    last
}

/// First `package a.b.c` declaration
pub fn scan_package_name(code: &str) -> Option<String> {
    PACKAGE_RE
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('.').to_string())
}

/// First `class Name` declaration
pub fn scan_class_name(code: &str) -> Option<String> {
    CLASS_RE
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `@Test` declarations outside comments
fn test_method_captures(code: &str) -> impl Iterator<Item = Captures<'_>> {
    let comments = comment_ranges(code);
    TEST_METHOD_RE.captures_iter(code).filter(move |caps| {
        caps.get(0)
            .is_some_and(|m| !comments.iter().any(|range| range.contains(&m.start())))
    })
}

/// Names declared right after a `@Test` annotation, in source order
pub fn scan_test_method_names(code: &str) -> Vec<String> {
    test_method_captures(code)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Full source of the `@Test` method called `name`, from the annotation
/// through the brace that closes its body, or through the end of its
/// expression body
///
/// Every declaration with that name is tried in order; the first one with a
/// well-formed body wins.
pub fn find_test_method_block<'a>(code: &'a str, name: &str) -> Option<&'a str> {
    test_method_captures(code)
        .filter(|caps| caps.get(1).is_some_and(|m| m.as_str() == name))
        .find_map(|caps| {
            let whole = caps.get(0)?;
            // The match ends just past the parameter list's `(`
            method_block_at(code, whole.start(), whole.end() - 1)
        })
}

fn method_block_at(code: &str, start: usize, params_open: usize) -> Option<&str> {
    let params_close = find_matching_delimiter(code, params_open)?;
    let after_params = params_close + 1;

    let body_open = DelimiterScanner::starting_at(code, after_params)
        .find(|&(_, ch)| ch == b'{')
        .map(|(pos, _)| pos)
        .filter(|&open| BODY_PREFIX_RE.is_match(&code[after_params..open]));
    if let Some(open) = body_open {
        let body_close = find_matching_delimiter(code, open)?;
        return Some(&code[start..=body_close]);
    }

    let expression = EXPRESSION_BODY_RE.find(&code[after_params..])?;
    let end = expression_end(code, after_params + expression.end());
    Some(code[start..end].trim_end())
}

/// End of an expression starting at `from`: the first line break outside
/// any bracket, or a closer that belongs to the enclosing block
fn expression_end(code: &str, from: usize) -> usize {
    let mut depth = 0usize;
    let mut cursor = from;
    for (pos, ch) in DelimiterScanner::starting_at(code, from) {
        if depth == 0 {
            if let Some(nl) = code[cursor..pos].find('\n') {
                return cursor + nl;
            }
        }
        match ch {
            b'(' | b'{' => depth += 1,
            _ if depth == 0 => return pos,
            _ => depth -= 1,
        }
        cursor = pos + 1;
    }
    code[cursor..]
        .find('\n')
        .map(|nl| cursor + nl)
        .unwrap_or(code.len())
}

/// Leading whitespace of the line containing byte offset `pos`
pub fn line_indent_at(text: &str, pos: usize) -> &str {
    let line_start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &text[line_start..];
    let width = line.len() - line.trim_start_matches(|c: char| c == ' ' || c == '\t').len();
    &line[..width]
}
