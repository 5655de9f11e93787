//! Line-level scanning helpers shared by the parser and suppression handling.

/// Returns the byte index where a `#` comment starts, ignoring `#` inside
/// quoted scalars and `#` glued to a preceding token (`a#b`).
#[must_use]
pub fn find_comment(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') => {
                if b == b'\\' {
                    i += 2;
                    continue;
                }
                if b == b'"' {
                    quote = None;
                }
            }
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => {
                let prev = i.checked_sub(1).map(|p| bytes[p]);
                let at_token_start =
                    prev.map_or(true, |p| matches!(p, b' ' | b'\t' | b'[' | b'{' | b',' | b'\''));
                match b {
                    b'#' if prev.map_or(true, |p| p == b' ' || p == b'\t') => return Some(i),
                    b'"' | b'\'' if at_token_start => quote = Some(b),
                    _ => {}
                }
            }
        }
        i += 1;
    }
    None
}

/// Number of leading indentation bytes (spaces or tabs).
#[must_use]
pub fn leading_ws(s: &str) -> usize {
    s.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}

/// Returns true if the content starts a block sequence item.
#[must_use]
pub fn is_seq_item(s: &str) -> bool {
    s == "-" || s.starts_with("- ") || s.starts_with("-\t")
}

/// Byte positions of a `key: value` split inside a content slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySplit {
    /// End of the key text (exclusive, trailing blanks trimmed).
    pub key_end: usize,
    /// Index of the `:` indicator.
    pub colon: usize,
    /// Start of the value text (equals the slice length when empty).
    pub value: usize,
}

/// Detects a block mapping entry and returns where key and value live.
#[must_use]
pub fn split_key(s: &str) -> Option<KeySplit> {
    let bytes = s.as_bytes();
    let first = *bytes.first()?;
    let colon = match first {
        b'"' | b'\'' => {
            let key_end = quoted_end(s, 0)?;
            let gap = leading_ws(&s[key_end..]);
            let colon = key_end + gap;
            if bytes.get(colon) != Some(&b':') || !is_value_boundary(bytes, colon + 1) {
                return None;
            }
            return Some(finish_split(s, key_end, colon));
        }
        b'[' | b'{' | b'|' | b'>' | b'*' | b'&' | b'!' | b'%' | b'@' | b'`' | b'#' => return None,
        b'-' if is_seq_item(s) => return None,
        b'?' if bytes.len() == 1 || bytes[1] == b' ' => return None,
        _ => (0..bytes.len()).find(|&i| bytes[i] == b':' && is_value_boundary(bytes, i + 1))?,
    };
    let key_end = s[..colon].trim_end().len();
    if key_end == 0 {
        return None;
    }
    Some(finish_split(s, key_end, colon))
}

fn finish_split(s: &str, key_end: usize, colon: usize) -> KeySplit {
    let value = colon + 1 + leading_ws(&s[colon + 1..]);
    KeySplit {
        key_end,
        colon,
        value,
    }
}

fn is_value_boundary(bytes: &[u8], i: usize) -> bool {
    bytes.get(i).map_or(true, |b| *b == b' ' || *b == b'\t')
}

/// Returns the index just past the closing quote of the quoted scalar that
/// starts at `start`, scanning across line breaks.
#[must_use]
pub fn quoted_end(s: &str, start: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let quote = *bytes.get(start)?;
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if quote == b'"' && b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

/// Decodes a quoted scalar, including its surrounding quotes.
#[must_use]
pub fn decode_quoted(raw: &str) -> String {
    if raw.len() < 2 {
        return String::new();
    }
    let quote = raw.as_bytes()[0];
    let folded = fold_lines(&raw[1..raw.len() - 1]);
    if quote == b'\'' {
        folded.replace("''", "'")
    } else {
        unescape(&folded)
    }
}

/// Decodes a mapping key as written in the source.
#[must_use]
pub fn decode_key(raw: &str) -> String {
    if raw.starts_with('"') || raw.starts_with('\'') {
        decode_quoted(raw)
    } else {
        raw.trim().to_string()
    }
}

/// Applies YAML line folding: single breaks become spaces, empty lines
/// become newlines.
fn fold_lines(s: &str) -> String {
    if !s.contains('\n') {
        return s.to_string();
    }
    let lines: Vec<&str> = s.split('\n').collect();
    let last = lines.len() - 1;
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for (i, line) in lines.iter().enumerate() {
        let line = line.trim_end_matches('\r');
        let line = match i {
            0 => line.trim_end(),
            _ if i == last => line.trim_start(),
            _ => line.trim(),
        };
        if i > 0 && line.is_empty() && i != last {
            out.push('\n');
            pending_space = false;
            continue;
        }
        if pending_space {
            out.push(' ');
        }
        out.push_str(line);
        pending_space = true;
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('/') => out.push('/'),
            Some(' ') => out.push(' '),
            Some(kind @ ('x' | 'u' | 'U')) => {
                let width = match kind {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let hex: String = chars.by_ref().take(width).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
