//! Comment extraction from raw source text.
//!
//! `syn` drops ordinary comments, so they are recovered with a small lexer
//! that knows enough about string, raw string, and char literals to avoid
//! false comment starts.

/// Returns the text of every `//` and `/* */` comment, in source order.
///
/// Block comments nest, as in Rust. An unterminated block comment runs to
/// the end of the input.
#[must_use]
pub fn extract(source: &str) -> Vec<String> {
    let bytes = source.as_bytes();
    let mut comments = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let next = bytes.get(i + 1).copied();
        match bytes[i] {
            b'/' if next == Some(b'/') => {
                let end = find_from(bytes, i, b'\n').unwrap_or(bytes.len());
                comments.push(source[i..end].to_string());
                i = end;
            }
            b'/' if next == Some(b'*') => {
                let end = block_comment_end(bytes, i);
                comments.push(source[i..end].to_string());
                i = end;
            }
            b'"' => i = string_end(bytes, i + 1),
            b'\'' => i = char_or_lifetime_end(source, i),
            b'r' | b'b' if !is_ident_byte(i.checked_sub(1).map(|p| bytes[p])) => {
                i = prefixed_literal_end(bytes, i).unwrap_or(i + 1);
            }
            _ => i += 1,
        }
    }
    comments
}

fn find_from(bytes: &[u8], start: usize, needle: u8) -> Option<usize> {
    bytes
        .get(start..)?
        .iter()
        .position(|&b| b == needle)
        .map(|p| start + p)
}

fn is_ident_byte(b: Option<u8>) -> bool {
    b.is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn block_comment_end(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut j = start;
    while j + 1 < bytes.len() {
        match (bytes[j], bytes[j + 1]) {
            (b'/', b'*') => {
                depth += 1;
                j += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                j += 2;
                if depth == 0 {
                    return j;
                }
            }
            _ => j += 1,
        }
    }
    bytes.len()
}

/// End of a `"..."` body starting right after the opening quote.
fn string_end(bytes: &[u8], mut j: usize) -> usize {
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'"' => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

fn char_or_lifetime_end(source: &str, start: usize) -> usize {
    let bytes = source.as_bytes();
    if bytes.get(start + 1) == Some(&b'\\') {
        return find_from(bytes, start + 3, b'\'').map_or(bytes.len(), |p| p + 1);
    }
    let width = source[start + 1..].chars().next().map_or(0, char::len_utf8);
    if width > 0 && bytes.get(start + 1 + width) == Some(&b'\'') {
        start + width + 2
    } else {
        // Lifetime or label.
        start + 1
    }
}

/// Handles `r"..."`, `r#"..."#`, `b"..."`, `br"..."`, and `b'.'`.
fn prefixed_literal_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut j = start;
    if bytes[j] == b'b' {
        j += 1;
        match bytes.get(j) {
            Some(b'"') => return Some(string_end(bytes, j + 1)),
            Some(b'\'') => {
                let body = if bytes.get(j + 1) == Some(&b'\\') { j + 3 } else { j + 2 };
                return find_from(bytes, body, b'\'').map(|p| p + 1);
            }
            Some(b'r') => {}
            _ => return None,
        }
    }
    // At `r`.
    j += 1;
    let hashes = bytes[j..].iter().take_while(|&&b| b == b'#').count();
    j += hashes;
    if bytes.get(j) != Some(&b'"') {
        return None;
    }
    j += 1;
    while j < bytes.len() {
        if bytes[j] == b'"' && bytes[j + 1..].iter().take(hashes).filter(|&&b| b == b'#').count() == hashes {
            return Some(j + 1 + hashes);
        }
        j += 1;
    }
    Some(bytes.len())
}
