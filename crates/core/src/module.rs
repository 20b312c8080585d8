//! go.mod helpers

use std::fs;
use std::path::{Path, PathBuf};

/// Extract the module path from go.mod text.
///
/// Returns an empty string when there is no `module` directive or its argument is
/// badly quoted.
pub fn module_path(buf: &[u8]) -> String {
    let text = String::from_utf8_lossy(buf);

    for raw in text.lines() {
        let line = match raw.find("//") {
            Some(idx) => &raw[..idx],
            None => raw,
        };
        let line = line.trim();

        let Some(rest) = line.strip_prefix("module") else {
            continue;
        };
        // `module` must be followed by whitespace, not `modulefoo`
        let arg = rest.trim();
        if arg.is_empty() || arg.len() == rest.len() {
            continue;
        }

        if arg.starts_with('"') || arg.starts_with('`') {
            return unquote(arg).unwrap_or_default();
        }
        return arg.to_string();
    }

    String::new()
}

/// Go string literal unquoting: raw strings and interpreted strings with the full
/// escape set (`\a \b \f \n \r \t \v \\ \"`, octal `\ooo`, `\xhh`, `\uhhhh`, `\Uhhhhhhhh`)
fn unquote(literal: &str) -> Option<String> {
    if let Some(inner) = literal.strip_prefix('`') {
        let inner = inner.strip_suffix('`')?;
        if inner.contains('`') {
            return None;
        }
        return Some(inner.replace('\r', ""));
    }

    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    // octal and \x escapes produce raw bytes, so decode into bytes and validate at the end
    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return None,
            '\\' => match chars.next()? {
                'a' => out.push(0x07),
                'b' => out.push(0x08),
                'f' => out.push(0x0c),
                'n' => out.push(b'\n'),
                'r' => out.push(b'\r'),
                't' => out.push(b'\t'),
                'v' => out.push(0x0b),
                '\\' => out.push(b'\\'),
                '"' => out.push(b'"'),
                'x' => out.push(u8::try_from(hex_digits(&mut chars, 2)?).ok()?),
                'u' => push_char(&mut out, hex_digits(&mut chars, 4)?)?,
                'U' => push_char(&mut out, hex_digits(&mut chars, 8)?)?,
                first @ '0'..='7' => {
                    let mut value = first.to_digit(8)?;
                    for _ in 0..2 {
                        value = value * 8 + chars.next()?.to_digit(8)?;
                    }
                    out.push(u8::try_from(value).ok()?);
                }
                _ => return None,
            },
            c => push_char(&mut out, c as u32)?,
        }
    }
    String::from_utf8(out).ok()
}

fn hex_digits(chars: &mut std::str::Chars<'_>, count: usize) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..count {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

fn push_char(out: &mut Vec<u8>, code: u32) -> Option<()> {
    let c = char::from_u32(code)?;
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    Some(())
}

/// Find the nearest go.mod at or above `dir`
pub fn find_go_mod(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .map(|ancestor| ancestor.join("go.mod"))
        .find(|candidate| candidate.is_file())
}

/// Module path of the nearest go.mod at or above `dir`, if it declares one
pub fn module_path_for_dir(dir: &Path) -> Option<String> {
    let go_mod = find_go_mod(dir)?;
    let buf = fs::read(&go_mod).ok()?;
    let path = module_path(&buf);
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}
