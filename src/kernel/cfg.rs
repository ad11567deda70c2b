//! Kernel `.cfg` fragment lexer
//!
//! Recognizes the line shapes found in `android-base*.cfg` files:
//! - `CONFIG_FOO=y` / `=n` / `=m`
//! - `CONFIG_FOO=123`, `CONFIG_FOO=0x1f`
//! - `CONFIG_FOO="text"`
//! - `# CONFIG_FOO is not set` (same as `=n`)
//!
//! Blank lines and other comments are skipped.

use regex_lite::Regex;
use std::sync::OnceLock;

use vintf_types::{KernelConfigKey, KernelConfigValue, Tristate};

/// A malformed line in a kernel config fragment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct CfgParseError {
    pub line: usize,
    pub message: String,
}

fn assignment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(CONFIG_[A-Za-z0-9_]+)=(.*)$").expect("static pattern"))
}

fn not_set_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#\s*(CONFIG_[A-Za-z0-9_]+) is not set$").expect("static pattern")
    })
}

/// Parse the text of one kernel config fragment, preserving line order.
pub fn parse_kernel_config(text: &str) -> Result<Vec<KernelConfigKey>, CfgParseError> {
    let mut keys = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = not_set_re().captures(line) {
            keys.push(KernelConfigKey::tristate(&caps[1], Tristate::No));
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let caps = assignment_re().captures(line).ok_or_else(|| CfgParseError {
            line: idx + 1,
            message: format!("expected CONFIG_*=value, got '{}'", line),
        })?;
        let value = parse_value(&caps[2]).ok_or_else(|| CfgParseError {
            line: idx + 1,
            message: format!("unsupported value '{}' for {}", &caps[2], &caps[1]),
        })?;
        keys.push(KernelConfigKey {
            name: caps[1].to_string(),
            value,
        });
    }

    Ok(keys)
}

fn parse_value(raw: &str) -> Option<KernelConfigValue> {
    if let Some(t) = Tristate::parse(raw) {
        return Some(KernelConfigValue::Tristate(t));
    }
    if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        return unquote(inner).map(KernelConfigValue::Str);
    }
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok().map(KernelConfigValue::Int);
    }
    raw.parse::<i64>().ok().map(KernelConfigValue::Int)
}

/// Undo `\\` and `\"` escapes; any other escape or a bare `"` is malformed.
fn unquote(inner: &str) -> Option<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                escaped @ ('\\' | '"') => out.push(escaped),
                _ => return None,
            },
            '"' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tristate_lines() {
        let keys = parse_kernel_config("CONFIG_FOO=y\nCONFIG_BAR=m\n").unwrap();
        assert_eq!(
            keys,
            vec![
                KernelConfigKey::tristate("CONFIG_FOO", Tristate::Yes),
                KernelConfigKey::tristate("CONFIG_BAR", Tristate::Module),
            ]
        );
    }

    #[test]
    fn test_not_set_is_no() {
        let keys = parse_kernel_config("# CONFIG_FOO is not set\n").unwrap();
        assert_eq!(keys, vec![KernelConfigKey::tristate("CONFIG_FOO", Tristate::No)]);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let text = "\n# Android base config\n\nCONFIG_FOO=y\n   \n";
        let keys = parse_kernel_config(text).unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_int_and_string_values() {
        let text = "CONFIG_RND_BITS=24\nCONFIG_MASK=0x1f\nCONFIG_CMDLINE=\"console=ttyS0 \\\"q\\\"\"\n";
        let keys = parse_kernel_config(text).unwrap();
        assert_eq!(keys[0].value, KernelConfigValue::Int(24));
        assert_eq!(keys[1].value, KernelConfigValue::Int(31));
        assert_eq!(
            keys[2].value,
            KernelConfigValue::Str("console=ttyS0 \"q\"".to_string())
        );
    }

    #[test]
    fn test_string_escapes() {
        let keys = parse_kernel_config("CONFIG_A=\"back\\\\slash \\\"q\\\"\"\n").unwrap();
        assert_eq!(
            keys[0].value,
            KernelConfigValue::Str("back\\slash \"q\"".to_string())
        );
        assert!(parse_kernel_config("CONFIG_A=\"bad\\n\"\n").is_err());
        assert!(parse_kernel_config("CONFIG_A=\"a\"b\"\n").is_err());
    }

    #[test]
    fn test_garbage_reports_line_number() {
        let err = parse_kernel_config("CONFIG_FOO=y\nnot a config line\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unsupported_value() {
        let err = parse_kernel_config("CONFIG_FOO=maybe\n").unwrap_err();
        assert!(err.message.contains("CONFIG_FOO"));
    }
}
