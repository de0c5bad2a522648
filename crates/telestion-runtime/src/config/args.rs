//! Tokenizer for command line arguments that are not declared flags.
//!
//! Services may receive arbitrary `--key value` pairs next to the declared
//! flags. These are folded into a [`FlatConfig`] so they end up in the
//! extension bag of the bound configuration:
//!
//! ```text
//! --dev                          → dev = true
//! --foo bar                      → foo = "bar"
//! --foo=bar                      → foo = "bar"
//! --foo bar --foo baz            → foo = ["bar", "baz"]
//! --foo bar baz                  → foo = ["bar", "baz"]
//! bar                            → error, no preceding flag
//! ```

use super::error::{ConfigError, ConfigResult};
use super::value::{ConfigValue, FlatConfig};

/// The key currently waiting for values.
struct Pending {
    key: String,
    has_value: bool,
}

/// Converts unrecognized command line tokens into a flat mapping.
///
/// Each key ends up in one of three shapes: `true` for a bare flag, a string
/// for a single value, or a list for repeated values. Fails with
/// [`ConfigError::MalformedArguments`] when a value has no preceding flag.
pub fn tokenize<I, S>(tokens: I) -> ConfigResult<FlatConfig>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out = FlatConfig::new();
    let mut pending: Option<Pending> = None;
    let mut tokens = tokens.into_iter().map(Into::into);
    // Right-hand side of a `--key=value` token, consumed before the next token.
    let mut carried: Option<String> = None;

    loop {
        if let Some(value) = carried.take() {
            push_value(&mut out, &mut pending, value)?;
            continue;
        }

        let Some(token) = tokens.next() else {
            break;
        };

        let Some(flag) = strip_dashes(&token) else {
            push_value(&mut out, &mut pending, token)?;
            continue;
        };

        let (key, inline) = match flag.split_once('=') {
            Some((key, value)) => (key, Some(value.to_string())),
            None => (flag, None),
        };

        if key.is_empty() {
            return Err(ConfigError::malformed(format!(
                "flag '{token}' has no name"
            )));
        }

        finalize(&mut out, pending.take());
        pending = Some(Pending {
            key: key.to_string(),
            has_value: false,
        });
        carried = inline;
    }

    finalize(&mut out, pending);
    Ok(out)
}

/// Returns the flag name with its leading dashes removed, or `None` for a
/// value token.
fn strip_dashes(token: &str) -> Option<&str> {
    token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
}

/// A key that never received a value becomes a boolean flag.
fn finalize(out: &mut FlatConfig, pending: Option<Pending>) {
    if let Some(Pending {
        key,
        has_value: false,
    }) = pending
    {
        if !out.contains_key(&key) {
            out.insert(key, true);
        }
    }
}

fn push_value(
    out: &mut FlatConfig,
    pending: &mut Option<Pending>,
    value: String,
) -> ConfigResult<()> {
    let Some(pending) = pending.as_mut() else {
        return Err(ConfigError::malformed(format!(
            "value '{value}' has no preceding flag"
        )));
    };
    pending.has_value = true;

    match out.get_mut(&pending.key) {
        None => {
            out.insert(pending.key.clone(), value);
        }
        Some(ConfigValue::List(items)) => items.push(value),
        Some(existing) => {
            let first = match &mut *existing {
                ConfigValue::String(s) => std::mem::take(s),
                other => other.to_json().to_string(),
            };
            *existing = ConfigValue::List(vec![first, value]);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> ConfigValue {
        ConfigValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_bare_flag_is_true() {
        let out = tokenize(["--dev"]).unwrap();
        assert_eq!(out, FlatConfig::new().with("dev", true));
    }

    #[test]
    fn test_flag_with_value() {
        let out = tokenize(["--foo", "bar"]).unwrap();
        assert_eq!(out, FlatConfig::new().with("foo", "bar"));
    }

    #[test]
    fn test_repeated_flag_accumulates_in_order() {
        let out = tokenize(["--foo", "bar", "--foo", "baz", "--foo", "qux"]).unwrap();
        assert_eq!(out.get("foo"), Some(&list(&["bar", "baz", "qux"])));
    }

    #[test]
    fn test_consecutive_values_accumulate() {
        let out = tokenize(["--foo", "bar", "baz"]).unwrap();
        assert_eq!(out.get("foo"), Some(&list(&["bar", "baz"])));
    }

    #[test]
    fn test_embedded_equals() {
        let out = tokenize(["--foo=bar"]).unwrap();
        assert_eq!(out, FlatConfig::new().with("foo", "bar"));
    }

    #[test]
    fn test_embedded_equals_splits_on_first_only() {
        let out = tokenize(["--query=a=b", "-x=-1"]).unwrap();
        assert_eq!(out.get_str("query"), Some("a=b"));
        assert_eq!(out.get_str("x"), Some("-1"));
    }

    #[test]
    fn test_embedded_equals_mixes_with_separate_values() {
        let out = tokenize(["--foo=bar", "--foo", "baz"]).unwrap();
        assert_eq!(out.get("foo"), Some(&list(&["bar", "baz"])));
    }

    #[test]
    fn test_embedded_equals_with_empty_value() {
        let out = tokenize(["--foo="]).unwrap();
        assert_eq!(out.get_str("foo"), Some(""));
    }

    #[test]
    fn test_value_without_flag_fails() {
        let err = tokenize(["bar"]).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedArguments { .. }));
    }

    #[test]
    fn test_empty_flag_name_fails() {
        assert!(matches!(
            tokenize(["--", "bar"]),
            Err(ConfigError::MalformedArguments { .. })
        ));
        assert!(matches!(
            tokenize(["--=bar"]),
            Err(ConfigError::MalformedArguments { .. })
        ));
    }

    #[test]
    fn test_back_to_back_flags_become_booleans() {
        let out = tokenize(["--a", "--b", "--c", "value", "-d"]).unwrap();
        assert_eq!(out.get("a"), Some(&ConfigValue::Bool(true)));
        assert_eq!(out.get("b"), Some(&ConfigValue::Bool(true)));
        assert_eq!(out.get_str("c"), Some("value"));
        assert_eq!(out.get("d"), Some(&ConfigValue::Bool(true)));
    }

    #[test]
    fn test_key_case_is_preserved() {
        let out = tokenize(["--Custom_Key", "v"]).unwrap();
        assert_eq!(out.get_str("Custom_Key"), Some("v"));
        assert!(out.get("custom_key").is_none());
    }

    #[test]
    fn test_repeated_bare_flag_keeps_earlier_value() {
        let out = tokenize(["--foo", "bar", "--foo"]).unwrap();
        assert_eq!(out.get_str("foo"), Some("bar"));
    }

    #[test]
    fn test_value_after_boolean_promotes_to_list() {
        let out = tokenize(["--foo", "--bar", "--foo", "x"]).unwrap();
        assert_eq!(out.get("foo"), Some(&list(&["true", "x"])));
        assert_eq!(out.get("bar"), Some(&ConfigValue::Bool(true)));
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize(Vec::<String>::new()).unwrap().is_empty());
    }
}
