//! Command line reader.
//!
//! Declared flags are parsed by `clap`; everything else is handed to the
//! [`tokenize`](super::args::tokenize) step instead of being rejected.

use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

use super::args::tokenize;
use super::error::{ConfigError, ConfigResult};
use super::schema::keys;
use super::value::FlatConfig;

/// Declared command line flags.
///
/// Each flag can also be set through the environment variable or config file
/// entry of the same name.
#[derive(Parser, Debug, Default)]
#[command(
    name = "telestion",
    version,
    args_override_self = true,
    about = "CLI interface for Telestion services.",
    after_help = "For more information please visit https://telestion.wuespace.de/"
)]
pub struct KnownArgs {
    /// If set, the service starts in development mode
    #[arg(long = "dev")]
    pub dev: bool,

    /// NATS url of the server the service can connect to
    #[arg(long = "NATS_URL", value_name = "URL")]
    pub nats_url: Option<String>,

    /// NATS user name for the authentication with the server
    #[arg(long = "NATS_USER", value_name = "USER")]
    pub nats_user: Option<String>,

    /// NATS password for the authentication with the server
    /// (prefer the environment or the config file for this)
    #[arg(long = "NATS_PASSWORD", value_name = "PASSWORD")]
    pub nats_password: Option<String>,

    /// File path to the config of the service
    #[arg(long = "CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Object key of a config file
    #[arg(long = "CONFIG_KEY", value_name = "KEY")]
    pub config_key: Option<String>,

    /// Name of the service, also used in the NATS service registration
    #[arg(long = "SERVICE_NAME", value_name = "NAME")]
    pub service_name: Option<String>,

    /// Path where the service can store persistent data
    #[arg(long = "DATA_DIR", value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

impl KnownArgs {
    /// Converts the flags that were actually given into a flat mapping.
    pub fn to_flat(&self) -> FlatConfig {
        let mut flat = FlatConfig::new();
        if self.dev {
            flat.insert(keys::DEV, true);
        }

        let given = [
            (keys::NATS_URL, self.nats_url.clone()),
            (keys::NATS_USER, self.nats_user.clone()),
            (keys::NATS_PASSWORD, self.nats_password.clone()),
            (keys::CONFIG_FILE, path_string(&self.config_file)),
            (keys::CONFIG_KEY, self.config_key.clone()),
            (keys::SERVICE_NAME, self.service_name.clone()),
            (keys::DATA_DIR, path_string(&self.data_dir)),
        ];
        for (key, value) in given {
            if let Some(value) = value {
                flat.insert(key, value);
            }
        }

        flat
    }
}

fn path_string(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().into_owned())
}

/// Splits `args` into tokens for declared flags and leftover tokens.
///
/// A declared flag that takes a value also claims the following token,
/// unless the value was given inline (`--FLAG=value`) or the next token is
/// itself a flag.
pub fn partition_args<I, S>(args: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut command = KnownArgs::command();
    command.build();

    let mut known = Vec::new();
    let mut unknown = Vec::new();
    let mut args = args.into_iter().map(Into::into).peekable();

    while let Some(token) = args.next() {
        let Some(name) = token.strip_prefix("--") else {
            unknown.push(token);
            continue;
        };
        let (name, inline) = match name.split_once('=') {
            Some((name, _)) => (name, true),
            None => (name, false),
        };

        let Some(arg) = command
            .get_arguments()
            .find(|a| a.get_long() == Some(name))
        else {
            unknown.push(token);
            continue;
        };

        let takes_value = arg.get_action().takes_values();
        known.push(token);
        if takes_value && !inline {
            if let Some(value) = args.next_if(|next| !next.starts_with('-')) {
                known.push(value);
            }
        }
    }

    (known, unknown)
}

/// Converts raw process arguments into strings.
///
/// Fails with [`ConfigError::MalformedArguments`] on the first argument that
/// is not valid Unicode.
pub fn utf8_args<I>(args: I) -> ConfigResult<Vec<String>>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            arg.into_string().map_err(|raw| {
                ConfigError::malformed(format!(
                    "argument '{}' is not valid Unicode",
                    raw.to_string_lossy()
                ))
            })
        })
        .collect()
}

/// Reads the command line.
///
/// `args` must not include the program name. Declared flags that were given
/// and all undeclared `--key value` tokens are combined into one mapping.
pub fn read_cli<I, S>(args: I) -> ConfigResult<FlatConfig>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let (known, unknown) = partition_args(args);

    let parsed = KnownArgs::try_parse_from(std::iter::once("telestion".to_string()).chain(known))?;

    let mut flat = parsed.to_flat();
    flat.merge(tokenize(unknown)?);
    Ok(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::value::ConfigValue;

    #[test]
    fn test_partition_separates_declared_flags() {
        let (known, unknown) = partition_args([
            "--NATS_URL",
            "nats://x:4222",
            "--foo",
            "bar",
            "--dev",
            "--SERVICE_NAME=svc",
            "--baz",
        ]);

        assert_eq!(known, ["--NATS_URL", "nats://x:4222", "--dev", "--SERVICE_NAME=svc"]);
        assert_eq!(unknown, ["--foo", "bar", "--baz"]);
    }

    #[test]
    fn test_declared_flags_only_when_given() {
        let flat = read_cli(["--NATS_URL", "nats://x:4222"]).unwrap();
        assert_eq!(flat, FlatConfig::new().with("NATS_URL", "nats://x:4222"));
    }

    #[test]
    fn test_dev_flag() {
        let flat = read_cli(["--dev"]).unwrap();
        assert_eq!(flat.get("dev"), Some(&ConfigValue::Bool(true)));
    }

    #[test]
    fn test_declared_and_undeclared_are_combined() {
        let flat = read_cli([
            "--CONFIG_FILE",
            "/etc/app.json",
            "--tag",
            "a",
            "--DATA_DIR=/var/data",
            "--tag",
            "b",
            "--Verbose",
        ])
        .unwrap();

        assert_eq!(flat.get_str("CONFIG_FILE"), Some("/etc/app.json"));
        assert_eq!(flat.get_str("DATA_DIR"), Some("/var/data"));
        assert_eq!(
            flat.get("tag"),
            Some(&ConfigValue::List(vec!["a".into(), "b".into()]))
        );
        assert_eq!(flat.get("Verbose"), Some(&ConfigValue::Bool(true)));
    }

    #[test]
    fn test_repeated_declared_flag_keeps_last_value() {
        let flat = read_cli(["--NATS_URL", "nats://a:1", "--NATS_URL=nats://b:2"]).unwrap();
        assert_eq!(flat.get_str("NATS_URL"), Some("nats://b:2"));

        let flat = read_cli(["--dev", "--dev"]).unwrap();
        assert_eq!(flat.get("dev").and_then(ConfigValue::as_bool), Some(true));
    }

    #[test]
    fn test_repeated_undeclared_flag_collects_list() {
        let flat = read_cli(["--tag", "a", "--tag", "b", "c"]).unwrap();
        let tags = flat.get("tag").and_then(ConfigValue::as_list).unwrap();
        assert_eq!(tags, ["a", "b", "c"]);
    }

    #[test]
    fn test_utf8_args_accepts_unicode() {
        let args = utf8_args([OsString::from("--NAME"), OsString::from("Würzburg")]).unwrap();
        assert_eq!(args, ["--NAME", "Würzburg"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_utf8_args_rejects_invalid_unicode() {
        use std::os::unix::ffi::OsStringExt;

        let args = [OsString::from("--foo"), OsString::from_vec(vec![0x66, 0xff])];
        assert!(matches!(
            utf8_args(args),
            Err(ConfigError::MalformedArguments { .. })
        ));
    }

    #[test]
    fn test_stray_value_fails() {
        assert!(matches!(
            read_cli(["stray"]),
            Err(ConfigError::MalformedArguments { .. })
        ));
    }

    #[test]
    fn test_declared_flag_missing_value_fails() {
        assert!(matches!(read_cli(["--NATS_URL"]), Err(ConfigError::Cli(_))));
    }

    #[test]
    fn test_version_is_informational() {
        let err = read_cli(["--version"]).unwrap_err();
        assert!(err.is_informational());
    }
}
