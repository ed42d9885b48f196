//! Configuration loading with layered precedence.
//!
//! Layers, lowest to highest: application defaults, configuration file,
//! environment variables, command-line arguments.
//!
//! `MergeComposer` is driven by hand because the `Cli` owns subcommand
//! dispatch, and because typed environment variables must fail loudly rather
//! than being skipped when unparseable.
//!
//! # Environment Variable Handling
//!
//! String fields (e.g. `DOCKSIDE_CONTEXT`) are always accepted. Numeric fields
//! such as `DOCKSIDE_RETRY_TIMEOUT_SECS` must hold an unsigned integer or
//! loading fails with `ConfigError::InvalidValue`.

use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};

use crate::config::{AppConfig, Cli};
use crate::error::{ConfigError, Result};

/// The type of value expected from an environment variable.
#[derive(Clone, Copy)]
enum EnvVarType {
    /// String value (always accepted).
    String,
    /// Unsigned 64-bit integer. Invalid values return an error.
    U64,
}

/// Maps one environment variable onto a configuration path.
struct EnvVarSpec {
    env_var: &'static str,
    /// JSON path segments, e.g. `["retry", "timeout_secs"]`.
    path: &'static [&'static str],
    var_type: EnvVarType,
}

const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    EnvVarSpec {
        env_var: "DOCKSIDE_BINARY",
        path: &["binary"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "DOCKSIDE_CONTEXT",
        path: &["context"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "DOCKSIDE_WORKING_DIR",
        path: &["working_dir"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "DOCKSIDE_RETRY_TIMEOUT_SECS",
        path: &["retry", "timeout_secs"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "DOCKSIDE_RETRY_INITIAL_BACKOFF_MS",
        path: &["retry", "initial_backoff_ms"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "DOCKSIDE_RETRY_MAX_BACKOFF_MS",
        path: &["retry", "max_backoff_ms"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "DOCKSIDE_WAIT_TIMEOUT_SECS",
        path: &["wait", "timeout_secs"],
        var_type: EnvVarType::U64,
    },
];

/// Returns the environment variable names recognised by the loader.
///
/// Tests use this to clear every `DOCKSIDE_*` variable the loader reads.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS.iter().map(|spec| spec.env_var).collect()
}

/// Read a TOML file through `cap_std` and push it to the composer.
fn load_config_file(path: &Utf8PathBuf, composer: &mut MergeComposer) -> Result<()> {
    let current_dir = Utf8PathBuf::from(".");
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| current_dir.as_ref());
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;

    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let value =
        toml::from_str::<serde_json::Value>(&content).map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;

    composer.push_file(value, Some(path.clone()));
    Ok(())
}

/// Pick the configuration file: an explicit `--config` path must exist,
/// otherwise the first discovered candidate is used.
fn resolve_config_path(cli: &Cli) -> Result<Option<Utf8PathBuf>> {
    if let Some(ref explicit) = cli.config {
        if !explicit.exists() {
            return Err(ConfigError::FileNotFound {
                path: explicit.clone().into_std_path_buf(),
            }
            .into());
        }
        return Ok(Some(explicit.clone()));
    }

    let discovery = ConfigDiscovery::builder("dockside")
        .env_var("DOCKSIDE_CONFIG_PATH")
        .config_file_name("config.toml")
        .dotfile_name(".dockside.toml")
        .build();
    Ok(discovery
        .candidates()
        .into_iter()
        .filter(|p| p.exists())
        .find_map(|p| Utf8PathBuf::try_from(p).ok()))
}

/// Load configuration with full layer precedence and validate the result.
///
/// # Errors
///
/// Returns `ConfigError` when:
/// - an explicit `--config` path does not exist
/// - a configuration file cannot be read or parsed
/// - a numeric environment variable holds a non-numeric value
/// - the merged configuration fails [`AppConfig::validate`]
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut composer = MergeComposer::new();

    let defaults =
        serde_json::to_value(AppConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    if let Some(ref path) = resolve_config_path(cli)? {
        load_config_file(path, &mut composer)?;
    }

    let env_values = collect_env_vars()?;
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    let cli_overrides = build_cli_overrides(cli);
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    let config =
        AppConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;
    config.validate()?;
    Ok(config)
}

fn collect_env_vars() -> Result<Value> {
    let mut root = Map::new();

    for spec in ENV_VAR_SPECS {
        let Ok(raw_value) = std::env::var(spec.env_var) else {
            continue;
        };

        let json_value = match spec.var_type {
            EnvVarType::String => Value::String(raw_value),
            EnvVarType::U64 => match raw_value.trim().parse::<u64>() {
                Ok(n) => Value::Number(n.into()),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected unsigned integer, got '{raw_value}'"),
                    }
                    .into());
                }
            },
        };

        insert_at_path(&mut root, spec.path, json_value);
    }

    if root.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(root))
    }
}

/// Insert `value` at a nested path, creating intermediate objects.
fn insert_at_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((&field, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for &segment in parents {
        let entry = current
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(obj) = entry.as_object_mut() else {
            return;
        };
        current = obj;
    }

    current.insert(field.to_owned(), value);
}

fn build_cli_overrides(cli: &Cli) -> Value {
    let mut overrides = Map::new();

    if let Some(ref binary) = cli.binary {
        overrides.insert("binary".to_owned(), Value::String(binary.clone()));
    }

    if let Some(ref context) = cli.context {
        overrides.insert("context".to_owned(), Value::String(context.clone()));
    }

    if overrides.is_empty() {
        Value::Null
    } else {
        Value::Object(overrides)
    }
}
