//! Layered configuration: CLI flags > environment > config file > defaults.
//!
//! Resolution happens once per invocation and produces an immutable
//! [`EffectiveConfig`]. The missing-key check runs here, before any network
//! or filesystem work, so a misconfigured run fails in milliseconds with a
//! message that names the fix.
//!
//! The environment is injected as a lookup function rather than read through
//! `std::env` at the point of use, so the precedence rules are unit-testable
//! without mutating the process environment.

use crate::error::FluffCutterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Name of the config file inside the config directory.
const CONFIG_FILE_NAME: &str = "config.json";

/// The three supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    OpenRouter,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::OpenRouter];

    /// Canonical lowercase name, as used in config keys and CLI values.
    pub fn key(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::OpenRouter => "openrouter",
        }
    }

    /// Human-readable vendor name for status lines and the output footer.
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::OpenRouter => "OpenRouter",
        }
    }

    /// Model used when neither CLI, env, nor config file name one.
    ///
    /// The OpenRouter default is a `vendor/model` gateway identifier; the
    /// other two are native model IDs.
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-5.2",
            Provider::Anthropic => "claude-opus-4-5",
            Provider::OpenRouter => "anthropic/claude-sonnet-4-5",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    /// Environment variable overriding this provider's model.
    pub fn model_env(self) -> &'static str {
        match self {
            Provider::OpenAi => "FLUFF_CUTTER_OPENAI_MODEL",
            Provider::Anthropic => "FLUFF_CUTTER_ANTHROPIC_MODEL",
            Provider::OpenRouter => "FLUFF_CUTTER_OPENROUTER_MODEL",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Provider {
    type Err = FluffCutterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "openrouter" => Ok(Provider::OpenRouter),
            _ => Err(FluffCutterError::UnknownProvider { name: s.to_string() }),
        }
    }
}

/// On-disk config file contents. All fields optional; absent fields fall
/// through to the next configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openrouter_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openrouter_model: Option<String>,
}

impl ConfigFile {
    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::Anthropic => self.anthropic_api_key.as_deref(),
            Provider::OpenRouter => self.openrouter_api_key.as_deref(),
        }
    }

    pub fn set_api_key(&mut self, provider: Provider, key: impl Into<String>) {
        let slot = match provider {
            Provider::OpenAi => &mut self.openai_api_key,
            Provider::Anthropic => &mut self.anthropic_api_key,
            Provider::OpenRouter => &mut self.openrouter_api_key,
        };
        *slot = Some(key.into());
    }

    pub fn model(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai_model.as_deref(),
            Provider::Anthropic => self.anthropic_model.as_deref(),
            Provider::OpenRouter => self.openrouter_model.as_deref(),
        }
    }

    pub fn set_model(&mut self, provider: Provider, model: impl Into<String>) {
        let slot = match provider {
            Provider::OpenAi => &mut self.openai_model,
            Provider::Anthropic => &mut self.anthropic_model,
            Provider::OpenRouter => &mut self.openrouter_model,
        };
        *slot = Some(model.into());
    }
}

/// Where the config file lives — and where it used to live.
///
/// Versions before 0.3 wrote a single JSON file at `~/.fluff-cutter.json`.
/// The current layout is `~/.config/fluff-cutter/config.json`. On every
/// invocation [`ConfigStore::migrate_deprecated`] copies the old file to the
/// new path if (and only if) the new one does not exist yet. The old file is
/// left in place; once the new path exists the migration is a no-op.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_dir: PathBuf,
    deprecated_path: PathBuf,
}

impl ConfigStore {
    /// The store at the standard user locations.
    pub fn default_location() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("fluff-cutter");
        let deprecated_path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fluff-cutter.json");
        Self {
            config_dir,
            deprecated_path,
        }
    }

    /// A store rooted at explicit paths. Used by tests.
    pub fn at(config_dir: impl Into<PathBuf>, deprecated_path: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            deprecated_path: deprecated_path.into(),
        }
    }

    /// Path of the current config file.
    pub fn path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Copy a config file from the deprecated location to the current one.
    ///
    /// Runs before [`ConfigStore::load`]. Returns `true` if a migration
    /// actually happened. Never overwrites an existing current file.
    pub fn migrate_deprecated(&self) -> Result<bool, FluffCutterError> {
        let current = self.path();
        if current.exists() || !self.deprecated_path.exists() {
            return Ok(false);
        }

        // Parse-and-rewrite rather than a byte copy: a corrupt legacy file
        // should fail loudly here, not survive into the new location.
        let parsed = read_config_file(&self.deprecated_path)?;
        self.save(&parsed)?;
        info!(
            "migrated config from {} to {}",
            self.deprecated_path.display(),
            current.display()
        );
        Ok(true)
    }

    /// Load the config file, returning defaults when it does not exist.
    pub fn load(&self) -> Result<ConfigFile, FluffCutterError> {
        let path = self.path();
        if !path.exists() {
            debug!("no config file at {}", path.display());
            return Ok(ConfigFile::default());
        }
        read_config_file(&path)
    }

    /// Write the config file, creating the config directory if needed.
    pub fn save(&self, config: &ConfigFile) -> Result<(), FluffCutterError> {
        let path = self.path();
        std::fs::create_dir_all(&self.config_dir).map_err(|e| {
            FluffCutterError::ConfigWriteFailed {
                path: path.clone(),
                source: e,
            }
        })?;
        let json = serde_json::to_string_pretty(config).expect("ConfigFile serialises");
        std::fs::write(&path, json).map_err(|e| FluffCutterError::ConfigWriteFailed {
            path,
            source: e,
        })
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, FluffCutterError> {
    let raw = std::fs::read_to_string(path).map_err(|e| FluffCutterError::MalformedConfig {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| FluffCutterError::MalformedConfig {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Values taken from CLI flags. Highest-priority configuration layer.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub max_pages: Option<u32>,
}

/// The fully resolved configuration for one invocation. Immutable.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
    pub max_pages: Option<u32>,
}

impl EffectiveConfig {
    /// `"Anthropic (claude-opus-4-5)"` — for status lines and the footer.
    pub fn model_info(&self) -> String {
        format!("{} ({})", self.provider.display_name(), self.model)
    }
}

/// Resolve the effective configuration against the real process environment.
pub fn resolve(
    cli: &CliOverrides,
    file: &ConfigFile,
) -> Result<EffectiveConfig, FluffCutterError> {
    resolve_with(cli, file, |name| std::env::var(name).ok())
}

/// Resolve with an injected environment lookup.
///
/// Precedence, highest first: CLI flag, environment variable, config file,
/// built-in default. API keys have no CLI flag; for them the environment
/// wins over the file. Empty environment values are treated as unset.
pub fn resolve_with(
    cli: &CliOverrides,
    file: &ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> Result<EffectiveConfig, FluffCutterError> {
    let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    let provider = match (&cli.provider, env("FLUFF_CUTTER_PROVIDER")) {
        (Some(p), _) => *p,
        (None, Some(name)) => name.parse()?,
        (None, None) => match &file.default_provider {
            Some(name) => name.parse()?,
            None => Provider::Anthropic,
        },
    };

    let model = cli
        .model
        .clone()
        .or_else(|| env(provider.model_env()))
        .or_else(|| file.model(provider).map(str::to_string))
        .unwrap_or_else(|| provider.default_model().to_string());

    let api_key = env(provider.api_key_env())
        .or_else(|| file.api_key(provider).map(str::to_string))
        .ok_or_else(|| FluffCutterError::MissingApiKey {
            provider: provider.key().to_string(),
            env_var: provider.api_key_env().to_string(),
        })?;

    debug!(%provider, %model, "resolved configuration");
    Ok(EffectiveConfig {
        provider,
        model,
        api_key,
        max_pages: cli.max_pages,
    })
}

/// Whether any provider has an API key available (env or file).
pub fn is_configured(file: &ConfigFile) -> bool {
    is_configured_with(file, |name| std::env::var(name).ok())
}

pub fn is_configured_with(file: &ConfigFile, env: impl Fn(&str) -> Option<String>) -> bool {
    Provider::ALL.iter().any(|p| {
        env(p.api_key_env()).is_some_and(|v| !v.trim().is_empty())
            || file.api_key(*p).is_some_and(|v| !v.trim().is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn cli_flag_beats_every_other_source() {
        // All four layers name a different provider/model; the CLI must win.
        let cli = CliOverrides {
            provider: Some(Provider::OpenAi),
            model: Some("gpt-5.2-mini".into()),
            max_pages: None,
        };
        let file = ConfigFile {
            default_provider: Some("openrouter".into()),
            openai_model: Some("gpt-from-file".into()),
            openai_api_key: Some("sk-file".into()),
            ..Default::default()
        };
        let env = env_of(&[
            ("FLUFF_CUTTER_PROVIDER", "anthropic"),
            ("FLUFF_CUTTER_OPENAI_MODEL", "gpt-from-env"),
            ("OPENAI_API_KEY", "sk-env"),
        ]);

        let cfg = resolve_with(&cli, &file, env).unwrap();
        assert_eq!(cfg.provider, Provider::OpenAi);
        assert_eq!(cfg.model, "gpt-5.2-mini");
        // Keys have no CLI flag; env wins over file.
        assert_eq!(cfg.api_key, "sk-env");
    }

    #[test]
    fn env_beats_file_beats_default() {
        let cli = CliOverrides::default();
        let file = ConfigFile {
            default_provider: Some("openai".into()),
            openai_api_key: Some("sk-file".into()),
            ..Default::default()
        };

        // Env provider overrides the file's default_provider.
        let cfg = resolve_with(
            &cli,
            &file,
            env_of(&[
                ("FLUFF_CUTTER_PROVIDER", "openrouter"),
                ("OPENROUTER_API_KEY", "sk-or"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.provider, Provider::OpenRouter);

        // No env: the file's provider applies, with its stored key.
        let cfg = resolve_with(&cli, &file, env_of(&[])).unwrap();
        assert_eq!(cfg.provider, Provider::OpenAi);
        assert_eq!(cfg.api_key, "sk-file");
        assert_eq!(cfg.model, Provider::OpenAi.default_model());
    }

    #[test]
    fn default_provider_is_anthropic() {
        let cfg = resolve_with(
            &CliOverrides::default(),
            &ConfigFile::default(),
            env_of(&[("ANTHROPIC_API_KEY", "sk-ant")]),
        )
        .unwrap();
        assert_eq!(cfg.provider, Provider::Anthropic);
        assert_eq!(cfg.model, "claude-opus-4-5");
    }

    #[test]
    fn model_env_var_overrides_file_model() {
        let file = ConfigFile {
            anthropic_api_key: Some("sk-ant".into()),
            anthropic_model: Some("claude-from-file".into()),
            ..Default::default()
        };
        let cfg = resolve_with(
            &CliOverrides::default(),
            &file,
            env_of(&[("FLUFF_CUTTER_ANTHROPIC_MODEL", "claude-from-env")]),
        )
        .unwrap();
        assert_eq!(cfg.model, "claude-from-env");
    }

    #[test]
    fn missing_key_is_fatal_before_any_io() {
        let err = resolve_with(
            &CliOverrides {
                provider: Some(Provider::OpenRouter),
                ..Default::default()
            },
            &ConfigFile::default(),
            env_of(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, FluffCutterError::MissingApiKey { .. }));
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn empty_env_value_counts_as_unset() {
        let file = ConfigFile {
            anthropic_api_key: Some("sk-file".into()),
            ..Default::default()
        };
        let cfg = resolve_with(
            &CliOverrides::default(),
            &file,
            env_of(&[("ANTHROPIC_API_KEY", "")]),
        )
        .unwrap();
        assert_eq!(cfg.api_key, "sk-file");
    }

    #[test]
    fn unknown_provider_name_is_rejected() {
        let err = resolve_with(
            &CliOverrides::default(),
            &ConfigFile::default(),
            env_of(&[("FLUFF_CUTTER_PROVIDER", "grok")]),
        )
        .unwrap_err();
        assert!(matches!(err, FluffCutterError::UnknownProvider { .. }));
    }

    #[test]
    fn migration_moves_deprecated_file_once() {
        let tmp = tempfile::tempdir().unwrap();
        let deprecated = tmp.path().join(".fluff-cutter.json");
        let store = ConfigStore::at(tmp.path().join("fluff-cutter"), &deprecated);

        let legacy = ConfigFile {
            anthropic_api_key: Some("sk-legacy".into()),
            default_provider: Some("anthropic".into()),
            ..Default::default()
        };
        std::fs::write(&deprecated, serde_json::to_string(&legacy).unwrap()).unwrap();

        assert!(store.migrate_deprecated().unwrap());
        let loaded = store.load().unwrap();
        assert_eq!(loaded, legacy);

        // Second invocation: current path exists, nothing to do.
        assert!(!store.migrate_deprecated().unwrap());
    }

    #[test]
    fn migration_never_overwrites_current_config() {
        let tmp = tempfile::tempdir().unwrap();
        let deprecated = tmp.path().join(".fluff-cutter.json");
        let store = ConfigStore::at(tmp.path().join("fluff-cutter"), &deprecated);

        let current = ConfigFile {
            openai_api_key: Some("sk-current".into()),
            ..Default::default()
        };
        store.save(&current).unwrap();
        std::fs::write(&deprecated, r#"{"openai_api_key":"sk-old"}"#).unwrap();

        assert!(!store.migrate_deprecated().unwrap());
        assert_eq!(store.load().unwrap(), current);
    }

    #[test]
    fn malformed_config_file_is_a_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(tmp.path(), tmp.path().join("none.json"));
        std::fs::write(store.path(), "not json {").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, FluffCutterError::MalformedConfig { .. }));
    }

    #[test]
    fn config_round_trips_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(tmp.path().join("cfg"), tmp.path().join("none.json"));
        let mut cfg = ConfigFile::default();
        cfg.set_api_key(Provider::OpenRouter, "sk-or-123");
        cfg.set_model(Provider::OpenRouter, "meta-llama/llama-4-maverick");
        store.save(&cfg).unwrap();
        assert_eq!(store.load().unwrap(), cfg);
    }

    #[test]
    fn missing_file_loads_as_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(tmp.path().join("empty"), tmp.path().join("none.json"));
        assert_eq!(store.load().unwrap(), ConfigFile::default());
    }

    #[test]
    fn is_configured_checks_all_providers() {
        let file = ConfigFile::default();
        assert!(!is_configured_with(&file, |_| None));
        assert!(is_configured_with(&file, |name| {
            (name == "OPENROUTER_API_KEY").then(|| "sk-or".to_string())
        }));

        let file = ConfigFile {
            openai_api_key: Some("sk".into()),
            ..Default::default()
        };
        assert!(is_configured_with(&file, |_| None));
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!(" anthropic ".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert!("mistral".parse::<Provider>().is_err());
    }
}
