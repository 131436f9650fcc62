use anyhow::{Context, Result, bail};
use clap::Parser;
use std::collections::HashMap;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub seo: SeoConfig,
}

/// SEO-specific configuration: supported languages and the global fallback
/// metadata every resolution ultimately degrades to.
#[derive(Debug, Clone)]
pub struct SeoConfig {
    /// Supported two-letter language codes.
    pub languages: Vec<String>,
    pub default_lang: String,
    pub fallback_titles: FallbackText,
    pub fallback_descriptions: FallbackText,
    /// When true, an unresolvable placeholder is an error instead of being
    /// left literal in the output.
    pub strict_placeholders: bool,
    /// When true, bulk sync removes records whose object no longer exists.
    pub remove_stale: bool,
}

/// Per-language fallback strings, each a list of variants.
///
/// Configured either as a plain scalar (promoted to the default language) or
/// as a JSON map of language code to string or list of strings, e.g.
/// `{"en": "My Site", "es": ["Mi Sitio", "Mi Web"]}`.
#[derive(Debug, Clone)]
pub struct FallbackText {
    by_lang: HashMap<String, Vec<String>>,
}

impl FallbackText {
    pub(crate) fn parse(raw: &str, default_lang: &str, var: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let mut by_lang = HashMap::new();

        if trimmed.starts_with('{') {
            let value: serde_json::Value = serde_json::from_str(trimmed)
                .with_context(|| format!("parsing {} as JSON", var))?;
            let map = value
                .as_object()
                .with_context(|| format!("{} must be a JSON object or a plain string", var))?;
            for (lang, entry) in map {
                let variants = match entry {
                    serde_json::Value::String(s) => vec![s.clone()],
                    serde_json::Value::Array(items) => items
                        .iter()
                        .map(|item| {
                            item.as_str().map(str::to_string).with_context(|| {
                                format!("{}: entries for `{}` must be strings", var, lang)
                            })
                        })
                        .collect::<Result<Vec<_>>>()?,
                    _ => bail!("{}: value for `{}` must be a string or list", var, lang),
                };
                if variants.is_empty() {
                    bail!("{}: `{}` has an empty variant list", var, lang);
                }
                by_lang.insert(lang.clone(), variants);
            }
        } else {
            by_lang.insert(default_lang.to_string(), vec![trimmed.to_string()]);
        }

        if !by_lang.contains_key(default_lang) {
            bail!("{} has no entry for default language `{}`", var, default_lang);
        }

        Ok(Self { by_lang })
    }

    /// Variants for `lang`, falling back to the default language's entry.
    pub fn for_lang(&self, lang: &str, default_lang: &str) -> &[String] {
        self.by_lang
            .get(lang)
            .or_else(|| self.by_lang.get(default_lang))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Per-URL, per-language SEO metadata service")]
pub struct Args {
    /// Host to bind to (overrides SEO_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides SEO_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides SEO_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,

    /// Sync metadata for all registered models and exit
    #[arg(long)]
    pub sync_all: bool,

    /// Reset still-default metadata for all registered models and exit
    #[arg(long)]
    pub reset_all: bool,

    /// With --sync-all: remove records whose object no longer exists
    #[arg(long)]
    pub remove_stale: bool,
}

/// What `main` should do after configuration is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Serve,
    Migrate,
    SyncAll,
    ResetAll,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and a run mode.
    ///
    /// Missing fallback titles or descriptions are a fatal configuration
    /// error: the resolver has no final tier without them.
    pub fn from_env_and_args() -> Result<(Self, RunMode)> {
        let args = Args::parse();

        let env_host = env::var("SEO_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("SEO_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing SEO_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading SEO_PORT"),
        };
        let env_db =
            env::var("SEO_DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/seo.db".into());

        let default_lang = env::var("SEO_DEFAULT_LANGUAGE").unwrap_or_else(|_| "en".into());
        let languages = match env::var("SEO_LANGUAGES") {
            Ok(value) => value
                .split(',')
                .map(|code| code.trim().to_string())
                .filter(|code| !code.is_empty())
                .collect::<Vec<_>>(),
            Err(_) => vec![default_lang.clone()],
        };
        if !languages.contains(&default_lang) {
            bail!(
                "default language `{}` is not in SEO_LANGUAGES ({})",
                default_lang,
                languages.join(", ")
            );
        }

        let fallback_titles = match env::var("SEO_DEFAULT_TITLES") {
            Ok(raw) => FallbackText::parse(&raw, &default_lang, "SEO_DEFAULT_TITLES")?,
            Err(_) => bail!("SEO_DEFAULT_TITLES is not defined"),
        };
        let fallback_descriptions = match env::var("SEO_DEFAULT_DESCRIPTIONS") {
            Ok(raw) => FallbackText::parse(&raw, &default_lang, "SEO_DEFAULT_DESCRIPTIONS")?,
            Err(_) => bail!("SEO_DEFAULT_DESCRIPTIONS is not defined"),
        };

        let strict_placeholders = env_flag("SEO_STRICT_PLACEHOLDERS")?;
        let remove_stale = args.remove_stale || env_flag("SEO_REMOVE_STALE")?;

        let mode = if args.migrate {
            RunMode::Migrate
        } else if args.sync_all {
            RunMode::SyncAll
        } else if args.reset_all {
            RunMode::ResetAll
        } else {
            RunMode::Serve
        };

        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            seo: SeoConfig {
                languages,
                default_lang,
                fallback_titles,
                fallback_descriptions,
                strict_placeholders,
                remove_stale,
            },
        };

        Ok((cfg, mode))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_flag(var: &str) -> Result<bool> {
    match env::var(var) {
        Ok(value) => match value.trim() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            other => bail!("{} must be a boolean, got `{}`", var, other),
        },
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_fallback_promotes_to_default_language() {
        let text = FallbackText::parse("Default Title", "en", "SEO_DEFAULT_TITLES").unwrap();
        assert_eq!(text.for_lang("en", "en"), ["Default Title"]);
        // Unknown language degrades to the default language's entry.
        assert_eq!(text.for_lang("es", "en"), ["Default Title"]);
    }

    #[test]
    fn json_fallback_supports_lists_per_language() {
        let raw = r#"{"en": "My Site", "es": ["Mi Sitio", "Mi Web"]}"#;
        let text = FallbackText::parse(raw, "en", "SEO_DEFAULT_TITLES").unwrap();
        assert_eq!(text.for_lang("es", "en"), ["Mi Sitio", "Mi Web"]);
        assert_eq!(text.for_lang("fr", "en"), ["My Site"]);
    }

    #[test]
    fn fallback_without_default_language_is_rejected() {
        let raw = r#"{"es": "Mi Sitio"}"#;
        assert!(FallbackText::parse(raw, "en", "SEO_DEFAULT_TITLES").is_err());
    }
}
