use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::error;
use unic_langid::LanguageIdentifier;

/// Locale of the bundled message catalog
pub const DEFAULT_LOCALE: &str = "ru";

const RU_MAIN: &str = include_str!("../locales/ru/main.ftl");

/// Message catalog for the Copywriter Bot
pub struct LocalizationManager {
    bundle: FluentBundle<FluentResource>,
}

impl LocalizationManager {
    /// Create a manager with the bundled catalog
    pub fn new() -> Result<Self> {
        Self::from_source(DEFAULT_LOCALE, RU_MAIN)
    }

    /// Create a manager from Fluent source text
    pub fn from_source(locale: &str, source: &str) -> Result<Self> {
        let mut manager = Self::empty(locale)?;

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Failed to parse {locale} catalog: {errors:?}"))?;
        manager
            .bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Failed to load {locale} catalog: {errors:?}"))?;

        Ok(manager)
    }

    fn empty(locale: &str) -> Result<Self> {
        let langid: LanguageIdentifier = locale.parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![langid]);
        // Arguments are user text and must be spliced verbatim
        bundle.set_use_isolating(false);
        Ok(Self { bundle })
    }

    /// Get a localized message
    pub fn get_message(&self, key: &str, args: Option<&HashMap<&str, &str>>) -> String {
        let msg = match self.bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, FluentValue::from(*value));
            }
            fluent_args
        });

        let mut errors = vec![];
        let value = self
            .bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors)
            .into_owned();

        if !errors.is_empty() {
            error!(key, errors = ?errors, "Errors while formatting message");
        }

        value
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message(key, Some(&args_map))
    }

    pub fn has_message(&self, key: &str) -> bool {
        self.bundle.has_message(key)
    }
}

static LOCALIZATION_MANAGER: LazyLock<LocalizationManager> = LazyLock::new(|| {
    LocalizationManager::new().unwrap_or_else(|e| {
        error!(error = %e, "Failed to load message catalog, messages will show their keys");
        LocalizationManager {
            bundle: FluentBundle::new_concurrent(Vec::new()),
        }
    })
});

/// Get the process-wide localization manager
pub fn get_localization_manager() -> &'static LocalizationManager {
    &LOCALIZATION_MANAGER
}

/// Convenience function to get a localized message
pub fn t(key: &str) -> String {
    get_localization_manager().get_message(key, None)
}

/// Convenience function to get a localized message with arguments
pub fn t_args(key: &str, args: &[(&str, &str)]) -> String {
    get_localization_manager().get_message_with_args(key, args)
}
