use std::collections::HashMap;

use fluent_templates::{
    fluent_bundle::{FluentArgs, FluentValue},
    static_loader, Loader,
};
use once_cell::sync::Lazy;
use unic_langid::{langid, LanguageIdentifier};

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "en-US",
        // Placeables end up in chat messages; Unicode isolation marks would show up as garbage.
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

/// Tag used for users without a stored preference.
pub const DEFAULT_LANG_CODE: &str = "en";

/// Supported languages (code, button label).
pub static SUPPORTED_LANGS: &[(&str, &str)] = &[("en", "🇬🇧 English"), ("ru", "🇷🇺 Русский")];

static DEFAULT_LANG: Lazy<LanguageIdentifier> = Lazy::new(|| langid!("en-US"));

/// Normalizes a language code into a LanguageIdentifier (falls back to default).
pub fn lang_from_code(code: &str) -> LanguageIdentifier {
    match code.to_lowercase().as_str() {
        "en" | "en-us" | "en-gb" => langid!("en-US"),
        "ru" | "ru-ru" => langid!("ru"),
        _ => DEFAULT_LANG.clone(),
    }
}

/// Returns a localized string for the given key.
pub fn t(lang: &LanguageIdentifier, key: &str) -> String {
    LOCALES
        .lookup(lang, key)
        .unwrap_or_else(|| LOCALES.lookup(&DEFAULT_LANG, key).unwrap_or_else(|| key.to_string()))
}

/// Returns a localized string with arguments for interpolation.
pub fn t_args(lang: &LanguageIdentifier, key: &str, args: &FluentArgs) -> String {
    let args_map: HashMap<String, FluentValue> = args.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();

    LOCALES.lookup_with_args(lang, key, &args_map).unwrap_or_else(|| {
        LOCALES
            .lookup_with_args(&DEFAULT_LANG, key, &args_map)
            .unwrap_or_else(|| key.to_string())
    })
}

/// `error` message with its `{ $error }` detail filled in.
pub fn error_text(lang: &LanguageIdentifier, detail: &str) -> String {
    let mut args = FluentArgs::new();
    args.set("error", detail.to_string());
    t_args(lang, "error", &args)
}

/// Checks if a language code is supported by the bot.
/// Returns the normalized language code if supported, None otherwise.
pub fn is_language_supported(code: &str) -> Option<&'static str> {
    let normalized = code.split(['-', '_']).next().unwrap_or(code).to_lowercase();

    SUPPORTED_LANGS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(&normalized))
        .map(|(c, _)| *c)
}

/// Language whose button label is exactly `text`.
pub fn language_by_label(text: &str) -> Option<&'static str> {
    let text = text.trim();
    SUPPORTED_LANGS.iter().find(|(_, name)| *name == text).map(|(c, _)| *c)
}
