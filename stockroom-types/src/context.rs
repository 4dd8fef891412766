//! Request-scoped contexts passed through every repository call.

use serde::{Deserialize, Serialize};

/// Shop, language, and currency scope of a request.
///
/// Repositories never interpret the context themselves; it is handed to the
/// injected collaborators, which resolve translations and prices with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationContext {
    pub shop_id: String,
    /// BCP 47 style tag, e.g. `en-GB`.
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_language: Option<String>,
    pub currency_factor: f64,
}

impl TranslationContext {
    /// Shop id of the system (default) shop.
    pub const SYSTEM_SHOP: &'static str = "default";

    /// Creates a context for `shop_id` in `language`.
    pub fn new(shop_id: impl Into<String>, language: impl Into<String>) -> crate::Result<Self> {
        let language = language.into();
        validate_language(&language)?;
        Ok(Self {
            shop_id: shop_id.into(),
            language,
            fallback_language: None,
            currency_factor: 1.0,
        })
    }

    /// Sets the language used when a translation is missing.
    pub fn with_fallback(mut self, language: impl Into<String>) -> crate::Result<Self> {
        let language = language.into();
        validate_language(&language)?;
        self.fallback_language = Some(language);
        Ok(self)
    }

    /// Sets the currency factor applied to prices.
    #[must_use]
    pub fn with_currency_factor(mut self, factor: f64) -> Self {
        self.currency_factor = factor;
        self
    }

    /// Whether this context targets the system shop.
    pub fn is_system_shop(&self) -> bool {
        self.shop_id == Self::SYSTEM_SHOP
    }
}

impl Default for TranslationContext {
    fn default() -> Self {
        Self {
            shop_id: Self::SYSTEM_SHOP.to_string(),
            language: "en-GB".to_string(),
            fallback_language: None,
            currency_factor: 1.0,
        }
    }
}

/// Metadata a writer needs to execute one write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteContext {
    pub shop_id: String,
    pub language: String,
}

impl WriteContext {
    /// Derives the write context for a request.
    pub fn from_translation_context(context: &TranslationContext) -> Self {
        Self {
            shop_id: context.shop_id.clone(),
            language: context.language.clone(),
        }
    }
}

fn validate_language(tag: &str) -> crate::Result<()> {
    let mut parts = tag.split('-');
    let primary = parts.next().unwrap_or_default();
    let well_formed = (2..=3).contains(&primary.len())
        && primary.chars().all(|c| c.is_ascii_lowercase())
        && parts.all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()));
    if well_formed {
        Ok(())
    } else {
        Err(crate::Error::InvalidLanguage(tag.to_string()))
    }
}
