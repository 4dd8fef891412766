use pretty_assertions::assert_eq;
use stockroom_types::{Error, TranslationContext, WriteContext};

#[test]
fn default_context_is_system_shop() {
    let ctx = TranslationContext::default();
    assert!(ctx.is_system_shop());
    assert_eq!(ctx.language, "en-GB");
    assert_eq!(ctx.currency_factor, 1.0);
    assert!(ctx.fallback_language.is_none());
}

#[test]
fn new_context_with_fallback_and_factor() {
    let ctx = TranslationContext::new("shop-2", "de-DE")
        .unwrap()
        .with_fallback("en")
        .unwrap()
        .with_currency_factor(1.2);
    assert_eq!(ctx.shop_id, "shop-2");
    assert_eq!(ctx.fallback_language.as_deref(), Some("en"));
    assert_eq!(ctx.currency_factor, 1.2);
    assert!(!ctx.is_system_shop());
}

#[test]
fn malformed_language_is_rejected() {
    for tag in ["", "EN", "english", "de-", "de--DE"] {
        let err = TranslationContext::new("s", tag).unwrap_err();
        assert!(matches!(err, Error::InvalidLanguage(_)), "tag {tag:?}");
    }
}

#[test]
fn write_context_copies_shop_and_language() {
    let ctx = TranslationContext::new("shop-9", "fr-FR").unwrap();
    let write = WriteContext::from_translation_context(&ctx);
    assert_eq!(
        write,
        WriteContext {
            shop_id: "shop-9".into(),
            language: "fr-FR".into(),
        }
    );
}

#[test]
fn context_json_omits_missing_fallback() {
    let json = serde_json::to_value(TranslationContext::default()).unwrap();
    assert!(json.get("fallback_language").is_none());
    let back: TranslationContext = serde_json::from_value(json).unwrap();
    assert_eq!(back, TranslationContext::default());
}
