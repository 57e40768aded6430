use fintrack_core::{
    config::Config,
    currency::{symbol_for, LocaleConfig, Money},
    errors::FinanceError,
};

#[test]
fn formats_currency_with_locale() {
    let locale = LocaleConfig::pt_br();
    let amount = Money::from_cents(-123_450);
    assert_eq!(amount.format(&locale), "-1.234,50");
    assert_eq!(amount.format_currency("BRL", &locale), "-R$ 1.234,50");
    assert_eq!(
        Money::from_cents(99).format_currency("USD", &LocaleConfig::default()),
        "$ 0.99"
    );
}

#[test]
fn parses_entry_amounts_per_locale() {
    let brl = LocaleConfig::pt_br();
    assert_eq!(Money::parse("R$ 1.234,56", &brl).unwrap(), Money::from_cents(123_456));
    assert_eq!(Money::parse("85,5", &brl).unwrap(), Money::from_cents(8_550));
    assert_eq!(
        Money::parse("1,234.56", &LocaleConfig::default()).unwrap(),
        Money::from_cents(123_456)
    );
}

#[test]
fn bare_fractions_keep_their_scale() {
    assert_eq!(Money::parse(".50", &LocaleConfig::default()).unwrap(), Money::from_cents(50));
    assert_eq!(Money::parse("R$ ,05", &LocaleConfig::pt_br()).unwrap(), Money::from_cents(5));
}

#[test]
fn rejects_malformed_amounts() {
    let locale = LocaleConfig::default();
    for raw in ["", "   ", "12.345", "abc", "1.2.3"] {
        assert!(
            matches!(Money::parse(raw, &locale), Err(FinanceError::Validation(_))),
            "`{raw}` should be rejected"
        );
    }
}

#[test]
fn unknown_codes_fall_back_to_the_code() {
    assert_eq!(symbol_for("EUR"), "€");
    assert_eq!(symbol_for("JPY"), "JPY");
}

#[test]
fn config_locale_drives_parsing() {
    let config = Config {
        locale: LocaleConfig::pt_br(),
        currency: "BRL".into(),
        ..Config::default()
    };
    let parsed = Money::parse("2.500,00", &config.locale).unwrap();
    assert_eq!(parsed, Money::from_major(2_500));
    assert_eq!(parsed.format_currency(&config.currency, &config.locale), "R$ 2.500,00");
}
