use crate::config::*;
use std::time::Duration;

#[test]
fn mode_names() {
    assert_eq!("exact".parse::<SearchMode>(), Ok(SearchMode::Exact));
    assert_eq!("DEFAULT_AS_ANY".parse::<ChargeMode>(), Ok(ChargeMode::DefaultAsAny));
    assert_eq!(
        "sometimes".parse::<StereoMode>(),
        Err(ConfigError::UnknownMode {
            kind: "stereo",
            name: "sometimes".to_string(),
        })
    );
    for &mode in IsotopeMode::ALL {
        assert_eq!(mode.to_string().parse::<IsotopeMode>(), Ok(mode));
    }
    for &mode in RadicalMode::ALL {
        assert_eq!(mode.to_string().parse::<RadicalMode>(), Ok(mode));
    }
}

#[test]
fn defaults() {
    let config = SearchConfig::new();
    assert_eq!(config.search, SearchMode::Substructure);
    assert_eq!(config.charge, ChargeMode::Ignore);
    assert_eq!(config.stereo, StereoMode::Ignore);
    assert_eq!(config.validate(), Ok(()));

    let strict = SearchConfig::strict_exact();
    assert_eq!(strict.search, SearchMode::Exact);
    assert_eq!(strict.radical, RadicalMode::DefaultAsStandard);
}

#[test]
fn limits() {
    let config = SearchConfig::new().with_iteration_limit(Some(0));
    assert_eq!(config.validate(), Err(ConfigError::LimitOutOfRange(0)));
    let config = SearchConfig::new()
        .with_iteration_limit(Some(10_000))
        .with_time_limit(Some(Duration::from_millis(50)));
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn similarity_bounds() {
    assert!(SimilarityConfig::new(0.8, 3).is_ok());
    assert!(SimilarityConfig::new(1.0, MAX_RADIUS).is_ok());
    assert_eq!(
        SimilarityConfig::new(0.4, 3),
        Err(ConfigError::ThresholdOutOfRange(0.4))
    );
    assert_eq!(
        SimilarityConfig::new(0.9, 0),
        Err(ConfigError::RadiusOutOfRange(0))
    );
    assert_eq!(
        SimilarityConfig::new(0.9, MAX_RADIUS + 1),
        Err(ConfigError::RadiusOutOfRange(MAX_RADIUS + 1))
    );
    let default = SimilarityConfig::default();
    assert_eq!(default.radius(), SimilarityConfig::DEFAULT_RADIUS);
}
