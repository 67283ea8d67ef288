//! Tests for configuration module.

use super::*;

fn settings_with_key(symmetric_key: &str) -> Settings {
    Settings {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        token: TokenConfig {
            symmetric_key: symmetric_key.to_string(),
            access_token_duration_secs: 900,
            refresh_token_duration_secs: 86_400,
            issuer: "scoreit-api".to_string(),
            audience: "scoreit-app".to_string(),
        },
        policy: PolicyConfig {
            policy_path: "authz_policy.csv".to_string(),
            model_path: "authz_model.conf".to_string(),
        },
        users: Vec::new(),
    }
}

#[test_log::test]
fn test_validate_accepts_well_formed_settings() {
    let settings = settings_with_key("0123456789abcdef0123456789abcdef");
    assert!(settings.validate().is_ok());
}

#[test]
fn test_validate_rejects_short_key() {
    let settings = settings_with_key("too-short");
    let err = settings.validate().unwrap_err();
    assert!(matches!(err, CoreError::ConfigError(_)));
}

#[test]
fn test_validate_rejects_long_key() {
    let settings = settings_with_key("0123456789abcdef0123456789abcdef0");
    assert!(settings.validate().is_err());
}

#[test]
fn test_validate_rejects_non_positive_durations() {
    let mut settings = settings_with_key("0123456789abcdef0123456789abcdef");
    settings.token.access_token_duration_secs = 0;
    assert!(settings.validate().is_err());

    let mut settings = settings_with_key("0123456789abcdef0123456789abcdef");
    settings.token.refresh_token_duration_secs = -5;
    assert!(settings.validate().is_err());
}

#[test]
fn test_validate_rejects_durations_beyond_one_year() {
    let mut settings = settings_with_key("0123456789abcdef0123456789abcdef");
    settings.token.refresh_token_duration_secs = 9_000_000_000_000;
    assert!(matches!(
        settings.validate(),
        Err(CoreError::ConfigError(_))
    ));

    let mut settings = settings_with_key("0123456789abcdef0123456789abcdef");
    settings.token.access_token_duration_secs = MAX_TOKEN_DURATION_SECS + 1;
    assert!(settings.validate().is_err());

    let mut settings = settings_with_key("0123456789abcdef0123456789abcdef");
    settings.token.refresh_token_duration_secs = MAX_TOKEN_DURATION_SECS;
    assert!(settings.validate().is_ok());
}

#[test]
fn test_token_config_debug_redacts_key() {
    let settings = settings_with_key("0123456789abcdef0123456789abcdef");
    let debug_str = format!("{settings:?}");
    assert!(debug_str.contains("<redacted>"));
    assert!(!debug_str.contains("0123456789abcdef"));
}

#[test]
fn test_seed_user_debug_redacts_password_hash() {
    let mut settings = settings_with_key("0123456789abcdef0123456789abcdef");
    settings.users.push(SeedUserConfig {
        username: "alice".to_string(),
        password_hash: "$argon2id$SECRETHASH".to_string(),
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        roles: vec!["admin".to_string()],
    });

    let debug_str = format!("{settings:?}");
    assert!(!debug_str.contains("SECRETHASH"));
    assert!(debug_str.contains("alice"));
    assert!(debug_str.contains("password_hash: \"<redacted>\""));
}

#[test]
fn test_bind_addr() {
    let settings = settings_with_key("0123456789abcdef0123456789abcdef");
    assert_eq!(settings.server.bind_addr(), "127.0.0.1:8080");
}

#[test]
fn test_seed_user_roles_default_to_empty() {
    let toml = r#"
        username = "alice"
        password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
        name = "Alice"
        email = "alice@example.com"
    "#;
    let user: SeedUserConfig = Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()
        .and_then(Config::try_deserialize)
        .unwrap();

    assert_eq!(user.username, "alice");
    assert!(user.roles.is_empty());
}
