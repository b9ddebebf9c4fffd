use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::de::DeserializeOwned;

/// Load a configuration struct from `configuration.*` and the environment.
///
/// `.env` is read first if present. Environment variables use `prefix` and a
/// `__` separator for nesting, so `ACL__DATABASE__URL` maps to
/// `database.url` when `prefix` is `"ACL"`.
pub fn load<T: DeserializeOwned>(prefix: &str) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let config = Cfg::builder()
        .add_source(File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix(prefix)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serial_test::serial;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
        #[serde(default)]
        nested: Nested,
    }

    #[derive(Debug, Default, Deserialize)]
    struct Nested {
        #[serde(default)]
        size: u32,
    }

    #[test]
    #[serial]
    fn test_load_reads_prefixed_environment() {
        // SAFETY: serialized with the other environment-mutating tests
        unsafe {
            std::env::set_var("CORETEST__NAME", "fleet");
            std::env::set_var("CORETEST__NESTED__SIZE", "7");
        }

        let sample: Sample = load("CORETEST").unwrap();
        assert_eq!(sample.name, "fleet");
        assert_eq!(sample.nested.size, 7);

        unsafe {
            std::env::remove_var("CORETEST__NAME");
            std::env::remove_var("CORETEST__NESTED__SIZE");
        }
    }

    #[test]
    #[serial]
    fn test_load_missing_required_field_is_config_error() {
        let result: Result<Sample, AppError> = load("CORETEST_MISSING");
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
