//! Cross-cutting helpers for the server binary and the HTTP layer: logging
//! setup, startup environment checks and small response types.

pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn log_format_parses_known_values() {
        assert_eq!("json".parse::<utils::logging::LogFormat>().ok(), Some(utils::logging::LogFormat::Json));
        assert_eq!("COMPACT".parse::<utils::logging::LogFormat>().ok(), Some(utils::logging::LogFormat::Compact));
        assert!("yaml".parse::<utils::logging::LogFormat>().is_err());
    }
}
