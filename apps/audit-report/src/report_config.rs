use std::env;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rolekeeper_application::AuditRecordQuery;
use rolekeeper_core::{AppError, AppResult, PrincipalId};
use rolekeeper_domain::AuditEventType;
use tracing_subscriber::EnvFilter;

const DEFAULT_PAGE_SIZE: usize = 500;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub max_connections: u32,
    pub query: AuditRecordQuery,
}

impl ReportConfig {
    pub fn load() -> AppResult<Self> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub fn from_lookup<F>(migrate_only: bool, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let database_url = non_empty("DATABASE_URL")
            .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))?;
        let max_connections = parse_or(
            "AUDIT_REPORT_MAX_CONNECTIONS",
            non_empty("AUDIT_REPORT_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        )?;
        let page_size = parse_or(
            "AUDIT_REPORT_PAGE_SIZE",
            non_empty("AUDIT_REPORT_PAGE_SIZE"),
            DEFAULT_PAGE_SIZE,
        )?;

        if max_connections == 0 {
            return Err(AppError::Validation(
                "AUDIT_REPORT_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }

        if page_size == 0 {
            return Err(AppError::Validation(
                "AUDIT_REPORT_PAGE_SIZE must be greater than zero".to_owned(),
            ));
        }

        let query = AuditRecordQuery {
            principal_id: parse_optional(
                "AUDIT_REPORT_PRINCIPAL_ID",
                non_empty("AUDIT_REPORT_PRINCIPAL_ID"),
            )?,
            from: parse_timestamp("AUDIT_REPORT_FROM", non_empty("AUDIT_REPORT_FROM"))?,
            to: parse_timestamp("AUDIT_REPORT_TO", non_empty("AUDIT_REPORT_TO"))?,
            event_type: parse_optional::<AuditEventType>(
                "AUDIT_REPORT_EVENT_TYPE",
                non_empty("AUDIT_REPORT_EVENT_TYPE"),
            )?,
            limit: page_size,
            offset: 0,
        };

        Ok(Self {
            migrate_only,
            database_url,
            max_connections,
            query,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Records go to stdout; diagnostics stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn parse_or<T>(name: &str, value: Option<String>, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(value) => value.parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

fn parse_optional<T>(name: &str, value: Option<String>) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|value| {
            value.parse::<T>().map_err(|error| {
                AppError::Validation(format!("invalid {name} value '{value}': {error}"))
            })
        })
        .transpose()
}

fn parse_timestamp(name: &str, value: Option<String>) -> AppResult<Option<DateTime<Utc>>> {
    value
        .map(|value| {
            DateTime::parse_from_rfc3339(value.as_str())
                .map(|timestamp| timestamp.with_timezone(&Utc))
                .map_err(|error| {
                    AppError::Validation(format!("invalid {name} value '{value}': {error}"))
                })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{TimeZone, Utc};
    use rolekeeper_core::{AppError, PrincipalId};
    use rolekeeper_domain::AuditEventType;

    use super::ReportConfig;

    fn load(pairs: &[(&str, &str)]) -> Result<ReportConfig, AppError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ReportConfig::from_lookup(false, |name| values.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let Ok(config) = load(&[("DATABASE_URL", "postgres://localhost/rolekeeper")]) else {
            panic!("config should load");
        };

        assert_eq!(config.max_connections, 5);
        assert_eq!(config.query.limit, 500);
        assert_eq!(config.query.offset, 0);
        assert!(config.query.principal_id.is_none());
        assert!(config.query.event_type.is_none());
        assert!(!config.migrate_only);
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(load(&[]), Err(AppError::Validation(_))));
        assert!(matches!(
            load(&[("DATABASE_URL", "  ")]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn filters_are_parsed() {
        let principal_id = PrincipalId::new();
        let principal = principal_id.to_string();
        let result = load(&[
            ("DATABASE_URL", "postgres://localhost/rolekeeper"),
            ("AUDIT_REPORT_PRINCIPAL_ID", principal.as_str()),
            ("AUDIT_REPORT_FROM", "2026-01-01T00:00:00Z"),
            ("AUDIT_REPORT_TO", "2026-02-01T01:00:00+01:00"),
            ("AUDIT_REPORT_EVENT_TYPE", "role_access_denied"),
            ("AUDIT_REPORT_PAGE_SIZE", "50"),
            ("AUDIT_REPORT_EVENT_UNUSED", "ignored"),
        ]);
        let Ok(config) = result else {
            panic!("config should load");
        };

        assert_eq!(config.query.principal_id, Some(principal_id));
        assert_eq!(
            config.query.from,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single()
        );
        assert_eq!(
            config.query.to,
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).single()
        );
        assert_eq!(
            config.query.event_type,
            Some(AuditEventType::RoleAccessDenied)
        );
        assert_eq!(config.query.limit, 50);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let base = ("DATABASE_URL", "postgres://localhost/rolekeeper");

        for invalid in [
            ("AUDIT_REPORT_PRINCIPAL_ID", "not-a-uuid"),
            ("AUDIT_REPORT_FROM", "yesterday"),
            ("AUDIT_REPORT_EVENT_TYPE", "role_granted"),
            ("AUDIT_REPORT_PAGE_SIZE", "0"),
            ("AUDIT_REPORT_PAGE_SIZE", "-3"),
            ("AUDIT_REPORT_MAX_CONNECTIONS", "0"),
        ] {
            assert!(
                matches!(load(&[base, invalid]), Err(AppError::Validation(_))),
                "{invalid:?} should be rejected"
            );
        }
    }
}
