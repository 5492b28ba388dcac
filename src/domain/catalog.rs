//! Usage: Built-in schemas for the console settings buckets. Pages are data, not logic.

use crate::domain::schema::{FieldSpec, SettingsSchema};

pub const RESOURCE_KEYS: [&str; 8] = [
    "security",
    "connection",
    "resource",
    "advanced",
    "system",
    "email",
    "notification",
    "storage",
];

const MAX_API_KEY_ROTATION_DAYS: i64 = 365;
const DEFAULT_API_KEY_ROTATION_DAYS: i64 = 90;
const MAX_CONNECTIONS: i64 = 1000;
const DEFAULT_MAX_CONNECTIONS: i64 = 100;
const MAX_RETRY_DELAY_SECONDS: i64 = 3600;
const DEFAULT_RETRY_DELAY_SECONDS: i64 = 5;
const MAX_MEMORY_MB: i64 = 65536;
const DEFAULT_MEMORY_MB: i64 = 2048;
const MAX_QUEUE_SIZE: i64 = 10000;
const DEFAULT_QUEUE_SIZE: i64 = 500;
const MAX_HEALTH_CHECK_INTERVAL_SECONDS: i64 = 3600;
const DEFAULT_HEALTH_CHECK_INTERVAL_SECONDS: i64 = 30;
const MAX_RETENTION_DAYS: i64 = 3650;
const DEFAULT_RETENTION_DAYS: i64 = 365;

fn security() -> Result<SettingsSchema, String> {
    SettingsSchema::new(
        "security",
        vec![
            FieldSpec::boolean("enforce_tls", true),
            FieldSpec::integer(
                "api_key_rotation_days",
                1,
                MAX_API_KEY_ROTATION_DAYS,
                DEFAULT_API_KEY_ROTATION_DAYS,
            ),
            FieldSpec::integer("session_timeout_minutes", 5, 1440, 60),
            FieldSpec::enumeration("breach_detection", &["off", "standard", "strict"], "standard"),
            // Only strict mode exposes a tunable threshold.
            FieldSpec::integer("breach_alert_threshold", 1, 100, 5)
                .visible_when("breach_detection", "strict"),
            FieldSpec::list("allowed_origins", 32, 255),
        ],
    )
}

fn connection() -> Result<SettingsSchema, String> {
    SettingsSchema::new(
        "connection",
        vec![
            FieldSpec::boolean("enable_pooling", true),
            FieldSpec::integer("max_connections", 1, MAX_CONNECTIONS, DEFAULT_MAX_CONNECTIONS),
            FieldSpec::integer("min_idle_connections", 0, 100, 5),
            FieldSpec::integer("connection_timeout_seconds", 1, 300, 30),
            FieldSpec::integer(
                "retry_delay_seconds",
                1,
                MAX_RETRY_DELAY_SECONDS,
                DEFAULT_RETRY_DELAY_SECONDS,
            ),
            FieldSpec::integer("retry_max_attempts", 0, 20, 3),
            FieldSpec::enumeration(
                "load_balancing",
                &["round_robin", "least_connections", "random"],
                "round_robin",
            ),
        ],
    )
}

fn resource() -> Result<SettingsSchema, String> {
    SettingsSchema::new(
        "resource",
        vec![
            FieldSpec::integer("max_memory_mb", 128, MAX_MEMORY_MB, DEFAULT_MEMORY_MB),
            FieldSpec::integer("max_cpu_percent", 1, 100, 80),
            FieldSpec::integer("request_queue_size", 1, MAX_QUEUE_SIZE, DEFAULT_QUEUE_SIZE),
            FieldSpec::integer("worker_threads", 1, 256, 8),
        ],
    )
}

fn advanced() -> Result<SettingsSchema, String> {
    SettingsSchema::new(
        "advanced",
        vec![
            FieldSpec::enumeration(
                "log_level",
                &["error", "warn", "info", "debug", "trace"],
                "info",
            ),
            FieldSpec::boolean("debug_mode", false),
            FieldSpec::integer("config_poll_seconds", 5, 3600, 60),
            FieldSpec::list("experimental_features", 16, 64),
        ],
    )
}

fn system() -> Result<SettingsSchema, String> {
    SettingsSchema::new(
        "system",
        vec![
            FieldSpec::integer(
                "health_check_interval_seconds",
                5,
                MAX_HEALTH_CHECK_INTERVAL_SECONDS,
                DEFAULT_HEALTH_CHECK_INTERVAL_SECONDS,
            ),
            FieldSpec::boolean("telemetry_enabled", false),
            FieldSpec::enumeration("maintenance_mode", &["off", "read_only", "full"], "off"),
            FieldSpec::text("status_page_url", 255, ""),
        ],
    )
}

fn email() -> Result<SettingsSchema, String> {
    SettingsSchema::new(
        "email",
        vec![
            FieldSpec::text("smtp_host", 255, "localhost").required(),
            FieldSpec::integer("smtp_port", 1, 65535, 587),
            FieldSpec::enumeration("encryption", &["none", "starttls", "tls"], "starttls"),
            FieldSpec::enumeration("auth", &["none", "password"], "none"),
            FieldSpec::text("smtp_username", 128, "").visible_when("auth", "password"),
            FieldSpec::text("sender_address", 255, "console@example.com").required(),
            FieldSpec::text("reply_to", 255, ""),
        ],
    )
}

fn notification() -> Result<SettingsSchema, String> {
    SettingsSchema::new(
        "notification",
        vec![
            FieldSpec::boolean("notify_on_breach", true),
            FieldSpec::boolean("notify_on_health_degraded", true),
            FieldSpec::enumeration("channel", &["toast", "email", "webhook"], "toast"),
            FieldSpec::text("webhook_url", 255, "").visible_when("channel", "webhook"),
            FieldSpec::enumeration(
                "digest_frequency",
                &["immediate", "hourly", "daily"],
                "immediate",
            ),
        ],
    )
}

fn storage() -> Result<SettingsSchema, String> {
    SettingsSchema::new(
        "storage",
        vec![
            FieldSpec::enumeration(
                "provider",
                &["local", "s3", "azure_blob", "sharepoint"],
                "local",
            ),
            FieldSpec::text("bucket", 128, "").visible_when("provider", "s3"),
            FieldSpec::text("region", 64, "").visible_when("provider", "s3"),
            FieldSpec::text("container", 128, "").visible_when("provider", "azure_blob"),
            FieldSpec::text("tenant_id", 64, "").visible_when("provider", "sharepoint"),
            FieldSpec::text("site_url", 255, "").visible_when("provider", "sharepoint"),
            FieldSpec::integer("max_upload_mb", 1, 1024, 64),
            FieldSpec::integer("retention_days", 1, MAX_RETENTION_DAYS, DEFAULT_RETENTION_DAYS),
        ],
    )
}

/// All console settings schemas. Built-in schemas are static data; a
/// construction failure here is a programming error caught by the tests
/// below, so this is the one place construction is allowed to panic.
pub fn catalog() -> Vec<SettingsSchema> {
    vec![
        security().expect("built-in schema: security"),
        connection().expect("built-in schema: connection"),
        resource().expect("built-in schema: resource"),
        advanced().expect("built-in schema: advanced"),
        system().expect("built-in schema: system"),
        email().expect("built-in schema: email"),
        notification().expect("built-in schema: notification"),
        storage().expect("built-in schema: storage"),
    ]
}

pub fn schema_for(key: &str) -> Option<SettingsSchema> {
    catalog().into_iter().find(|s| s.key() == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validate::validate_payload;

    #[test]
    fn catalog_covers_every_console_bucket() {
        let keys: Vec<String> = catalog().iter().map(|s| s.key().to_string()).collect();
        assert_eq!(keys.len(), RESOURCE_KEYS.len());
        for key in RESOURCE_KEYS {
            assert!(keys.iter().any(|k| k == key), "missing schema for `{key}`");
        }
    }

    #[test]
    fn every_schema_validates_its_own_defaults() {
        for schema in catalog() {
            let violations = validate_payload(&schema, &schema.defaults());
            assert!(
                violations.is_empty(),
                "schema `{}` defaults invalid: {violations:?}",
                schema.key()
            );
        }
    }

    #[test]
    fn conditional_fields_are_hidden_under_defaults() {
        let storage = schema_for("storage").expect("storage schema");
        let visible = storage.visible_payload(&storage.defaults());
        for hidden in ["bucket", "region", "container", "tenant_id", "site_url"] {
            assert!(!visible.contains_key(hidden), "{hidden} should be hidden");
        }
        assert!(visible.contains_key("provider"));
    }

    #[test]
    fn schema_for_unknown_key_returns_none() {
        assert!(schema_for("billing").is_none());
    }
}
