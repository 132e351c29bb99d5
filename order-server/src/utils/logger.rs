//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production environments
//! Features:
//! - Daily rotating application logs (deleted after 14 days)
//! - Permanent audit logs (never deleted), fed by `target: "audit"` events

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, prelude::*};

/// Application logs older than this are removed by [`cleanup_old_logs`]
const APP_LOG_RETENTION_DAYS: i64 = 14;

/// Clean up old application log files (older than 14 days)
///
/// Only `app/app.YYYY-MM-DD` files are considered; audit logs are kept forever.
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<()> {
    use chrono::{Local, TimeZone};

    let cutoff = Local::now() - chrono::Duration::days(APP_LOG_RETENTION_DAYS);

    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        // RollingFileAppender names files `app.YYYY-MM-DD`
        let Some(date_part) = name.strip_prefix("app.") else {
            continue;
        };
        let Ok(naive_date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d") else {
            continue;
        };

        if let Some(local_datetime) = naive_date
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| Local.from_local_datetime(&naive).single())
            && local_datetime < cutoff
        {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
        }
    }

    Ok(())
}

/// Initialize the logging system with daily rotating logs
///
/// # Arguments
/// * `level` - Log level (e.g., "info", "debug", "warn"); `RUST_LOG` wins when set
/// * `json_format` - Whether to use JSON format (true for production, false for development)
/// * `log_dir` - Optional directory for file logging (e.g., Some("./data/logs"))
///
/// Must be called from within a tokio runtime when `log_dir` is set (a cleanup
/// task is spawned).
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers = Vec::new();

    // Console layer
    if json_format {
        layers.push(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        );
    }

    if let Some(dir) = log_dir {
        let log_dir = Path::new(dir);
        let app_log_dir = log_dir.join("app");
        let audit_log_dir = log_dir.join("audit");
        fs::create_dir_all(&app_log_dir)?;
        fs::create_dir_all(&audit_log_dir)?;

        // Standard application logs (rotated daily, subject to 14-day cleanup)
        let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
        let app_writer = std::sync::Mutex::new(app_log);
        let app_filter =
            tracing_subscriber::filter::filter_fn(|meta| meta.target() != "audit");

        // Permanent audit logs (never deleted)
        let audit_log = RollingFileAppender::new(Rotation::DAILY, audit_log_dir, "audit");
        let audit_writer = std::sync::Mutex::new(audit_log);
        let audit_filter =
            tracing_subscriber::filter::filter_fn(|meta| meta.target() == "audit");

        if json_format {
            layers.push(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_thread_ids(true)
                    .with_writer(app_writer)
                    .with_filter(app_filter)
                    .boxed(),
            );
            layers.push(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(audit_writer)
                    .with_filter(audit_filter)
                    .boxed(),
            );
        } else {
            layers.push(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(false)
                    .with_writer(app_writer)
                    .with_filter(app_filter)
                    .boxed(),
            );
            layers.push(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(audit_writer)
                    .with_filter(audit_filter)
                    .boxed(),
            );
        }

        tokio::spawn(periodic_cleanup(log_dir.to_path_buf()));
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()?;

    Ok(())
}

/// Periodic cleanup task - runs every hour to clean old logs
async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        sleep(Duration::from_secs(3600)).await;

        if let Err(e) = cleanup_old_logs(&log_dir) {
            tracing::error!(error = %e, "Failed to cleanup old logs");
        }
    }
}

/// Audit log helper - mirrors a committed mutation into the permanent audit log
///
/// ```ignore
/// audit_log!("u1", 1, "orders", "UPDATE orders SET status = 2 WHERE order_id = 7");
/// ```
#[macro_export]
macro_rules! audit_log {
    ($user_id:expr, $project_id:expr, $table:expr, $query:expr) => {
        tracing::info!(
            target: "audit",
            user_id = $user_id,
            project_id = $project_id,
            table = $table,
            query = $query,
            timestamp = chrono::Local::now().to_rfc3339(),
            "AUDIT"
        );
    };
}
