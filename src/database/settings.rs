use crate::error::AppResult;
use crate::models::{Setting, Settings};
use log::warn;
use sqlx::SqlitePool;

fn parse_reminder_days(value: &str) -> Option<Vec<u32>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

pub async fn get(pool: &SqlitePool) -> AppResult<Settings> {
    let rows = sqlx::query_as::<_, Setting>("SELECT key, value FROM settings")
        .fetch_all(pool)
        .await?;

    let mut settings = Settings::default();
    for setting in rows {
        match setting.key.as_str() {
            "default_reminder_days" => match parse_reminder_days(&setting.value) {
                Some(days) => settings.default_reminder_days = days,
                None => warn!("Ignoring malformed default_reminder_days: {}", setting.value),
            },
            "notifications_enabled" => {
                settings.notifications_enabled = setting.value.parse().unwrap_or(true)
            }
            "calendar_export_default" => {
                settings.calendar_export_default = setting.value.parse().unwrap_or(false)
            }
            "leap_day_policy" => {
                settings.leap_day_policy = setting.value.parse().unwrap_or_default()
            }
            _ => {}
        }
    }

    Ok(settings)
}

pub async fn update(pool: &SqlitePool, settings: &Settings) -> AppResult<()> {
    let reminder_days = settings
        .default_reminder_days
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let updates = [
        ("default_reminder_days", reminder_days),
        ("notifications_enabled", settings.notifications_enabled.to_string()),
        ("calendar_export_default", settings.calendar_export_default.to_string()),
        ("leap_day_policy", settings.leap_day_policy.to_string()),
    ];

    let mut tx = pool.begin().await?;
    for (key, value) in updates {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    #[test]
    fn test_parse_reminder_days() {
        assert_eq!(parse_reminder_days("1, 7,30"), Some(vec![1, 7, 30]));
        assert_eq!(parse_reminder_days(""), Some(vec![]));
        assert_eq!(parse_reminder_days("1,x"), None);
    }

    #[tokio::test]
    async fn test_malformed_values_fall_back_to_defaults() {
        let db = Database::in_memory().await.unwrap();
        sqlx::query("INSERT INTO settings (key, value) VALUES ('leap_day_policy', 'mar30'), ('default_reminder_days', 'soon')")
            .execute(&db.pool)
            .await
            .unwrap();

        let settings = get(&db.pool).await.unwrap();
        assert_eq!(settings, Settings::default());
    }
}
