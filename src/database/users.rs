// SQLite implementation of the remote user store. Used as the local
// backend and in integration tests.
use crate::error::{AppError, AppResult};
use crate::models::{Account, ContactEntry, DerivedBirthday};
use crate::recurrence;
use crate::sync::RemoteUserStore;
use crate::utils::{normalize_email, normalize_phone};
use async_trait::async_trait;
use log::info;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};

const ACCOUNT_COLUMNS: &str =
    "id, user_id, first_name, last_name, email, phone, birth_date, is_public, created_at";

#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn birthday_from_row(row: &SqliteRow) -> AppResult<DerivedBirthday> {
    let event_type: String = row.try_get("event_type")?;
    Ok(DerivedBirthday {
        id: row.try_get("id")?,
        contact_name: row.try_get("contact_name")?,
        contact_id: row.try_get("contact_id")?,
        birth_date: row.try_get("birth_date")?,
        event_type: event_type.parse()?,
        from_contact: row.try_get("from_contact")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Plain insert: a birthday id already on file, under any owner, is
/// rejected rather than overwritten.
async fn insert_birthday<'e, E>(
    executor: E,
    owner_id: &str,
    birthday: &DerivedBirthday,
) -> AppResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO derived_birthdays
            (id, owner_id, contact_name, contact_id, birth_date, event_type, from_contact, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&birthday.id)
    .bind(owner_id)
    .bind(&birthday.contact_name)
    .bind(&birthday.contact_id)
    .bind(birthday.birth_date)
    .bind(birthday.event_type.as_str())
    .bind(birthday.from_contact)
    .bind(birthday.created_at)
    .execute(executor)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::already_exists(format!("Birthday {}", birthday.id))
        }
        other => other.into(),
    })?;

    Ok(())
}

#[async_trait]
impl RemoteUserStore for SqliteUserStore {
    async fn create_account(&self, account: &Account) -> AppResult<()> {
        account.validate(recurrence::today())?;

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM accounts WHERE user_id = ? OR lower(email) = ?",
        )
        .bind(&account.user_id)
        .bind(normalize_email(&account.email))
        .fetch_one(&self.pool)
        .await?;

        if existing > 0 {
            return Err(AppError::already_exists(format!(
                "An account for {}",
                account.email
            )));
        }

        sqlx::query(&format!(
            "INSERT INTO accounts ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            ACCOUNT_COLUMNS
        ))
        .bind(&account.id)
        .bind(&account.user_id)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.email.trim())
        .bind(&account.phone)
        .bind(account.birth_date)
        .bind(account.is_public)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        info!("Created account {}", account.user_id);
        Ok(())
    }

    async fn current_account(&self, account_id: &str) -> AppResult<Account> {
        self.account_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::not_found("your account"))
    }

    async fn account_by_id(&self, id: &str) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE id = ?",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn search_by_email(&self, email: &str) -> AppResult<Vec<Account>> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(Vec::new());
        }

        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE lower(email) = ? AND is_public = 1 ORDER BY id",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn search_by_phone(&self, phone: &str) -> AppResult<Vec<Account>> {
        let phone = normalize_phone(phone);
        if phone.is_empty() {
            return Ok(Vec::new());
        }

        // Stored numbers keep their formatting, so compare in Rust
        let candidates = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE phone IS NOT NULL AND is_public = 1 ORDER BY id",
            ACCOUNT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(candidates
            .into_iter()
            .filter(|a| a.phone.as_deref().map(normalize_phone).as_deref() == Some(phone.as_str()))
            .collect())
    }

    async fn save_contacts(&self, account_id: &str, entries: &[ContactEntry]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM contact_entries WHERE owner_id = ?")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO contact_entries
                    (owner_id, id, name, phone, email, is_app_user, matched_account_id, synced_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(account_id)
            .bind(&entry.id)
            .bind(&entry.name)
            .bind(&entry.phone)
            .bind(&entry.email)
            .bind(entry.is_app_user)
            .bind(&entry.matched_account_id)
            .bind(entry.synced_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Saved {} contacts for account {}", entries.len(), account_id);
        Ok(())
    }

    async fn get_contacts(&self, account_id: &str) -> AppResult<Vec<ContactEntry>> {
        let contacts = sqlx::query_as::<_, ContactEntry>(
            r#"
            SELECT id, name, phone, email, is_app_user, matched_account_id, synced_at
            FROM contact_entries
            WHERE owner_id = ?
            ORDER BY name COLLATE NOCASE ASC, id ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    async fn save_birthdays(&self, account_id: &str, birthdays: &[DerivedBirthday]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM derived_birthdays WHERE owner_id = ? AND from_contact = 1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        for birthday in birthdays {
            insert_birthday(&mut *tx, account_id, birthday).await?;
        }

        tx.commit().await?;
        info!("Saved {} derived birthdays for account {}", birthdays.len(), account_id);
        Ok(())
    }

    async fn get_birthdays(&self, account_id: &str) -> AppResult<Vec<DerivedBirthday>> {
        let rows = sqlx::query(
            r#"
            SELECT id, contact_name, contact_id, birth_date, event_type, from_contact, created_at
            FROM derived_birthdays
            WHERE owner_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(birthday_from_row).collect()
    }

    async fn add_birthday(&self, account_id: &str, birthday: &DerivedBirthday) -> AppResult<()> {
        insert_birthday(&self.pool, account_id, birthday).await?;
        info!("Added birthday for '{}' to account {}", birthday.contact_name, account_id);
        Ok(())
    }

    async fn delete_birthday(&self, id: &str, account_id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM derived_birthdays WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("birthday {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::{Contact, EventType};
    use chrono::{NaiveDate, Utc};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    async fn setup_test_store() -> (Database, SqliteUserStore) {
        let db = Database::in_memory().await.unwrap();
        let store = db.user_store();
        (db, store)
    }

    #[tokio::test]
    async fn test_create_and_fetch_account() {
        let (_db, store) = setup_test_store().await;
        let account = Account::new("jdoe", "Jane", "Doe", "Jane@Example.com")
            .with_phone("+1 555 010 0001")
            .with_birth_date(d(1990, 5, 1));

        store.create_account(&account).await.unwrap();

        let fetched = store.current_account(&account.id).await.unwrap();
        assert_eq!(fetched.user_id, "jdoe");
        assert_eq!(fetched.birth_date, Some(d(1990, 5, 1)));
        assert!(fetched.is_public);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (_db, store) = setup_test_store().await;
        store
            .create_account(&Account::new("jdoe", "Jane", "Doe", "jane@example.com"))
            .await
            .unwrap();

        let err = store
            .create_account(&Account::new("jdoe2", "Jane", "Doe", "JANE@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_invalid_account_rejected() {
        let (_db, store) = setup_test_store().await;
        let err = store
            .create_account(&Account::new("x", "J", "Doe", "jane@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_current_account_missing() {
        let (_db, store) = setup_test_store().await;
        let err = store.current_account("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_respects_visibility() {
        let (_db, store) = setup_test_store().await;
        let visible = Account::new("vis", "Vera", "Ible", "vera@example.com").with_phone("(555) 010-0002");
        let hidden = Account::new("hid", "Hugo", "Den", "hugo@example.com").with_phone("5550100003").hidden();
        store.create_account(&visible).await.unwrap();
        store.create_account(&hidden).await.unwrap();

        assert_eq!(store.search_by_email("VERA@example.com").await.unwrap().len(), 1);
        assert!(store.search_by_email("hugo@example.com").await.unwrap().is_empty());
        assert_eq!(store.search_by_phone("555-010-0002").await.unwrap().len(), 1);
        assert!(store.search_by_phone("5550100003").await.unwrap().is_empty());
        assert!(store.search_by_phone("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_contacts_replaces_set() {
        let (_db, store) = setup_test_store().await;
        let now = Utc::now();
        let first = vec![
            ContactEntry::from_contact(&Contact::new("c-1", "Ana"), now),
            ContactEntry::from_contact(&Contact::new("c-2", "Bo"), now),
        ];
        store.save_contacts("owner", &first).await.unwrap();

        let mut second = ContactEntry::from_contact(&Contact::new("c-3", "Cy"), now);
        second.mark_matched("acct-7");
        store.save_contacts("owner", &[second]).await.unwrap();

        let contacts = store.get_contacts("owner").await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].id, "c-3");
        assert!(contacts[0].is_app_user);
        assert_eq!(contacts[0].matched_account_id.as_deref(), Some("acct-7"));

        assert!(store.get_contacts("someone-else").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_birthdays_keeps_manual_entries() {
        let (_db, store) = setup_test_store().await;
        let manual = DerivedBirthday::manual("Gran", d(1941, 11, 2), EventType::Birthday);
        store.add_birthday("owner", &manual).await.unwrap();

        let mut derived = DerivedBirthday::manual("Ana", d(1992, 3, 8), EventType::Birthday);
        derived.from_contact = true;
        derived.contact_id = Some("c-1".to_string());
        store.save_birthdays("owner", &[derived.clone()]).await.unwrap();
        store.save_birthdays("owner", &[derived.clone()]).await.unwrap();

        let birthdays = store.get_birthdays("owner").await.unwrap();
        assert_eq!(birthdays.len(), 2);
        assert!(birthdays.contains(&manual));
        assert!(birthdays.contains(&derived));

        store.save_birthdays("owner", &[]).await.unwrap();
        assert_eq!(store.get_birthdays("owner").await.unwrap(), vec![manual]);
    }

    #[tokio::test]
    async fn test_delete_birthday() {
        let (_db, store) = setup_test_store().await;
        let manual = DerivedBirthday::manual("Gran", d(1941, 11, 2), EventType::Birthday);
        store.add_birthday("owner", &manual).await.unwrap();

        // Another owner cannot delete it
        assert!(store.delete_birthday(&manual.id, "intruder").await.is_err());
        store.delete_birthday(&manual.id, "owner").await.unwrap();

        let err = store.delete_birthday(&manual.id, "owner").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_birthday_cannot_take_over_another_owners_row() {
        let (_db, store) = setup_test_store().await;
        let manual = DerivedBirthday::manual("Gran", d(1941, 11, 2), EventType::Birthday);
        store.add_birthday("owner", &manual).await.unwrap();

        let err = store.add_birthday("intruder", &manual).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));

        let owned = store.get_birthdays("owner").await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, manual.id);
        assert!(store.get_birthdays("intruder").await.unwrap().is_empty());
    }
}
