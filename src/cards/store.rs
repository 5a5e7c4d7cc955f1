use crate::database::BlobCollection;
use crate::error::{AppError, AppResult};
use crate::models::{Card, CardTemplate, EventType};
use log::info;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

pub const CARD_HISTORY_NAMESPACE: &str = "cards.history";
pub const TEMPLATES_NAMESPACE: &str = "cards.templates";

/// Cards composed so far, newest first.
pub struct CardHistory {
    cards: BlobCollection<Card>,
    write_lock: Mutex<()>,
}

impl CardHistory {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            cards: BlobCollection::new(pool, CARD_HISTORY_NAMESPACE),
            write_lock: Mutex::new(()),
        }
    }

    pub async fn save(&self, card: &Card) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut cards = self.cards.load().await?;
        cards.insert(card.id.clone(), card.clone());
        self.cards.store(&cards).await?;

        info!("Saved {} card for {}", card.occasion, card.recipient);
        Ok(())
    }

    pub async fn all(&self) -> AppResult<Vec<Card>> {
        let mut cards: Vec<Card> = self.cards.load().await?.into_values().collect();
        cards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cards)
    }

    pub async fn for_event(&self, event_id: &str) -> AppResult<Vec<Card>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|c| c.event_id.as_deref() == Some(event_id))
            .collect())
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut cards = self.cards.load().await?;
        if cards.remove(id).is_none() {
            return Err(AppError::not_found(format!("card {}", id)));
        }
        self.cards.store(&cards).await
    }
}

/// User-defined message templates, ordered by name.
pub struct TemplateStore {
    templates: BlobCollection<CardTemplate>,
    write_lock: Mutex<()>,
}

impl TemplateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            templates: BlobCollection::new(pool, TEMPLATES_NAMESPACE),
            write_lock: Mutex::new(()),
        }
    }

    pub async fn save(&self, template: &CardTemplate) -> AppResult<()> {
        if template.name.is_empty() {
            return Err(AppError::validation("Template name is required"));
        }

        let _guard = self.write_lock.lock().await;
        let mut templates = self.templates.load().await?;
        templates.insert(template.id.clone(), template.clone());
        self.templates.store(&templates).await?;

        info!("Saved template '{}'", template.name);
        Ok(())
    }

    pub async fn all(&self) -> AppResult<Vec<CardTemplate>> {
        let mut templates: Vec<CardTemplate> = self.templates.load().await?.into_values().collect();
        templates.sort_by_cached_key(|t| t.name.to_lowercase());
        Ok(templates)
    }

    pub async fn for_occasion(&self, occasion: EventType) -> AppResult<Vec<CardTemplate>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|t| t.occasion == occasion)
            .collect())
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut templates = self.templates.load().await?;
        if templates.remove(id).is_none() {
            return Err(AppError::not_found(format!("template {}", id)));
        }
        self.templates.store(&templates).await
    }
}
