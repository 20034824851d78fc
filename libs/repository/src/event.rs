use bson::oid::ObjectId;
use bson::{doc, DateTime};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::info;

use entity::prelude::*;

use crate::{IntoResponse, RepositoryError, Response};

pub(crate) const EVENTS_COLLECTION: &str = "events";

#[derive(Clone, Debug)]
pub struct EventRepository {
    db: Database,
}

/// Stored shape of an event, camelCase on the wire.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub overview: String,
    pub image: String,
    pub venue: String,
    pub location: String,
    pub date: String,
    pub time: String,
    pub mode: EventMode,
    pub audience: String,
    pub agenda: Vec<String>,
    pub organizer: String,
    pub tags: Vec<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl From<EventDocument> for EventEntity {
    fn from(value: EventDocument) -> Self {
        EventEntity {
            id: value.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: value.title,
            slug: value.slug,
            description: value.description,
            overview: value.overview,
            image: value.image,
            venue: value.venue,
            location: value.location,
            date: value.date,
            time: value.time,
            mode: value.mode,
            audience: value.audience,
            agenda: value.agenda,
            organizer: value.organizer,
            tags: value.tags,
            created_at: value.created_at.to_chrono(),
            updated_at: value.updated_at.to_chrono(),
        }
    }
}

impl From<EventEntity> for EventDocument {
    fn from(value: EventEntity) -> Self {
        EventDocument {
            id: ObjectId::parse_str(&value.id).ok(),
            title: value.title,
            slug: value.slug,
            description: value.description,
            overview: value.overview,
            image: value.image,
            venue: value.venue,
            location: value.location,
            date: value.date,
            time: value.time,
            mode: value.mode,
            audience: value.audience,
            agenda: value.agenda,
            organizer: value.organizer,
            tags: value.tags,
            created_at: DateTime::from_chrono(value.created_at),
            updated_at: DateTime::from_chrono(value.updated_at),
        }
    }
}

pub(crate) async fn exists(
    db: &Database,
    object_id: ObjectId,
) -> Response<bool> {
    let count = db
        .collection::<EventDocument>(EVENTS_COLLECTION)
        .count_documents(doc! { "_id": object_id }, None)
        .await
        .into_response("in count events")?;

    Ok(count > 0)
}

/// Slug uniqueness lives here, in the storage layer, not in validation.
pub(crate) async fn setup_collection(db: &Database) -> Response<()> {
    let collection: Collection<EventDocument> =
        db.collection(EVENTS_COLLECTION);

    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "slug": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            None,
        )
        .await
        .into_response("in create unique slug index")?;

    Ok(())
}

impl EventRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> Collection<EventDocument> {
        self.db.collection(EVENTS_COLLECTION)
    }

    /// Validates and normalizes the draft, then inserts it. Nothing is
    /// written when validation fails.
    pub async fn create(&self, draft: EventDraft) -> Response<EventEntity> {
        let mut event = draft.validate()?;

        let now = Utc::now();
        event.created_at = now;
        event.updated_at = now;

        let mut document = EventDocument::from(event);
        document.id = Some(ObjectId::new());

        self.collection()
            .insert_one(&document, None)
            .await
            .map_err(|e| write_error(e, &document.slug, "in insert event"))?;

        info!(task = "insert event", slug = document.slug.as_str());

        Ok(document.into())
    }

    /// Loads the stored record, applies the partial update (changed fields
    /// only are re-normalized), and replaces the document.
    pub async fn update(
        &self,
        id: &str,
        update: EventUpdate,
    ) -> Response<EventEntity> {
        let mut event = self.find_by_id(id).await?.ok_or_else(|| {
            RepositoryError::EventNotFound { id: id.to_string() }
        })?;

        event.apply(update)?;
        event.updated_at = Utc::now();

        let document = EventDocument::from(event);
        let Some(object_id) = document.id else {
            return Err(RepositoryError::EventNotFound { id: id.to_string() });
        };

        self.collection()
            .replace_one(doc! { "_id": object_id }, &document, None)
            .await
            .map_err(|e| write_error(e, &document.slug, "in replace event"))?;

        Ok(document.into())
    }

    pub async fn find_by_id(&self, id: &str) -> Response<Option<EventEntity>> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let document = self
            .collection()
            .find_one(doc! { "_id": object_id }, None)
            .await
            .into_response("in find event by id")?;

        Ok(document.map(EventEntity::from))
    }

    pub async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Response<Option<EventEntity>> {
        let document = self
            .collection()
            .find_one(doc! { "slug": slug }, None)
            .await
            .into_response("in find event by slug")?;

        Ok(document.map(EventEntity::from))
    }

    pub async fn find_all(&self) -> Response<Vec<EventEntity>> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .build();

        let documents: Vec<EventDocument> = self
            .collection()
            .find(None, options)
            .await
            .into_response("in find events")?
            .try_collect()
            .await
            .into_response("in collect events")?;

        Ok(documents.into_iter().map(EventEntity::from).collect())
    }

    pub async fn exists(&self, id: &str) -> Response<bool> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(false);
        };

        exists(&self.db, object_id).await
    }

    /// Bookings referencing the event are left in place; the reference is
    /// weak and may dangle after this.
    pub async fn delete(&self, id: &str) -> Response<()> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Err(RepositoryError::EventNotFound { id: id.to_string() });
        };

        self.collection()
            .delete_one(doc! { "_id": object_id }, None)
            .await
            .into_response("in delete event")?;

        Ok(())
    }
}

// Surfaces a unique-index violation on the slug as its own error.
fn write_error(
    error: mongodb::error::Error,
    slug: &str,
    message: &str,
) -> RepositoryError {
    use mongodb::error::{ErrorKind, WriteFailure};

    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) =
        &*error.kind
    {
        if write_error.code == 11000 {
            return RepositoryError::DuplicateSlug {
                slug: slug.to_string(),
            };
        }
    }

    RepositoryError::InMongoDb {
        message: message.to_string(),
        source: error,
    }
}
