use bson::oid::ObjectId;
use bson::{doc, DateTime};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::info;

use entity::prelude::*;

use crate::{event, IntoResponse, RepositoryError, Response};

const BOOKINGS_COLLECTION: &str = "bookings";

#[derive(Clone, Debug)]
pub struct BookingRepository {
    db: Database,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookingDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub event_id: ObjectId,
    pub email: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl From<BookingDocument> for BookingEntity {
    fn from(value: BookingDocument) -> Self {
        BookingEntity {
            id: value.id.map(|id| id.to_hex()).unwrap_or_default(),
            event_id: value.event_id.to_hex(),
            email: value.email,
            created_at: value.created_at.to_chrono(),
            updated_at: value.updated_at.to_chrono(),
        }
    }
}

// eventId is indexed for the per-event listing; not unique, one event
// takes many bookings.
pub(crate) async fn setup_collection(db: &Database) -> Response<()> {
    let collection: Collection<BookingDocument> =
        db.collection(BOOKINGS_COLLECTION);

    collection
        .create_index(
            IndexModel::builder().keys(doc! { "eventId": 1 }).build(),
            None,
        )
        .await
        .into_response("in create eventId index")?;

    Ok(())
}

impl BookingRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> Collection<BookingDocument> {
        self.db.collection(BOOKINGS_COLLECTION)
    }

    /// Validates the draft, checks that the referenced event exists, and
    /// only then writes. The event can still be deleted between the check
    /// and the write; the reference is weak and that race is accepted.
    pub async fn create(&self, draft: BookingDraft) -> Response<BookingEntity> {
        let booking = draft.validate()?;

        let Ok(event_id) = ObjectId::parse_str(&booking.event_id) else {
            // A malformed id cannot reference anything.
            return Err(RepositoryError::ReferencedEventNotFound {
                event_id: booking.event_id,
            });
        };

        if !event::exists(&self.db, event_id).await? {
            return Err(RepositoryError::ReferencedEventNotFound {
                event_id: booking.event_id,
            });
        }

        let document = BookingDocument {
            id: Some(ObjectId::new()),
            event_id,
            email: booking.email,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };

        self.collection()
            .insert_one(&document, None)
            .await
            .into_response("in insert booking")?;

        info!(task = "insert booking", event_id = document.event_id.to_hex());

        Ok(document.into())
    }

    pub async fn find_all_for_event(
        &self,
        event_id: &str,
    ) -> Response<Vec<BookingEntity>> {
        let Ok(object_id) = ObjectId::parse_str(event_id) else {
            return Ok(Vec::new());
        };

        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .build();

        let documents: Vec<BookingDocument> = self
            .collection()
            .find(doc! { "eventId": object_id }, options)
            .await
            .into_response("in find bookings")?
            .try_collect()
            .await
            .into_response("in collect bookings")?;

        Ok(documents.into_iter().map(BookingEntity::from).collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn document_serializes_camel_case_fields() {
        // Arrange
        let document = BookingDocument {
            id: Some(ObjectId::new()),
            event_id: ObjectId::new(),
            email: "ada@example.com".to_string(),
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };

        // Act
        let raw = bson::to_document(&document).unwrap();

        // Assert
        assert!(raw.contains_key("eventId"));
        assert!(raw.contains_key("createdAt"));
        assert!(raw.contains_key("updatedAt"));
    }

    #[tokio::test]
    async fn create_rejects_malformed_event_reference_before_any_query() {
        // Arrange
        let client =
            mongodb::Client::with_uri_str("mongodb://127.0.0.1:27017")
                .await
                .unwrap();
        let repository = BookingRepository::new(client.database("test"));

        let draft = BookingDraft {
            event_id: "not-an-object-id".to_string(),
            email: "ada@example.com".to_string(),
        };

        // Act
        let result = repository.create(draft).await;

        // Assert
        assert!(matches!(
            result,
            Err(RepositoryError::ReferencedEventNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn create_rejects_invalid_email_before_any_query() {
        let client =
            mongodb::Client::with_uri_str("mongodb://127.0.0.1:27017")
                .await
                .unwrap();
        let repository = BookingRepository::new(client.database("test"));

        let draft = BookingDraft {
            event_id: ObjectId::new().to_hex(),
            email: "not-an-email".to_string(),
        };

        let result = repository.create(draft).await;

        assert!(matches!(
            result,
            Err(RepositoryError::Validation(ValidationError::InvalidEmail {
                ..
            }))
        ));
    }
}
