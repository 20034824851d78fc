use booking::BookingRepository;
use event::EventRepository;
use tracing::info;

pub mod booking;
pub mod connection;
pub mod event;

/// One repository per collection, all sharing the process-wide connection.
#[derive(Clone, Debug)]
pub struct Repository {
    pub event: EventRepository,
    pub booking: BookingRepository,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] entity::error::ValidationError),

    #[error("event \"{event_id}\" does not exist")]
    ReferencedEventNotFound { event_id: String },

    #[error("event \"{id}\" not found")]
    EventNotFound { id: String },

    #[error("an event with slug \"{slug}\" already exists")]
    DuplicateSlug { slug: String },

    #[error("database connection unavailable: {message}")]
    ConnectionUnavailable { message: String },

    #[error(
        "in mongodb crate from unsuccessful database operations: {}: {}",
        message,
        source
    )]
    InMongoDb {
        message: String,
        source: mongodb::error::Error,
    },
}

pub type Response<T> = Result<T, RepositoryError>;

pub trait IntoResponse<T> {
    fn into_response(self, message: &str) -> Response<T>;
}

impl<T> IntoResponse<T> for Result<T, mongodb::error::Error> {
    fn into_response(self, message: &str) -> Response<T> {
        self.map_err(|e| RepositoryError::InMongoDb {
            message: message.to_string(),
            source: e,
        })
    }
}

/// Obtains the shared connection, runs collection setup (indexes), and
/// hands back the repositories. Safe to call from independent request
/// cycles; the underlying handle is established once per process.
pub async fn init_repository() -> Response<Repository> {
    let db = connection::get().await?;

    event::setup_collection(db).await?;
    booking::setup_collection(db).await?;

    info!(task = "init repository", database = db.name());

    Ok(Repository {
        event: EventRepository::new(db.clone()),
        booking: BookingRepository::new(db.clone()),
    })
}
