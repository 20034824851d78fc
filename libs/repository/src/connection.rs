use mongodb::{Client, Database};
use tokio::sync::OnceCell;
use tracing::info;

use crate::{RepositoryError, Response};

const MONGODB_URI: &str = "MONGODB_URI";
const DEFAULT_DATABASE: &str = "evently";

static CONNECTION: OnceCell<Database> = OnceCell::const_new();

/// Process-wide connection handle. The first caller reads `MONGODB_URI` and
/// performs the handshake; concurrent first-time callers await that same
/// in-flight attempt instead of opening their own. A failed attempt is not
/// cached, so the next caller retries. There is no teardown path.
pub async fn get() -> Response<&'static Database> {
    CONNECTION.get_or_try_init(establish).await
}

async fn establish() -> Response<Database> {
    let uri = std::env::var(MONGODB_URI).map_err(|_| {
        RepositoryError::ConnectionUnavailable {
            message: format!("{MONGODB_URI} environment variable is not set"),
        }
    })?;

    let client = Client::with_uri_str(&uri).await.map_err(|e| {
        RepositoryError::ConnectionUnavailable {
            message: e.to_string(),
        }
    })?;

    let database = client
        .default_database()
        .unwrap_or_else(|| client.database(DEFAULT_DATABASE));

    info!(task = "connect document store", database = database.name());

    Ok(database)
}
