//! MongoDB client and collection handles

use anyhow::{Context, Result};
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};

use crate::config::Settings;
use crate::domain::{Booking, Service, User};

/// Shared handle to the application database
#[derive(Clone)]
pub struct MongoDb {
    db: Database,
}

impl MongoDb {
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let mut options = ClientOptions::parse(&settings.mongodb_uri)
            .await
            .context("Invalid MONGODB_URI")?;
        options.app_name = Some("homehero-backend".to_string());

        let client = Client::with_options(options).context("Failed to build MongoDB client")?;
        let db = client.database(&settings.mongodb_database);

        // Fail fast if the server is unreachable
        db.run_command(doc! { "ping": 1 }, None)
            .await
            .context("Failed to connect to MongoDB")?;

        tracing::info!(database = %settings.mongodb_database, "MongoDB connection established");

        Ok(Self { db })
    }

    pub fn services(&self) -> Collection<Service> {
        self.db.collection("services")
    }

    pub fn bookings(&self) -> Collection<Booking> {
        self.db.collection("bookings")
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    /// Create the indexes the query paths rely on. Idempotent; run at startup.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique = IndexOptions::builder().unique(true).build();

        self.services()
            .create_indexes(
                [
                    IndexModel::builder()
                        .keys(doc! { "category": 1, "available": 1 })
                        .build(),
                    IndexModel::builder()
                        .keys(doc! { "provider.userId": 1 })
                        .build(),
                    IndexModel::builder()
                        .keys(doc! { "name": "text", "description": "text" })
                        .build(),
                    // One review per booking across the embedded arrays
                    IndexModel::builder()
                        .keys(doc! { "reviews.booking": 1 })
                        .build(),
                ],
                None,
            )
            .await
            .context("Failed to create service indexes")?;

        self.bookings()
            .create_indexes(
                [
                    IndexModel::builder()
                        .keys(doc! { "customer.userId": 1, "status": 1 })
                        .build(),
                    IndexModel::builder()
                        .keys(doc! { "provider.userId": 1, "status": 1 })
                        .build(),
                    IndexModel::builder().keys(doc! { "bookingDate": 1 }).build(),
                    IndexModel::builder().keys(doc! { "service": 1 }).build(),
                ],
                None,
            )
            .await
            .context("Failed to create booking indexes")?;

        self.users()
            .create_indexes(
                [
                    IndexModel::builder()
                        .keys(doc! { "email": 1 })
                        .options(unique.clone())
                        .build(),
                    IndexModel::builder()
                        .keys(doc! { "externalUid": 1 })
                        .options(unique)
                        .build(),
                ],
                None,
            )
            .await
            .context("Failed to create user indexes")?;

        tracing::info!("Database indexes ensured");
        Ok(())
    }

    /// Lightweight health check for database connectivity
    #[allow(dead_code)]
    pub async fn health_check(&self) -> bool {
        self.db.run_command(doc! { "ping": 1 }, None).await.is_ok()
    }
}
