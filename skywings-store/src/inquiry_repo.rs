use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skywings_core::inquiry::{ContactMessage, NewContactMessage, NewSubscriber, Subscriber};
use skywings_core::repository::{ContactRepository, SubscriberRepository};
use skywings_core::RepoResult;

use crate::database::db_err;

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: i64,
    name: String,
    phone: Option<String>,
    email: String,
    message: String,
    received_at: DateTime<Utc>,
}

impl From<ContactRow> for ContactMessage {
    fn from(row: ContactRow) -> Self {
        ContactMessage {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            message: row.message,
            received_at: row.received_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: i64,
    full_name: String,
    email: String,
    phone: Option<String>,
    flight_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<SubscriberRow> for Subscriber {
    fn from(row: SubscriberRow) -> Self {
        Subscriber {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            flight_id: row.flight_id,
            created_at: row.created_at,
        }
    }
}

pub struct PostgresContactRepository {
    pub pool: sqlx::PgPool,
}

impl PostgresContactRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {
    async fn create(&self, message: &NewContactMessage) -> RepoResult<ContactMessage> {
        let row = sqlx::query_as::<_, ContactRow>(
            "INSERT INTO contact_messages (name, phone, email, message)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, phone, email, message, received_at",
        )
        .bind(&message.name)
        .bind(&message.phone)
        .bind(&message.email)
        .bind(&message.message)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.into())
    }
}

pub struct PostgresSubscriberRepository {
    pub pool: sqlx::PgPool,
}

impl PostgresSubscriberRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberRepository for PostgresSubscriberRepository {
    async fn upsert(&self, subscriber: &NewSubscriber) -> RepoResult<Subscriber> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            "INSERT INTO subscribers (full_name, email, phone, flight_id)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO UPDATE
                SET full_name = EXCLUDED.full_name,
                    phone = EXCLUDED.phone,
                    flight_id = EXCLUDED.flight_id
             RETURNING id, full_name, email, phone, flight_id, created_at",
        )
        .bind(&subscriber.full_name)
        .bind(&subscriber.email)
        .bind(&subscriber.phone)
        .bind(subscriber.flight_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.into())
    }
}
