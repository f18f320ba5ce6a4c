use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use skywings_core::account::{NewTraveler, NewUser, ProfileUpdate, Traveler, User};
use skywings_core::repository::{TravelerRepository, UserRepository};
use skywings_core::RepoResult;

use crate::database::db_err;

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, phone, is_staff, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    is_staff: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            is_staff: row.is_staff,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TravelerRow {
    id: i64,
    user_id: i64,
    full_name: String,
    date_of_birth: Option<NaiveDate>,
    passport_number: Option<String>,
    nationality: Option<String>,
}

impl From<TravelerRow> for Traveler {
    fn from(row: TravelerRow) -> Self {
        Traveler {
            id: row.id,
            user_id: row.user_id,
            full_name: row.full_name,
            date_of_birth: row.date_of_birth,
            passport_number: row.passport_number,
            nationality: row.nationality,
        }
    }
}

pub struct PostgresUserRepository {
    pub pool: sqlx::PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &NewUser) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, phone, is_staff)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.phone)
            .bind(user.is_staff)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(User::from))
    }

    async fn get(&self, id: i64) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(User::from))
    }

    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> RepoResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET first_name = $2, last_name = $3, phone = $4
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(&update.first_name)
            .bind(&update.last_name)
            .bind(&update.phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(User::from))
    }
}

pub struct PostgresTravelerRepository {
    pub pool: sqlx::PgPool,
}

impl PostgresTravelerRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TravelerRepository for PostgresTravelerRepository {
    async fn list(&self, user_id: i64) -> RepoResult<Vec<Traveler>> {
        let rows = sqlx::query_as::<_, TravelerRow>(
            "SELECT id, user_id, full_name, date_of_birth, passport_number, nationality
             FROM travelers WHERE user_id = $1 ORDER BY full_name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(Traveler::from).collect())
    }

    async fn create(&self, user_id: i64, traveler: &NewTraveler) -> RepoResult<Traveler> {
        let row = sqlx::query_as::<_, TravelerRow>(
            "INSERT INTO travelers (user_id, full_name, date_of_birth, passport_number, nationality)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, user_id, full_name, date_of_birth, passport_number, nationality",
        )
        .bind(user_id)
        .bind(&traveler.full_name)
        .bind(traveler.date_of_birth)
        .bind(&traveler.passport_number)
        .bind(&traveler.nationality)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.into())
    }

    async fn delete(&self, user_id: i64, traveler_id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM travelers WHERE id = $1 AND user_id = $2")
            .bind(traveler_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
