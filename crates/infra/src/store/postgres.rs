//! Postgres-backed employee + review store.
//!
//! ## Unit of work
//!
//! Reads run directly on the pool. Every mutation opens its own transaction
//! which is committed on success; any early return drops the transaction,
//! which rolls it back. Pool connections are returned on drop either way.
//!
//! ## Error Mapping
//!
//! | SQLx Error                         | StoreError               |
//! |------------------------------------|--------------------------|
//! | unique violation (`23505`)         | `Duplicate(field)`       |
//! | foreign key violation (`23503`)    | `UnknownEmployee`        |
//! | anything else                      | `Backend`                |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use epm_auth::{Employee, NewEmployee};
use epm_core::{EmployeeNumber, ReviewId};
use epm_reviews::{NewReview, Rating, Review, ReviewDraft};

use super::{EmployeeStore, ReviewStore, StoreError, StoreResult, UniqueField};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS employees (
        employee_number BIGINT PRIMARY KEY,
        name            TEXT    NOT NULL,
        username        TEXT    NOT NULL,
        email           TEXT    NOT NULL,
        password_hash   TEXT    NOT NULL,
        is_admin        BOOLEAN NOT NULL DEFAULT FALSE,
        CONSTRAINT employees_username_key UNIQUE (username),
        CONSTRAINT employees_email_key UNIQUE (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        review_id                  BIGSERIAL PRIMARY KEY,
        employee_number            BIGINT NOT NULL REFERENCES employees (employee_number),
        review_date                DATE   NOT NULL,
        reviewer_id                BIGINT NOT NULL CHECK (reviewer_id > 0),
        overall_performance_rating TEXT   NOT NULL CHECK (overall_performance_rating IN
            ('Excellent', 'Good', 'Satisfactory', 'Needs Improvement', 'Unsatisfactory')),
        goals                      TEXT   NOT NULL,
        reviewer_comments          TEXT   NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS reviews_employee_number_idx ON reviews (employee_number)",
];

const EMPLOYEE_COLUMNS: &str = "employee_number, name, username, email, password_hash, is_admin";
const REVIEW_COLUMNS: &str = "review_id, employee_number, review_date, reviewer_id, \
     overall_performance_rating, goals, reviewer_comments";
const REVIEW_ORDER: &str = "ORDER BY review_date DESC, review_id ASC";

#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: Arc<PgPool>,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        let db = Self::new(pool);
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Idempotent schema bootstrap, applied in one transaction.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }
        tx.commit().await.map_err(map_sqlx_error)?;
        tracing::info!("database schema ready");
        Ok(())
    }

    async fn find_employee_where(&self, column: &str, value: &str) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE {column} = $1 LIMIT 1");
        sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&*self.pool)
            .await
            .map_err(map_sqlx_error)?
            .map(|row| employee_from_row(&row))
            .transpose()
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some("employees_username_key") => UniqueField::Username,
                Some("employees_email_key") => UniqueField::Email,
                _ => UniqueField::EmployeeNumber,
            };
            return StoreError::Duplicate(field);
        }
    }
    StoreError::Backend(err.to_string())
}

fn employee_from_row(row: &PgRow) -> StoreResult<Employee> {
    let decode = |e: sqlx::Error| StoreError::Backend(format!("decode employee: {e}"));
    Ok(Employee {
        employee_number: EmployeeNumber::new(row.try_get("employee_number").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        username: row.try_get("username").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        is_admin: row.try_get("is_admin").map_err(decode)?,
    })
}

fn review_from_row(row: &PgRow) -> StoreResult<Review> {
    let decode = |e: sqlx::Error| StoreError::Backend(format!("decode review: {e}"));
    let rating: String = row.try_get("overall_performance_rating").map_err(decode)?;
    let overall_performance_rating = rating
        .parse::<Rating>()
        .map_err(|e| StoreError::Backend(e.to_string()))?;

    Ok(Review {
        review_id: ReviewId::new(row.try_get("review_id").map_err(decode)?),
        employee_number: EmployeeNumber::new(row.try_get("employee_number").map_err(decode)?),
        review_date: row.try_get("review_date").map_err(decode)?,
        reviewer_id: row.try_get("reviewer_id").map_err(decode)?,
        overall_performance_rating,
        goals: row.try_get("goals").map_err(decode)?,
        reviewer_comments: row.try_get("reviewer_comments").map_err(decode)?,
    })
}

fn reviews_from_rows(rows: Vec<PgRow>) -> StoreResult<Vec<Review>> {
    rows.iter().map(review_from_row).collect()
}

#[async_trait]
impl EmployeeStore for PostgresDatabase {
    #[instrument(skip(self), fields(operation = "find_employee_by_number"))]
    async fn find_by_number(&self, number: EmployeeNumber) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_number = $1");
        sqlx::query(&sql)
            .bind(number.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(map_sqlx_error)?
            .map(|row| employee_from_row(&row))
            .transpose()
    }

    #[instrument(skip(self), fields(operation = "find_employee_by_username"))]
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Employee>> {
        self.find_employee_where("username", username).await
    }

    #[instrument(skip(self), fields(operation = "find_employee_by_email"))]
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        self.find_employee_where("email", email).await
    }

    #[instrument(
        skip_all,
        fields(operation = "insert_employee", employee_number = %employee.employee_number)
    )]
    async fn insert(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO employees (employee_number, name, username, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(employee.employee_number.get())
        .bind(&employee.name)
        .bind(&employee.username)
        .bind(&employee.email)
        .bind(&employee.password_hash)
        .bind(employee.is_admin)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(employee.into_employee())
    }

    async fn count(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&*self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl ReviewStore for PostgresDatabase {
    #[instrument(
        skip_all,
        fields(operation = "create_review", employee_number = %review.employee_number)
    )]
    async fn create(&self, review: NewReview) -> StoreResult<Review> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let sql = format!(
            r#"
            INSERT INTO reviews
                (employee_number, review_date, reviewer_id, overall_performance_rating, goals, reviewer_comments)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {REVIEW_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(review.employee_number.get())
            .bind(review.draft.review_date)
            .bind(review.draft.reviewer_id)
            .bind(review.draft.overall_performance_rating.as_str())
            .bind(&review.draft.goals)
            .bind(&review.draft.reviewer_comments)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    StoreError::UnknownEmployee(review.employee_number)
                }
                _ => map_sqlx_error(e),
            })?;
        let created = review_from_row(&row)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(created)
    }

    #[instrument(skip(self), fields(operation = "get_review"))]
    async fn get_by_id(&self, id: ReviewId) -> StoreResult<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE review_id = $1");
        sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(map_sqlx_error)?
            .map(|row| review_from_row(&row))
            .transpose()
    }

    #[instrument(skip(self), fields(operation = "list_reviews_for_employee"))]
    async fn list_for_employee(&self, employee: EmployeeNumber) -> StoreResult<Vec<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE employee_number = $1 {REVIEW_ORDER}"
        );
        let rows = sqlx::query(&sql)
            .bind(employee.get())
            .fetch_all(&*self.pool)
            .await
            .map_err(map_sqlx_error)?;
        reviews_from_rows(rows)
    }

    #[instrument(skip(self), fields(operation = "list_all_reviews"))]
    async fn list_all(&self) -> StoreResult<Vec<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews {REVIEW_ORDER}");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(map_sqlx_error)?;
        reviews_from_rows(rows)
    }

    #[instrument(skip(self, draft), fields(operation = "update_review"))]
    async fn update(&self, id: ReviewId, draft: ReviewDraft) -> StoreResult<Option<Review>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let sql = format!(
            r#"
            UPDATE reviews SET
                review_date = $2,
                reviewer_id = $3,
                overall_performance_rating = $4,
                goals = $5,
                reviewer_comments = $6
            WHERE review_id = $1
            RETURNING {REVIEW_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(draft.review_date)
            .bind(draft.reviewer_id)
            .bind(draft.overall_performance_rating.as_str())
            .bind(&draft.goals)
            .bind(&draft.reviewer_comments)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let updated = row.map(|row| review_from_row(&row)).transpose()?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(updated)
    }

    #[instrument(skip(self), fields(operation = "delete_review"))]
    async fn delete(&self, id: ReviewId) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let result = sqlx::query("DELETE FROM reviews WHERE review_id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // Each test owns one block of employee numbers so they can run in
    // parallel against a shared database.
    const ALICE: EmployeeNumber = EmployeeNumber::new(9_100_001);
    const BOB: EmployeeNumber = EmployeeNumber::new(9_100_002);
    const GHOST: EmployeeNumber = EmployeeNumber::new(9_100_101);
    const CAROL: EmployeeNumber = EmployeeNumber::new(9_100_201);

    /// Connect and clear rows left in `[first, first + 99]` by earlier runs.
    async fn database(first: i64) -> PostgresDatabase {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let db = PostgresDatabase::connect(&url, 2).await.unwrap();
        for sql in [
            "DELETE FROM reviews WHERE employee_number BETWEEN $1 AND $2",
            "DELETE FROM employees WHERE employee_number BETWEEN $1 AND $2",
        ] {
            sqlx::query(sql)
                .bind(first)
                .bind(first + 99)
                .execute(&*db.pool)
                .await
                .unwrap();
        }
        db
    }

    fn employee(number: EmployeeNumber, username: &str, email: &str) -> NewEmployee {
        NewEmployee {
            employee_number: number,
            name: "Test Person".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            is_admin: false,
        }
    }

    fn review(owner: EmployeeNumber, date: (i32, u32, u32)) -> NewReview {
        NewReview::new(
            owner,
            ReviewDraft {
                review_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
                reviewer_id: 101,
                overall_performance_rating: Rating::Good,
                goals: "Ship the reporting rewrite.".to_string(),
                reviewer_comments: String::new(),
            },
        )
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn unique_violations_name_the_column() {
        let db = database(9_100_000).await;
        db.insert(employee(ALICE, "alice9100001", "alice@pg.test"))
            .await
            .unwrap();

        assert_eq!(
            db.insert(employee(BOB, "alice9100001", "bob@pg.test"))
                .await
                .unwrap_err(),
            StoreError::Duplicate(UniqueField::Username)
        );
        assert_eq!(
            db.insert(employee(BOB, "bob9100002", "alice@pg.test"))
                .await
                .unwrap_err(),
            StoreError::Duplicate(UniqueField::Email)
        );
        assert_eq!(
            db.insert(employee(ALICE, "other9100001", "other@pg.test"))
                .await
                .unwrap_err(),
            StoreError::Duplicate(UniqueField::EmployeeNumber)
        );
        assert!(db.find_by_username("bob9100002").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn review_for_unknown_employee_is_rolled_back() {
        let db = database(9_100_100).await;

        assert_eq!(
            db.create(review(GHOST, (2024, 1, 1))).await.unwrap_err(),
            StoreError::UnknownEmployee(GHOST)
        );
        assert!(db.list_for_employee(GHOST).await.unwrap().is_empty());
        assert_eq!(db.find_by_number(GHOST).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn listing_is_newest_first_then_by_id() {
        let db = database(9_100_200).await;
        db.insert(employee(CAROL, "carol9100201", "carol@pg.test"))
            .await
            .unwrap();

        let older = db.create(review(CAROL, (2024, 1, 1))).await.unwrap();
        let first_tie = db.create(review(CAROL, (2024, 6, 1))).await.unwrap();
        let second_tie = db.create(review(CAROL, (2024, 6, 1))).await.unwrap();

        let ids: Vec<ReviewId> = db
            .list_for_employee(CAROL)
            .await
            .unwrap()
            .iter()
            .map(|r| r.review_id)
            .collect();
        assert_eq!(
            ids,
            vec![first_tie.review_id, second_tie.review_id, older.review_id]
        );

        let mut draft = older.draft();
        draft.overall_performance_rating = Rating::Excellent;
        let updated = db.update(older.review_id, draft).await.unwrap().unwrap();
        assert_eq!(updated.overall_performance_rating, Rating::Excellent);
        assert_eq!(updated.employee_number, CAROL);

        assert!(db.delete(older.review_id).await.unwrap());
        assert!(!db.delete(older.review_id).await.unwrap());
        assert_eq!(db.get_by_id(older.review_id).await.unwrap(), None);
    }
}
