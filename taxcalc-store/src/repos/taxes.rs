//! Tax repository

use taxcalc_db::{Sql, SqlExecutor};

use crate::error::StoreResult;
use crate::models::{now_millis, NewTax, Tax, TaxCode};

const INSERT_TAX: &str = r#"
    INSERT INTO taxes (user_id, name, tax_code, price, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $5)
    RETURNING id, user_id, name, tax_code, price, created_at, updated_at
"#;

const LIST_BY_USER: &str = r#"
    SELECT id, user_id, name, tax_code, price, created_at, updated_at
    FROM taxes
    WHERE user_id = $1
    ORDER BY id DESC
"#;

/// Insert a tax item on whatever executor the caller holds
pub async fn insert<E: SqlExecutor>(executor: &E, user_id: i64, tax: &NewTax) -> StoreResult<Tax> {
    let tax = executor
        .fetch_one(
            sqlx::query_as(INSERT_TAX)
                .bind(user_id)
                .bind(tax.name.as_str())
                .bind(i64::from(tax.code))
                .bind(tax.price)
                .bind(now_millis()),
        )
        .await?;
    Ok(tax)
}

/// Tax repository
pub struct TaxRepo<'a> {
    sql: &'a Sql,
}

impl<'a> TaxRepo<'a> {
    pub fn new(sql: &'a Sql) -> Self {
        Self { sql }
    }

    pub async fn create(
        &self,
        user_id: i64,
        name: &str,
        code: TaxCode,
        price: i64,
    ) -> StoreResult<Tax> {
        insert(&self.sql.writer(), user_id, &NewTax::new(name, code, price)).await
    }

    /// All taxes for a user, newest first
    pub async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<Tax>> {
        let taxes = self
            .sql
            .reader()
            .await
            .fetch_all(sqlx::query_as(LIST_BY_USER).bind(user_id))
            .await?;
        Ok(taxes)
    }
}
