//! Postgres-backed order and delivery stores.
//!
//! ## Commit atomicity
//!
//! `commit_export` runs in one transaction:
//! 1. `SELECT ... FOR UPDATE OF o` locks the parent orders of every selected line
//! 2. the batch is rendered to CSV
//! 3. `UPDATE orders SET status = 'CSV出力済み'` for the distinct order ids
//! 4. `COMMIT`
//!
//! Any failure before step 4 rolls back, so no order is marked without the
//! caller receiving the file. Under READ COMMITTED a concurrent commit blocks on
//! the row locks and then re-evaluates the status predicate, so an order is
//! never exported twice under the `未出力` filter.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | `PoolClosed`, `PoolTimedOut`, `Io` | `Unavailable` |
//! | anything else | `Database` |

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument};

use opsdesk_core::{DeliveryId, LineId, OrderId};
use opsdesk_sales::{
    ADJUSTMENT_PRODUCT_CODE, DeliveryRecord, ExportBatch, ExportLine, ExportQuery, OrderStatus,
};

use super::{CommittedExport, CsvRenderer, DeliveryStore, OrderStore, StoreError};

const SELECT_EXPORT_LINES: &str = r#"
    SELECT
        o.id            AS order_id,
        o.order_date    AS order_date,
        o.customer_code AS customer_code,
        o.customer_name AS customer_name,
        o.status        AS status,
        i.id            AS line_id,
        i.product_code  AS product_code,
        i.product_name  AS product_name,
        i.quantity      AS quantity,
        i.unit_price    AS unit_price
    FROM order_items i
    JOIN orders o ON o.id = i.order_id
    WHERE o.order_date BETWEEN $1 AND $2
      AND ($3::text IS NULL OR o.status = $3)
      AND i.product_code <> $4
    ORDER BY o.order_date, o.id, i.id
"#;

/// Postgres-backed order store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; the store is shared
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[instrument(
        skip(self),
        fields(range = %query.range, status = %query.status.as_str(), lines = tracing::field::Empty),
        err
    )]
    async fn select_for_export(&self, query: &ExportQuery) -> Result<ExportBatch, StoreError> {
        let rows = sqlx::query(SELECT_EXPORT_LINES)
            .bind(query.range.start())
            .bind(query.range.end())
            .bind(query.status.required_status())
            .bind(ADJUSTMENT_PRODUCT_CODE)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("select_export_lines", e))?;

        let lines = rows
            .iter()
            .map(export_line_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_export_line", e))?;

        Span::current().record("lines", lines.len());
        Ok(ExportBatch::from_lines(lines))
    }

    #[instrument(
        skip(self, render),
        fields(
            range = %query.range,
            status = %query.status.as_str(),
            orders_marked = tracing::field::Empty
        ),
        err
    )]
    async fn commit_export(
        &self,
        query: &ExportQuery,
        render: CsvRenderer<'_>,
    ) -> Result<Option<CommittedExport>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let batch = select_locked(&mut tx, query).await?;
        if batch.is_empty() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        }

        let body = match render(&batch) {
            Ok(body) => body,
            Err(e) => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(StoreError::Render(e));
            }
        };

        let order_ids: Vec<i64> = batch.order_ids().into_iter().map(i64::from).collect();
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = NOW()
            WHERE id = ANY($2)
            "#,
        )
        .bind(OrderStatus::EXPORTED)
        .bind(order_ids.as_slice())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("mark_exported", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let orders_marked = result.rows_affected();
        Span::current().record("orders_marked", orders_marked);

        Ok(Some(CommittedExport {
            body,
            line_count: batch.line_count(),
            orders_marked,
        }))
    }
}

async fn select_locked(
    tx: &mut Transaction<'_, Postgres>,
    query: &ExportQuery,
) -> Result<ExportBatch, StoreError> {
    let sql = format!("{SELECT_EXPORT_LINES} FOR UPDATE OF o");
    let rows = sqlx::query(&sql)
        .bind(query.range.start())
        .bind(query.range.end())
        .bind(query.status.required_status())
        .bind(ADJUSTMENT_PRODUCT_CODE)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("select_export_lines_for_update", e))?;

    let lines = rows
        .iter()
        .map(export_line_from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| map_sqlx_error("decode_export_line", e))?;
    Ok(ExportBatch::from_lines(lines))
}

fn export_line_from_row(row: &sqlx::postgres::PgRow) -> Result<ExportLine, sqlx::Error> {
    Ok(ExportLine {
        order_id: OrderId::new(row.try_get("order_id")?),
        order_date: row.try_get::<NaiveDate, _>("order_date")?,
        customer_code: row.try_get("customer_code")?,
        customer_name: row.try_get("customer_name")?,
        line_id: LineId::new(row.try_get("line_id")?),
        product_code: row.try_get("product_code")?,
        product_name: row.try_get("product_name")?,
        quantity: row.try_get("quantity")?,
        unit_price: row.try_get("unit_price")?,
        status: OrderStatus::parse(row.try_get::<&str, _>("status")?),
    })
}

/// Postgres-backed delivery history (`delivery_history` table).
#[derive(Debug, Clone)]
pub struct PostgresDeliveryStore {
    pool: PgPool,
}

impl PostgresDeliveryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryStore for PostgresDeliveryStore {
    #[instrument(skip(self), err)]
    async fn recent_deliveries(
        &self,
        customer_code: &str,
        limit: usize,
    ) -> Result<Vec<DeliveryRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_code, delivered_on, product_code, product_name,
                   quantity, destination, note
            FROM delivery_history
            WHERE customer_code = $1
            ORDER BY id ASC
            LIMIT $2
            "#,
        )
        .bind(customer_code)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("select_delivery_history", e))?;

        rows.iter()
            .map(|row| {
                Ok(DeliveryRecord {
                    id: DeliveryId::new(row.try_get("id")?),
                    customer_code: row.try_get("customer_code")?,
                    delivered_on: row.try_get("delivered_on")?,
                    product_code: row.try_get("product_code")?,
                    product_name: row.try_get("product_name")?,
                    quantity: row.try_get("quantity")?,
                    destination: row.try_get("destination")?,
                    note: row.try_get("note")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| map_sqlx_error("decode_delivery_record", e))
    }
}

/// Map SQLx errors to StoreError.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("timed out acquiring a connection in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Database(db_err) => StoreError::database(operation, db_err.message()),
        other => StoreError::database(operation, other.to_string()),
    }
}
