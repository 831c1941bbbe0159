//! In-memory stores for tests/dev.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use opsdesk_core::{Entity, OrderId};
use opsdesk_sales::{DeliveryRecord, ExportBatch, ExportQuery, Order, OrderLine};

use super::{CommittedExport, CsvRenderer, DeliveryStore, OrderStore, StoreError};

#[derive(Debug, Default)]
struct OrderTables {
    orders: BTreeMap<OrderId, Order>,
    lines: Vec<OrderLine>,
}

/// In-memory order store.
///
/// A commit holds the write lock across select, render and mark, so concurrent
/// commits serialise and a line is exported under a given filter at most once.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    tables: RwLock<OrderTables>,
    unavailable: AtomicBool,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        tables.orders.insert(order.id(), order);
        Ok(())
    }

    pub fn insert_line(&self, line: OrderLine) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        if !tables.orders.contains_key(&line.order_id) {
            return Err(StoreError::database(
                "insert_line",
                format!("order {} does not exist", line.order_id),
            ));
        }
        tables.lines.push(line);
        Ok(())
    }

    pub fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.orders.get(&id).cloned())
    }

    /// Every order, ascending by id.
    pub fn orders(&self) -> Result<Vec<Order>, StoreError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.orders.values().cloned().collect())
    }

    /// Simulate an outage: every subsequent call fails with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn select_for_export(&self, query: &ExportQuery) -> Result<ExportBatch, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(query.select(tables.orders.values(), &tables.lines))
    }

    async fn commit_export(
        &self,
        query: &ExportQuery,
        render: CsvRenderer<'_>,
    ) -> Result<Option<CommittedExport>, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().map_err(|_| poisoned())?;

        let batch = query.select(tables.orders.values(), &tables.lines);
        if batch.is_empty() {
            return Ok(None);
        }

        let body = render(&batch)?;

        let mut orders_marked = 0u64;
        for id in batch.order_ids() {
            if let Some(order) = tables.orders.get_mut(&id) {
                order.mark_exported();
                orders_marked += 1;
            }
        }

        tracing::debug!(
            lines = batch.line_count(),
            orders_marked,
            range = %query.range,
            "in-memory export committed"
        );

        Ok(Some(CommittedExport {
            body,
            line_count: batch.line_count(),
            orders_marked,
        }))
    }
}

/// In-memory delivery history.
#[derive(Debug, Default)]
pub struct InMemoryDeliveryStore {
    records: RwLock<Vec<DeliveryRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryDeliveryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: DeliveryRecord) -> Result<(), StoreError> {
        self.records.write().map_err(|_| poisoned())?.push(record);
        Ok(())
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeliveryStore for InMemoryDeliveryStore {
    async fn recent_deliveries(
        &self,
        customer_code: &str,
        limit: usize,
    ) -> Result<Vec<DeliveryRecord>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store marked unavailable".into()));
        }
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut matching: Vec<DeliveryRecord> = records
            .iter()
            .filter(|r| r.customer_code == customer_code)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.id());
        matching.truncate(limit);
        Ok(matching)
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("store lock poisoned".into())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use opsdesk_core::{DateRange, DeliveryId, LineId};
    use opsdesk_sales::{OrderStatus, RenderError, StatusFilter};

    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn query(status: StatusFilter) -> ExportQuery {
        ExportQuery::new(DateRange::new(date(1), date(30)).unwrap(), status)
    }

    fn render_ok(batch: &ExportBatch) -> Result<Vec<u8>, RenderError> {
        batch.render_csv()
    }

    /// Three matching lines across two orders, plus an adjustment line and an
    /// out-of-range order.
    fn seeded() -> InMemoryOrderStore {
        let store = InMemoryOrderStore::new();
        store.insert_order(Order::new(OrderId::new(1), date(3), "C001", "Tanaka Shoji")).unwrap();
        store.insert_order(Order::new(OrderId::new(2), date(20), "C002", "Sato Foods")).unwrap();
        store
            .insert_order(Order::new(OrderId::new(3), NaiveDate::from_ymd_opt(2024, 7, 2).unwrap(), "C003", "Ito Farm"))
            .unwrap();
        for (id, order, code) in [(1, 1, "A-100"), (2, 1, "B-200"), (3, 1, "9999"), (4, 2, "A-100"), (5, 3, "A-100")] {
            store
                .insert_line(OrderLine::new(LineId::new(id), OrderId::new(order), code, "item", 1, 100).unwrap())
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn preview_never_mutates() {
        let store = seeded();
        let before = store.orders().unwrap();
        let batch = store.select_for_export(&query(StatusFilter::default())).await.unwrap();
        assert_eq!(batch.line_count(), 3);
        assert_eq!(store.orders().unwrap(), before);
    }

    #[tokio::test]
    async fn commit_marks_exactly_the_selected_orders() {
        let store = seeded();
        let committed = store
            .commit_export(&query(StatusFilter::default()), &render_ok)
            .await
            .unwrap()
            .expect("rows selected");

        assert_eq!(committed.line_count, 3);
        assert_eq!(committed.orders_marked, 2);
        assert_eq!(store.order(OrderId::new(1)).unwrap().unwrap().status, OrderStatus::Exported);
        assert_eq!(store.order(OrderId::new(2)).unwrap().unwrap().status, OrderStatus::Exported);
        assert_eq!(store.order(OrderId::new(3)).unwrap().unwrap().status, OrderStatus::NotExported);

        let text = String::from_utf8(committed.body).unwrap();
        assert_eq!(text.trim().split('\n').count(), 4);
        assert!(!text.contains("9999"));
    }

    #[tokio::test]
    async fn second_commit_under_same_filter_finds_nothing() {
        let store = seeded();
        let q = query(StatusFilter::default());
        store.commit_export(&q, &render_ok).await.unwrap().unwrap();
        assert!(store.commit_export(&q, &render_ok).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recommit_under_all_is_idempotent() {
        let store = seeded();
        store.commit_export(&query(StatusFilter::default()), &render_ok).await.unwrap().unwrap();
        let again = store
            .commit_export(&query(StatusFilter::All), &render_ok)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.orders_marked, 2);
        assert!(store.orders().unwrap().iter().filter(|o| o.order_date <= date(30)).all(|o| o.is_exported()));
    }

    #[tokio::test]
    async fn preview_and_commit_select_the_same_rows() {
        let store = seeded();
        let q = query(StatusFilter::All);
        let preview = store.select_for_export(&q).await.unwrap();
        let committed = store.commit_export(&q, &render_ok).await.unwrap().unwrap();
        assert_eq!(committed.body, preview.render_csv().unwrap());
        assert_eq!(committed.orders_marked as usize, preview.order_ids().len());
    }

    #[tokio::test]
    async fn render_failure_leaves_every_order_untouched() {
        let store = seeded();
        let before = store.orders().unwrap();
        let failing = |_: &ExportBatch| -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Flush("disk full".into()))
        };
        let err = store
            .commit_export(&query(StatusFilter::default()), &failing)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Render(_)));
        assert_eq!(store.orders().unwrap(), before);
    }

    #[tokio::test]
    async fn empty_selection_commits_nothing() {
        let store = seeded();
        let q = ExportQuery::new(DateRange::new(date(25), date(30)).unwrap(), StatusFilter::All);
        let before = store.orders().unwrap();
        assert!(store.commit_export(&q, &render_ok).await.unwrap().is_none());
        assert_eq!(store.orders().unwrap(), before);
    }

    #[tokio::test]
    async fn unavailable_store_fails_both_paths() {
        let store = seeded();
        store.set_unavailable(true);
        let q = query(StatusFilter::All);
        assert!(matches!(store.select_for_export(&q).await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.commit_export(&q, &render_ok).await, Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn poisoned_lock_is_reported_as_unavailable() {
        let store = std::sync::Arc::new(seeded());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.tables.write().unwrap();
            panic!("poison the order tables");
        })
        .join();

        assert!(matches!(store.orders(), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.order(OrderId::new(1)), Err(StoreError::Unavailable(_))));
        assert!(matches!(
            store.insert_order(Order::new(OrderId::new(9), date(1), "C009", "Abe")),
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn lines_require_an_existing_order() {
        let store = InMemoryOrderStore::new();
        let err = store
            .insert_line(OrderLine::new(LineId::new(1), OrderId::new(99), "A", "a", 1, 1).unwrap())
            .unwrap_err();
        assert!(matches!(err, StoreError::Database { .. }));
    }

    fn delivery(id: i64, customer: &str) -> DeliveryRecord {
        DeliveryRecord {
            id: DeliveryId::new(id),
            customer_code: customer.into(),
            delivered_on: date(1),
            product_code: "A-100".into(),
            product_name: "Rice".into(),
            quantity: 1,
            destination: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn deliveries_are_filtered_ordered_and_limited() {
        let store = InMemoryDeliveryStore::new();
        for id in (1..=120).rev() {
            store.insert(delivery(id, "C001")).unwrap();
        }
        store.insert(delivery(500, "C002")).unwrap();

        let found = store.recent_deliveries("C001", 100).await.unwrap();
        assert_eq!(found.len(), 100);
        assert_eq!(found.first().unwrap().id, DeliveryId::new(1));
        assert_eq!(found.last().unwrap().id, DeliveryId::new(100));
        assert!(found.iter().all(|r| r.customer_code == "C001"));
    }
}
