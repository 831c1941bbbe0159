use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use opsdesk_api::{AppServices, build_app};
use opsdesk_core::{LineId, OrderId};
use opsdesk_desktop::{
    DirectorySink, ExportClient, ExportCoordinator, ExportError, Notifier, StatusOption,
};
use opsdesk_infra::{InMemoryDeliveryStore, InMemoryOrderStore};
use opsdesk_sales::{Order, OrderLine};

struct TestServer {
    base_url: String,
    orders: Arc<InMemoryOrderStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let orders = Arc::new(InMemoryOrderStore::new());
        let services = AppServices::new(orders.clone(), Arc::new(InMemoryDeliveryStore::new()));

        let app = build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            orders,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Default)]
struct Messages(Mutex<Vec<String>>);

impl Notifier for Messages {
    fn success(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.0.lock().unwrap().push(format!("error: {message}"));
    }
}

fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn seed(orders: &InMemoryOrderStore) {
    orders.insert_order(Order::new(OrderId::new(10), june(5), "C010", "Kato Store")).unwrap();
    orders.insert_order(Order::new(OrderId::new(11), june(9), "C011", "Mori Market")).unwrap();
    for (id, order, code) in [(100, 10, "A-100"), (101, 10, "9999"), (102, 11, "B-200"), (103, 11, "C-300")] {
        orders
            .insert_line(OrderLine::new(LineId::new(id), OrderId::new(order), code, "item", 1, 500).unwrap())
            .unwrap();
    }
}

#[tokio::test]
async fn preview_then_commit_against_a_live_server() {
    let srv = TestServer::spawn().await;
    seed(&srv.orders);
    let out = tempfile::tempdir().unwrap();
    let messages = Arc::new(Messages::default());

    let client = ExportClient::new(&srv.base_url);
    assert!(client.check_connectivity().await);

    let coordinator = ExportCoordinator::new(
        Arc::new(client),
        Arc::new(DirectorySink::new(out.path())),
        messages.clone(),
    );
    coordinator.set_start_date("2024-06-01").await;
    coordinator.set_end_date("2024-06-30").await;

    assert_eq!(coordinator.request_preview().await.unwrap(), 3);
    assert!(coordinator.can_commit().await);

    let outcome = coordinator.commit_export().await.unwrap();
    assert_eq!(outcome.file_name, "orders_20240601_20240630.csv");
    assert_eq!(outcome.exported_count, 2);
    assert_eq!(outcome.path, out.path().join("orders_20240601_20240630.csv"));

    let saved = std::fs::read_to_string(&outcome.path).unwrap();
    assert_eq!(saved.trim_end().split('\n').count(), 4);
    assert!(!saved.contains("9999"));
    assert!(srv.orders.orders().unwrap().iter().all(|o| o.is_exported()));

    let state = coordinator.snapshot().await;
    assert_eq!(state.last_committed_count, Some(2));
    assert_eq!(state.preview_count, None);
    assert_eq!(
        messages.0.lock().unwrap().last().map(String::as_str),
        Some("Downloaded orders_20240601_20240630.csv (2 orders marked as exported)")
    );

    // Everything is exported now: the default filter finds nothing.
    assert_eq!(coordinator.request_preview().await.unwrap(), 0);
    assert!(!coordinator.can_commit().await);
    assert_eq!(coordinator.commit_export().await.unwrap_err(), ExportError::NoData);

    // Re-export under "all" re-selects the same orders.
    coordinator.set_status(StatusOption::All).await;
    assert!(coordinator.can_commit().await);
    assert_eq!(coordinator.commit_export().await.unwrap().exported_count, 2);
}

#[tokio::test]
async fn server_validation_errors_reach_the_operator() {
    let srv = TestServer::spawn().await;
    let out = tempfile::tempdir().unwrap();
    let messages = Arc::new(Messages::default());

    let coordinator = ExportCoordinator::new(
        Arc::new(ExportClient::new(&srv.base_url)),
        Arc::new(DirectorySink::new(out.path())),
        messages.clone(),
    );
    coordinator.set_start_date("2024-06-30").await;
    coordinator.set_end_date("2024-06-01").await;

    let err = coordinator.request_preview().await.unwrap_err();
    assert_eq!(
        err,
        ExportError::Request {
            status: 400,
            message: "start_date must not be after end_date".into(),
        }
    );
    assert_eq!(coordinator.snapshot().await.preview_count, None);
    assert!(messages.0.lock().unwrap().last().unwrap().starts_with("error: "));
}

#[tokio::test]
async fn unreachable_server_is_an_unexpected_error() {
    let out = tempfile::tempdir().unwrap();
    // Port 9 (discard) is closed on test machines.
    let coordinator = ExportCoordinator::new(
        Arc::new(ExportClient::new("http://127.0.0.1:9")),
        Arc::new(DirectorySink::new(out.path())),
        Arc::new(Messages::default()),
    );
    coordinator.set_start_date("2024-06-01").await;
    coordinator.set_end_date("2024-06-30").await;

    let err = coordinator.commit_export().await.unwrap_err();
    assert!(matches!(err, ExportError::Unexpected { .. }));
    assert!(std::fs::read_dir(out.path()).unwrap().next().is_none());
}
