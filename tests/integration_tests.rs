use access_tracker::fetch::HttpClient;
use access_tracker::mbta::MbtaClient;
use access_tracker::model::{FacilityStatus, StatusClass};
use access_tracker::reconcile::{reconcile, reconcile_snapshot};
use access_tracker::report::{ReportError, TextGenerator};
use access_tracker::server::{self, AppState, NO_DATA_MESSAGE};
use async_trait::async_trait;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const FACILITIES: &str = include_str!("fixtures/facilities.json");
const ALERTS: &str = include_str!("fixtures/alerts.json");

/// Stands in for the MBTA API: fixture bodies per path, everything else 404.
struct FakeMbta {
    alerts_status: u16,
}

#[async_trait]
impl HttpClient for FakeMbta {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let (status, body) = match req.url().path() {
            "/facilities" => (200, FACILITIES.to_string()),
            "/alerts" if req.url().query().is_some_and(|q| q.contains("filter%5Broute%5D")) => {
                (200, r#"{"data": []}"#.to_string())
            }
            "/alerts" => (self.alerts_status, ALERTS.to_string()),
            "/routes" => (200, r#"{"data": [{"id": "Red"}]}"#.to_string()),
            _ => (404, String::new()),
        };
        Ok(http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
            .into())
    }
}

struct FixedReport(Result<&'static str, &'static str>);

#[async_trait]
impl TextGenerator for FixedReport {
    async fn generate(&self, _prompt: &str) -> Result<String, ReportError> {
        self.0
            .map(str::to_string)
            .map_err(|e| ReportError::Unavailable(e.to_string()))
    }
}

fn mbta(alerts_status: u16) -> MbtaClient<Box<dyn HttpClient>> {
    MbtaClient::new(
        Box::new(FakeMbta { alerts_status }),
        "https://api-v3.mbta.test",
        &["USING_WHEELCHAIR".to_string()],
    )
}

async fn spawn_server(alerts_status: u16, report: FixedReport) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let state = AppState {
        mbta: Arc::new(mbta(alerts_status)),
        reports: Arc::new(report),
    };
    tokio::spawn(server::serve(listener, state, async {
        let _ = rx.await;
    }));
    (addr, tx)
}

#[test]
fn test_full_pipeline() {
    let facilities: Value = serde_json::from_str(FACILITIES).unwrap();
    let alerts: Value = serde_json::from_str(ALERTS).unwrap();
    let view = reconcile(&facilities, &alerts);

    // The facility without a stop is dropped.
    assert_eq!(view.facilities.len(), 5);
    assert!(!view.facilities.contains_key("999"));

    let park = view.station("place-pktrm").unwrap();
    assert_eq!((park.n_operational, park.n_out_of_service), (2, 1));
    assert_eq!(park.classification(), StatusClass::SomeOut);

    let alewife = view.station("place-alfcl").unwrap();
    assert_eq!(alewife.classification(), StatusClass::AllOut);

    let braintree = view.station("place-brntn").unwrap();
    assert_eq!(braintree.classification(), StatusClass::AllOk);
    assert_eq!(braintree.latitude, Some(42.2078543));

    let elevator = &view.facilities["876"];
    assert_eq!(elevator.status, FacilityStatus::OutOfService);
    let alert = elevator.alert.as_ref().unwrap();
    assert_eq!(alert.severity.as_deref(), Some("3"));
    assert_eq!(alert.cause.as_deref(), Some("MAINTENANCE"));
    assert!(alert.outage_start.is_some());

    // Two alerts name 953; the later update is attached.
    assert_eq!(view.facilities["953"].alert.as_ref().unwrap().id, "612401");

    let summary = view.summary();
    assert_eq!(summary.total_facilities, 5);
    assert_eq!(summary.total_out_of_service, 2);
    assert_eq!(summary.total_stations, 3);
    assert_eq!(summary.stations_with_outages, 2);
}

#[test]
fn test_every_facility_in_exactly_one_partition() {
    let facilities: Value = serde_json::from_str(FACILITIES).unwrap();
    let alerts: Value = serde_json::from_str(ALERTS).unwrap();
    let view = reconcile(&facilities, &alerts);

    let counted: usize = view.stations.iter().map(|s| s.total_facilities()).sum();
    assert_eq!(counted, view.facilities.len());
}

#[tokio::test]
async fn test_snapshot_through_client() {
    let snapshot = mbta(200).fetch_snapshot().await.unwrap();
    let view = reconcile_snapshot(&snapshot);
    assert_eq!(view.summary().total_out_of_service, 2);
}

#[tokio::test]
async fn test_alert_failure_is_not_all_operational() {
    let err = mbta(500).fetch_snapshot().await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
}

#[tokio::test]
async fn test_server_ping_and_dashboard() {
    let (addr, _shutdown) = spawn_server(200, FixedReport(Ok("ok"))).await;

    let pong: Value = reqwest::get(format!("http://{addr}/api/ping"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(pong["message"], "pong!");

    let page = reqwest::get(format!("http://{addr}/"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("leaflet"));
}

#[tokio::test]
async fn test_server_status_reports_stations() {
    let (addr, _shutdown) = spawn_server(200, FixedReport(Ok("ok"))).await;

    let resp = reqwest::get(format!("http://{addr}/api/status")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["summary"]["total_out_of_service"], 2);

    let stations = body["stations"].as_array().unwrap();
    let alewife = stations.iter().find(|s| s["id"] == "place-alfcl").unwrap();
    assert_eq!(alewife["classification"], "ALL_OUT");
}

#[tokio::test]
async fn test_server_status_without_data_is_an_error() {
    let (addr, _shutdown) = spawn_server(500, FixedReport(Ok("ok"))).await;

    let resp = reqwest::get(format!("http://{addr}/api/status")).await.unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], NO_DATA_MESSAGE);
    assert_eq!(body["upstreamStatus"], 500);
    assert!(body.get("stations").is_none());
}

#[tokio::test]
async fn test_server_station_detail_lists_outages_first() {
    let (addr, _shutdown) = spawn_server(200, FixedReport(Ok("ok"))).await;

    let body: Value = reqwest::get(format!("http://{addr}/api/stations/place-pktrm"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["station"]["name"], "Park Street");
    let facilities = body["facilities"].as_array().unwrap();
    assert_eq!(facilities.len(), 3);
    assert_eq!(facilities[0]["id"], "876");
    assert_eq!(facilities[0]["status"], "OUT_OF_SERVICE");
    assert_eq!(facilities[0]["alert"]["severity"], "3");
}

#[tokio::test]
async fn test_server_unknown_station_is_404() {
    let (addr, _shutdown) = spawn_server(200, FixedReport(Ok("ok"))).await;

    let resp = reqwest::get(format!("http://{addr}/api/stations/place-nowhere"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_server_report_ready() {
    let (addr, _shutdown) = spawn_server(200, FixedReport(Ok("Use elevator 877."))).await;

    let body: Value = reqwest::get(format!("http://{addr}/api/stations/place-pktrm/report"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["display_text"], "Use elevator 877.");
}

#[tokio::test]
async fn test_server_report_unavailable_keeps_200() {
    let (addr, _shutdown) = spawn_server(200, FixedReport(Err("connection refused"))).await;

    let resp = reqwest::get(format!("http://{addr}/api/stations/place-pktrm/report"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "unavailable");
    assert_eq!(body["display_text"], "AI report unavailable right now.");
}
