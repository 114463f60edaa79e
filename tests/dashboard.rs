use booking_dashboard::config::TimeBasis;
use booking_dashboard::output::{export_dashboard, SUMMARY_FILE};
use booking_dashboard::{
    aggregate_in, extract, load_dataset, parse_dataset, Filter, LoadError, Session,
};
use chrono::Utc;
use std::fs;
use tempfile::TempDir;

const BOOKINGS: &str = r#"[
  {"documents": [
    {"city":"Mumbai","orderAmount":"500","bookingStatus":"CANCELLED","paymentMethod":"UPI","dateTime":{"$date":"2024-03-05T10:00:00Z"}},
    {"city":"Delhi","orderAmount":300,"bookingStatus":"CONFIRMED","paymentMethod":"CARD","dateTime":{"$date":"2024-03-20T10:00:00Z"}}
  ]},
  {"documents": null},
  {"documents": [
    {"orderAmount":"abc","bookingStatus":"RESCHEDULED","dateTime":{"$date":"not-a-date"}},
    {"city":"Pune","orderAmount":"75","paymentMethod":"UPI","dateTime":{"$date":{"$numberLong":"1704196800000"}}}
  ]}
]"#;

fn write_export(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("bookings-analytics.json");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn all_filter_counts_every_document() {
    let dir = TempDir::new().unwrap();
    let (data, report) = load_dataset(write_export(&dir, BOOKINGS)).unwrap();
    assert_eq!(report.documents, 4);
    assert_eq!(report.containers_without_documents, 1);

    let s = aggregate_in(extract(&data.containers, &Filter::All), &Utc);
    assert_eq!(s.kpi.total_orders, 4);
    assert_eq!(s.kpi.profit, 875.0);
    assert_eq!(s.kpi.cancelled, 1);
    assert_eq!(s.kpi.rescheduled, 1);
    assert_eq!(s.by_status.total(), 3);
    assert_eq!(
        s.by_year.iter().collect::<Vec<_>>(),
        vec![("2024", 3)]
    );
    assert_eq!(
        s.by_month.iter().collect::<Vec<_>>(),
        vec![("Mar 2024", 2), ("Jan 2024", 1)]
    );
    assert_eq!(
        s.by_city.iter().collect::<Vec<_>>(),
        vec![("Mumbai", 1), ("Delhi", 1), ("Pune", 1)]
    );
}

#[test]
fn city_filter_counts_only_that_city() {
    let (data, _) = parse_dataset(BOOKINGS).unwrap();
    let s = aggregate_in(extract(&data.containers, &Filter::City("Mumbai".into())), &Utc);
    assert_eq!(s.kpi.total_orders, 1);
    assert_eq!(s.by_city.iter().collect::<Vec<_>>(), vec![("Mumbai", 1)]);
}

#[test]
fn reordering_containers_keeps_integral_profit() {
    let forward = r#"[{"documents":[{"orderAmount":"500"},{"orderAmount":"20"}]},{"documents":[{"orderAmount":7}]}]"#;
    let backward = r#"[{"documents":[{"orderAmount":7}]},{"documents":[{"orderAmount":"20"},{"orderAmount":"500"}]}]"#;
    let profit = |text: &str| {
        let (data, _) = parse_dataset(text).unwrap();
        aggregate_in(extract(&data.containers, &Filter::All), &Utc).kpi.profit
    };
    assert_eq!(profit(forward), profit(backward));
    assert_eq!(profit(forward), 527.0);
}

#[test]
fn structural_errors_are_distinct_from_parse_errors() {
    let dir = TempDir::new().unwrap();
    let err = load_dataset(write_export(&dir, r#"{"documents":[]}"#)).unwrap_err();
    assert!(matches!(err, LoadError::Structural { .. }));
    let err = load_dataset(write_export(&dir, "[{\"documents\": [")).unwrap_err();
    assert!(matches!(err, LoadError::Parse(_)));
}

#[test]
fn session_round_trip_and_export() {
    let dir = TempDir::new().unwrap();
    let (data, _) = load_dataset(write_export(&dir, BOOKINGS)).unwrap();

    let mut session = Session::new(TimeBasis::Utc);
    let ticket = session.begin_load();
    assert!(session.install(ticket, data));
    assert_eq!(
        session.city_options(),
        vec!["ALL", "Mumbai", "Delhi", "Pune"]
    );

    session.set_filter(Filter::City("Pune".into()));
    let published = session.recompute().unwrap().clone();
    assert_eq!(published.summaries.kpi.total_orders, 1);

    let out = dir.path().join("out");
    let files = export_dashboard(&out, &published).unwrap();
    assert_eq!(files.len(), 7);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join(SUMMARY_FILE)).unwrap()).unwrap();
    assert_eq!(json["filter"], "Pune");
    assert_eq!(json["kpi"]["totalOrders"], 1);
    assert_eq!(json["byCity"]["Pune"], 1);
    // Pune has no reference coordinates.
    assert_eq!(json["markers"].as_array().unwrap().len(), 0);
    assert_eq!(json["mapZoom"], 5);

    let csv = fs::read_to_string(out.join("orders_by_payment.csv")).unwrap();
    assert_eq!(csv, "Group,Orders\nUPI,1\n");
}
