use crate::error::ExportError;
use crate::geo::{map_markers, MapMarker, MAP_CENTER, MAP_ZOOM};
use crate::session::{Published, SummarySink};
use crate::types::{GroupRow, KpiSummary, MarkerRow, Summaries};
use crate::util::{format_int, format_number};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub const SUMMARY_FILE: &str = "dashboard_summary.json";

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn kpi_line(kpi: &KpiSummary) -> String {
    format!(
        "Orders: {} | Profit: ₹{} | Cancelled: {} | Rescheduled: {}",
        format_int(kpi.total_orders),
        format_number(kpi.profit, 2),
        format_int(kpi.cancelled),
        format_int(kpi.rescheduled)
    )
}

pub fn marker_rows(markers: &[MapMarker]) -> Vec<MarkerRow> {
    markers
        .iter()
        .map(|m| MarkerRow {
            city: m.city.clone(),
            latitude: m.latitude,
            longitude: m.longitude,
            orders: m.count,
            radius: format_number(m.radius, 2),
        })
        .collect()
}

/// Named groupings in display order, paired with their export file names.
fn groupings(summaries: &Summaries) -> [(&'static str, &'static str, Vec<GroupRow>); 5] {
    [
        ("Orders by Month", "orders_by_month.csv", GroupRow::rows(&summaries.by_month)),
        ("Orders by Payment Method", "orders_by_payment.csv", GroupRow::rows(&summaries.by_payment)),
        ("Orders by Booking Status", "orders_by_status.csv", GroupRow::rows(&summaries.by_status)),
        ("Orders by Year", "orders_by_year.csv", GroupRow::rows(&summaries.by_year)),
        ("Orders by City", "orders_by_city.csv", GroupRow::rows(&summaries.by_city)),
    ]
}

/// Print the full dashboard: KPIs, every grouping and the map markers.
pub fn render_dashboard(published: &Published, max_rows: usize) {
    let summaries = &published.summaries;
    println!("Booking Dashboard");
    println!("(City filter: {})\n", published.filter);
    println!("{}\n", kpi_line(&summaries.kpi));
    for (title, _, rows) in groupings(summaries) {
        println!("{}\n", title);
        preview_table_rows(&rows, max_rows);
    }
    println!("Map Markers\n");
    preview_table_rows(&marker_rows(&map_markers(&summaries.by_city)), max_rows);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryExport<'a> {
    generation: u64,
    filter: String,
    #[serde(flatten)]
    summaries: &'a Summaries,
    markers: Vec<MapMarker>,
    map_center: (f64, f64),
    map_zoom: u8,
}

/// Write one CSV per grouping plus the JSON summary into `dir`.
pub fn export_dashboard(dir: &Path, published: &Published) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;
    let summaries = &published.summaries;
    let mut written = Vec::new();

    for (_, file, rows) in groupings(summaries) {
        let path = dir.join(file);
        write_csv(&path, &rows)?;
        written.push(path);
    }
    let path = dir.join("map_markers.csv");
    write_csv(&path, &marker_rows(&map_markers(&summaries.by_city)))?;
    written.push(path);

    let export = SummaryExport {
        generation: published.generation,
        filter: published.filter.to_string(),
        summaries,
        markers: map_markers(&summaries.by_city),
        map_center: MAP_CENTER,
        map_zoom: MAP_ZOOM,
    };
    let path = dir.join(SUMMARY_FILE);
    write_json(&path, &export)?;
    written.push(path);

    info!(files = written.len(), dir = %dir.display(), "dashboard exported");
    Ok(written)
}

/// Console sink: announces every new summary set with its KPI line.
pub struct ConsoleRenderer;

impl SummarySink for ConsoleRenderer {
    fn summaries_published(&mut self, published: &Published) {
        println!("[{}] {}\n", published.filter, kpi_line(&published.summaries.kpi));
    }
}
