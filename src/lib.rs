//! Booking analytics dashboard: loads a nested JSON export of booking
//! documents and recomputes KPI totals, categorical groupings and per-city
//! counts for the active city filter.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod extract;
pub mod geo;
pub mod loader;
pub mod output;
pub mod session;
pub mod types;
pub mod util;

pub use aggregate::{aggregate, aggregate_in, aggregate_with};
pub use error::{DashboardError, LoadError};
pub use extract::{city_options, extract};
pub use loader::{load_dataset, parse_dataset, Dataset, LoadReport};
pub use session::{Published, Session, SummarySink};
pub use types::{
    BookingDocument, CityCountTable, Container, Filter, GroupedCount, KpiSummary, Summaries,
};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default
/// `booking_dashboard=info`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("booking_dashboard=info"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
