//! Mutable dashboard state and last-write-wins publication.
//!
//! The dataset is installed once per load and shared immutably. Each filter
//! change or reload asks for a recompute; every request gets a generation
//! number and only the newest request is allowed to publish. Published
//! summaries are replaced wholesale, never patched.

use crate::aggregate::aggregate_with;
use crate::config::TimeBasis;
use crate::error::DashboardError;
use crate::extract::{city_options, extract};
use crate::loader::{load_dataset, Dataset, LoadReport};
use crate::types::{Filter, Summaries, ALL_CITIES};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Receives every newly published summary set.
pub trait SummarySink {
    fn summaries_published(&mut self, published: &Published);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub generation: u64,
    pub filter: Filter,
    pub summaries: Arc<Summaries>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// A pending recompute: the inputs it was started with plus its generation.
#[derive(Debug, Clone)]
pub struct RecomputeTicket {
    generation: u64,
    dataset: Arc<Dataset>,
    filter: Filter,
    time_basis: TimeBasis,
}

impl RecomputeTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn compute(&self) -> Summaries {
        aggregate_with(extract(&self.dataset.containers, &self.filter), self.time_basis)
    }
}

pub struct Session {
    dataset: Option<Arc<Dataset>>,
    filter: Filter,
    time_basis: TimeBasis,
    load_generation: u64,
    recompute_generation: u64,
    published: Option<Published>,
    sinks: Vec<Box<dyn SummarySink + Send>>,
}

impl Session {
    pub fn new(time_basis: TimeBasis) -> Self {
        Self {
            dataset: None,
            filter: Filter::All,
            time_basis,
            load_generation: 0,
            recompute_generation: 0,
            published: None,
            sinks: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, sink: Box<dyn SummarySink + Send>) {
        self.sinks.push(sink);
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_deref()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn published(&self) -> Option<&Published> {
        self.published.as_ref()
    }

    /// Start a load. Any earlier load still in flight is superseded.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        LoadTicket(self.load_generation)
    }

    /// Install a loaded dataset. Returns `false` and drops the data when a
    /// newer load was started after `ticket`. Recomputes already in flight
    /// are invalidated.
    pub fn install(&mut self, ticket: LoadTicket, dataset: Dataset) -> bool {
        if ticket.0 != self.load_generation {
            debug!(ticket = ticket.0, latest = self.load_generation, "dropping superseded load");
            return false;
        }
        self.dataset = Some(Arc::new(dataset));
        self.recompute_generation += 1;
        true
    }

    /// Read `path`, install it and recompute. On error the previous dataset
    /// and published summaries stay as they were.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadReport, DashboardError> {
        let ticket = self.begin_load();
        let (dataset, report) = load_dataset(path)?;
        if self.install(ticket, dataset) {
            self.recompute()?;
        }
        Ok(report)
    }

    /// Change the active filter. Recomputes already in flight are invalidated.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.recompute_generation += 1;
    }

    /// Selector options for the current dataset, regardless of the active filter.
    pub fn city_options(&self) -> Vec<String> {
        match &self.dataset {
            Some(data) => city_options(&data.containers),
            None => vec![ALL_CITIES.to_string()],
        }
    }

    pub fn begin_recompute(&mut self) -> Result<RecomputeTicket, DashboardError> {
        let dataset = self.dataset.clone().ok_or(DashboardError::NoData)?;
        self.recompute_generation += 1;
        Ok(RecomputeTicket {
            generation: self.recompute_generation,
            dataset,
            filter: self.filter.clone(),
            time_basis: self.time_basis,
        })
    }

    /// Publish `summaries` if `ticket` is still the newest request, then
    /// notify every sink. Stale results are discarded.
    pub fn publish(&mut self, ticket: RecomputeTicket, summaries: Summaries) -> bool {
        if ticket.generation != self.recompute_generation {
            debug!(
                ticket = ticket.generation,
                latest = self.recompute_generation,
                "discarding superseded recompute"
            );
            return false;
        }
        let published = self.published.insert(Published {
            generation: ticket.generation,
            filter: ticket.filter,
            summaries: Arc::new(summaries),
        });
        for sink in self.sinks.iter_mut() {
            sink.summaries_published(published);
        }
        true
    }

    /// Synchronous recompute: snapshot, aggregate, publish.
    pub fn recompute(&mut self) -> Result<&Published, DashboardError> {
        let ticket = self.begin_recompute()?;
        let started = Instant::now();
        let summaries = ticket.compute();
        info!(
            filter = %ticket.filter,
            orders = summaries.kpi.total_orders,
            elapsed_us = started.elapsed().as_micros() as u64,
            "recomputed dashboard summaries"
        );
        self.publish(ticket, summaries);
        self.published.as_ref().ok_or(DashboardError::NoData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::loader::parse_dataset;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const DATA: &str = r#"[{"documents":[
        {"city":"Mumbai","orderAmount":"500","bookingStatus":"CANCELLED"},
        {"city":"Delhi","orderAmount":"300"},
        {"orderAmount":"7"}
    ]}]"#;

    fn loaded() -> Session {
        let mut session = Session::new(TimeBasis::Utc);
        let ticket = session.begin_load();
        let (data, _) = parse_dataset(DATA).unwrap();
        assert!(session.install(ticket, data));
        session
    }

    struct Recorder(Arc<Mutex<Vec<u64>>>);

    impl SummarySink for Recorder {
        fn summaries_published(&mut self, published: &Published) {
            self.0.lock().unwrap().push(published.generation);
        }
    }

    #[test]
    fn recompute_without_data_publishes_nothing() {
        let mut session = Session::new(TimeBasis::Utc);
        assert!(matches!(session.recompute(), Err(DashboardError::NoData)));
        assert!(session.published().is_none());
        assert_eq!(session.city_options(), vec!["ALL"]);
    }

    #[test]
    fn filter_change_replaces_summaries() {
        let mut session = loaded();
        assert_eq!(session.recompute().unwrap().summaries.kpi.total_orders, 3);
        session.set_filter(Filter::City("Delhi".into()));
        let published = session.recompute().unwrap();
        assert_eq!(published.summaries.kpi.total_orders, 1);
        assert_eq!(published.summaries.kpi.profit, 300.0);
        assert_eq!(published.filter, Filter::City("Delhi".into()));
    }

    #[test]
    fn options_do_not_shrink_under_a_filter() {
        let mut session = loaded();
        session.set_filter(Filter::City("Delhi".into()));
        assert_eq!(session.city_options(), vec!["ALL", "Mumbai", "Delhi"]);
    }

    #[test]
    fn latest_recompute_wins() {
        let mut session = loaded();
        let seen = Arc::new(Mutex::new(Vec::new()));
        session.subscribe(Box::new(Recorder(seen.clone())));

        let stale = session.begin_recompute().unwrap();
        session.set_filter(Filter::City("Mumbai".into()));
        let fresh = session.begin_recompute().unwrap();
        let fresh_generation = fresh.generation();

        let fresh_result = fresh.compute();
        let stale_result = stale.compute();
        assert!(session.publish(fresh, fresh_result));
        assert!(!session.publish(stale, stale_result));

        let published = session.published().unwrap();
        assert_eq!(published.filter, Filter::City("Mumbai".into()));
        assert_eq!(published.summaries.kpi.total_orders, 1);
        assert_eq!(*seen.lock().unwrap(), vec![fresh_generation]);
    }

    #[test]
    fn reload_invalidates_pending_recompute() {
        let mut session = loaded();
        let pending = session.begin_recompute().unwrap();

        let ticket = session.begin_load();
        let (newer, _) = parse_dataset(r#"[{"documents":[{"city":"Pune"}]}]"#).unwrap();
        assert!(session.install(ticket, newer));

        let stale_result = pending.compute();
        assert!(!session.publish(pending, stale_result));
        assert!(session.published().is_none());
    }

    #[test]
    fn filter_change_invalidates_pending_recompute() {
        let mut session = loaded();
        let pending = session.begin_recompute().unwrap();
        session.set_filter(Filter::City("Delhi".into()));

        let stale_result = pending.compute();
        assert!(!session.publish(pending, stale_result));

        let published = session.recompute().unwrap().clone();
        assert_eq!(&published.filter, session.filter());
        assert_eq!(published.summaries.kpi.total_orders, 1);
    }

    #[test]
    fn superseded_load_is_dropped() {
        let mut session = Session::new(TimeBasis::Utc);
        let first = session.begin_load();
        let second = session.begin_load();
        let (newer, _) = parse_dataset(DATA).unwrap();
        assert!(session.install(second, newer));
        assert!(!session.install(first, Dataset::default()));
        assert_eq!(session.dataset().unwrap().document_count(), 3);
    }

    #[test]
    fn load_installs_and_publishes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bookings.json");
        fs::write(&path, DATA).unwrap();

        let mut session = Session::new(TimeBasis::Utc);
        let report = session.load(&path).unwrap();
        assert_eq!(report.documents, 3);
        assert_eq!(session.published().unwrap().summaries.kpi.total_orders, 3);
    }

    #[test]
    fn failed_reload_keeps_previous_summaries() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        fs::write(&good, DATA).unwrap();
        fs::write(&bad, r#"{"not":"an array"}"#).unwrap();

        let mut session = Session::new(TimeBasis::Utc);
        let seen = Arc::new(Mutex::new(Vec::new()));
        session.subscribe(Box::new(Recorder(seen.clone())));
        session.load(&good).unwrap();
        let published_before = session.published().cloned();
        let dataset_before = session.dataset().cloned();
        let notified_before = seen.lock().unwrap().len();

        let err = session.load(&bad).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::Load(LoadError::Structural { .. })
        ));
        let err = session.load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, DashboardError::Load(LoadError::Io { .. })));

        assert_eq!(session.published().cloned(), published_before);
        assert_eq!(session.dataset().cloned(), dataset_before);
        assert_eq!(seen.lock().unwrap().len(), notified_before);
        assert_eq!(notified_before, 1);
    }
}
