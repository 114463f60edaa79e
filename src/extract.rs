use crate::types::{BookingDocument, Container, Filter, ALL_CITIES};
use indexmap::IndexSet;

/// Flatten containers into the documents that pass `filter`, in dataset order.
///
/// The iterator is lazy and borrows everything; nothing is copied or mutated.
pub fn extract<'a>(
    containers: &'a [Container],
    filter: &'a Filter,
) -> impl Iterator<Item = &'a BookingDocument> + 'a {
    containers
        .iter()
        .flat_map(|c| c.documents.iter())
        .filter(move |doc| filter.matches(doc))
}

/// Options for the city selector: `"ALL"` followed by every distinct city in
/// first-seen order. Independent of the active filter.
pub fn city_options(containers: &[Container]) -> Vec<String> {
    let cities: IndexSet<&str> = containers
        .iter()
        .flat_map(|c| c.documents.iter())
        .filter_map(|doc| doc.city.as_deref())
        .collect();
    std::iter::once(ALL_CITIES)
        .chain(cities)
        .map(str::to_string)
        .collect()
}
