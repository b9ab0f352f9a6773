#![expect(clippy::indexing_slicing)]
//! Fixtures shared by the inference tests.

mod parametric;
mod report;

use crate::analyser::logic::types::GroupSummary;

fn group(
    park: &str,
    category: &str,
    status: &str,
    species_count: u32,
    (acres, latitude, longitude): (f64, f64, f64),
) -> GroupSummary {
    GroupSummary {
        park_name: park.to_owned(),
        category: category.to_owned(),
        conservation_status: status.to_owned(),
        species_count,
        mean_acres: acres,
        mean_latitude: latitude,
        mean_longitude: longitude,
    }
}

const ACADIA: (f64, f64, f64) = (100.0, 44.0, -68.0);
const ARCHES: (f64, f64, f64) = (50.0, 38.0, -109.0);

/// Balanced 2 × 2 layout replicated over two parks.
fn balanced_groups() -> Vec<GroupSummary> {
    vec![
        group("Acadia", "Bird", "Endangered", 10, ACADIA),
        group("Arches", "Bird", "Endangered", 12, ARCHES),
        group("Acadia", "Bird", "Threatened", 14, ACADIA),
        group("Arches", "Bird", "Threatened", 18, ARCHES),
        group("Acadia", "Mammal", "Endangered", 20, ACADIA),
        group("Arches", "Mammal", "Endangered", 22, ARCHES),
        group("Acadia", "Mammal", "Threatened", 26, ACADIA),
        group("Arches", "Mammal", "Threatened", 24, ARCHES),
    ]
}
