#![expect(clippy::unwrap_used, clippy::indexing_slicing)]
//! Shared fixtures for the cleaning, aggregation and I/O tests.

mod cleaning;
mod io;

use super::io::SourceTables;
use polars::prelude::*;

/// Park table as the loader returns it: raw headers, every value text.
fn raw_parks() -> DataFrame {
    df!(
        "Park.Code" => ["ACAD", "ARCH", "BADL"],
        "Park.Name" => ["Acadia National Park", "Arches National Park", "Badlands National Park"],
        "State" => ["ME", "UT", "SD"],
        "Acres" => ["47390", "76519", "abc"],
        "Latitude" => ["44.35", "38.68", ""],
        "Longitude" => ["-68.21", "-109.57", "-102.5"]
    )
    .unwrap()
}

/// Species rows covering each status rewrite, an unmatched park, a park
/// with unusable acreage and an empty scientific name.
fn raw_species() -> DataFrame {
    df!(
        "Species_ID" => ["ACAD-1", "ACAD-2", "ACAD-3", "ARCH-1", "ARCH-2", "ARCH-3", "BADL-1", "YOSE-1", "ARCH-4"],
        "Park_Name" => [
            "Acadia National Park",
            "Acadia National Park",
            "Acadia National Park",
            "Arches National Park",
            "Arches National Park",
            "Arches National Park",
            "Badlands National Park",
            "Yosemite National Park",
            "Arches National Park",
        ],
        "Category" => ["Mammal", "Bird", "Bird", "Mammal", "Fish", "Reptile", "Mammal", "Bird", "Vascular Plant"],
        "Scientific_Name" => [
            "Alces alces",
            "Haliaeetus leucocephalus",
            "Passer domesticus",
            "Ovis canadensis",
            "Gila robusta",
            "Crotalus viridis",
            "Mustela nigripes",
            "Strix occidentalis",
            "",
        ],
        "Abundance" => ["Common", "Rare", "Common", "Rare", "Rare", "Common", "Rare", "Rare", "Rare"],
        "Seasonality" => ["Resident", "", "", "", "", "", "", "", ""],
        "Conservation_Status" => [
            Some("Species of Concern"),
            Some("Endangered"),
            None,
            Some("Unknown"),
            Some(""),
            Some("Species of Concern"),
            Some("Endangered"),
            Some("Threatened"),
            Some("In Recovery"),
        ]
    )
    .unwrap()
}

fn raw_sources() -> SourceTables {
    SourceTables {
        parks: raw_parks(),
        species: raw_species(),
    }
}
