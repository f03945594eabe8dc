use super::FilterSelection;
use crate::dashboard::domain::PatientRecord;
use serde::Serialize;
use std::collections::BTreeSet;

/// Legal choices for every filter control given the current ancestor
/// selections. Each list is sorted ascending (case-sensitive), de-duplicated,
/// and free of empty strings.
///
/// `regions`, `ownerships`, and `levels_of_care` always span the whole record
/// set; the geographic descendants narrow by their ancestors and are empty
/// until a concrete ancestor is picked (`"all"` behaves exactly like unset).
/// Ward options depend on the facility alone, since ward names only mean
/// anything within one facility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub districts: Vec<String>,
    pub sub_counties: Vec<String>,
    pub facilities: Vec<String>,
    pub ownerships: Vec<String>,
    pub levels_of_care: Vec<String>,
    pub ward_names: Vec<String>,
}

impl FilterOptions {
    pub fn derive(patients: &[PatientRecord], selection: &FilterSelection) -> Self {
        let regions = distinct(patients.iter().map(|p| p.region.as_str()));
        let ownerships = distinct(patients.iter().map(|p| p.ownership.as_str()));
        let levels_of_care = distinct(patients.iter().map(|p| p.level_of_care.as_str()));

        let districts = match selection.region.value() {
            Some(region) => distinct(
                patients
                    .iter()
                    .filter(|p| p.region == region)
                    .map(|p| p.district.as_str()),
            ),
            None => Vec::new(),
        };

        let sub_counties = match (selection.region.value(), selection.district.value()) {
            (Some(region), Some(district)) => distinct(
                patients
                    .iter()
                    .filter(|p| p.region == region && p.district == district)
                    .map(|p| p.subcounty.as_str()),
            ),
            _ => Vec::new(),
        };

        let facilities = match (
            selection.region.value(),
            selection.district.value(),
            selection.sub_county.value(),
        ) {
            (Some(region), Some(district), Some(sub_county)) => distinct(
                patients
                    .iter()
                    .filter(|p| {
                        p.region == region && p.district == district && p.subcounty == sub_county
                    })
                    .map(|p| p.facility.as_str()),
            ),
            _ => Vec::new(),
        };

        let ward_names = match selection.facility.value() {
            Some(facility) => distinct(
                patients
                    .iter()
                    .filter(|p| p.facility == facility)
                    .map(|p| p.ward_name.as_str()),
            ),
            None => Vec::new(),
        };

        Self {
            regions,
            districts,
            sub_counties,
            facilities,
            ownerships,
            levels_of_care,
            ward_names,
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
