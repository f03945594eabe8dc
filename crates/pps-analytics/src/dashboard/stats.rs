use crate::dashboard::domain::PatientRecord;
use crate::dashboard::filters::{self, FilterSelection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCount {
    pub region: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityCount {
    pub facility: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardCount {
    pub ward: String,
    pub count: u64,
}

/// Summary statistics over the records passing the current filter, in the
/// same wire shape as the backend's `/api/v1/patients/stats` payload.
///
/// Group entries appear in first-occurrence order among passing records,
/// never sorted; chart rendering order depends on it staying stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateStats {
    pub total_patients: u64,
    pub patients_on_antibiotic: u64,
    pub by_region: Vec<RegionCount>,
    pub by_facility: Vec<FacilityCount>,
    pub by_ward: Vec<WardCount>,
}

impl AggregateStats {
    /// Reduce an already-filtered record sequence in a single pass.
    pub fn compute<'a>(patients: impl IntoIterator<Item = &'a PatientRecord>) -> Self {
        let mut total_patients = 0;
        let mut patients_on_antibiotic = 0;
        let mut by_region = Tally::default();
        let mut by_facility = Tally::default();
        let mut by_ward = Tally::default();

        for patient in patients {
            total_patients += 1;
            if patient.is_on_antibiotic() {
                patients_on_antibiotic += 1;
            }
            by_region.bump(&patient.region);
            by_facility.bump(&patient.facility);
            by_ward.bump(&patient.ward_name);
        }

        Self {
            total_patients,
            patients_on_antibiotic,
            by_region: by_region
                .into_entries()
                .map(|(region, count)| RegionCount { region, count })
                .collect(),
            by_facility: by_facility
                .into_entries()
                .map(|(facility, count)| FacilityCount { facility, count })
                .collect(),
            by_ward: by_ward
                .into_entries()
                .map(|(ward, count)| WardCount { ward, count })
                .collect(),
        }
    }

    /// Filter and reduce in one step.
    pub fn for_selection(patients: &[PatientRecord], selection: &FilterSelection) -> Self {
        Self::compute(
            patients
                .iter()
                .filter(|patient| filters::matches(patient, selection)),
        )
    }
}

/// Insertion-ordered counter. The side index keeps the per-record cost
/// constant; the entry list preserves first-occurrence order.
#[derive(Default)]
struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<(String, u64)>,
}

impl Tally {
    fn bump(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&at) => self.entries[at].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    fn into_entries(self) -> impl Iterator<Item = (String, u64)> {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::filters::{FilterAction, Selector};

    fn patient(region: &str, on_antibiotic: &str) -> PatientRecord {
        PatientRecord {
            region: region.to_string(),
            facility: format!("{region} General"),
            ward_name: "Medical".to_string(),
            patient_on_antibiotic: on_antibiotic.to_string(),
            ..PatientRecord::default()
        }
    }

    #[test]
    fn empty_input_yields_zero_counts() {
        let stats = AggregateStats::compute([]);
        assert_eq!(stats.total_patients, 0);
        assert_eq!(stats.patients_on_antibiotic, 0);
        assert!(stats.by_region.is_empty());
        assert!(stats.by_facility.is_empty());
        assert!(stats.by_ward.is_empty());
    }

    #[test]
    fn counts_and_groups_reflect_passing_records() {
        let patients = vec![
            patient("Central", "yes"),
            patient("Central", "no"),
            patient("Western", "yes"),
        ];
        let selection =
            FilterSelection::default().apply(FilterAction::SetRegion(Selector::only("Central")));

        let stats = AggregateStats::for_selection(&patients, &selection);
        assert_eq!(stats.total_patients, 2);
        assert_eq!(stats.patients_on_antibiotic, 1);
        assert_eq!(
            stats.by_region,
            vec![RegionCount {
                region: "Central".to_string(),
                count: 2
            }]
        );
    }

    #[test]
    fn group_order_is_first_occurrence_not_count() {
        // "Western" appears first but ends up with the smaller count; it must
        // still lead the group list.
        let patients = vec![
            patient("Western", "no"),
            patient("Central", "no"),
            patient("Central", "no"),
            patient("Central", "no"),
        ];
        let stats = AggregateStats::compute(patients.iter());
        let regions: Vec<&str> = stats.by_region.iter().map(|g| g.region.as_str()).collect();
        assert_eq!(regions, vec!["Western", "Central"]);
        assert_eq!(stats.by_region[1].count, 3);
    }

    #[test]
    fn non_yes_flags_count_toward_total_only() {
        let patients = vec![patient("Central", "unknown"), patient("Central", "")];
        let stats = AggregateStats::compute(patients.iter());
        assert_eq!(stats.total_patients, 2);
        assert_eq!(stats.patients_on_antibiotic, 0);
    }

    #[test]
    fn wire_shape_matches_backend_stats_payload() {
        let raw = r#"{
            "total_patients": 3,
            "patients_on_antibiotic": 1,
            "by_region": [{"region": "Central", "count": 3}],
            "by_facility": [{"facility": "Mulago NRH", "count": 3}],
            "by_ward": [{"ward": "Medical", "count": 3}]
        }"#;
        let stats: AggregateStats = serde_json::from_str(raw).expect("payload parses");
        assert_eq!(stats.total_patients, 3);
        assert_eq!(stats.by_facility[0].facility, "Mulago NRH");
    }
}
