use super::FilterSelection;
use crate::dashboard::domain::PatientRecord;

/// Decide whether one patient record satisfies the current selection.
///
/// Every active constraint must hold (logical AND): exact, case-sensitive
/// equality for the seven categorical fields, inclusive bounds for the two
/// dates. The survey date is already date-only; a record without a parseable
/// survey date fails any active date bound.
pub fn matches(patient: &PatientRecord, selection: &FilterSelection) -> bool {
    if !selection.region.admits(&patient.region) {
        return false;
    }
    if !selection.district.admits(&patient.district) {
        return false;
    }
    if !selection.sub_county.admits(&patient.subcounty) {
        return false;
    }
    if !selection.facility.admits(&patient.facility) {
        return false;
    }
    if !selection.ownership.admits(&patient.ownership) {
        return false;
    }
    if !selection.level_of_care.admits(&patient.level_of_care) {
        return false;
    }
    if !selection.ward_name.admits(&patient.ward_name) {
        return false;
    }

    if let Some(from) = selection.from_date {
        match patient.survey_date {
            Some(date) if date >= from => {}
            _ => return false,
        }
    }
    if let Some(to) = selection.to_date {
        match patient.survey_date {
            Some(date) if date <= to => {}
            _ => return false,
        }
    }

    true
}
