//! Cascading filter state for the dashboard session.
//!
//! The selection is an immutable nine-field value; every mutation goes
//! through [`FilterSelection::apply`], which owns the cascade-reset rules in
//! one place. Setting a geographic field resets all of its strict
//! descendants, so a stale ward can never outlive a region change.

mod options;
mod predicate;

pub use options::FilterOptions;
pub use predicate::matches;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Sentinel used by the dashboard UI for "no constraint".
pub const ALL: &str = "all";

/// A single categorical filter value: either the `"all"` sentinel or one
/// concrete category. The empty string deserializes as `All`, matching the
/// dashboard's treatment of falsy selections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector {
    #[default]
    All,
    Only(String),
}

impl Selector {
    pub fn only(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() || value == ALL {
            Self::All
        } else {
            Self::Only(value)
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Only(_))
    }

    /// True when this selector places no constraint on `value` or equals it
    /// exactly (case-sensitive).
    pub fn admits(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => only == value,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(only) => Some(only),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value().unwrap_or(ALL))
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Self::only(value)
    }
}

impl Serialize for Selector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.value().unwrap_or(ALL))
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::only(raw))
    }
}

/// The full filter state: two inclusive date bounds plus seven categorical
/// selectors. `Default` is the initial state with every component unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    #[serde(with = "date_bound")]
    pub from_date: Option<NaiveDate>,
    #[serde(with = "date_bound")]
    pub to_date: Option<NaiveDate>,
    pub region: Selector,
    pub district: Selector,
    pub sub_county: Selector,
    pub facility: Selector,
    pub ownership: Selector,
    pub level_of_care: Selector,
    pub ward_name: Selector,
}

/// A user interaction with one filter control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    SetFromDate(Option<NaiveDate>),
    SetToDate(Option<NaiveDate>),
    SetRegion(Selector),
    SetDistrict(Selector),
    SetSubCounty(Selector),
    SetFacility(Selector),
    SetOwnership(Selector),
    SetLevelOfCare(Selector),
    SetWardName(Selector),
    ClearAll,
}

impl FilterSelection {
    /// Pure reducer mapping `(state, action)` to the next state.
    pub fn apply(&self, action: FilterAction) -> Self {
        let mut next = self.clone();
        match action {
            FilterAction::SetFromDate(date) => next.from_date = date,
            FilterAction::SetToDate(date) => next.to_date = date,
            FilterAction::SetRegion(region) => {
                next.region = region;
                next.district = Selector::All;
                next.sub_county = Selector::All;
                next.facility = Selector::All;
                next.ward_name = Selector::All;
            }
            FilterAction::SetDistrict(district) => {
                next.district = district;
                next.sub_county = Selector::All;
                next.facility = Selector::All;
                next.ward_name = Selector::All;
            }
            FilterAction::SetSubCounty(sub_county) => {
                next.sub_county = sub_county;
                next.facility = Selector::All;
                next.ward_name = Selector::All;
            }
            FilterAction::SetFacility(facility) => {
                next.facility = facility;
                next.ward_name = Selector::All;
            }
            FilterAction::SetOwnership(ownership) => next.ownership = ownership,
            FilterAction::SetLevelOfCare(level) => next.level_of_care = level,
            FilterAction::SetWardName(ward) => next.ward_name = ward,
            FilterAction::ClearAll => next = Self::default(),
        }
        next
    }

    /// True when at least one component constrains the record set.
    pub fn is_active(&self) -> bool {
        self.from_date.is_some()
            || self.to_date.is_some()
            || self.region.is_active()
            || self.district.is_active()
            || self.sub_county.is_active()
            || self.facility.is_active()
            || self.ownership.is_active()
            || self.level_of_care.is_active()
            || self.ward_name.is_active()
    }

    /// Active `(field, value)` pairs, in hierarchy order. Used by exports to
    /// print the applied-filters block.
    pub fn active_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(date) = self.from_date {
            fields.push(("from_date", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(date) = self.to_date {
            fields.push(("to_date", date.format("%Y-%m-%d").to_string()));
        }
        for (name, selector) in [
            ("region", &self.region),
            ("district", &self.district),
            ("sub_county", &self.sub_county),
            ("facility", &self.facility),
            ("ownership", &self.ownership),
            ("level_of_care", &self.level_of_care),
            ("ward_name", &self.ward_name),
        ] {
            if let Some(value) = selector.value() {
                fields.push((name, value.to_string()));
            }
        }
        fields
    }
}

/// Serializes a date bound as `YYYY-MM-DD`, with the `"all"` sentinel (or
/// null, or the empty string) standing for "unset".
mod date_bound {
    use super::ALL;
    use chrono::NaiveDate;
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_str(ALL),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") | Some(ALL) => Ok(None),
            Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(Some)
                .map_err(|err| {
                    DeError::custom(format!("failed to parse '{value}' as YYYY-MM-DD ({err})"))
                }),
        }
    }
}
