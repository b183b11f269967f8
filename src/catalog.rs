use std::fmt;

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// An ID in the catalog tables.
pub type Id = i32;

/// The thing a booking is for. A booking holds exactly one of these.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum CatalogRef {
    Course(Id),
    Activity(Id),
}

impl CatalogRef {
    /// Builds a reference from the two optional IDs a booking form carries.
    /// Returns `None` unless exactly one of them is present.
    pub fn from_parts(course_id: Option<Id>, activity_id: Option<Id>) -> Option<Self> {
        match (course_id, activity_id) {
            (Some(id), None) => Some(CatalogRef::Course(id)),
            (None, Some(id)) => Some(CatalogRef::Activity(id)),
            _ => None,
        }
    }

    pub fn kind(&self) -> CatalogKind {
        match self {
            CatalogRef::Course(_) => CatalogKind::Course,
            CatalogRef::Activity(_) => CatalogKind::Activity,
        }
    }

    pub fn id(&self) -> Id {
        match *self {
            CatalogRef::Course(id) | CatalogRef::Activity(id) => id,
        }
    }

    pub fn course_id(&self) -> Option<Id> {
        match *self {
            CatalogRef::Course(id) => Some(id),
            CatalogRef::Activity(_) => None,
        }
    }

    pub fn activity_id(&self) -> Option<Id> {
        match *self {
            CatalogRef::Activity(id) => Some(id),
            CatalogRef::Course(_) => None,
        }
    }
}

impl fmt::Display for CatalogRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind().as_str(), self.id())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Course,
    Activity,
}

impl CatalogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogKind::Course => "course",
            CatalogKind::Activity => "activity",
        }
    }
}

/// A course or activity as seen by the booking engine. Read-only.
#[derive(Clone, Debug, Serialize)]
pub struct CatalogItem {
    /// Which table it comes from, and its ID there.
    #[serde(flatten)]
    pub(crate) reference: CatalogRef,

    pub(crate) name: String,

    /// The price for a single participant.
    pub(crate) unit_price: Money,

    pub(crate) duration_hours: i32,

    /// Advisory unless capacity enforcement is switched on.
    pub(crate) max_participants: Option<i32>,

    pub(crate) is_active: bool,
}

impl CatalogItem {
    pub fn new(
        reference: CatalogRef,
        name: String,
        unit_price: Money,
        duration_hours: i32,
        max_participants: Option<i32>,
        is_active: bool,
    ) -> Self {
        CatalogItem {
            reference,
            name,
            unit_price,
            duration_hours,
            max_participants,
            is_active,
        }
    }

    pub fn reference(&self) -> CatalogRef {
        self.reference
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            reference: self.reference,
            name: self.name.clone(),
        }
    }
}

/// The catalog fields attached to a booking for display.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CatalogSummary {
    #[serde(flatten)]
    pub(crate) reference: CatalogRef,

    pub(crate) name: String,
}

impl CatalogSummary {
    pub fn new(reference: CatalogRef, name: String) -> Self {
        CatalogSummary { reference, name }
    }

    pub fn reference(&self) -> CatalogRef {
        self.reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_reference() {
        assert_eq!(CatalogRef::from_parts(Some(1), None), Some(CatalogRef::Course(1)));
        assert_eq!(CatalogRef::from_parts(None, Some(2)), Some(CatalogRef::Activity(2)));
        assert_eq!(CatalogRef::from_parts(Some(1), Some(2)), None);
        assert_eq!(CatalogRef::from_parts(None, None), None);
    }

    #[test]
    fn summary_serializes_kind_and_id() {
        let summary = CatalogSummary::new(CatalogRef::Activity(4), "Paddleboard Rental".into());

        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({"kind": "activity", "id": 4, "name": "Paddleboard Rental"})
        );
    }
}
