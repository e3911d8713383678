pub mod channel;
pub mod employer;
pub mod job;
pub mod proposal;
pub mod review;
pub mod text;
pub mod worker;

use itertools::Itertools;
use std::collections::BTreeSet;

pub use channel::{BroadcastChannel, ChannelAudience};
pub use employer::Employer;
pub use job::Job;
pub use proposal::{Proposal, ProposalOrigin, ProposalRef, ProposalState};
pub use review::{Review, ReviewOrigin, ReviewRef};
pub use worker::Worker;
pub use workx_sdk::objects::ChatId;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Primary key of a worker profile.
    WorkerId
);
entity_id!(
    /// Primary key of an employer account.
    EmployerId
);
entity_id!(
    /// Primary key of a job listing.
    JobId
);

/// A territorial zone from the fixed catalogue.
///
/// Zones are not user-defined: only the numbers in [`Zone::CATALOGUE`] can
/// be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Zone(u8);

impl Zone {
    pub const CATALOGUE: [Zone; 3] = [Zone(1), Zone(2), Zone(3)];

    pub fn new(number: u8) -> Option<Zone> {
        Self::CATALOGUE.into_iter().find(|zone| zone.0 == number)
    }

    pub fn number(self) -> u8 {
        self.0
    }
}

impl TryFrom<i16> for Zone {
    type Error = i16;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Zone::new)
            .ok_or(value)
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The zones a worker covers or a job is located in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneSet(BTreeSet<Zone>);

impl ZoneSet {
    /// Build a set from raw zone numbers, dropping numbers outside the
    /// catalogue.
    pub fn from_numbers(numbers: &[u8]) -> Self {
        numbers.iter().copied().filter_map(Zone::new).collect()
    }

    /// Build a set from a `SMALLINT[]` column.
    pub(crate) fn from_column(values: Vec<i16>) -> Self {
        values
            .into_iter()
            .filter_map(|value| match Zone::try_from(value) {
                Ok(zone) => Some(zone),
                Err(unknown) => {
                    tracing::warn!(zone = unknown, "Ignoring zone outside the catalogue");
                    None
                }
            })
            .collect()
    }

    /// Encode as a `SMALLINT[]` bind value.
    pub(crate) fn to_column(&self) -> Vec<i16> {
        self.0.iter().map(|zone| i16::from(zone.0)).collect()
    }

    /// True if at least one zone is shared.
    pub fn overlaps(&self, other: &ZoneSet) -> bool {
        self.0.intersection(&other.0).next().is_some()
    }

    /// Comma-joined zone labels in ascending order, e.g. `1, 3`.
    pub fn labels(&self) -> String {
        self.0.iter().join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Zone> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Zone> for ZoneSet {
    fn from_iter<I: IntoIterator<Item = Zone>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Permanent or temporary work.
///
/// Stored as the `permanent_work` boolean column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmploymentType {
    Permanent,
    Temporary,
}

impl EmploymentType {
    pub fn from_permanent_flag(permanent_work: bool) -> Self {
        if permanent_work {
            EmploymentType::Permanent
        } else {
            EmploymentType::Temporary
        }
    }

    pub fn is_permanent(self) -> bool {
        self == EmploymentType::Permanent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_catalogue_is_closed() {
        assert_eq!(Zone::new(2).map(Zone::number), Some(2));
        assert_eq!(Zone::new(0), None);
        assert_eq!(Zone::new(4), None);
        assert_eq!(Zone::try_from(-1i16), Err(-1));
        assert_eq!(Zone::try_from(300i16), Err(300));
    }

    #[test]
    fn test_zone_set_from_column_drops_unknown() {
        let zones = ZoneSet::from_column(vec![3, 1, 9, 1]);
        assert_eq!(zones.to_column(), vec![1, 3]);
        assert_eq!(zones.labels(), "1, 3");
    }

    #[test]
    fn test_overlap() {
        let a = ZoneSet::from_numbers(&[1, 2]);
        let b = ZoneSet::from_numbers(&[2, 3]);
        let c = ZoneSet::from_numbers(&[3]);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
        assert!(!ZoneSet::default().overlaps(&a));
    }

    #[test]
    fn test_employment_type_flag() {
        assert!(EmploymentType::from_permanent_flag(true).is_permanent());
        assert_eq!(
            EmploymentType::from_permanent_flag(false),
            EmploymentType::Temporary
        );
    }
}
