//! Wire and domain shapes for shows and their cast.
//!
//! The catalog API hands us [`CatalogShow`] and [`CastCredit`] values; the
//! stores only ever see [`Show`]. [`Show::from_catalog`] is the one place the
//! two meet, and it never fails: a birthday the API sends in a shape we
//! cannot read is kept as "unknown".

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One entry of `GET /shows?page={n}`. Fields we do not persist are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogShow {
    pub id: u64,
    pub name: String,
}

/// One entry of `GET /shows/{id}/cast`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastCredit {
    pub person: Person,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub birthday: Option<String>,
}

/// A show as persisted and served by the read side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    pub id: u64,
    pub name: String,
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    /// `None` when the source had no birthday or one we could not parse.
    pub birthday: Option<NaiveDate>,
}

impl Show {
    /// Builds the persisted shape from a catalog entry and its fetched cast.
    /// Cast order is kept as the source returned it.
    pub fn from_catalog(show: &CatalogShow, cast: &[CastCredit]) -> Self {
        Show {
            id: show.id,
            name: show.name.clone(),
            cast: cast.iter().map(CastMember::from_credit).collect(),
        }
    }

    /// Returns the show with its cast in read order (see [`sort_cast`]).
    pub fn with_sorted_cast(mut self) -> Self {
        sort_cast(&mut self.cast);
        self
    }
}

impl CastMember {
    pub fn from_credit(credit: &CastCredit) -> Self {
        CastMember {
            id: credit.person.id,
            name: credit.person.name.clone(),
            birthday: credit.person.birthday.as_deref().and_then(parse_birthday),
        }
    }
}

/// Best-effort birthday parsing. TVmaze sends `YYYY-MM-DD`; full timestamps
/// are accepted and truncated to the date. Anything else is unknown.
pub fn parse_birthday(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|timestamp| timestamp.date())
        .ok()
}

/// Orders cast youngest first (descending birthday). Unknown birthdays count
/// as the earliest possible date and therefore sort last. The sort is stable,
/// so members with equal birthdays keep their stored order.
pub fn sort_cast(cast: &mut [CastMember]) {
    cast.sort_by(|a, b| compare_birthday_desc(a.birthday, b.birthday));
}

fn compare_birthday_desc(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
