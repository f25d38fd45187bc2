//! # Core Domain Entities
//!
//! Identifiers and value types that cross crate boundaries.
//!
//! ## Clusters
//!
//! - **Identity**: `CourseId`, `UserId`, `Role`, `Caller`
//! - **Location**: `GeoPoint`
//! - **Courses**: `CourseRecord`
//! - **Calendar**: `SessionDate`

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Opaque course identifier, assigned by the course store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub String);

impl CourseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque user identifier. Students and faculty share one id space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role carried by an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Faculty,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Faculty => "faculty",
            Role::Student => "student",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "faculty" => Ok(Role::Faculty),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// An authenticated caller.
///
/// Authentication happens upstream; by the time a `Caller` exists its
/// identity and role are trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
    /// Display name shown on the live dashboard.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl Caller {
    pub fn faculty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            role: Role::Faculty,
            name: String::new(),
            email: String::new(),
        }
    }

    pub fn student(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            role: Role::Student,
            name: String::new(),
            email: String::new(),
        }
    }

    pub fn with_display(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.name = name.into();
        self.email = email.into();
        self
    }

    pub fn is_faculty(&self) -> bool {
        self.role == Role::Faculty
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}

// =============================================================================
// CLUSTER B: LOCATION
// =============================================================================

/// A WGS-84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both components are finite and inside their degree ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

// =============================================================================
// CLUSTER C: COURSES
// =============================================================================

/// The slice of a course document the attendance core reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: CourseId,
    pub name: String,
    /// Owning faculty member.
    pub faculty: UserId,
    #[serde(default)]
    pub students: HashSet<UserId>,
    pub classroom: GeoPoint,
}

impl CourseRecord {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.faculty == user
    }

    pub fn is_enrolled(&self, student: &UserId) -> bool {
        self.students.contains(student)
    }
}

// =============================================================================
// CLUSTER D: CALENDAR
// =============================================================================

/// Calendar-day key (UTC) correlating a session with its ledger records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionDate(pub NaiveDate);

impl SessionDate {
    pub fn from_utc(at: DateTime<Utc>) -> Self {
        Self(at.date_naive())
    }
}

impl fmt::Display for SessionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl std::str::FromStr for SessionDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(SessionDate)
    }
}
