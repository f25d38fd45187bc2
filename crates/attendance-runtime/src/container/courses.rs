//! Course directory seeding.

use super::config::ConfigError;
use shared_types::CourseRecord;
use std::path::Path;

/// Parse a JSON array of courses.
pub fn parse_courses(json: &str) -> Result<Vec<CourseRecord>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Read and parse the courses file at `path`.
pub fn load_courses(path: &Path) -> Result<Vec<CourseRecord>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::CoursesRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_courses(&raw).map_err(|source| ConfigError::CoursesParse {
        path: path.to_path_buf(),
        source,
    })
}
