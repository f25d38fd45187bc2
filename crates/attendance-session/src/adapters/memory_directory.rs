//! In-memory course directory.

use crate::error::DirectoryError;
use crate::ports::CourseDirectory;
use async_trait::async_trait;
use dashmap::DashMap;
use shared_types::{CourseId, CourseRecord};

/// Course store held in process memory, seeded at startup.
#[derive(Debug, Default)]
pub struct InMemoryCourseDirectory {
    courses: DashMap<CourseId, CourseRecord>,
}

impl InMemoryCourseDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a course.
    pub fn upsert(&self, course: CourseRecord) {
        self.courses.insert(course.id.clone(), course);
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl FromIterator<CourseRecord> for InMemoryCourseDirectory {
    fn from_iter<I: IntoIterator<Item = CourseRecord>>(iter: I) -> Self {
        let directory = Self::new();
        for course in iter {
            directory.upsert(course);
        }
        directory
    }
}

#[async_trait]
impl CourseDirectory for InMemoryCourseDirectory {
    async fn find_course(&self, course_id: &CourseId) -> Result<Option<CourseRecord>, DirectoryError> {
        Ok(self.courses.get(course_id).map(|c| c.value().clone()))
    }
}
