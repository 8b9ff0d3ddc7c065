//! Roster service coordinating validation, normalization, and CouchDB writes.

use crate::{
    config::get_config,
    couch::CouchStore,
    metrics::{MetricsSnapshot, RosterMetrics},
    roster::{
        classes::{canonicalize, dedupe},
        types::{ListOptions, NewStudent, RosterError, Student, StudentPatch},
        validate,
    },
};
use async_trait::async_trait;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// Coordinates student CRUD and class-list maintenance on top of CouchDB.
///
/// The service owns the long-lived CouchDB transport and the metrics
/// registry so the whole HTTP surface shares the same components. Construct
/// it once near process start and share it through an `Arc`.
pub struct RosterService {
    pub(crate) couch: CouchStore,
    pub(crate) metrics: Arc<RosterMetrics>,
}

/// Abstraction over roster operations consumed by the HTTP surface.
#[async_trait]
pub trait RosterApi: Send + Sync {
    /// List students, optionally sorted by last name and truncated.
    async fn list_students(&self, options: ListOptions) -> Result<Vec<Student>, RosterError>;

    /// Fetch a single student by id.
    async fn fetch_student(&self, id: &str) -> Result<Student, RosterError>;

    /// Validate and insert a new student document.
    async fn create_student(&self, draft: NewStudent) -> Result<Student, RosterError>;

    /// Merge provided fields into an existing student, validating each one.
    async fn update_student(&self, id: &str, patch: StudentPatch) -> Result<Student, RosterError>;

    /// Hard-delete a student, returning its last stored state.
    async fn remove_student(&self, id: &str) -> Result<Student, RosterError>;

    /// Return a student's class list verbatim.
    async fn list_classes(&self, id: &str) -> Result<Vec<String>, RosterError>;

    /// Look up a single class by canonical name, `None` when not enrolled.
    async fn find_class(&self, id: &str, name: &str) -> Result<Option<String>, RosterError>;

    /// Canonicalize and append classes, then dedupe and persist.
    async fn add_classes(
        &self,
        id: &str,
        additions: Option<Vec<String>>,
    ) -> Result<Vec<String>, RosterError>;

    /// Apply `remove` (raw comparison) then `replace` (canonicalized append)
    /// to the class list and persist.
    async fn revise_classes(
        &self,
        id: &str,
        remove: Option<Vec<String>>,
        replace: Option<Vec<String>>,
    ) -> Result<Vec<String>, RosterError>;

    /// Replace the whole class list, emptying it when no list is given.
    async fn replace_classes(
        &self,
        id: &str,
        classes: Option<Vec<String>>,
    ) -> Result<Vec<String>, RosterError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl RosterService {
    /// Build a new roster service, ensuring the backing database is ready.
    pub async fn new() -> Self {
        let config = get_config();
        let couch = CouchStore::new().expect("Failed to connect to CouchDB");
        tracing::debug!(database = %config.couchdb_database, "Ensuring student database");
        couch
            .ensure_database()
            .await
            .expect("Failed to ensure CouchDB database exists");
        couch
            .ensure_sort_index()
            .await
            .expect("Failed to ensure CouchDB sort index");
        tracing::debug!(database = %config.couchdb_database, "Student database ready");

        Self {
            couch,
            metrics: Arc::new(RosterMetrics::new()),
        }
    }

    async fn load_student(&self, id: &str) -> Result<Student, RosterError> {
        self.couch
            .get_student(id)
            .await?
            .ok_or_else(|| RosterError::NotFound(id.to_string()))
    }

    /// Persist a mutated document and record the write.
    async fn store_update(&self, student: &mut Student) -> Result<(), RosterError> {
        let rev = self.couch.put_student(student).await?;
        student.rev = Some(rev);
        self.metrics.record_updated();
        Ok(())
    }
}

fn current_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn canonical_class_list(names: Vec<String>) -> Vec<String> {
    dedupe(names.iter().map(|name| canonicalize(name)).collect())
}

#[async_trait]
impl RosterApi for RosterService {
    async fn list_students(&self, options: ListOptions) -> Result<Vec<Student>, RosterError> {
        Ok(self
            .couch
            .find_students(options.sort, options.limit)
            .await?)
    }

    async fn fetch_student(&self, id: &str) -> Result<Student, RosterError> {
        self.load_student(id).await
    }

    async fn create_student(&self, draft: NewStudent) -> Result<Student, RosterError> {
        let first_name =
            validate::required_name(draft.first_name.as_deref(), validate::NameField::First)?;
        let last_name =
            validate::required_name(draft.last_name.as_deref(), validate::NameField::Last)?;
        let grade = validate::required_grade(draft.grade)?;
        let classes = canonical_class_list(draft.classes.unwrap_or_default());

        let now = current_timestamp();
        let mut student = Student {
            id: Uuid::new_v4().to_string(),
            rev: None,
            first_name,
            last_name,
            grade,
            classes,
            created_on: now.clone(),
            updated_on: now,
        };

        let rev = self.couch.put_student(&student).await?;
        student.rev = Some(rev);
        self.metrics.record_created();
        tracing::info!(id = %student.id, "Student created");
        Ok(student)
    }

    async fn update_student(&self, id: &str, patch: StudentPatch) -> Result<Student, RosterError> {
        let mut student = self.load_student(id).await?;

        if let Some(first_name) = patch.first_name.as_deref() {
            student.first_name = validate::name(first_name, validate::NameField::First)?;
        }
        if let Some(last_name) = patch.last_name.as_deref() {
            student.last_name = validate::name(last_name, validate::NameField::Last)?;
        }
        if let Some(grade) = patch.grade {
            student.grade = validate::grade(grade)?;
        }
        if let Some(classes) = patch.classes {
            student.classes = canonical_class_list(classes);
        }
        // updatedOn is left alone here; only class-list writes refresh it.

        self.store_update(&mut student).await?;
        tracing::info!(id = %student.id, "Student updated");
        Ok(student)
    }

    async fn remove_student(&self, id: &str) -> Result<Student, RosterError> {
        let student = self.load_student(id).await?;
        let rev = student.rev.as_deref().unwrap_or_default();
        self.couch.delete_student(&student.id, rev).await?;
        self.metrics.record_deleted();
        tracing::info!(id = %student.id, "Student deleted");
        Ok(student)
    }

    async fn list_classes(&self, id: &str) -> Result<Vec<String>, RosterError> {
        Ok(self.load_student(id).await?.classes)
    }

    async fn find_class(&self, id: &str, name: &str) -> Result<Option<String>, RosterError> {
        let student = self.load_student(id).await?;
        let canonical = canonicalize(name);
        Ok(student
            .classes
            .into_iter()
            .find(|class| *class == canonical))
    }

    async fn add_classes(
        &self,
        id: &str,
        additions: Option<Vec<String>>,
    ) -> Result<Vec<String>, RosterError> {
        let mut student = self.load_student(id).await?;
        let Some(additions) = additions else {
            return Ok(student.classes);
        };

        student
            .classes
            .extend(additions.iter().map(|name| canonicalize(name)));
        student.classes = dedupe(student.classes);
        student.updated_on = current_timestamp();
        self.store_update(&mut student).await?;
        Ok(student.classes)
    }

    async fn revise_classes(
        &self,
        id: &str,
        remove: Option<Vec<String>>,
        replace: Option<Vec<String>>,
    ) -> Result<Vec<String>, RosterError> {
        let mut student = self.load_student(id).await?;

        // Removal matches the raw request strings against the stored
        // canonical names; "math" does not remove "Math".
        if let Some(remove) = &remove {
            student.classes.retain(|class| !remove.contains(class));
        }
        if let Some(replace) = &replace {
            student
                .classes
                .extend(replace.iter().map(|name| canonicalize(name)));
        }

        student.classes = dedupe(student.classes);
        student.updated_on = current_timestamp();
        self.store_update(&mut student).await?;
        Ok(student.classes)
    }

    async fn replace_classes(
        &self,
        id: &str,
        classes: Option<Vec<String>>,
    ) -> Result<Vec<String>, RosterError> {
        let mut student = self.load_student(id).await?;
        student.classes = classes.map(canonical_class_list).unwrap_or_default();
        student.updated_on = current_timestamp();
        self.store_update(&mut student).await?;
        Ok(student.classes)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
