//! Task form state and validation.
//!
//! The form holds raw text exactly as the user typed it. `validate` is pure
//! and checks the whole form; `set_field` implements the live-clear contract
//! (editing a field drops that field's error) without re-validating, so a
//! submission always goes through `to_input`, which validates again.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::normalize_id;
use crate::task::{Priority, Task, TaskInput};

pub const TITLE_REQUIRED: &str = "Title is required";
pub const CATEGORY_REQUIRED: &str = "Category is required";
pub const CATEGORY_INVALID: &str = "Category is invalid";
pub const PRIORITY_INVALID: &str = "Priority is invalid";
pub const DUE_DATE_INVALID: &str = "Due date is invalid";

/// Format used to prefill the due date of an edit form
pub const DUE_DATE_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

const DUE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Id,
    Title,
    Description,
    CategoryId,
    Priority,
    DueDate,
    Name,
    Status,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            FormField::Id => "id",
            FormField::Title => "title",
            FormField::Description => "description",
            FormField::CategoryId => "categoryId",
            FormField::Priority => "priority",
            FormField::DueDate => "dueDate",
            FormField::Name => "name",
            FormField::Status => "status",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level error messages. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<FormField, String>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: FormField, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    pub fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn clear(&mut self, field: FormField) -> Option<String> {
        self.0.remove(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// `Ok(())` when empty, otherwise a validation error carrying the messages.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }

    pub fn summary(&self) -> String {
        self.iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Raw create/edit form input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub priority: String,
    pub due_date: String,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category_id: String::new(),
            priority: Priority::default().as_str().to_string(),
            due_date: String::new(),
        }
    }
}

impl TaskForm {
    /// Blank form for a new task
    pub fn new() -> Self {
        Self::default()
    }

    /// Form prefilled from an existing task
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            category_id: task.category_id.to_string(),
            priority: task.priority.as_str().to_string(),
            due_date: task
                .due_date
                .map(|due| due.format(DUE_DATE_INPUT_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }

    /// Change one field and drop any error previously reported for it.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>, errors: &mut FormErrors) {
        let value = value.into();
        match field {
            FormField::Title => self.title = value,
            FormField::Description => self.description = value,
            FormField::CategoryId => self.category_id = value,
            FormField::Priority => self.priority = value,
            FormField::DueDate => self.due_date = value,
            FormField::Id | FormField::Name | FormField::Status => return,
        }
        errors.clear(field);
    }

    pub fn validate(&self) -> FormErrors {
        validate(self)
    }

    /// Validate the full form and convert it into repository input.
    pub fn to_input(&self) -> Result<TaskInput> {
        validate(self).into_result()?;

        let category_id = normalize_id(&self.category_id)?;
        let priority = self.priority.parse::<Priority>()?;
        let due_date = match self.due_date.trim() {
            "" => None,
            raw => Some(parse_due_date(raw).ok_or_else(|| {
                Error::Validation(FormErrors::single(FormField::DueDate, DUE_DATE_INVALID))
            })?),
        };

        Ok(TaskInput {
            title: self.title.trim().to_string(),
            description: Some(self.description.clone()),
            category_id,
            priority,
            due_date,
        })
    }
}

/// Check a task form, returning one message per failing field.
pub fn validate(form: &TaskForm) -> FormErrors {
    let mut errors = FormErrors::new();

    if form.title.trim().is_empty() {
        errors.insert(FormField::Title, TITLE_REQUIRED);
    }

    if form.category_id.trim().is_empty() {
        errors.insert(FormField::CategoryId, CATEGORY_REQUIRED);
    } else if normalize_id(&form.category_id).is_err() {
        errors.insert(FormField::CategoryId, CATEGORY_INVALID);
    }

    if form.priority.parse::<Priority>().is_err() {
        errors.insert(FormField::Priority, PRIORITY_INVALID);
    }

    let due = form.due_date.trim();
    if !due.is_empty() && parse_due_date(due).is_none() {
        errors.insert(FormField::DueDate, DUE_DATE_INVALID);
    }

    errors
}

/// Parse a due date as RFC 3339, a `datetime-local` value, or a plain date.
///
/// Values without an offset are taken as UTC; plain dates mean midnight.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in DUE_DATE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|parsed| parsed.and_utc())
}
