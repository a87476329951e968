//! Task filtering
//!
//! A [`FilterSpec`] is the conjunction of four independent criteria. Each
//! criterion has a "match everything" value (`all` or an empty query) so the
//! default spec selects every task.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::form::{FormErrors, FormField};
use crate::store::{normalize_id, RecordId};
use crate::task::{Priority, Task};

const ALL: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::Completed => "completed",
        }
    }

    fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            other => Err(Error::Validation(FormErrors::single(
                FormField::Status,
                format!("unknown status '{other}' (expected all, active or completed)"),
            ))),
        }
    }
}

/// Narrowing criterion names, for the "filters active" indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Criterion {
    Status,
    Priority,
    Category,
    Search,
}

impl Criterion {
    pub fn label(self) -> &'static str {
        match self {
            Criterion::Status => "Status",
            Criterion::Priority => "Priority",
            Criterion::Category => "Category",
            Criterion::Search => "Search",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub status: StatusFilter,
    /// `None` means all priorities
    pub priority: Option<Priority>,
    /// `None` means all categories
    pub category_id: Option<RecordId>,
    pub search_query: String,
}

impl FilterSpec {
    /// Build a spec from the user-facing tokens.
    ///
    /// `None` and `"all"` select everything for that criterion. Unknown
    /// tokens are rejected.
    pub fn from_tokens(
        status: Option<&str>,
        priority: Option<&str>,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<Self> {
        let status = match status {
            Some(token) => token.parse()?,
            None => StatusFilter::All,
        };
        let priority = match priority.map(str::trim) {
            None => None,
            Some(token) if token.eq_ignore_ascii_case(ALL) => None,
            Some(token) => Some(token.parse::<Priority>()?),
        };
        let category_id = match category.map(str::trim) {
            None => None,
            Some(token) if token.eq_ignore_ascii_case(ALL) => None,
            Some(token) => Some(normalize_id(token).map_err(|_| {
                Error::Validation(FormErrors::single(
                    FormField::CategoryId,
                    format!("'{token}' is not a category id or 'all'"),
                ))
            })?),
        };

        Ok(Self {
            status,
            priority,
            category_id,
            search_query: search.unwrap_or_default().to_string(),
        })
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_category(mut self, category_id: RecordId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    /// True when at least one criterion narrows the result.
    pub fn is_filtered(&self) -> bool {
        !self.active_criteria().is_empty()
    }

    pub fn active_criteria(&self) -> Vec<Criterion> {
        let mut active = Vec::new();
        if self.status != StatusFilter::All {
            active.push(Criterion::Status);
        }
        if self.priority.is_some() {
            active.push(Criterion::Priority);
        }
        if self.category_id.is_some() {
            active.push(Criterion::Category);
        }
        if !self.search_query.is_empty() {
            active.push(Criterion::Search);
        }
        active
    }

    /// Reset every criterion
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(task)
            && self.priority.map_or(true, |priority| task.priority == priority)
            && self.category_id.map_or(true, |id| task.category_id == id)
            && matches_search(task, &self.search_query)
    }
}

fn matches_search(task: &Task, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(&needle))
}

/// Visible subset of `tasks`, in input order.
pub fn filter_tasks<'a>(tasks: &'a [Task], spec: &FilterSpec) -> Vec<&'a Task> {
    tasks.iter().filter(|task| spec.matches(task)).collect()
}
