//! Categories and the category repository.
//!
//! Categories are owned independently of tasks: deleting one never touches
//! the tasks that reference it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::form::{FormErrors, FormField};
use crate::store::{IntoRecordId, Record, RecordId, RecordStore};

pub const DEFAULT_COLOR: &str = "#6366F1";
pub const DEFAULT_ICON: &str = "Folder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl CategoryInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: DEFAULT_COLOR.to_string(),
            icon: DEFAULT_ICON.to_string(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none() && self.icon.is_none()
    }
}

impl Record for Category {
    type Draft = CategoryInput;
    type Patch = CategoryPatch;
    const KIND: &'static str = "Category";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: CategoryInput) -> Self {
        Category {
            id,
            name: draft.name,
            color: draft.color,
            icon: draft.icon,
        }
    }

    fn apply_patch(&mut self, patch: CategoryPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(icon) = patch.icon {
            self.icon = icon;
        }
    }
}

/// Categories written by `taskboard init` into an empty store
pub fn default_categories() -> Vec<CategoryInput> {
    vec![
        CategoryInput::new("Work").with_color("#6366F1").with_icon("Briefcase"),
        CategoryInput::new("Personal").with_color("#EC4899").with_icon("User"),
        CategoryInput::new("Shopping").with_color("#F59E0B").with_icon("ShoppingCart"),
        CategoryInput::new("Health").with_color("#10B981").with_icon("Heart"),
    ]
}

fn not_found(id: RecordId) -> Error {
    Error::NotFound {
        kind: Category::KIND,
        id,
    }
}

fn check_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(FormErrors::single(
            FormField::Name,
            "Name is required",
        )));
    }
    Ok(trimmed.to_string())
}

/// Typed category access over a record store
#[derive(Clone)]
pub struct CategoryRepository {
    store: Arc<dyn RecordStore<Category>>,
}

impl fmt::Debug for CategoryRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryRepository").finish_non_exhaustive()
    }
}

impl CategoryRepository {
    pub fn new(store: Arc<dyn RecordStore<Category>>) -> Self {
        Self { store }
    }

    /// All categories in store order.
    pub async fn get_all(&self) -> Result<Vec<Category>> {
        self.store.get_all().await
    }

    pub async fn get_by_id(&self, id: impl IntoRecordId) -> Result<Option<Category>> {
        let id = id.into_record_id()?;
        self.store.get_by_id(id).await
    }

    pub async fn create(&self, mut input: CategoryInput) -> Result<Category> {
        input.name = check_name(&input.name)?;
        let category = self.store.create(input).await?;
        tracing::info!(id = category.id, name = %category.name, "category created");
        Ok(category)
    }

    pub async fn update(&self, id: impl IntoRecordId, mut patch: CategoryPatch) -> Result<Category> {
        let id = id.into_record_id()?;
        if let Some(name) = patch.name.as_deref() {
            patch.name = Some(check_name(name)?);
        }
        let category = self.store.update(id, patch).await?.ok_or_else(|| not_found(id))?;
        tracing::info!(id, "category updated");
        Ok(category)
    }

    /// Remove a category and return it. Referencing tasks are left as they are.
    pub async fn delete(&self, id: impl IntoRecordId) -> Result<Category> {
        let id = id.into_record_id()?;
        let category = self.store.get_by_id(id).await?.ok_or_else(|| not_found(id))?;
        if !self.store.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(id, "category deleted");
        Ok(category)
    }
}
