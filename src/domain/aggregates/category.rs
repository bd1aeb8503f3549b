//! Category Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::Slug;
use crate::StorefrontError;

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub slug: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl NewCategory {
    /// Builds the category, deriving the slug from the name when none is given.
    pub fn into_category(self) -> Result<Category, StorefrontError> {
        let source = self.slug.as_deref().unwrap_or(&self.name);
        let slug = Slug::new(source).map_err(|e| StorefrontError::Validation(e.to_string()))?;
        Ok(Category {
            id: Uuid::now_v7(), name: self.name.trim().to_string(), slug: slug.into_inner(),
            image: self.image, description: self.description, created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_slug_derived_from_name() {
        let c = NewCategory { name: "Kids Shoes".into(), slug: None, image: None, description: None }.into_category().unwrap();
        assert_eq!(c.slug, "kids-shoes");
        let c = NewCategory { name: "Kids".into(), slug: Some("Little Ones".into()), image: None, description: None }.into_category().unwrap();
        assert_eq!(c.slug, "little-ones");
    }
}
