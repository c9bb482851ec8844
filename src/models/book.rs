//! Book model and related types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

/// Book category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Category {
    Science,
    Technology,
    Engineering,
    Mathematics,
    Arts,
    Literature,
    History,
    Geography,
    Philosophy,
    Psychology,
    Sociology,
    Economics,
    Business,
    Law,
    Medicine,
    Health,
    Education,
    Politics,
    Religion,
    Environment,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Science => "Science",
            Category::Technology => "Technology",
            Category::Engineering => "Engineering",
            Category::Mathematics => "Mathematics",
            Category::Arts => "Arts",
            Category::Literature => "Literature",
            Category::History => "History",
            Category::Geography => "Geography",
            Category::Philosophy => "Philosophy",
            Category::Psychology => "Psychology",
            Category::Sociology => "Sociology",
            Category::Economics => "Economics",
            Category::Business => "Business",
            Category::Law => "Law",
            Category::Medicine => "Medicine",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Politics => "Politics",
            Category::Religion => "Religion",
            Category::Environment => "Environment",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Science" => Ok(Category::Science),
            "Technology" => Ok(Category::Technology),
            "Engineering" => Ok(Category::Engineering),
            "Mathematics" => Ok(Category::Mathematics),
            "Arts" => Ok(Category::Arts),
            "Literature" => Ok(Category::Literature),
            "History" => Ok(Category::History),
            "Geography" => Ok(Category::Geography),
            "Philosophy" => Ok(Category::Philosophy),
            "Psychology" => Ok(Category::Psychology),
            "Sociology" => Ok(Category::Sociology),
            "Economics" => Ok(Category::Economics),
            "Business" => Ok(Category::Business),
            "Law" => Ok(Category::Law),
            "Medicine" => Ok(Category::Medicine),
            "Health" => Ok(Category::Health),
            "Education" => Ok(Category::Education),
            "Politics" => Ok(Category::Politics),
            "Religion" => Ok(Category::Religion),
            "Environment" => Ok(Category::Environment),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

// SQLx conversion for Category (stored as its display string)
impl sqlx::Type<Postgres> for Category {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Category {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Category {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Shelf location in the physical library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ShelfLocation {
    #[serde(rename = "Shelf A1")]
    ShelfA1,
    #[serde(rename = "Shelf A2")]
    ShelfA2,
    #[serde(rename = "Shelf A3")]
    ShelfA3,
    #[serde(rename = "Shelf B1")]
    ShelfB1,
    #[serde(rename = "Shelf B2")]
    ShelfB2,
    #[serde(rename = "Shelf B3")]
    ShelfB3,
    #[serde(rename = "Shelf C1")]
    ShelfC1,
    #[serde(rename = "Shelf C2")]
    ShelfC2,
    #[serde(rename = "Shelf C3")]
    ShelfC3,
}

impl ShelfLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShelfLocation::ShelfA1 => "Shelf A1",
            ShelfLocation::ShelfA2 => "Shelf A2",
            ShelfLocation::ShelfA3 => "Shelf A3",
            ShelfLocation::ShelfB1 => "Shelf B1",
            ShelfLocation::ShelfB2 => "Shelf B2",
            ShelfLocation::ShelfB3 => "Shelf B3",
            ShelfLocation::ShelfC1 => "Shelf C1",
            ShelfLocation::ShelfC2 => "Shelf C2",
            ShelfLocation::ShelfC3 => "Shelf C3",
        }
    }
}

impl std::fmt::Display for ShelfLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ShelfLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Shelf A1" => Ok(ShelfLocation::ShelfA1),
            "Shelf A2" => Ok(ShelfLocation::ShelfA2),
            "Shelf A3" => Ok(ShelfLocation::ShelfA3),
            "Shelf B1" => Ok(ShelfLocation::ShelfB1),
            "Shelf B2" => Ok(ShelfLocation::ShelfB2),
            "Shelf B3" => Ok(ShelfLocation::ShelfB3),
            "Shelf C1" => Ok(ShelfLocation::ShelfC1),
            "Shelf C2" => Ok(ShelfLocation::ShelfC2),
            "Shelf C3" => Ok(ShelfLocation::ShelfC3),
            _ => Err(format!("Invalid shelf location: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for ShelfLocation {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for ShelfLocation {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for ShelfLocation {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Full book model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub cover_image: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub year: i32,
    pub category: Category,
    pub location: ShelfLocation,
    pub is_highlighted: bool,
    pub view_count: i64,
    pub borrow_count: i64,
    pub last_borrowed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated book fields ready for insertion
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub description: String,
    pub cover_image: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub year: i32,
    pub category: Category,
    pub location: ShelfLocation,
    pub is_highlighted: bool,
}

/// Create book request. Every field is optional at the wire level so that
/// missing ones can be reported individually.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub is_highlighted: Option<bool>,
}

/// Validated partial update, with enums parsed
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub category: Option<Category>,
    pub location: Option<ShelfLocation>,
    pub is_highlighted: Option<bool>,
}

/// Update book request: omitted fields are left untouched, present fields
/// must not be empty.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub is_highlighted: Option<bool>,
}

/// Book search query parameters.
///
/// All fields arrive as strings: the catch-all `filters` map collects
/// bracket-suffixed comparisons (e.g. `viewCount[gt]=10`), and mixing typed
/// fields with a flattened map is unreliable in urlencoded form anyway.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookQuery {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub is_highlighted: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(flatten)]
    pub filters: HashMap<String, String>,
}
