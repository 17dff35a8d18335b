//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, UserID, endpoints};

/// The most characters a category name may have.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// A validated, non-empty category name of at most [MAX_CATEGORY_NAME_LENGTH] characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return:
    /// - [Error::EmptyCategoryName] if `name` is empty or only whitespace,
    /// - [Error::CategoryNameTooLong] if `name` is longer than [MAX_CATEGORY_NAME_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else if name.graphemes(true).count() > MAX_CATEGORY_NAME_LENGTH {
            Err(Error::CategoryNameTooLong)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty and not too long.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The address of a category's thumbnail image.
///
/// Either an absolute http(s) URL or the path of a file uploaded to [endpoints::UPLOADS].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ThumbnailUrl(String);

impl ThumbnailUrl {
    /// Parse an optional thumbnail URL from a form field.
    ///
    /// An empty string means no thumbnail.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidThumbnailUrl] if `url` is neither an http(s) URL nor an upload path.
    pub fn parse_optional(url: &str) -> Result<Option<Self>, Error> {
        let url = url.trim();

        if url.is_empty() {
            return Ok(None);
        }

        let is_web_url = ["https://", "http://"].iter().any(|scheme| {
            url.strip_prefix(scheme)
                .and_then(|rest| rest.split(['/', '?', '#']).next())
                .is_some_and(|host| !host.is_empty())
        });
        let is_upload = url
            .strip_prefix(endpoints::UPLOADS)
            .is_some_and(|rest| rest.len() > 1 && rest.starts_with('/') && !rest.contains(".."));

        if (is_web_url || is_upload) && !url.contains(char::is_whitespace) {
            Ok(Some(Self(url.to_string())))
        } else {
            Err(Error::InvalidThumbnailUrl)
        }
    }

    pub fn new_unchecked(url: &str) -> Self {
        Self(url.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ThumbnailUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ThumbnailUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a category.
pub type CategoryId = i64;

/// A group of expenses (e.g., 'Groceries', 'Rent') owned by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserID,
    pub name: CategoryName,
    pub thumbnail_url: Option<ThumbnailUrl>,
    pub created_at: OffsetDateTime,
}

/// A category with the number of expenses in it, for the categories page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryWithExpenseCount {
    pub category: Category,
    pub expense_count: i64,
}

/// Form data for category creation and editing.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CategoryFormData {
    pub name: String,
    #[serde(default)]
    pub thumbnail_url: String,
}
