//! Catalog service: book CRUD and search

use crate::{
    error::{AppError, AppResult, FieldError},
    models::book::{Book, BookChanges, BookQuery, Category, CreateBook, NewBook, ShelfLocation, UpdateBook},
    repository::Repository,
};

/// Check the create payload field by field so every problem is reported in
/// one response
fn validate_create(request: &CreateBook) -> Result<NewBook, Vec<FieldError>> {
    let mut errors = Vec::new();

    let required = |value: &Option<String>, field: &str, label: &str, errors: &mut Vec<FieldError>| {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                errors.push(FieldError::new(field, &format!("{} is required.", label)));
                None
            }
        }
    };

    let title = required(&request.title, "title", "Title", &mut errors);
    let description = required(&request.description, "description", "Description", &mut errors);
    let cover_image = required(&request.cover_image, "coverImage", "Cover image", &mut errors);
    let author = required(&request.author, "author", "Author", &mut errors);
    let isbn = required(&request.isbn, "isbn", "ISBN", &mut errors);
    let publisher = required(&request.publisher, "publisher", "Publisher", &mut errors);

    let year = match request.year {
        Some(y) if (0..=9999).contains(&y) => Some(y),
        Some(_) => {
            errors.push(FieldError::new("year", "Year must be a valid year."));
            None
        }
        None => {
            errors.push(FieldError::new("year", "Year is required."));
            None
        }
    };

    let category = match request.category.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match raw.parse::<Category>() {
            Ok(c) => Some(c),
            Err(_) => {
                errors.push(FieldError::new("category", "Category is invalid."));
                None
            }
        },
        _ => {
            errors.push(FieldError::new("category", "Category is required."));
            None
        }
    };

    let location = match request.location.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match raw.parse::<ShelfLocation>() {
            Ok(l) => Some(l),
            Err(_) => {
                errors.push(FieldError::new("location", "Location is invalid."));
                None
            }
        },
        _ => {
            errors.push(FieldError::new("location", "Location is required."));
            None
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    // All fields checked above; None is impossible past this point but the
    // error path keeps the signature honest.
    match (title, description, cover_image, author, isbn, publisher, year, category, location) {
        (
            Some(title),
            Some(description),
            Some(cover_image),
            Some(author),
            Some(isbn),
            Some(publisher),
            Some(year),
            Some(category),
            Some(location),
        ) => Ok(NewBook {
            title,
            description,
            cover_image,
            author,
            isbn,
            publisher,
            year,
            category,
            location,
            is_highlighted: request.is_highlighted.unwrap_or(false),
        }),
        _ => Err(vec![FieldError::new("body", "Invalid request body.")]),
    }
}

/// Check the update payload: omitted fields pass, present fields must be
/// non-empty and well-formed
fn validate_update(request: &UpdateBook) -> Result<BookChanges, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut changes = BookChanges::default();

    let present = |value: &Option<String>, field: &str, label: &str, errors: &mut Vec<FieldError>| {
        match value.as_deref().map(str::trim) {
            None => None,
            Some(v) if !v.is_empty() => Some(v.to_string()),
            Some(_) => {
                errors.push(FieldError::new(field, &format!("{} cannot be empty.", label)));
                None
            }
        }
    };

    changes.title = present(&request.title, "title", "Title", &mut errors);
    changes.description = present(&request.description, "description", "Description", &mut errors);
    changes.cover_image = present(&request.cover_image, "coverImage", "Cover image", &mut errors);
    changes.author = present(&request.author, "author", "Author", &mut errors);
    changes.isbn = present(&request.isbn, "isbn", "ISBN", &mut errors);
    changes.publisher = present(&request.publisher, "publisher", "Publisher", &mut errors);

    if let Some(y) = request.year {
        if (0..=9999).contains(&y) {
            changes.year = Some(y);
        } else {
            errors.push(FieldError::new("year", "Year must be a valid year."));
        }
    }

    if let Some(raw) = request.category.as_deref().map(str::trim) {
        match raw.parse::<Category>() {
            Ok(c) => changes.category = Some(c),
            Err(_) => errors.push(FieldError::new("category", "Category is invalid.")),
        }
    }

    if let Some(raw) = request.location.as_deref().map(str::trim) {
        match raw.parse::<ShelfLocation>() {
            Ok(l) => changes.location = Some(l),
            Err(_) => errors.push(FieldError::new("location", "Location is invalid.")),
        }
    }

    changes.is_highlighted = request.is_highlighted;

    if errors.is_empty() {
        Ok(changes)
    } else {
        Err(errors)
    }
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books. Returns (books, total, page, limit).
    pub async fn list(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64, i64, i64)> {
        self.repository.books.search(query).await
    }

    /// Fetch a single book, counting the view
    pub async fn get(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_and_count_view(id).await
    }

    pub async fn create(&self, request: &CreateBook) -> AppResult<Book> {
        let new_book = validate_create(request).map_err(AppError::Validation)?;

        if self.repository.books.isbn_exists(&new_book.isbn, None).await? {
            return Err(AppError::Validation(vec![FieldError::new(
                "isbn",
                "ISBN must be unique.",
            )]));
        }

        self.repository.books.create(&new_book).await
    }

    pub async fn update(&self, id: i32, request: &UpdateBook) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await?;

        let changes = validate_update(request).map_err(AppError::Validation)?;

        if let Some(ref isbn) = changes.isbn {
            if self.repository.books.isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Validation(vec![FieldError::new(
                    "isbn",
                    "ISBN must be unique.",
                )]));
            }
        }

        self.repository.books.update(id, &changes).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if !self.repository.books.delete(id).await? {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        Ok(())
    }
}
