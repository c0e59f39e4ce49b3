//! Product CRUD route handlers.
//!
//! Create and update accept multipart form data: text fields plus up to
//! five image files under the `images` key. Image files hit the blob store
//! before the record write, so every failure path here owes the
//! compensating deletions described on each handler.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use stockroom_core::{Error, ProductId};
use stockroom_db::models::{serialize_image_list, ProductRow};
use stockroom_db::queries::products;

use crate::context::AppContext;
use crate::error::AppError;

/// Product response with the stored image list parsed out.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    #[schema(value_type = i64)]
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
    pub images: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ProductResponse {
    fn from_row(row: &ProductRow) -> stockroom_core::Result<Self> {
        Ok(Self {
            id: row.id,
            name: row.name.clone(),
            description: row.description.clone(),
            price: row.price,
            quantity: row.quantity,
            images: row.image_paths()?,
            created_at: row.created_at.clone(),
            updated_at: row.updated_at.clone(),
        })
    }
}

/// Response body for a successful create.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CreateProductResponse {
    #[schema(value_type = i64)]
    pub id: ProductId,
}

/// Generic success message body.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Decoded multipart form: text fields plus stored image paths.
///
/// `images` holds public paths of files already written to the blob store
/// by the time the form is returned.
#[derive(Debug, Default)]
struct ProductForm {
    name: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    quantity: Option<i64>,
    images: Vec<String>,
}

/// What to do with a numeric text field that does not parse.
///
/// Create rejects it outright. Update merges over the current record,
/// where a blank or unreadable value is just another way of leaving the
/// field absent, so the prior value is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumericPolicy {
    Reject,
    TreatAsAbsent,
}

/// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "List all products", body = Vec<ProductResponse>)
    )
)]
pub async fn list_products(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let conn = stockroom_db::pool::get_conn(&ctx.db)?;
    let rows = products::list_products(&conn)?;
    let responses = rows
        .iter()
        .map(ProductResponse::from_row)
        .collect::<stockroom_core::Result<Vec<_>>>()?;
    Ok(Json(responses))
}

/// GET /api/products/:id
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product details", body = ProductResponse),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let id = parse_id(&id)?;

    let conn = stockroom_db::pool::get_conn(&ctx.db)?;
    let row = products::get_product(&conn, id)?
        .ok_or_else(|| Error::not_found("product", id))?;

    Ok(Json(ProductResponse::from_row(&row)?))
}

/// POST /api/products
///
/// Image files are persisted before the insert; if the insert (or any field
/// validation after intake) fails, the files written for this request are
/// deleted best-effort before the error is returned.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body(content_type = "multipart/form-data",
        description = "Fields name, description, price, quantity plus up to 5 files under 'images'"),
    responses(
        (status = 200, description = "Product created", body = CreateProductResponse),
        (status = 400, description = "Validation failure"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn create_product(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Json<CreateProductResponse>, AppError> {
    let form = collect_form(&ctx, &mut multipart, NumericPolicy::Reject).await?;

    match insert_from_form(&ctx, &form) {
        Ok(id) => Ok(Json(CreateProductResponse { id })),
        Err(e) => {
            ctx.uploads.remove_paths(&form.images);
            Err(e.into())
        }
    }
}

fn insert_from_form(ctx: &AppContext, form: &ProductForm) -> stockroom_core::Result<ProductId> {
    let name = form
        .name
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Validation("name is required".into()))?;
    let price = form
        .price
        .ok_or_else(|| Error::Validation("price is required".into()))?;
    let quantity = form
        .quantity
        .ok_or_else(|| Error::Validation("quantity is required".into()))?;
    let description = form.description.as_deref().unwrap_or("");

    let conn = stockroom_db::pool::get_conn(&ctx.db)?;
    products::insert_product(
        &conn,
        name,
        description,
        price,
        &serialize_image_list(&form.images),
        quantity,
    )
}

/// PATCH /api/products/:id
///
/// Field semantics are value-level "absent": an omitted, empty,
/// unparseable, or zero value retains the prior value. Newly uploaded images replace the old
/// list wholesale; the old files are deleted fire-and-forget only after the
/// record write succeeds, so a failed write never strands the record
/// pointing at deleted files.
#[utoipa::path(
    patch,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data",
        description = "Same shape as create; every field optional"),
    responses(
        (status = 200, description = "Product updated", body = MessageResponse),
        (status = 400, description = "Unknown product id or validation failure"),
        (status = 500, description = "Corrupt stored data or store failure")
    )
)]
pub async fn update_product(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id)?;
    let form = collect_form(&ctx, &mut multipart, NumericPolicy::TreatAsAbsent).await?;

    match apply_update(&ctx, id, &form) {
        Ok(old_images) => {
            if !form.images.is_empty() {
                // Replacement succeeded; the old files are unreferenced now.
                // Their removal must not delay the response.
                let uploads = ctx.uploads.clone();
                tokio::spawn(async move {
                    uploads.remove_paths(&old_images);
                });
            }
            Ok(Json(MessageResponse {
                message: "Product updated successfully".into(),
            }))
        }
        Err(e) => {
            ctx.uploads.remove_paths(&form.images);
            Err(missing_as_bad_request(e))
        }
    }
}

/// Fetch, merge, and rewrite the record. Returns the prior image list so the
/// caller can schedule its deletion when new images replaced it.
fn apply_update(
    ctx: &AppContext,
    id: ProductId,
    form: &ProductForm,
) -> stockroom_core::Result<Vec<String>> {
    let conn = stockroom_db::pool::get_conn(&ctx.db)?;
    let current = products::get_product(&conn, id)?
        .ok_or_else(|| Error::not_found("product", id))?;
    let old_images = current.image_paths()?;

    let images = if form.images.is_empty() {
        &old_images
    } else {
        &form.images
    };
    let name = form
        .name
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(&current.name);
    let description = form
        .description
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(&current.description);
    let price = form.price.filter(|p| *p != 0.0).unwrap_or(current.price);
    let quantity = form.quantity.filter(|q| *q != 0).unwrap_or(current.quantity);

    let updated = products::update_product(
        &conn,
        id,
        name,
        description,
        price,
        &serialize_image_list(images),
        quantity,
    )?;
    if !updated {
        // Row vanished between fetch and write.
        return Err(Error::not_found("product", id));
    }

    Ok(old_images)
}

/// DELETE /api/products/:id
///
/// Referenced files are removed best-effort first, the record last, so a
/// partial failure can orphan files but never leaves a record whose files
/// cannot be found. An unparsable stored image list blocks the record
/// deletion entirely.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product and images deleted", body = MessageResponse),
        (status = 400, description = "Unknown product id"),
        (status = 500, description = "Corrupt stored data or store failure")
    )
)]
pub async fn delete_product(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id)?;

    let result: stockroom_core::Result<()> = (|| {
        let conn = stockroom_db::pool::get_conn(&ctx.db)?;
        let current = products::get_product(&conn, id)?
            .ok_or_else(|| Error::not_found("product", id))?;
        let images = current.image_paths()?;

        ctx.uploads.remove_paths(&images);
        products::delete_product(&conn, id)?;
        Ok(())
    })();

    match result {
        Ok(()) => Ok(Json(MessageResponse {
            message: "Product and associated images deleted successfully".into(),
        })),
        Err(e) => Err(missing_as_bad_request(e)),
    }
}

/// Parse a path segment into a [`ProductId`].
fn parse_id(raw: &str) -> Result<ProductId, AppError> {
    raw.parse()
        .map_err(|_| AppError::new(Error::Validation("Invalid product id".into())))
}

/// Update and delete report a missing id as 400 rather than 404.
fn missing_as_bad_request(e: Error) -> AppError {
    if matches!(e, Error::NotFound { .. }) {
        AppError::new(e).with_status(StatusCode::BAD_REQUEST)
    } else {
        AppError::new(e)
    }
}

/// Drain a multipart request into a [`ProductForm`].
///
/// Image parts are validated and persisted as they stream in; if any later
/// part fails, files already stored for this request are removed before the
/// error propagates, so a rejected batch leaves nothing behind.
async fn collect_form(
    ctx: &AppContext,
    multipart: &mut Multipart,
    numbers: NumericPolicy,
) -> Result<ProductForm, AppError> {
    let mut form = ProductForm::default();
    if let Err(e) = fill_form(ctx, multipart, &mut form, numbers).await {
        ctx.uploads.remove_paths(&form.images);
        return Err(e.into());
    }
    Ok(form)
}

async fn fill_form(
    ctx: &AppContext,
    multipart: &mut Multipart,
    form: &mut ProductForm,
    numbers: NumericPolicy,
) -> stockroom_core::Result<()> {
    let max_files = ctx.config.storage.max_files_per_request;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("multipart error: {e}")))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => form.name = Some(text_field(field, "name").await?),
            Some("description") => {
                form.description = Some(text_field(field, "description").await?)
            }
            Some("price") => {
                let raw = text_field(field, "price").await?;
                form.price = parse_numeric(&raw, numbers, || {
                    Error::Validation(format!("price must be a number, got: {raw}"))
                })?;
            }
            Some("quantity") => {
                let raw = text_field(field, "quantity").await?;
                form.quantity = parse_numeric(&raw, numbers, || {
                    Error::Validation(format!("quantity must be an integer, got: {raw}"))
                })?;
            }
            Some("images") => {
                // Browsers send an empty part when no file was chosen.
                if field.file_name().map_or(true, str::is_empty) {
                    continue;
                }
                if form.images.len() >= max_files {
                    return Err(Error::Validation(format!(
                        "at most {max_files} images per request"
                    )));
                }
                form.images.push(ctx.uploads.store_field(field).await?);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    Ok(())
}

/// Parse a numeric form field.
///
/// A blank value is always absent. A non-blank value that fails to parse is
/// rejected or treated as absent per `policy`.
fn parse_numeric<T: std::str::FromStr>(
    raw: &str,
    policy: NumericPolicy,
    reject: impl FnOnce() -> Error,
) -> stockroom_core::Result<Option<T>> {
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse() {
        Ok(v) => Ok(Some(v)),
        Err(_) if policy == NumericPolicy::Reject => Err(reject()),
        Err(_) => Ok(None),
    }
}

async fn text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> stockroom_core::Result<String> {
    field
        .text()
        .await
        .map_err(|e| Error::Validation(format!("failed to read field '{name}': {e}")))
}
