//! REST API layer for the catalog using Axum
//!
//! - `POST /token` exchanges form credentials for a bearer token.
//! - `/products` CRUD over the Sled store; reading one product and deleting
//!   require a valid token.
//! - Swagger UI on `/docs`, generated from the handler annotations below.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{authenticate, IdentityProvider, TokenService};
use crate::error::{AppError, AppResult, AuthError};
use crate::extract::{ApiForm, ApiJson, ApiPath, ApiQuery};
use crate::logging::request_logging_middleware;
use crate::models::{AuthPayload, LoginForm, Pagination, Product, ProductCreate, ProductUpdate, TokenResponse};
use crate::storage::Storage;

/// Shared app state for REST handlers
#[derive(Clone)]
pub struct AppState {
    storage: Storage,
    tokens: TokenService,
    identities: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(storage: Storage, tokens: TokenService, identities: Arc<dyn IdentityProvider>) -> Self {
        Self {
            storage,
            tokens,
            identities,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "E-Commerce Application"),
    paths(
        login_handler,
        list_products_handler,
        get_product_handler,
        create_product_handler,
        update_product_handler,
        delete_product_handler,
        health_handler,
    ),
    components(schemas(Product, ProductCreate, ProductUpdate, LoginForm, TokenResponse)),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Access token issuance"),
        (name = "products", description = "Product catalog"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Verifies the bearer token and that its subject still exists, then stores
/// the claims as a request extension.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .ok_or(AuthError::MissingToken)?;

    let claims = state.tokens.verify(token)?;
    if state.identities.lookup(&claims.sub).await.is_none() {
        return Err(AuthError::InvalidToken(format!("unknown subject {}", claims.sub)).into());
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Create Axum router with the catalog endpoints
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);
    let require_auth = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    Router::new()
        .route("/", get(docs_redirect_handler))
        .route("/health", get(health_handler))
        .route("/token", post(login_handler))
        .route("/products", get(list_products_handler).post(create_product_handler))
        .route(
            "/products/:id",
            get(get_product_handler)
                .route_layer(require_auth())
                .put(update_product_handler),
        )
        .route("/product/:id", delete(delete_product_handler).route_layer(require_auth()))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(state)
}

async fn docs_redirect_handler() -> Redirect {
    Redirect::temporary("/docs")
}

#[utoipa::path(
    post,
    path = "/token",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 401, description = "Incorrect username or password"),
    )
)]
async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiForm(form): ApiForm<LoginForm>,
) -> AppResult<Json<TokenResponse>> {
    let credential = authenticate(state.identities.as_ref(), &form.username, &form.password).await?;
    let token = state.tokens.issue_default(&credential.username)?;
    tracing::info!(username = %credential.username, "login successful");
    Ok(Json(TokenResponse::bearer(token)))
}

#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    params(Pagination),
    responses((status = 200, description = "A page of products", body = [Product]))
)]
async fn list_products_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> AppResult<Json<Vec<Product>>> {
    tracing::info!(skip = page.skip, limit = page.limit, "fetching products");
    let session = state.storage.session();
    let products = session
        .list(page.skip, page.limit)
        .map_err(AppError::storage("list products"))?;
    tracing::info!(count = products.len(), "products retrieved");
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    params(("id" = u64, Path, description = "Product id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The product", body = Product),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Product not found"),
    )
)]
async fn get_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthPayload>,
    ApiPath(id): ApiPath<u64>,
) -> AppResult<Json<Product>> {
    tracing::debug!(id, user = %claims.sub, "fetching product");
    let session = state.storage.session();
    session
        .get(id)
        .map_err(AppError::storage(format!("get product {id}")))?
        .map(Json)
        .ok_or(AppError::ProductNotFound(id))
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    request_body = ProductCreate,
    responses((status = 201, description = "Product created", body = Product))
)]
async fn create_product_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(fields): ApiJson<ProductCreate>,
) -> AppResult<(StatusCode, Json<Product>)> {
    tracing::info!(title = %fields.title, "creating product");
    let session = state.storage.session();
    let product = session
        .create(fields)
        .map_err(AppError::storage("create product"))?;
    tracing::info!(id = product.id, title = %product.title, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "products",
    params(("id" = u64, Path, description = "Product id")),
    request_body = ProductUpdate,
    responses(
        (status = 200, description = "Product replaced", body = Product),
        (status = 404, description = "Product not found"),
    )
)]
async fn update_product_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u64>,
    ApiJson(fields): ApiJson<ProductUpdate>,
) -> AppResult<Json<Product>> {
    tracing::info!(id, "updating product");
    let session = state.storage.session();
    match session
        .update(id, &fields)
        .map_err(AppError::storage(format!("update product {id}")))?
    {
        Some(product) => {
            tracing::info!(id, "product updated");
            Ok(Json(product))
        }
        None => {
            tracing::warn!(id, "product not found");
            Err(AppError::ProductNotFound(id))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/product/{id}",
    tag = "products",
    params(("id" = u64, Path, description = "Product id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Product not found"),
    )
)]
async fn delete_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthPayload>,
    ApiPath(id): ApiPath<u64>,
) -> AppResult<StatusCode> {
    tracing::info!(id, user = %claims.sub, "deleting product");
    let session = state.storage.session();
    if session
        .delete(id)
        .map_err(AppError::storage(format!("delete product {id}")))?
    {
        tracing::info!(id, "product deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        tracing::warn!(id, "product not found");
        Err(AppError::ProductNotFound(id))
    }
}

/// Health check handler
#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
