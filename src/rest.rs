//! REST API layer using Axum.
//!
//! Wires the middleware chain (bearer-token verification, role
//! authorization) in front of the resource handlers:
//! - Open: token issuance, registration, reference reads, liveness.
//! - Protected: pet/adoption/campaign CRUD and the owner-scoped listings.
//! - Admin: user listing and role elevation.
//!
//! Handlers are thin; each performs one store operation and returns the
//! store's result structure verbatim.

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::auth;
use crate::models::{Adoption, Campaign, Claims, Pet, Role, User};
use crate::query;
use crate::storage::{
    collections, DeleteResult, Filter, FindOptions, InsertOneResult, SortOrder, Storage,
    StorageError, UpdateResult,
};

/// Shared app state, constructed once at startup and injected into every
/// handler and middleware stage.
pub struct AppState {
    pub storage: Storage,
    pub token_secret: String,
}

/// Terse JSON error envelope; the only failure shape clients ever see.
struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "unauthorized access",
        }
    }

    fn forbidden() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: "forbidden access",
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "store operation failed");
        Self::internal()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!(error = %err, "document serialization failed");
        Self::internal()
    }
}

// --- Middleware ---

/// Reject requests without a valid bearer token; on success the decoded
/// claims are attached to the request for downstream stages. No store I/O
/// happens here.
async fn verify_bearer(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    else {
        return ApiError::unauthorized().into_response();
    };

    match auth::verify_token(token, &state.token_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "token verification failed");
            ApiError::unauthorized().into_response()
        }
    }
}

/// Gate admin routes on the stored role of the verified identity. The role
/// is re-read on every request, so revocation applies immediately.
async fn require_admin(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let email = req
        .extensions()
        .get::<Claims>()
        .and_then(|claims| claims.email.clone());
    let Some(email) = email else {
        return ApiError::forbidden().into_response();
    };

    let filter = Filter::all().eq("email", Value::from(email));
    match state.storage.find_one(collections::USERS, &filter).await {
        Ok(Some(doc)) => {
            let is_admin = serde_json::from_value::<User>(doc)
                .map(|user| user.role == Role::Admin)
                .unwrap_or(false);
            if is_admin {
                next.run(req).await
            } else {
                ApiError::forbidden().into_response()
            }
        }
        Ok(None) => ApiError::forbidden().into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

// --- Router ---

pub fn create_router(storage: Storage, token_secret: String) -> Router {
    let state = Arc::new(AppState {
        storage,
        token_secret,
    });

    let admin_routes = Router::new()
        .route("/users", get(list_users))
        .route("/users/admin/:id", patch(elevate_to_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let protected_routes = Router::new()
        .route("/user/admin/:email", get(admin_status))
        .route("/pets", get(list_pets).post(create_pet))
        .route("/pets/mine", get(my_pets))
        .route("/pets/mine/count", get(my_pets_count))
        .route(
            "/pet/:id",
            get(get_pet).patch(update_pet).delete(delete_pet),
        )
        .route("/pets/adoptions/mine", get(my_adoptions))
        .route("/pets/adoptions", post(create_adoption))
        .route("/pets/adoption/:id", patch(update_adoption))
        .route("/campaigns/mine", get(my_campaigns))
        .route("/campaigns", get(list_campaigns).post(create_campaign))
        .route(
            "/campaign/:id",
            get(get_campaign).patch(update_campaign).delete(delete_campaign),
        )
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), verify_bearer));

    Router::new()
        .route("/", get(liveness))
        .route("/jwt", post(issue_token))
        .route("/users", post(register))
        .route("/categories", get(list_categories))
        .route("/encourages", get(list_encourages))
        .merge(protected_routes)
        .with_state(state)
}

async fn liveness() -> &'static str {
    "Pet Haven API is up"
}

// --- Token issuance ---

/// Sign the submitted identity claim into a 2-hour bearer token.
async fn issue_token(
    State(state): State<Arc<AppState>>,
    Json(claim): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let token = auth::issue_token(&claim, &state.token_secret).map_err(|err| {
        tracing::error!(error = %err, "token signing failed");
        ApiError::internal()
    })?;
    Ok(Json(json!({ "token": token })))
}

// --- Users ---

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>, ApiError> {
    let users = state
        .storage
        .find(collections::USERS, &Filter::all(), &FindOptions::default())
        .await?;
    Ok(Json(users))
}

/// Self-only admin check: the path email must match the verified identity.
async fn admin_status(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(email): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if claims.email.as_deref() != Some(email.as_str()) {
        return Err(ApiError::forbidden());
    }

    let filter = Filter::all().eq("email", Value::from(email));
    let user = state.storage.find_one(collections::USERS, &filter).await?;
    let admin = user
        .and_then(|doc| serde_json::from_value::<User>(doc).ok())
        .map(|user| user.role == Role::Admin)
        .unwrap_or(false);
    Ok(Json(json!({ "admin": admin })))
}

/// Register the user unless the email is already present. The existence
/// check and the insert are separate store operations; concurrent
/// registration of the same new email can slip through.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(user): Json<User>,
) -> Result<Json<Value>, ApiError> {
    let filter = Filter::all().eq("email", Value::from(user.email.clone()));
    if state
        .storage
        .find_one(collections::USERS, &filter)
        .await?
        .is_some()
    {
        return Ok(Json(
            json!({ "message": "user already exists", "insertedId": null }),
        ));
    }

    let result = state
        .storage
        .insert_one(collections::USERS, serde_json::to_value(&user)?)
        .await?;
    Ok(Json(serde_json::to_value(result)?))
}

async fn elevate_to_admin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResult>, ApiError> {
    let mut set = Map::new();
    set.insert("role".to_string(), json!(Role::Admin));
    let result = state
        .storage
        .update_one(collections::USERS, &Filter::by_id(&id), &set)
        .await?;
    Ok(Json(result))
}

// --- Reference collections (read-only) ---

async fn list_categories(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>, ApiError> {
    let categories = state
        .storage
        .find(
            collections::CATEGORIES,
            &Filter::all(),
            &FindOptions::default(),
        )
        .await?;
    Ok(Json(categories))
}

async fn list_encourages(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>, ApiError> {
    let encourages = state
        .storage
        .find(
            collections::ENCOURAGE,
            &Filter::all(),
            &FindOptions::default(),
        )
        .await?;
    Ok(Json(encourages))
}

// --- Pets ---

#[derive(Deserialize)]
struct PetSearchQuery {
    search: Option<String>,
    category: Option<String>,
}

/// Page/size stay strings so that failed numeric coercion selects zero
/// items instead of rejecting the request.
#[derive(Deserialize)]
struct OwnedPageQuery {
    lister_email: Option<String>,
    page: Option<String>,
    size: Option<String>,
}

async fn list_pets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PetSearchQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let filter = query::pet_search_filter(params.search.as_deref(), params.category.as_deref());
    let options = FindOptions::default().sort("listed_time", SortOrder::Desc);
    let pets = state.storage.find(collections::PETS, &filter, &options).await?;
    Ok(Json(pets))
}

async fn my_pets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OwnedPageQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let filter = query::owned_by("lister_email", params.lister_email.as_deref());
    let window = query::page_window(params.page.as_deref(), params.size.as_deref());
    let options = FindOptions::default().skip(window.skip).limit(window.limit);
    let pets = state.storage.find(collections::PETS, &filter, &options).await?;
    Ok(Json(pets))
}

/// Full matching set, no pagination; callers measure the length client-side.
async fn my_pets_count(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OwnedPageQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let filter = query::owned_by("lister_email", params.lister_email.as_deref());
    let pets = state
        .storage
        .find(collections::PETS, &filter, &FindOptions::default())
        .await?;
    Ok(Json(pets))
}

async fn get_pet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let pet = state
        .storage
        .find_one(collections::PETS, &Filter::by_id(&id))
        .await?;
    Ok(Json(pet.unwrap_or(Value::Null)))
}

async fn create_pet(
    State(state): State<Arc<AppState>>,
    Json(pet): Json<Pet>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let result = state
        .storage
        .insert_one(collections::PETS, serde_json::to_value(&pet)?)
        .await?;
    Ok(Json(result))
}

async fn update_pet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<Map<String, Value>>,
) -> Result<Json<UpdateResult>, ApiError> {
    let result = state
        .storage
        .update_one(collections::PETS, &Filter::by_id(&id), &update)
        .await?;
    Ok(Json(result))
}

async fn delete_pet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let result = state
        .storage
        .delete_one(collections::PETS, &Filter::by_id(&id))
        .await?;
    Ok(Json(result))
}

// --- Adoption requests ---

#[derive(Deserialize)]
struct AdoptionOwnerQuery {
    lister: Option<String>,
}

async fn my_adoptions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AdoptionOwnerQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let filter = query::owned_by("lister", params.lister.as_deref());
    let adoptions = state
        .storage
        .find(collections::ADOPTIONS, &filter, &FindOptions::default())
        .await?;
    Ok(Json(adoptions))
}

async fn create_adoption(
    State(state): State<Arc<AppState>>,
    Json(adoption): Json<Adoption>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let result = state
        .storage
        .insert_one(collections::ADOPTIONS, serde_json::to_value(&adoption)?)
        .await?;
    Ok(Json(result))
}

async fn update_adoption(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<Map<String, Value>>,
) -> Result<Json<UpdateResult>, ApiError> {
    let result = state
        .storage
        .update_one(collections::ADOPTIONS, &Filter::by_id(&id), &update)
        .await?;
    Ok(Json(result))
}

// --- Campaigns ---

#[derive(Deserialize)]
struct CampaignOwnerQuery {
    creator: Option<String>,
}

async fn my_campaigns(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CampaignOwnerQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let filter = query::owned_by("creator", params.creator.as_deref());
    let campaigns = state
        .storage
        .find(collections::CAMPAIGNS, &filter, &FindOptions::default())
        .await?;
    Ok(Json(campaigns))
}

async fn list_campaigns(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>, ApiError> {
    let options = FindOptions::default().sort("created_on", SortOrder::Desc);
    let campaigns = state
        .storage
        .find(collections::CAMPAIGNS, &Filter::all(), &options)
        .await?;
    Ok(Json(campaigns))
}

async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let campaign = state
        .storage
        .find_one(collections::CAMPAIGNS, &Filter::by_id(&id))
        .await?;
    Ok(Json(campaign.unwrap_or(Value::Null)))
}

async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Json(campaign): Json<Campaign>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let result = state
        .storage
        .insert_one(collections::CAMPAIGNS, serde_json::to_value(&campaign)?)
        .await?;
    Ok(Json(result))
}

async fn update_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<Map<String, Value>>,
) -> Result<Json<UpdateResult>, ApiError> {
    let result = state
        .storage
        .update_one(collections::CAMPAIGNS, &Filter::by_id(&id), &update)
        .await?;
    Ok(Json(result))
}

async fn delete_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let result = state
        .storage
        .delete_one(collections::CAMPAIGNS, &Filter::by_id(&id))
        .await?;
    Ok(Json(result))
}
