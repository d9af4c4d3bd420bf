pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use larder_core::dietary::DietaryPreference;
use larder_core::store::{list_as, Collection, DocumentStore, FieldFilter, StoreError};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// Returns the router for /api/users endpoints (mounted at /api/users)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_users).post(create::create_user))
        .route(
            "/{id}",
            get(get::get_user)
                .put(update::update_user)
                .delete(delete::delete_user),
        )
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<DietaryPreference>,
}

/// A user document as kept in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub name: String,
    /// Stored lowercased; unique across users.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<DietaryPreference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    #[serde(flatten)]
    pub user: User,
}

/// Trimmed, validated fields from a [`UserRequest`].
pub struct UserFields {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub dietary_preferences: Vec<DietaryPreference>,
}

impl UserRequest {
    pub fn validate(self) -> Result<UserFields, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name cannot be empty");
        }

        let email = self.email.trim().to_lowercase();
        if email.is_empty() {
            return Err("Email cannot be empty");
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err("Email is not valid"),
        }

        let phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let mut dietary_preferences = self.dietary_preferences;
        dietary_preferences.sort();
        dietary_preferences.dedup();

        Ok(UserFields {
            name: name.to_string(),
            email,
            phone,
            dietary_preferences,
        })
    }
}

/// True when another user (not `except_id`) already has `email`.
pub async fn email_taken(
    store: &dyn DocumentStore,
    email: &str,
    except_id: Option<&str>,
) -> Result<bool, StoreError> {
    let filter = FieldFilter::new("email", email);
    let matches: Vec<(String, User)> = list_as(store, Collection::Users, Some(&filter)).await?;
    Ok(matches.iter().any(|(id, _)| Some(id.as_str()) != except_id))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_users,
        create::create_user,
        get::get_user,
        update::update_user,
        delete::delete_user,
    ),
    components(schemas(UserRequest, User, UserResponse, list::UsersListResponse))
)]
pub struct ApiDoc;
