/// Member profile endpoints
///
/// - `GET /v1/me`
/// - `PATCH /v1/me` - Partial update; omitted fields are left unchanged

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use growthyari_shared::{
    auth::middleware::AuthContext,
    models::{UpdateProfile, User},
};
use serde::{Deserialize, Deserializer};
use validator::Validate;

/// Trims on the way in, so length checks see what gets stored
fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|v| v.trim().to_string()))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,

    #[validate(url(message = "Invalid image URL"))]
    pub image: Option<String>,

    #[validate(length(max = 1000, message = "Bio must be at most 1000 characters"))]
    pub bio: Option<String>,

    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(max = 120, message = "Company must be at most 120 characters"))]
    pub company: Option<String>,

    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(max = 120, message = "Designation must be at most 120 characters"))]
    pub designation: Option<String>,

    #[validate(url(message = "Invalid LinkedIn URL"))]
    pub linkedin_url: Option<String>,

    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 5, max = 20, message = "Phone must be 5 to 20 characters"))]
    pub phone: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateProfile {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            name: req.name,
            image: req.image,
            bio: req.bio,
            company: req.company,
            designation: req.designation,
            linkedin_url: req.linkedin_url,
            phone: req.phone,
        }
    }
}

async fn current_user(state: &AppState, auth: &AuthContext) -> ApiResult<User> {
    User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    Ok(Json(current_user(&state, &auth).await?))
}

/// Update the caller's profile
///
/// # Errors
///
/// - `404 Not Found`: Account deleted since the token was issued
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    let update = UpdateProfile::from(req);
    if update.is_empty() {
        return Ok(Json(current_user(&state, &auth).await?));
    }

    let user = User::update_profile(&state.db, auth.user_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(user))
}
