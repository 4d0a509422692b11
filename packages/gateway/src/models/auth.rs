use serde::{Deserialize, Serialize};

/// Request body for the credential check.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    /// Opaque access key issued to the user.
    #[schema(example = "k-7f3a9c")]
    pub user_key: String,
}

/// Generic acknowledgement.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OkResponse {
    #[schema(example = true)]
    pub ok: bool,
}

/// Identity behind the current session.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[schema(example = "k-7f3a9c")]
    pub user_key: String,
}
