use axum::Json;
use serde::Serialize;

/// Uniform response envelope: every endpoint answers
/// `{success, message, data}` so clients have one decode path.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        message: message.into(),
        data,
    })
}
