use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    /// Institutional identifier; projected as `student_id` or `staff_id`
    /// in responses depending on role.
    pub reg_number: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    pub reg_number: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = complaints)]
pub struct Complaint {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub voice_text: Option<String>,
    pub status: String,
    pub category: String,
    pub priority: String,
    pub sentiment: String,
    pub foul_language_severity: String,
    pub foul_language_detected: bool,
    pub is_anonymous: bool,
    pub student_id: Uuid,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub student_department: Option<String>,
    pub support_count: i32,
    pub supported_by: serde_json::Value,
    pub evidence_tags: serde_json::Value,
    pub attachments: serde_json::Value,
    pub timeline: serde_json::Value,
    pub feedback: Option<serde_json::Value>,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_name: Option<String>,
    pub assigned_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = complaints)]
pub struct NewComplaint {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub voice_text: Option<String>,
    pub status: String,
    pub category: String,
    pub priority: String,
    pub sentiment: String,
    pub foul_language_severity: String,
    pub foul_language_detected: bool,
    pub is_anonymous: bool,
    pub student_id: Uuid,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub student_department: Option<String>,
    pub supported_by: serde_json::Value,
    pub evidence_tags: serde_json::Value,
    pub attachments: serde_json::Value,
    pub timeline: serde_json::Value,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = refresh_tokens)]
#[diesel(belongs_to(User))]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
