use axum::{
    extract::{Path, Query, State},
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::lifecycle::Role;
use crate::models::User;
use crate::schema::users;
use crate::state::AppState;
use crate::utils::{envelope, envelope::Envelope, rfc3339};

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    pub student_id: Option<String>,
    pub staff_id: Option<String>,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        // One stored institutional identifier, projected by role.
        let is_student = user.role == Role::Student.as_str();
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
            department: user.department.clone(),
            student_id: is_student.then(|| user.reg_number.clone()).flatten(),
            staff_id: (!is_student).then(|| user.reg_number.clone()).flatten(),
            created_at: rfc3339(user.created_at),
        }
    }
}

#[derive(Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListQuery>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Envelope<Vec<UserResponse>>>> {
    let mut conn = state.db()?;

    let mut query = users::table.into_boxed();
    if let Some(role) = params.role.as_deref() {
        query = query.filter(users::role.eq(role.to_owned()));
    }

    let rows: Vec<User> = query.order(users::name.asc()).load(&mut conn)?;
    let response: Vec<UserResponse> = rows.iter().map(UserResponse::from).collect();

    Ok(envelope::ok("Users retrieved successfully", response))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<serde_json::Value>>> {
    if user.role != Role::Admin {
        return Err(AppError::forbidden("only admin may delete users"));
    }
    if user.user_id == user_id {
        return Err(AppError::bad_request("cannot delete your own account"));
    }

    let mut conn = state.db()?;
    let deleted = diesel::delete(users::table.find(user_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }

    Ok(envelope::ok(
        "User deleted successfully",
        serde_json::Value::Null,
    ))
}
