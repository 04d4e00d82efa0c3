use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use axum_extra::{headers::Cookie, typed_header::TypedHeader};
use chrono::{Duration as ChronoDuration, Utc};
use diesel::prelude::*;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    auth::{password, AuthenticatedUser},
    error::{AppError, AppResult},
    lifecycle::Role,
    models::{NewRefreshToken, NewUser, RefreshToken, User},
    schema::{refresh_tokens, users::dsl},
    state::AppState,
    utils::{envelope, envelope::Envelope},
};

use super::users::UserResponse;
use crate::schema::refresh_tokens::dsl as refresh_dsl;

const REFRESH_COOKIE_NAME: &str = "refresh_token";
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    pub student_id: Option<String>,
    pub staff_id: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<Envelope<AuthResponse>>)> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request("a valid email is required"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "password must be at least 8 characters",
        ));
    }
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    let role = payload
        .role
        .parse::<Role>()
        .map_err(AppError::bad_request)?;

    let mut conn = state.db()?;

    let existing: i64 = dsl::users
        .filter(dsl::email.eq(&email))
        .count()
        .get_result(&mut conn)?;
    if existing > 0 {
        return Err(AppError::bad_request("email already registered"));
    }

    let reg_number = match role {
        Role::Student => payload.student_id.clone(),
        _ => payload.staff_id.clone(),
    };

    let new_user = NewUser {
        id: Uuid::new_v4(),
        email: email.clone(),
        password_hash: password::hash_password(&payload.password)?,
        name,
        role: role.as_str().to_string(),
        department: payload.department.clone(),
        reg_number,
    };

    diesel::insert_into(crate::schema::users::table)
        .values(&new_user)
        .execute(&mut conn)?;

    let user: User = dsl::users
        .filter(dsl::email.eq(&email))
        .first(&mut conn)?;

    let (headers, response) = issue_session(&state, &mut conn, &user)?;
    Ok((
        StatusCode::CREATED,
        headers,
        envelope::ok("Registration successful", response),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<Envelope<AuthResponse>>)> {
    let email = payload.email.trim().to_lowercase();
    let mut conn = state.db()?;

    let user: User = match dsl::users.filter(dsl::email.eq(&email)).first(&mut conn) {
        Ok(user) => user,
        Err(diesel::result::Error::NotFound) => return Err(AppError::unauthorized()),
        Err(err) => return Err(AppError::from(err)),
    };

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_| AppError::unauthorized())?;
    if !valid {
        return Err(AppError::unauthorized());
    }

    let (headers, response) = issue_session(&state, &mut conn, &user)?;
    Ok((headers, envelope::ok("Login successful", response)))
}

pub async fn refresh(
    State(state): State<AppState>,
    jar: Option<TypedHeader<Cookie>>,
) -> AppResult<(HeaderMap, Json<Envelope<AuthResponse>>)> {
    let cookies = jar.ok_or_else(AppError::unauthorized)?;
    let refresh_value = cookies
        .get(REFRESH_COOKIE_NAME)
        .ok_or_else(AppError::unauthorized)?;

    let hashed = hash_refresh_token(refresh_value);
    let mut conn = state.db()?;
    let now = Utc::now().naive_utc();

    let token = match refresh_dsl::refresh_tokens
        .filter(refresh_dsl::token_hash.eq(&hashed))
        .filter(refresh_dsl::revoked_at.is_null())
        .filter(refresh_dsl::expires_at.gt(now))
        .first::<RefreshToken>(&mut conn)
    {
        Ok(token) => token,
        Err(diesel::result::Error::NotFound) => return Err(AppError::unauthorized()),
        Err(err) => return Err(AppError::from(err)),
    };

    diesel::update(refresh_dsl::refresh_tokens.filter(refresh_dsl::id.eq(token.id)))
        .set((
            refresh_dsl::revoked_at.eq(now),
            refresh_dsl::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    let user: User = dsl::users.find(token.user_id).first(&mut conn)?;

    let (headers, response) = issue_session(&state, &mut conn, &user)?;
    Ok((headers, envelope::ok("Token refreshed", response)))
}

pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: Option<TypedHeader<Cookie>>,
) -> AppResult<(HeaderMap, Json<Envelope<serde_json::Value>>)> {
    let mut conn = state.db()?;
    let now = Utc::now().naive_utc();
    let mut rows_affected = 0;

    if let Some(cookies) = jar {
        if let Some(value) = cookies.get(REFRESH_COOKIE_NAME) {
            let hashed = hash_refresh_token(value);
            rows_affected = diesel::update(
                refresh_dsl::refresh_tokens
                    .filter(refresh_dsl::token_hash.eq(hashed))
                    .filter(refresh_dsl::user_id.eq(user.user_id))
                    .filter(refresh_dsl::revoked_at.is_null()),
            )
            .set((
                refresh_dsl::revoked_at.eq(now),
                refresh_dsl::updated_at.eq(now),
            ))
            .execute(&mut conn)
            .unwrap_or(0);
        }
    }

    // No matching cookie: revoke every live session for the user instead.
    if rows_affected == 0 {
        let _ = diesel::update(
            refresh_dsl::refresh_tokens
                .filter(refresh_dsl::user_id.eq(user.user_id))
                .filter(refresh_dsl::revoked_at.is_null()),
        )
        .set((
            refresh_dsl::revoked_at.eq(now),
            refresh_dsl::updated_at.eq(now),
        ))
        .execute(&mut conn);
    }

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, build_clear_refresh_cookie(&state)?);
    Ok((
        headers,
        envelope::ok("Logged out", serde_json::Value::Null),
    ))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<UserResponse>>> {
    let mut conn = state.db()?;
    let record: User = dsl::users.find(user.user_id).first(&mut conn)?;
    Ok(envelope::ok(
        "Profile retrieved successfully",
        UserResponse::from(&record),
    ))
}

pub async fn update_me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<Envelope<UserResponse>>> {
    let mut conn = state.db()?;
    let now = Utc::now().naive_utc();

    if let Some(name) = payload.name.as_deref() {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("name cannot be empty"));
        }
        diesel::update(dsl::users.find(user.user_id))
            .set((dsl::name.eq(name), dsl::updated_at.eq(now)))
            .execute(&mut conn)?;
    }
    if let Some(email) = payload.email.as_deref() {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::bad_request("a valid email is required"));
        }
        let taken: i64 = dsl::users
            .filter(dsl::email.eq(&email))
            .filter(dsl::id.ne(user.user_id))
            .count()
            .get_result(&mut conn)?;
        if taken > 0 {
            return Err(AppError::bad_request("email already registered"));
        }
        diesel::update(dsl::users.find(user.user_id))
            .set((dsl::email.eq(&email), dsl::updated_at.eq(now)))
            .execute(&mut conn)?;
    }
    if let Some(department) = payload.department.as_deref() {
        diesel::update(dsl::users.find(user.user_id))
            .set((dsl::department.eq(department), dsl::updated_at.eq(now)))
            .execute(&mut conn)?;
    }

    let record: User = dsl::users.find(user.user_id).first(&mut conn)?;
    Ok(envelope::ok(
        "Profile updated successfully",
        UserResponse::from(&record),
    ))
}

fn issue_session(
    state: &AppState,
    conn: &mut PgConnection,
    user: &User,
) -> AppResult<(HeaderMap, AuthResponse)> {
    let access_token = state.jwt.generate_token(user)?;

    let now = Utc::now();
    let refresh_value = generate_refresh_token();
    let refresh_hash = hash_refresh_token(&refresh_value);
    let refresh_expires_at = now + ChronoDuration::days(state.config.refresh_token_expiry_days);

    let new_refresh = NewRefreshToken {
        id: Uuid::new_v4(),
        user_id: user.id,
        token_hash: refresh_hash,
        issued_at: now.naive_utc(),
        expires_at: refresh_expires_at.naive_utc(),
    };

    diesel::insert_into(refresh_tokens::table)
        .values(&new_refresh)
        .execute(conn)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        build_refresh_cookie(state, &refresh_value, refresh_expires_at)?,
    );

    Ok((
        headers,
        AuthResponse {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: state.config.jwt_expiry_minutes * 60,
            user: UserResponse::from(user),
        },
    ))
}

fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn build_refresh_cookie(
    state: &AppState,
    token: &str,
    expires_at: chrono::DateTime<Utc>,
) -> AppResult<HeaderValue> {
    let max_age = ChronoDuration::days(state.config.refresh_token_expiry_days).num_seconds();

    let mut parts = vec![format!("{}={}", REFRESH_COOKIE_NAME, token)];
    parts.push("Path=/".into());
    parts.push("HttpOnly".into());
    parts.push("SameSite=Strict".into());
    parts.push(format!("Max-Age={}", max_age));
    parts.push(format!("Expires={}", expires_at.to_rfc2822()));
    if state.config.refresh_cookie_secure {
        parts.push("Secure".into());
    }
    if let Some(domain) = &state.config.refresh_cookie_domain {
        parts.push(format!("Domain={}", domain));
    }

    HeaderValue::from_str(&parts.join("; "))
        .map_err(|err| AppError::internal(format!("invalid refresh cookie: {err}")))
}

fn build_clear_refresh_cookie(state: &AppState) -> AppResult<HeaderValue> {
    let mut parts = vec![format!("{}=", REFRESH_COOKIE_NAME)];
    parts.push("Path=/".into());
    parts.push("HttpOnly".into());
    parts.push("SameSite=Strict".into());
    parts.push("Max-Age=0".into());
    parts.push("Expires=Thu, 01 Jan 1970 00:00:00 GMT".into());
    if state.config.refresh_cookie_secure {
        parts.push("Secure".into());
    }
    if let Some(domain) = &state.config.refresh_cookie_domain {
        parts.push(format!("Domain={}", domain));
    }

    HeaderValue::from_str(&parts.join("; "))
        .map_err(|err| AppError::internal(format!("invalid refresh cookie: {err}")))
}
