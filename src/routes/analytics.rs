use std::collections::BTreeMap;

use axum::{extract::State, Json};
use diesel::prelude::*;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    lifecycle::{ComplaintStatus, Role},
    models::{Complaint, User},
    schema::{complaints, users},
    state::AppState,
    utils::{envelope, envelope::Envelope},
};

fn require_reviewer(user: &AuthenticatedUser) -> AppResult<()> {
    if user.role.is_reviewer() {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "analytics are restricted to hod, principal and admin",
        ))
    }
}

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

fn count_by<F>(rows: &[Complaint], key_of: F) -> BTreeMap<String, usize>
where
    F: Fn(&Complaint) -> &str,
{
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts.entry(key_of(row).to_string()).or_insert(0) += 1;
    }
    counts
}

pub async fn overview(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<Value>>> {
    require_reviewer(&user)?;

    let mut conn = state.db()?;
    let rows: Vec<Complaint> = complaints::table.load(&mut conn)?;

    let total = rows.len();
    let by_status = count_by(&rows, |c| c.status.as_str());
    let resolved = by_status
        .get(ComplaintStatus::Resolved.as_str())
        .copied()
        .unwrap_or(0);
    let rejected = by_status
        .get(ComplaintStatus::Rejected.as_str())
        .copied()
        .unwrap_or(0);
    let pending = rows
        .iter()
        .filter(|c| {
            c.status
                .parse::<ComplaintStatus>()
                .map(|s| s.is_pending())
                .unwrap_or(false)
        })
        .count();
    let anonymous = rows.iter().filter(|c| c.is_anonymous).count();

    let summary = json!({
        "total_complaints": total,
        "resolved": resolved,
        "rejected": rejected,
        "pending": pending,
        "anonymous": anonymous,
        "resolution_rate": rate(resolved, total),
        "by_status": by_status,
        "by_category": count_by(&rows, |c| c.category.as_str()),
        "by_priority": count_by(&rows, |c| c.priority.as_str()),
        "by_sentiment": count_by(&rows, |c| c.sentiment.as_str()),
    });

    Ok(envelope::ok("Analytics retrieved successfully", summary))
}

#[derive(Serialize)]
pub struct StaffPerformance {
    pub staff_id: Uuid,
    pub name: String,
    pub department: Option<String>,
    pub assigned: usize,
    pub resolved: usize,
    pub pending: usize,
    pub resolution_rate: f64,
}

pub async fn staff_performance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<Vec<StaffPerformance>>>> {
    require_reviewer(&user)?;

    let mut conn = state.db()?;

    let roster: Vec<User> = users::table
        .filter(users::role.eq(Role::Staff.as_str()))
        .order(users::name.asc())
        .load(&mut conn)?;
    let assigned_rows: Vec<Complaint> = complaints::table
        .filter(complaints::assigned_to.is_not_null())
        .load(&mut conn)?;

    let report = roster
        .into_iter()
        .map(|member| {
            let mine: Vec<&Complaint> = assigned_rows
                .iter()
                .filter(|c| c.assigned_to == Some(member.id))
                .collect();
            let assigned = mine.len();
            let resolved = mine
                .iter()
                .filter(|c| c.status == ComplaintStatus::Resolved.as_str())
                .count();
            let pending = mine
                .iter()
                .filter(|c| {
                    c.status
                        .parse::<ComplaintStatus>()
                        .map(|s| s.is_pending())
                        .unwrap_or(false)
                })
                .count();

            StaffPerformance {
                staff_id: member.id,
                name: member.name,
                department: member.department,
                assigned,
                resolved,
                pending,
                resolution_rate: rate(resolved, assigned),
            }
        })
        .collect();

    Ok(envelope::ok(
        "Staff performance retrieved successfully",
        report,
    ))
}
