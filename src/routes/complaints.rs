use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::{
    annotator::AiAnalysis,
    auth::AuthenticatedUser,
    conflict,
    error::{AppError, AppResult},
    lifecycle::{check_transition, ComplaintStatus, Role},
    models::{Complaint, NewComplaint, User},
    profanity,
    schema::{complaints, users},
    state::AppState,
    utils::{envelope, envelope::Envelope, rfc3339},
    visibility::{self, Viewer, VisibilityScope},
};

const LIST_LIMIT: i64 = 1000;
const DUPLICATE_WINDOW_DAYS: i64 = 30;

#[derive(Deserialize)]
pub struct CreateComplaintRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub is_anonymous: bool,
    pub voice_text: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub evidence_tags: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Value>,
}

#[derive(Deserialize)]
pub struct UpdateComplaintRequest {
    pub status: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub remark: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub rating: i64,
    pub comment: Option<String>,
}

/// Wire shape of a complaint, with submitter identity redacted according
/// to the viewer.
#[derive(Debug, Serialize)]
pub struct ComplaintView {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anonymous_label: Option<String>,
    pub support_count: i32,
    pub user_supported: bool,
    pub evidence_tags: Value,
    pub attachments: Value,
    pub timeline: Value,
    pub feedback: Option<Value>,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_name: Option<String>,
    pub assigned_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ComplaintView {
    pub fn shape(complaint: &Complaint, viewer: &Viewer) -> Self {
        let sees_identity = visibility::sees_submitter_identity(
            viewer,
            complaint.is_anonymous,
            complaint.student_id,
        );

        let (student_name, student_email, student_department) = if sees_identity {
            (
                complaint.student_name.clone(),
                complaint.student_email.clone(),
                complaint.student_department.clone(),
            )
        } else {
            (Some("Anonymous".to_string()), Some("Hidden".to_string()), None)
        };

        // Oversight roles get the real identity plus a marker that the
        // submitter asked for anonymity.
        let anonymous_label = (complaint.is_anonymous
            && sees_identity
            && matches!(viewer.role, Role::Admin | Role::Principal))
        .then(|| "Anonymous".to_string());

        let user_supported = complaint
            .supported_by
            .as_array()
            .map(|ids| ids.iter().any(|v| v.as_str() == Some(&viewer.id.to_string())))
            .unwrap_or(false);

        Self {
            id: complaint.id,
            title: complaint.title.clone(),
            description: complaint.description.clone(),
            voice_text: complaint.voice_text.clone(),
            status: complaint.status.clone(),
            category: complaint.category.clone(),
            priority: complaint.priority.clone(),
            sentiment: complaint.sentiment.clone(),
            foul_language_severity: complaint.foul_language_severity.clone(),
            foul_language_detected: complaint.foul_language_detected,
            is_anonymous: complaint.is_anonymous,
            student_id: complaint.student_id,
            student_name,
            student_email,
            student_department,
            anonymous_label,
            support_count: complaint.support_count,
            user_supported,
            evidence_tags: complaint.evidence_tags.clone(),
            attachments: complaint.attachments.clone(),
            timeline: complaint.timeline.clone(),
            feedback: complaint.feedback.clone(),
            assigned_to: complaint.assigned_to,
            assigned_to_name: complaint.assigned_to_name.clone(),
            assigned_at: complaint.assigned_at.map(rfc3339),
            created_at: rfc3339(complaint.created_at),
            updated_at: rfc3339(complaint.updated_at),
        }
    }
}

fn timeline_entry(status: &str, note: &str, by: &str) -> Value {
    json!({
        "status": status,
        "timestamp": rfc3339(Utc::now().naive_utc()),
        "note": note,
        "by": by,
    })
}

fn push_timeline(timeline: &mut Value, entry: Value) {
    match timeline.as_array_mut() {
        Some(entries) => entries.push(entry),
        None => *timeline = json!([entry]),
    }
}

fn parse_status(raw: &str) -> AppResult<ComplaintStatus> {
    raw.parse::<ComplaintStatus>().map_err(AppError::bad_request)
}

/// Mutual containment of title and description against a recent complaint
/// by the same student flags a resubmission.
fn is_duplicate_of(existing: &Complaint, title: &str, description: &str) -> bool {
    let new_title = title.trim().to_lowercase();
    let new_desc = description.trim().to_lowercase();
    let old_title = existing.title.trim().to_lowercase();
    let old_desc = existing.description.trim().to_lowercase();

    let title_overlap = new_title.contains(&old_title) || old_title.contains(&new_title);
    let desc_overlap = new_desc.contains(&old_desc) || old_desc.contains(&new_desc);
    title_overlap && desc_overlap
}

pub async fn create_complaint(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateComplaintRequest>,
) -> AppResult<(StatusCode, Json<Envelope<ComplaintView>>)> {
    let title = payload.title.trim().to_string();
    let description = payload.description.trim().to_string();
    if title.is_empty() || description.is_empty() {
        return Err(AppError::bad_request("title and description are required"));
    }

    let mut conn = state.db()?;

    let window_start =
        (Utc::now() - ChronoDuration::days(DUPLICATE_WINDOW_DAYS)).naive_utc();
    let recent: Vec<Complaint> = complaints::table
        .filter(complaints::student_id.eq(user.user_id))
        .filter(complaints::created_at.gt(window_start))
        .order(complaints::created_at.desc())
        .load(&mut conn)?;
    if let Some(existing) = recent
        .iter()
        .find(|c| is_duplicate_of(c, &title, &description))
    {
        return Err(AppError::bad_request(format!(
            "a similar complaint ({}) was already submitted in the last {} days",
            existing.id, DUPLICATE_WINDOW_DAYS
        )));
    }

    let combined = format!("{} {}", title, description);
    if profanity::contains_profanity(&combined) {
        return Err(AppError::bad_request(
            "complaint contains inappropriate language; please rephrase and resubmit",
        ));
    }

    let analysis = match state.annotator.analyze(&combined).await {
        Ok(analysis) => analysis,
        Err(err) => {
            warn!(error = %err, "annotation failed, using fallback");
            AiAnalysis::fallback()
        }
    };

    let category = payload
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| analysis.category.clone());

    let submitter: User = users::table.find(user.user_id).first(&mut conn)?;

    let new_complaint = NewComplaint {
        id: Uuid::new_v4(),
        title,
        description,
        voice_text: payload.voice_text.clone(),
        status: ComplaintStatus::Submitted.as_str().to_string(),
        category,
        priority: analysis.priority,
        sentiment: analysis.sentiment,
        foul_language_severity: analysis.foul_language_severity,
        foul_language_detected: analysis.foul_language_detected,
        is_anonymous: payload.is_anonymous,
        // Identity is always stored; redaction happens when responses are
        // shaped for a viewer.
        student_id: user.user_id,
        student_name: Some(submitter.name.clone()),
        student_email: Some(submitter.email.clone()),
        student_department: submitter.department.clone(),
        supported_by: json!([]),
        evidence_tags: json!(payload.evidence_tags),
        attachments: json!(payload.attachments),
        timeline: json!([timeline_entry(
            ComplaintStatus::Submitted.as_str(),
            "Complaint submitted",
            &submitter.name,
        )]),
    };

    let inserted: Complaint = diesel::insert_into(complaints::table)
        .values(&new_complaint)
        .get_result(&mut conn)?;

    Ok((
        StatusCode::CREATED,
        envelope::ok(
            "Complaint submitted successfully",
            ComplaintView::shape(&inserted, &user.viewer()),
        ),
    ))
}

pub async fn list_complaints(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<Vec<ComplaintView>>>> {
    let mut conn = state.db()?;
    let viewer = user.viewer();

    let mut query = complaints::table.into_boxed();
    match visibility::scope_for(&viewer) {
        VisibilityScope::All => {}
        VisibilityScope::OwnedBy(id) => {
            query = query.filter(complaints::student_id.eq(id));
        }
        VisibilityScope::AssignedTo(id) => {
            query = query.filter(complaints::assigned_to.eq(id));
        }
    }

    let rows: Vec<Complaint> = query
        .order(complaints::created_at.desc())
        .limit(LIST_LIMIT)
        .load(&mut conn)?;

    let views: Vec<ComplaintView> = rows
        .iter()
        .map(|c| ComplaintView::shape(c, &viewer))
        .collect();

    Ok(envelope::ok("Complaints retrieved successfully", views))
}

pub async fn get_complaint(
    State(state): State<AppState>,
    Path(complaint_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<ComplaintView>>> {
    let mut conn = state.db()?;
    let viewer = user.viewer();

    let complaint: Complaint = complaints::table.find(complaint_id).first(&mut conn)?;
    if !visibility::can_view(&viewer, complaint.student_id, complaint.assigned_to) {
        return Err(AppError::not_found());
    }

    Ok(envelope::ok(
        "Complaint retrieved successfully",
        ComplaintView::shape(&complaint, &viewer),
    ))
}

pub async fn update_complaint(
    State(state): State<AppState>,
    Path(complaint_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateComplaintRequest>,
) -> AppResult<Json<Envelope<ComplaintView>>> {
    if !user.role.can_update_complaints() {
        return Err(AppError::forbidden("students cannot update complaints"));
    }

    let mut conn = state.db()?;
    let viewer = user.viewer();

    let complaint: Complaint = complaints::table.find(complaint_id).first(&mut conn)?;
    if !visibility::can_view(&viewer, complaint.student_id, complaint.assigned_to) {
        return Err(AppError::not_found());
    }

    let current_status = parse_status(&complaint.status)?;
    let mut next_status = current_status;
    let mut timeline = complaint.timeline.clone();
    let mut assigned_to = complaint.assigned_to;
    let mut assigned_to_name = complaint.assigned_to_name.clone();
    let mut assigned_at = complaint.assigned_at;

    if let Some(assignee_id) = payload.assigned_to {
        if !user.role.is_reviewer() {
            return Err(AppError::forbidden("only hod, principal or admin may assign"));
        }
        if complaint.assigned_to.is_some() {
            return Err(AppError::already_assigned());
        }

        let assignee: User = match users::table.find(assignee_id).first(&mut conn) {
            Ok(assignee) => assignee,
            Err(diesel::result::Error::NotFound) => {
                return Err(AppError::bad_request("assignee does not exist"))
            }
            Err(err) => return Err(AppError::from(err)),
        };
        if assignee.role != Role::Staff.as_str() {
            return Err(AppError::bad_request(
                "complaints can only be assigned to staff",
            ));
        }
        if conflict::is_staff_mentioned(&assignee.name, &complaint.title, &complaint.description) {
            return Err(AppError::conflict(format!(
                "{} is mentioned in this complaint and cannot be assigned to it",
                assignee.name
            )));
        }

        if current_status.is_terminal() {
            return Err(AppError::invalid_transition(
                current_status,
                ComplaintStatus::InProgress,
            ));
        }
        // A freshly submitted complaint moves to in_progress through the
        // guard; one a reviewer already accepted keeps its status.
        if current_status == ComplaintStatus::Submitted {
            check_transition(
                &state.transition_policy(),
                current_status,
                ComplaintStatus::InProgress,
                user.role,
                false,
            )?;
            next_status = ComplaintStatus::InProgress;
        }

        assigned_to = Some(assignee.id);
        assigned_to_name = Some(assignee.name.clone());
        assigned_at = Some(Utc::now().naive_utc());
        push_timeline(
            &mut timeline,
            timeline_entry(
                next_status.as_str(),
                &format!("Assigned to {}", assignee.name),
                &user.name,
            ),
        );
    }

    if let Some(requested) = payload.status.as_deref() {
        let target = parse_status(requested)?;
        let actor_is_assignee = assigned_to == Some(user.user_id);
        check_transition(
            &state.transition_policy(),
            next_status,
            target,
            user.role,
            actor_is_assignee,
        )?;
        next_status = target;
        push_timeline(
            &mut timeline,
            timeline_entry(
                target.as_str(),
                &format!("Status changed to {}", target),
                &user.name,
            ),
        );
    }

    if let Some(remark) = payload.remark.as_deref() {
        let remark = remark.trim();
        if remark.is_empty() {
            return Err(AppError::bad_request("remark cannot be empty"));
        }
        push_timeline(
            &mut timeline,
            timeline_entry(next_status.as_str(), remark, &user.name),
        );
    }

    let now = Utc::now().naive_utc();
    // The status and updated_at filters make the write conditional on the
    // row being unchanged since we read it; remark-only writers race on
    // the timeline too, not just on status.
    let updated = diesel::update(
        complaints::table
            .find(complaint_id)
            .filter(complaints::status.eq(&complaint.status))
            .filter(complaints::updated_at.eq(complaint.updated_at)),
    )
    .set((
        complaints::status.eq(next_status.as_str()),
        complaints::timeline.eq(&timeline),
        complaints::assigned_to.eq(assigned_to),
        complaints::assigned_to_name.eq(assigned_to_name.as_deref()),
        complaints::assigned_at.eq(assigned_at),
        complaints::updated_at.eq(now),
    ))
    .execute(&mut conn)?;
    if updated == 0 {
        return Err(AppError::conflict("complaint was modified concurrently"));
    }

    let refreshed: Complaint = complaints::table.find(complaint_id).first(&mut conn)?;
    Ok(envelope::ok(
        "Complaint updated successfully",
        ComplaintView::shape(&refreshed, &viewer),
    ))
}

pub async fn delete_complaint(
    State(state): State<AppState>,
    Path(complaint_id): Path<Uuid>,
    Query(params): Query<DeleteQuery>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<Value>>> {
    if !params.confirm {
        return Err(AppError::bad_request(
            "deletion must be confirmed with confirm=true",
        ));
    }

    let mut conn = state.db()?;
    let complaint: Complaint = complaints::table.find(complaint_id).first(&mut conn)?;

    match user.role {
        Role::Admin => {}
        Role::Staff => {
            if !visibility::can_view(&user.viewer(), complaint.student_id, complaint.assigned_to) {
                return Err(AppError::not_found());
            }
            if complaint.status != ComplaintStatus::Resolved.as_str() {
                return Err(AppError::forbidden(
                    "staff may only delete resolved complaints assigned to them",
                ));
            }
        }
        _ => return Err(AppError::forbidden("not allowed to delete complaints")),
    }

    diesel::delete(complaints::table.find(complaint_id)).execute(&mut conn)?;
    Ok(envelope::ok("Complaint deleted successfully", Value::Null))
}

pub async fn support_complaint(
    State(state): State<AppState>,
    Path(complaint_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<Value>>> {
    let mut conn = state.db()?;

    // Peer upvotes are open to any authenticated user; this is not a
    // detail read, so no visibility gate.
    let complaint: Complaint = complaints::table.find(complaint_id).first(&mut conn)?;

    let user_key = user.user_id.to_string();
    let mut supporters: Vec<String> = complaint
        .supported_by
        .as_array()
        .map(|ids| {
            ids.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let user_supported = if let Some(pos) = supporters.iter().position(|id| *id == user_key) {
        supporters.remove(pos);
        false
    } else {
        supporters.push(user_key);
        true
    };
    let support_count = supporters.len() as i32;

    diesel::update(complaints::table.find(complaint_id))
        .set((
            complaints::supported_by.eq(json!(supporters)),
            complaints::support_count.eq(support_count),
            complaints::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    Ok(envelope::ok(
        if user_supported {
            "Support added"
        } else {
            "Support removed"
        },
        json!({ "support_count": support_count, "user_supported": user_supported }),
    ))
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(complaint_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<FeedbackRequest>,
) -> AppResult<Json<Envelope<Value>>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::bad_request("rating must be between 1 and 5"));
    }

    let mut conn = state.db()?;
    let viewer = user.viewer();

    let complaint: Complaint = complaints::table.find(complaint_id).first(&mut conn)?;
    if !visibility::can_view(&viewer, complaint.student_id, complaint.assigned_to) {
        return Err(AppError::not_found());
    }
    if complaint.student_id != user.user_id {
        return Err(AppError::forbidden(
            "only the submitter may leave feedback",
        ));
    }
    if complaint.status != ComplaintStatus::Resolved.as_str() {
        return Err(AppError::bad_request(
            "feedback is only accepted on resolved complaints",
        ));
    }

    let feedback = json!({
        "rating": payload.rating,
        "comment": payload.comment,
        "submitted_at": rfc3339(Utc::now().naive_utc()),
    });

    // Write-once: the filters reject a second submission or a concurrent
    // status change.
    let updated = diesel::update(
        complaints::table
            .find(complaint_id)
            .filter(complaints::feedback.is_null())
            .filter(complaints::status.eq(ComplaintStatus::Resolved.as_str())),
    )
    .set((
        complaints::feedback.eq(&feedback),
        complaints::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(&mut conn)?;
    if updated == 0 {
        return Err(AppError::conflict("feedback was already submitted"));
    }

    Ok(envelope::ok("Feedback submitted successfully", feedback))
}

#[derive(Serialize)]
pub struct EligibleStaffMember {
    pub id: Uuid,
    pub name: String,
    pub department: Option<String>,
}

pub async fn eligible_staff(
    State(state): State<AppState>,
    Path(complaint_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<Value>>> {
    if !user.role.is_reviewer() {
        return Err(AppError::forbidden(
            "only hod, principal or admin may view assignment candidates",
        ));
    }

    let mut conn = state.db()?;
    let complaint: Complaint = complaints::table.find(complaint_id).first(&mut conn)?;

    let roster: Vec<User> = users::table
        .filter(users::role.eq(Role::Staff.as_str()))
        .order(users::name.asc())
        .load(&mut conn)?;

    let (eligible, excluded) = conflict::split_eligible(
        &complaint.title,
        &complaint.description,
        roster,
        |member| member.name.as_str(),
    );

    let staff: Vec<EligibleStaffMember> = eligible
        .into_iter()
        .map(|member| EligibleStaffMember {
            id: member.id,
            name: member.name,
            department: member.department,
        })
        .collect();
    let excluded_names: Vec<String> = excluded.into_iter().map(|member| member.name).collect();

    Ok(envelope::ok(
        "Eligible staff retrieved successfully",
        json!({
            "staff": staff,
            "excluded_count": excluded_names.len(),
            "excluded_names": excluded_names,
        }),
    ))
}
