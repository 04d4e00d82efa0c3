use uuid::Uuid;

use crate::lifecycle::Role;

/// The authenticated party a visibility decision is made for.
#[derive(Debug, Clone, Copy)]
pub struct Viewer {
    pub id: Uuid,
    pub role: Role,
}

/// Which slice of the complaint table a viewer's list queries cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityScope {
    /// hod / principal / admin: institutional oversight, unscoped.
    All,
    /// student: own submissions only.
    OwnedBy(Uuid),
    /// staff: own assignments only.
    AssignedTo(Uuid),
}

pub fn scope_for(viewer: &Viewer) -> VisibilityScope {
    match viewer.role {
        Role::Student => VisibilityScope::OwnedBy(viewer.id),
        Role::Staff => VisibilityScope::AssignedTo(viewer.id),
        Role::Hod | Role::Principal | Role::Admin => VisibilityScope::All,
    }
}

/// Whether a single complaint is inside the viewer's visible set. Detail
/// fetches outside it must fail as not-found, never forbidden, so callers
/// cannot probe for existence.
pub fn can_view(viewer: &Viewer, student_id: Uuid, assigned_to: Option<Uuid>) -> bool {
    match scope_for(viewer) {
        VisibilityScope::All => true,
        VisibilityScope::OwnedBy(id) => student_id == id,
        VisibilityScope::AssignedTo(id) => assigned_to == Some(id),
    }
}

/// Whether the viewer gets the submitter's real identity on an anonymous
/// complaint. Identity is always stored; it is withheld at response-shaping
/// time for everyone but the owner and the oversight roles.
pub fn sees_submitter_identity(viewer: &Viewer, is_anonymous: bool, student_id: Uuid) -> bool {
    if !is_anonymous {
        return true;
    }
    viewer.id == student_id || matches!(viewer.role, Role::Admin | Role::Principal)
}
