use super::{Action, Actor, Context, ProjectFacts};
use crate::types::Visibility;

pub(crate) fn is_creator(actor: &Actor, facts: &ProjectFacts<'_>) -> bool {
    actor.is(facts.project.create_user)
}

fn is_collaborator(actor: &Actor, facts: &ProjectFacts<'_>) -> bool {
    actor.is_authenticated() && facts.collaborator.is_some()
}

/// RestrictedList membership: the username must occur in `role_value`.
fn is_listed(actor: &Actor, role_value: &str) -> bool {
    match actor.username() {
        Some(username) if !username.is_empty() && !role_value.is_empty() => {
            role_value.contains(username)
        }
        _ => false,
    }
}

fn viewcode_matches(role_value: &str, viewcode: Option<&str>) -> bool {
    matches!(viewcode, Some(code) if !code.is_empty() && code == role_value)
}

#[must_use]
pub fn can_view(actor: &Actor, facts: &ProjectFacts<'_>, ctx: &Context<'_>) -> bool {
    if actor.is_superuser() || is_creator(actor, facts) || is_collaborator(actor, facts) {
        return true;
    }

    let project = facts.project;
    match project.role {
        Visibility::Public => true,
        Visibility::Private => false,
        Visibility::RestrictedList => is_listed(actor, &project.role_value),
        Visibility::LinkProtected => viewcode_matches(&project.role_value, ctx.viewcode),
    }
}

/// Create, update and delete of project content and settings.
#[must_use]
pub fn can_write(actor: &Actor, facts: &ProjectFacts<'_>) -> bool {
    actor.is_authenticated()
        && (actor.is_superuser() || is_creator(actor, facts) || is_collaborator(actor, facts))
}

/// Visibility changes, collaborator management and project deletion.
/// Collaborators never qualify, whatever their role.
#[must_use]
pub fn can_manage(actor: &Actor, facts: &ProjectFacts<'_>) -> bool {
    actor.is_authenticated() && (actor.is_superuser() || is_creator(actor, facts))
}

#[must_use]
pub fn allows(actor: &Actor, facts: &ProjectFacts<'_>, action: Action, ctx: &Context<'_>) -> bool {
    match action {
        Action::View => can_view(actor, facts, ctx),
        Action::Create | Action::Update | Action::Delete => can_write(actor, facts),
        Action::Manage => can_manage(actor, facts),
    }
}
