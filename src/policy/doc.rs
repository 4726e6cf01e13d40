use super::{Action, Actor, Context, ProjectFacts, project};
use crate::types::{CollaboratorRole, Doc, DocStatus};

/// Facts about the doc's own project, or `None` if the project is gone or
/// the supplied facts belong to a different project.
fn owning<'a>(doc: &Doc, facts: Option<&'a ProjectFacts<'a>>) -> Option<&'a ProjectFacts<'a>> {
    facts.filter(|f| f.project.id == doc.top_doc)
}

/// Shared precedence for update and delete:
/// project creator, doc creator, then the collaborator role.
fn can_modify(actor: &Actor, doc: &Doc, facts: Option<&ProjectFacts<'_>>) -> bool {
    if !actor.is_authenticated() {
        return false;
    }
    if actor.is_superuser() {
        return true;
    }

    let Some(facts) = owning(doc, facts) else {
        return false;
    };

    if project::is_creator(actor, facts) {
        return true;
    }

    let is_author = actor.is(doc.create_user);
    match facts.collaborator {
        Some(CollaboratorRole::Editor) => true,
        Some(CollaboratorRole::Viewer) => is_author,
        None => is_author,
    }
}

#[must_use]
pub fn can_view(
    actor: &Actor,
    doc: &Doc,
    facts: Option<&ProjectFacts<'_>>,
    ctx: &Context<'_>,
) -> bool {
    if actor.is_superuser() {
        return true;
    }

    // Drafts stay private to their author, even against the project owner.
    if doc.status == DocStatus::Draft {
        return actor.is(doc.create_user);
    }

    match owning(doc, facts) {
        Some(facts) => project::can_view(actor, facts, ctx),
        None => false,
    }
}

/// Creating a doc inside the given project.
#[must_use]
pub fn can_create(actor: &Actor, facts: &ProjectFacts<'_>) -> bool {
    project::can_write(actor, facts)
}

#[must_use]
pub fn can_update(actor: &Actor, doc: &Doc, facts: Option<&ProjectFacts<'_>>) -> bool {
    can_modify(actor, doc, facts)
}

/// An editor may delete any doc in the project; a viewer only their own.
#[must_use]
pub fn can_delete(actor: &Actor, doc: &Doc, facts: Option<&ProjectFacts<'_>>) -> bool {
    can_modify(actor, doc, facts)
}

#[must_use]
pub fn can_manage(actor: &Actor, doc: &Doc, facts: Option<&ProjectFacts<'_>>) -> bool {
    match owning(doc, facts) {
        Some(facts) => project::can_manage(actor, facts),
        None => actor.is_superuser(),
    }
}

#[must_use]
pub fn allows(
    actor: &Actor,
    doc: &Doc,
    facts: Option<&ProjectFacts<'_>>,
    action: Action,
    ctx: &Context<'_>,
) -> bool {
    match action {
        Action::View => can_view(actor, doc, facts, ctx),
        Action::Create => owning(doc, facts).is_some_and(|f| can_create(actor, f)),
        Action::Update => can_update(actor, doc, facts),
        Action::Delete => can_delete(actor, doc, facts),
        Action::Manage => can_manage(actor, doc, facts),
    }
}
