//! Project id sets an actor can reach, used to scope list queries.
//!
//! The sets mirror the per-object predicates in [`crate::policy::project`]:
//! every id in [`ReadableProjects::open`] passes `can_view` with no viewcode,
//! and every id in [`ReadableProjects::link_gated`] passes it once the
//! project's link token is presented.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::policy::Actor;
use crate::store::Store;
use crate::types::Visibility;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadableProjects {
    pub open: BTreeSet<i64>,
    /// Link-protected projects reachable only with a matching viewcode.
    pub link_gated: BTreeSet<i64>,
}

impl ReadableProjects {
    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.open.contains(&id) || self.link_gated.contains(&id)
    }

    /// Every readable id, gated or not.
    #[must_use]
    pub fn all(&self) -> BTreeSet<i64> {
        self.open.union(&self.link_gated).copied().collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectScope {
    pub readable: ReadableProjects,
    pub writable: BTreeSet<i64>,
    pub manageable: BTreeSet<i64>,
}

pub fn readable_projects(store: &dyn Store, actor: &Actor) -> Result<ReadableProjects> {
    if actor.is_superuser() {
        return Ok(ReadableProjects {
            open: store.all_project_ids()?,
            link_gated: BTreeSet::new(),
        });
    }

    let mut open = store.project_ids_with_visibility(Visibility::Public)?;
    let mut link_gated = store.project_ids_with_visibility(Visibility::LinkProtected)?;

    if let Actor::User { id, username, .. } = actor {
        open.extend(store.created_project_ids(*id)?);
        open.extend(store.collaborating_project_ids(*id)?);
        open.extend(store.restricted_project_ids_listing(username)?);
    }

    // A creator or collaborator never needs the link token
    link_gated.retain(|id| !open.contains(id));

    Ok(ReadableProjects { open, link_gated })
}

pub fn writable_projects(store: &dyn Store, actor: &Actor) -> Result<BTreeSet<i64>> {
    match actor {
        Actor::Anonymous => Ok(BTreeSet::new()),
        Actor::User {
            is_superuser: true, ..
        } => store.all_project_ids(),
        Actor::User { id, .. } => {
            let mut ids = store.created_project_ids(*id)?;
            ids.extend(store.collaborating_project_ids(*id)?);
            Ok(ids)
        }
    }
}

pub fn manageable_projects(store: &dyn Store, actor: &Actor) -> Result<BTreeSet<i64>> {
    match actor {
        Actor::Anonymous => Ok(BTreeSet::new()),
        Actor::User {
            is_superuser: true, ..
        } => store.all_project_ids(),
        Actor::User { id, .. } => store.created_project_ids(*id),
    }
}

pub fn resolve(store: &dyn Store, actor: &Actor) -> Result<ProjectScope> {
    Ok(ProjectScope {
        readable: readable_projects(store, actor)?,
        writable: writable_projects(store, actor)?,
        manageable: manageable_projects(store, actor)?,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::policy::{Context, ProjectFacts, project};
    use crate::store::SqliteStore;
    use crate::types::{CollaboratorRole, NewProject, Project};

    struct Fixture {
        _temp: TempDir,
        store: SqliteStore,
        projects: Vec<Project>,
        alice: Actor,
        bob: Actor,
        carol: Actor,
        root: Actor,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();

        let alice = store.create_user("alice", false).unwrap();
        let bob = store.create_user("bob", false).unwrap();
        let carol = store.create_user("carol", false).unwrap();
        let root = store.create_user("root", true).unwrap();

        let mut projects = Vec::new();
        for (role, value) in [
            (Visibility::Public, ""),
            (Visibility::Private, ""),
            (Visibility::RestrictedList, "bob,dave"),
            (Visibility::LinkProtected, "tok123"),
            (Visibility::Private, ""),
        ] {
            projects.push(
                store
                    .create_project(&NewProject {
                        name: format!("{role:?}"),
                        intro: String::new(),
                        role,
                        role_value: value.to_string(),
                        create_user: alice.id,
                    })
                    .unwrap(),
            );
        }
        store
            .upsert_collaborator(projects[4].id, bob.id, CollaboratorRole::Viewer)
            .unwrap();

        Fixture {
            _temp: temp,
            store,
            projects,
            alice: Actor::from(&alice),
            bob: Actor::from(&bob),
            carol: Actor::from(&carol),
            root: Actor::from(&root),
        }
    }

    fn facts<'a>(store: &SqliteStore, actor: &Actor, project: &'a Project) -> ProjectFacts<'a> {
        let collaborator = actor
            .id()
            .and_then(|id| store.get_collaborator_role(project.id, id).unwrap());
        ProjectFacts::new(project, collaborator)
    }

    #[test]
    fn test_open_set_agrees_with_view_predicate() {
        let f = fixture();
        for actor in [&Actor::Anonymous, &f.alice, &f.bob, &f.carol, &f.root] {
            let readable = readable_projects(&f.store, actor).unwrap();
            for p in &f.projects {
                let facts = facts(&f.store, actor, p);
                assert_eq!(
                    readable.open.contains(&p.id),
                    project::can_view(actor, &facts, &Context::default()),
                    "{actor:?} on project {}",
                    p.id
                );
                if readable.link_gated.contains(&p.id) {
                    let ctx = Context::with_viewcode(Some("tok123"));
                    assert!(project::can_view(actor, &facts, &ctx));
                }
            }
        }
    }

    #[test]
    fn test_anonymous_scope() {
        let f = fixture();
        let scope = resolve(&f.store, &Actor::Anonymous).unwrap();
        assert_eq!(scope.readable.open, BTreeSet::from([f.projects[0].id]));
        assert_eq!(scope.readable.link_gated, BTreeSet::from([f.projects[3].id]));
        assert!(scope.writable.is_empty());
        assert!(scope.manageable.is_empty());
    }

    #[test]
    fn test_collaborator_scope() {
        let f = fixture();
        let scope = resolve(&f.store, &f.bob).unwrap();
        assert!(scope.readable.contains(f.projects[2].id));
        assert!(scope.readable.contains(f.projects[4].id));
        assert!(!scope.readable.contains(f.projects[1].id));
        assert_eq!(scope.writable, BTreeSet::from([f.projects[4].id]));
        assert!(scope.manageable.is_empty());
    }

    #[test]
    fn test_creator_and_superuser_scope() {
        let f = fixture();
        let every: BTreeSet<i64> = f.projects.iter().map(|p| p.id).collect();

        let owner = resolve(&f.store, &f.alice).unwrap();
        assert_eq!(owner.readable.open, every);
        assert!(owner.readable.link_gated.is_empty());
        assert_eq!(owner.manageable, every);

        let root = resolve(&f.store, &f.root).unwrap();
        assert_eq!(root.readable.all(), every);
        assert_eq!(root.writable, every);
        assert_eq!(root.manageable, every);
    }
}
