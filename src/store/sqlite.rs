use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Params, Row, Transaction, params, params_from_iter};
use uuid::Uuid;

use super::names::normalize_tag_names;
use super::schema::SCHEMA;
use super::tree::{Placement, TreeRow, find_cycle};
use super::{DocQuery, Store};
use crate::error::{Error, Result};
use crate::types::*;

const USER_COLUMNS: &str = "id, username, is_superuser, created_at, updated_at";
const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at";
const PROJECT_COLUMNS: &str =
    "id, name, intro, role, role_value, create_user, create_time, modify_time";
const DOC_COLUMNS: &str = "id, name, content, pre_content, parent_doc, top_doc, sort, status, \
     editor_mode, open_children, show_children, create_user, create_time, modify_time";
const SHARE_COLUMNS: &str = "doc_id, token, share_type, share_value, is_enable, create_time";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn id_values(ids: &[i64]) -> Vec<Value> {
    ids.iter().map(|&id| Value::Integer(id)).collect()
}

/// Reads an integer code column into one of the enum types.
fn code_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: TryFrom<i64, Error = UnknownCode>,
{
    let raw: i64 = row.get(idx)?;
    T::try_from(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        is_superuser: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        updated_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        user_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        expires_at: row.get::<_, Option<String>>(5)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        intro: row.get(2)?,
        role: code_column(row, 3)?,
        role_value: row.get(4)?,
        create_user: row.get(5)?,
        create_time: parse_datetime(&row.get::<_, String>(6)?),
        modify_time: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn doc_from_row(row: &Row<'_>) -> rusqlite::Result<Doc> {
    Ok(Doc {
        id: row.get(0)?,
        name: row.get(1)?,
        content: row.get(2)?,
        pre_content: row.get(3)?,
        parent_doc: row.get(4)?,
        top_doc: row.get(5)?,
        sort: row.get(6)?,
        status: code_column(row, 7)?,
        editor_mode: row.get(8)?,
        open_children: row.get(9)?,
        show_children: row.get(10)?,
        create_user: row.get(11)?,
        create_time: parse_datetime(&row.get::<_, String>(12)?),
        modify_time: parse_datetime(&row.get::<_, String>(13)?),
    })
}

fn share_from_row(row: &Row<'_>) -> rusqlite::Result<DocShare> {
    Ok(DocShare {
        doc_id: row.get(0)?,
        token: row.get(1)?,
        share_type: code_column(row, 2)?,
        share_value: row.get(3)?,
        is_enable: row.get(4)?,
        create_time: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn query_ids<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<BTreeSet<i64>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| row.get::<_, i64>(0))?;
    rows.collect::<std::result::Result<BTreeSet<_>, _>>()
        .map_err(Error::from)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Checks that `parent` can hold `doc_id` inside `project_id`: the parent
/// must live in the same project and must not sit below the doc itself.
fn ensure_parent(
    tx: &Transaction<'_>,
    project_id: i64,
    doc_id: Option<i64>,
    parent: i64,
) -> Result<()> {
    let mut seen = HashSet::new();
    let mut current = parent;

    while current != 0 {
        if let Some(id) = doc_id.filter(|&id| id == current) {
            return Err(Error::ParentLoop(id));
        }
        if !seen.insert(current) {
            return Err(Error::InvalidTree(format!(
                "doc {current} is part of a parent cycle"
            )));
        }

        let link: Option<(i64, i64)> = tx
            .query_row(
                "SELECT top_doc, parent_doc FROM docs WHERE id = ?1",
                params![current],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match link {
            Some((top_doc, next)) if top_doc == project_id => current = next,
            _ => {
                return Err(Error::ParentOutsideProject {
                    parent,
                    project: project_id,
                });
            }
        }
    }

    Ok(())
}

fn doc_tags(conn: &Connection, doc_id: i64) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name FROM tags t
         INNER JOIN doc_tags dt ON t.id = dt.tag_id
         WHERE dt.doc_id = ?1
         ORDER BY t.name",
    )?;
    let rows = stmt.query_map(params![doc_id], tag_from_row)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, username: &str, is_superuser: bool) -> Result<User> {
        let now = Utc::now();
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO users (username, is_superuser, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![username, is_superuser, format_datetime(&now)],
        );

        match result {
            Ok(_) => Ok(User {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                is_superuser,
                created_at: now,
                updated_at: now,
            }),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self, cursor: i64, limit: i32) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], user_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn has_superuser(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE is_superuser = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.user_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::TokenLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
            params![lookup],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_user_tokens(&self, user_id: i64) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE user_id = ?1 ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![user_id], token_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Project operations

    fn create_project(&self, project: &NewProject) -> Result<Project> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO projects (name, intro, role, role_value, create_user, create_time, modify_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                project.name,
                project.intro,
                project.role.code(),
                project.role_value,
                project.create_user,
                format_datetime(&now),
            ],
        )?;

        Ok(Project {
            id: conn.last_insert_rowid(),
            name: project.name.clone(),
            intro: project.intro.clone(),
            role: project.role,
            role_value: project.role_value.clone(),
            create_user: project.create_user,
            create_time: now,
            modify_time: now,
        })
    }

    fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![id],
            project_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_projects(
        &self,
        ids: &[i64],
        name_contains: Option<&str>,
        cursor: i64,
        limit: i32,
    ) -> Result<Vec<Project>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id IN ({}) AND id > ?",
            placeholders(ids.len())
        );
        let mut values = id_values(ids);
        values.push(Value::Integer(cursor));

        if let Some(q) = name_contains.filter(|q| !q.is_empty()) {
            sql.push_str(" AND instr(lower(name), lower(?)) > 0");
            values.push(Value::Text(q.to_string()));
        }
        sql.push_str(" ORDER BY id LIMIT ?");
        values.push(Value::Integer(i64::from(limit)));

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), project_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_project(&self, project: &Project) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE projects SET name = ?1, intro = ?2, role = ?3, role_value = ?4, modify_time = ?5
             WHERE id = ?6",
            params![
                project.name,
                project.intro,
                project.role.code(),
                project.role_value,
                format_datetime(&project.modify_time),
                project.id,
            ],
        )?;
        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_project(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn count_project_docs(&self, id: i64) -> Result<i64> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM docs WHERE top_doc = ?1 AND status <> 3",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // Collaborator operations

    fn upsert_collaborator(
        &self,
        project_id: i64,
        user_id: i64,
        role: CollaboratorRole,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO project_collaborators (project_id, user_id, role, create_time)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(project_id, user_id) DO UPDATE SET role = excluded.role",
            params![
                project_id,
                user_id,
                role.code(),
                format_datetime(&Utc::now())
            ],
        )?;
        Ok(())
    }

    fn remove_collaborator(&self, project_id: i64, user_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM project_collaborators WHERE project_id = ?1 AND user_id = ?2",
            params![project_id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn get_collaborator_role(
        &self,
        project_id: i64,
        user_id: i64,
    ) -> Result<Option<CollaboratorRole>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT role FROM project_collaborators WHERE project_id = ?1 AND user_id = ?2",
            params![project_id, user_id],
            |row| code_column(row, 0),
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_collaborators(&self, project_id: i64) -> Result<Vec<Collaborator>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT pc.project_id, pc.user_id, u.username, pc.role, pc.create_time
             FROM project_collaborators pc
             INNER JOIN users u ON u.id = pc.user_id
             WHERE pc.project_id = ?1
             ORDER BY pc.create_time, pc.user_id",
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            Ok(Collaborator {
                project_id: row.get(0)?,
                user_id: row.get(1)?,
                username: row.get(2)?,
                role: code_column(row, 3)?,
                create_time: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Visibility resolver queries

    fn all_project_ids(&self) -> Result<BTreeSet<i64>> {
        query_ids(&self.conn(), "SELECT id FROM projects", [])
    }

    fn project_ids_with_visibility(&self, visibility: Visibility) -> Result<BTreeSet<i64>> {
        query_ids(
            &self.conn(),
            "SELECT id FROM projects WHERE role = ?1",
            params![visibility.code()],
        )
    }

    fn created_project_ids(&self, user_id: i64) -> Result<BTreeSet<i64>> {
        query_ids(
            &self.conn(),
            "SELECT id FROM projects WHERE create_user = ?1",
            params![user_id],
        )
    }

    fn collaborating_project_ids(&self, user_id: i64) -> Result<BTreeSet<i64>> {
        query_ids(
            &self.conn(),
            "SELECT project_id FROM project_collaborators WHERE user_id = ?1",
            params![user_id],
        )
    }

    fn restricted_project_ids_listing(&self, username: &str) -> Result<BTreeSet<i64>> {
        if username.is_empty() {
            return Ok(BTreeSet::new());
        }
        // instr is a case-sensitive substring test with no wildcard characters
        query_ids(
            &self.conn(),
            "SELECT id FROM projects
             WHERE role = ?1 AND role_value <> '' AND instr(role_value, ?2) > 0",
            params![Visibility::RestrictedList.code(), username],
        )
    }

    // Doc operations

    fn create_doc(&self, doc: &NewDoc) -> Result<Doc> {
        let now = Utc::now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let project_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1)",
            params![doc.top_doc],
            |row| row.get(0),
        )?;
        if !project_exists {
            return Err(Error::NotFound);
        }
        ensure_parent(&tx, doc.top_doc, None, doc.parent_doc)?;

        tx.execute(
            "INSERT INTO docs (name, content, pre_content, parent_doc, top_doc, sort, status,
                               editor_mode, open_children, show_children, create_user,
                               create_time, modify_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                doc.name,
                doc.content,
                doc.pre_content,
                doc.parent_doc,
                doc.top_doc,
                doc.sort,
                doc.status.code(),
                doc.editor_mode,
                doc.open_children,
                doc.show_children,
                doc.create_user,
                format_datetime(&now),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Doc {
            id,
            name: doc.name.clone(),
            content: doc.content.clone(),
            pre_content: doc.pre_content.clone(),
            parent_doc: doc.parent_doc,
            top_doc: doc.top_doc,
            sort: doc.sort,
            status: doc.status,
            editor_mode: doc.editor_mode,
            open_children: doc.open_children,
            show_children: doc.show_children,
            create_user: doc.create_user,
            create_time: now,
            modify_time: now,
        })
    }

    fn get_doc(&self, id: i64) -> Result<Option<Doc>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {DOC_COLUMNS} FROM docs WHERE id = ?1"),
            params![id],
            doc_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_docs(&self, query: &DocQuery, cursor: i64, limit: i32) -> Result<Vec<Doc>> {
        if query.project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = format!(
            "SELECT {DOC_COLUMNS} FROM docs WHERE top_doc IN ({}) AND id > ?",
            placeholders(query.project_ids.len())
        );
        let mut values = id_values(&query.project_ids);
        values.push(Value::Integer(cursor));

        if let Some(parent) = query.parent_doc {
            sql.push_str(" AND parent_doc = ?");
            values.push(Value::Integer(parent));
        }
        if let Some(q) = query.name_contains.as_deref().filter(|q| !q.is_empty()) {
            sql.push_str(" AND instr(lower(name), lower(?)) > 0");
            values.push(Value::Text(q.to_string()));
        }
        if !query.include_deleted {
            sql.push_str(" AND status <> 3");
        }
        if !query.all_drafts {
            match query.draft_owner {
                Some(owner) => {
                    sql.push_str(" AND (status <> 0 OR create_user = ?)");
                    values.push(Value::Integer(owner));
                }
                None => sql.push_str(" AND status <> 0"),
            }
        }
        sql.push_str(" ORDER BY id LIMIT ?");
        values.push(Value::Integer(i64::from(limit)));

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), doc_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_doc(&self, id: i64, changes: &DocChanges, editor: i64) -> Result<Doc> {
        let now = Utc::now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut doc = tx
            .query_row(
                &format!("SELECT {DOC_COLUMNS} FROM docs WHERE id = ?1"),
                params![id],
                doc_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        if let Some(parent) = changes.parent_doc {
            if parent != doc.parent_doc {
                ensure_parent(&tx, doc.top_doc, Some(id), parent)?;
            }
        }

        // Snapshot the stored source before anything changes
        tx.execute(
            "INSERT INTO doc_history (doc_id, pre_content, create_user, create_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, doc.pre_content, editor, format_datetime(&now)],
        )?;

        if let Some(name) = &changes.name {
            doc.name = name.clone();
        }
        if let Some(content) = &changes.content {
            doc.content = content.clone();
        }
        if let Some(pre_content) = &changes.pre_content {
            doc.pre_content = pre_content.clone();
        }
        if let Some(parent) = changes.parent_doc {
            doc.parent_doc = parent;
        }
        if let Some(sort) = changes.sort {
            doc.sort = sort;
        }
        if let Some(status) = changes.status {
            doc.status = status;
        }
        if let Some(mode) = changes.editor_mode {
            doc.editor_mode = mode;
        }
        if let Some(open) = changes.open_children {
            doc.open_children = open;
        }
        if let Some(show) = changes.show_children {
            doc.show_children = show;
        }
        doc.modify_time = now;

        tx.execute(
            "UPDATE docs SET name = ?1, content = ?2, pre_content = ?3, parent_doc = ?4,
                             sort = ?5, status = ?6, editor_mode = ?7, open_children = ?8,
                             show_children = ?9, modify_time = ?10
             WHERE id = ?11",
            params![
                doc.name,
                doc.content,
                doc.pre_content,
                doc.parent_doc,
                doc.sort,
                doc.status.code(),
                doc.editor_mode,
                doc.open_children,
                doc.show_children,
                format_datetime(&now),
                id,
            ],
        )?;

        tx.commit()?;
        Ok(doc)
    }

    fn soft_delete_doc(&self, id: i64) -> Result<()> {
        let now = format_datetime(&Utc::now());
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let project_id: i64 = tx
            .query_row(
                "SELECT top_doc FROM docs WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        // Rows already deleted keep their original modify_time
        tx.execute(
            "UPDATE docs
             SET modify_time = CASE WHEN status = 3 THEN modify_time ELSE ?1 END, status = 3
             WHERE id = ?2",
            params![now, id],
        )?;
        tx.execute(
            "UPDATE docs
             SET modify_time = CASE WHEN status = 3 THEN modify_time ELSE ?1 END, status = 3
             WHERE parent_doc = ?2 AND top_doc = ?3",
            params![now, id, project_id],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn list_doc_history(&self, doc_id: i64) -> Result<Vec<DocHistory>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, doc_id, pre_content, create_user, create_time
             FROM doc_history WHERE doc_id = ?1 ORDER BY id DESC",
        )?;

        let rows = stmt.query_map(params![doc_id], |row| {
            Ok(DocHistory {
                id: row.get(0)?,
                doc_id: row.get(1)?,
                pre_content: row.get(2)?,
                create_user: row.get(3)?,
                create_time: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Tree operations

    fn list_tree_rows(&self, project_id: i64) -> Result<Vec<TreeRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, parent_doc, sort FROM docs
             WHERE top_doc = ?1 AND status <> 3",
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            Ok(TreeRow {
                id: row.get(0)?,
                name: row.get(1)?,
                parent_doc: row.get(2)?,
                sort: row.get(3)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_project_toc(&self, project_id: i64) -> Result<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT value FROM project_tocs WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
    }

    fn apply_tree(&self, project_id: i64, placements: &[Placement], raw: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let members = query_ids(
            &tx,
            "SELECT id FROM docs WHERE top_doc = ?1",
            params![project_id],
        )?;

        // Ids from other projects are ignored, but a parent outside the
        // project would graft a foreign subtree and aborts the whole tree.
        let local: Vec<&Placement> = placements
            .iter()
            .filter(|p| members.contains(&p.id))
            .collect();
        if let Some(p) = local
            .iter()
            .find(|p| p.parent_doc != 0 && !members.contains(&p.parent_doc))
        {
            return Err(Error::InvalidTree(format!(
                "parent doc {} does not belong to project {project_id}",
                p.parent_doc
            )));
        }

        for p in &local {
            tx.execute(
                "UPDATE docs SET parent_doc = ?1, sort = ?2 WHERE id = ?3 AND top_doc = ?4",
                params![p.parent_doc, p.sort, p.id, project_id],
            )?;
        }

        let links = {
            let mut stmt = tx.prepare("SELECT id, parent_doc FROM docs WHERE top_doc = ?1")?;
            let rows = stmt.query_map(params![project_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<std::result::Result<Vec<(i64, i64)>, _>>()?
        };
        if let Some(id) = find_cycle(&links) {
            return Err(Error::InvalidTree(format!(
                "doc {id} would become its own ancestor"
            )));
        }

        tx.execute(
            "INSERT INTO project_tocs (project_id, value, modify_time) VALUES (?1, ?2, ?3)
             ON CONFLICT(project_id) DO UPDATE SET value = excluded.value,
                                                    modify_time = excluded.modify_time",
            params![project_id, raw, format_datetime(&Utc::now())],
        )?;

        tx.commit()?;
        Ok(())
    }

    // Tag operations

    fn list_tags(&self, name_contains: Option<&str>, cursor: i64, limit: i32) -> Result<Vec<Tag>> {
        let mut sql = "SELECT id, name FROM tags WHERE id > ?".to_string();
        let mut values = vec![Value::Integer(cursor)];
        if let Some(q) = name_contains.filter(|q| !q.is_empty()) {
            sql.push_str(" AND instr(lower(name), lower(?)) > 0");
            values.push(Value::Text(q.to_string()));
        }
        sql.push_str(" ORDER BY id LIMIT ?");
        values.push(Value::Integer(i64::from(limit)));

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), tag_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_tag(&self, id: i64) -> Result<Option<Tag>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name FROM tags WHERE id = ?1",
            params![id],
            tag_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_doc_tags(&self, doc_id: i64) -> Result<Vec<Tag>> {
        doc_tags(&self.conn(), doc_id)
    }

    fn list_tag_docs(&self, tag_id: i64, project_ids: &[i64]) -> Result<Vec<Doc>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let columns = DOC_COLUMNS
            .split(", ")
            .map(|c| format!("d.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {columns} FROM docs d
             INNER JOIN doc_tags dt ON d.id = dt.doc_id
             WHERE dt.tag_id = ? AND d.status <> 3 AND d.top_doc IN ({})
             ORDER BY d.id",
            placeholders(project_ids.len())
        );
        let mut values = vec![Value::Integer(tag_id)];
        values.extend(id_values(project_ids));

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), doc_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn reconcile_doc_tags(&self, doc_id: i64, names: &[String], user_id: i64) -> Result<Vec<Tag>> {
        let names = normalize_tag_names(names);
        let now = format_datetime(&Utc::now());
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let doc_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM docs WHERE id = ?1)",
            params![doc_id],
            |row| row.get(0),
        )?;
        if !doc_exists {
            return Err(Error::NotFound);
        }

        let mut keep = Vec::with_capacity(names.len());
        for name in &names {
            tx.execute(
                "INSERT OR IGNORE INTO tags (name, create_user, create_time) VALUES (?1, ?2, ?3)",
                params![name, user_id, now],
            )?;
            let tag_id: i64 = tx.query_row(
                "SELECT id FROM tags WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO doc_tags (doc_id, tag_id) VALUES (?1, ?2)",
                params![doc_id, tag_id],
            )?;
            keep.push(tag_id);
        }

        if keep.is_empty() {
            tx.execute("DELETE FROM doc_tags WHERE doc_id = ?1", params![doc_id])?;
        } else {
            let sql = format!(
                "DELETE FROM doc_tags WHERE doc_id = ? AND tag_id NOT IN ({})",
                placeholders(keep.len())
            );
            let mut values = vec![Value::Integer(doc_id)];
            values.extend(id_values(&keep));
            tx.execute(&sql, params_from_iter(values))?;
        }

        let tags = doc_tags(&tx, doc_id)?;
        tx.commit()?;
        Ok(tags)
    }

    // Share operations

    fn upsert_doc_share(&self, doc_id: i64, settings: &ShareSettings) -> Result<DocShare> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        // The token is minted once; later updates keep the existing one
        tx.execute(
            "INSERT INTO doc_shares (doc_id, token, share_type, share_value, is_enable, create_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(doc_id) DO UPDATE SET share_type = excluded.share_type,
                                                share_value = excluded.share_value,
                                                is_enable = excluded.is_enable",
            params![
                doc_id,
                Uuid::new_v4().simple().to_string(),
                settings.share_type.code(),
                settings.share_value,
                settings.is_enable,
                format_datetime(&Utc::now()),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                Error::NotFound
            } else {
                Error::from(e)
            }
        })?;

        let share = tx.query_row(
            &format!("SELECT {SHARE_COLUMNS} FROM doc_shares WHERE doc_id = ?1"),
            params![doc_id],
            share_from_row,
        )?;
        tx.commit()?;
        Ok(share)
    }

    fn get_doc_share(&self, doc_id: i64) -> Result<Option<DocShare>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SHARE_COLUMNS} FROM doc_shares WHERE doc_id = ?1"),
            params![doc_id],
            share_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_doc_share_by_token(&self, token: &str) -> Result<Option<DocShare>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SHARE_COLUMNS} FROM doc_shares WHERE token = ?1"),
            params![token],
            share_from_row,
        )
        .optional()
        .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tree::plan_placements;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn new_project(store: &SqliteStore, owner: i64, role: Visibility, role_value: &str) -> Project {
        store
            .create_project(&NewProject {
                name: "handbook".to_string(),
                intro: String::new(),
                role,
                role_value: role_value.to_string(),
                create_user: owner,
            })
            .unwrap()
    }

    fn new_doc(store: &SqliteStore, project: i64, parent: i64, author: i64) -> Doc {
        store
            .create_doc(&NewDoc {
                name: "page".to_string(),
                content: "<p>v1</p>".to_string(),
                pre_content: "v1".to_string(),
                parent_doc: parent,
                top_doc: project,
                sort: 0,
                status: DocStatus::Published,
                editor_mode: 1,
                open_children: false,
                show_children: false,
                create_user: author,
            })
            .unwrap()
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = setup();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "users",
            "tokens",
            "projects",
            "project_collaborators",
            "docs",
            "doc_history",
            "tags",
            "doc_tags",
            "doc_shares",
            "project_tocs",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_user_crud() {
        let (_temp, store) = setup();

        let alice = store.create_user("alice", false).unwrap();
        assert_eq!(store.get_user(alice.id).unwrap().unwrap().username, "alice");
        assert_eq!(
            store.get_user_by_username("alice").unwrap().unwrap().id,
            alice.id
        );
        assert!(!store.has_superuser().unwrap());

        assert!(matches!(
            store.create_user("alice", true),
            Err(Error::AlreadyExists)
        ));

        store.create_user("root", true).unwrap();
        assert!(store.has_superuser().unwrap());
        assert_eq!(store.list_users(0, 10).unwrap().len(), 2);
        assert_eq!(store.list_users(alice.id, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_token_lookup_collision() {
        let (_temp, store) = setup();
        let user = store.create_user("alice", false).unwrap();

        let token1 = Token {
            id: "token-1".to_string(),
            token_hash: "hash1".to_string(),
            token_lookup: "lookup12".to_string(),
            user_id: user.id,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
        };
        store.create_token(&token1).unwrap();

        let token2 = Token {
            id: "token-2".to_string(),
            token_hash: "hash2".to_string(),
            token_lookup: "lookup12".to_string(), // Same lookup
            ..token1.clone()
        };

        let result = store.create_token(&token2);
        assert!(matches!(result, Err(Error::TokenLookupCollision)));
        assert_eq!(store.list_user_tokens(user.id).unwrap().len(), 1);
    }

    #[test]
    fn test_resolver_queries() {
        let (_temp, store) = setup();
        let alice = store.create_user("alice", false).unwrap();
        let bob = store.create_user("bob", false).unwrap();

        let public = new_project(&store, alice.id, Visibility::Public, "");
        let private = new_project(&store, alice.id, Visibility::Private, "");
        let listed = new_project(&store, alice.id, Visibility::RestrictedList, "carol,bob");
        let empty_list = new_project(&store, alice.id, Visibility::RestrictedList, "");
        store
            .upsert_collaborator(private.id, bob.id, CollaboratorRole::Viewer)
            .unwrap();

        assert_eq!(store.all_project_ids().unwrap().len(), 4);
        assert_eq!(
            store
                .project_ids_with_visibility(Visibility::Public)
                .unwrap(),
            BTreeSet::from([public.id])
        );
        assert_eq!(store.created_project_ids(bob.id).unwrap(), BTreeSet::new());
        assert_eq!(
            store.collaborating_project_ids(bob.id).unwrap(),
            BTreeSet::from([private.id])
        );

        let listing = store.restricted_project_ids_listing("bob").unwrap();
        assert_eq!(listing, BTreeSet::from([listed.id]));
        assert!(!listing.contains(&empty_list.id));
        assert!(store.restricted_project_ids_listing("").unwrap().is_empty());
        assert!(store.restricted_project_ids_listing("Bob").unwrap().is_empty());
    }

    #[test]
    fn test_collaborator_upsert_replaces_role() {
        let (_temp, store) = setup();
        let alice = store.create_user("alice", false).unwrap();
        let bob = store.create_user("bob", false).unwrap();
        let project = new_project(&store, alice.id, Visibility::Private, "");

        store
            .upsert_collaborator(project.id, bob.id, CollaboratorRole::Viewer)
            .unwrap();
        store
            .upsert_collaborator(project.id, bob.id, CollaboratorRole::Editor)
            .unwrap();

        let list = store.list_collaborators(project.id).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].username, "bob");
        assert_eq!(
            store.get_collaborator_role(project.id, bob.id).unwrap(),
            Some(CollaboratorRole::Editor)
        );

        assert!(store.remove_collaborator(project.id, bob.id).unwrap());
        assert!(!store.remove_collaborator(project.id, bob.id).unwrap());
    }

    #[test]
    fn test_update_records_previous_source() {
        let (_temp, store) = setup();
        let alice = store.create_user("alice", false).unwrap();
        let bob = store.create_user("bob", false).unwrap();
        let project = new_project(&store, alice.id, Visibility::Public, "");
        let doc = new_doc(&store, project.id, 0, alice.id);

        let changes = DocChanges {
            pre_content: Some("v2".to_string()),
            ..Default::default()
        };
        let updated = store.update_doc(doc.id, &changes, bob.id).unwrap();
        assert_eq!(updated.pre_content, "v2");
        assert_eq!(updated.name, "page");

        let history = store.list_doc_history(doc.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].pre_content, "v1");
        assert_eq!(history[0].create_user, bob.id);

        // A no-op edit still leaves a snapshot
        store
            .update_doc(doc.id, &DocChanges::default(), alice.id)
            .unwrap();
        let history = store.list_doc_history(doc.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].pre_content, "v2");
    }

    #[test]
    fn test_update_rejects_parent_outside_project() {
        let (_temp, store) = setup();
        let alice = store.create_user("alice", false).unwrap();
        let first = new_project(&store, alice.id, Visibility::Public, "");
        let second = new_project(&store, alice.id, Visibility::Public, "");
        let doc = new_doc(&store, first.id, 0, alice.id);
        let child = new_doc(&store, first.id, doc.id, alice.id);
        let foreign = new_doc(&store, second.id, 0, alice.id);

        let to_foreign = DocChanges {
            parent_doc: Some(foreign.id),
            ..Default::default()
        };
        assert!(matches!(
            store.update_doc(doc.id, &to_foreign, alice.id),
            Err(Error::ParentOutsideProject { .. })
        ));

        let below_child = DocChanges {
            parent_doc: Some(child.id),
            ..Default::default()
        };
        assert!(matches!(
            store.update_doc(doc.id, &below_child, alice.id),
            Err(Error::ParentLoop(id)) if id == doc.id
        ));

        // Rejected updates leave no history behind
        assert!(store.list_doc_history(doc.id).unwrap().is_empty());
    }

    #[test]
    fn test_soft_delete_cascades_one_level() {
        let (_temp, store) = setup();
        let alice = store.create_user("alice", false).unwrap();
        let project = new_project(&store, alice.id, Visibility::Public, "");
        let parent = new_doc(&store, project.id, 0, alice.id);
        let child = new_doc(&store, project.id, parent.id, alice.id);
        let grandchild = new_doc(&store, project.id, child.id, alice.id);
        let sibling = new_doc(&store, project.id, 0, alice.id);

        store.soft_delete_doc(parent.id).unwrap();
        let status = |id| store.get_doc(id).unwrap().unwrap().status;
        assert_eq!(status(parent.id), DocStatus::Deleted);
        assert_eq!(status(child.id), DocStatus::Deleted);
        assert_eq!(status(grandchild.id), DocStatus::Published);
        assert_eq!(status(sibling.id), DocStatus::Published);

        let first_time = store.get_doc(parent.id).unwrap().unwrap().modify_time;
        store.soft_delete_doc(parent.id).unwrap();
        assert_eq!(status(parent.id), DocStatus::Deleted);
        assert_eq!(
            store.get_doc(parent.id).unwrap().unwrap().modify_time,
            first_time
        );

        assert!(matches!(store.soft_delete_doc(9999), Err(Error::NotFound)));
    }

    #[test]
    fn test_list_docs_hides_drafts_and_deleted() {
        let (_temp, store) = setup();
        let alice = store.create_user("alice", false).unwrap();
        let bob = store.create_user("bob", false).unwrap();
        let project = new_project(&store, alice.id, Visibility::Public, "");
        let published = new_doc(&store, project.id, 0, alice.id);
        let draft = new_doc(&store, project.id, 0, bob.id);
        store
            .update_doc(
                draft.id,
                &DocChanges {
                    status: Some(DocStatus::Draft),
                    ..Default::default()
                },
                bob.id,
            )
            .unwrap();
        let gone = new_doc(&store, project.id, 0, alice.id);
        store.soft_delete_doc(gone.id).unwrap();

        let ids = |query: DocQuery| -> Vec<i64> {
            store
                .list_docs(&query, 0, 50)
                .unwrap()
                .into_iter()
                .map(|d| d.id)
                .collect()
        };
        let base = DocQuery {
            project_ids: vec![project.id],
            ..Default::default()
        };

        assert_eq!(ids(base.clone()), vec![published.id]);
        assert_eq!(
            ids(DocQuery {
                draft_owner: Some(bob.id),
                ..base.clone()
            }),
            vec![published.id, draft.id]
        );
        assert_eq!(
            ids(DocQuery {
                draft_owner: Some(alice.id),
                ..base.clone()
            }),
            vec![published.id]
        );
        assert_eq!(
            ids(DocQuery {
                all_drafts: true,
                include_deleted: true,
                ..base.clone()
            }),
            vec![published.id, draft.id, gone.id]
        );
        assert!(ids(DocQuery::default()).is_empty());
    }

    #[test]
    fn test_apply_tree_updates_rows_and_cache() {
        let (_temp, store) = setup();
        let alice = store.create_user("alice", false).unwrap();
        let project = new_project(&store, alice.id, Visibility::Public, "");
        let other = new_project(&store, alice.id, Visibility::Public, "");
        let a = new_doc(&store, project.id, 0, alice.id);
        let b = new_doc(&store, project.id, 0, alice.id);
        let foreign = new_doc(&store, other.id, 0, alice.id);

        let payload = json!([
            {"id": b.id, "name": "b", "children": [{"id": a.id, "name": "a"}]},
            {"id": foreign.id, "name": "stray"}
        ]);
        let placements = plan_placements(&payload, 64).unwrap();
        store
            .apply_tree(project.id, &placements, &payload.to_string())
            .unwrap();

        let a_now = store.get_doc(a.id).unwrap().unwrap();
        assert_eq!(a_now.parent_doc, b.id);
        assert_eq!(a_now.sort, 0);
        let b_now = store.get_doc(b.id).unwrap().unwrap();
        assert_eq!((b_now.parent_doc, b_now.sort), (0, 0));

        // The foreign doc is untouched
        let foreign_now = store.get_doc(foreign.id).unwrap().unwrap();
        assert_eq!((foreign_now.top_doc, foreign_now.parent_doc), (other.id, 0));

        assert_eq!(
            store.get_project_toc(project.id).unwrap(),
            Some(payload.to_string())
        );

        // Last writer wins
        let second = json!([{"id": a.id}, {"id": b.id}]);
        let placements = plan_placements(&second, 64).unwrap();
        store
            .apply_tree(project.id, &placements, &second.to_string())
            .unwrap();
        assert_eq!(
            store.get_project_toc(project.id).unwrap(),
            Some(second.to_string())
        );
        assert_eq!(store.get_doc(a.id).unwrap().unwrap().parent_doc, 0);
    }

    #[test]
    fn test_apply_tree_rejects_foreign_parent_and_rolls_back() {
        let (_temp, store) = setup();
        let alice = store.create_user("alice", false).unwrap();
        let project = new_project(&store, alice.id, Visibility::Public, "");
        let other = new_project(&store, alice.id, Visibility::Public, "");
        let a = new_doc(&store, project.id, 0, alice.id);
        let b = new_doc(&store, project.id, 0, alice.id);
        let foreign = new_doc(&store, other.id, 0, alice.id);

        let payload = json!([
            {"id": b.id, "children": [{"id": a.id}]},
            {"id": foreign.id, "children": [{"id": 0}]}
        ]);
        let mut placements = plan_placements(&payload, 64).unwrap();
        placements.push(Placement {
            id: a.id,
            parent_doc: foreign.id,
            sort: 3,
        });

        assert!(matches!(
            store.apply_tree(project.id, &placements, "[]"),
            Err(Error::InvalidTree(_))
        ));
        assert_eq!(store.get_doc(a.id).unwrap().unwrap().parent_doc, 0);
        assert_eq!(store.get_project_toc(project.id).unwrap(), None);
    }

    #[test]
    fn test_apply_tree_rejects_cycle_through_unlisted_doc() {
        let (_temp, store) = setup();
        let alice = store.create_user("alice", false).unwrap();
        let project = new_project(&store, alice.id, Visibility::Public, "");
        let a = new_doc(&store, project.id, 0, alice.id);
        let b = new_doc(&store, project.id, a.id, alice.id);

        // b already sits below a; placing a below b closes a loop
        let placements = [Placement {
            id: a.id,
            parent_doc: b.id,
            sort: 0,
        }];
        assert!(matches!(
            store.apply_tree(project.id, &placements, "[]"),
            Err(Error::InvalidTree(_))
        ));
        assert_eq!(store.get_doc(a.id).unwrap().unwrap().parent_doc, 0);
    }

    #[test]
    fn test_reconcile_tags_is_exact_and_idempotent() {
        let (_temp, store) = setup();
        let alice = store.create_user("alice", false).unwrap();
        let project = new_project(&store, alice.id, Visibility::Public, "");
        let doc = new_doc(&store, project.id, 0, alice.id);
        let other = new_doc(&store, project.id, 0, alice.id);

        let names = |tags: Vec<Tag>| -> Vec<String> { tags.into_iter().map(|t| t.name).collect() };

        let tags = store
            .reconcile_doc_tags(
                doc.id,
                &["rust".to_string(), " api ".to_string(), "rust".to_string(), "".to_string()],
                alice.id,
            )
            .unwrap();
        assert_eq!(names(tags), vec!["api", "rust"]);

        store
            .reconcile_doc_tags(other.id, &["rust".to_string()], alice.id)
            .unwrap();

        let first = store
            .reconcile_doc_tags(doc.id, &["rust".to_string(), "guide".to_string()], alice.id)
            .unwrap();
        let again = store
            .reconcile_doc_tags(doc.id, &["rust".to_string(), "guide".to_string()], alice.id)
            .unwrap();
        assert_eq!(first, again);
        assert_eq!(names(again), vec!["guide", "rust"]);

        // Tags are global and never deleted by reconciliation
        let catalog = store.list_tags(None, 0, 50).unwrap();
        assert_eq!(catalog.len(), 3);
        let rust = catalog.iter().find(|t| t.name == "rust").unwrap();
        assert_eq!(
            store.list_tag_docs(rust.id, &[project.id]).unwrap().len(),
            2
        );

        store.reconcile_doc_tags(doc.id, &[], alice.id).unwrap();
        assert!(store.list_doc_tags(doc.id).unwrap().is_empty());
        assert_eq!(names(store.list_doc_tags(other.id).unwrap()), vec!["rust"]);

        assert!(matches!(
            store.reconcile_doc_tags(9999, &["x".to_string()], alice.id),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_share_token_is_stable_across_updates() {
        let (_temp, store) = setup();
        let alice = store.create_user("alice", false).unwrap();
        let project = new_project(&store, alice.id, Visibility::Private, "");
        let doc = new_doc(&store, project.id, 0, alice.id);

        let created = store
            .upsert_doc_share(
                doc.id,
                &ShareSettings {
                    share_type: ShareType::Open,
                    share_value: None,
                    is_enable: true,
                },
            )
            .unwrap();
        assert_eq!(created.token.len(), 32);

        let updated = store
            .upsert_doc_share(
                doc.id,
                &ShareSettings {
                    share_type: ShareType::Code,
                    share_value: Some("1234".to_string()),
                    is_enable: false,
                },
            )
            .unwrap();
        assert_eq!(updated.token, created.token);
        assert_eq!(updated.share_type, ShareType::Code);
        assert!(!updated.is_enable);

        let by_token = store
            .get_doc_share_by_token(&created.token)
            .unwrap()
            .unwrap();
        assert_eq!(by_token.doc_id, doc.id);
        assert!(store.get_doc_share_by_token("missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_project_removes_docs() {
        let (_temp, store) = setup();
        let alice = store.create_user("alice", false).unwrap();
        let project = new_project(&store, alice.id, Visibility::Public, "");
        let doc = new_doc(&store, project.id, 0, alice.id);
        assert_eq!(store.count_project_docs(project.id).unwrap(), 1);

        assert!(store.delete_project(project.id).unwrap());
        assert!(store.get_doc(doc.id).unwrap().is_none());
        assert!(!store.delete_project(project.id).unwrap());
    }
}
