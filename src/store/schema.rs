pub const SCHEMA: &str = r#"
-- Users are the actors behind every request
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    is_superuser INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Tokens are auth credentials bound to a user
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,          -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,        -- first 8 chars of a UUID for fast lookup
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,                   -- NULL = never
    last_used_at TEXT
);

-- Projects own their docs
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    intro TEXT NOT NULL DEFAULT '',

    -- Visibility: 0 public, 1 private, 2 username allowlist, 3 link token
    role INTEGER NOT NULL DEFAULT 0,
    role_value TEXT NOT NULL DEFAULT '',

    create_user INTEGER NOT NULL REFERENCES users(id),
    create_time TEXT DEFAULT (datetime('now')),
    modify_time TEXT DEFAULT (datetime('now'))
);

-- Collaborator grants: 0 viewer, 1 editor
CREATE TABLE IF NOT EXISTS project_collaborators (
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    role INTEGER NOT NULL DEFAULT 0,
    create_time TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (project_id, user_id)
);

-- Docs form a forest per project: parent_doc = 0 at the top level
CREATE TABLE IF NOT EXISTS docs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    pre_content TEXT NOT NULL DEFAULT '',
    parent_doc INTEGER NOT NULL DEFAULT 0,
    top_doc INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    sort INTEGER NOT NULL DEFAULT 0,

    -- 0 draft, 1 published, 2 reserved, 3 deleted
    status INTEGER NOT NULL DEFAULT 1,

    editor_mode INTEGER NOT NULL DEFAULT 1,
    open_children INTEGER NOT NULL DEFAULT 0,
    show_children INTEGER NOT NULL DEFAULT 0,
    create_user INTEGER NOT NULL REFERENCES users(id),
    create_time TEXT DEFAULT (datetime('now')),
    modify_time TEXT DEFAULT (datetime('now'))
);

-- Append-only snapshots taken before each doc update
CREATE TABLE IF NOT EXISTS doc_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    doc_id INTEGER NOT NULL REFERENCES docs(id) ON DELETE CASCADE,
    pre_content TEXT NOT NULL DEFAULT '',
    create_user INTEGER NOT NULL REFERENCES users(id),
    create_time TEXT DEFAULT (datetime('now'))
);

-- Global tag catalog
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    create_user INTEGER REFERENCES users(id) ON DELETE SET NULL,
    create_time TEXT DEFAULT (datetime('now'))
);

-- Many-to-many relationship between docs and tags
CREATE TABLE IF NOT EXISTS doc_tags (
    doc_id INTEGER NOT NULL REFERENCES docs(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (doc_id, tag_id)
);

-- One share configuration per doc
CREATE TABLE IF NOT EXISTS doc_shares (
    doc_id INTEGER PRIMARY KEY REFERENCES docs(id) ON DELETE CASCADE,
    token TEXT NOT NULL UNIQUE,
    share_type INTEGER NOT NULL DEFAULT 0,
    share_value TEXT,
    is_enable INTEGER NOT NULL DEFAULT 1,
    create_time TEXT DEFAULT (datetime('now'))
);

-- Cached serialized doc tree, last writer wins
CREATE TABLE IF NOT EXISTS project_tocs (
    project_id INTEGER PRIMARY KEY REFERENCES projects(id) ON DELETE CASCADE,
    value TEXT NOT NULL,
    modify_time TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_tokens_lookup ON tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_tokens_user ON tokens(user_id);
CREATE INDEX IF NOT EXISTS idx_projects_create_user ON projects(create_user);
CREATE INDEX IF NOT EXISTS idx_projects_role ON projects(role);
CREATE INDEX IF NOT EXISTS idx_collaborators_user ON project_collaborators(user_id);
CREATE INDEX IF NOT EXISTS idx_docs_top ON docs(top_doc);
CREATE INDEX IF NOT EXISTS idx_docs_parent ON docs(parent_doc);
CREATE INDEX IF NOT EXISTS idx_doc_history_doc ON doc_history(doc_id);
CREATE INDEX IF NOT EXISTS idx_doc_tags_tag ON doc_tags(tag_id);
"#;
