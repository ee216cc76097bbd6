pub const SCHEMA: &str = r#"
-- Acts: ordered top-level groupings of shots
CREATE TABLE IF NOT EXISTS acts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,       -- actNN
    name TEXT NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0
);

-- Shots: units of work within an act
CREATE TABLE IF NOT EXISTS shots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    act_id INTEGER NOT NULL,
    code TEXT NOT NULL,              -- shotNN, unique within its act
    frame_start INTEGER NOT NULL DEFAULT 1001,
    frame_end INTEGER NOT NULL DEFAULT 1120,
    thumbnail TEXT,                  -- reference token, image bytes live elsewhere
    priority TEXT NOT NULL DEFAULT 'medium',
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (act_id, code),
    FOREIGN KEY (act_id) REFERENCES acts(id)
);

CREATE INDEX IF NOT EXISTS idx_shots_act ON shots(act_id);

-- One row per (shot, department); the full set of 7 rows is created
-- atomically with the shot and only ever upserted afterwards
CREATE TABLE IF NOT EXISTS department_statuses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    shot_id INTEGER NOT NULL,
    department TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'not-started',
    assignee TEXT,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (shot_id, department),
    FOREIGN KEY (shot_id) REFERENCES shots(id)
);

CREATE INDEX IF NOT EXISTS idx_department_statuses_shot ON department_statuses(shot_id);

-- Append-only audit trail of actual status transitions
CREATE TABLE IF NOT EXISTS status_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    shot_id INTEGER NOT NULL,
    department TEXT NOT NULL,
    previous_status TEXT NOT NULL,
    new_status TEXT NOT NULL,
    changed_by TEXT NOT NULL,
    changed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (shot_id) REFERENCES shots(id)
);

CREATE INDEX IF NOT EXISTS idx_status_log_shot ON status_log(shot_id);
"#;
