//! SQL schema for the Docket SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One counter per (kind, year); bumped atomically when a reference is minted.
CREATE TABLE IF NOT EXISTS sequences (
    kind      TEXT    NOT NULL,   -- 'inward' | 'outward'
    year      INTEGER NOT NULL,
    last_seq  INTEGER NOT NULL,
    PRIMARY KEY (kind, year)
);

CREATE TABLE IF NOT EXISTS inward (
    id                      INTEGER PRIMARY KEY AUTOINCREMENT,
    reference_no            TEXT NOT NULL UNIQUE,   -- INW/<year>/<seq>
    means                   TEXT NOT NULL,
    from_whom               TEXT NOT NULL,
    subject                 TEXT NOT NULL,
    received_at             TEXT NOT NULL,          -- RFC 3339 UTC, fixed width
    file_reference          TEXT,
    assigned_team           TEXT,                   -- 'UG' | 'PG/PRO' | 'PhD'
    assigned_to_email       TEXT,
    assignment_instructions TEXT,
    assignment_date         TEXT,
    assignment_status       TEXT NOT NULL DEFAULT 'Unassigned',
    due_date                TEXT,                   -- YYYY-MM-DD
    completion_date         TEXT,
    created_at              TEXT NOT NULL,
    updated_at              TEXT NOT NULL,
    CHECK (assignment_status IN ('Unassigned', 'Pending', 'In Progress', 'Completed')),
    CHECK ((assignment_status = 'Unassigned') = (assigned_team IS NULL)),
    CHECK ((assignment_status = 'Completed') = (completion_date IS NOT NULL))
);

CREATE TABLE IF NOT EXISTS outward (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    reference_no      TEXT NOT NULL UNIQUE,         -- OTW/<year>/<seq>
    means             TEXT NOT NULL,
    to_whom           TEXT NOT NULL,
    subject           TEXT NOT NULL,
    sent_by           TEXT NOT NULL,
    sent_at           TEXT NOT NULL,
    file_reference    TEXT,
    postal_tariff     REAL NOT NULL DEFAULT 0 CHECK (postal_tariff >= 0),
    due_date          TEXT,
    case_closed       INTEGER NOT NULL DEFAULT 0,
    linked_inward_id  INTEGER REFERENCES inward(id),
    created_by_team   TEXT NOT NULL,
    team_member_email TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS inward_team_idx     ON inward(assigned_team);
CREATE INDEX IF NOT EXISTS inward_status_idx   ON inward(assignment_status);
CREATE INDEX IF NOT EXISTS inward_received_idx ON inward(received_at);
CREATE INDEX IF NOT EXISTS outward_team_idx    ON outward(created_by_team);
CREATE INDEX IF NOT EXISTS outward_sent_idx    ON outward(sent_at);
CREATE INDEX IF NOT EXISTS outward_link_idx    ON outward(linked_inward_id);

PRAGMA user_version = 1;
";
