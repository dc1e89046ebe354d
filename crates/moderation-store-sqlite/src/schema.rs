//! SQL schema for the moderation SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- `seq` records insertion order and breaks created_at ties in the queue.
CREATE TABLE IF NOT EXISTS submissions (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    submission_id TEXT NOT NULL UNIQUE,
    kind          TEXT NOT NULL,   -- 'organisation' | 'business' | 'artist'
    owner_id      TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'pending',
    payload_json  TEXT NOT NULL,   -- payload fields without the kind tag
    created_at    TEXT NOT NULL    -- RFC 3339 UTC, fixed width; store-assigned
);

-- Append-only audit trail; one row per committed decision.
CREATE TABLE IF NOT EXISTS status_history (
    history_id    TEXT PRIMARY KEY,
    submission_id TEXT NOT NULL REFERENCES submissions(submission_id),
    status        TEXT NOT NULL,
    actor_id      TEXT NOT NULL,
    recorded_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS submissions_queue_idx
    ON submissions(kind, status, created_at, seq);
CREATE INDEX IF NOT EXISTS status_history_submission_idx
    ON status_history(submission_id);

-- Kind and owner are fixed at creation.
CREATE TRIGGER IF NOT EXISTS submissions_identity_immutable
BEFORE UPDATE OF submission_id, kind, owner_id ON submissions
BEGIN
    SELECT RAISE(ABORT, 'submission identity is immutable');
END;

-- Approved and rejected are terminal.
CREATE TRIGGER IF NOT EXISTS submissions_terminal_status
BEFORE UPDATE OF status ON submissions
WHEN OLD.status != 'pending'
BEGIN
    SELECT RAISE(ABORT, 'submission status is terminal');
END;

CREATE TRIGGER IF NOT EXISTS status_history_append_only
BEFORE UPDATE ON status_history
BEGIN
    SELECT RAISE(ABORT, 'status history is append-only');
END;

CREATE TRIGGER IF NOT EXISTS submissions_no_delete
BEFORE DELETE ON submissions
BEGIN
    SELECT RAISE(ABORT, 'submissions are never deleted');
END;

PRAGMA user_version = 1;
";
