//! SQL schema for the deepfake SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.
//!
//! The UNIQUE constraints are the storage-level backstop for every
//! insert-if-absent path in the store; the store writes with
//! `ON CONFLICT DO NOTHING` so racing duplicates are absorbed rather than
//! surfaced.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS trainers (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         INTEGER NOT NULL UNIQUE,   -- chat platform user id
    user_name       TEXT    NOT NULL,
    time_registered TEXT    NOT NULL,          -- RFC 3339 UTC
    subscribed      INTEGER NOT NULL DEFAULT 1
);

-- One row per (person, server, trainer): the same person is a different
-- subject for every trainer on every server.
CREATE TABLE IF NOT EXISTS subjects (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER NOT NULL,
    trainer_id   INTEGER NOT NULL REFERENCES trainers(id),
    server_id    INTEGER NOT NULL,
    server_name  TEXT    NOT NULL,
    subject_name TEXT    NOT NULL,
    UNIQUE (user_id, server_id, trainer_id)
);

-- Immutable once written.
CREATE TABLE IF NOT EXISTS data_sets (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id     INTEGER NOT NULL REFERENCES subjects(id),
    time_collected TEXT    NOT NULL,
    data_uid       TEXT    NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS text_filters (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id INTEGER NOT NULL REFERENCES subjects(id),
    word       TEXT    NOT NULL,
    UNIQUE (subject_id, word)
);

CREATE TABLE IF NOT EXISTS markov_settings (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id INTEGER NOT NULL REFERENCES subjects(id),
    state_size INTEGER NOT NULL,
    newline    INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS markov_settings_subject_idx
    ON markov_settings(subject_id);

-- Immutable once written.
CREATE TABLE IF NOT EXISTS markov_models (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    data_set_id    INTEGER NOT NULL REFERENCES data_sets(id),
    time_collected TEXT    NOT NULL,
    model_uid      TEXT    NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS deployments (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    secret_key TEXT    NOT NULL,
    markov_id  INTEGER NOT NULL REFERENCES markov_models(id),
    trainer_id INTEGER NOT NULL REFERENCES trainers(id),
    hosted     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS hosted_deployments (
    id                        INTEGER PRIMARY KEY AUTOINCREMENT,
    deployment_id             INTEGER NOT NULL UNIQUE REFERENCES deployments(id),
    ip_address                TEXT    NOT NULL,
    active                    INTEGER NOT NULL,
    reply_probability         REAL    NOT NULL,
    new_conversation_min_wait INTEGER NOT NULL,
    new_conversation_max_wait INTEGER NOT NULL,
    max_sentence_length       INTEGER NOT NULL,
    quiet_mode                INTEGER NOT NULL,
    bot_token                 TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS subjects_trainer_idx      ON subjects(trainer_id);
CREATE INDEX IF NOT EXISTS data_sets_subject_idx     ON data_sets(subject_id);
CREATE INDEX IF NOT EXISTS markov_models_data_idx    ON markov_models(data_set_id);
CREATE INDEX IF NOT EXISTS deployments_trainer_idx   ON deployments(trainer_id);

PRAGMA user_version = 1;
";
