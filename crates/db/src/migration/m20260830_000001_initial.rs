//! Initial migration: users and posts tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS posts CASCADE;
             DROP TABLE IF EXISTS users CASCADE;
             DROP FUNCTION IF EXISTS set_updated_at();",
        )
        .await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
-- Users table: one row per OAuth-verified identity
CREATE TABLE users (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    picture TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Uniqueness guards the concurrent first-sign-in race: the losing
-- insert fails with a duplicate key and re-reads the winning row
CREATE UNIQUE INDEX idx_users_email ON users(email);

-- Posts table
CREATE TABLE posts (
    id BIGSERIAL PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    slug VARCHAR(255),
    content TEXT NOT NULL,
    thumbnail_url TEXT,
    status VARCHAR(16) NOT NULL DEFAULT 'draft',
    user_id BIGINT NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_posts_status CHECK (status IN ('draft', 'published')),
    CONSTRAINT chk_posts_title CHECK (char_length(title) >= 1),
    CONSTRAINT chk_posts_content CHECK (char_length(content) >= 1)
);

-- Index for an owner's posts, newest first
CREATE INDEX idx_posts_user ON posts(user_id, created_at DESC);

-- Index for listing by status, newest first
CREATE INDEX idx_posts_status ON posts(status, created_at DESC);

-- updated_at is refreshed by the datastore on every write
CREATE OR REPLACE FUNCTION set_updated_at() RETURNS trigger AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_posts_updated_at BEFORE UPDATE ON posts
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";
