//! Embedded schema migration for the relational backend.

use diesel_async::AsyncPgConnection;
use diesel_async::SimpleAsyncConnection;

/// SQL migration for the platform tables.
///
/// Idempotent: every statement is guarded with IF NOT EXISTS.
pub const MIGRATION_SQL: &str = r#"
-- ================================================================
-- Basic Impacts platform tables
-- ================================================================

CREATE TABLE IF NOT EXISTS organizations (
    id                      BIGSERIAL PRIMARY KEY,
    name                    VARCHAR(255) NOT NULL,
    description             TEXT NOT NULL DEFAULT '',
    mission                 TEXT NOT NULL DEFAULT '',
    sector                  VARCHAR(128) NOT NULL,
    region                  VARCHAR(128) NOT NULL,
    country                 VARCHAR(128),
    website                 VARCHAR(512),
    logo_url                VARCHAR(512),
    founded_year            INTEGER,
    sdg_goals               INTEGER[] NOT NULL DEFAULT '{}',
    verification_type       VARCHAR(32) NOT NULL DEFAULT 'self-reported',
    reporting_quality       INTEGER NOT NULL DEFAULT 0 CHECK (reporting_quality BETWEEN 0 AND 100),
    reach                   INTEGER NOT NULL DEFAULT 0 CHECK (reach BETWEEN 0 AND 100),
    social_roi              INTEGER NOT NULL DEFAULT 0 CHECK (social_roi BETWEEN 0 AND 100),
    outcome_effectiveness   INTEGER NOT NULL DEFAULT 0 CHECK (outcome_effectiveness BETWEEN 0 AND 100),
    transparency_governance INTEGER NOT NULL DEFAULT 0 CHECK (transparency_governance BETWEEN 0 AND 100),
    impact_score            INTEGER NOT NULL DEFAULT 0 CHECK (impact_score BETWEEN 0 AND 100),
    previous_score          INTEGER,
    beneficiaries_reached   BIGINT NOT NULL DEFAULT 0,
    annual_budget           BIGINT,
    featured                BOOLEAN NOT NULL DEFAULT FALSE,
    success_story           TEXT,
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at              TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_organizations_sector ON organizations (sector);
CREATE INDEX IF NOT EXISTS idx_organizations_region ON organizations (region);
CREATE INDEX IF NOT EXISTS idx_organizations_score ON organizations (impact_score DESC);

CREATE TABLE IF NOT EXISTS users (
    id              BIGSERIAL PRIMARY KEY,
    username        VARCHAR(64) NOT NULL UNIQUE,
    email           VARCHAR(255) NOT NULL UNIQUE,
    full_name       VARCHAR(255),
    role            VARCHAR(16) NOT NULL DEFAULT 'member',
    organization_id BIGINT REFERENCES organizations(id) ON DELETE SET NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS programs (
    id              BIGSERIAL PRIMARY KEY,
    organization_id BIGINT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name            VARCHAR(255) NOT NULL,
    description     TEXT,
    category        VARCHAR(128),
    beneficiaries   BIGINT NOT NULL DEFAULT 0,
    budget          BIGINT,
    start_date      DATE,
    end_date        DATE,
    status          VARCHAR(16) NOT NULL DEFAULT 'active',
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_programs_organization ON programs (organization_id);

CREATE TABLE IF NOT EXISTS organization_metrics (
    id              BIGSERIAL PRIMARY KEY,
    organization_id BIGINT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    program_id      BIGINT REFERENCES programs(id) ON DELETE CASCADE,
    name            VARCHAR(255) NOT NULL,
    value           DOUBLE PRECISION NOT NULL,
    unit            VARCHAR(64) NOT NULL DEFAULT '',
    target          DOUBLE PRECISION,
    period          VARCHAR(32) NOT NULL DEFAULT 'annual',
    recorded_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_organization_metrics_org ON organization_metrics (organization_id);

CREATE TABLE IF NOT EXISTS reports (
    id                BIGSERIAL PRIMARY KEY,
    organization_id   BIGINT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    title             VARCHAR(255) NOT NULL,
    report_type       VARCHAR(16) NOT NULL,
    year              INTEGER NOT NULL CHECK (year BETWEEN 1900 AND 2100),
    summary           TEXT,
    file_url          VARCHAR(512),
    verification_type VARCHAR(32) NOT NULL DEFAULT 'self-reported',
    published_at      TIMESTAMPTZ,
    created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_reports_organization ON reports (organization_id);

CREATE TABLE IF NOT EXISTS invitations (
    id              BIGSERIAL PRIMARY KEY,
    email           VARCHAR(255) NOT NULL,
    organization_id BIGINT REFERENCES organizations(id) ON DELETE SET NULL,
    role            VARCHAR(16) NOT NULL DEFAULT 'member',
    token           VARCHAR(64) NOT NULL UNIQUE,
    status          VARCHAR(16) NOT NULL DEFAULT 'pending',
    invited_by      BIGINT REFERENCES users(id) ON DELETE SET NULL,
    expires_at      TIMESTAMPTZ NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS verification_requests (
    id              BIGSERIAL PRIMARY KEY,
    organization_id BIGINT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    requested_type  VARCHAR(32) NOT NULL,
    status          VARCHAR(16) NOT NULL DEFAULT 'pending',
    notes           TEXT,
    requested_by    BIGINT REFERENCES users(id) ON DELETE SET NULL,
    reviewed_by     BIGINT REFERENCES users(id) ON DELETE SET NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    resolved_at     TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS idx_verification_requests_status ON verification_requests (status);

CREATE TABLE IF NOT EXISTS notifications (
    id          BIGSERIAL PRIMARY KEY,
    user_id     BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title       VARCHAR(255) NOT NULL,
    message     TEXT NOT NULL,
    kind        VARCHAR(32) NOT NULL DEFAULT 'info',
    read        BOOLEAN NOT NULL DEFAULT FALSE,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications (user_id);

CREATE TABLE IF NOT EXISTS target_partners (
    id              BIGSERIAL PRIMARY KEY,
    organization_id BIGINT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name            VARCHAR(255) NOT NULL,
    partner_type    VARCHAR(64) NOT NULL,
    contact_email   VARCHAR(255),
    status          VARCHAR(16) NOT NULL DEFAULT 'prospect',
    notes           TEXT,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS activity_logs (
    id              BIGSERIAL PRIMARY KEY,
    user_id         BIGINT REFERENCES users(id) ON DELETE SET NULL,
    organization_id BIGINT,
    action          VARCHAR(64) NOT NULL,
    entity_type     VARCHAR(64) NOT NULL,
    entity_id       BIGINT,
    details         JSONB,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_activity_logs_created ON activity_logs (created_at DESC);

CREATE TABLE IF NOT EXISTS workflows (
    id              BIGSERIAL PRIMARY KEY,
    organization_id BIGINT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name            VARCHAR(255) NOT NULL,
    status          VARCHAR(16) NOT NULL DEFAULT 'draft',
    steps           JSONB NOT NULL DEFAULT '[]',
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS statistics (
    id          BIGSERIAL PRIMARY KEY,
    name        VARCHAR(64) NOT NULL UNIQUE,
    label       VARCHAR(255) NOT NULL,
    value       BIGINT NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

/// Run the platform migration.
pub async fn run_migration(conn: &mut AsyncPgConnection) -> anyhow::Result<()> {
    conn.batch_execute(MIGRATION_SQL)
        .await
        .map_err(|e| anyhow::anyhow!("platform migration failed: {e}"))?;
    Ok(())
}
