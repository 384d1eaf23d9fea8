//! Diesel table definitions for the impact platform.
//!
//! Tables: users, organizations, programs, organization_metrics, reports,
//! invitations, verification_requests, notifications, target_partners,
//! activity_logs, workflows, statistics.

diesel::table! {
    users (id) {
        id -> Int8,
        username -> Varchar,
        email -> Varchar,
        full_name -> Nullable<Varchar>,
        role -> Varchar,
        organization_id -> Nullable<Int8>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    organizations (id) {
        id -> Int8,
        name -> Varchar,
        description -> Text,
        mission -> Text,
        sector -> Varchar,
        region -> Varchar,
        country -> Nullable<Varchar>,
        website -> Nullable<Varchar>,
        logo_url -> Nullable<Varchar>,
        founded_year -> Nullable<Int4>,
        sdg_goals -> Array<Int4>,
        verification_type -> Varchar,
        reporting_quality -> Int4,
        reach -> Int4,
        social_roi -> Int4,
        outcome_effectiveness -> Int4,
        transparency_governance -> Int4,
        impact_score -> Int4,
        previous_score -> Nullable<Int4>,
        beneficiaries_reached -> Int8,
        annual_budget -> Nullable<Int8>,
        featured -> Bool,
        success_story -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    programs (id) {
        id -> Int8,
        organization_id -> Int8,
        name -> Varchar,
        description -> Nullable<Text>,
        category -> Nullable<Varchar>,
        beneficiaries -> Int8,
        budget -> Nullable<Int8>,
        start_date -> Nullable<Date>,
        end_date -> Nullable<Date>,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    organization_metrics (id) {
        id -> Int8,
        organization_id -> Int8,
        program_id -> Nullable<Int8>,
        name -> Varchar,
        value -> Float8,
        unit -> Varchar,
        target -> Nullable<Float8>,
        period -> Varchar,
        recorded_at -> Timestamptz,
    }
}

diesel::table! {
    reports (id) {
        id -> Int8,
        organization_id -> Int8,
        title -> Varchar,
        report_type -> Varchar,
        year -> Int4,
        summary -> Nullable<Text>,
        file_url -> Nullable<Varchar>,
        verification_type -> Varchar,
        published_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    invitations (id) {
        id -> Int8,
        email -> Varchar,
        organization_id -> Nullable<Int8>,
        role -> Varchar,
        token -> Varchar,
        status -> Varchar,
        invited_by -> Nullable<Int8>,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    verification_requests (id) {
        id -> Int8,
        organization_id -> Int8,
        requested_type -> Varchar,
        status -> Varchar,
        notes -> Nullable<Text>,
        requested_by -> Nullable<Int8>,
        reviewed_by -> Nullable<Int8>,
        created_at -> Timestamptz,
        resolved_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    notifications (id) {
        id -> Int8,
        user_id -> Int8,
        title -> Varchar,
        message -> Text,
        kind -> Varchar,
        read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    target_partners (id) {
        id -> Int8,
        organization_id -> Int8,
        name -> Varchar,
        partner_type -> Varchar,
        contact_email -> Nullable<Varchar>,
        status -> Varchar,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    activity_logs (id) {
        id -> Int8,
        user_id -> Nullable<Int8>,
        organization_id -> Nullable<Int8>,
        action -> Varchar,
        entity_type -> Varchar,
        entity_id -> Nullable<Int8>,
        details -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    workflows (id) {
        id -> Int8,
        organization_id -> Int8,
        name -> Varchar,
        status -> Varchar,
        steps -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    statistics (id) {
        id -> Int8,
        name -> Varchar,
        label -> Varchar,
        value -> Int8,
        updated_at -> Timestamptz,
    }
}

// Foreign key relationships
diesel::joinable!(users -> organizations (organization_id));
diesel::joinable!(programs -> organizations (organization_id));
diesel::joinable!(organization_metrics -> organizations (organization_id));
diesel::joinable!(reports -> organizations (organization_id));
diesel::joinable!(invitations -> organizations (organization_id));
diesel::joinable!(verification_requests -> organizations (organization_id));
diesel::joinable!(notifications -> users (user_id));
diesel::joinable!(target_partners -> organizations (organization_id));
diesel::joinable!(workflows -> organizations (organization_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    organizations,
    programs,
    organization_metrics,
    reports,
    invitations,
    verification_requests,
    notifications,
    target_partners,
    activity_logs,
    workflows,
    statistics,
);
