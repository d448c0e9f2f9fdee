diesel::table! {
    attachment (id) {
        id -> Integer,
        thread -> Integer,
        save_name -> Text,
        original_filename -> Text,
        content_type -> Nullable<Text>,
        file_size -> BigInt,
        created_at -> Timestamp,
    }
}

diesel::table! {
    audit_log (id) {
        id -> Integer,
        actor -> Integer,
        action -> Text,
        target_type -> Nullable<Text>,
        target_id -> Nullable<Integer>,
        details -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    comment (id) {
        id -> Integer,
        thread -> Integer,
        body -> Text,
        author -> Integer,
        created_at -> Timestamp,
    }
}

diesel::table! {
    report (id) {
        id -> Integer,
        target_type -> Text,
        target_id -> Integer,
        reason -> Text,
        reporter -> Integer,
        status -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    tag (id) {
        id -> Integer,
        name -> Text,
        is_official -> Bool,
    }
}

diesel::table! {
    thread (id) {
        id -> Integer,
        title -> Text,
        body -> Text,
        author -> Integer,
        status -> Text,
        like_count -> Integer,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    thread_like (id) {
        id -> Integer,
        thread -> Integer,
        user -> Integer,
        created_at -> Timestamp,
    }
}

diesel::table! {
    thread_tag (id) {
        id -> Integer,
        thread -> Integer,
        tag -> Integer,
    }
}

diesel::table! {
    user (id) {
        id -> Integer,
        name -> Text,
        email -> Text,
        dept -> Text,
        role -> Text,
        password_hash -> Text,
        created_at -> Timestamp,
    }
}

diesel::joinable!(attachment -> thread (thread));
diesel::joinable!(audit_log -> user (actor));
diesel::joinable!(comment -> thread (thread));
diesel::joinable!(comment -> user (author));
diesel::joinable!(report -> user (reporter));
diesel::joinable!(thread -> user (author));
diesel::joinable!(thread_like -> thread (thread));
diesel::joinable!(thread_like -> user (user));
diesel::joinable!(thread_tag -> tag (tag));
diesel::joinable!(thread_tag -> thread (thread));

diesel::allow_tables_to_appear_in_same_query!(
    attachment,
    audit_log,
    comment,
    report,
    tag,
    thread,
    thread_like,
    thread_tag,
    user,
);
