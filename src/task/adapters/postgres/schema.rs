//! Diesel schema for task persistence.

diesel::table! {
    /// Task records scoped to their owning user.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning-user identifier.
        user_id -> Uuid,
        /// Task title.
        #[max_length = 200]
        title -> Varchar,
        /// Optional task description.
        description -> Nullable<Text>,
        /// Completion flag.
        completed -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last mutation timestamp.
        updated_at -> Timestamptz,
    }
}
