//! Diesel schema for task board persistence.

diesel::table! {
    /// Users known to the board.
    users (id) {
        /// User identifier.
        id -> Uuid,
        /// Name shown in the status log.
        #[max_length = 255]
        display_name -> Varchar,
        /// Role literal.
        #[max_length = 50]
        role -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user daily task limit overrides.
    user_task_limits (user_id) {
        /// User identifier.
        user_id -> Uuid,
        /// Maximum open tasks starting on one day.
        daily_limit -> Int4,
    }
}

diesel::table! {
    /// Task registry.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Assignee.
        assignee_id -> Uuid,
        /// Task name.
        #[max_length = 255]
        name -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Start timestamp.
        starts_at -> Timestamptz,
        /// Deadline.
        deadline -> Timestamptz,
        /// Status literal, also the board column.
        #[max_length = 50]
        status -> Varchar,
        /// Priority literal.
        #[max_length = 50]
        priority -> Varchar,
        /// Pinning flag literal.
        #[max_length = 50]
        priority_flag -> Varchar,
        /// Set by the deadline sweep.
        missed_deadline -> Bool,
        /// Soft-delete flag.
        is_active -> Bool,
        /// On-hold flag.
        on_hold -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Subtask registry.
    subtasks (id) {
        /// Subtask identifier.
        id -> Uuid,
        /// Parent task.
        task_id -> Uuid,
        /// Owning project, copied from the parent.
        project_id -> Uuid,
        /// Assignee.
        assignee_id -> Uuid,
        /// Subtask name.
        #[max_length = 255]
        name -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Start timestamp.
        starts_at -> Timestamptz,
        /// Deadline.
        deadline -> Timestamptz,
        /// Status literal.
        #[max_length = 50]
        status -> Varchar,
        /// Priority literal.
        #[max_length = 50]
        priority -> Varchar,
        /// Pinning flag literal.
        #[max_length = 50]
        priority_flag -> Varchar,
        /// Missed-deadline flag.
        missed_deadline -> Bool,
        /// Soft-delete flag.
        is_active -> Bool,
        /// On-hold flag.
        on_hold -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user board placements.
    user_task_positions (user_id, task_id) {
        /// Board owner.
        user_id -> Uuid,
        /// Task on the card.
        task_id -> Uuid,
        /// Column literal.
        #[max_length = 50]
        board_column -> Varchar,
        /// One-based rank within the column.
        position -> Int4,
    }
}

diesel::table! {
    /// Append-only status transition log.
    task_status_log (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Task that moved.
        task_id -> Uuid,
        /// User who moved it.
        actor_id -> Uuid,
        /// Actor name snapshot.
        #[max_length = 255]
        actor_name -> Varchar,
        /// Status before the move.
        #[max_length = 50]
        status_before -> Varchar,
        /// Status after the move.
        #[max_length = 50]
        status_after -> Varchar,
        /// Whether the move happened past the deadline.
        missed_deadline -> Bool,
        /// Commit timestamp.
        recorded_at -> Timestamptz,
    }
}

diesel::joinable!(user_task_positions -> tasks (task_id));
diesel::joinable!(subtasks -> tasks (task_id));
diesel::joinable!(task_status_log -> tasks (task_id));
diesel::joinable!(user_task_limits -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    user_task_limits,
    tasks,
    subtasks,
    user_task_positions,
    task_status_log,
);
