//! Diesel schema for job pipeline persistence.

diesel::table! {
    /// Terminal job records keyed by correlation identifier.
    session_records (id) {
        /// Correlation identifier.
        #[max_length = 255]
        id -> Varchar,
        /// Original question text.
        user_question -> Text,
        /// Generated statement or the generation-failure sentinel.
        generated_sql -> Text,
        /// One-sentence statement explanation.
        sql_explanation -> Text,
        /// Terminal status.
        #[max_length = 20]
        status -> Varchar,
        /// Failure reason for failed jobs.
        error -> Nullable<Text>,
        /// Result rows; `json` keeps column order.
        results -> Json,
        /// One-sentence result summary.
        result_summary -> Text,
        /// Write time of the terminal record.
        recorded_at -> Timestamptz,
    }
}

diesel::table! {
    /// Pending hand-offs between pipeline stages.
    queue_messages (id) {
        /// Queue entry identifier.
        id -> Uuid,
        /// Logical queue name.
        #[max_length = 64]
        queue_name -> Varchar,
        /// Serialized pipeline message.
        payload -> Jsonb,
        /// Number of times the entry has been claimed.
        delivery_count -> Int4,
        /// Enqueue time, used for FIFO ordering.
        enqueued_at -> Timestamptz,
        /// Earliest time the entry may be claimed.
        visible_at -> Timestamptz,
    }
}
