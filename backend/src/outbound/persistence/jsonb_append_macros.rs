//! Shared macro for appending to per-user JSONB array columns.

/// Append one pre-encoded entry to a JSONB array column of a per-user table.
///
/// The generated statement:
/// - inserts a fresh document holding just the entry when none exists
/// - otherwise concatenates the entry onto the stored array with `||`
/// - bumps `updated_at` in both cases
///
/// `$entry` must be a single-element JSON array. The table must be keyed by
/// `user_id` and carry an `updated_at` column.
#[macro_export]
macro_rules! append_jsonb_entry {
    (
        $repo:expr,
        table: $table:ident,
        column: $column:ident,
        user_id: $user_id:expr,
        entry: $entry:expr,
        map_pool_error: $map_pool_error:path,
        map_diesel_error: $map_diesel_error:path $(,)?
    ) => {{
        let mut conn = $repo.pool.get().await.map_err($map_pool_error)?;
        diesel::insert_into($table::table)
            .values((
                $table::user_id.eq($user_id.as_uuid()),
                $table::$column.eq(&$entry),
                $table::updated_at.eq(chrono::Utc::now()),
            ))
            .on_conflict($table::user_id)
            .do_update()
            .set((
                $table::$column.eq($table::$column.concat(diesel::upsert::excluded($table::$column))),
                $table::updated_at.eq(diesel::upsert::excluded($table::updated_at)),
            ))
            .execute(&mut conn)
            .await
            .map_err($map_diesel_error)?;
        Ok(())
    }};
}
