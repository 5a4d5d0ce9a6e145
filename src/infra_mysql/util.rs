use sqlx::mysql::MySqlDatabaseError;

const ER_DUP_ENTRY: u16 = 1062;

/// Name of the unique index a duplicate-entry error tripped, if that is what `err` is.
pub fn dup_key_name(err: &sqlx::Error) -> Option<String> {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            if mysql_err.number() == ER_DUP_ENTRY {
                return Some(key_from_message(mysql_err.message()));
            }
        }
    }

    None
}

// "Duplicate entry 'a@x.io' for key 'app_user.uq_app_user_email'"
fn key_from_message(message: &str) -> String {
    message
        .rsplit("for key ")
        .next()
        .unwrap_or_default()
        .trim_matches('\'')
        .to_string()
}
