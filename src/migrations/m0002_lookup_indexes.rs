use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0002_lookup_indexes")
        .depends_on(&["0001_roster_tables"])
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_import_jobs_created ON import_jobs(created_at)",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_users_email ON users(email)",
        ))
}
