use rusqlite::{Connection, Result};

/// Initialize the listing image database schema
pub fn init_listing_images_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS listing_images_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT version FROM listing_images_schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        create_schema_v1(conn)?;
        conn.execute(
            "INSERT INTO listing_images_schema_version (version) VALUES (1)",
            [],
        )?;
    }

    if current_version < 2 {
        create_schema_v2(conn)?;
        conn.execute(
            "INSERT INTO listing_images_schema_version (version) VALUES (2)",
            [],
        )?;
    }

    Ok(())
}

/// Version 1: image metadata per forklift
fn create_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS forklift_images (
            id TEXT PRIMARY KEY,
            forklift_id TEXT NOT NULL,
            image_url TEXT NOT NULL,
            alt_text TEXT,
            is_primary INTEGER NOT NULL DEFAULT 0 CHECK(is_primary IN (0,1)),
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (forklift_id, image_url)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_forklift_images_forklift ON forklift_images(forklift_id)",
        [],
    )?;

    Ok(())
}

/// Version 2: editable page content (CMS strings)
fn create_schema_v2(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS page_content (
            content_key TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_listing_images_schema(&conn).unwrap();
        init_listing_images_schema(&conn).unwrap();

        let version: i32 = conn
            .query_row(
                "SELECT MAX(version) FROM listing_images_schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, 2);

        let tables: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('forklift_images', 'page_content')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }
}
