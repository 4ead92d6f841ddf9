use crate::error::AppError;
use crate::models::Forklift;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

/// Saves a new forklift; afterwards images can be attached to its UUID
pub fn create_forklift(conn: &Connection, forklift: &Forklift) -> Result<Uuid, AppError> {
    forklift.validate()?;

    conn.execute(
        "INSERT INTO forklifts (uuid, name, brand) VALUES (?1, ?2, ?3)",
        (
            forklift.uuid.to_string(),
            forklift.name.trim(),
            &forklift.brand,
        ),
    )?;

    log::info!("Created forklift {} ({})", forklift.name, forklift.uuid);
    Ok(forklift.uuid)
}

pub fn get_forklift(conn: &Connection, uuid: &Uuid) -> Result<Forklift, AppError> {
    conn.query_row(
        "SELECT uuid, name, brand, created_at FROM forklifts WHERE uuid = ?1",
        [uuid.to_string()],
        |row| Forklift::try_from(row),
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound("Forklift".to_string()))
}

pub fn update_forklift(conn: &Connection, forklift: &Forklift) -> Result<(), AppError> {
    forklift.validate()?;

    let rows_affected = conn.execute(
        "UPDATE forklifts SET name = ?1, brand = ?2 WHERE uuid = ?3",
        (
            forklift.name.trim(),
            &forklift.brand,
            forklift.uuid.to_string(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(AppError::NotFound("Forklift".to_string()));
    }

    Ok(())
}

/// Lists forklifts by name, optionally filtered
pub fn list_forklifts(
    conn: &Connection,
    name_filter: Option<&str>,
) -> Result<Vec<Forklift>, AppError> {
    let filter = name_filter.map(str::trim).filter(|f| !f.is_empty());

    let mut stmt = conn.prepare(
        "SELECT uuid, name, brand, created_at
         FROM forklifts
         WHERE ?1 IS NULL OR name LIKE '%' || ?1 || '%' OR brand LIKE '%' || ?1 || '%'
         ORDER BY name",
    )?;

    let forklifts = stmt
        .query_map([filter], |row| Forklift::try_from(row))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(forklifts)
}
