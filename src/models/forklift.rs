use crate::error::AppError;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A forklift listing; the parent entity of listing images
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Forklift {
    pub uuid: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub created_at: Option<String>,
}

impl Forklift {
    /// New, unsaved forklift with a generated UUID
    pub fn new(name: String) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name,
            brand: None,
            created_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }

        if self.name.len() > 100 {
            return Err(AppError::Validation(
                "Name can be at most 100 characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Name with the brand in front, if any
    pub fn display_name(&self) -> String {
        match self.brand.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
            Some(brand) => format!("{} {}", brand, self.name),
            None => self.name.clone(),
        }
    }
}

impl<'r> TryFrom<&Row<'r>> for Forklift {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'r>) -> Result<Self, Self::Error> {
        let uuid_str: String = row.get(0)?;
        let uuid = Uuid::parse_str(&uuid_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Forklift {
            uuid,
            name: row.get(1)?,
            brand: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_forklift() {
        let forklift = Forklift::new("H30T".to_string());
        assert_eq!(forklift.name, "H30T");
        assert!(forklift.brand.is_none());
        assert!(!forklift.uuid.is_nil());
    }

    #[test]
    fn test_validate() {
        assert!(Forklift::new("   ".to_string()).validate().is_err());
        assert!(Forklift::new("x".repeat(101)).validate().is_err());
        assert!(Forklift::new("E20".to_string()).validate().is_ok());
    }

    #[test]
    fn test_display_name() {
        let mut forklift = Forklift::new("H30T".to_string());
        assert_eq!(forklift.display_name(), "H30T");
        forklift.brand = Some("Linde".to_string());
        assert_eq!(forklift.display_name(), "Linde H30T");
    }
}
