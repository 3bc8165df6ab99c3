use garde::Validate;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::credential::SyllabusSelection;

/// The request payload for choosing a syllabus.
#[derive(Deserialize, Validate, Debug)]
pub struct SelectSyllabusRequest {
    #[garde(length(min = 1, max = 64))]
    pub id: String,
    #[garde(length(min = 1, max = 255))]
    pub name: String,
}

impl SelectSyllabusRequest {
    /// Validates the payload and turns it into a selection.
    pub fn into_selection(self) -> Result<SyllabusSelection> {
        self.validate()
            .map_err(|report| AppError::Validation(report.to_string()))?;

        SyllabusSelection::new(&self.id, &self.name).ok_or_else(|| {
            AppError::Validation("Syllabus id and name cannot be blank".to_string())
        })
    }
}
