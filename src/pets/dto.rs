use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Pet;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct PetInput {
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: i32,
}

impl PetInput {
    pub fn validated(mut self) -> AppResult<Self> {
        self.name = self.name.trim().to_string();
        self.species = self.species.trim().to_string();
        self.breed = self.breed.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());

        let len = |s: &str| s.chars().count();
        if !(1..=50).contains(&len(&self.name)) {
            return Err(AppError::invalid("name must be 1 to 50 characters"));
        }
        if !(1..=30).contains(&len(&self.species)) {
            return Err(AppError::invalid("species must be 1 to 30 characters"));
        }
        if self.breed.as_deref().map(len).unwrap_or(0) > 50 {
            return Err(AppError::invalid("breed must be at most 50 characters"));
        }
        if !(0..=100).contains(&self.age) {
            return Err(AppError::invalid("age must be between 0 and 100"));
        }
        Ok(self)
    }
}

#[derive(Debug, Serialize)]
pub struct PetRead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Pet> for PetRead {
    fn from(p: Pet) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            name: p.name,
            species: p.species,
            breed: p.breed,
            age: p.age,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
