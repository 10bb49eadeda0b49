use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{problems_to_result, require_text};

/// A spy cat as stored in the `cats` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cat {
    pub id: i64,
    pub name: String,
    pub years_of_experience: i32,
    pub breed: String,
    pub salary: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for hiring a cat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCat {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub years_of_experience: i32,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub salary: f64,
}

impl NewCat {
    /// Check required fields. Breed membership is checked separately
    /// against the breed catalog.
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();
        require_text(&mut problems, "name", &self.name);
        require_text(&mut problems, "breed", &self.breed);
        if self.years_of_experience < 0 {
            problems.push("years_of_experience must not be negative".to_string());
        }
        if let Err(msg) = validate_salary(self.salary) {
            problems.push(msg);
        }
        problems_to_result(problems)
    }
}

/// Request body for `PUT /cats/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryUpdate {
    pub salary: f64,
}

pub fn validate_salary(salary: f64) -> Result<(), String> {
    if salary.is_finite() && salary > 0.0 {
        Ok(())
    } else {
        Err("salary must be a positive number".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whiskers() -> NewCat {
        NewCat {
            name: "Whiskers".to_string(),
            years_of_experience: 3,
            breed: "Siamese".to_string(),
            salary: 1200.0,
        }
    }

    #[test]
    fn test_valid_cat_passes() {
        assert!(whiskers().validate().is_ok());
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let cat = NewCat {
            name: "  ".to_string(),
            breed: String::new(),
            salary: 0.0,
            ..whiskers()
        };
        let err = cat.validate().unwrap_err();
        assert!(err.contains("name is required"));
        assert!(err.contains("breed is required"));
        assert!(err.contains("salary must be a positive number"));
    }

    #[test]
    fn test_salary_rejects_nan() {
        assert!(validate_salary(f64::NAN).is_err());
        assert!(validate_salary(-5.0).is_err());
        assert!(validate_salary(0.01).is_ok());
    }
}
