use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::meals::types::Category;

pub const MIN_DISH_LEN: usize = 2;
pub const MAX_DISH_LEN: usize = 100;
pub const MIN_SERVINGS: f64 = 0.1;
pub const MAX_SERVINGS: f64 = 1000.0;

/// Raw values from the add-meal form.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MealForm {
    pub dish_name: String,
    pub servings: Option<f64>,
    pub category: Option<Category>,
}

impl Default for MealForm {
    fn default() -> Self {
        Self {
            dish_name: String::new(),
            servings: Some(1.0),
            category: Some(Category::Lunch),
        }
    }
}

/// Messages keyed by form field; `root` is for errors not tied to a field.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dish_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.dish_name.is_none()
            && self.servings.is_none()
            && self.category.is_none()
            && self.root.is_none()
    }

    pub fn on_dish_name(message: impl Into<String>) -> Self {
        Self {
            dish_name: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn on_root(message: impl Into<String>) -> Self {
        Self {
            root: Some(message.into()),
            ..Self::default()
        }
    }
}

/// A form that passed validation. `dish_name` is trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMeal {
    pub dish_name: String,
    pub servings: f64,
    pub category: Category,
}

fn dish_name_error(dish_name: &str) -> Option<&'static str> {
    lazy_static! {
        static ref DISH_RE: Regex = Regex::new(r"^[a-zA-Z0-9\s\-.,]+$").unwrap();
    }
    let len = dish_name.chars().count();
    if len < MIN_DISH_LEN {
        Some("Dish name must be at least 2 characters")
    } else if len > MAX_DISH_LEN {
        Some("Dish name must be less than 100 characters")
    } else if !DISH_RE.is_match(dish_name) {
        Some("Dish name can only contain letters, numbers, spaces, and basic punctuation")
    } else {
        None
    }
}

pub(crate) fn servings_error(servings: Option<f64>) -> Option<&'static str> {
    match servings {
        None => Some("Servings must be a number"),
        Some(s) if !s.is_finite() => Some("Servings must be a number"),
        Some(s) if s < MIN_SERVINGS => Some("Servings must be at least 0.1"),
        Some(s) if s > MAX_SERVINGS => Some("Servings must be less than 1000"),
        Some(_) => None,
    }
}

/// Checks every field and reports the first problem of each.
pub fn validate(form: &MealForm) -> Result<ValidMeal, FieldErrors> {
    let errors = FieldErrors {
        dish_name: dish_name_error(&form.dish_name).map(str::to_string),
        servings: servings_error(form.servings).map(str::to_string),
        category: form
            .category
            .is_none()
            .then(|| "Please select a category".to_string()),
        root: None,
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    match (form.servings, form.category) {
        (Some(servings), Some(category)) => Ok(ValidMeal {
            dish_name: form.dish_name.trim().to_string(),
            servings,
            category,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(dish: &str, servings: f64) -> MealForm {
        MealForm {
            dish_name: dish.into(),
            servings: Some(servings),
            category: Some(Category::Dinner),
        }
    }

    #[test]
    fn accepts_typical_input_and_trims() {
        let valid = validate(&form("  Chicken Biryani ", 2.0)).unwrap();
        assert_eq!(valid.dish_name, "Chicken Biryani");
        assert_eq!(valid.servings, 2.0);
        assert_eq!(valid.category, Category::Dinner);
    }

    #[test]
    fn one_character_dish_is_too_short() {
        let errors = validate(&form("a", 1.0)).unwrap_err();
        assert_eq!(
            errors.dish_name.as_deref(),
            Some("Dish name must be at least 2 characters")
        );
        assert!(errors.servings.is_none());
    }

    #[test]
    fn empty_form_reports_dish_name() {
        let errors = validate(&MealForm::default()).unwrap_err();
        assert!(errors.dish_name.is_some());
    }

    #[test]
    fn long_dish_is_rejected_but_exactly_max_is_fine() {
        assert!(validate(&form(&"a".repeat(100), 1.0)).is_ok());
        let errors = validate(&form(&"a".repeat(101), 1.0)).unwrap_err();
        assert_eq!(
            errors.dish_name.as_deref(),
            Some("Dish name must be less than 100 characters")
        );
    }

    #[test]
    fn restricted_charset() {
        assert!(validate(&form("Pizza, slice - 2.5", 1.0)).is_ok());
        let errors = validate(&form("Crème brûlée", 1.0)).unwrap_err();
        assert!(errors.dish_name.unwrap().starts_with("Dish name can only contain"));
        assert!(validate(&form("fish & chips", 1.0)).is_err());
    }

    #[test]
    fn servings_bounds_are_inclusive() {
        assert!(validate(&form("Rice", 0.1)).is_ok());
        assert!(validate(&form("Rice", 1000.0)).is_ok());
        assert_eq!(
            validate(&form("Rice", 0.0)).unwrap_err().servings.as_deref(),
            Some("Servings must be at least 0.1")
        );
        assert_eq!(
            validate(&form("Rice", 1000.5)).unwrap_err().servings.as_deref(),
            Some("Servings must be less than 1000")
        );
        assert_eq!(
            validate(&form("Rice", f64::NAN)).unwrap_err().servings.as_deref(),
            Some("Servings must be a number")
        );
    }

    #[test]
    fn both_fields_reported_together() {
        let errors = validate(&form("a", 0.0)).unwrap_err();
        assert!(errors.dish_name.is_some());
        assert!(errors.servings.is_some());
    }

    #[test]
    fn missing_category() {
        let mut f = form("Rice", 1.0);
        f.category = None;
        assert_eq!(
            validate(&f).unwrap_err().category.as_deref(),
            Some("Please select a category")
        );
    }

    #[test]
    fn form_defaults_match_a_fresh_dialog() {
        let f: MealForm = serde_json::from_str(r#"{"dish_name":"Rice"}"#).unwrap();
        assert_eq!(f.servings, Some(1.0));
        assert_eq!(f.category, Some(Category::Lunch));
    }
}
