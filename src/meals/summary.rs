use std::collections::BTreeMap;

use serde::Serialize;
use time::{macros::format_description, Date, UtcOffset};

use crate::meals::types::{Category, TrackingMeal};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CategoryGroup {
    pub meals: Vec<TrackingMeal>,
    pub total_calories: f64,
}

impl CategoryGroup {
    fn push(&mut self, meal: &TrackingMeal) {
        self.total_calories += meal.total_calories;
        self.meals.push(meal.clone());
    }
}

/// Today's meals split into the four categories, with a daily total.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CategoryBreakdown {
    pub breakfast: CategoryGroup,
    pub lunch: CategoryGroup,
    pub dinner: CategoryGroup,
    pub snack: CategoryGroup,
    pub total_calories: f64,
}

impl CategoryBreakdown {
    pub fn group(&self, category: Category) -> &CategoryGroup {
        match category {
            Category::Breakfast => &self.breakfast,
            Category::Lunch => &self.lunch,
            Category::Dinner => &self.dinner,
            Category::Snack => &self.snack,
        }
    }

    fn group_mut(&mut self, category: Category) -> &mut CategoryGroup {
        match category {
            Category::Breakfast => &mut self.breakfast,
            Category::Lunch => &mut self.lunch,
            Category::Dinner => &mut self.dinner,
            Category::Snack => &mut self.snack,
        }
    }
}

pub fn by_category<'a>(meals: impl IntoIterator<Item = &'a TrackingMeal>) -> CategoryBreakdown {
    let mut out = CategoryBreakdown::default();
    for meal in meals {
        out.group_mut(meal.category).push(meal);
        out.total_calories += meal.total_calories;
    }
    out
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayLog {
    /// Local calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub meals: Vec<TrackingMeal>,
    pub total_calories: f64,
}

/// Groups history by local calendar day, newest day first. Meals keep their
/// insertion order inside a day.
pub fn history_by_day(history: &[TrackingMeal], offset: UtcOffset) -> Vec<DayLog> {
    let mut days: BTreeMap<Date, Vec<&TrackingMeal>> = BTreeMap::new();
    for meal in history {
        days.entry(meal.created_at.to_offset(offset).date())
            .or_default()
            .push(meal);
    }

    let fmt = format_description!("[year]-[month]-[day]");
    days.into_iter()
        .rev()
        .map(|(date, meals)| DayLog {
            date: date.format(&fmt).unwrap_or_else(|_| date.to_string()),
            total_calories: meals.iter().map(|m| m.total_calories).sum(),
            meals: meals.into_iter().cloned().collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};
    use uuid::Uuid;

    fn tracked(dish: &str, category: Category, total: f64, at: time::OffsetDateTime) -> TrackingMeal {
        TrackingMeal {
            id: Uuid::new_v4(),
            dish_name: dish.into(),
            servings: 1.0,
            calories_per_serving: total,
            total_calories: total,
            source: "test".into(),
            category,
            created_at: at,
            is_search_result: false,
        }
    }

    #[test]
    fn by_category_sums_each_group_and_the_day() {
        let at = datetime!(2024-06-10 08:00 UTC);
        let meals = vec![
            tracked("Eggs", Category::Breakfast, 156.0, at),
            tracked("Toast", Category::Breakfast, 80.0, at),
            tracked("Salad", Category::Lunch, 320.0, at),
            tracked("Apple", Category::Snack, 95.0, at),
        ];

        let b = by_category(&meals);
        assert_eq!(b.breakfast.meals.len(), 2);
        assert_eq!(b.breakfast.total_calories, 236.0);
        assert_eq!(b.group(Category::Lunch).total_calories, 320.0);
        assert!(b.dinner.meals.is_empty());
        assert_eq!(b.dinner.total_calories, 0.0);
        assert_eq!(b.total_calories, 651.0);
    }

    #[test]
    fn history_groups_by_local_day_newest_first() {
        let history = vec![
            tracked("A", Category::Lunch, 100.0, datetime!(2024-06-08 12:00 UTC)),
            tracked("B", Category::Dinner, 200.0, datetime!(2024-06-09 21:30 UTC)),
            tracked("C", Category::Lunch, 300.0, datetime!(2024-06-09 12:00 UTC)),
        ];

        let days = history_by_day(&history, offset!(+3));
        let dates: Vec<_> = days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-06-10", "2024-06-09", "2024-06-08"]);
        assert_eq!(days[0].meals[0].dish_name, "B");
        assert_eq!(days[1].total_calories, 300.0);
    }

    #[test]
    fn history_day_keeps_insertion_order() {
        let history = vec![
            tracked("Late", Category::Dinner, 1.0, datetime!(2024-06-09 20:00 UTC)),
            tracked("Early", Category::Breakfast, 1.0, datetime!(2024-06-09 07:00 UTC)),
        ];
        let days = history_by_day(&history, UtcOffset::UTC);
        let names: Vec<_> = days[0].meals.iter().map(|m| m.dish_name.as_str()).collect();
        assert_eq!(names, vec!["Late", "Early"]);
    }
}
