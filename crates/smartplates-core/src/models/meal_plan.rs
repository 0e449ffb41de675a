// ABOUTME: Weekly meal plan model with per-day breakfast/lunch/dinner/snacks slots
// ABOUTME: Week starts are always normalized to the Monday of the given date
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::{AppError, AppResult, ErrorCode};

/// Number of day slots in a plan
pub const DAYS_PER_WEEK: usize = 7;

/// Meal slot within a day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    /// Breakfast meal
    Breakfast,
    /// Lunch meal
    Lunch,
    /// Dinner meal
    Dinner,
    /// Snacks between meals
    Snacks,
}

impl FromStr for MealType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" | "snacks" => Ok(Self::Snacks),
            other => Err(AppError::invalid_input(format!("Unknown meal type: {other}"))),
        }
    }
}

/// Reference to a recipe planned in a slot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealRef {
    /// Local or mirrored recipe id
    pub recipe_id: Uuid,
    /// Title snapshot taken when planned
    #[serde(default)]
    pub title: String,
    /// Servings to cook, 0 means the recipe's own servings
    #[serde(default)]
    pub servings: u32,
    /// Image snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One day of a plan
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DayPlan {
    /// Breakfast slot
    #[serde(default)]
    pub breakfast: Option<MealRef>,
    /// Lunch slot
    #[serde(default)]
    pub lunch: Option<MealRef>,
    /// Dinner slot
    #[serde(default)]
    pub dinner: Option<MealRef>,
    /// Snacks slot
    #[serde(default)]
    pub snacks: Option<MealRef>,
}

impl DayPlan {
    /// Mutable access to a slot
    pub fn slot_mut(&mut self, meal_type: MealType) -> &mut Option<MealRef> {
        match meal_type {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
            MealType::Snacks => &mut self.snacks,
        }
    }

    /// All filled slots of the day
    pub fn meals(&self) -> impl Iterator<Item = &MealRef> {
        [&self.breakfast, &self.lunch, &self.dinner, &self.snacks]
            .into_iter()
            .flatten()
    }
}

/// Monday of the ISO week containing `date`
///
/// # Errors
///
/// Returns `ValueOutOfRange` when that Monday falls before the earliest representable date
pub fn week_monday(date: NaiveDate) -> AppResult<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(
        date.weekday().num_days_from_monday(),
    )))
    .ok_or_else(|| {
        AppError::new(
            ErrorCode::ValueOutOfRange,
            format!("Date {date} has no representable week start"),
        )
    })
}

/// A user's plan for one week
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealPlan {
    /// Unique identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Monday of the planned week
    pub week_start: NaiveDate,
    /// Monday..Sunday
    pub days: Vec<DayPlan>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl MealPlan {
    /// Create a plan for the week containing `date`
    ///
    /// Missing trailing days are filled with empty slots.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when more than seven days are supplied and
    /// `ValueOutOfRange` when the week start is not representable
    pub fn new(
        user_id: Uuid,
        date: NaiveDate,
        days: Vec<DayPlan>,
        notes: Option<String>,
    ) -> AppResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            week_start: week_monday(date)?,
            days: normalize_days(days)?,
            notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// Set or clear one slot. `day` is 0 for Monday through 6 for Sunday.
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` for a day index outside the week
    pub fn set_slot(
        &mut self,
        day: usize,
        meal_type: MealType,
        meal: Option<MealRef>,
    ) -> AppResult<()> {
        let day_plan = self.days.get_mut(day).ok_or_else(|| {
            AppError::new(
                ErrorCode::ValueOutOfRange,
                format!("Day index {day} is outside 0..{DAYS_PER_WEEK}"),
            )
        })?;
        *day_plan.slot_mut(meal_type) = meal;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Every planned meal of the week
    pub fn meals(&self) -> impl Iterator<Item = &MealRef> {
        self.days.iter().flat_map(DayPlan::meals)
    }
}

fn normalize_days(mut days: Vec<DayPlan>) -> AppResult<Vec<DayPlan>> {
    if days.len() > DAYS_PER_WEEK {
        return Err(AppError::invalid_input(format!(
            "A meal plan has at most {DAYS_PER_WEEK} days, got {}",
            days.len()
        )));
    }
    days.resize_with(DAYS_PER_WEEK, DayPlan::default);
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_monday_normalization() {
        // 2024-05-15 is a Wednesday
        assert_eq!(week_monday(date(2024, 5, 15)).unwrap(), date(2024, 5, 13));
        assert_eq!(week_monday(date(2024, 5, 13)).unwrap(), date(2024, 5, 13));
        assert_eq!(week_monday(date(2024, 5, 19)).unwrap(), date(2024, 5, 13));
    }

    #[test]
    fn test_week_monday_before_min_date_is_rejected() {
        // NaiveDate::MIN is a Thursday, so its Monday is not representable
        let err = week_monday(NaiveDate::MIN).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert!(MealPlan::new(Uuid::new_v4(), NaiveDate::MIN, vec![], None).is_err());
        assert!(week_monday(NaiveDate::MAX).is_ok());
    }

    #[test]
    fn test_new_plan_pads_to_seven_days() {
        let plan = MealPlan::new(Uuid::new_v4(), date(2024, 5, 17), vec![], None).unwrap();
        assert_eq!(plan.days.len(), DAYS_PER_WEEK);
        assert_eq!(plan.week_start, date(2024, 5, 13));
    }

    #[test]
    fn test_set_slot_and_out_of_range() {
        let mut plan = MealPlan::new(Uuid::new_v4(), date(2024, 5, 13), vec![], None).unwrap();
        let meal = MealRef {
            recipe_id: Uuid::new_v4(),
            title: "Omelette".into(),
            servings: 2,
            image_url: None,
        };
        plan.set_slot(2, MealType::Breakfast, Some(meal.clone()))
            .unwrap();
        assert_eq!(plan.days[2].breakfast, Some(meal));
        assert_eq!(plan.meals().count(), 1);

        assert!(plan.set_slot(7, MealType::Lunch, None).is_err());
    }

    #[test]
    fn test_meal_type_parse_accepts_singular_snack() {
        assert_eq!("snack".parse::<MealType>().unwrap(), MealType::Snacks);
        assert!("brunch".parse::<MealType>().is_err());
    }
}
