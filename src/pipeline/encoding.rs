use crate::pipeline::mappings::{Category, MappingTable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One complete set of raw survey answers, either a live request body or a
/// historical dataset row. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyAnswers {
    pub age: String,
    pub gender: String,
    pub work_hours: String,
    pub screen_time: String,
    pub sleep_time: String,
    pub exercise_freq: String,
    pub mood: String,
    pub fatigue: String,
    pub headache: String,
    pub work_life_balance: String,
    pub social_support: String,
}

impl SurveyAnswers {
    pub fn answer(&self, category: Category) -> &str {
        match category {
            Category::Age => &self.age,
            Category::Gender => &self.gender,
            Category::WorkHours => &self.work_hours,
            Category::ScreenTime => &self.screen_time,
            Category::SleepTime => &self.sleep_time,
            Category::ExerciseFreq => &self.exercise_freq,
            Category::Mood => &self.mood,
            Category::Fatigue => &self.fatigue,
            Category::Headache => &self.headache,
            Category::WorkLifeBalance => &self.work_life_balance,
            Category::SocialSupport => &self.social_support,
        }
    }
}

/// The eleven integer codes for one survey record, in model feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedSample {
    codes: [i64; Category::COUNT],
}

impl EncodedSample {
    pub fn code(&self, category: Category) -> i64 {
        self.codes[category.index()]
    }

    /// The classifier's input row, in the fixed feature order.
    pub fn feature_row(&self) -> [f64; Category::COUNT] {
        let mut row = [0.0; Category::COUNT];
        for (slot, code) in row.iter_mut().zip(self.codes.iter()) {
            *slot = *code as f64;
        }
        row
    }
}

/// Translates raw answers into codes. Fails on the first answer that is not
/// part of its category's vocabulary; during prediction this surfaces as a
/// client error naming the offending field.
pub fn encode(
    answers: &SurveyAnswers,
    mappings: &MappingTable,
) -> Result<EncodedSample, EncodeError> {
    let mut codes = [0i64; Category::COUNT];
    for category in Category::ordered() {
        let value = answers.answer(category);
        codes[category.index()] =
            mappings
                .code(category, value)
                .ok_or_else(|| EncodeError::UnknownValue {
                    category,
                    value: value.to_string(),
                })?;
    }
    Ok(EncodedSample { codes })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    UnknownValue { category: Category, value: String },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::UnknownValue { category, value } => {
                write!(f, "no {category} mapping entry for value '{value}'")
            }
        }
    }
}

impl std::error::Error for EncodeError {}
