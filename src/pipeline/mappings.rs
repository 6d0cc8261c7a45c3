use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// One of the eleven survey dimensions.
///
/// The declaration order is the model feature order. It is shared by the
/// training and prediction paths and must never diverge between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Age,
    Gender,
    WorkHours,
    ScreenTime,
    SleepTime,
    ExerciseFreq,
    Mood,
    Fatigue,
    Headache,
    WorkLifeBalance,
    SocialSupport,
}

impl Category {
    pub const COUNT: usize = 11;

    pub const fn ordered() -> [Self; Self::COUNT] {
        [
            Self::Age,
            Self::Gender,
            Self::WorkHours,
            Self::ScreenTime,
            Self::SleepTime,
            Self::ExerciseFreq,
            Self::Mood,
            Self::Fatigue,
            Self::Headache,
            Self::WorkLifeBalance,
            Self::SocialSupport,
        ]
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Field name in the prediction request body.
    pub const fn field(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::WorkHours => "work_hours",
            Self::ScreenTime => "screen_time",
            Self::SleepTime => "sleep_time",
            Self::ExerciseFreq => "exercise_freq",
            Self::Mood => "mood",
            Self::Fatigue => "fatigue",
            Self::Headache => "headache",
            Self::WorkLifeBalance => "work_life_balance",
            Self::SocialSupport => "social_support",
        }
    }

    /// Key in the mapping configuration resource.
    pub const fn mapping_key(self) -> &'static str {
        match self {
            Self::Age => "age_map",
            Self::Gender => "gender_map",
            Self::WorkHours => "work_hours_map",
            Self::ScreenTime => "screen_time_map",
            Self::SleepTime => "sleep_time_map",
            Self::ExerciseFreq => "exercise_freq_map",
            Self::Mood => "mood_map",
            Self::Fatigue => "fatigue_map",
            Self::Headache => "headache_map",
            Self::WorkLifeBalance => "work_life_balance_map",
            Self::SocialSupport => "social_support_map",
        }
    }

    /// Column header in the training dataset.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Gender => "Gender",
            Self::WorkHours => "Work hours",
            Self::ScreenTime => "Screen time",
            Self::SleepTime => "Sleep time",
            Self::ExerciseFreq => "Exercise frequency",
            Self::Mood => "Mood Stability",
            Self::Fatigue => "Fatigue level",
            Self::Headache => "Headache",
            Self::WorkLifeBalance => "Work_life Balance",
            Self::SocialSupport => "Social Support",
        }
    }

    /// Name of the encoded feature fed to the classifier.
    pub const fn feature_name(self) -> &'static str {
        match self {
            Self::Age => "Age_Code",
            Self::Gender => "Gender_Code",
            Self::WorkHours => "Work_Hours_Code",
            Self::ScreenTime => "Screen_Time_Code",
            Self::SleepTime => "Sleep_Time_Code",
            Self::ExerciseFreq => "Exercise_Freq_Code",
            Self::Mood => "Mood_Code",
            Self::Fatigue => "Fatigue_Code",
            Self::Headache => "Headache_Code",
            Self::WorkLifeBalance => "Work_Life_Balance_Code",
            Self::SocialSupport => "Social_Support_Code",
        }
    }

    /// Human-readable label for the landing page.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Gender => "Gender",
            Self::WorkHours => "Work hours",
            Self::ScreenTime => "Screen time",
            Self::SleepTime => "Sleep time",
            Self::ExerciseFreq => "Exercise frequency",
            Self::Mood => "Mood stability",
            Self::Fatigue => "Fatigue level",
            Self::Headache => "Headache",
            Self::WorkLifeBalance => "Work-life balance",
            Self::SocialSupport => "Social support",
        }
    }

    /// The ordered feature-name list the classifier is fitted against.
    pub fn feature_order() -> Vec<String> {
        Self::ordered()
            .iter()
            .map(|category| category.feature_name().to_string())
            .collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Raw-value to integer-code lookup tables, one per category.
///
/// Loaded once at startup from the mapping configuration resource and
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct MappingTable {
    tables: [HashMap<String, i64>; Category::COUNT],
}

impl MappingTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MappingError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, MappingError> {
        let document: Value = serde_json::from_reader(reader)?;
        Self::from_value(&document)
    }

    pub fn from_value(document: &Value) -> Result<Self, MappingError> {
        let mut tables: [HashMap<String, i64>; Category::COUNT] = Default::default();

        for category in Category::ordered() {
            let entry = document
                .get(category.mapping_key())
                .ok_or(MappingError::MissingCategory(category))?;
            let object = entry
                .as_object()
                .ok_or(MappingError::InvalidTable(category))?;

            let mut table = HashMap::with_capacity(object.len());
            for (raw_value, code) in object {
                let code = code
                    .as_i64()
                    .ok_or_else(|| MappingError::InvalidCode {
                        category,
                        value: raw_value.clone(),
                    })?;
                table.insert(raw_value.clone(), code);
            }
            tables[category.index()] = table;
        }

        Ok(Self { tables })
    }

    /// Looks up the integer code for a raw answer. `None` means the value is
    /// not part of the survey vocabulary for that category.
    pub fn code(&self, category: Category, value: &str) -> Option<i64> {
        self.tables[category.index()].get(value).copied()
    }

    /// Known raw values for a category, sorted by code for stable rendering.
    pub fn options(&self, category: Category) -> Vec<(&str, i64)> {
        let mut options: Vec<(&str, i64)> = self.tables[category.index()]
            .iter()
            .map(|(value, code)| (value.as_str(), *code))
            .collect();
        options.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        options
    }
}

#[derive(Debug)]
pub enum MappingError {
    Io(std::io::Error),
    Malformed(serde_json::Error),
    MissingCategory(Category),
    InvalidTable(Category),
    InvalidCode { category: Category, value: String },
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::Io(err) => write!(f, "failed to read mapping resource: {err}"),
            MappingError::Malformed(err) => write!(f, "mapping resource is not valid JSON: {err}"),
            MappingError::MissingCategory(category) => {
                write!(f, "mapping resource is missing '{}'", category.mapping_key())
            }
            MappingError::InvalidTable(category) => write!(
                f,
                "mapping '{}' must be an object of value -> code entries",
                category.mapping_key()
            ),
            MappingError::InvalidCode { category, value } => write!(
                f,
                "mapping '{}' entry '{}' must be an integer code",
                category.mapping_key(),
                value
            ),
        }
    }
}

impl std::error::Error for MappingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MappingError::Io(err) => Some(err),
            MappingError::Malformed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MappingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for MappingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> Value {
        json!({
            "age_map": { "18 - 24": 0, "25 - 34": 1 },
            "gender_map": { "Male": 0, "Female": 1 },
            "work_hours_map": { "6 - 8 hours": 0, "More than 10 hours": 1 },
            "screen_time_map": { "2 - 4 hours": 0, "More than 6 hours": 1 },
            "sleep_time_map": { "Less than 4 hours": 0, "7 - 8 hours": 1 },
            "exercise_freq_map": { "Never": 0, "Daily": 1 },
            "mood_map": { "Stable": 0, "Unstable": 1 },
            "fatigue_map": { "Rarely": 0, "Often": 1 },
            "headache_map": { "Never": 0, "Often": 1 },
            "work_life_balance_map": { "Not Balanced": 0, "Balanced": 1 },
            "social_support_map": { "Weak": 0, "Strong": 1 }
        })
    }

    #[test]
    fn loads_all_eleven_categories() {
        let table = MappingTable::from_value(&sample_document()).expect("mappings load");
        for category in Category::ordered() {
            assert!(
                !table.options(category).is_empty(),
                "category {category} should have options"
            );
        }
        assert_eq!(table.code(Category::Age, "25 - 34"), Some(1));
        assert_eq!(table.code(Category::Age, "999 years"), None);
    }

    #[test]
    fn rejects_missing_category_key() {
        let mut document = sample_document();
        document
            .as_object_mut()
            .expect("document is an object")
            .remove("headache_map");

        match MappingTable::from_value(&document) {
            Err(MappingError::MissingCategory(Category::Headache)) => {}
            other => panic!("expected missing headache_map error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_integer_codes() {
        let mut document = sample_document();
        document["mood_map"]["Stable"] = json!("zero");

        match MappingTable::from_value(&document) {
            Err(MappingError::InvalidCode {
                category: Category::Mood,
                value,
            }) => assert_eq!(value, "Stable"),
            other => panic!("expected invalid code error, got {other:?}"),
        }
    }

    #[test]
    fn options_are_sorted_by_code() {
        let table = MappingTable::from_value(&sample_document()).expect("mappings load");
        let options = table.options(Category::ExerciseFreq);
        assert_eq!(options, vec![("Never", 0), ("Daily", 1)]);
    }

    #[test]
    fn feature_order_matches_declaration_order() {
        let order = Category::feature_order();
        assert_eq!(order.len(), Category::COUNT);
        assert_eq!(order[0], "Age_Code");
        assert_eq!(order[10], "Social_Support_Code");
    }
}
