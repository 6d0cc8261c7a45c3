//! Shared fixtures for in-crate tests: a complete mapping table, a small
//! synthetic dataset with an even three-way label split, and prototype
//! answer sets for each stress band.

use crate::pipeline::encoding::SurveyAnswers;
use crate::pipeline::mappings::MappingTable;
use crate::pipeline::model::ModelArtifacts;
use serde_json::json;

pub(crate) fn mappings() -> MappingTable {
    MappingTable::from_value(&json!({
        "age_map": { "18 - 24": 0, "25 - 34": 1, "35 - 44": 2 },
        "gender_map": { "Male": 0, "Female": 1 },
        "work_hours_map": { "6 - 8 hours": 0, "9 - 10 hours": 1, "More than 10 hours": 2 },
        "screen_time_map": { "2 - 4 hours": 0, "4 - 6 hours": 1, "More than 6 hours": 2 },
        "sleep_time_map": { "Less than 4 hours": 0, "4 - 6 hours": 1, "7 - 8 hours": 2, "More than 8 hours": 3 },
        "exercise_freq_map": { "Never": 0, "1 - 2 times per week": 1, "3 - 4 times per week": 2, "5+ times per week": 3, "Daily": 4 },
        "mood_map": { "Stable": 0, "Somewhat Stable": 1, "Unstable": 2 },
        "fatigue_map": { "Rarely": 0, "Sometimes": 1, "Often": 2 },
        "headache_map": { "Never": 0, "Sometimes": 1, "Often": 2 },
        "work_life_balance_map": { "Not Balanced": 0, "Somewhat Balanced": 1, "Balanced": 2 },
        "social_support_map": { "None": 0, "Weak": 1, "Strong": 2 }
    }))
    .expect("test mapping table is valid")
}

/// Stress score: 0 + 0 + 0 - 2 - 2 = -4 (bottom of the range).
pub(crate) fn calm_answers() -> SurveyAnswers {
    SurveyAnswers {
        age: "18 - 24".to_string(),
        gender: "Female".to_string(),
        work_hours: "6 - 8 hours".to_string(),
        screen_time: "2 - 4 hours".to_string(),
        sleep_time: "More than 8 hours".to_string(),
        exercise_freq: "Daily".to_string(),
        mood: "Stable".to_string(),
        fatigue: "Rarely".to_string(),
        headache: "Never".to_string(),
        work_life_balance: "Balanced".to_string(),
        social_support: "Strong".to_string(),
    }
}

/// Stress score: 1 + 1 + 1 - 1 - 1 = 1 (middle of the range).
pub(crate) fn middling_answers() -> SurveyAnswers {
    SurveyAnswers {
        age: "25 - 34".to_string(),
        gender: "Male".to_string(),
        work_hours: "9 - 10 hours".to_string(),
        screen_time: "4 - 6 hours".to_string(),
        sleep_time: "4 - 6 hours".to_string(),
        exercise_freq: "1 - 2 times per week".to_string(),
        mood: "Somewhat Stable".to_string(),
        fatigue: "Sometimes".to_string(),
        headache: "Sometimes".to_string(),
        work_life_balance: "Somewhat Balanced".to_string(),
        social_support: "Weak".to_string(),
    }
}

/// Stress score: 2 + 2 + 2 - 0 - 0 = 6 (top of the range).
pub(crate) fn stressed_answers() -> SurveyAnswers {
    SurveyAnswers {
        age: "35 - 44".to_string(),
        gender: "Male".to_string(),
        work_hours: "More than 10 hours".to_string(),
        screen_time: "More than 6 hours".to_string(),
        sleep_time: "Less than 4 hours".to_string(),
        exercise_freq: "Never".to_string(),
        mood: "Unstable".to_string(),
        fatigue: "Often".to_string(),
        headache: "Often".to_string(),
        work_life_balance: "Not Balanced".to_string(),
        social_support: "None".to_string(),
    }
}

/// 24 rows: the three prototypes repeated 8 times each, yielding scores
/// -4 / 1 / 6 and an even Low/Medium/High split. Header cells carry stray
/// whitespace to exercise header trimming.
pub(crate) fn dataset_csv() -> String {
    let mut csv = String::from(
        " Age ,Gender, Work hours ,Screen time,Sleep time,Exercise frequency,\
         Mood Stability ,Fatigue level,Headache, Work_life Balance ,Social Support\n",
    );

    let prototypes = [calm_answers(), middling_answers(), stressed_answers()];
    for _ in 0..8 {
        for answers in &prototypes {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{}\n",
                answers.age,
                answers.gender,
                answers.work_hours,
                answers.screen_time,
                answers.sleep_time,
                answers.exercise_freq,
                answers.mood,
                answers.fatigue,
                answers.headache,
                answers.work_life_balance,
                answers.social_support,
            ));
        }
    }
    csv
}

pub(crate) fn temp_artifacts(tag: &str) -> ModelArtifacts {
    let dir = std::env::temp_dir();
    let pid = std::process::id();
    ModelArtifacts {
        model_path: dir.join(format!("stress-ai-{tag}-{pid}-model.json")),
        features_path: dir.join(format!("stress-ai-{tag}-{pid}-features.json")),
    }
}

pub(crate) fn cleanup(artifacts: &ModelArtifacts) {
    let _ = std::fs::remove_file(&artifacts.model_path);
    let _ = std::fs::remove_file(&artifacts.features_path);
}
