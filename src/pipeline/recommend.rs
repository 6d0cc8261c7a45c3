use crate::pipeline::encoding::SurveyAnswers;
use crate::pipeline::labels::StressLevel;

const RESTFUL_SLEEP: [&str; 2] = ["7 - 8 hours", "More than 8 hours"];
const SHORT_SLEEP: [&str; 2] = ["Less than 4 hours", "4 - 6 hours"];
const ACTIVE_EXERCISE: [&str; 3] = ["3 - 4 times per week", "5+ times per week", "Daily"];
const RARE_EXERCISE: [&str; 2] = ["Never", "1 - 2 times per week"];

const GENERIC_SUGGESTIONS: [&str; 2] = [
    "Practice stress-reduction techniques like deep breathing or progressive muscle relaxation",
    "Maintain a consistent daily routine with regular meal times",
];

/// Fixed decision table keyed on the predicted level and the raw sleep and
/// exercise answers. Pure and deterministic; always returns at most two
/// suggestions, in generation order.
pub fn recommend(answers: &SurveyAnswers, prediction: StressLevel) -> Vec<String> {
    let sleep = answers.sleep_time.as_str();
    let exercise = answers.exercise_freq.as_str();

    let mut recommendations: Vec<String> = Vec::with_capacity(2);

    if prediction == StressLevel::Low {
        if RESTFUL_SLEEP.contains(&sleep) && ACTIVE_EXERCISE.contains(&exercise) {
            recommendations
                .push("Great job! Keep maintaining your current healthy lifestyle".to_string());
            recommendations
                .push("Continue your exercise routine and good sleep habits".to_string());
        } else {
            recommendations.push("Keep maintaining your current healthy lifestyle".to_string());
            recommendations.push(
                "Consider adding stress-relief activities like meditation or yoga".to_string(),
            );
        }
    } else {
        if SHORT_SLEEP.contains(&sleep) {
            recommendations.push(
                "Prioritize getting 7-8 hours of sleep per night for optimal stress management"
                    .to_string(),
            );
        }
        if RARE_EXERCISE.contains(&exercise) {
            recommendations.push(
                "Increase physical activity to at least 3-4 times per week to reduce stress"
                    .to_string(),
            );
        }

        if recommendations.len() < 2 {
            recommendations.extend(GENERIC_SUGGESTIONS.iter().map(|s| s.to_string()));
        }
    }

    recommendations.truncate(2);
    recommendations
}
