use crate::pipeline::encoding::{encode, EncodeError, EncodedSample, SurveyAnswers};
use crate::pipeline::labels::{derive_labels, StressLevel};
use crate::pipeline::mappings::{Category, MappingTable};
use linfa::prelude::*;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Ensemble size and seed are fixed so retraining on the same dataset
/// reproduces the same forest.
pub const ENSEMBLE_TREES: usize = 100;
pub const ENSEMBLE_SEED: u64 = 42;

/// Knuth MMIX linear congruential generator, used only for bootstrap
/// sampling so training needs no external randomness source.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }
}

/// Bagged ensemble of Gini decision trees over the encoded survey features.
///
/// Each tree is fitted on a bootstrap resample of the training set; a
/// prediction is the majority vote across trees, ties broken toward the
/// lower class so inference stays deterministic.
#[derive(Serialize, Deserialize)]
pub struct StressForest {
    trees: Vec<DecisionTree<f64, usize>>,
}

impl StressForest {
    pub fn fit(features: &Array2<f64>, targets: &Array1<usize>) -> Result<Self, TrainingError> {
        let rows = features.nrows();
        if rows == 0 {
            return Err(TrainingError::NoTrainableRows { total: 0, dropped: 0 });
        }

        let mut rng = Lcg::new(ENSEMBLE_SEED);
        let mut trees = Vec::with_capacity(ENSEMBLE_TREES);

        for _ in 0..ENSEMBLE_TREES {
            let indices: Vec<usize> = (0..rows)
                .map(|_| (rng.next() % rows as u64) as usize)
                .collect();
            let dataset = Dataset::new(
                features.select(Axis(0), &indices),
                targets.select(Axis(0), &indices),
            );
            let tree = DecisionTree::<f64, usize>::params()
                .fit(&dataset)
                .map_err(|err| TrainingError::Classifier(err.to_string()))?;
            trees.push(tree);
        }

        Ok(Self { trees })
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Majority-vote class per input row. `None` for an unfitted forest.
    pub fn predict(&self, features: &Array2<f64>) -> Option<Vec<usize>> {
        if self.trees.is_empty() {
            return None;
        }

        let mut votes = vec![BTreeMap::<usize, usize>::new(); features.nrows()];
        for tree in &self.trees {
            let classes = tree.predict(features);
            for (row, class) in classes.iter().enumerate() {
                *votes[row].entry(*class).or_insert(0) += 1;
            }
        }

        votes
            .into_iter()
            .map(|counts| {
                counts
                    .into_iter()
                    .max_by_key(|&(class, count)| (count, std::cmp::Reverse(class)))
                    .map(|(class, _)| class)
            })
            .collect()
    }

    /// Global feature importance: per-tree impurity decrease averaged across
    /// the ensemble and normalized to sum to 1.0. A forest that never splits
    /// (single-class training set) reports uniform weights.
    pub fn feature_importances(&self, n_features: usize) -> Vec<f64> {
        let mut totals = vec![0.0; n_features];
        for tree in &self.trees {
            for (index, value) in tree.feature_importance().iter().enumerate() {
                if index < n_features {
                    totals[index] += f64::from(*value);
                }
            }
        }

        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for value in &mut totals {
                *value /= sum;
            }
        } else {
            totals.fill(1.0 / n_features as f64);
        }
        totals
    }
}

/// A fitted classifier plus the exact feature order it was fitted with.
/// Persisted and loaded as a unit so predictions can never be built in a
/// different order than training used.
pub struct TrainedStressModel {
    pub forest: StressForest,
    pub feature_order: Vec<String>,
    pub importance: Vec<f64>,
}

impl TrainedStressModel {
    pub fn predict(&self, sample: &EncodedSample) -> Option<StressLevel> {
        let features =
            Array2::from_shape_vec((1, Category::COUNT), sample.feature_row().to_vec()).ok()?;
        let classes = self.forest.predict(&features)?;
        StressLevel::from_class(*classes.first()?)
    }

    /// Feature names paired with their global importance, in model order.
    pub fn importance_pairs(&self) -> Vec<(String, f64)> {
        self.feature_order
            .iter()
            .cloned()
            .zip(self.importance.iter().copied())
            .collect()
    }
}

/// Counters describing one training run, logged at startup and rendered by
/// the `train` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingReport {
    pub total_rows: usize,
    pub trained_rows: usize,
    /// Rows containing a raw value absent from its category mapping.
    pub dropped_unmapped: usize,
    /// Rows whose stress score fell outside every label bin.
    pub dropped_unlabeled: usize,
    pub class_counts: [usize; 3],
}

/// One row of the training dataset. Header whitespace is trimmed by the
/// reader, so the renames only need the canonical column names.
#[derive(Debug, Deserialize)]
struct DatasetRow {
    #[serde(rename = "Age")]
    age: String,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Work hours")]
    work_hours: String,
    #[serde(rename = "Screen time")]
    screen_time: String,
    #[serde(rename = "Sleep time")]
    sleep_time: String,
    #[serde(rename = "Exercise frequency")]
    exercise_freq: String,
    #[serde(rename = "Mood Stability")]
    mood: String,
    #[serde(rename = "Fatigue level")]
    fatigue: String,
    #[serde(rename = "Headache")]
    headache: String,
    #[serde(rename = "Work_life Balance")]
    work_life_balance: String,
    #[serde(rename = "Social Support")]
    social_support: String,
}

impl From<DatasetRow> for SurveyAnswers {
    fn from(row: DatasetRow) -> Self {
        Self {
            age: row.age,
            gender: row.gender,
            work_hours: row.work_hours,
            screen_time: row.screen_time,
            sleep_time: row.sleep_time,
            exercise_freq: row.exercise_freq,
            mood: row.mood,
            fatigue: row.fatigue,
            headache: row.headache,
            work_life_balance: row.work_life_balance,
            social_support: row.social_support,
        }
    }
}

pub fn train_from_path<P: AsRef<Path>>(
    path: P,
    mappings: &MappingTable,
) -> Result<(TrainedStressModel, TrainingReport), TrainingError> {
    let file = File::open(path)?;
    train_from_reader(file, mappings)
}

/// Encodes every dataset row, derives labels from the score distribution and
/// fits the ensemble. Rows with unmapped values or unbinnable scores are
/// dropped and counted rather than failing the run; an empty remainder is
/// fatal.
pub fn train_from_reader<R: Read>(
    reader: R,
    mappings: &MappingTable,
) -> Result<(TrainedStressModel, TrainingReport), TrainingError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut total_rows = 0;
    let mut dropped_unmapped = 0;
    let mut samples: Vec<EncodedSample> = Vec::new();

    for record in csv_reader.deserialize::<DatasetRow>() {
        let row = record?;
        total_rows += 1;

        let answers = SurveyAnswers::from(row);
        match encode(&answers, mappings) {
            Ok(sample) => samples.push(sample),
            Err(err @ EncodeError::UnknownValue { .. }) => {
                warn!(row = total_rows, %err, "dropping dataset row");
                dropped_unmapped += 1;
            }
        }
    }

    let derivation = derive_labels(&samples).ok_or(TrainingError::NoTrainableRows {
        total: total_rows,
        dropped: dropped_unmapped,
    })?;

    let mut rows: Vec<f64> = Vec::with_capacity(samples.len() * Category::COUNT);
    let mut targets: Vec<usize> = Vec::with_capacity(samples.len());
    let mut class_counts = [0usize; 3];

    for (sample, level) in samples.iter().zip(derivation.levels.iter()) {
        if let Some(level) = level {
            rows.extend_from_slice(&sample.feature_row());
            targets.push(level.class());
            class_counts[level.class()] += 1;
        }
    }

    if derivation.dropped > 0 {
        warn!(
            dropped = derivation.dropped,
            "rows excluded from training: score fell outside every label bin"
        );
    }

    if targets.is_empty() {
        return Err(TrainingError::NoTrainableRows {
            total: total_rows,
            dropped: dropped_unmapped + derivation.dropped,
        });
    }

    let features = Array2::from_shape_vec((targets.len(), Category::COUNT), rows)
        .map_err(|err| TrainingError::Classifier(err.to_string()))?;
    let targets = Array1::from_vec(targets);

    let forest = StressForest::fit(&features, &targets)?;
    let importance = forest.feature_importances(Category::COUNT);

    let report = TrainingReport {
        total_rows,
        trained_rows: targets.len(),
        dropped_unmapped,
        dropped_unlabeled: derivation.dropped,
        class_counts,
    };

    Ok((
        TrainedStressModel {
            forest,
            feature_order: Category::feature_order(),
            importance,
        },
        report,
    ))
}

/// The persisted model pair: fitted forest plus ordered feature-name list.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub model_path: PathBuf,
    pub features_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    Cached,
    Trained,
}

impl ModelSource {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Trained => "trained",
        }
    }
}

/// Loads the persisted model if both artifacts are present and consistent
/// with the current encoder order; otherwise trains from the dataset and
/// persists the result. Runs once at startup; training failure is fatal.
pub fn load_or_train(
    artifacts: &ModelArtifacts,
    dataset_path: &Path,
    mappings: &MappingTable,
) -> Result<(TrainedStressModel, ModelSource), TrainingError> {
    if let Some(model) = load_cached(artifacts) {
        info!(trees = model.forest.len(), "loaded persisted model");
        return Ok((model, ModelSource::Cached));
    }

    info!(dataset = %dataset_path.display(), "no usable persisted model; training");
    let (model, report) = train_from_path(dataset_path, mappings)?;
    info!(
        total = report.total_rows,
        trained = report.trained_rows,
        dropped_unmapped = report.dropped_unmapped,
        dropped_unlabeled = report.dropped_unlabeled,
        "model training complete"
    );

    persist(artifacts, &model)?;
    Ok((model, ModelSource::Trained))
}

fn load_cached(artifacts: &ModelArtifacts) -> Option<TrainedStressModel> {
    let features_file = File::open(&artifacts.features_path).ok()?;
    let feature_order: Vec<String> = serde_json::from_reader(features_file).ok()?;
    if feature_order != Category::feature_order() {
        warn!("persisted feature order does not match the encoder; retraining");
        return None;
    }

    let model_file = File::open(&artifacts.model_path).ok()?;
    let forest: StressForest = serde_json::from_reader(model_file).ok()?;
    let importance = forest.feature_importances(Category::COUNT);

    Some(TrainedStressModel {
        forest,
        feature_order,
        importance,
    })
}

pub fn persist(artifacts: &ModelArtifacts, model: &TrainedStressModel) -> Result<(), TrainingError> {
    let model_file = File::create(&artifacts.model_path)?;
    serde_json::to_writer(model_file, &model.forest)?;

    let features_file = File::create(&artifacts.features_path)?;
    serde_json::to_writer(features_file, &model.feature_order)?;
    Ok(())
}

#[derive(Debug)]
pub enum TrainingError {
    Io(std::io::Error),
    Csv(csv::Error),
    NoTrainableRows { total: usize, dropped: usize },
    Classifier(String),
    Artifact(serde_json::Error),
}

impl fmt::Display for TrainingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingError::Io(err) => write!(f, "failed to read training dataset: {err}"),
            TrainingError::Csv(err) => write!(f, "invalid training dataset: {err}"),
            TrainingError::NoTrainableRows { total, dropped } => write!(
                f,
                "no trainable rows remain ({total} read, {dropped} dropped)"
            ),
            TrainingError::Classifier(message) => {
                write!(f, "classifier training failed: {message}")
            }
            TrainingError::Artifact(err) => write!(f, "failed to persist model artifact: {err}"),
        }
    }
}

impl std::error::Error for TrainingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrainingError::Io(err) => Some(err),
            TrainingError::Csv(err) => Some(err),
            TrainingError::Artifact(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TrainingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for TrainingError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for TrainingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Artifact(err)
    }
}
