// src/progress.rs - Practice/test history and rolling accuracy
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

use crate::feedback;
use crate::prediction::SmoothedPrediction;

/// A practice attempt counts as correct above this confidence.
pub const PRACTICE_THRESHOLD: f64 = 0.6;
/// A correct attempt above this confidence marks the sign as learned.
pub const LEARNED_THRESHOLD: f64 = 0.8;
/// A timed test answer counts as correct above this confidence.
pub const TEST_THRESHOLD: f64 = 0.7;

pub const DEFAULT_ACCURACY_WINDOW: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub timestamp: DateTime<Utc>,
    pub predicted_class: String,
    pub confidence: f64,
    pub target_class: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub timestamp: DateTime<Utc>,
    pub question_class: String,
    pub answered_class: String,
    pub confidence: f64,
    pub is_correct: bool,
    /// Seconds the learner took to answer.
    pub time_spent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accuracy {
    pub overall: f64,
    pub by_sign: BTreeMap<String, f64>,
}

/// Everything an external store needs to persist and later restore progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressSnapshot {
    pub signs_learned: BTreeSet<String>,
    pub practice_attempts: Vec<AttemptRecord>,
    pub test_results: Vec<TestResult>,
    pub practice_minutes: u64,
    pub accuracy: Accuracy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgress {
    pub total_attempts: usize,
    pub correct_attempts: usize,
    pub unique_signs: usize,
    pub average_confidence: f64,
}

pub struct ProgressAggregator {
    signs_learned: BTreeSet<String>,
    practice_attempts: Vec<AttemptRecord>,
    test_results: Vec<TestResult>,
    practice_minutes: u64,
    accuracy: Accuracy,
    window: usize,
    session_start: Option<DateTime<Utc>>,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_ACCURACY_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            signs_learned: BTreeSet::new(),
            practice_attempts: Vec::new(),
            test_results: Vec::new(),
            practice_minutes: 0,
            accuracy: Accuracy::default(),
            window: window.max(1),
            session_start: None,
        }
    }

    pub fn record_attempt(&mut self, prediction: &SmoothedPrediction, target_class: &str) -> AttemptRecord {
        self.record_attempt_at(prediction, target_class, Utc::now())
    }

    pub fn record_attempt_at(
        &mut self,
        prediction: &SmoothedPrediction,
        target_class: &str,
        timestamp: DateTime<Utc>,
    ) -> AttemptRecord {
        let confidence = prediction.confidence();
        let is_correct = prediction.class() == target_class && confidence > PRACTICE_THRESHOLD;

        let record = AttemptRecord {
            timestamp,
            predicted_class: prediction.class().to_string(),
            confidence,
            target_class: target_class.to_string(),
            is_correct,
        };
        self.practice_attempts.push(record.clone());

        if is_correct && confidence > LEARNED_THRESHOLD && self.signs_learned.insert(target_class.to_string()) {
            info!("Sign '{}' learned", target_class);
        }

        self.update_accuracy();
        debug!(
            "Attempt at '{}': predicted '{}' ({:.2}), correct={}",
            target_class, record.predicted_class, confidence, is_correct
        );
        record
    }

    pub fn record_test_result(
        &mut self,
        question_class: &str,
        prediction: &SmoothedPrediction,
        time_spent: f64,
    ) -> TestResult {
        let confidence = prediction.confidence();
        let result = TestResult {
            timestamp: Utc::now(),
            question_class: question_class.to_string(),
            answered_class: prediction.class().to_string(),
            confidence,
            is_correct: prediction.class() == question_class && feedback::test_passed(confidence),
            time_spent,
        };
        self.test_results.push(result.clone());
        result
    }

    pub fn start_session(&mut self) {
        self.start_session_at(Utc::now());
    }

    pub fn start_session_at(&mut self, now: DateTime<Utc>) {
        self.session_start = Some(now);
    }

    pub fn end_session(&mut self) {
        self.end_session_at(Utc::now());
    }

    /// Adds the elapsed session time, rounded to whole minutes.
    pub fn end_session_at(&mut self, now: DateTime<Utc>) {
        if let Some(start) = self.session_start.take() {
            let seconds = (now - start).num_seconds().max(0) as f64;
            self.practice_minutes += (seconds / 60.0).round() as u64;
        }
    }

    fn update_accuracy(&mut self) {
        let skip = self.practice_attempts.len().saturating_sub(self.window);
        let recent = &self.practice_attempts[skip..];

        let correct = recent.iter().filter(|a| a.is_correct).count();
        self.accuracy.overall = if recent.is_empty() {
            0.0
        } else {
            correct as f64 / recent.len() as f64
        };

        let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for attempt in recent {
            let entry = groups.entry(attempt.target_class.as_str()).or_insert((0, 0));
            entry.0 += 1;
            if attempt.is_correct {
                entry.1 += 1;
            }
        }

        self.accuracy.by_sign = groups
            .into_iter()
            .map(|(sign, (total, correct))| (sign.to_string(), correct as f64 / total as f64))
            .collect();
    }

    pub fn overall_accuracy(&self) -> f64 {
        self.accuracy.overall
    }

    pub fn accuracy_for(&self, sign: &str) -> Option<f64> {
        self.accuracy.by_sign.get(sign).copied()
    }

    pub fn accuracy(&self) -> &Accuracy {
        &self.accuracy
    }

    pub fn is_learned(&self, sign: &str) -> bool {
        self.signs_learned.contains(sign)
    }

    pub fn signs_learned(&self) -> &BTreeSet<String> {
        &self.signs_learned
    }

    pub fn practice_attempts(&self) -> &[AttemptRecord] {
        &self.practice_attempts
    }

    pub fn test_results(&self) -> &[TestResult] {
        &self.test_results
    }

    pub fn practice_minutes(&self) -> u64 {
        self.practice_minutes
    }

    /// Confidence of the last `n` practice attempts, oldest first.
    pub fn recent_confidences(&self, n: usize) -> Vec<f64> {
        let skip = self.practice_attempts.len().saturating_sub(n);
        self.practice_attempts[skip..].iter().map(|a| a.confidence).collect()
    }

    pub fn weekly_progress(&self, now: DateTime<Utc>) -> WeeklyProgress {
        let week_ago = now - Duration::days(7);
        let weekly: Vec<&AttemptRecord> = self
            .practice_attempts
            .iter()
            .filter(|a| a.timestamp > week_ago)
            .collect();

        let unique: HashSet<&str> = weekly.iter().map(|a| a.target_class.as_str()).collect();
        let average_confidence = if weekly.is_empty() {
            0.0
        } else {
            weekly.iter().map(|a| a.confidence).sum::<f64>() / weekly.len() as f64
        };

        WeeklyProgress {
            total_attempts: weekly.len(),
            correct_attempts: weekly.iter().filter(|a| a.is_correct).count(),
            unique_signs: unique.len(),
            average_confidence,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            signs_learned: self.signs_learned.clone(),
            practice_attempts: self.practice_attempts.clone(),
            test_results: self.test_results.clone(),
            practice_minutes: self.practice_minutes,
            accuracy: self.accuracy.clone(),
        }
    }

    /// Replaces all state with a stored snapshot. Accuracy is recomputed from
    /// the attempts rather than trusted.
    pub fn restore(&mut self, snapshot: ProgressSnapshot) {
        self.signs_learned = snapshot.signs_learned;
        self.practice_attempts = snapshot.practice_attempts;
        self.test_results = snapshot.test_results;
        self.practice_minutes = snapshot.practice_minutes;
        self.session_start = None;
        self.update_accuracy();
    }

    pub fn reset(&mut self) {
        *self = Self::with_window(self.window);
    }
}

impl Default for ProgressAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) fn smoothed(class: &str, confidence: f64) -> SmoothedPrediction {
    use crate::prediction::Prediction;
    SmoothedPrediction {
        prediction: Prediction {
            class: class.to_string(),
            class_index: crate::labels::index_of(class),
            confidence,
            probabilities: vec![],
            corrections: vec![],
            mode: None,
        },
        raw_confidence: confidence,
    }
}
