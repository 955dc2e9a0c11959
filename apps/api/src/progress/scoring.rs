//! Crack score: a 0–100 readiness number blended from roadmap completion, mock
//! interview performance and engagement volume.
//!
//! Everything here is a pure function of a [`ScoreHistory`] snapshot. Loading the
//! snapshot and caching the result on the user live in `calculator`.

use serde::{Deserialize, Serialize};

use crate::models::roadmap::RoadmapTally;

pub const RECOMMEND_MORE_TASKS: &str =
    "Complete more tasks in your roadmap to improve your preparation score";
pub const RECOMMEND_MORE_INTERVIEWS: &str =
    "Practice more interviews to improve your performance score";
pub const RECOMMEND_CONSISTENCY: &str = "Maintain consistent daily activity to build momentum";
pub const RECOMMEND_READY: &str = "Excellent progress! You're ready to apply for positions";
pub const RECOMMEND_KEEP_GOING: &str = "Keep up the good work! Continue practicing regularly";

/// Score granted for owning at least one roadmap, before any task exists.
const ROADMAP_PARTICIPATION_FLOOR: i64 = 30;
const ROADMAP_COMPLETION_SPAN: i64 = 70;
const CONSISTENCY_POINTS_PER_ITEM: i64 = 10;
const IMPROVEMENT_THRESHOLD: i32 = 50;
const READY_THRESHOLD: i32 = 80;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub roadmap: f64,
    pub interview: f64,
    pub consistency: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            roadmap: 0.4,
            interview: 0.4,
            consistency: 0.2,
        }
    }
}

/// Raw history a score is computed from, read in one consistent view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreHistory {
    pub roadmaps: Vec<RoadmapTally>,
    /// One entry per interview; `None` for interviews that were never scored.
    pub interview_scores: Vec<Option<i32>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub roadmap_score: i32,
    pub interview_score: i32,
    pub consistency_score: i32,
    pub total_roadmaps: i64,
    pub total_interviews: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: i32,
    pub breakdown: ScoreBreakdown,
    pub recommendations: Vec<String>,
}

/// 0 without roadmaps, 30 for roadmaps with no tasks, otherwise 30–100 by the
/// completion ratio across every roadmap the user owns.
pub fn roadmap_score(roadmaps: &[RoadmapTally]) -> i32 {
    if roadmaps.is_empty() {
        return 0;
    }
    let total: i64 = roadmaps.iter().map(|r| r.total_tasks.max(0)).sum();
    let completed: i64 = roadmaps
        .iter()
        .map(|r| r.completed_tasks.clamp(0, r.total_tasks.max(0)))
        .sum();
    if total == 0 {
        return ROADMAP_PARTICIPATION_FLOOR as i32;
    }
    let earned = round_ratio(ROADMAP_COMPLETION_SPAN * completed, total);
    clamp_score(ROADMAP_PARTICIPATION_FLOOR + earned)
}

/// Rounded mean of the scored interviews. Unscored interviews are ignored; when
/// none carry a score the mean is 0.
pub fn interview_score(scores: &[Option<i32>]) -> i32 {
    let scored: Vec<i64> = scores
        .iter()
        .flatten()
        .map(|s| i64::from((*s).clamp(0, 100)))
        .collect();
    if scored.is_empty() {
        return 0;
    }
    clamp_score(round_ratio(scored.iter().sum(), scored.len() as i64))
}

/// Lifetime engagement tally: 10 points per roadmap or interview, capped at 100.
pub fn consistency_score(total_roadmaps: i64, total_interviews: i64) -> i32 {
    let items = total_roadmaps.max(0).saturating_add(total_interviews.max(0));
    clamp_score(items.saturating_mul(CONSISTENCY_POINTS_PER_ITEM))
}

pub fn composite_score(
    roadmap: i32,
    interview: i32,
    consistency: i32,
    weights: &ScoringWeights,
) -> i32 {
    let blended = weights.roadmap * f64::from(roadmap)
        + weights.interview * f64::from(interview)
        + weights.consistency * f64::from(consistency);
    (blended.round() as i32).clamp(0, 100)
}

pub fn recommendations(roadmap: i32, interview: i32, consistency: i32) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    if roadmap < IMPROVEMENT_THRESHOLD {
        push_unique(&mut out, RECOMMEND_MORE_TASKS);
    }
    if interview < IMPROVEMENT_THRESHOLD {
        push_unique(&mut out, RECOMMEND_MORE_INTERVIEWS);
    }
    if consistency < IMPROVEMENT_THRESHOLD {
        push_unique(&mut out, RECOMMEND_CONSISTENCY);
    }
    if roadmap >= READY_THRESHOLD && interview >= READY_THRESHOLD {
        push_unique(&mut out, RECOMMEND_READY);
    }
    if out.is_empty() {
        push_unique(&mut out, RECOMMEND_KEEP_GOING);
    }
    out
}

fn push_unique(out: &mut Vec<String>, msg: &str) {
    if !out.iter().any(|existing| existing == msg) {
        out.push(msg.to_string());
    }
}

pub fn compute_score(history: &ScoreHistory, weights: &ScoringWeights) -> ScoreResult {
    let total_roadmaps = history.roadmaps.len() as i64;
    let total_interviews = history.interview_scores.len() as i64;

    let roadmap = roadmap_score(&history.roadmaps);
    let interview = interview_score(&history.interview_scores);
    let consistency = consistency_score(total_roadmaps, total_interviews);

    ScoreResult {
        score: composite_score(roadmap, interview, consistency, weights),
        breakdown: ScoreBreakdown {
            roadmap_score: roadmap,
            interview_score: interview,
            consistency_score: consistency,
            total_roadmaps,
            total_interviews,
        },
        recommendations: recommendations(roadmap, interview, consistency),
    }
}

/// `round(numerator / denominator)` with halves rounded up, for non-negative inputs.
fn round_ratio(numerator: i64, denominator: i64) -> i64 {
    (2 * numerator + denominator) / (2 * denominator)
}

fn clamp_score(value: i64) -> i32 {
    value.clamp(0, 100) as i32
}
