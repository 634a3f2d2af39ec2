//! Derived presentation metrics. Pure functions over already-fetched
//! records; nothing here mutates a record or touches the network.

use chrono::{DateTime, Utc};

use crate::records::{AssessmentRecord, AssessmentStatus, ImprovementTrend};

/// Color bucket for a score in [0,1]. The same thresholds apply everywhere
/// a score is rendered, profile average and per-record alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBucket {
    Good,
    Warn,
    Risk,
}

impl ScoreBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBucket::Good => "good",
            ScoreBucket::Warn => "warn",
            ScoreBucket::Risk => "risk",
        }
    }
}

/// Boundary values classify into the higher bucket.
pub fn score_bucket(score: f64) -> ScoreBucket {
    if score >= 0.8 {
        ScoreBucket::Good
    } else if score >= 0.6 {
        ScoreBucket::Warn
    } else {
        ScoreBucket::Risk
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Neutral => "neutral",
        }
    }
}

pub fn trend_direction(trend: ImprovementTrend) -> TrendDirection {
    match trend {
        ImprovementTrend::Improving => TrendDirection::Up,
        ImprovementTrend::Declining => TrendDirection::Down,
        ImprovementTrend::Stable => TrendDirection::Neutral,
    }
}

/// Whole days since `ts`, rounded up. `None` when no timestamp exists
/// (rendered as "N/A").
pub fn days_since(now: DateTime<Utc>, ts: Option<DateTime<Utc>>) -> Option<i64> {
    let ts = ts?;
    let secs = (now - ts).num_seconds().max(0);
    Some((secs + 86_399) / 86_400)
}

/// Score as a display percentage: clamped into [0,100], one decimal.
pub fn percent(score: f64) -> f64 {
    (score.clamp(0.0, 1.0) * 1000.0).round() / 10.0
}

/// Number of completed assessments. 0 for an empty collection.
pub fn completed_count(records: &[AssessmentRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.status == AssessmentStatus::Completed)
        .count()
}

/// Total session time in whole minutes, rounded. 0 for an empty collection.
pub fn total_minutes(records: &[AssessmentRecord]) -> u64 {
    let secs: u64 = records.iter().map(|r| r.duration).sum();
    (secs as f64 / 60.0).round() as u64
}

/// Best (maximum) risk score across the collection as a display
/// percentage. `None` for an empty collection ("N/A"), matching the
/// other aggregates' defined-not-thrown contract.
pub fn best_score_pct(records: &[AssessmentRecord]) -> Option<f64> {
    records
        .iter()
        .map(|r| r.risk_score)
        .fold(None, |best: Option<f64>, s| {
            Some(best.map_or(s, |b| b.max(s)))
        })
        .map(percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{AssessmentType, FeatureScores};
    use chrono::TimeZone;

    fn record(risk: f64, duration: u64, status: AssessmentStatus) -> AssessmentRecord {
        AssessmentRecord {
            assessment_id: format!("a-{risk}-{duration}"),
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            kind: AssessmentType::Speech,
            risk_score: risk,
            confidence: 0.9,
            duration,
            features: FeatureScores {
                memory: 0.8,
                attention: 0.7,
                language: 0.9,
                executive: 0.75,
            },
            status,
            notes: None,
        }
    }

    #[test]
    fn test_bucket_boundaries_go_up() {
        assert_eq!(score_bucket(0.8), ScoreBucket::Good);
        assert_eq!(score_bucket(0.6), ScoreBucket::Warn);
        assert_eq!(score_bucket(0.799_999), ScoreBucket::Warn);
        assert_eq!(score_bucket(0.599_999), ScoreBucket::Risk);
        assert_eq!(score_bucket(0.0), ScoreBucket::Risk);
        assert_eq!(score_bucket(1.0), ScoreBucket::Good);
    }

    #[test]
    fn test_bucket_monotonic() {
        fn rank(b: ScoreBucket) -> u8 {
            match b {
                ScoreBucket::Risk => 0,
                ScoreBucket::Warn => 1,
                ScoreBucket::Good => 2,
            }
        }
        let mut prev = 0;
        for i in 0..=1000 {
            let r = rank(score_bucket(i as f64 / 1000.0));
            assert!(r >= prev, "bucket rank decreased at {}", i);
            prev = r;
        }
    }

    #[test]
    fn test_trend_mirror() {
        assert_eq!(trend_direction(ImprovementTrend::Improving), TrendDirection::Up);
        assert_eq!(trend_direction(ImprovementTrend::Declining), TrendDirection::Down);
        assert_eq!(trend_direction(ImprovementTrend::Stable), TrendDirection::Neutral);
    }

    #[test]
    fn test_days_since_rounds_up() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let one_hour_ago = now - chrono::Duration::hours(1);
        let exactly_two_days = now - chrono::Duration::days(2);
        assert_eq!(days_since(now, Some(one_hour_ago)), Some(1));
        assert_eq!(days_since(now, Some(exactly_two_days)), Some(2));
        assert_eq!(days_since(now, None), None);
    }

    #[test]
    fn test_days_since_future_timestamp() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let future = now + chrono::Duration::days(3);
        assert_eq!(days_since(now, Some(future)), Some(0));
    }

    #[test]
    fn test_percent_clamps_and_rounds() {
        assert_eq!(percent(0.824), 82.4);
        assert_eq!(percent(0.8249), 82.5);
        assert_eq!(percent(1.7), 100.0);
        assert_eq!(percent(-0.3), 0.0);
    }

    #[test]
    fn test_aggregates_on_empty_collection() {
        let empty: Vec<AssessmentRecord> = Vec::new();
        assert_eq!(completed_count(&empty), 0);
        assert_eq!(total_minutes(&empty), 0);
        assert_eq!(best_score_pct(&empty), None);
    }

    #[test]
    fn test_aggregates() {
        let records = vec![
            record(0.82, 300, AssessmentStatus::Completed),
            record(0.55, 95, AssessmentStatus::Completed),
            record(0.91, 600, AssessmentStatus::Failed),
            record(0.40, 10, AssessmentStatus::InProgress),
        ];
        assert_eq!(completed_count(&records), 2);
        // 1005 seconds -> 16.75 minutes -> 17
        assert_eq!(total_minutes(&records), 17);
        assert_eq!(best_score_pct(&records), Some(91.0));
    }
}
