use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The two top-level curriculum domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    PhysicalChemistry,
    ElectricalEngineering,
}

impl Subject {
    pub const ALL: [Subject; 2] = [Subject::PhysicalChemistry, Subject::ElectricalEngineering];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::PhysicalChemistry => "physchem",
            Subject::ElectricalEngineering => "electrical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Subject::PhysicalChemistry => "Physical Chemistry",
            Subject::ElectricalEngineering => "Electrical Engineering",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "physchem" | "pc" | "physical-chemistry" | "chem" => Some(Subject::PhysicalChemistry),
            "electrical" | "ee" | "electrical-engineering" | "elec" => {
                Some(Subject::ElectricalEngineering)
            }
            _ => None,
        }
    }
}

/// The two trackable materials per chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Slides,
    Homework,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Slides => "slides",
            ResourceKind::Homework => "homework",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Slides => "Slides",
            ResourceKind::Homework => "Homework",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "slides" | "slide" | "ppt" | "s" => Some(ResourceKind::Slides),
            "homework" | "hw" | "h" => Some(ResourceKind::Homework),
            _ => None,
        }
    }
}

// Known error categories; any other non-blank text is kept as a free-form
// custom category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Concept,
    Calculation,
    Misreading,
    Method,
    Custom(String),
}

impl ErrorCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCategory::Concept => "concept",
            ErrorCategory::Calculation => "calculation",
            ErrorCategory::Misreading => "misreading",
            ErrorCategory::Method => "method",
            ErrorCategory::Custom(s) => s,
        }
    }

    /// None for blank input only; unknown non-blank text becomes Custom.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.to_lowercase().as_str() {
            "concept" => Some(ErrorCategory::Concept),
            "calculation" | "calc" => Some(ErrorCategory::Calculation),
            "misreading" | "misread" => Some(ErrorCategory::Misreading),
            "method" => Some(ErrorCategory::Method),
            _ => Some(ErrorCategory::Custom(trimmed.to_string())),
        }
    }
}

/// Three-state indicator for a logged mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasteryLevel {
    Unseen = 0,
    NeedsReview = 1,
    Mastered = 2,
}

impl MasteryLevel {
    pub fn as_i64(&self) -> i64 {
        *self as i64
    }

    pub fn from_i64(v: i64) -> Self {
        match v {
            1 => MasteryLevel::NeedsReview,
            2 => MasteryLevel::Mastered,
            _ => MasteryLevel::Unseen,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MasteryLevel::Unseen => "Unseen",
            MasteryLevel::NeedsReview => "Needs Review",
            MasteryLevel::Mastered => "Mastered",
        }
    }
}

/// Outcome recorded after reviewing a mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewOutcome {
    Mastered,
    NeedsReview,
}

impl ReviewOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewOutcome::Mastered => "mastered",
            ReviewOutcome::NeedsReview => "needs-review",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mastered" | "m" | "yes" | "y" | "2" => Some(ReviewOutcome::Mastered),
            "needs-review" | "needsreview" | "review" | "again" | "r" | "1" => {
                Some(ReviewOutcome::NeedsReview)
            }
            _ => None,
        }
    }

    pub fn mastery(&self) -> MasteryLevel {
        match self {
            ReviewOutcome::Mastered => MasteryLevel::Mastered,
            ReviewOutcome::NeedsReview => MasteryLevel::NeedsReview,
        }
    }
}

/// Analytics window, filtered on mistake creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    LastWeek,
    LastMonth,
    AllTime,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::LastWeek => "week",
            Period::LastMonth => "month",
            Period::AllTime => "all",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "week" | "w" | "last-week" | "7d" => Some(Period::LastWeek),
            "month" | "m" | "last-month" | "30d" => Some(Period::LastMonth),
            "all" | "a" | "all-time" => Some(Period::AllTime),
            _ => None,
        }
    }

    /// Inclusive lower bound on created_at, or None for the full history.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::LastWeek => Some(now - Duration::days(7)),
            Period::LastMonth => Some(now - Duration::days(30)),
            Period::AllTime => None,
        }
    }
}

/// A leaf resource within the fixed curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseItem {
    pub id: i64,
    pub subject: Subject,
    pub chapter: String,
    pub resource: ResourceKind,
    pub completed: bool,
    pub last_updated: Option<String>,
    pub sort_order: i64,
}

/// A node in the curriculum hierarchy named for a toggle. Only a fully
/// specified (subject, chapter, resource) triple is a toggleable leaf.
#[derive(Debug, Clone)]
pub struct CourseTarget {
    pub subject: Subject,
    pub chapter: Option<String>,
    pub resource: Option<ResourceKind>,
}

impl CourseTarget {
    pub fn leaf(&self) -> Option<(&str, ResourceKind)> {
        match (&self.chapter, self.resource) {
            (Some(chapter), Some(resource)) => Some((chapter.as_str(), resource)),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        let mut path = self.subject.as_str().to_string();
        if let Some(chapter) = &self.chapter {
            path.push('/');
            path.push_str(chapter);
        }
        if let Some(resource) = self.resource {
            path.push('/');
            path.push_str(resource.as_str());
        }
        path
    }
}

/// Input for a new mistake record. Chapter and category are validated at
/// submission; the image is optional.
#[derive(Debug, Clone, Default)]
pub struct MistakeDraft {
    pub chapter: String,
    pub question: String,
    pub category: String,
    pub tags: String,
    pub image: Option<Vec<u8>>,
}

/// A logged error instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MistakeRecord {
    pub id: i64,
    pub subject: Subject,
    pub chapter: String,
    pub question: String,
    // Raw bytes stay out of JSON output; the CLI exports them to a file.
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
    pub error_category: String,
    pub tags: String,
    pub mastery_level: MasteryLevel,
    pub probability: f64,
    pub created_at: String,
    pub last_reviewed: Option<String>,
}

impl MistakeRecord {
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Listing row for mistakes, without the image payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MistakeSummary {
    pub id: i64,
    pub subject: Subject,
    pub chapter: String,
    pub error_category: String,
    pub mastery_level: MasteryLevel,
    pub created_at: String,
    pub last_reviewed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionStat {
    pub subject: Subject,
    pub completed: i64,
    pub total: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Recommendation {
    Course {
        subject: Subject,
        chapter: String,
        resource: ResourceKind,
    },
    MistakeHotspot {
        subject: Subject,
        chapter: String,
        count: i64,
    },
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod subject_tests {
        use super::*;

        #[test]
        fn as_str_round_trips() {
            for subject in Subject::ALL {
                assert_eq!(Subject::from_str(subject.as_str()), Some(subject));
            }
        }

        #[test]
        fn from_str_shorthands() {
            assert_eq!(Subject::from_str("pc"), Some(Subject::PhysicalChemistry));
            assert_eq!(Subject::from_str("PhysChem"), Some(Subject::PhysicalChemistry));
            assert_eq!(Subject::from_str("ee"), Some(Subject::ElectricalEngineering));
            assert_eq!(Subject::from_str("ELEC"), Some(Subject::ElectricalEngineering));
        }

        #[test]
        fn from_str_invalid_returns_none() {
            assert_eq!(Subject::from_str("biology"), None);
            assert_eq!(Subject::from_str(""), None);
        }

        #[test]
        fn labels_are_human_readable() {
            assert_eq!(Subject::PhysicalChemistry.label(), "Physical Chemistry");
            assert_eq!(Subject::ElectricalEngineering.label(), "Electrical Engineering");
        }
    }

    mod resource_kind_tests {
        use super::*;

        #[test]
        fn from_str_valid_inputs() {
            assert_eq!(ResourceKind::from_str("slides"), Some(ResourceKind::Slides));
            assert_eq!(ResourceKind::from_str("ppt"), Some(ResourceKind::Slides));
            assert_eq!(ResourceKind::from_str("homework"), Some(ResourceKind::Homework));
            assert_eq!(ResourceKind::from_str("HW"), Some(ResourceKind::Homework));
        }

        #[test]
        fn from_str_invalid_returns_none() {
            assert_eq!(ResourceKind::from_str("video"), None);
            assert_eq!(ResourceKind::from_str(""), None);
        }

        #[test]
        fn as_str_round_trips() {
            assert_eq!(
                ResourceKind::from_str(ResourceKind::Slides.as_str()),
                Some(ResourceKind::Slides)
            );
            assert_eq!(
                ResourceKind::from_str(ResourceKind::Homework.as_str()),
                Some(ResourceKind::Homework)
            );
        }
    }

    mod error_category_tests {
        use super::*;

        #[test]
        fn parse_known_categories() {
            assert_eq!(ErrorCategory::parse("concept"), Some(ErrorCategory::Concept));
            assert_eq!(
                ErrorCategory::parse("Calculation"),
                Some(ErrorCategory::Calculation)
            );
            assert_eq!(
                ErrorCategory::parse("misreading"),
                Some(ErrorCategory::Misreading)
            );
            assert_eq!(ErrorCategory::parse("METHOD"), Some(ErrorCategory::Method));
        }

        #[test]
        fn parse_unknown_becomes_custom() {
            assert_eq!(
                ErrorCategory::parse("sign error"),
                Some(ErrorCategory::Custom("sign error".to_string()))
            );
        }

        #[test]
        fn parse_blank_returns_none() {
            assert_eq!(ErrorCategory::parse(""), None);
            assert_eq!(ErrorCategory::parse("   "), None);
        }

        #[test]
        fn parse_trims_custom_text() {
            assert_eq!(
                ErrorCategory::parse("  unit slip  "),
                Some(ErrorCategory::Custom("unit slip".to_string()))
            );
        }

        #[test]
        fn as_str_canonical_tokens() {
            assert_eq!(ErrorCategory::Concept.as_str(), "concept");
            assert_eq!(ErrorCategory::Custom("sign error".into()).as_str(), "sign error");
        }
    }

    mod mastery_level_tests {
        use super::*;

        #[test]
        fn as_i64_values() {
            assert_eq!(MasteryLevel::Unseen.as_i64(), 0);
            assert_eq!(MasteryLevel::NeedsReview.as_i64(), 1);
            assert_eq!(MasteryLevel::Mastered.as_i64(), 2);
        }

        #[test]
        fn from_i64_round_trips() {
            for level in [
                MasteryLevel::Unseen,
                MasteryLevel::NeedsReview,
                MasteryLevel::Mastered,
            ] {
                assert_eq!(MasteryLevel::from_i64(level.as_i64()), level);
            }
        }

        #[test]
        fn from_i64_out_of_range_is_unseen() {
            assert_eq!(MasteryLevel::from_i64(-1), MasteryLevel::Unseen);
            assert_eq!(MasteryLevel::from_i64(99), MasteryLevel::Unseen);
        }

        #[test]
        fn labels() {
            assert_eq!(MasteryLevel::Unseen.label(), "Unseen");
            assert_eq!(MasteryLevel::NeedsReview.label(), "Needs Review");
            assert_eq!(MasteryLevel::Mastered.label(), "Mastered");
        }
    }

    mod review_outcome_tests {
        use super::*;

        #[test]
        fn from_str_mastered_variants() {
            for v in ["mastered", "m", "yes", "2", "MASTERED"] {
                assert_eq!(
                    ReviewOutcome::from_str(v),
                    Some(ReviewOutcome::Mastered),
                    "{}",
                    v
                );
            }
        }

        #[test]
        fn from_str_needs_review_variants() {
            for v in ["needs-review", "review", "again", "r", "1"] {
                assert_eq!(
                    ReviewOutcome::from_str(v),
                    Some(ReviewOutcome::NeedsReview),
                    "{}",
                    v
                );
            }
        }

        #[test]
        fn from_str_invalid() {
            assert!(ReviewOutcome::from_str("").is_none());
            assert!(ReviewOutcome::from_str("unseen").is_none());
        }

        #[test]
        fn maps_to_mastery_level() {
            assert_eq!(ReviewOutcome::Mastered.mastery(), MasteryLevel::Mastered);
            assert_eq!(ReviewOutcome::NeedsReview.mastery(), MasteryLevel::NeedsReview);
        }
    }

    mod period_tests {
        use super::*;
        use chrono::TimeZone;

        #[test]
        fn from_str_valid_inputs() {
            assert_eq!(Period::from_str("week"), Some(Period::LastWeek));
            assert_eq!(Period::from_str("MONTH"), Some(Period::LastMonth));
            assert_eq!(Period::from_str("all"), Some(Period::AllTime));
        }

        #[test]
        fn from_str_invalid_returns_none() {
            assert_eq!(Period::from_str("year"), None);
            assert_eq!(Period::from_str(""), None);
        }

        #[test]
        fn cutoff_arithmetic() {
            let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
            assert_eq!(
                Period::LastWeek.cutoff(now),
                Some(Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap())
            );
            assert_eq!(
                Period::LastMonth.cutoff(now),
                Some(Utc.with_ymd_and_hms(2024, 2, 14, 12, 0, 0).unwrap())
            );
            assert_eq!(Period::AllTime.cutoff(now), None);
        }
    }

    mod course_target_tests {
        use super::*;

        #[test]
        fn full_triple_is_leaf() {
            let target = CourseTarget {
                subject: Subject::PhysicalChemistry,
                chapter: Some("Chemical Kinetics".to_string()),
                resource: Some(ResourceKind::Homework),
            };
            assert_eq!(
                target.leaf(),
                Some(("Chemical Kinetics", ResourceKind::Homework))
            );
        }

        #[test]
        fn partial_targets_are_not_leaves() {
            let subject_only = CourseTarget {
                subject: Subject::PhysicalChemistry,
                chapter: None,
                resource: None,
            };
            assert!(subject_only.leaf().is_none());

            let chapter_only = CourseTarget {
                subject: Subject::PhysicalChemistry,
                chapter: Some("Phase Equilibrium".to_string()),
                resource: None,
            };
            assert!(chapter_only.leaf().is_none());

            let resource_only = CourseTarget {
                subject: Subject::ElectricalEngineering,
                chapter: None,
                resource: Some(ResourceKind::Slides),
            };
            assert!(resource_only.leaf().is_none());
        }

        #[test]
        fn describe_joins_path_segments() {
            let target = CourseTarget {
                subject: Subject::ElectricalEngineering,
                chapter: Some("Semiconductor Devices".to_string()),
                resource: Some(ResourceKind::Slides),
            };
            assert_eq!(target.describe(), "electrical/Semiconductor Devices/slides");
        }
    }

    mod json_output_tests {
        use super::*;

        #[test]
        fn ok_wraps_data() {
            let output = JsonOutput::ok(42);
            assert!(output.success);
            assert_eq!(output.data, Some(42));
            assert!(output.error.is_none());
        }

        #[test]
        fn err_wraps_message() {
            let output = JsonOutput::<()>::err("something went wrong");
            assert!(!output.success);
            assert!(output.data.is_none());
            assert_eq!(output.error, Some("something went wrong".to_string()));
        }

        #[test]
        fn serializes_ok_correctly() {
            let output = JsonOutput::ok("test");
            let json = serde_json::to_string(&output).unwrap();
            assert!(json.contains("\"success\":true"));
            assert!(json.contains("\"data\":\"test\""));
            assert!(json.contains("\"error\":null"));
        }
    }

    mod mistake_record_tests {
        use super::*;

        fn make_record(image: Option<Vec<u8>>) -> MistakeRecord {
            MistakeRecord {
                id: 1,
                subject: Subject::PhysicalChemistry,
                chapter: "Electrochemistry".to_string(),
                question: "Q".to_string(),
                image,
                error_category: "concept".to_string(),
                tags: String::new(),
                mastery_level: MasteryLevel::Unseen,
                probability: 1.0,
                created_at: "2024-01-01T00:00:00+00:00".to_string(),
                last_reviewed: None,
            }
        }

        #[test]
        fn has_image_reflects_blob() {
            assert!(!make_record(None).has_image());
            assert!(make_record(Some(vec![1, 2, 3])).has_image());
        }

        #[test]
        fn image_bytes_stay_out_of_json() {
            let record = make_record(Some(vec![0xFF; 64]));
            let json = serde_json::to_string(&record).unwrap();
            assert!(!json.contains("image"));
            assert!(json.contains("\"probability\":1.0"));
        }
    }
}
