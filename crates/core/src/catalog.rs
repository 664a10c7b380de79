use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Five-point scale shared by every rated category. Submitted values arrive
/// as the strings `"1"`..`"5"`; that encoding is a process-wide constant and
/// is also what the metadata blob stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "1")]
    NeedsImprovement,
    #[serde(rename = "2")]
    BelowAverage,
    #[serde(rename = "3")]
    MeetsExpectations,
    #[serde(rename = "4")]
    AboveAverage,
    #[serde(rename = "5")]
    Exceptional,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown rating value `{0}` (expected \"1\"..\"5\")")]
    UnknownRating(String),
}

impl Rating {
    /// Display order, most positive first.
    pub const SCALE: [Rating; 5] = [
        Rating::Exceptional,
        Rating::AboveAverage,
        Rating::MeetsExpectations,
        Rating::BelowAverage,
        Rating::NeedsImprovement,
    ];

    /// Parses a submitted select value. Total over `"1"`..`"5"` and nothing
    /// else; an empty or out-of-range value is a contract violation, never a
    /// silent default.
    pub fn from_value(value: &str) -> Result<Self, CatalogError> {
        match value {
            "1" => Ok(Self::NeedsImprovement),
            "2" => Ok(Self::BelowAverage),
            "3" => Ok(Self::MeetsExpectations),
            "4" => Ok(Self::AboveAverage),
            "5" => Ok(Self::Exceptional),
            other => Err(CatalogError::UnknownRating(other.to_string())),
        }
    }

    pub fn value(self) -> &'static str {
        match self {
            Self::NeedsImprovement => "1",
            Self::BelowAverage => "2",
            Self::MeetsExpectations => "3",
            Self::AboveAverage => "4",
            Self::Exceptional => "5",
        }
    }

    /// Default shown when a category was never rated. Display-only; a rating
    /// that was submitted but failed the lookup is an error, not a median.
    pub fn median() -> Self {
        Self::MeetsExpectations
    }

    /// Compact star row used on the review screen.
    pub fn short_label(self) -> &'static str {
        match self {
            Self::NeedsImprovement => "⭐",
            Self::BelowAverage => "⭐⭐",
            Self::MeetsExpectations => "⭐⭐⭐",
            Self::AboveAverage => "⭐⭐⭐⭐",
            Self::Exceptional => "⭐⭐⭐⭐⭐",
        }
    }

    /// Star row plus phrase used in the posted summary.
    pub fn detailed_label(self) -> &'static str {
        match self {
            Self::NeedsImprovement => "⭐ Needs Improvement",
            Self::BelowAverage => "⭐⭐ Below Average",
            Self::MeetsExpectations => "⭐⭐⭐ Meets Expectations",
            Self::AboveAverage => "⭐⭐⭐⭐ Above Average",
            Self::Exceptional => "⭐⭐⭐⭐⭐ Exceptional",
        }
    }
}

/// The three rated wizard categories, in wizard order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Performance,
    Collaboration,
    Skills,
}

/// One entry of a category's select menu: the phrasing is category-specific,
/// the underlying value is the shared scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RatingOption {
    pub label: &'static str,
    pub rating: Rating,
}

const PERFORMANCE_OPTIONS: [RatingOption; 5] = [
    RatingOption { label: "Exceeds Expectations", rating: Rating::Exceptional },
    RatingOption { label: "Above Average", rating: Rating::AboveAverage },
    RatingOption { label: "Meets Expectations", rating: Rating::MeetsExpectations },
    RatingOption { label: "Below Average", rating: Rating::BelowAverage },
    RatingOption { label: "Needs Improvement", rating: Rating::NeedsImprovement },
];

const COLLABORATION_OPTIONS: [RatingOption; 5] = [
    RatingOption { label: "Excellent Team Player", rating: Rating::Exceptional },
    RatingOption { label: "Very Collaborative", rating: Rating::AboveAverage },
    RatingOption { label: "Good Collaboration", rating: Rating::MeetsExpectations },
    RatingOption { label: "Some Collaboration Issues", rating: Rating::BelowAverage },
    RatingOption { label: "Needs Better Teamwork", rating: Rating::NeedsImprovement },
];

const SKILLS_OPTIONS: [RatingOption; 5] = [
    RatingOption { label: "Exceptional Skills", rating: Rating::Exceptional },
    RatingOption { label: "Strong Skills", rating: Rating::AboveAverage },
    RatingOption { label: "Adequate Skills", rating: Rating::MeetsExpectations },
    RatingOption { label: "Developing Skills", rating: Rating::BelowAverage },
    RatingOption { label: "Skills Need Work", rating: Rating::NeedsImprovement },
];

impl Category {
    pub const ALL: [Category; 3] =
        [Category::Performance, Category::Collaboration, Category::Skills];

    pub fn label(self) -> &'static str {
        match self {
            Self::Performance => "Performance",
            Self::Collaboration => "Collaboration",
            Self::Skills => "Skills",
        }
    }

    /// Block id of the category's rating select, shared by the renderer and
    /// the collector.
    pub fn rating_input_id(self) -> &'static str {
        match self {
            Self::Performance => "performance_rating",
            Self::Collaboration => "collaboration_rating",
            Self::Skills => "skills_rating",
        }
    }

    /// Block id of the category's free-text input. The skills screen labels
    /// it "Growth Areas" but it is stored like any other comment field.
    pub fn notes_input_id(self) -> &'static str {
        match self {
            Self::Performance => "performance_comments",
            Self::Collaboration => "collaboration_comments",
            Self::Skills => "growth_areas",
        }
    }

    pub fn rating_options(self) -> &'static [RatingOption; 5] {
        match self {
            Self::Performance => &PERFORMANCE_OPTIONS,
            Self::Collaboration => &COLLABORATION_OPTIONS,
            Self::Skills => &SKILLS_OPTIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogError, Category, Rating};

    #[test]
    fn lookup_is_total_over_the_scale() {
        for rating in Rating::SCALE {
            let parsed = Rating::from_value(rating.value()).expect("scale value parses");
            assert_eq!(parsed, rating);
        }
    }

    #[test]
    fn lookup_rejects_anything_off_the_scale() {
        for junk in ["", "0", "6", "10", "five", " 5"] {
            let error = Rating::from_value(junk).expect_err("off-scale value must fail");
            assert!(matches!(error, CatalogError::UnknownRating(ref value) if value == junk));
        }
    }

    #[test]
    fn labels_match_the_shared_tables() {
        assert_eq!(Rating::Exceptional.short_label(), "⭐⭐⭐⭐⭐");
        assert_eq!(Rating::MeetsExpectations.short_label(), "⭐⭐⭐");
        assert_eq!(Rating::Exceptional.detailed_label(), "⭐⭐⭐⭐⭐ Exceptional");
        assert_eq!(Rating::NeedsImprovement.detailed_label(), "⭐ Needs Improvement");
    }

    #[test]
    fn median_is_the_middle_of_the_scale() {
        assert_eq!(Rating::median(), Rating::MeetsExpectations);
        assert_eq!(Rating::median().value(), "3");
    }

    #[test]
    fn options_are_ordered_most_positive_first() {
        for category in Category::ALL {
            let options = category.rating_options();
            let values: Vec<&str> =
                options.iter().map(|option| option.rating.value()).collect();
            assert_eq!(values, ["5", "4", "3", "2", "1"], "{category:?}");
        }
    }

    #[test]
    fn category_phrasing_differs_but_the_scale_is_shared() {
        assert_eq!(Category::Performance.rating_options()[0].label, "Exceeds Expectations");
        assert_eq!(Category::Collaboration.rating_options()[0].label, "Excellent Team Player");
        assert_eq!(Category::Skills.rating_options()[0].label, "Exceptional Skills");
        assert_eq!(Category::Skills.notes_input_id(), "growth_areas");
        assert_eq!(Category::Performance.rating_input_id(), "performance_rating");
    }
}
