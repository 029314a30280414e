//! Season labels
//!
//! Winter straddles the new year, so January (and February, or March under
//! the phenological scheme) belong to the winter of the *previous* year:
//! December 2018 and January 2019 are both `2018_winter`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Season of the year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn as_str(self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How months are assigned to seasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonScheme {
    /// Dec-Feb winter, Mar-May spring, Jun-Aug summer, Sep-Nov autumn
    #[default]
    Meteorological,
    /// Growing-season aligned: Nov-Mar winter, Apr-May spring,
    /// Jun-Aug summer, Sep-Oct autumn
    Phenological,
}

impl SeasonScheme {
    /// Season of `date` and the year it is attributed to
    pub fn classify(self, date: NaiveDate) -> (i32, Season) {
        let year = date.year();
        let month = date.month();
        let winter_end = match self {
            SeasonScheme::Meteorological => 2,
            SeasonScheme::Phenological => 3,
        };
        if month <= winter_end {
            return (year - 1, Season::Winter);
        }
        let season = match (self, month) {
            (SeasonScheme::Meteorological, 3..=5) => Season::Spring,
            (SeasonScheme::Meteorological, 6..=8) => Season::Summer,
            (SeasonScheme::Meteorological, 9..=11) => Season::Autumn,
            (SeasonScheme::Phenological, 4..=5) => Season::Spring,
            (SeasonScheme::Phenological, 6..=8) => Season::Summer,
            (SeasonScheme::Phenological, 9..=10) => Season::Autumn,
            _ => Season::Winter,
        };
        (year, season)
    }
}

/// Label such as `"2018_winter"`
pub fn season_label(date: NaiveDate, scheme: SeasonScheme) -> String {
    let (year, season) = scheme.classify(date);
    format!("{}_{}", year, season)
}

/// April through October
pub fn in_growing_season(date: NaiveDate) -> bool {
    (4..=10).contains(&date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_meteorological_seasons() {
        let s = SeasonScheme::Meteorological;
        assert_eq!(season_label(ymd(2019, 1, 15), s), "2018_winter");
        assert_eq!(season_label(ymd(2019, 2, 28), s), "2018_winter");
        assert_eq!(season_label(ymd(2019, 3, 1), s), "2019_spring");
        assert_eq!(season_label(ymd(2019, 7, 1), s), "2019_summer");
        assert_eq!(season_label(ymd(2019, 11, 30), s), "2019_autumn");
        assert_eq!(season_label(ymd(2019, 12, 1), s), "2019_winter");
    }

    #[test]
    fn test_phenological_seasons() {
        let s = SeasonScheme::Phenological;
        assert_eq!(season_label(ymd(2019, 3, 31), s), "2018_winter");
        assert_eq!(season_label(ymd(2019, 4, 1), s), "2019_spring");
        assert_eq!(season_label(ymd(2019, 8, 31), s), "2019_summer");
        assert_eq!(season_label(ymd(2019, 10, 31), s), "2019_autumn");
        assert_eq!(season_label(ymd(2019, 11, 1), s), "2019_winter");
    }

    #[test]
    fn test_growing_season() {
        assert!(!in_growing_season(ymd(2019, 3, 31)));
        assert!(in_growing_season(ymd(2019, 4, 1)));
        assert!(in_growing_season(ymd(2019, 10, 31)));
        assert!(!in_growing_season(ymd(2019, 11, 1)));
    }
}
