//! Request and response types of the analytics API

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subcategory {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Brand {
    pub id: i64,
    pub name: String,
}

/// One advertising creative as captured by the crawler
///
/// Most fields are optional in the API. The classifier scores
/// (`casc1` ..) and any other columns the backend adds land in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Creative {
    pub id_orig: Option<i64>,
    pub domain: Option<String>,
    pub link: Option<String>,
    pub ad_link: Option<String>,
    pub file_link: Option<String>,
    pub file_name: Option<String>,
    pub block: Option<String>,
    pub comment: Option<String>,
    pub date_time: Option<String>,
    pub date_monday: Option<String>,
    pub date_first_show_on_week: Option<String>,
    pub date_first_show: Option<String>,
    pub week: Option<String>,
    pub parser_profile: Option<String>,
    pub confidence: Option<f64>,
    pub details: Option<String>,
    pub creativity: Option<String>,
    pub show_counter: Option<i64>,
    pub resource_type: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_content: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_source: Option<String>,
    pub depth: Option<i64>,
    pub site_type: Option<String>,
    pub top_offset: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub square: Option<i64>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub brand_id: Option<i64>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Creative {
    /// Classifier score `casc{n}` if present
    pub fn cascade_score(&self, n: u8) -> Option<f64> {
        self.extra.get(&format!("casc{}", n)).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyDynamics {
    pub week: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopCategory {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopSubcategory {
    pub subcategory: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopCategoryItem {
    pub category_id: i64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopSubcategoryItem {
    pub subcategory_id: i64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CreativeCount {
    pub total_count: u64,
}

/// Creatives per media channel for the monitoring view
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MonitoringStats {
    pub tv: u64,
    pub radio: u64,
    pub online: u64,
    pub banner: u64,
    pub outdoor: u64,
}

/// Pagination window for creative listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// The page after this one
    pub fn next(self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// Filter for creative listings and counts; unset fields are not sent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreativeFilter {
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub brand_id: Option<i64>,
    /// Any day of the week to select; sent as that week's Monday
    pub week: Option<NaiveDate>,
    pub period: Option<String>,
}

impl CreativeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, id: i64) -> Self {
        self.category_id = Some(id);
        self
    }

    pub fn subcategory(mut self, id: i64) -> Self {
        self.subcategory_id = Some(id);
        self
    }

    pub fn brand(mut self, id: i64) -> Self {
        self.brand_id = Some(id);
        self
    }

    pub fn week(mut self, day: NaiveDate) -> Self {
        self.week = Some(week_start(day));
        self
    }

    pub fn period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into()).filter(|p: &String| !p.is_empty());
        self
    }

    /// Query parameters for the set fields
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(id) = self.category_id {
            pairs.push(("category_id", id.to_string()));
        }
        if let Some(id) = self.subcategory_id {
            pairs.push(("subcategory_id", id.to_string()));
        }
        if let Some(id) = self.brand_id {
            pairs.push(("brand_id", id.to_string()));
        }
        if let Some(week) = self.week {
            pairs.push(("week", format_week(week)));
        }
        if let Some(period) = &self.period {
            pairs.push(("period", period.clone()));
        }
        pairs
    }
}

/// Monday of the week containing `day`
///
/// The API keys weekly data by the week's Monday (`date_monday`).
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Sunday closing the week containing `day`
pub fn week_end(day: NaiveDate) -> NaiveDate {
    week_start(day) + Duration::days(6)
}

/// Week parameter format used by the API (`YYYY-MM-DD` of the Monday)
pub fn format_week(day: NaiveDate) -> String {
    week_start(day).format("%Y-%m-%d").to_string()
}

/// Current user's profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Profile fields to change; unset fields are left alone
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_and_end() {
        // 2024-01-17 is a Wednesday
        assert_eq!(week_start(date(2024, 1, 17)), date(2024, 1, 15));
        assert_eq!(week_end(date(2024, 1, 17)), date(2024, 1, 21));

        // Monday and Sunday map into the same week
        assert_eq!(week_start(date(2024, 1, 15)), date(2024, 1, 15));
        assert_eq!(week_start(date(2024, 1, 21)), date(2024, 1, 15));
    }

    #[test]
    fn test_week_start_crosses_year() {
        // 2025-01-01 is a Wednesday
        assert_eq!(week_start(date(2025, 1, 1)), date(2024, 12, 30));
        assert_eq!(format_week(date(2025, 1, 1)), "2024-12-30");
    }

    #[test]
    fn test_filter_query_pairs_skip_unset() {
        let filter = CreativeFilter::new()
            .category(3)
            .brand(42)
            .week(date(2024, 1, 18))
            .period("");

        assert_eq!(
            filter.query_pairs(),
            vec![
                ("category_id", "3".to_string()),
                ("brand_id", "42".to_string()),
                ("week", "2024-01-15".to_string()),
            ]
        );
        assert!(CreativeFilter::new().query_pairs().is_empty());
    }

    #[test]
    fn test_page_default_and_next() {
        let page = Page::default();
        assert_eq!(page, Page::new(20, 0));
        assert_eq!(page.next(), Page::new(20, 20));
    }

    #[test]
    fn test_creative_keeps_unknown_columns() {
        let creative: Creative = serde_json::from_str(
            r#"{"id_orig": 7, "domain": "news.example", "casc1": 0.93, "casc2": null}"#,
        )
        .unwrap();

        assert_eq!(creative.id_orig, Some(7));
        assert_eq!(creative.domain.as_deref(), Some("news.example"));
        assert_eq!(creative.cascade_score(1), Some(0.93));
        assert_eq!(creative.cascade_score(2), None);
        assert_eq!(creative.cascade_score(3), None);
    }

    #[test]
    fn test_profile_update_skips_unset() {
        let update = ProfileUpdate {
            full_name: Some("Ivan Petrov".into()),
            email: None,
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"full_name":"Ivan Petrov"}"#
        );
    }
}
