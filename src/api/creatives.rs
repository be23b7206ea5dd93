//! Creatives, their taxonomy (categories, subcategories, brands) and
//! aggregated statistics

use std::sync::Arc;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use super::models::{
    format_week, Brand, Category, Creative, CreativeCount, CreativeFilter, MonitoringStats, Page,
    Subcategory, TopCategory, TopCategoryItem, TopSubcategory, TopSubcategoryItem,
    WeeklyDynamics,
};
use super::{read_json, ApiError};
use crate::http::{AuthenticatedClient, FetchRequest};

const CATEGORIES: &str = "/api/categories/";
const SUBCATEGORIES: &str = "/api/subcategories/";
const SUBCATEGORIES_BY_CATEGORY: &str = "/api/subcategories/by-category";
const BRANDS: &str = "/api/brands/";
const BRANDS_FILTER: &str = "/api/brands/filter";
const TOP_CATEGORIES: &str = "/api/creative/top-categories";
const TOP_SUBCATEGORIES: &str = "/api/creative/top-subcategories";
const LAST_WEEK: &str = "/api/creative/last-week";
const BY_PERIOD: &str = "/api/creative/by-period";
const DYNAMICS: &str = "/api/creative/dynamics";
const TOP_CATEGORY: &str = "/api/creative/top-category";
const TOP_SUBCATEGORY: &str = "/api/creative/top-subcategory";
const BY_FILTERS: &str = "/api/creative/filter";
const COUNT: &str = "/api/creative/count";
const BY_ID: &str = "/api/creative/by-id";

/// How many recent creatives feed the monitoring counters
const MONITORING_SAMPLE: u32 = 100;

/// Read-only access to creatives and their statistics
pub struct CreativeService {
    client: Arc<AuthenticatedClient>,
}

impl CreativeService {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    fn get(&self, path: &str) -> FetchRequest {
        FetchRequest::get(self.client.endpoint(path))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: FetchRequest) -> Result<T, ApiError> {
        let response = self.client.request(request).await?;
        read_json(response).await
    }

    fn paged(request: FetchRequest, page: Page) -> FetchRequest {
        request
            .query("limit", page.limit)
            .query("offset", page.offset)
    }

    fn filtered(mut request: FetchRequest, filter: &CreativeFilter) -> FetchRequest {
        for (key, value) in filter.query_pairs() {
            request = request.query(key, value);
        }
        request
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.fetch(self.get(CATEGORIES)).await
    }

    pub async fn subcategories(&self) -> Result<Vec<Subcategory>, ApiError> {
        self.fetch(self.get(SUBCATEGORIES)).await
    }

    pub async fn subcategories_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<Subcategory>, ApiError> {
        let request = self
            .get(SUBCATEGORIES_BY_CATEGORY)
            .query("category_id", category_id);
        self.fetch(request).await
    }

    pub async fn brands(&self) -> Result<Vec<Brand>, ApiError> {
        self.fetch(self.get(BRANDS)).await
    }

    /// Brands whose name matches `name` (server-side search)
    pub async fn brands_by_name(&self, name: &str) -> Result<Vec<Brand>, ApiError> {
        self.fetch(self.get(BRANDS_FILTER).query("name", name)).await
    }

    pub async fn last_week(&self, page: Page) -> Result<Vec<Creative>, ApiError> {
        self.fetch(Self::paged(self.get(LAST_WEEK), page)).await
    }

    /// Creatives of the week containing `week`
    pub async fn by_period(&self, week: NaiveDate, page: Page) -> Result<Vec<Creative>, ApiError> {
        let request = self.get(BY_PERIOD).query("week", format_week(week));
        self.fetch(Self::paged(request, page)).await
    }

    /// Creative counts per week, optionally narrowed to a category
    pub async fn weekly_dynamics(
        &self,
        category_id: Option<i64>,
        subcategory_id: Option<i64>,
    ) -> Result<Vec<WeeklyDynamics>, ApiError> {
        let request = self
            .get(DYNAMICS)
            .query_opt("category_id", category_id)
            .query_opt("subcategory_id", subcategory_id);
        self.fetch(request).await
    }

    pub async fn top_category(&self) -> Result<TopCategory, ApiError> {
        self.fetch(self.get(TOP_CATEGORY)).await
    }

    pub async fn top_subcategory(&self) -> Result<TopSubcategory, ApiError> {
        self.fetch(self.get(TOP_SUBCATEGORY)).await
    }

    /// Top 5 categories by creative count
    pub async fn top_categories(&self) -> Result<Vec<TopCategoryItem>, ApiError> {
        self.fetch(self.get(TOP_CATEGORIES)).await
    }

    /// Top 5 subcategories by creative count
    pub async fn top_subcategories(&self) -> Result<Vec<TopSubcategoryItem>, ApiError> {
        self.fetch(self.get(TOP_SUBCATEGORIES)).await
    }

    pub async fn by_filters(
        &self,
        filter: &CreativeFilter,
        page: Page,
    ) -> Result<Vec<Creative>, ApiError> {
        let request = Self::filtered(self.get(BY_FILTERS), filter);
        self.fetch(Self::paged(request, page)).await
    }

    /// Number of creatives matching `filter`
    pub async fn count(&self, filter: &CreativeFilter) -> Result<u64, ApiError> {
        let count: CreativeCount = self.fetch(Self::filtered(self.get(COUNT), filter)).await?;
        Ok(count.total_count)
    }

    pub async fn by_id(&self, id_orig: i64) -> Result<Creative, ApiError> {
        self.fetch(self.get(BY_ID).query("id_orig", id_orig)).await
    }

    /// Per-channel counters for the monitoring view
    ///
    /// Only banner ads are collected, so every recent creative counts as a
    /// banner and the other channels stay at zero.
    pub async fn monitoring_stats(&self) -> Result<MonitoringStats, ApiError> {
        let recent = self.last_week(Page::new(MONITORING_SAMPLE, 0)).await?;
        Ok(MonitoringStats {
            banner: recent.len() as u64,
            ..MonitoringStats::default()
        })
    }
}
