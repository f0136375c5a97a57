use serde::Serialize;

use crate::models::subscription::{seed_subscriptions, Category, Frequency, SubscriptionRecord};

pub const ALL_CATEGORIES: &str = "all";
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load Gmail subscriptions. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Seed,
    Gmail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub active: usize,
    pub total_unread: u64,
    pub daily: usize,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("An extraction run is already in progress")]
pub struct RefreshInProgress;

/// Per-view-session record list plus the flags the dashboard renders around it.
#[derive(Debug, Clone)]
pub struct DashboardState {
    records: Vec<SubscriptionRecord>,
    source: DataSource,
    error: Option<String>,
    generation: u64,
    refreshing: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::with_seed_data()
    }
}

impl DashboardState {
    pub fn with_seed_data() -> Self {
        DashboardState {
            records: seed_subscriptions(),
            source: DataSource::Seed,
            error: None,
            generation: 0,
            refreshing: false,
        }
    }

    pub fn records(&self) -> &[SubscriptionRecord] {
        &self.records
    }

    pub fn using_seed_data(&self) -> bool {
        self.source == DataSource::Seed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Records matching both the category filter and the search term, in list order.
    pub fn visible(&self, selected_category: &str, search_term: &str) -> Vec<&SubscriptionRecord> {
        let needle = search_term.to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                selected_category == ALL_CATEGORIES || r.category.as_str() == selected_category
            })
            .filter(|r| {
                r.sender_name.to_lowercase().contains(&needle)
                    || r.sender_email.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn category_count(&self, category: &str) -> usize {
        if category == ALL_CATEGORIES {
            return self.records.len();
        }
        self.records
            .iter()
            .filter(|r| r.category.as_str() == category)
            .count()
    }

    /// Counts for every filter chip, "all" first.
    pub fn category_counts(&self) -> Vec<CategoryCount> {
        std::iter::once(ALL_CATEGORIES)
            .chain(Category::ALL.iter().map(Category::as_str))
            .map(|category| CategoryCount {
                category,
                count: self.category_count(category),
            })
            .collect()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            total: self.records.len(),
            active: self.records.iter().filter(|r| r.is_active).count(),
            total_unread: self.records.iter().map(|r| u64::from(r.unread_count)).sum(),
            daily: self
                .records
                .iter()
                .filter(|r| r.frequency == Frequency::Daily)
                .count(),
        }
    }

    /// Sets `is_active` on the record with `id`. Unknown ids leave the list untouched.
    /// Returns whether a record matched.
    pub fn set_active(&mut self, id: &str, value: bool) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.is_active = value;
                true
            }
            None => false,
        }
    }

    pub fn unsubscribe(&mut self, id: &str) -> bool {
        self.set_active(id, false)
    }

    pub fn resubscribe(&mut self, id: &str) -> bool {
        self.set_active(id, true)
    }

    /// Marks an extraction run as in flight and returns its generation.
    pub fn begin_refresh(&mut self) -> Result<u64, RefreshInProgress> {
        if self.refreshing {
            return Err(RefreshInProgress);
        }
        self.refreshing = true;
        self.error = None;
        Ok(self.generation)
    }

    /// Applies the outcome of the run started at `generation`. A failed run
    /// falls back to seed data and raises the error banner. Returns `false`
    /// when the result is stale and was discarded.
    pub fn finish_refresh<E>(
        &mut self,
        generation: u64,
        result: Result<Vec<SubscriptionRecord>, E>,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        self.refreshing = false;
        match result {
            Ok(records) => {
                self.records = records;
                self.source = DataSource::Gmail;
            }
            Err(_) => {
                self.records = seed_subscriptions();
                self.source = DataSource::Seed;
                self.error = Some(LOAD_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    /// Clears the in-flight flag of a run that ended without a result.
    /// Returns `false` when that run is no longer the current one.
    pub fn abandon_refresh(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.refreshing {
            return false;
        }
        self.refreshing = false;
        true
    }

    /// Sign-out: back to seed data, and any run still in flight becomes stale.
    pub fn reset_to_seed(&mut self) {
        self.generation += 1;
        self.refreshing = false;
        self.records = seed_subscriptions();
        self.source = DataSource::Seed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: &str, name: &str, email: &str, category: Category) -> SubscriptionRecord {
        SubscriptionRecord {
            id: id.to_string(),
            sender_name: name.to_string(),
            sender_email: email.to_string(),
            category,
            frequency: Frequency::Weekly,
            last_email_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            description: String::new(),
            unread_count: 2,
            is_active: true,
        }
    }

    #[test]
    fn stats_over_seed_data() {
        let state = DashboardState::with_seed_data();
        let stats = state.stats();
        assert_eq!(stats.total, 6);
        assert_eq!(stats.active, 5);
        assert_eq!(stats.total_unread, 12 + 3 + 5 + 25 + 8 + 1);
        assert_eq!(stats.daily, 3);
    }

    #[test]
    fn counts_cover_every_chip() {
        let state = DashboardState::with_seed_data();
        let counts = state.category_counts();
        assert_eq!(counts.len(), 6);
        assert_eq!(counts[0], CategoryCount { category: "all", count: 6 });
        assert_eq!(state.category_count("newsletter"), 2);
        assert_eq!(state.category_count("unknown"), 0);
    }

    #[test]
    fn empty_search_matches_everything() {
        let state = DashboardState::with_seed_data();
        assert_eq!(state.visible("all", "").len(), 6);
    }

    #[test]
    fn search_is_case_insensitive_on_name_and_address() {
        let state = DashboardState::with_seed_data();
        let by_name: Vec<_> = state.visible("all", "SPOTIFY").iter().map(|r| r.id.clone()).collect();
        assert_eq!(by_name, vec!["6"]);
        let by_address: Vec<_> = state.visible("all", "coursera.org").iter().map(|r| r.id.clone()).collect();
        assert_eq!(by_address, vec!["3"]);
    }

    #[test]
    fn failed_refresh_falls_back_with_banner() {
        let mut state = DashboardState::with_seed_data();
        let generation = state.begin_refresh().unwrap();
        assert!(state.finish_refresh::<&str>(generation, Err("boom")));
        assert!(state.using_seed_data());
        assert_eq!(state.error(), Some(LOAD_ERROR_MESSAGE));
        assert!(!state.is_refreshing());
    }

    #[test]
    fn second_refresh_is_rejected_while_one_is_in_flight() {
        let mut state = DashboardState::with_seed_data();
        let generation = state.begin_refresh().unwrap();
        assert_eq!(state.begin_refresh(), Err(RefreshInProgress));
        assert!(state.is_refreshing());

        assert!(state.finish_refresh::<()>(generation, Ok(Vec::new())));
        assert!(state.begin_refresh().is_ok());
    }

    #[test]
    fn result_arriving_after_sign_out_is_discarded() {
        let mut state = DashboardState::with_seed_data();
        let generation = state.begin_refresh().unwrap();
        state.reset_to_seed();

        let late = vec![record("x", "Blog", "blog@example.com", Category::Newsletter)];
        assert!(!state.finish_refresh::<()>(generation, Ok(late)));
        assert!(state.using_seed_data());
        assert_eq!(state.records().len(), 6);
        assert!(!state.is_refreshing());
    }

    #[test]
    fn abandoned_run_releases_the_guard() {
        let mut state = DashboardState::with_seed_data();
        let generation = state.begin_refresh().unwrap();
        assert!(state.abandon_refresh(generation));
        assert!(!state.is_refreshing());
        assert!(state.using_seed_data());
        assert!(state.begin_refresh().is_ok());
    }

    #[test]
    fn abandoning_a_stale_run_leaves_the_current_one_alone() {
        let mut state = DashboardState::with_seed_data();
        let stale = state.begin_refresh().unwrap();
        state.reset_to_seed();
        state.begin_refresh().unwrap();
        assert!(!state.abandon_refresh(stale));
        assert!(state.is_refreshing());
    }

    #[test]
    fn successful_refresh_replaces_list() {
        let mut state = DashboardState::with_seed_data();
        state.set_error("old");
        let generation = state.begin_refresh().unwrap();
        assert_eq!(state.error(), None);
        let fresh = vec![record("x", "Blog", "blog@example.com", Category::Newsletter)];
        assert!(state.finish_refresh::<()>(generation, Ok(fresh.clone())));
        assert_eq!(state.records(), fresh.as_slice());
        assert!(!state.using_seed_data());
    }
}
