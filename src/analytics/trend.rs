//! Strength trend using linear regression (linfa)

use chrono::{Duration, NaiveDate};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use tracing::debug;

use crate::db::PerformanceRecord;

/// Minimum logged days required for training
const MIN_DATA_POINTS: usize = 3;

/// How far past the last log the projection reaches
const PROJECTION_WEEKS: i64 = 4;

/// Heaviest weight per logged day, regressed against days since the first log
pub struct TrendPredictor {
    slope: f64,
    intercept: f64,
    r2_score: f64,
    data_points: usize,
    first_date: NaiveDate,
    last_date: NaiveDate,
}

/// Trend summary for display
#[derive(Debug, Clone, PartialEq)]
pub struct Trend {
    pub kg_per_week: f64,
    pub r2_score: f64,
    pub data_points: usize,
    /// Fitted weight on the last logged day
    pub current: f64,
    pub projected: f64,
    pub projected_date: NaiveDate,
}

impl TrendPredictor {
    /// Train from (date, record) pairs; days without a logged weight are skipped
    pub fn train(history: &[(NaiveDate, PerformanceRecord)]) -> Option<Self> {
        let points: Vec<(NaiveDate, f64)> = history
            .iter()
            .filter_map(|(date, record)| Some((*date, record.top_weight()?)))
            .collect();

        if points.len() < MIN_DATA_POINTS {
            return None;
        }

        let first_date = points.iter().map(|(d, _)| *d).min()?;
        let last_date = points.iter().map(|(d, _)| *d).max()?;

        // X = days since first log, Y = heaviest weight that day
        let x_data: Vec<f64> = points
            .iter()
            .map(|(date, _)| (*date - first_date).num_days() as f64)
            .collect();
        let y_data: Vec<f64> = points.iter().map(|(_, weight)| *weight).collect();
        let n_samples = x_data.len();

        let records = Array2::from_shape_vec((n_samples, 1), x_data).ok()?;
        let targets = Array1::from_vec(y_data);
        let dataset = Dataset::new(records, targets);

        let model = LinearRegression::default().fit(&dataset).ok()?;
        let slope = model.params()[0];
        let intercept = model.intercept();

        // A flat series has no variance to explain
        let predictions = model.predict(&dataset);
        let r2_score = predictions
            .r2(&dataset)
            .ok()
            .filter(|r2| r2.is_finite())
            .unwrap_or(0.0);

        debug!(slope, intercept, r2_score, n_samples, "trained strength trend");

        Some(Self {
            slope,
            intercept,
            r2_score,
            data_points: n_samples,
            first_date,
            last_date,
        })
    }

    /// Fitted weight on a date
    pub fn predict(&self, date: NaiveDate) -> f64 {
        let day = (date - self.first_date).num_days() as f64;
        self.slope * day + self.intercept
    }

    pub fn kg_per_week(&self) -> f64 {
        self.slope * 7.0
    }

    pub fn r2_score(&self) -> f64 {
        self.r2_score
    }

    pub fn data_points(&self) -> usize {
        self.data_points
    }

    pub fn trend(&self) -> Trend {
        let projected_date = self.last_date + Duration::weeks(PROJECTION_WEEKS);
        Trend {
            kg_per_week: self.kg_per_week(),
            r2_score: self.r2_score,
            data_points: self.data_points,
            current: self.predict(self.last_date),
            projected: self.predict(projected_date),
            projected_date,
        }
    }

    /// Trend block for the bot and CLI
    pub fn format_trend(&self) -> String {
        let trend = self.trend();
        let sign = if trend.kg_per_week >= 0.0 { "+" } else { "" };
        [
            format!("Trend: {}{:.2} kg/week", sign, trend.kg_per_week),
            format!("Now: {:.1} kg", trend.current),
            format!("In {} weeks: {:.1} kg", PROJECTION_WEEKS, trend.projected),
            format!("Fit: R² {:.2} over {} sessions", trend.r2_score, trend.data_points),
        ]
        .join("\n")
    }
}
