//! Per-symbol rolling price windows and the moving averages derived from them
//!
//! Each symbol owns one bounded FIFO sized to the larger of the two
//! configured windows. The fast and slow averages are both computed from
//! slices of that single buffer.

use dashmap::DashMap;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::VecDeque;
use utoipa::ToSchema;

use super::errors::EnrichError;
use crate::config::IndicatorConfig;

/// Averages derived from a window after an update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Indicators {
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
}

/// Read-only view of a symbol's window
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WindowView {
    pub symbol: String,
    /// Prices oldest first
    pub prices: Vec<f64>,
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
}

/// Fixed-capacity buffer of the most recent prices, in arrival order
#[derive(Debug, Clone)]
pub struct RollingWindow {
    prices: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            prices: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a price, evicting the oldest one when full
    pub fn push(&mut self, price: f64) {
        if self.prices.len() == self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
    }

    /// Rounded mean of the last `window` prices, `None` until that many exist
    pub fn sma(&self, window: usize) -> Option<f64> {
        if window == 0 || self.prices.len() < window {
            return None;
        }
        let skip = self.prices.len() - window;
        let sum: f64 = self.prices.iter().skip(skip).sum();
        Some(round2(sum / window as f64))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.prices.iter().copied()
    }
}

/// Round to 2 decimal places, ties to even
///
/// Works on the exact binary value of `value`, so 2.675 (stored just below
/// the tie) gives 2.67 while an exact tie such as 0.125 gives 0.12.
pub fn round2(value: f64) -> f64 {
    match Decimal::from_f64_retain(value) {
        Some(exact) => {
            let rounded = exact.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
            rounded.mantissa() as f64 / 10f64.powi(rounded.scale() as i32)
        }
        // outside the decimal range there are no fractional digits left to round
        None => value,
    }
}

/// Rolling windows keyed by symbol
///
/// Writers for different symbols never contend on the same window; the map
/// shard lock is held only for the duration of a single push + average.
/// Ticks for one symbol must still be applied in arrival order, which the
/// single ingestion loop guarantees.
pub struct WindowStore {
    windows: DashMap<String, RollingWindow>,
    config: IndicatorConfig,
}

impl WindowStore {
    pub fn new(config: IndicatorConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> IndicatorConfig {
        self.config
    }

    /// Append a price to the symbol's window and recompute both averages
    ///
    /// A non-finite price is rejected before any state is touched.
    pub fn update(&self, symbol: &str, price: f64) -> Result<Indicators, EnrichError> {
        if !price.is_finite() {
            return Err(EnrichError::InvalidTick(format!(
                "price {} is not finite",
                price
            )));
        }

        let capacity = self.config.capacity();
        let mut window = match self.windows.get_mut(symbol) {
            Some(window) => window,
            None => self
                .windows
                .entry(symbol.to_string())
                .or_insert_with(|| RollingWindow::new(capacity)),
        };

        window.push(price);

        Ok(Indicators {
            sma_fast: window.sma(self.config.fast_window),
            sma_slow: window.sma(self.config.slow_window),
        })
    }

    /// Current state of one symbol's window, if it has seen any tick
    pub fn view(&self, symbol: &str) -> Option<WindowView> {
        self.windows.get(symbol).map(|window| WindowView {
            symbol: symbol.to_string(),
            prices: window.prices().collect(),
            sma_fast: window.sma(self.config.fast_window),
            sma_slow: window.sma(self.config.slow_window),
        })
    }

    /// Symbols with at least one tick, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.windows.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
