//! Entry and exit signal handles passed to strategy rules.
//!
//! A rule signals by calling a method on the handle. The engine inspects the
//! handle after the rule returns; more than one call per invocation aborts the
//! run with `BacktestError::DuplicateSignal`.

use crate::domain::TradeDirection;

/// A pending entry requested by an entry rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryRequest {
    pub direction: TradeDirection,
    /// If set, entry waits for a bar whose range breaches this price.
    pub entry_price: Option<f64>,
}

/// Handle given to `entry_rule`.
#[derive(Debug, Default)]
pub struct EntrySignal {
    request: Option<EntryRequest>,
    calls: usize,
}

impl EntrySignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Enter at the next bar's open.
    pub fn enter(&mut self, direction: TradeDirection) {
        self.record(EntryRequest {
            direction,
            entry_price: None,
        });
    }

    /// Enter once a later bar trades through `price`.
    pub fn enter_at(&mut self, direction: TradeDirection, price: f64) {
        self.record(EntryRequest {
            direction,
            entry_price: Some(price),
        });
    }

    pub fn long(&mut self) {
        self.enter(TradeDirection::Long);
    }

    pub fn short(&mut self) {
        self.enter(TradeDirection::Short);
    }

    fn record(&mut self, request: EntryRequest) {
        self.calls += 1;
        self.request = Some(request);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls
    }

    pub(crate) fn into_request(self) -> Option<EntryRequest> {
        self.request
    }
}

/// How an exit rule asked to close the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitRequest {
    /// Close at the current bar's close.
    AtClose,
    /// Close at the following bar's open.
    AtNextOpen,
}

/// Handle given to `exit_rule`.
#[derive(Debug, Default)]
pub struct ExitSignal {
    request: Option<ExitRequest>,
    calls: usize,
}

impl ExitSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Close the position at this bar's close.
    pub fn exit(&mut self) {
        self.record(ExitRequest::AtClose);
    }

    /// Close the position at the next bar's open.
    pub fn exit_at_next_open(&mut self) {
        self.record(ExitRequest::AtNextOpen);
    }

    fn record(&mut self, request: ExitRequest) {
        self.calls += 1;
        self.request = Some(request);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls
    }

    pub(crate) fn into_request(self) -> Option<ExitRequest> {
        self.request
    }
}
