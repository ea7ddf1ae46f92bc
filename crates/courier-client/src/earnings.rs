//! # Earnings Service
//!
//! Session-gated earnings figures.
//!
//! - `summary`: computed locally from the cached delivery history
//! - `remote_summary`: the backend's own figures, including the weekly count
//! - `history`: per-delivery earnings records from the backend

use chrono::{DateTime, Local, TimeZone};
use std::sync::Arc;
use tracing::debug;

use courier_core::{summarize, EarningsPeriod, EarningsRecord, EarningsSummary, RemoteEarnings};

use crate::error::ClientResult;
use crate::gateway::RemoteGateway;
use crate::orders::OrderStore;
use crate::session::SessionManager;

pub struct EarningsService {
    session: Arc<SessionManager>,
    orders: Arc<OrderStore>,
    gateway: Arc<dyn RemoteGateway>,
    history_limit: u32,
}

impl EarningsService {
    pub fn new(
        session: Arc<SessionManager>,
        orders: Arc<OrderStore>,
        gateway: Arc<dyn RemoteGateway>,
        history_limit: u32,
    ) -> Self {
        EarningsService {
            session,
            orders,
            gateway,
            history_limit,
        }
    }

    /// Summary of cached deliveries for `period`, at the local clock.
    pub async fn summary(&self, period: EarningsPeriod) -> ClientResult<EarningsSummary> {
        self.summary_at(period, &Local::now()).await
    }

    /// Summary of cached deliveries for `period` as seen at `now`.
    ///
    /// The period window is computed in `now`'s time zone.
    pub async fn summary_at<Tz>(
        &self,
        period: EarningsPeriod,
        now: &DateTime<Tz>,
    ) -> ClientResult<EarningsSummary>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: Send + Sync,
    {
        let history = self.orders.history().await?;
        let summary = summarize(&history, period, now);
        debug!(
            period = %period,
            deliveries = summary.deliveries_count,
            total = %summary.total_earnings,
            "Earnings summarized"
        );
        Ok(summary)
    }

    /// The backend's figures for `period`.
    pub async fn remote_summary(&self, period: EarningsPeriod) -> ClientResult<RemoteEarnings> {
        self.session.require_signed_in()?;
        let result = self.gateway.get_earnings(period).await;
        self.session.absorb_expiry(result).await
    }

    /// Recent earnings records, newest first as the backend sends them.
    ///
    /// `limit` defaults to the configured `earnings_history_limit`.
    pub async fn history(&self, limit: Option<u32>) -> ClientResult<Vec<EarningsRecord>> {
        self.session.require_signed_in()?;
        let limit = limit.unwrap_or(self.history_limit);
        let result = self.gateway.get_earnings_history(limit).await;
        self.session.absorb_expiry(result).await
    }
}

impl std::fmt::Debug for EarningsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EarningsService")
            .field("history_limit", &self.history_limit)
            .finish_non_exhaustive()
    }
}
