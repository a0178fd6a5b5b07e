// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Create-or-update reconciliation of compiled dashboards.
///
/// Dashboards are matched to remote ones by exact title and submitted one at
/// a time in declaration order. The first failure stops the run.
use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    client::{NewRelicClient, Transport},
    error::Error,
    model::{Dashboard, DashboardTable},
};

/// What happened to a dashboard during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize,)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncOutcome
{
    /// No dashboard carried the title, so a new one was created.
    Created,
    /// The dashboard with this id was replaced.
    Updated
    {
        /// Remote dashboard id.
        id: u64,
    },
}

/// Outcome for one submitted dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct DashboardSync
{
    /// Dashboard name in the configuration document.
    pub name:    String,
    /// Dashboard title on New Relic.
    pub title:   String,
    /// Action taken.
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

impl std::fmt::Display for DashboardSync
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        match self.outcome {
            SyncOutcome::Created => write!(f, "created dashboard '{}'", self.title),
            SyncOutcome::Updated {
                id,
            } => write!(f, "updated dashboard '{}' ({id})", self.title),
        }
    }
}

/// Creates `dashboard` or updates the remote dashboard with the same title.
///
/// # Errors
///
/// Propagates [`Error::Api`] from the lookup and the submission.
pub async fn reconcile_dashboard<T: Transport,>(
    client: &NewRelicClient<T,>,
    dashboard: &Dashboard,
) -> Result<SyncOutcome, Error,>
{
    match client.find_by_title(&dashboard.title,).await? {
        Some(id,) => {
            info!("Updating dashboard '{}' ({})", dashboard.title, id);
            client.update(id, dashboard,).await?;
            Ok(SyncOutcome::Updated {
                id,
            },)
        }
        None => {
            info!("Creating dashboard '{}'", dashboard.title);
            client.create(dashboard,).await?;
            Ok(SyncOutcome::Created,)
        }
    }
}

/// Reconciles every dashboard in declaration order.
///
/// # Errors
///
/// Returns the first error raised while reconciling a dashboard; later
/// dashboards are not submitted.
pub async fn reconcile_dashboards<T: Transport,>(
    client: &NewRelicClient<T,>,
    dashboards: &DashboardTable,
    progress: &ProgressBar,
) -> Result<Vec<DashboardSync,>, Error,>
{
    info!("Reconciling {} dashboards", dashboards.len());
    let mut synced = Vec::with_capacity(dashboards.len(),);

    for (index, dashboard,) in dashboards.values().enumerate() {
        progress.set_message(format!(
            "Submitting dashboard {} of {}: {}...",
            index + 1,
            dashboards.len(),
            dashboard.title
        ),);
        debug!("Submitting dashboard {} with {} widgets", dashboard.name, dashboard.widgets.len());

        let outcome = reconcile_dashboard(client, dashboard,).await?;
        synced.push(DashboardSync {
            name: dashboard.name.clone(),
            title: dashboard.title.clone(),
            outcome,
        },);
    }

    progress.finish_with_message(format!("Sync complete: {} dashboards submitted", synced.len()),);
    Ok(synced,)
}
