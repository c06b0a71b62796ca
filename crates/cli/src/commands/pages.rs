//! Page-backed commands.

use clap::ValueEnum;
use hoarding_client::ApiClient;
use hoarding_client::pages::location::{CheckInForm, LocationPage};
use hoarding_client::pages::notifications::NotificationsPage;
use hoarding_client::pages::tasks::TasksPage;
use hoarding_client::pages::{
    LoadState, PageContext, bookings, clients, contracts, enquiries, hoardings, proposals, rent,
    users,
};
use hoarding_core::{HoardingId, NotificationId, TaskId};
use serde::Serialize;

use super::{CliError, context, emit, flush_toasts};

/// Pages that can be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PageName {
    Hoardings,
    Bookings,
    Tokens,
    Contracts,
    Proposals,
    Enquiries,
    Clients,
    Notifications,
    Tasks,
    Rent,
    Checkins,
    Users,
}

fn rows<T, R: Serialize>(state: LoadState<T>, pick: impl FnOnce(T) -> R) -> Result<R, CliError>
where
    R: Default,
{
    match state {
        LoadState::Loaded(data) => Ok(pick(data)),
        LoadState::Failed(error) => Err(error.into()),
        LoadState::Idle | LoadState::Loading => Ok(R::default()),
    }
}

async fn load_and_emit(ctx: &PageContext, page: PageName) -> Result<(), CliError> {
    let ctx = ctx.clone();
    match page {
        PageName::Hoardings => {
            let state = hoardings::HoardingsPage::new(ctx).load().await;
            emit(&rows(state, |d| d)?)
        }
        PageName::Bookings | PageName::Tokens => {
            let state = bookings::BookingsPage::new(ctx).load().await;
            if page == PageName::Tokens {
                emit(&rows(state, |d| d.tokens)?)
            } else {
                emit(&rows(state, |d| d.bookings)?)
            }
        }
        PageName::Contracts => {
            let state = contracts::ContractsPage::new(ctx).load().await;
            emit(&rows(state, |d| d.contracts)?)
        }
        PageName::Proposals => {
            let state = proposals::ProposalsPage::new(ctx).load().await;
            emit(&rows(state, |d| d.proposals)?)
        }
        PageName::Enquiries => {
            let state = enquiries::EnquiriesPage::new(ctx).load().await;
            emit(&rows(state, |d| d)?)
        }
        PageName::Clients => {
            let state = clients::ClientsPage::new(ctx).load().await;
            emit(&rows(state, |d| d)?)
        }
        PageName::Notifications => {
            let state = NotificationsPage::new(ctx).load().await;
            emit(&rows(state, |d| d)?)
        }
        PageName::Tasks => {
            let state = TasksPage::new(ctx).load().await;
            emit(&rows(state, |d| d)?)
        }
        PageName::Rent => {
            let state = rent::RentPage::new(ctx).load().await;
            emit(&rows(state, |d| d)?)
        }
        PageName::Checkins => {
            let state = LocationPage::new(ctx).load().await;
            emit(&rows(state, |d| if d.team.is_empty() { d.mine } else { d.team })?)
        }
        PageName::Users => {
            let state = users::UsersPage::new(ctx).load().await;
            emit(&rows(state, |d| d.users)?)
        }
    }
}

pub async fn list(api: &ApiClient, page: PageName) -> Result<(), CliError> {
    let ctx = context(api);
    let result = load_and_emit(&ctx, page).await;
    flush_toasts(&ctx);
    result
}

/// Mark one notification, or all of them, as read.
pub async fn mark_read(api: &ApiClient, id: Option<&str>) -> Result<(), CliError> {
    let ctx = context(api);
    let page = NotificationsPage::new(ctx.clone());
    page.load().await;
    let result = match id {
        Some(id) => page.mark_as_read(&NotificationId::new(id)).await,
        None => page.mark_all_as_read().await,
    };
    flush_toasts(&ctx);
    result?;
    tracing::info!(unread = page.unread(), "notifications updated");
    Ok(())
}

pub async fn check_in(
    api: &ApiClient,
    latitude: f64,
    longitude: f64,
    hoarding: Option<String>,
    note: String,
) -> Result<(), CliError> {
    let ctx = context(api);
    let form = CheckInForm {
        latitude: Some(latitude),
        longitude: Some(longitude),
        hoarding_id: hoarding.map(HoardingId::new),
        note,
    };
    let result = LocationPage::new(ctx.clone()).check_in(&form).await;
    flush_toasts(&ctx);
    Ok(result?)
}

pub async fn task_status(api: &ApiClient, id: &str, status: &str) -> Result<(), CliError> {
    let ctx = context(api);
    let page = TasksPage::new(ctx.clone());
    page.load().await;
    let result = page.update_status(&TaskId::new(id), status).await;
    flush_toasts(&ctx);
    Ok(result?)
}
