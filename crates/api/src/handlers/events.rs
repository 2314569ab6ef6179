//! Server-sent dashboard refresh events.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use futures::Stream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::ReceiverStream;
use tskr_events::{DashboardBus, DashboardEvent, SubscriptionId};

use crate::middleware::household::HouseholdMember;
use crate::state::AppState;

/// Events buffered per client before new ones are dropped.
const CLIENT_BUFFER: usize = 32;

/// SSE body for one client. Unsubscribes from the bus when dropped.
pub struct DashboardStream {
    inner: ReceiverStream<DashboardEvent>,
    bus: Arc<DashboardBus>,
    subscription: SubscriptionId,
}

impl Stream for DashboardStream {
    type Item = Result<Event, axum::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx).map(|next| {
            next.map(|event| Event::default().event(event.name()).json_data(&event))
        })
    }
}

impl Drop for DashboardStream {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription);
    }
}

/// GET /api/v1/households/{household_id}/events
///
/// Streams every [`DashboardEvent`] for the household as `event: <type>`
/// with a JSON `data` payload.
pub async fn stream_events(
    member: HouseholdMember,
    State(state): State<AppState>,
) -> Sse<KeepAliveStream<DashboardStream>> {
    let (tx, rx) = mpsc::channel(CLIENT_BUFFER);
    let household_id = member.household_id;

    let subscription = state.dashboard_bus.subscribe(Arc::new(
        move |event: &DashboardEvent| -> anyhow::Result<()> {
            if event.household_id() != household_id {
                return Ok(());
            }
            match tx.try_send(event.clone()) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(household_id, "Event stream client lagging, dropping event");
                    Ok(())
                }
                Err(TrySendError::Closed(_)) => anyhow::bail!("event stream client disconnected"),
            }
        },
    ));

    tracing::debug!(
        user_id = member.user_id,
        household_id,
        "Dashboard event stream opened"
    );

    Sse::new(DashboardStream {
        inner: ReceiverStream::new(rx),
        bus: Arc::clone(&state.dashboard_bus),
        subscription,
    })
    .keep_alive(KeepAlive::default())
}
