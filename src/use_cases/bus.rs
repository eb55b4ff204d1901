use crate::domain::{Action, GameState};
use crate::use_cases::store::Store;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, info};

/// Drains the action bus into the store until shutdown or until every sender is gone.
///
/// All producers (keyboard, network decoder, connection monitor) share the same
/// `mpsc::Sender<Action>`, so actions are handled one at a time in arrival order.
pub async fn bus_task(
    mut store: Store,
    mut action_rx: mpsc::Receiver<Action>,
    shutdown: Arc<Notify>,
) -> GameState {
    let mut handled: u64 = 0;

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                // Actions queued before the shutdown still apply.
                while let Ok(action) = action_rx.try_recv() {
                    handled += 1;
                    store.dispatch(action);
                }
                info!(handled, "bus shutting down");
                break;
            }
            next = action_rx.recv() => {
                let Some(action) = next else {
                    debug!(handled, "all action producers gone");
                    break;
                };
                handled += 1;
                store.dispatch(action);
            }
        }
    }

    store.state()
}
