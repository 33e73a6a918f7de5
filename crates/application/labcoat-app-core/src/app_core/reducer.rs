use crate::domain::BuildScreenState;

use super::events::ScreenEvent;

/// Keep the notice history bounded; the screen only ever shows the latest.
const MAX_NOTICES: usize = 32;

pub fn reduce(mut state: BuildScreenState, ev: ScreenEvent) -> BuildScreenState {
    match ev {
        ScreenEvent::BusyChanged(busy) => state.busy = busy,

        ScreenEvent::Notice(msg) => {
            if state.notices.len() == MAX_NOTICES {
                state.notices.remove(0);
            }
            state.notices.push(msg.clone());
            state.last_notice = Some(msg);
        }

        ScreenEvent::BuildRefreshed(build) => {
            state.build = build;
            state.refresh_header();
        }
    }
    state
}
