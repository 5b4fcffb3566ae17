//! Loading-screen handshake around the hall build.
//!
//! Order: show, paced synthetic progress, build, 100%, reveal the hall under
//! the screen, fade the screen to black, hold, hide.

use crate::constants::{LOADING_BLACK_HOLD_MS, LOADING_PACE_MS, LOADING_PROGRESS_TICK_MS};
use crate::error::HallError;

/// Percentage reached by synthetic progress before the build runs.
pub const PRE_BUILD_PROGRESS: u32 = 90;

#[allow(async_fn_in_trait)]
pub trait LoadingScreen {
    fn show(&self);
    fn set_progress(&self, percent: u32);
    /// Resolves once the screen is fully black.
    async fn fade_to_black(&self);
    /// Resolves once the black overlay has faded out and been removed.
    async fn hide(&self);
}

#[allow(async_fn_in_trait)]
pub trait Pacer {
    async fn sleep(&self, ms: u32);
}

/// Progress values reported while pacing, ending at [`PRE_BUILD_PROGRESS`].
pub fn progress_ticks() -> impl Iterator<Item = u32> {
    let n = (LOADING_PACE_MS / LOADING_PROGRESS_TICK_MS).max(1);
    (1..=n).map(move |k| k * PRE_BUILD_PROGRESS / n)
}

pub async fn run_loading<L, P, T, B, R>(screen: &L, pacer: &P, build: B, reveal: R) -> Result<T, HallError>
where
    L: LoadingScreen,
    P: Pacer,
    B: FnOnce() -> Result<T, HallError>,
    R: FnOnce(&T),
{
    screen.show();
    screen.set_progress(0);
    for percent in progress_ticks() {
        pacer.sleep(LOADING_PROGRESS_TICK_MS).await;
        screen.set_progress(percent);
    }

    let built = match build() {
        Ok(built) => built,
        Err(e) => {
            log::error!("[hall] build failed: {e}");
            screen.hide().await;
            return Err(e);
        }
    };
    screen.set_progress(100);
    reveal(&built);

    screen.fade_to_black().await;
    pacer.sleep(LOADING_BLACK_HOLD_MS).await;
    screen.hide().await;
    Ok(built)
}
