//! Headless mode runner - navigate and print composed views

use std::sync::Arc;

use conch_app::AppContext;
use tracing::info;

use super::HeadlessEvent;

/// Navigate each path in order and print the settled view of each.
///
/// With no paths the root route is shown.
pub async fn run_headless(ctx: Arc<AppContext>, paths: &[String]) {
    info!("═══════════════════════════════════════════════════════");
    info!("Conch starting in HEADLESS mode");
    info!("API: {}", ctx.api().base_url());
    info!("═══════════════════════════════════════════════════════");

    HeadlessEvent::started(ctx.api().base_url().as_str(), ctx.translator().locale()).emit();

    // One line per navigation, printed as soon as it settles
    for_each_view(&ctx, paths, HeadlessEvent::emit).await;

    info!("Conch headless mode exiting");
}

/// Navigate each path in order, handing `on_view` the `view` event of each
/// navigation before the next one starts.
pub async fn for_each_view<F>(ctx: &AppContext, paths: &[String], mut on_view: F)
where
    F: FnMut(&HeadlessEvent),
{
    let targets: Vec<&str> = if paths.is_empty() {
        vec!["/"]
    } else {
        paths.iter().map(String::as_str).collect()
    };

    for path in targets {
        ctx.navigate(path).await;
        on_view(&HeadlessEvent::view(path, ctx.compose()));
    }
}

/// Navigate each path and collect one `view` event per navigation.
pub async fn render_paths(ctx: &AppContext, paths: &[String]) -> Vec<HeadlessEvent> {
    let mut events = Vec::with_capacity(paths.len().max(1));
    for_each_view(ctx, paths, |event| events.push(event.clone())).await;
    events
}
