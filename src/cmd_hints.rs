//! `keyhints hints`: show the hints for a document and select one.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use serde_json::json;

use keyhints_config::Settings;
use keyhints_core::{BrowserSources, Kernel};
use keyhints_hints::{Document, FrameHandle, FrameSnapshot, RecordingActivator};
use keyhints_protocols::LinkHintMode;

const TAB_ID: u64 = 1;
const FRAME_ID: u64 = 0;
const POLL: Duration = Duration::from_millis(10);

async fn wait_for(
    handle: &FrameHandle,
    limit: Duration,
    check: impl Fn(&FrameSnapshot) -> bool,
) -> anyhow::Result<FrameSnapshot> {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        let snapshot = handle.snapshot().await?;
        if check(&snapshot) {
            return Ok(snapshot);
        }
        if tokio::time::Instant::now() >= deadline {
            bail!("hint mode did not settle within {:?}", limit);
        }
        tokio::time::sleep(POLL).await;
    }
}

fn is_idle(snapshot: &FrameSnapshot) -> bool {
    snapshot.mode.is_none() && snapshot.modes.is_empty()
}

pub(crate) async fn run(
    settings: Settings,
    document: &Path,
    mode: LinkHintMode,
    keys: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(document)
        .with_context(|| format!("reading {}", document.display()))?;
    let document = Document::from_json(&text).with_context(|| format!("parsing {}", document.display()))?;

    let hints = &settings.hints;
    let limit = Duration::from_millis(
        hints.suppression_timeout_ms
            + hints.descriptor_timeout_ms
            + hints.typing_protector_ms
            + hints.flash_ms,
    ) + Duration::from_secs(1);

    let activator = Arc::new(RecordingActivator::new());
    let kernel = Kernel::new(settings, BrowserSources::default(), activator.clone())?;
    kernel.start().await?;
    let frame = kernel.attach_frame(TAB_ID, FRAME_ID, document, true)?;

    frame.activate(mode, 1)?;
    let shown = wait_for(&frame, limit, |s| !s.markers.is_empty() || is_idle(s)).await?;

    if let Some(keys) = keys {
        if !shown.markers.is_empty() {
            frame.type_keys(keys)?;
            // Keys that leave a selection incomplete keep hint mode up.
            if wait_for(&frame, limit, is_idle).await.is_err() {
                frame.type_keys("<Esc>")?;
                wait_for(&frame, limit, is_idle).await?;
            }
        }
    }
    let activations = activator.performed();
    kernel.stop().await?;

    if json {
        let output = json!({
            "mode": mode,
            "markers": shown.markers,
            "activations": activations,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", mode.hud_text());
    if shown.markers.is_empty() {
        println!("No links to select.");
        return Ok(());
    }
    for marker in &shown.markers {
        println!("  {:<6} #{:<3} {}", marker.hint_string, marker.local_index, marker.rendered);
    }
    for activation in &activations {
        println!(
            "=> {} <{}> element {}{}{}",
            activation.action,
            activation.tag,
            activation.element,
            activation
                .href
                .as_deref()
                .map(|href| format!(" href={href}"))
                .unwrap_or_default(),
            if activation.text.is_empty() {
                String::new()
            } else {
                format!(" \"{}\"", activation.text)
            },
        );
    }
    if keys.is_some() && activations.is_empty() {
        println!("=> no link selected");
    }
    Ok(())
}
