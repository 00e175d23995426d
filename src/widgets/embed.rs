//! Lazy-singleton loader for the third-party embed script.
//!
//! The feed renderer only places `<blockquote>` placeholders; Instagram's
//! `embed.js` turns them into rendered posts through its global
//! `instgrm.Embeds.process()` entry point. The loader makes sure exactly one
//! script tag exists and runs the processing step either right away (script
//! already loaded) or once the host reports that the script finished loading.
//! If the script is blocked it never loads, processing never runs, and the
//! fallback links stay the usable affordance.

use super::dom::{Dom, Element};
use tracing::debug;

pub const EMBED_SCRIPT_ID: &str = "ig-embed-script";
pub const EMBED_SCRIPT_SRC: &str = "https://www.instagram.com/embed.js";

/// The script's processing entry point.
pub trait EmbedRuntime {
    /// Convert every placeholder currently in the page into an embed.
    fn process(&mut self);
}

/// Runtime for hosts without a script engine, such as command-line previews.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedRuntime;

impl EmbedRuntime for DetachedRuntime {
    fn process(&mut self) {
        debug!("No script engine attached; embeds stay as placeholders");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptState {
    /// Not inserted by this loader.
    Absent,
    /// Tag inserted, load event not seen yet.
    Loading,
    Ready,
}

/// Tracks one external script tag and the continuation waiting on it.
#[derive(Debug, Clone)]
pub struct ExternalScript {
    id: String,
    src: String,
    state: ScriptState,
    pending: bool,
}

impl ExternalScript {
    pub fn new(id: &str, src: &str) -> Self {
        Self {
            id: id.to_string(),
            src: src.to_string(),
            state: ScriptState::Absent,
            pending: false,
        }
    }

    /// Loader for Instagram's `embed.js`.
    pub fn instagram_embed() -> Self {
        Self::new(EMBED_SCRIPT_ID, EMBED_SCRIPT_SRC)
    }

    pub fn state(&self) -> ScriptState {
        self.state
    }

    /// Whether a processing run is queued behind the load event.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Request processing: insert the tag if the page lacks it, otherwise
    /// process now unless a load is still in flight.
    pub fn request<D: Dom, R: EmbedRuntime>(&mut self, dom: &mut D, runtime: &mut R) {
        if !dom.exists(&self.id) {
            dom.append_to_body(
                Element::new("script")
                    .attr("id", &self.id)
                    .attr("async", "")
                    .attr("src", &self.src),
            );
            self.state = ScriptState::Loading;
            self.pending = true;
            debug!(id = %self.id, src = %self.src, "Inserted external script");
            return;
        }

        match self.state {
            ScriptState::Loading => self.pending = true,
            // Ready, or a tag authored into the page: the entry point no-ops
            // if the script never arrived.
            ScriptState::Ready | ScriptState::Absent => runtime.process(),
        }
    }

    /// The host saw the script's load event.
    pub fn on_load<R: EmbedRuntime>(&mut self, runtime: &mut R) {
        self.state = ScriptState::Ready;
        if std::mem::take(&mut self.pending) {
            runtime.process();
        }
    }
}
