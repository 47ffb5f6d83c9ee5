//! TrueType font registration for chart text.
//!
//! plotters is built with `ab_glyph`, which has no system font lookup, so the
//! bytes of one font are registered under [`FONT_FAMILY`] the first time a
//! renderer is created. Registration happens once per process; a later call
//! asking for a different font gets the first outcome and a warning.

use plotters::style::FontStyle;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

#[derive(Debug)]
struct FontState {
    preferred: Option<PathBuf>,
    ready: bool,
}

static FONT_STATE: OnceLock<FontState> = OnceLock::new();

/// Make sure a font is registered. Returns whether text can be drawn.
pub fn ensure_font(preferred: Option<&Path>) -> bool {
    let state = FONT_STATE.get_or_init(|| {
        let ready = candidates(preferred).iter().any(|path| register(path));
        if !ready {
            warn!("no usable TrueType font found; charts will be drawn without text");
        }
        FontState {
            preferred: preferred.map(Path::to_path_buf),
            ready,
        }
    });
    if let Some(requested) = preferred.filter(|_| conflicts(state.preferred.as_deref(), preferred)) {
        let registered = state
            .preferred
            .as_ref()
            .map_or_else(|| "system default".to_string(), |p| p.display().to_string());
        warn!(
            requested = %requested.display(),
            %registered,
            "chart font already registered; requested font ignored"
        );
    }
    state.ready
}

/// A request names a font other than the one registered first.
fn conflicts(registered: Option<&Path>, requested: Option<&Path>) -> bool {
    requested.is_some() && requested != registered
}

fn candidates(preferred: Option<&Path>) -> Vec<PathBuf> {
    preferred
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
        .collect()
}

fn register(path: &Path) -> bool {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    // The font table keeps a &'static reference for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
        Ok(()) => {
            debug!(font = %path.display(), "registered chart font");
            true
        }
        Err(_) => {
            warn!(font = %path.display(), "font file rejected");
            false
        }
    }
}
