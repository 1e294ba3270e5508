//! Text measurement for diagram labels.
//!
//! Layout engines never look at glyphs directly. They ask a [`TextMeasurer`]
//! how much room a piece of text needs for a given [`TextStyle`] and place
//! boxes accordingly.
//!
//! # Overview
//!
//! - [`TextStyle`] - Font properties relevant to measurement
//! - [`TextMeasurer`] - The measurement interface consumed by the engines
//! - [`FixedWidthMeasurer`] - Deterministic per-character metrics
//! - [`CosmicTextMeasurer`] - Shaping-based metrics through `cosmic-text`
//! - [`wrap_text`] - Greedy word wrapping against a measurer
//!
//! # Quick Start
//!
//! ```
//! # use astrolabe_core::text::{FixedWidthMeasurer, TextMeasurer, TextStyle};
//! let measurer = FixedWidthMeasurer::default();
//! let style = TextStyle::default();
//!
//! let size = measurer.measure("Hello", &style);
//! assert!(size.width() > 0.0);
//! assert!(size.height() > 0.0);
//! ```

use std::sync::Mutex;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Weight};
use log::{info, trace};
use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Font properties that influence the measured size of text.
///
/// Colors and decorations are a renderer concern and are not part of the
/// style seen by layout.
///
/// # Default Values
///
/// | Property | Default |
/// |----------|---------|
/// | Font family | `"Arial"` |
/// | Font size | `14` |
/// | Bold | `false` |
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    font_family: String,
    font_size: u16,
    bold: bool,
}

impl TextStyle {
    /// Creates a new text style with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the style with the given font family.
    pub fn with_font_family(mut self, family: &str) -> Self {
        self.font_family = family.to_string();
        self
    }

    /// Returns the style with the given font size in points.
    pub fn with_font_size(mut self, size: u16) -> Self {
        self.font_size = size;
        self
    }

    /// Returns the style with bold weight enabled or disabled.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn bold(&self) -> bool {
        self.bold
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 14,
            bold: false,
        }
    }
}

/// Measures text extents in device-independent units.
///
/// Implementations must be deterministic for identical arguments and must not
/// have observable side effects, so that layouts are reproducible and
/// independent layout calls can run concurrently.
pub trait TextMeasurer {
    /// Returns the width and height `text` occupies when drawn with `style`.
    ///
    /// Every line separated by `\n` counts towards the height. Empty text
    /// measures as [`Size::default`].
    fn measure(&self, text: &str, style: &TextStyle) -> Size;
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure(&self, text: &str, style: &TextStyle) -> Size {
        (**self).measure(text, style)
    }
}

/// Deterministic measurer using fixed per-character metrics.
///
/// Every character advances by `font_size * char_width_factor` (scaled by
/// `bold_factor` for bold text) and every line takes
/// `font_size * line_height_factor`. No font files are consulted, which makes
/// this measurer suitable for tests and headless environments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWidthMeasurer {
    char_width_factor: f32,
    line_height_factor: f32,
    bold_factor: f32,
}

impl FixedWidthMeasurer {
    /// Creates a measurer with custom character width and line height factors.
    pub fn new(char_width_factor: f32, line_height_factor: f32) -> Self {
        Self {
            char_width_factor,
            line_height_factor,
            ..Self::default()
        }
    }
}

impl Default for FixedWidthMeasurer {
    fn default() -> Self {
        Self {
            char_width_factor: 0.6,
            line_height_factor: 1.2,
            bold_factor: 1.1,
        }
    }
}

impl TextMeasurer for FixedWidthMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> Size {
        if text.is_empty() {
            return Size::default();
        }

        let font_size = f32::from(style.font_size());
        let mut char_width = font_size * self.char_width_factor;
        if style.bold() {
            char_width *= self.bold_factor;
        }

        let mut lines = 0usize;
        let mut widest = 0usize;
        for line in text.split('\n') {
            lines += 1;
            widest = widest.max(line.chars().count());
        }

        Size::new(
            widest as f32 * char_width,
            lines as f32 * font_size * self.line_height_factor,
        )
    }
}

/// Measurer backed by `cosmic-text` shaping and real font metrics.
///
/// Each instance owns its own [`FontSystem`]; no font state is shared between
/// measurers. The font system is guarded by a [`Mutex`], so a single measurer
/// can be shared by concurrent layout calls.
pub struct CosmicTextMeasurer {
    font_system: Mutex<FontSystem>,
}

impl std::fmt::Debug for CosmicTextMeasurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmicTextMeasurer").finish_non_exhaustive()
    }
}

impl Default for CosmicTextMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl CosmicTextMeasurer {
    /// Creates a measurer, loading the system fonts.
    pub fn new() -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: Mutex::new(FontSystem::new()),
        }
    }

    /// Creates a measurer around an existing font system.
    pub fn with_font_system(font_system: FontSystem) -> Self {
        Self {
            font_system: Mutex::new(font_system),
        }
    }
}

impl TextMeasurer for CosmicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> Size {
        if text.is_empty() {
            return Size::default();
        }

        // A poisoned lock only means another measurement panicked; the font
        // system itself is still usable.
        let mut font_system = self
            .font_system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Convert font size from points to pixels (roughly 1.33x multiplier for standard DPI)
        let font_size_px = f32::from(style.font_size()) * 1.33;
        let line_height = font_size_px * 1.15;
        let metrics = Metrics::new(font_size_px, line_height);

        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);

        let mut attrs = Attrs::new().family(Family::Name(style.font_family()));
        if style.bold() {
            attrs = attrs.weight(Weight::BOLD);
        }

        buffer.set_size(None, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let mut max_width: f32 = 0.0;
        let mut total_height: f32 = 0.0;

        let layout_runs: Vec<_> = buffer.layout_runs().collect();
        if !layout_runs.is_empty() {
            for last in layout_runs.iter().map(|run| run.glyphs.last()) {
                if let Some(last) = last {
                    max_width = max_width.max(last.x + last.w);
                }
                total_height += metrics.line_height;
            }
        } else {
            // No fonts available: fall back to an average advance.
            max_width = text.chars().count() as f32 * (font_size_px * 0.55);
            total_height = metrics.line_height;
        }

        trace!(text, width = max_width, height = total_height; "Measured text");
        Size::new(max_width, total_height)
    }
}

/// Splits `text` into lines so that no line is wider than `max_width`.
///
/// Explicit `\n` always starts a new line. Within a paragraph words are added
/// greedily; a single word wider than `max_width` is kept on its own line
/// rather than being split. Without a `max_width` only explicit line breaks
/// apply.
///
/// # Examples
///
/// ```
/// # use astrolabe_core::text::{wrap_text, FixedWidthMeasurer, TextStyle};
/// let measurer = FixedWidthMeasurer::new(1.0, 1.0);
/// let style = TextStyle::default().with_font_size(1);
///
/// let lines = wrap_text(&measurer, "aaa bbb ccc", &style, Some(7.0));
/// assert_eq!(lines, vec!["aaa bbb", "ccc"]);
/// ```
pub fn wrap_text(
    measurer: &dyn TextMeasurer,
    text: &str,
    style: &TextStyle,
    max_width: Option<f32>,
) -> Vec<String> {
    let Some(max_width) = max_width else {
        return text.split('\n').map(str::to_string).collect();
    };

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }

            let candidate = format!("{current} {word}");
            if measurer.measure(&candidate, style).width() <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_text_style_default_values() {
        let style = TextStyle::default();
        assert_eq!(style.font_family(), "Arial");
        assert_eq!(style.font_size(), 14);
        assert!(!style.bold());
    }

    #[test]
    fn test_text_style_builders() {
        let style = TextStyle::new()
            .with_font_family("monospace")
            .with_font_size(10)
            .with_bold(true);
        assert_eq!(style.font_family(), "monospace");
        assert_eq!(style.font_size(), 10);
        assert!(style.bold());
    }

    #[test]
    fn test_fixed_width_measure_single_line() {
        let measurer = FixedWidthMeasurer::default();
        let style = TextStyle::default().with_font_size(10);
        let size = measurer.measure("hello", &style);
        assert_approx_eq!(f32, size.width(), 30.0);
        assert_approx_eq!(f32, size.height(), 12.0);
    }

    #[test]
    fn test_fixed_width_measure_multiline_uses_widest_line() {
        let measurer = FixedWidthMeasurer::new(1.0, 2.0);
        let style = TextStyle::default().with_font_size(1);
        let size = measurer.measure("ab\nabcd\nc", &style);
        assert_approx_eq!(f32, size.width(), 4.0);
        assert_approx_eq!(f32, size.height(), 6.0);
    }

    #[test]
    fn test_fixed_width_measure_empty() {
        let measurer = FixedWidthMeasurer::default();
        assert!(measurer.measure("", &TextStyle::default()).is_zero());
    }

    #[test]
    fn test_fixed_width_bold_is_wider() {
        let measurer = FixedWidthMeasurer::default();
        let regular = measurer.measure("text", &TextStyle::default());
        let bold = measurer.measure("text", &TextStyle::default().with_bold(true));
        assert!(bold.width() > regular.width());
        assert_approx_eq!(f32, bold.height(), regular.height());
    }

    #[test]
    fn test_fixed_width_counts_characters_not_bytes() {
        let measurer = FixedWidthMeasurer::new(1.0, 1.0);
        let style = TextStyle::default().with_font_size(1);
        assert_approx_eq!(f32, measurer.measure("äöü", &style).width(), 3.0);
    }

    #[test]
    fn test_wrap_text_without_limit_keeps_explicit_breaks() {
        let measurer = FixedWidthMeasurer::default();
        let lines = wrap_text(&measurer, "one two\nthree", &TextStyle::default(), None);
        assert_eq!(lines, vec!["one two", "three"]);
    }

    #[test]
    fn test_wrap_text_greedy() {
        let measurer = FixedWidthMeasurer::new(1.0, 1.0);
        let style = TextStyle::default().with_font_size(1);
        let lines = wrap_text(&measurer, "a bb ccc dddd", &style, Some(5.0));
        assert_eq!(lines, vec!["a bb", "ccc", "dddd"]);
    }

    #[test]
    fn test_wrap_text_long_word_stays_whole() {
        let measurer = FixedWidthMeasurer::new(1.0, 1.0);
        let style = TextStyle::default().with_font_size(1);
        let lines = wrap_text(&measurer, "tiny enormousword", &style, Some(6.0));
        assert_eq!(lines, vec!["tiny", "enormousword"]);
    }

    #[test]
    fn test_wrap_text_empty_paragraphs_survive() {
        let measurer = FixedWidthMeasurer::default();
        let lines = wrap_text(&measurer, "a\n\nb", &TextStyle::default(), Some(100.0));
        assert_eq!(lines, vec!["a", "", "b"]);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn words_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z]{1,8}", 0..20).prop_map(|words| words.join(" "))
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Wrapped lines must fit the limit unless a single word is wider than it.
    fn check_wrapped_lines_fit(text: &str, max_width: f32) -> Result<(), TestCaseError> {
        let measurer = FixedWidthMeasurer::default();
        let style = TextStyle::default();
        let lines = wrap_text(&measurer, text, &style, Some(max_width));

        for line in &lines {
            let fits = measurer.measure(line, &style).width() <= max_width;
            let single_word = !line.contains(' ');
            prop_assert!(fits || single_word, "line {line:?} exceeds {max_width}");
        }
        Ok(())
    }

    /// Wrapping must neither drop nor reorder words.
    fn check_wrapping_preserves_words(text: &str, max_width: f32) -> Result<(), TestCaseError> {
        let measurer = FixedWidthMeasurer::default();
        let lines = wrap_text(&measurer, text, &TextStyle::default(), Some(max_width));

        let original: Vec<&str> = text.split_whitespace().collect();
        let wrapped: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
        prop_assert_eq!(original, wrapped);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn wrapped_lines_fit(text in words_strategy(), max_width in 10.0f32..300.0) {
            check_wrapped_lines_fit(&text, max_width)?;
        }

        #[test]
        fn wrapping_preserves_words(text in words_strategy(), max_width in 10.0f32..300.0) {
            check_wrapping_preserves_words(&text, max_width)?;
        }
    }
}
