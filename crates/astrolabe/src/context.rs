//! Per-invocation layout state.
//!
//! A [`LayoutContext`] is created by every call to
//! [`LayoutBuilder::layout`](crate::LayoutBuilder::layout) and dropped when it
//! returns. It carries the configuration, the measurer, a measurement cache,
//! the counter for synthetic routing-point identities, and the diagnostics
//! collected along the way. Nothing in it outlives the call, so concurrent
//! layouts never share mutable state.

use std::collections::HashMap;

use log::warn;

use astrolabe_core::{
    geometry::Size,
    identifier::Id,
    text::{TextMeasurer, TextStyle, wrap_text},
};

use crate::{
    config::AppConfig,
    diagnostic::{Diagnostic, DiagnosticKind},
};

/// Text after wrapping, together with its measured size.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MeasuredText {
    pub lines: Vec<String>,
    pub size: Size,
}

impl MeasuredText {
    /// The wrapped lines joined with `\n`.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }
}

pub(crate) struct LayoutContext<'a> {
    config: &'a AppConfig,
    measurer: &'a dyn TextMeasurer,
    measure_cache: HashMap<(TextStyle, String), Size>,
    diagnostics: Vec<Diagnostic>,
    next_synthetic: usize,
}

impl<'a> LayoutContext<'a> {
    pub fn new(config: &'a AppConfig, measurer: &'a dyn TextMeasurer) -> Self {
        Self {
            config,
            measurer,
            measure_cache: HashMap::new(),
            diagnostics: Vec::new(),
            next_synthetic: 0,
        }
    }

    pub fn config(&self) -> &'a AppConfig {
        self.config
    }

    /// Measures `text`, consulting the per-call cache first.
    pub fn measure(&mut self, text: &str, style: &TextStyle) -> Size {
        if text.is_empty() {
            return Size::default();
        }
        let key = (style.clone(), text.to_string());
        if let Some(size) = self.measure_cache.get(&key) {
            return *size;
        }
        let size = self.measurer.measure(text, style);
        self.measure_cache.insert(key, size);
        size
    }

    /// Wraps `text` to `max_width` and measures the result.
    pub fn measure_wrapped(
        &mut self,
        text: &str,
        style: &TextStyle,
        max_width: Option<f32>,
    ) -> MeasuredText {
        let lines = wrap_text(self.measurer, text, style, max_width);
        let size = self.measure(&lines.join("\n"), style);
        MeasuredText { lines, size }
    }

    /// Returns a fresh identity for a synthetic element such as a routing point.
    pub fn next_synthetic_id(&mut self) -> Id {
        let id = Id::from_anonymous(self.next_synthetic);
        self.next_synthetic += 1;
        id
    }

    /// Records a structural diagnostic and logs it.
    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        subject: Option<&Id>,
    ) {
        let message = message.into();
        warn!(kind = kind.name(), subject:? = subject; "{message}");
        self.diagnostics
            .push(Diagnostic::new(kind, message, subject.cloned()));
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct CountingMeasurer {
        calls: Cell<usize>,
    }

    impl TextMeasurer for CountingMeasurer {
        fn measure(&self, text: &str, _style: &TextStyle) -> Size {
            self.calls.set(self.calls.get() + 1);
            Size::new(text.len() as f32, 10.0)
        }
    }

    #[test]
    fn test_measure_is_cached() {
        let config = AppConfig::default();
        let measurer = CountingMeasurer {
            calls: Cell::new(0),
        };
        let mut ctx = LayoutContext::new(&config, &measurer);
        let style = TextStyle::default();

        assert_eq!(ctx.measure("abc", &style), Size::new(3.0, 10.0));
        assert_eq!(ctx.measure("abc", &style), Size::new(3.0, 10.0));
        assert_eq!(measurer.calls.get(), 1);

        ctx.measure("abc", &style.clone().with_bold(true));
        assert_eq!(measurer.calls.get(), 2);
    }

    #[test]
    fn test_empty_text_is_not_measured() {
        let config = AppConfig::default();
        let measurer = CountingMeasurer {
            calls: Cell::new(0),
        };
        let mut ctx = LayoutContext::new(&config, &measurer);
        assert!(ctx.measure("", &TextStyle::default()).is_zero());
        assert_eq!(measurer.calls.get(), 0);
    }

    #[test]
    fn test_synthetic_ids_are_sequential() {
        let config = AppConfig::default();
        let measurer = CountingMeasurer {
            calls: Cell::new(0),
        };
        let mut ctx = LayoutContext::new(&config, &measurer);
        assert_eq!(ctx.next_synthetic_id(), "__0");
        assert_eq!(ctx.next_synthetic_id(), "__1");
    }

    #[test]
    fn test_report_collects_diagnostics() {
        let config = AppConfig::default();
        let measurer = CountingMeasurer {
            calls: Cell::new(0),
        };
        let mut ctx = LayoutContext::new(&config, &measurer);
        ctx.report(
            DiagnosticKind::NodeNotFound,
            "edge refers to `x`",
            Some(&Id::new("x")),
        );

        let diagnostics = ctx.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind(), DiagnosticKind::NodeNotFound);
    }
}
