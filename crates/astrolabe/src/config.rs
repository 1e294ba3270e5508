//! Configuration types for Astrolabe diagram layout.
//!
//! This module provides configuration structures that control spacing,
//! algorithm parameters, size limits, and the text styles used for
//! measurement. All types implement [`serde::Deserialize`] and every field
//! has a default, so partial TOML documents are accepted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and style settings.
//! - [`LayoutConfig`] - Per-engine settings plus [`LimitsConfig`].
//! - [`SequenceConfig`] - Spacing of the timeline engine.
//! - [`GraphConfig`] - Spacing and algorithm parameters of the graph engine.
//! - [`StyleConfig`] - Text styles handed to the measurer.
//!
//! # Example
//!
//! ```
//! # use astrolabe::config::{AppConfig, Direction};
//! let config = AppConfig::from_toml_str(
//!     r#"
//!     [layout.graph]
//!     direction = "left_to_right"
//!     ordering_passes = 12
//!
//!     [layout.limits]
//!     max_elements = 500
//!     "#,
//! )?;
//!
//! assert_eq!(config.layout().graph().direction(), Direction::LeftToRight);
//! assert_eq!(config.layout().graph().ordering_passes(), 12);
//! assert_eq!(config.layout().limits().max_elements(), 500);
//! // Untouched sections keep their defaults
//! assert!(config.layout().sequence().footbox());
//! # Ok::<(), astrolabe::error::ConfigError>(())
//! ```

use std::{fs, path::Path};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use astrolabe_core::text::TextStyle;

use crate::error::ConfigError;

/// Top-level configuration combining layout and style settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified layout and style configurations.
    pub fn new(layout: LayoutConfig, style: StyleConfig) -> Self {
        Self { layout, style }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown value
    /// types, and [`ConfigError::Validation`] for out-of-range values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        debug!("Configuration parsed");
        Ok(config)
    }

    /// Loads, parses, and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File doesn't exist
    /// - File cannot be read
    /// - TOML parsing or validation fails
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration");

        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns the configuration with the given layout section.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Returns the configuration with the given style section.
    pub fn with_style(mut self, style: StyleConfig) -> Self {
        self.style = style;
        self
    }

    /// Checks that every value is usable by the engines.
    ///
    /// Spacings, gaps, widths, and heights must be finite and positive;
    /// paddings, indents, and offsets must be finite and non-negative; pass
    /// counts, limits, and font sizes must be non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.sequence.validate()?;
        self.layout.graph.validate()?;
        self.layout.limits.validate()?;
        self.style.validate()
    }
}

fn require_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "`{field}` must be a positive number, got {value}"
        )))
    }
}

fn require_non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "`{field}` must be a non-negative number, got {value}"
        )))
    }
}

fn require_non_zero(field: &str, value: usize) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "`{field}` must be greater than zero"
        )))
    }
}

/// Layout configuration for both engines.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct LayoutConfig {
    /// Timeline engine settings.
    #[serde(default)]
    sequence: SequenceConfig,

    /// Graph engine settings.
    #[serde(default)]
    graph: GraphConfig,

    /// Input size limits.
    #[serde(default)]
    limits: LimitsConfig,
}

impl LayoutConfig {
    /// Creates a new [`LayoutConfig`] from its sections.
    pub fn new(sequence: SequenceConfig, graph: GraphConfig, limits: LimitsConfig) -> Self {
        Self {
            sequence,
            graph,
            limits,
        }
    }

    pub fn sequence(&self) -> &SequenceConfig {
        &self.sequence
    }

    pub fn graph(&self) -> &GraphConfig {
        &self.graph
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    pub fn with_sequence(mut self, sequence: SequenceConfig) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_graph(mut self, graph: GraphConfig) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }
}

/// Spacing of the timeline engine.
///
/// # Default Values
///
/// | Field | Default |
/// |-------|---------|
/// | `diagram_padding` | `20` |
/// | `participant_padding` | `8` |
/// | `participant_spacing` | `40` |
/// | `event_spacing` | `24` |
/// | `message_label_padding` | `4` |
/// | `max_message_width` | none |
/// | `self_message_width` | `30` |
/// | `self_message_height` | `16` |
/// | `stub_length` | `40` |
/// | `activation_width` | `10` |
/// | `activation_indent` | `5` |
/// | `activation_min_height` | `8` |
/// | `note_padding` | `6` |
/// | `note_gap` | `10` |
/// | `block_padding` | `10` |
/// | `block_indent` | `8` |
/// | `block_header_height` | `20` |
/// | `divider_height` | `20` |
/// | `delay_height` | `30` |
/// | `footbox` | `true` |
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    diagram_padding: f32,
    participant_padding: f32,
    participant_spacing: f32,
    event_spacing: f32,
    message_label_padding: f32,
    max_message_width: Option<f32>,
    self_message_width: f32,
    self_message_height: f32,
    stub_length: f32,
    activation_width: f32,
    activation_indent: f32,
    activation_min_height: f32,
    note_padding: f32,
    note_gap: f32,
    block_padding: f32,
    block_indent: f32,
    block_header_height: f32,
    divider_height: f32,
    delay_height: f32,
    footbox: bool,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            diagram_padding: 20.0,
            participant_padding: 8.0,
            participant_spacing: 40.0,
            event_spacing: 24.0,
            message_label_padding: 4.0,
            max_message_width: None,
            self_message_width: 30.0,
            self_message_height: 16.0,
            stub_length: 40.0,
            activation_width: 10.0,
            activation_indent: 5.0,
            activation_min_height: 8.0,
            note_padding: 6.0,
            note_gap: 10.0,
            block_padding: 10.0,
            block_indent: 8.0,
            block_header_height: 20.0,
            divider_height: 20.0,
            delay_height: 30.0,
            footbox: true,
        }
    }
}

impl SequenceConfig {
    /// Margin between the drawing and the result bounds.
    pub fn diagram_padding(&self) -> f32 {
        self.diagram_padding
    }

    /// Padding between a participant label and its header box.
    pub fn participant_padding(&self) -> f32 {
        self.participant_padding
    }

    /// Minimum horizontal gap between two reserved columns.
    pub fn participant_spacing(&self) -> f32 {
        self.participant_spacing
    }

    /// Minimum vertical distance between consecutive rows.
    pub fn event_spacing(&self) -> f32 {
        self.event_spacing
    }

    pub fn message_label_padding(&self) -> f32 {
        self.message_label_padding
    }

    /// Word-wrap width of message labels; `None` wraps only at `\n`.
    pub fn max_message_width(&self) -> Option<f32> {
        self.max_message_width
    }

    pub fn self_message_width(&self) -> f32 {
        self.self_message_width
    }

    pub fn self_message_height(&self) -> f32 {
        self.self_message_height
    }

    /// Length of the stub drawn for lost messages and unresolved targets.
    pub fn stub_length(&self) -> f32 {
        self.stub_length
    }

    pub fn activation_width(&self) -> f32 {
        self.activation_width
    }

    /// Horizontal shift applied per nesting level of activations.
    pub fn activation_indent(&self) -> f32 {
        self.activation_indent
    }

    pub fn activation_min_height(&self) -> f32 {
        self.activation_min_height
    }

    pub fn note_padding(&self) -> f32 {
        self.note_padding
    }

    /// Distance between a side note and the lifeline it is attached to.
    pub fn note_gap(&self) -> f32 {
        self.note_gap
    }

    pub fn block_padding(&self) -> f32 {
        self.block_padding
    }

    /// Additional frame margin per nested block level.
    pub fn block_indent(&self) -> f32 {
        self.block_indent
    }

    pub fn block_header_height(&self) -> f32 {
        self.block_header_height
    }

    pub fn divider_height(&self) -> f32 {
        self.divider_height
    }

    pub fn delay_height(&self) -> f32 {
        self.delay_height
    }

    /// Whether participant boxes are repeated below the lifelines.
    pub fn footbox(&self) -> bool {
        self.footbox
    }

    pub fn with_event_spacing(mut self, event_spacing: f32) -> Self {
        self.event_spacing = event_spacing;
        self
    }

    pub fn with_max_message_width(mut self, max_message_width: Option<f32>) -> Self {
        self.max_message_width = max_message_width;
        self
    }

    pub fn with_footbox(mut self, footbox: bool) -> Self {
        self.footbox = footbox;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("sequence.diagram_padding", self.diagram_padding)?;
        require_non_negative("sequence.participant_padding", self.participant_padding)?;
        require_positive("sequence.participant_spacing", self.participant_spacing)?;
        require_positive("sequence.event_spacing", self.event_spacing)?;
        require_non_negative("sequence.message_label_padding", self.message_label_padding)?;
        if let Some(width) = self.max_message_width {
            require_positive("sequence.max_message_width", width)?;
        }
        require_positive("sequence.self_message_width", self.self_message_width)?;
        require_positive("sequence.self_message_height", self.self_message_height)?;
        require_positive("sequence.stub_length", self.stub_length)?;
        require_positive("sequence.activation_width", self.activation_width)?;
        require_non_negative("sequence.activation_indent", self.activation_indent)?;
        require_positive("sequence.activation_min_height", self.activation_min_height)?;
        require_non_negative("sequence.note_padding", self.note_padding)?;
        require_non_negative("sequence.note_gap", self.note_gap)?;
        require_non_negative("sequence.block_padding", self.block_padding)?;
        require_non_negative("sequence.block_indent", self.block_indent)?;
        require_positive("sequence.block_header_height", self.block_header_height)?;
        require_positive("sequence.divider_height", self.divider_height)?;
        require_positive("sequence.delay_height", self.delay_height)
    }
}

/// Main axis of the hierarchical layout.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Ranks grow downward (default).
    #[default]
    TopToBottom,
    /// Ranks grow to the right.
    LeftToRight,
}

/// Key used to reorder nodes during crossing minimization.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingHeuristic {
    /// Weighted median of neighbor positions (default).
    #[default]
    Median,
    /// Mean of neighbor positions.
    Barycenter,
}

/// Spacing and algorithm parameters of the graph engine.
///
/// Distances along the "cross" axis run across ranks (horizontal for
/// [`Direction::TopToBottom`]); distances along the "main" axis run from rank
/// to rank.
///
/// # Default Values
///
/// | Field | Default |
/// |-------|---------|
/// | `direction` | `top_to_bottom` |
/// | `diagram_padding` | `20` |
/// | `node_padding` | `10` |
/// | `node_spacing` | `30` |
/// | `virtual_node_width` | `10` |
/// | `rank_gap` | `50` |
/// | `component_gap` | `40` |
/// | `cluster_padding` | `15` |
/// | `ordering_passes` | `8` |
/// | `ordering_heuristic` | `median` |
/// | `relaxation_passes` | `4` |
/// | `flat_edge_offset` | `15` |
/// | `self_loop_size` | `20` |
/// | `edge_label_padding` | `4` |
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    direction: Direction,
    diagram_padding: f32,
    node_padding: f32,
    node_spacing: f32,
    virtual_node_width: f32,
    rank_gap: f32,
    component_gap: f32,
    cluster_padding: f32,
    ordering_passes: usize,
    ordering_heuristic: OrderingHeuristic,
    relaxation_passes: usize,
    flat_edge_offset: f32,
    self_loop_size: f32,
    edge_label_padding: f32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            diagram_padding: 20.0,
            node_padding: 10.0,
            node_spacing: 30.0,
            virtual_node_width: 10.0,
            rank_gap: 50.0,
            component_gap: 40.0,
            cluster_padding: 15.0,
            ordering_passes: 8,
            ordering_heuristic: OrderingHeuristic::default(),
            relaxation_passes: 4,
            flat_edge_offset: 15.0,
            self_loop_size: 20.0,
            edge_label_padding: 4.0,
        }
    }
}

impl GraphConfig {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Margin between the drawing and the result bounds.
    pub fn diagram_padding(&self) -> f32 {
        self.diagram_padding
    }

    /// Padding between a node label and the node border.
    pub fn node_padding(&self) -> f32 {
        self.node_padding
    }

    /// Minimum cross-axis gap between neighbors in the same rank.
    pub fn node_spacing(&self) -> f32 {
        self.node_spacing
    }

    /// Cross-axis width reserved for a routing point.
    pub fn virtual_node_width(&self) -> f32 {
        self.virtual_node_width
    }

    /// Minimum main-axis gap between consecutive ranks.
    pub fn rank_gap(&self) -> f32 {
        self.rank_gap
    }

    /// Cross-axis gap between disconnected components.
    pub fn component_gap(&self) -> f32 {
        self.component_gap
    }

    pub fn cluster_padding(&self) -> f32 {
        self.cluster_padding
    }

    pub fn ordering_passes(&self) -> usize {
        self.ordering_passes
    }

    pub fn ordering_heuristic(&self) -> OrderingHeuristic {
        self.ordering_heuristic
    }

    pub fn relaxation_passes(&self) -> usize {
        self.relaxation_passes
    }

    /// Main-axis detour of flat edges that would cross an intermediate node.
    pub fn flat_edge_offset(&self) -> f32 {
        self.flat_edge_offset
    }

    pub fn self_loop_size(&self) -> f32 {
        self.self_loop_size
    }

    pub fn edge_label_padding(&self) -> f32 {
        self.edge_label_padding
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_ordering_passes(mut self, passes: usize) -> Self {
        self.ordering_passes = passes;
        self
    }

    pub fn with_ordering_heuristic(mut self, heuristic: OrderingHeuristic) -> Self {
        self.ordering_heuristic = heuristic;
        self
    }

    pub fn with_relaxation_passes(mut self, passes: usize) -> Self {
        self.relaxation_passes = passes;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("graph.diagram_padding", self.diagram_padding)?;
        require_non_negative("graph.node_padding", self.node_padding)?;
        require_positive("graph.node_spacing", self.node_spacing)?;
        require_positive("graph.virtual_node_width", self.virtual_node_width)?;
        require_positive("graph.rank_gap", self.rank_gap)?;
        require_positive("graph.component_gap", self.component_gap)?;
        require_non_negative("graph.cluster_padding", self.cluster_padding)?;
        require_non_zero("graph.ordering_passes", self.ordering_passes)?;
        require_non_zero("graph.relaxation_passes", self.relaxation_passes)?;
        require_positive("graph.flat_edge_offset", self.flat_edge_offset)?;
        require_positive("graph.self_loop_size", self.self_loop_size)?;
        require_non_negative("graph.edge_label_padding", self.edge_label_padding)
    }
}

/// Input size limits enforced before layout starts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    max_elements: usize,
    max_nesting_depth: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_elements: 10_000,
            max_nesting_depth: 64,
        }
    }
}

impl LimitsConfig {
    pub fn new(max_elements: usize, max_nesting_depth: usize) -> Self {
        Self {
            max_elements,
            max_nesting_depth,
        }
    }

    /// Maximum participants plus events, or nodes plus edges plus clusters.
    pub fn max_elements(&self) -> usize {
        self.max_elements
    }

    /// Maximum depth of nested clusters or blocks.
    pub fn max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_non_zero("limits.max_elements", self.max_elements)?;
        require_non_zero("limits.max_nesting_depth", self.max_nesting_depth)
    }
}

/// Text styles handed to the measurer.
///
/// Only properties that change measured sizes live here; colors are a
/// renderer concern.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    participant_text: TextStyle,
    message_text: TextStyle,
    note_text: TextStyle,
    node_text: TextStyle,
    edge_text: TextStyle,
    title_text: TextStyle,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            participant_text: TextStyle::default(),
            message_text: TextStyle::default().with_font_size(12),
            note_text: TextStyle::default().with_font_size(12),
            node_text: TextStyle::default(),
            edge_text: TextStyle::default().with_font_size(12),
            title_text: TextStyle::default().with_font_size(18).with_bold(true),
        }
    }
}

impl StyleConfig {
    pub fn participant_text(&self) -> &TextStyle {
        &self.participant_text
    }

    /// Style of message labels, dividers, delays, and block headers.
    pub fn message_text(&self) -> &TextStyle {
        &self.message_text
    }

    pub fn note_text(&self) -> &TextStyle {
        &self.note_text
    }

    /// Style of node and cluster labels.
    pub fn node_text(&self) -> &TextStyle {
        &self.node_text
    }

    pub fn edge_text(&self) -> &TextStyle {
        &self.edge_text
    }

    /// Style of titles and captions.
    pub fn title_text(&self) -> &TextStyle {
        &self.title_text
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let styles = [
            ("style.participant_text", &self.participant_text),
            ("style.message_text", &self.message_text),
            ("style.note_text", &self.note_text),
            ("style.node_text", &self.node_text),
            ("style.edge_text", &self.edge_text),
            ("style.title_text", &self.title_text),
        ];
        for (field, style) in styles {
            require_non_zero(
                &format!("{field}.font_size"),
                usize::from(style.font_size()),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.layout().graph().ordering_passes(), 8);
        assert_eq!(config.layout().graph().relaxation_passes(), 4);
        assert_eq!(config.layout().limits().max_elements(), 10_000);
        assert_eq!(config.layout().limits().max_nesting_depth(), 64);
        assert_eq!(
            config.layout().graph().ordering_heuristic(),
            OrderingHeuristic::Median
        );
        assert!(config.layout().sequence().max_message_width().is_none());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = AppConfig::from_toml_str("").expect("empty document is valid");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_section() {
        let config = AppConfig::from_toml_str(
            r#"
            [layout.sequence]
            event_spacing = 40.0
            footbox = false

            [style.title_text]
            font_size = 30
            "#,
        )
        .expect("valid config");

        let sequence = config.layout().sequence();
        assert_eq!(sequence.event_spacing(), 40.0);
        assert!(!sequence.footbox());
        assert_eq!(sequence.participant_spacing(), 40.0);
        assert_eq!(config.style().title_text().font_size(), 30);
        assert_eq!(config.style().title_text().font_family(), "Arial");
    }

    #[test]
    fn test_parse_error() {
        let err = AppConfig::from_toml_str("[layout.graph]\ndirection = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_direction_is_parse_error() {
        let err =
            AppConfig::from_toml_str("[layout.graph]\ndirection = \"diagonal\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_passes_rejected() {
        let err = AppConfig::from_toml_str("[layout.graph]\nordering_passes = 0").unwrap_err();
        match err {
            ConfigError::Validation(message) => assert!(message.contains("ordering_passes")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_spacing_rejected() {
        let err = AppConfig::from_toml_str("[layout.sequence]\nevent_spacing = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = AppConfig::from_toml_str("[layout.graph]\nrank_gap = -5.0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_nan_rejected_by_validate() {
        let config = AppConfig::default().with_layout(
            LayoutConfig::default()
                .with_sequence(SequenceConfig::default().with_event_spacing(f32::NAN)),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_font_size_rejected() {
        let err = AppConfig::from_toml_str("[style.node_text]\nfont_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(_)));
    }
}
