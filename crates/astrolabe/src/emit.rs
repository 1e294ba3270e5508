//! Drawing command emission.
//!
//! Turns a [`LayoutResult`] into the device-independent primitives of
//! [`astrolabe_core::draw`]. Every primitive is assigned a [`RenderLayer`] so
//! the final stream is z-ordered independently of emission order: cluster
//! frames at the bottom, then lifelines, boxes, activations, fragments, notes,
//! arrows, and finally all text.
//!
//! Emission only reads geometry. Sizes and positions are never recomputed
//! here; the text style attached to each [`DrawCommand::Text`] is the one the
//! layout measured with.

use log::debug;

use astrolabe_core::{
    draw::{
        ArrowHead, DrawCommand, ElementRole, LayeredOutput, PathSegment, RenderLayer, TextAnchor,
    },
    geometry::{Bounds, Point},
    semantic::{ArrowStyle, EdgeStyle},
    text::TextStyle,
};

use crate::{
    config::AppConfig,
    layout::{
        BlockGeometry, DiagramLayout, EventGeometryKind, GraphLayout, LabelGeometry, LayoutResult,
        ParticipantGeometry, SequenceLayout,
    },
};

/// Side length of the folded corner of a note.
const NOTE_FOLD: f32 = 8.0;

/// Size of the cut corner of a block tab.
const TAB_NOTCH: f32 = 5.0;

/// Emits the layered drawing commands of a layout.
pub fn emit(result: &LayoutResult, config: &AppConfig) -> LayeredOutput {
    let mut emitter = Emitter::new(config);
    match result.diagram() {
        DiagramLayout::Sequence(layout) => emitter.sequence(layout),
        DiagramLayout::Graph(layout) => emitter.graph(layout),
    }
    if let Some(title) = result.title() {
        emitter.text(title, config.style().title_text(), ElementRole::Title);
    }
    if let Some(caption) = result.caption() {
        emitter.text(caption, config.style().title_text(), ElementRole::Caption);
    }

    debug!(commands = emitter.output.len(); "Drawing commands emitted");
    emitter.output
}

/// Emits the drawing commands of a layout in z-order.
pub fn draw_commands(result: &LayoutResult, config: &AppConfig) -> Vec<DrawCommand> {
    emit(result, config).into_commands()
}

struct Emitter<'a> {
    config: &'a AppConfig,
    output: LayeredOutput,
}

impl<'a> Emitter<'a> {
    fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            output: LayeredOutput::new(),
        }
    }

    fn rectangle(&mut self, layer: RenderLayer, bounds: Bounds, role: ElementRole) {
        self.output
            .add_to_layer(layer, DrawCommand::Rectangle { bounds, role });
    }

    fn polyline(&mut self, points: &[Point], role: ElementRole, arrow: ArrowHead, dashed: bool) {
        if points.len() < 2 {
            return;
        }
        self.output.add_to_layer(
            RenderLayer::Arrow,
            DrawCommand::Polyline {
                points: points.to_vec(),
                role,
                arrow,
                dashed,
            },
        );
    }

    fn path(&mut self, layer: RenderLayer, segments: Vec<PathSegment>, role: ElementRole) {
        self.output
            .add_to_layer(layer, DrawCommand::Path { segments, role });
    }

    fn text(&mut self, label: &LabelGeometry, style: &TextStyle, role: ElementRole) {
        let content = label.content();
        if content.is_empty() {
            return;
        }
        self.output.add_to_layer(
            RenderLayer::Text,
            DrawCommand::Text {
                position: label.bounds().center(),
                anchor: TextAnchor::Middle,
                content,
                style: style.clone(),
                role,
            },
        );
    }

    fn sequence(&mut self, layout: &SequenceLayout) {
        let config = self.config;
        let style = config.style();

        for participant in layout.participants() {
            self.participant(participant);
        }

        let mut activations: Vec<_> = layout.activations().iter().collect();
        activations.sort_by_key(|activation| activation.depth());
        for activation in activations {
            self.rectangle(
                RenderLayer::Activation,
                activation.bounds(),
                ElementRole::Activation,
            );
        }

        for block in layout.blocks() {
            self.block(block);
        }

        for event in layout.events() {
            match event.kind() {
                EventGeometryKind::Message(message) => {
                    let (arrow, dashed) = message_arrow(message.style());
                    self.polyline(message.points(), ElementRole::Message, arrow, dashed);
                    if let Some(label) = message.label() {
                        self.text(label, style.message_text(), ElementRole::Label);
                    }
                }
                EventGeometryKind::Note(note) => {
                    self.path(RenderLayer::Note, note_outline(note.bounds()), ElementRole::Note);
                    self.text(note.label(), style.note_text(), ElementRole::Label);
                }
                EventGeometryKind::Divider(band) => {
                    let bounds = band.bounds();
                    let y = bounds.center().y();
                    self.output.add_to_layer(
                        RenderLayer::Fragment,
                        DrawCommand::Polyline {
                            points: vec![Point::new(bounds.min_x(), y), Point::new(bounds.max_x(), y)],
                            role: ElementRole::Divider,
                            arrow: ArrowHead::None,
                            dashed: false,
                        },
                    );
                    if let Some(label) = band.label() {
                        self.rectangle(RenderLayer::Note, label.bounds(), ElementRole::Divider);
                        self.text(label, style.message_text(), ElementRole::Label);
                    }
                }
                EventGeometryKind::Delay(band) => {
                    if let Some(label) = band.label() {
                        self.text(label, style.message_text(), ElementRole::Delay);
                    }
                }
                EventGeometryKind::ActivationStart { .. }
                | EventGeometryKind::ActivationEnd { .. }
                | EventGeometryKind::BlockStart { .. }
                | EventGeometryKind::BlockSection { .. }
                | EventGeometryKind::BlockEnd { .. } => {}
            }
        }
    }

    fn participant(&mut self, participant: &ParticipantGeometry) {
        let config = self.config;
        let style = config.style().participant_text();
        let header = participant.header();
        self.rectangle(RenderLayer::Content, header, ElementRole::ParticipantHeader);
        self.text(participant.label(), style, ElementRole::Label);

        if let Some(footer) = participant.footer() {
            self.rectangle(RenderLayer::Content, footer, ElementRole::ParticipantFooter);
            let offset = footer.center().sub_point(header.center());
            let label = LabelGeometry::new(
                participant.label().bounds().translate(offset),
                participant.label().lines().to_vec(),
            );
            self.text(&label, style, ElementRole::Label);
        }

        for segment in participant.lifeline() {
            if segment.end_y() <= segment.start_y() {
                continue;
            }
            self.output.add_to_layer(
                RenderLayer::Lifeline,
                DrawCommand::Polyline {
                    points: vec![
                        Point::new(segment.x(), segment.start_y()),
                        Point::new(segment.x(), segment.end_y()),
                    ],
                    role: ElementRole::Lifeline,
                    arrow: ArrowHead::None,
                    dashed: segment.dotted(),
                },
            );
        }

        if let Some(mark) = participant.destroy_mark() {
            self.path(
                RenderLayer::Arrow,
                vec![
                    PathSegment::MoveTo(mark.min_point()),
                    PathSegment::LineTo(mark.max_point()),
                    PathSegment::MoveTo(Point::new(mark.max_x(), mark.min_y())),
                    PathSegment::LineTo(Point::new(mark.min_x(), mark.max_y())),
                ],
                ElementRole::DestroyMark,
            );
        }
    }

    fn block(&mut self, block: &BlockGeometry) {
        let config = self.config;
        let style = config.style().message_text();
        let padding = config.layout().sequence().block_padding();
        let frame = block.bounds();
        self.rectangle(RenderLayer::Fragment, frame, ElementRole::BlockFrame);

        // The tab text is vertically centered in the header band.
        let tab = block.tab().bounds();
        let header_bottom = 2.0 * tab.center().y() - frame.min_y();
        let notch_x = (tab.max_x() + padding).min(frame.max_x());
        let notch = TAB_NOTCH.min(header_bottom - frame.min_y());
        self.path(
            RenderLayer::Fragment,
            vec![
                PathSegment::MoveTo(Point::new(notch_x, frame.min_y())),
                PathSegment::LineTo(Point::new(notch_x, header_bottom - notch)),
                PathSegment::LineTo(Point::new(notch_x - notch, header_bottom)),
                PathSegment::LineTo(Point::new(frame.min_x(), header_bottom)),
            ],
            ElementRole::BlockFrame,
        );
        self.text(block.tab(), &style.clone().with_bold(true), ElementRole::Label);
        if let Some(label) = block.label() {
            self.text(label, style, ElementRole::Label);
        }

        for section in block.sections() {
            self.output.add_to_layer(
                RenderLayer::Fragment,
                DrawCommand::Polyline {
                    points: vec![
                        Point::new(frame.min_x(), section.y()),
                        Point::new(frame.max_x(), section.y()),
                    ],
                    role: ElementRole::BlockSeparator,
                    arrow: ArrowHead::None,
                    dashed: true,
                },
            );
            if let Some(label) = section.label() {
                self.text(label, style, ElementRole::Label);
            }
        }
    }

    fn graph(&mut self, layout: &GraphLayout) {
        let config = self.config;
        let style = config.style();

        // Outer frames first so nested ones are drawn on top.
        let mut clusters: Vec<_> = layout.clusters().iter().collect();
        clusters.sort_by_key(|cluster| cluster.depth());
        for cluster in clusters {
            self.rectangle(RenderLayer::Background, cluster.bounds(), ElementRole::Cluster);
            if let Some(label) = cluster.label() {
                self.text(label, style.node_text(), ElementRole::Label);
            }
        }

        for node in layout.nodes() {
            self.rectangle(RenderLayer::Content, node.bounds(), ElementRole::Node);
            self.text(node.label(), style.node_text(), ElementRole::Label);
        }

        for edge in layout.edges() {
            let (arrow, dashed) = edge_arrow(edge.style());
            self.polyline(edge.points(), ElementRole::Edge, arrow, dashed);
            if let Some(label) = edge.label() {
                self.text(label, style.edge_text(), ElementRole::Label);
            }
        }
    }
}

fn message_arrow(style: ArrowStyle) -> (ArrowHead, bool) {
    match style {
        ArrowStyle::Synchronous => (ArrowHead::Filled, false),
        ArrowStyle::Asynchronous => (ArrowHead::Open, false),
        ArrowStyle::Reply => (ArrowHead::Open, true),
    }
}

fn edge_arrow(style: EdgeStyle) -> (ArrowHead, bool) {
    match style {
        EdgeStyle::Directed => (ArrowHead::Filled, false),
        EdgeStyle::Dependency => (ArrowHead::Open, true),
        EdgeStyle::Undirected => (ArrowHead::None, false),
    }
}

/// Rectangle with the top-right corner folded over.
fn note_outline(bounds: Bounds) -> Vec<PathSegment> {
    let fold = NOTE_FOLD.min(bounds.width() / 2.0).min(bounds.height() / 2.0);
    vec![
        PathSegment::MoveTo(bounds.min_point()),
        PathSegment::LineTo(Point::new(bounds.max_x() - fold, bounds.min_y())),
        PathSegment::LineTo(Point::new(bounds.max_x(), bounds.min_y() + fold)),
        PathSegment::LineTo(bounds.max_point()),
        PathSegment::LineTo(Point::new(bounds.min_x(), bounds.max_y())),
        PathSegment::Close,
    ]
}

#[cfg(test)]
mod tests {
    use astrolabe_core::{
        geometry::Size,
        semantic::{
            Block, Cluster, Diagram, Event, GraphEdge, GraphModel, GraphNode, Message, Note,
            NotePlacement, Participant, SequenceModel,
        },
    };

    use super::*;
    use crate::LayoutBuilder;

    fn roles(commands: &[DrawCommand]) -> Vec<ElementRole> {
        commands.iter().map(DrawCommand::role).collect()
    }

    fn count(commands: &[DrawCommand], role: ElementRole) -> usize {
        commands.iter().filter(|c| c.role() == role).count()
    }

    #[test]
    fn test_sequence_commands() {
        let model = SequenceModel::new()
            .with_participant(Participant::new("A"))
            .with_participant(Participant::new("B"))
            .with_event(Event::Message(Message::new("A", "B").with_label("hello")))
            .with_event(Event::ActivationStart("B".into()))
            .with_event(Event::Message(
                Message::new("B", "A").with_style(ArrowStyle::Reply),
            ))
            .with_event(Event::ActivationEnd("B".into()));
        let builder = LayoutBuilder::default();
        let result = builder.layout(&Diagram::sequence(model)).expect("layout");
        let commands = draw_commands(&result, builder.config());

        assert_eq!(count(&commands, ElementRole::ParticipantHeader), 2);
        assert_eq!(count(&commands, ElementRole::ParticipantFooter), 2);
        assert_eq!(count(&commands, ElementRole::Lifeline), 2);
        assert_eq!(count(&commands, ElementRole::Activation), 1);
        assert_eq!(count(&commands, ElementRole::Message), 2);

        let reply = commands
            .iter()
            .filter(|c| c.role() == ElementRole::Message)
            .nth(1)
            .expect("reply emitted");
        assert!(matches!(
            reply,
            DrawCommand::Polyline {
                arrow: ArrowHead::Open,
                dashed: true,
                ..
            }
        ));
    }

    #[test]
    fn test_text_is_emitted_last() {
        let model = SequenceModel::new()
            .with_participant(Participant::new("A"))
            .with_event(Event::Note(Note::new(
                NotePlacement::RightOf("A".into()),
                "remember",
            )));
        let builder = LayoutBuilder::default();
        let result = builder.layout(&Diagram::sequence(model)).expect("layout");
        let roles = roles(&draw_commands(&result, builder.config()));

        let first_text = roles
            .iter()
            .position(|role| *role == ElementRole::Label)
            .expect("labels emitted");
        assert!(roles[first_text..].iter().all(|role| *role == ElementRole::Label));
        assert!(roles.contains(&ElementRole::Note));
    }

    #[test]
    fn test_block_frame_and_separator() {
        let model = SequenceModel::new()
            .with_participant(Participant::new("A"))
            .with_participant(Participant::new("B"))
            .with_event(Event::BlockStart(Block::new("alt", Some("ok".to_string()))))
            .with_event(Event::Message(Message::new("A", "B")))
            .with_event(Event::BlockSection(Some("else".to_string())))
            .with_event(Event::Message(Message::new("B", "A")))
            .with_event(Event::BlockEnd);
        let builder = LayoutBuilder::default();
        let result = builder.layout(&Diagram::sequence(model)).expect("layout");
        let commands = draw_commands(&result, builder.config());

        // Frame rectangle plus tab outline.
        assert_eq!(count(&commands, ElementRole::BlockFrame), 2);
        assert_eq!(count(&commands, ElementRole::BlockSeparator), 1);
        let contents: Vec<&str> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect();
        assert!(contents.contains(&"alt"));
        assert!(contents.contains(&"ok"));
        assert!(contents.contains(&"else"));
    }

    #[test]
    fn test_graph_commands() {
        let model = GraphModel::new()
            .with(Cluster::new("outer").with_label("Outer"))
            .with(GraphNode::new("a").with_parent("outer"))
            .with(GraphNode::new("b").with_size(Size::new(40.0, 20.0)))
            .with(GraphEdge::new("a", "b").with_style(EdgeStyle::Dependency))
            .with(GraphEdge::new("a", "missing"));
        let builder = LayoutBuilder::default();
        let result = builder
            .layout(&Diagram::graph(model).with_title("Deps"))
            .expect("layout");
        let commands = draw_commands(&result, builder.config());

        assert_eq!(commands[0].role(), ElementRole::Cluster);
        assert_eq!(count(&commands, ElementRole::Node), 2);
        assert_eq!(count(&commands, ElementRole::Edge), 2);
        assert_eq!(count(&commands, ElementRole::Title), 1);
        assert!(commands.iter().any(|c| matches!(
            c,
            DrawCommand::Polyline {
                role: ElementRole::Edge,
                arrow: ArrowHead::Open,
                dashed: true,
                ..
            }
        )));
    }

    #[test]
    fn test_note_outline_is_closed() {
        let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(40.0, 20.0));
        let outline = note_outline(bounds);
        assert_eq!(outline.first(), Some(&PathSegment::MoveTo(Point::new(0.0, 0.0))));
        assert_eq!(outline.last(), Some(&PathSegment::Close));
        assert!(outline.contains(&PathSegment::LineTo(Point::new(40.0, 8.0))));
    }

    #[test]
    fn test_emission_is_deterministic() {
        let model = GraphModel::new()
            .with(GraphNode::new("x"))
            .with(GraphNode::new("y"))
            .with(GraphEdge::new("x", "y").with_label("uses"))
            .with(GraphEdge::new("y", "x"));
        let builder = LayoutBuilder::default();
        let diagram = Diagram::graph(model);
        let first = draw_commands(&builder.layout(&diagram).expect("layout"), builder.config());
        let second = draw_commands(&builder.layout(&diagram).expect("layout"), builder.config());
        assert_eq!(first, second);
    }
}
