//! Determinism, ordering properties, and size limits over generated input.

use astrolabe::{
    LayoutBuilder,
    config::{AppConfig, LayoutConfig, LimitsConfig},
    error::LayoutError,
    semantic::{
        Block, Cluster, Diagram, Event, GraphEdge, GraphModel, GraphNode, Message, Participant,
        SequenceModel,
    },
};
use proptest::prelude::*;

// ===================
// Strategies
// ===================

/// Graph with `nodes` nodes, optional cluster membership, and arbitrary edges.
fn graph_model() -> impl Strategy<Value = GraphModel> {
    (1usize..9).prop_flat_map(|nodes| {
        (
            prop::collection::vec(prop::option::of(0usize..2), nodes),
            prop::collection::vec((0..nodes, 0..nodes, 0u32..3), 0..14),
        )
            .prop_map(|(parents, edges)| {
                let mut model = GraphModel::new()
                    .with(Cluster::new("c0"))
                    .with(Cluster::new("c1").with_parent("c0"));
                for (i, parent) in parents.into_iter().enumerate() {
                    let mut node = GraphNode::new(format!("n{i}"));
                    if let Some(parent) = parent {
                        node = node.with_parent(format!("c{parent}"));
                    }
                    model.push(node);
                }
                for (source, target, length) in edges {
                    model.push(
                        GraphEdge::new(format!("n{source}"), format!("n{target}"))
                            .with_length(length),
                    );
                }
                model
            })
    })
}

/// Edges only from lower to higher node indices.
fn dag_model() -> impl Strategy<Value = GraphModel> {
    (2usize..9).prop_flat_map(|nodes| {
        prop::collection::vec((0..nodes, 0..nodes), 0..16).prop_map(move |pairs| {
            let mut model = GraphModel::new();
            for i in 0..nodes {
                model.push(GraphNode::new(format!("n{i}")));
            }
            for (a, b) in pairs {
                if a != b {
                    let (source, target) = (a.min(b), a.max(b));
                    model.push(GraphEdge::new(format!("n{source}"), format!("n{target}")));
                }
            }
            model
        })
    })
}

fn event(participants: usize) -> impl Strategy<Value = Event> {
    let id = move || (0..participants + 1).prop_map(|i| format!("p{i}"));
    prop_oneof![
        4 => (id(), id()).prop_map(|(from, to)| Event::Message(Message::new(from, to))),
        2 => id().prop_map(|p| Event::ActivationStart(p.into())),
        2 => id().prop_map(|p| Event::ActivationEnd(p.into())),
        1 => Just(Event::Divider(Some("phase".to_string()))),
        1 => Just(Event::Delay(None)),
        1 => Just(Event::BlockStart(Block::new("loop", None))),
        1 => Just(Event::BlockSection(None)),
        1 => Just(Event::BlockEnd),
    ]
}

/// Timelines that may reference one undeclared participant.
fn sequence_model() -> impl Strategy<Value = SequenceModel> {
    (1usize..5).prop_flat_map(|participants| {
        prop::collection::vec(event(participants), 0..20).prop_map(move |events| {
            let mut model = SequenceModel::new();
            for i in 0..participants {
                model.add_participant(Participant::new(format!("p{i}")));
            }
            for event in events {
                model.push_event(event);
            }
            model
        })
    })
}

// ===================
// Property Test Functions
// ===================

fn check_layout_is_deterministic(diagram: Diagram) -> Result<(), TestCaseError> {
    let builder = LayoutBuilder::default();
    let first = builder.layout(&diagram).expect("lays out");
    let second = builder.layout(&diagram).expect("lays out");
    prop_assert_eq!(&first, &second);
    prop_assert_eq!(format!("{first:?}"), format!("{second:?}"));
    prop_assert_eq!(builder.draw_commands(&first), builder.draw_commands(&second));
    Ok(())
}

fn check_every_graph_element_has_geometry(model: GraphModel) -> Result<(), TestCaseError> {
    let result = LayoutBuilder::default()
        .layout(&Diagram::graph(model.clone()))
        .expect("lays out");
    let layout = result.as_graph().expect("graph layout");

    prop_assert_eq!(layout.edges().len(), model.edges().len());
    prop_assert_eq!(layout.nodes().len(), model.nodes().len());
    for (index, edge) in layout.edges().iter().enumerate() {
        prop_assert_eq!(edge.index(), index);
    }
    for node in layout.nodes() {
        prop_assert!(result.bounds().contains_bounds(&node.bounds()));
    }
    Ok(())
}

fn check_dag_edges_point_down(model: GraphModel) -> Result<(), TestCaseError> {
    let result = LayoutBuilder::default()
        .layout(&Diagram::graph(model))
        .expect("lays out");
    let layout = result.as_graph().expect("graph layout");

    for edge in layout.edges() {
        let source = layout.node(edge.source().as_str()).map(|n| n.rank());
        let target = layout.node(edge.target().as_str()).map(|n| n.rank());
        prop_assert!(!edge.reversed());
        prop_assert!(source < target, "{} -> {}", edge.source(), edge.target());
    }
    Ok(())
}

fn check_rows_strictly_increase(model: SequenceModel) -> Result<(), TestCaseError> {
    let events = model.events().len();
    let result = LayoutBuilder::default()
        .layout(&Diagram::sequence(model))
        .expect("lays out");
    let layout = result.as_sequence().expect("sequence layout");

    prop_assert_eq!(layout.events().len(), events);
    let ys: Vec<f32> = layout.rows().map(|row| row.y()).collect();
    for pair in ys.windows(2) {
        prop_assert!(pair[0] < pair[1], "rows {:?}", ys);
    }
    for (i, left) in layout.participants().iter().enumerate() {
        for right in &layout.participants()[i + 1..] {
            prop_assert!(!left.range().overlaps(&right.range()));
        }
    }
    Ok(())
}

// ===================
// Proptest Wrappers
// ===================

proptest! {
    #[test]
    fn prop_graph_layout_is_deterministic(model in graph_model()) {
        check_layout_is_deterministic(Diagram::graph(model))?;
    }

    #[test]
    fn prop_sequence_layout_is_deterministic(model in sequence_model()) {
        check_layout_is_deterministic(Diagram::sequence(model))?;
    }

    #[test]
    fn prop_every_graph_element_has_geometry(model in graph_model()) {
        check_every_graph_element_has_geometry(model)?;
    }

    #[test]
    fn prop_dag_edges_point_down(model in dag_model()) {
        check_dag_edges_point_down(model)?;
    }

    #[test]
    fn prop_rows_strictly_increase(model in sequence_model()) {
        check_rows_strictly_increase(model)?;
    }
}

#[test]
fn test_size_limit_fails_fast() {
    let config = AppConfig::default()
        .with_layout(LayoutConfig::default().with_limits(LimitsConfig::new(4, 64)));
    let builder = LayoutBuilder::new(config);

    let graph = GraphModel::new()
        .with(GraphNode::new("a"))
        .with(GraphNode::new("b"))
        .with(GraphNode::new("c"))
        .with(GraphEdge::new("a", "b"))
        .with(GraphEdge::new("b", "c"));
    let err = builder.layout(&Diagram::graph(graph)).unwrap_err();
    assert!(matches!(
        err,
        LayoutError::SizeLimitExceeded { elements: 5, limit: 4 }
    ));
    assert!(err.is_size_limit());

    let sequence = SequenceModel::new()
        .with_participant(Participant::new("a"))
        .with_participant(Participant::new("b"))
        .with_event(Event::Message(Message::new("a", "b")))
        .with_event(Event::Message(Message::new("b", "a")));
    assert!(builder.layout(&Diagram::sequence(sequence.clone())).is_ok());

    let sequence = sequence.with_event(Event::Message(Message::new("a", "b")));
    assert!(matches!(
        builder.layout(&Diagram::sequence(sequence)),
        Err(LayoutError::SizeLimitExceeded { elements: 5, limit: 4 })
    ));
}

#[test]
fn test_stretched_edge_counts_toward_size_limit() {
    let config = AppConfig::default()
        .with_layout(LayoutConfig::default().with_limits(LimitsConfig::new(10, 64)));
    let builder = LayoutBuilder::new(config);
    let stretched = |length: u32| {
        GraphModel::new()
            .with(GraphNode::new("a"))
            .with(GraphNode::new("b"))
            .with(GraphEdge::new("a", "b").with_length(length))
    };

    let result = builder
        .layout(&Diagram::graph(stretched(8)))
        .expect("fits the limit");
    let graph = result.as_graph().expect("graph layout");
    assert_eq!(graph.node("b").map(|n| n.rank()), Some(8));

    assert!(matches!(
        builder.layout(&Diagram::graph(stretched(9))),
        Err(LayoutError::SizeLimitExceeded { elements: 11, limit: 10 })
    ));

    let err = LayoutBuilder::default()
        .layout(&Diagram::graph(stretched(u32::MAX)))
        .unwrap_err();
    assert!(err.is_size_limit());
}
