//! Integration tests for the load, layout, write pipeline
//!
//! These tests drive `LayoutPipeline::run` against real files in a temporary
//! directory, with both scripted engines and the bundled Sugiyama engine.

use std::{fs, path::Path, sync::Arc, time::Duration};

use proptest::prelude::*;

use trellis::{
    Edge, ErrorKind, GraphDocument, LayoutError, LayoutInvoker, LayoutOptions, LayoutPipeline,
    Node, TrellisError,
    engines::{EngineFuture, LayoutEngine, LayoutRequest, SugiyamaEngine},
    geometry::{Point, Size},
    inspect,
};

const EXAMPLE: &str =
    r#"{"nodes":[{"id":"n1"},{"id":"n2"}],"edges":[{"id":"e1","source":"n1","target":"n2"}]}"#;

/// Places nodes on a diagonal and routes every edge straight.
struct Diagonal;

impl LayoutEngine for Diagonal {
    fn name(&self) -> &str {
        "diagonal"
    }

    fn layout(&self, request: LayoutRequest) -> EngineFuture<'_> {
        let (mut doc, _) = request.into_parts();
        for (index, node) in doc.nodes_mut().iter_mut().enumerate() {
            let offset = index as f64 * 10.0;
            node.set_position(Point::new(offset, offset));
            node.set_size(Size::new(5.0, 5.0));
        }
        for edge in doc.edges_mut() {
            edge.set_points(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        }
        Box::pin(async move { Ok(doc) })
    }
}

/// Rejects every request.
struct Failing;

impl LayoutEngine for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn layout(&self, _request: LayoutRequest) -> EngineFuture<'_> {
        Box::pin(async { Err(LayoutError::engine("failing", "graph rejected")) })
    }
}

/// Never answers within a test's lifetime.
struct Stalled;

impl LayoutEngine for Stalled {
    fn name(&self) -> &str {
        "stalled"
    }

    fn layout(&self, _request: LayoutRequest) -> EngineFuture<'_> {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(LayoutError::engine("stalled", "unreachable"))
        })
    }
}

fn write_input(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("input.json");
    fs::write(&path, contents).expect("Failed to write input");
    path
}

#[tokio::test]
async fn test_end_to_end_example_with_sugiyama() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), EXAMPLE);
    let output = dir.path().join("out.json");

    let summary = LayoutPipeline::new(Arc::new(SugiyamaEngine::default()))
        .run(&input, &output)
        .await
        .expect("Layout run failed");
    assert_eq!(summary.nodes(), 2);
    assert_eq!(summary.edges(), 1);

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    for node in written["nodes"].as_array().unwrap() {
        for key in ["x", "y", "width", "height"] {
            assert!(node[key].is_number(), "node {} lacks {key}", node["id"]);
        }
    }
    let points = written["edges"][0]["points"].as_array().unwrap();
    assert!(!points.is_empty());
    assert!(points.iter().all(|p| p["x"].is_number() && p["y"].is_number()));
}

#[tokio::test]
async fn test_identical_runs_write_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), EXAMPLE);
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    let pipeline = LayoutPipeline::new(Arc::new(Diagonal));
    pipeline.run(&input, &first).await.unwrap();
    pipeline.run(&input, &second).await.unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[tokio::test]
async fn test_sugiyama_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        r#"{"nodes": [
                {"id": "a"},
                {"id": "group", "children": [{"id": "b"}, {"id": "c", "width": 150}]},
                {"id": "d"}
            ],
            "edges": [
                {"id": "e1", "source": "a", "target": "b"},
                {"id": "e2", "source": "b", "target": "c"},
                {"id": "e3", "source": "c", "target": "a"},
                {"id": "e4", "source": "group", "target": "d"}
            ]}"#,
    );
    let pipeline = LayoutPipeline::new(Arc::new(SugiyamaEngine::default()));

    let first = dir.path().join("first.json");
    pipeline.run(&input, &first).await.unwrap();
    let expected = fs::read(&first).unwrap();

    for round in 0..5 {
        let output = dir.path().join(format!("run{round}.json"));
        pipeline.run(&input, &output).await.unwrap();
        assert_eq!(fs::read(&output).unwrap(), expected, "run {round} differs");
    }
}

#[tokio::test]
async fn test_flat_files_are_laid_out() {
    let dir = tempfile::tempdir().unwrap();
    let nodes = dir.path().join("nodes.csv");
    let edges = dir.path().join("edges.csv");
    fs::write(
        &nodes,
        "id,label,category\nn1,Start,Root\nn2,Check the answers,Action\n",
    )
    .unwrap();
    fs::write(&edges, "source_id,target_id\nn1,n2\n").unwrap();
    let output = dir.path().join("out.json");

    let summary = LayoutPipeline::new(Arc::new(SugiyamaEngine::default()))
        .run_flat_files(&nodes, &edges, &output)
        .await
        .expect("Layout run failed");
    assert_eq!((summary.nodes(), summary.edges()), (2, 1));

    let written: GraphDocument =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert!(inspect::geometry_gaps(&written).is_empty());
    assert_eq!(written.nodes()[1].extra()["labels"][0]["text"], "Check the answers");
}

#[tokio::test]
async fn test_failed_layout_keeps_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), EXAMPLE);
    let output = dir.path().join("out.json");
    fs::write(&output, "last known good").unwrap();

    let err = LayoutPipeline::new(Arc::new(Failing))
        .run(&input, &output)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Layout);
    assert_eq!(err.diagnostic(), "graph rejected");
    assert_eq!(fs::read_to_string(&output).unwrap(), "last known good");
}

#[tokio::test(start_paused = true)]
async fn test_deadline_keeps_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), EXAMPLE);
    let output = dir.path().join("out.json");
    fs::write(&output, "last known good").unwrap();

    let err = LayoutPipeline::new(Arc::new(Stalled))
        .with_deadline(Some(Duration::from_secs(1)))
        .run(&input, &output)
        .await
        .unwrap_err();

    assert_eq!(err.diagnostic(), "timeout");
    assert_eq!(fs::read_to_string(&output).unwrap(), "last known good");
}

#[tokio::test]
async fn test_edges_without_nodes_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), r#"{"edges": [{"source": "a", "target": "b"}]}"#);
    let output = dir.path().join("out.json");

    let err = LayoutPipeline::new(Arc::new(SugiyamaEngine::default()))
        .run(&input, &output)
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::Parse | ErrorKind::Layout));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_dangling_endpoint_is_layout_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        r#"{"nodes": [{"id": "a"}], "edges": [{"id": "e1", "source": "a", "target": "b"}]}"#,
    );
    let output = dir.path().join("out.json");

    let err = LayoutPipeline::new(Arc::new(SugiyamaEngine::default()))
        .run(&input, &output)
        .await
        .unwrap_err();

    assert!(matches!(err, TrellisError::Layout(LayoutError::Engine { .. })));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.json");

    let err = LayoutPipeline::new(Arc::new(Diagonal))
        .run(dir.path().join("absent.json"), &output)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_unknown_keys_survive() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        r#"{"id": "root", "algorithm": "layered",
            "nodes": [{"id": "a", "labels": [{"text": "A"}]}],
            "edges": [],
            "layoutOptions": {"elk.direction": "RIGHT"}}"#,
    );
    let output = dir.path().join("out.json");

    LayoutPipeline::new(Arc::new(Diagonal))
        .run(&input, &output)
        .await
        .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["algorithm"], "layered");
    assert_eq!(written["nodes"][0]["labels"][0]["text"], "A");
    assert_eq!(written["layoutOptions"]["elk.direction"], "RIGHT");
}

#[tokio::test]
async fn test_verify_catches_dropped_edge() {
    struct DropsEdges;

    impl LayoutEngine for DropsEdges {
        fn name(&self) -> &str {
            "drops-edges"
        }

        fn layout(&self, request: LayoutRequest) -> EngineFuture<'_> {
            let nodes = request.document().nodes().to_vec();
            Box::pin(async move { Ok(GraphDocument::new(nodes, Vec::new())) })
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), EXAMPLE);
    let output = dir.path().join("out.json");

    let err = LayoutPipeline::new(Arc::new(DropsEdges))
        .with_verify(true)
        .run(&input, &output)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TrellisError::Layout(LayoutError::Incomplete { .. })
    ));
    assert!(!output.exists());
}

mod proptest_tests {
    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Random flat graphs: node count and edges between existing nodes.
    fn graph_strategy() -> impl Strategy<Value = GraphDocument> {
        (1usize..12)
            .prop_flat_map(|count| {
                let edges = prop::collection::vec((0..count, 0..count), 0..count * 2);
                (Just(count), edges)
            })
            .prop_map(|(count, pairs)| {
                let nodes = (0..count)
                    .map(|i| Node::new(format!("n{i}")))
                    .collect();
                let edges = pairs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (s, t))| {
                        Edge::new(format!("e{i}"), format!("n{s}"), format!("n{t}"))
                    })
                    .collect();
                GraphDocument::new(nodes, edges)
            })
    }

    /// Random nested graphs: every node after the first picks an earlier
    /// node as its parent or stays top-level, and edges join any two nodes.
    fn nested_graph_strategy() -> impl Strategy<Value = GraphDocument> {
        (1usize..12)
            .prop_flat_map(|count| {
                let parents = (0..count)
                    .map(|i| {
                        if i == 0 {
                            Just(None).boxed()
                        } else {
                            prop::option::of(0..i).boxed()
                        }
                    })
                    .collect::<Vec<_>>();
                let edges = prop::collection::vec((0..count, 0..count), 0..count * 2);
                (parents, edges)
            })
            .prop_map(|(parents, pairs)| {
                let nodes = build_tree(&parents, None);
                let edges = pairs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (s, t))| {
                        Edge::new(format!("e{i}"), format!("n{s}"), format!("n{t}"))
                    })
                    .collect();
                GraphDocument::new(nodes, edges)
            })
    }

    fn build_tree(parents: &[Option<usize>], parent: Option<usize>) -> Vec<Node> {
        parents
            .iter()
            .enumerate()
            .filter(|&(_, p)| *p == parent)
            .map(|(i, _)| {
                let children = build_tree(parents, Some(i));
                let node = Node::new(format!("n{i}"));
                if children.is_empty() {
                    node
                } else {
                    node.with_children(children)
                }
            })
            .collect()
    }

    // ===================
    // Properties
    // ===================

    fn check_sugiyama_preserves_shape_and_completes(
        doc: GraphDocument,
    ) -> Result<(), TestCaseError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to build runtime");

        let result = runtime
            .block_on(
                LayoutInvoker::new(Arc::new(SugiyamaEngine::default()))
                    .invoke(&doc, &LayoutOptions::new()),
            )
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        prop_assert!(inspect::shape_mismatches(&doc, &result).is_empty());
        prop_assert!(inspect::geometry_gaps(&result).is_empty());
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn sugiyama_preserves_shape_and_completes(doc in graph_strategy()) {
            check_sugiyama_preserves_shape_and_completes(doc)?;
        }

        #[test]
        fn sugiyama_handles_nesting(doc in nested_graph_strategy()) {
            check_sugiyama_preserves_shape_and_completes(doc)?;
        }
    }
}
