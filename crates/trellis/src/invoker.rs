//! The single asynchronous call into a layout engine.

use std::{fmt, sync::Arc, time::Duration};

use log::{debug, info, warn};

use trellis_core::{GraphDocument, inspect};

use crate::{
    engines::{LayoutEngine, LayoutRequest},
    error::LayoutError,
    options::LayoutOptions,
};

/// Issues one layout request and waits for it to settle.
///
/// [`invoke`](Self::invoke) consumes the invoker, so each invoker carries at
/// most one request. Dropping the future returned by `invoke` abandons the
/// request.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), trellis::LayoutError> {
/// use std::{sync::Arc, time::Duration};
///
/// use trellis::{LayoutInvoker, LayoutOptions, engines::SugiyamaEngine};
/// use trellis_core::{Edge, GraphDocument, Node};
///
/// let doc = GraphDocument::new(
///     vec![Node::new("a"), Node::new("b")],
///     vec![Edge::new("e1", "a", "b")],
/// );
/// let result = LayoutInvoker::new(Arc::new(SugiyamaEngine::default()))
///     .with_deadline(Duration::from_secs(5))
///     .invoke(&doc, &LayoutOptions::new())
///     .await?;
/// assert!(result.find_node("a").unwrap().position().is_some());
/// # Ok(())
/// # }
/// ```
pub struct LayoutInvoker {
    engine: Arc<dyn LayoutEngine>,
    deadline: Option<Duration>,
    verify: bool,
}

impl fmt::Debug for LayoutInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutInvoker")
            .field("engine", &self.engine.name())
            .field("deadline", &self.deadline)
            .field("verify", &self.verify)
            .finish()
    }
}

impl LayoutInvoker {
    pub fn new(engine: Arc<dyn LayoutEngine>) -> Self {
        Self {
            engine,
            deadline: None,
            verify: false,
        }
    }

    /// Fails the request with [`LayoutError::Timeout`] if the engine has not
    /// settled after `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Like [`with_deadline`](Self::with_deadline), leaving the request
    /// unbounded for `None`.
    pub fn with_optional_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Checks the engine's answer against the request before accepting it.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Requests a layout for `doc` and waits for the engine to settle.
    ///
    /// The engine receives a copy of `doc` together with `options` overridden
    /// by the document's own root `layoutOptions`.
    pub async fn invoke(
        self,
        doc: &GraphDocument,
        options: &LayoutOptions,
    ) -> Result<GraphDocument, LayoutError> {
        let engine_name = self.engine.name().to_string();
        let request = LayoutRequest::new(doc.clone(), options.resolve(doc));

        info!(
            engine = engine_name.as_str(),
            nodes = doc.node_count(),
            edges = doc.edges().len();
            "Requesting layout"
        );

        let pending = self.engine.layout(request);
        let result = match self.deadline {
            Some(after) => match tokio::time::timeout(after, pending).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(engine = engine_name.as_str(), after:?; "Layout request timed out");
                    return Err(LayoutError::Timeout {
                        engine: engine_name,
                        after,
                    });
                }
            },
            None => pending.await,
        }?;

        if self.verify {
            verify(&engine_name, doc, &result)?;
        }

        debug!(engine = engine_name.as_str(); "Layout request settled");
        Ok(result)
    }
}

fn verify(engine: &str, request: &GraphDocument, result: &GraphDocument) -> Result<(), LayoutError> {
    let issues: Vec<String> = inspect::shape_mismatches(request, result)
        .iter()
        .map(ToString::to_string)
        .chain(
            inspect::geometry_gaps(result)
                .iter()
                .map(ToString::to_string),
        )
        .collect();

    if issues.is_empty() {
        Ok(())
    } else {
        Err(LayoutError::Incomplete {
            engine: engine.to_string(),
            issues,
        })
    }
}
