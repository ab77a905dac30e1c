//! The synchronous compute-layout operation.

use lgl_core::{pajek, positions, Graph, LayoutSettings};

use crate::api::RpcError;
use crate::error::LayoutError;
use crate::pool::WorkerPool;
use crate::scratch::ScratchFiles;

impl WorkerPool {
    /// Lay out `graph` on the next free worker and return it with `x`/`y`
    /// set on every node.
    ///
    /// The job's scratch files are removed before this returns, whatever
    /// the outcome. If the layout succeeded but cleanup failed, the cleanup
    /// error is returned instead. If the caller is cancelled while the job
    /// is queued or running, the job keeps the files and removes them once
    /// the worker is done with them.
    pub async fn compute_layout(
        &self,
        mut graph: Graph,
        settings: LayoutSettings,
    ) -> Result<Graph, LayoutError> {
        graph.validate()?;

        let files = self.scratch.allocate();
        if let Err(e) = tokio::fs::write(files.input(), pajek::render(&graph)).await {
            let error = LayoutError::io(files.input(), e);
            if let Err(cleanup) = files.remove().await {
                tracing::warn!(error = %cleanup, "Failed to remove scratch files");
            }
            return Err(error);
        }

        let request = settings.into_request(
            files.input().to_path_buf(),
            files.output().to_path_buf(),
        );
        let (response, files) = self.submit_with_files(request, files).await;

        let outcome = match (response, &files) {
            (Ok(response), Some(files)) => {
                tracing::debug!(
                    nodes = graph.nodes.len(),
                    links = graph.links.len(),
                    %response,
                    "Worker finished layout",
                );
                merge_output(&mut graph, files).await
            }
            // A job dropped unresolved took its files with it.
            (Ok(_), None) => Err(RpcError::Dropped.into()),
            (Err(e), _) => Err(e.into()),
        };
        let cleanup = match files {
            Some(files) => files.remove().await,
            None => Ok(()),
        };

        outcome?;
        cleanup?;
        Ok(graph)
    }
}

async fn merge_output(graph: &mut Graph, files: &ScratchFiles) -> Result<(), LayoutError> {
    let raw = tokio::fs::read(files.output())
        .await
        .map_err(|e| LayoutError::io(files.output(), e))?;
    let computed = positions::parse(&raw)?;
    positions::merge(graph, &computed)?;
    Ok(())
}
