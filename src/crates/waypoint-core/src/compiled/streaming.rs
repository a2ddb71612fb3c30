//! Streaming execution

use super::{CompiledGraph, Run};
use crate::stream::StepStream;

impl CompiledGraph {
    /// Lazily step `run` until it suspends, finishes or fails
    ///
    /// Each poll advances at most one node. The stream ends after an interrupt
    /// event, after the last node of a finished run, or right after yielding an
    /// error. Calling `stream` again on the same run continues from where the
    /// previous stream stopped (after a resume, for instance).
    pub fn stream<'a>(&'a self, run: &'a mut Run) -> StepStream<'a> {
        Box::pin(async_stream::stream! {
            loop {
                match self.step(run).await {
                    Ok(Some(event)) => yield Ok(event),
                    Ok(None) => break,
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        })
    }
}
