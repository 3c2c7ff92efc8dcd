use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bookvoice_core::PipelineContext;
use tracing::info;

use crate::error::PipelineError;
use crate::step::{PipelineStep, StepDeps};

/// Invoked immediately after its registered step completes. May mutate the context — the
/// voice-review pause uses this to hand a possibly-edited voice map back in — and suspends
/// the runner until it returns.
#[async_trait]
pub trait PauseHandler: Send + Sync {
    async fn handle(&self, ctx: &mut PipelineContext);
}

/// Runs an ordered list of `PipelineStep`s over a shared `PipelineContext`, enforcing each
/// step's declared pre/postconditions and honoring any registered pause points.
#[derive(Default)]
pub struct PipelineRunner {
    steps: Vec<Box<dyn PipelineStep>>,
    pauses: HashMap<&'static str, Arc<dyn PauseHandler>>,
}

impl PipelineRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Registers a pause handler the runner awaits immediately after the named step
    /// completes, before moving on to the next one.
    pub fn register_pause(&mut self, after_step: &'static str, handler: Arc<dyn PauseHandler>) {
        self.pauses.insert(after_step, handler);
    }

    pub async fn run(
        &self,
        ctx: &mut PipelineContext,
        deps: &StepDeps,
    ) -> Result<(), PipelineError> {
        for step in &self.steps {
            if deps.cancellation.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            for key in step.required_keys() {
                if !ctx.has(*key) {
                    return Err(PipelineError::MissingPrecondition {
                        step: step.name().to_string(),
                        key: *key,
                    });
                }
            }

            info!(step = step.name(), "running pipeline step");
            deps.report(step.name(), 0, 0, format!("running {}", step.name()));
            step.execute(ctx, deps).await?;

            for key in step.drops_keys() {
                ctx.drop_key(*key);
            }

            if let Some(handler) = self.pauses.get(step.name()) {
                info!(step = step.name(), "pausing for external review");
                handler.handle(ctx).await;

                if deps.cancellation.is_cancelled() {
                    return Err(PipelineError::Cancelled);
                }
            }
        }
        Ok(())
    }
}
