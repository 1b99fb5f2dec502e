use crate::{
    BuildSemanticGraphTool, ComputeTargetLeverageTool, InMemoryJobStore, JobStatus, JobStore,
    LeverageTool, RankGlobalLeverageTool, RecommendInterventionsTool, ToolResponse, ToolSchema,
};
use levergraph_core::{Embedder, LeverGraphConfig, Result};
use levergraph_vector::create_embedder;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Named tools plus the job store every invocation is recorded in.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn LeverageTool>>,
    order: Vec<String>,
    jobs: Arc<dyn JobStore>,
}

impl ToolRegistry {
    pub fn new(jobs: Arc<dyn JobStore>) -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            jobs,
        }
    }

    /// Registry with the four leverage tools sharing one config and embedder.
    pub fn with_defaults(
        config: Arc<LeverGraphConfig>,
        embedder: Arc<dyn Embedder>,
        jobs: Arc<dyn JobStore>,
    ) -> Self {
        let mut registry = Self::new(jobs);
        registry.register(Arc::new(BuildSemanticGraphTool::new(config.clone(), embedder)));
        registry.register(Arc::new(ComputeTargetLeverageTool::new(config.clone())));
        registry.register(Arc::new(RecommendInterventionsTool::new(config.clone())));
        registry.register(Arc::new(RankGlobalLeverageTool::new(config)));
        registry
    }

    /// Default tools with the embedder named in the config and an in-memory job store.
    pub fn from_config(config: LeverGraphConfig) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        Ok(Self::with_defaults(
            Arc::new(config),
            embedder,
            Arc::new(InMemoryJobStore::new()),
        ))
    }

    /// Registering a name twice replaces the earlier tool.
    pub fn register(&mut self, tool: Arc<dyn LeverageTool>) {
        let name = tool.schema().name;
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!("Replacing registered tool: {}", name);
        } else {
            self.order.push(name);
        }
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.schema())
            .collect()
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn jobs(&self) -> Arc<dyn JobStore> {
        self.jobs.clone()
    }

    /// Run a tool and fold its outcome into a response. Never returns an
    /// error; failures come back as `FAILED` with an `error_kind`.
    pub async fn execute(&self, tool_name: &str, params: JsonValue) -> ToolResponse {
        info!("Executing leverage tool: {}", tool_name);
        debug!("Tool parameters: {}", params);

        let job = self.jobs.create(tool_name);

        let Some(tool) = self.tools.get(tool_name).cloned() else {
            let response = ToolResponse::failed("unknown_tool", format!("Unknown tool: {}", tool_name));
            self.record_job(job.id, JobStatus::Failed, &response.message);
            warn!("Unknown tool requested: {}", tool_name);
            return response;
        };

        self.record_job(job.id, JobStatus::Running, "");
        let started = Instant::now();

        let response = match tool.execute(params).await {
            Ok(output) => {
                info!(
                    "Tool execution complete: {} in {:?}",
                    tool_name,
                    started.elapsed()
                );
                ToolResponse::completed(output.message, output.payload)
            }
            Err(e) => {
                error!("Tool {} failed ({}): {}", tool_name, e.kind(), e);
                ToolResponse::from_error(&e)
            }
        };

        let status = if response.is_completed() {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
        self.record_job(job.id, status, &response.message);
        response
    }

    fn record_job(&self, id: Uuid, status: JobStatus, message: &str) {
        let message = (!message.is_empty()).then(|| message.to_string());
        if let Err(e) = self.jobs.advance(id, status, message) {
            warn!("Could not record job {} as {:?}: {}", id, status, e);
        }
    }
}
