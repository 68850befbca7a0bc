//! Generic task pipeline: prompt → gateway → normalize → recover → validate.

use contentagent_gateway::Gateway;
use contentagent_recovery::{LengthPolicy, RepairReport, normalize, recover, validate};
use contentagent_shared::{ContentAgentError, Envelope, PromptSpec, Stage, StageError};
use contentagent_storage::ArtifactStore;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Progress callback for reporting task status.
pub trait ProgressReporter: Send + Sync {
    /// Called when a task enters a new pipeline stage.
    fn stage(&self, task: &str, stage: Stage);
    /// Called before each calendar batch of a content plan.
    fn batch(&self, current: usize, total: usize);
    /// Called once with the final envelope of a task.
    fn done(&self, task: &str, envelope: &Envelope);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _task: &str, _stage: Stage) {}
    fn batch(&self, _current: usize, _total: usize) {}
    fn done(&self, _task: &str, _envelope: &Envelope) {}
}

/// Output of one successful pipeline run.
#[derive(Debug, Clone)]
pub struct TaskOutput {
    pub value: Value,
    pub report: RepairReport,
}

/// One task invocation: a prompt, the shape it must satisfy, and an
/// optional length normalization applied after validation.
#[derive(Debug, Clone)]
pub struct TaskPipeline {
    spec: PromptSpec,
    length: Option<LengthPolicy>,
    debug_name: String,
}

impl TaskPipeline {
    pub fn new(spec: PromptSpec) -> Self {
        let debug_name = spec.task().to_string();
        Self {
            spec,
            length: None,
            debug_name,
        }
    }

    pub fn with_length_policy(mut self, policy: LengthPolicy) -> Self {
        self.length = Some(policy);
        self
    }

    /// Name of the debug artifact, when several runs share one task.
    pub fn with_debug_name(mut self, name: impl Into<String>) -> Self {
        self.debug_name = name.into();
        self
    }

    pub fn spec(&self) -> &PromptSpec {
        &self.spec
    }

    /// Run Build, Send, Normalize, Decode and Validate in order.
    ///
    /// The raw response is written to the debug artifact before anything
    /// else touches it. The first failing stage ends the run.
    #[instrument(skip_all, fields(task = %self.debug_name))]
    pub async fn run<G: Gateway>(
        &self,
        gateway: &G,
        store: &ArtifactStore,
        progress: &dyn ProgressReporter,
    ) -> Result<TaskOutput, StageError> {
        let task = self.spec.task();
        let shape = self.spec.shape();

        progress.stage(task, Stage::Build);
        let prompt = self.spec.render();
        debug!(prompt_len = prompt.len(), "prompt built");

        progress.stage(task, Stage::Send);
        let raw = gateway.generate(&prompt).await.map_err(|e| e.at(Stage::Send))?;

        if let Err(e) = store.write_debug(&self.debug_name, &raw) {
            warn!(error = %e, "could not write debug artifact");
        }
        if raw.trim().is_empty() {
            return Err(ContentAgentError::gateway("empty response").at(Stage::Send));
        }

        progress.stage(task, Stage::Normalize);
        let normalized = normalize(&raw, shape.kind).map_err(|e| e.at(Stage::Normalize))?;

        progress.stage(task, Stage::Decode);
        let recovered = recover(&normalized, raw.len()).map_err(|e| e.at(Stage::Decode))?;
        if let Some(pass) = recovered.report.recovered_by {
            warn!(
                %pass,
                repairs = recovered.report.changed.len(),
                "response needed repair before decoding"
            );
        }

        progress.stage(task, Stage::Validate);
        let mut value = validate(recovered.value, shape).map_err(|e| e.at(Stage::Validate))?;

        if let Some(policy) = &self.length {
            policy.apply(&mut value);
        }

        info!(attempts = recovered.report.attempts, "task output accepted");
        Ok(TaskOutput {
            value,
            report: recovered.report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts;
    use crate::testing::{ScriptedGateway, temp_store};
    use contentagent_recovery::RepairPass;
    use serde_json::json;

    #[tokio::test]
    async fn fenced_response_is_accepted() {
        let (dir, store) = temp_store();
        let gateway = ScriptedGateway::new([
            "Here you go:\n```json\n[{\"month\": \"Month 1\", \"theme\": \"A\", \"focus_areas\": [\"x\"]},\n{\"month\": \"Month 2\", \"theme\": \"B\", \"focus_areas\": []},\n{\"month\": \"Month 3\", \"theme\": \"C\", \"focus_areas\": []}]\n```",
        ]);

        let pipeline = TaskPipeline::new(prompts::monthly_themes(&json!({})));
        let out = pipeline.run(&gateway, &store, &SilentProgress).await.unwrap();

        assert_eq!(out.value.as_array().unwrap().len(), 3);
        assert_eq!(out.value[1]["theme"], "B");
        assert_eq!(out.report.attempts, 1);
        assert!(dir.join("debug/monthly_themes_response.txt").is_file());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn gateway_failure_is_tagged_send() {
        let (dir, store) = temp_store();
        let gateway = ScriptedGateway::new(Vec::<String>::new());

        let pipeline = TaskPipeline::new(prompts::analyze_topic("a", "b"));
        let err = pipeline.run(&gateway, &store, &SilentProgress).await.unwrap_err();

        assert_eq!(err.stage, Stage::Send);
        assert_eq!(err.source.kind(), "gateway_failure");
        assert!(!dir.join("debug").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn blank_response_is_a_gateway_failure() {
        for reply in ["", "   \n "] {
            let (dir, store) = temp_store();
            let gateway = ScriptedGateway::new([reply]);

            let pipeline = TaskPipeline::new(prompts::analyze_topic("time tracking", "freelancing"));
            let err = pipeline.run(&gateway, &store, &SilentProgress).await.unwrap_err();

            assert_eq!(err.stage, Stage::Send);
            assert_eq!(err.source.kind(), "gateway_failure");
            assert!(err.to_string().contains("empty response"));
            assert!(dir.join("debug/analyze_topic_response.txt").is_file());

            std::fs::remove_dir_all(&dir).ok();
        }
    }

    #[tokio::test]
    async fn refusal_fails_at_normalize_but_keeps_debug_artifact() {
        let (dir, store) = temp_store();
        let gateway = ScriptedGateway::new(["Sorry, I cannot help with that."]);

        let pipeline = TaskPipeline::new(prompts::analyze_topic("a", "b"));
        let err = pipeline.run(&gateway, &store, &SilentProgress).await.unwrap_err();

        assert_eq!(err.stage, Stage::Normalize);
        assert_eq!(err.source.kind(), "no_structural_delimiter");
        let debug = std::fs::read_to_string(dir.join("debug/analyze_topic_response.txt")).unwrap();
        assert_eq!(debug, "Sorry, I cannot help with that.");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn repaired_response_reports_pass() {
        let (dir, store) = temp_store();
        let gateway = ScriptedGateway::new([
            r#"{"main_content": {}, "seo_elements": {}, "supporting_content": {}, "engagement": {},}"#,
        ]);

        let pipeline = TaskPipeline::new(prompts::create_content(&json!({})));
        let out = pipeline.run(&gateway, &store, &SilentProgress).await.unwrap();
        assert_eq!(out.report.recovered_by, Some(RepairPass::TrailingSeparator));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_field_fails_at_validate() {
        let (dir, store) = temp_store();
        let gateway = ScriptedGateway::new([r#"{"main_content": {}, "engagement": {}}"#]);

        let pipeline = TaskPipeline::new(prompts::create_content(&json!({})));
        let err = pipeline.run(&gateway, &store, &SilentProgress).await.unwrap_err();

        assert_eq!(err.stage, Stage::Validate);
        assert!(err.to_string().contains("seo_elements"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn length_policy_runs_after_validation() {
        let (dir, store) = temp_store();
        let week = |kind: &str, count: Value| {
            json!({"week": "W", "main_content": {"type": kind, "estimated_word_count": count}, "supporting_content": []})
        };
        let body = Value::Array(vec![
            week("Guide", json!(null)),
            week("Blog", json!(10)),
            week("Video", json!(50000)),
            week("Case Study", json!(1700)),
        ]);
        let gateway = ScriptedGateway::new([body.to_string()]);

        let pipeline = TaskPipeline::new(prompts::calendar_batch(&json!({"theme": "T"})))
            .with_length_policy(LengthPolicy::default())
            .with_debug_name("content_calendar_batch1");
        let out = pipeline.run(&gateway, &store, &SilentProgress).await.unwrap();

        let counts: Vec<i64> = out
            .value
            .as_array()
            .unwrap()
            .iter()
            .map(|w| w["main_content"]["estimated_word_count"].as_i64().unwrap())
            .collect();
        assert_eq!(counts, vec![2000, 500, 3000, 1700]);
        assert!(dir.join("debug/content_calendar_batch1_response.txt").is_file());

        std::fs::remove_dir_all(&dir).ok();
    }
}
