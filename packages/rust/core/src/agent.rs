//! The four operator-facing tasks.
//!
//! Every task returns an [`Envelope`]; failures never escape as `Err`. A
//! task either persists its full result or nothing at all.

use std::path::Path;

use chrono::Local;
use contentagent_gateway::Gateway;
use contentagent_recovery::LengthPolicy;
use contentagent_shared::{
    ArtifactRecord, ContentAgentError, Envelope, Result, Stage, StageError,
};
use contentagent_storage::{ArtifactStore, read_json, timestamped_name};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::pipeline::{ProgressReporter, TaskPipeline};
use crate::prompts::{self, THEME_COUNT, WEEKS_PER_BATCH, task};

/// Artifact written by [`ContentAgent::analyze_topic`].
pub const ANALYSIS_FILE: &str = "content_analysis.json";

/// Artifact written by [`ContentAgent::generate_content_plan`].
pub const PLAN_FILE: &str = "content_plan.json";

const ANALYSIS_HINT: &str = "analyze a topic first (`contentagent analyze` or menu option 1)";
const PLAN_HINT: &str = "generate a content plan first (`contentagent plan` or menu option 2)";

type TaskResult = std::result::Result<(Value, ArtifactRecord), StageError>;

/// Runs tasks against one gateway and one output directory.
pub struct ContentAgent<G> {
    gateway: G,
    store: ArtifactStore,
}

impl<G: Gateway> ContentAgent<G> {
    pub fn new(gateway: G, store: ArtifactStore) -> Self {
        Self { gateway, store }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Market research and content-gap analysis → `content_analysis.json`.
    #[instrument(skip_all, fields(topic = %topic, industry = %industry))]
    pub async fn analyze_topic(
        &self,
        topic: &str,
        industry: &str,
        progress: &dyn ProgressReporter,
    ) -> Envelope {
        let result = self.run_analysis(topic, industry, progress).await;
        finish(task::ANALYZE_TOPIC, result, progress)
    }

    /// Three monthly themes plus a twelve-week calendar → `content_plan.json`.
    ///
    /// Requires a saved analysis. Calendar batches run one after another and
    /// any failing batch discards the whole plan.
    #[instrument(skip_all)]
    pub async fn generate_content_plan(&self, progress: &dyn ProgressReporter) -> Envelope {
        let result = self.run_plan(progress).await;
        finish(task::CONTENT_PLAN, result, progress)
    }

    /// Full content package for calendar entry `selection` (1-based).
    #[instrument(skip_all, fields(selection = selection))]
    pub async fn create_content(
        &self,
        selection: usize,
        progress: &dyn ProgressReporter,
    ) -> Envelope {
        let result = self.run_create(selection, progress).await;
        finish(task::CREATE_CONTENT, result, progress)
    }

    /// Optimization recommendations for content and its metrics.
    #[instrument(skip_all)]
    pub async fn optimize_performance(
        &self,
        content: &Value,
        metrics: &Value,
        progress: &dyn ProgressReporter,
    ) -> Envelope {
        let result = self.run_optimize(content, metrics, progress).await;
        finish(task::OPTIMIZE_PERFORMANCE, result, progress)
    }

    /// [`Self::optimize_performance`] with inputs read from JSON files.
    #[instrument(skip_all, fields(content = %content_path.display(), metrics = %metrics_path.display()))]
    pub async fn optimize_files(
        &self,
        content_path: &Path,
        metrics_path: &Path,
        progress: &dyn ProgressReporter,
    ) -> Envelope {
        progress.stage(task::OPTIMIZE_PERFORMANCE, Stage::Load);
        let inputs = read_json(content_path)
            .and_then(|content| read_json(metrics_path).map(|metrics| (content, metrics)));

        match inputs {
            Ok((content, metrics)) => self.optimize_performance(&content, &metrics, progress).await,
            Err(e) => finish(task::OPTIMIZE_PERFORMANCE, Err(e.at(Stage::Load)), progress),
        }
    }

    /// The saved content plan, for listing calendar entries.
    pub fn load_plan(&self) -> Result<Value> {
        self.store.load_json(PLAN_FILE, PLAN_HINT)
    }

    async fn run_analysis(
        &self,
        topic: &str,
        industry: &str,
        progress: &dyn ProgressReporter,
    ) -> TaskResult {
        let out = TaskPipeline::new(prompts::analyze_topic(topic, industry))
            .run(&self.gateway, &self.store, progress)
            .await?;

        self.persist(task::ANALYZE_TOPIC, ANALYSIS_FILE, out.value, progress)
    }

    async fn run_plan(&self, progress: &dyn ProgressReporter) -> TaskResult {
        progress.stage(task::CONTENT_PLAN, Stage::Load);
        let analysis = self
            .store
            .load_json(ANALYSIS_FILE, ANALYSIS_HINT)
            .map_err(|e| e.at(Stage::Load))?;

        let themes = TaskPipeline::new(prompts::monthly_themes(&analysis))
            .run(&self.gateway, &self.store, progress)
            .await?
            .value;

        let mut calendar = Vec::with_capacity(THEME_COUNT * WEEKS_PER_BATCH);
        let theme_list = themes.as_array().map(Vec::as_slice).unwrap_or_default();

        for (batch, theme) in theme_list.iter().enumerate() {
            progress.batch(batch + 1, theme_list.len());
            info!(
                batch = batch + 1,
                first_week = batch * WEEKS_PER_BATCH + 1,
                "generating calendar batch"
            );

            let out = TaskPipeline::new(prompts::calendar_batch(theme))
                .with_length_policy(LengthPolicy::default())
                .with_debug_name(format!("{}_batch{}", task::CONTENT_CALENDAR, batch + 1))
                .run(&self.gateway, &self.store, progress)
                .await?;

            let Value::Array(weeks) = out.value else {
                return Err(ContentAgentError::unexpected_shape("calendar batch is not a list")
                    .at(Stage::Validate));
            };
            calendar.extend(relabel_weeks(weeks, batch));
        }

        let plan = json!({
            "monthly_themes": themes,
            "content_calendar": calendar,
        });
        self.persist(task::CONTENT_PLAN, PLAN_FILE, plan, progress)
    }

    async fn run_create(&self, selection: usize, progress: &dyn ProgressReporter) -> TaskResult {
        progress.stage(task::CREATE_CONTENT, Stage::Load);
        let plan = self.load_plan().map_err(|e| e.at(Stage::Load))?;
        let brief = select_entry(&plan, selection)
            .map_err(|e| e.at(Stage::Load))?
            .clone();

        let out = TaskPipeline::new(prompts::create_content(&brief))
            .run(&self.gateway, &self.store, progress)
            .await?;

        let name = timestamped_name("content", Local::now());
        self.persist(task::CREATE_CONTENT, &name, out.value, progress)
    }

    async fn run_optimize(
        &self,
        content: &Value,
        metrics: &Value,
        progress: &dyn ProgressReporter,
    ) -> TaskResult {
        let out = TaskPipeline::new(prompts::optimize_performance(content, metrics))
            .run(&self.gateway, &self.store, progress)
            .await?;

        let name = timestamped_name("optimization", Local::now());
        self.persist(task::OPTIMIZE_PERFORMANCE, &name, out.value, progress)
    }

    fn persist(
        &self,
        task: &str,
        name: &str,
        value: Value,
        progress: &dyn ProgressReporter,
    ) -> TaskResult {
        progress.stage(task, Stage::Persist);
        let record = self
            .store
            .save_json(name, &value)
            .map_err(|e| e.at(Stage::Persist))?;
        Ok((value, record))
    }
}

/// Calendar entries of a saved plan.
pub fn calendar_entries(plan: &Value) -> Result<&[Value]> {
    plan.get("content_calendar")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| {
            ContentAgentError::unexpected_shape("content plan has no content_calendar list")
        })
}

fn select_entry(plan: &Value, selection: usize) -> Result<&Value> {
    let entries = calendar_entries(plan)?;
    if selection == 0 || selection > entries.len() {
        return Err(ContentAgentError::invalid_selection(format!(
            "choose a number between 1 and {}, got {selection}",
            entries.len()
        )));
    }
    Ok(&entries[selection - 1])
}

/// Rewrite week labels to their position in the whole plan.
fn relabel_weeks(mut weeks: Vec<Value>, batch: usize) -> Vec<Value> {
    for (i, week) in weeks.iter_mut().enumerate() {
        if let Some(obj) = week.as_object_mut() {
            let label = format!("Week {}", batch * WEEKS_PER_BATCH + i + 1);
            obj.insert("week".into(), Value::String(label));
        }
    }
    weeks
}

fn finish(task: &str, result: TaskResult, progress: &dyn ProgressReporter) -> Envelope {
    let envelope = match result {
        Ok((value, record)) => Envelope::success(value, Some(record)),
        Err(err) => {
            warn!(
                task,
                stage = %err.stage,
                kind = err.source.kind(),
                error = %err.source,
                "task failed"
            );
            Envelope::failure(&err)
        }
    };
    progress.done(task, &envelope);
    envelope
}
