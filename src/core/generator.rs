// Per-request pipeline: prompt, model call, extraction, merge

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::layout::{default_base_package, instrumented_test_class_name, TestLayout};
use crate::core::source::{analyze_source, derive_package, SourceAnalysis};
use crate::core::{
    build_prompt, build_refine_prompt, extract_artifact, extract_refinement, extraction_mode,
    merge_test_code, system_prompt_for, FileStore, ModelPrompt, ModelProvider,
    SYSTEM_PROMPT_REFINE,
};
use crate::error::AiTestGenError;
use crate::models::{
    BddTriple, Config, ExtractedArtifact, FileContext, GenerationRequest, MergeDecision,
    MergeResult, RefineContext, Refinement, SingleFileArtifact, TestScope, DEFAULT_CLASS_NAME,
};

/// Outcome of one generation, ready for the inserter
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedTest {
    /// Final file text; the step definitions in BDD mode
    pub code: String,
    pub package_name: String,
    pub class_name: String,
    pub scope: TestScope,
    /// Source file the tests target (unit scope)
    pub target_source: Option<PathBuf>,
    /// Test file that already existed before this run
    pub existing_path: Option<PathBuf>,
    /// Where `code` is written
    pub output_path: PathBuf,
    pub is_update: bool,
    pub new_methods_count: usize,
    /// Append was requested but the existing file was replaced wholesale
    pub merge_fell_back: bool,
    pub bdd: Option<BddTriple>,
}

/// A built request together with what was learned while building it
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub request: GenerationRequest,
    pub prompt: ModelPrompt,
    pub existing_path: PathBuf,
    pub default_package: String,
    pub default_class: String,
    pub analysis: Option<SourceAnalysis>,
}

/// Turns CLI-level inputs into generation requests; never calls the model
pub struct RequestPlanner {
    config: Config,
    store: Arc<dyn FileStore>,
    layout: TestLayout,
}

impl RequestPlanner {
    pub fn new(config: Config, store: Arc<dyn FileStore>) -> Self {
        let layout = TestLayout::new(config.layout.clone());
        Self {
            config,
            store,
            layout,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &TestLayout {
        &self.layout
    }

    fn read_required(&self, path: &Path) -> Result<String, AiTestGenError> {
        self.store
            .read(path)?
            .ok_or_else(|| AiTestGenError::Input(format!("File not found: {}", path.display())))
    }

    fn model_prompt(&self, request: &GenerationRequest) -> ModelPrompt {
        ModelPrompt::new(build_prompt(request, &self.config.generation), &self.config.generation)
            .with_system(system_prompt_for(request.scope(), request.is_bdd()))
    }

    /// Build the unit test request for a source file
    pub fn prepare_unit(&self, source_path: &Path) -> Result<PreparedRequest, AiTestGenError> {
        let source = self.read_required(source_path)?;
        let analysis = analyze_source(source_path, &source)?;
        debug!(
            "Analyzed {}: class {} with {} public methods",
            source_path.display(),
            analysis.fully_qualified_class_name,
            analysis.public_methods.len()
        );

        let existing_path = self.layout.existing_unit_test_path(&analysis);
        let mut builder = GenerationRequest::builder(TestScope::Unit)
            .target_file_path(analysis.file_path.clone())
            .target_class_name(analysis.fully_qualified_class_name.clone())
            .source_code(analysis.source_code.clone());
        if let Some(existing) = self.store.read(&existing_path)? {
            info!("Found existing test file: {}", existing_path.display());
            builder = builder.existing_test(existing);
        }
        let request = builder.build()?;

        Ok(PreparedRequest {
            prompt: self.model_prompt(&request),
            request,
            existing_path,
            default_package: analysis.package_name.clone(),
            default_class: analysis.test_class_name(),
            analysis: Some(analysis),
        })
    }

    /// Build the instrumentation request for the project
    pub fn prepare_instrumentation(
        &self,
        project_name: &str,
        context_paths: &[PathBuf],
    ) -> Result<PreparedRequest, AiTestGenError> {
        let limit = self.config.generation.max_context_files;
        if context_paths.len() > limit {
            warn!(
                "Using the first {} of {} context files",
                limit,
                context_paths.len()
            );
        }

        let mut context = Vec::new();
        for path in context_paths.iter().take(limit) {
            let content = self.read_required(path)?;
            context.push(FileContext {
                path: path.display().to_string(),
                package_name: derive_package(&content),
                content,
            });
        }

        let base_package = context
            .iter()
            .map(|file| file.package_name.as_str())
            .find(|package| !package.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_base_package(project_name));
        let class_name = instrumented_test_class_name(project_name);
        let use_bdd = self.config.generation.use_bdd;

        // Tests written by an earlier run live under the package directory;
        // a project-level file directly under the root is picked up too
        let mut existing_path = self
            .layout
            .instrumentation_test_path(&base_package, &class_name);
        let mut builder = GenerationRequest::builder(TestScope::Instrumentation)
            .target_class_name(format!("{}.{}", base_package, class_name))
            .project_context(context)
            .use_bdd(use_bdd);
        if !use_bdd {
            let candidates = [
                existing_path.clone(),
                self.layout.existing_instrumentation_test_path(project_name),
            ];
            for path in candidates {
                if let Some(existing) = self.store.read(&path)? {
                    info!("Found existing test file: {}", path.display());
                    builder = builder.existing_test(existing);
                    existing_path = path;
                    break;
                }
            }
        }
        let request = builder.build()?;

        Ok(PreparedRequest {
            prompt: self.model_prompt(&request),
            request,
            existing_path,
            default_package: base_package,
            default_class: class_name,
            analysis: None,
        })
    }
}

/// Runs generation requests against one provider and one project
pub struct TestGenerator {
    planner: RequestPlanner,
    provider: Arc<dyn ModelProvider>,
}

impl TestGenerator {
    pub fn new(config: Config, provider: Arc<dyn ModelProvider>, store: Arc<dyn FileStore>) -> Self {
        Self {
            planner: RequestPlanner::new(config, store),
            provider,
        }
    }

    pub fn planner(&self) -> &RequestPlanner {
        &self.planner
    }

    pub fn layout(&self) -> &TestLayout {
        self.planner.layout()
    }

    pub async fn generate_unit_test(&self, source_path: &Path) -> Result<GeneratedTest, AiTestGenError> {
        let prepared = self.planner.prepare_unit(source_path)?;
        let mut generated = self.run(prepared).await?;
        generated.target_source = Some(source_path.to_path_buf());
        Ok(generated)
    }

    pub async fn generate_instrumentation_test(
        &self,
        project_name: &str,
        context_paths: &[PathBuf],
    ) -> Result<GeneratedTest, AiTestGenError> {
        let prepared = self.planner.prepare_instrumentation(project_name, context_paths)?;
        self.run(prepared).await
    }

    /// Call the model for a prepared request and turn the reply into a result
    pub async fn run(&self, prepared: PreparedRequest) -> Result<GeneratedTest, AiTestGenError> {
        info!(
            "Generating {} with {}",
            prepared.request.scope(),
            self.provider.name()
        );
        let reply = self.provider.generate(&prepared.prompt).await?;
        debug!("Received reply of {} characters", reply.as_str().len());

        let artifact = extract_artifact(&reply, extraction_mode(&prepared.request))?;
        Ok(match artifact {
            ExtractedArtifact::SingleFile(file) => self.finish_single_file(prepared, file),
            ExtractedArtifact::Bdd(triple) => self.finish_bdd(prepared, triple),
        })
    }

    fn finish_single_file(&self, prepared: PreparedRequest, file: SingleFileArtifact) -> GeneratedTest {
        let request = &prepared.request;
        let existing = request.existing_test_code();

        let already_present = request.existing_test_methods();
        let mut new_methods: Vec<String> = Vec::new();
        for name in &file.new_test_method_names {
            if !already_present.contains(name) && !new_methods.contains(name) {
                new_methods.push(name.clone());
            }
        }
        debug!(
            "{} generated test methods, {} new",
            file.new_test_method_names.len(),
            new_methods.len()
        );

        let decision = MergeDecision::choose(existing, &new_methods);
        let merged = match (existing, decision) {
            (Some(existing), MergeDecision::CreateNew) => {
                info!("No new test methods; existing file left unchanged");
                MergeResult {
                    text: existing.to_string(),
                    inserted_count: 0,
                    fell_back: false,
                }
            }
            _ => merge_test_code(decision, existing, &file.code, &new_methods),
        };

        let package_name = non_empty_or(&file.package_name, &prepared.default_package);
        let class_name = if file.class_name == DEFAULT_CLASS_NAME {
            prepared.default_class.clone()
        } else {
            file.class_name.clone()
        };

        let is_update = existing.is_some();
        let output_path = if is_update {
            prepared.existing_path.clone()
        } else {
            match request.scope() {
                TestScope::Unit => self.layout().unit_test_path(&package_name, &class_name),
                TestScope::Instrumentation => {
                    self.layout().instrumentation_test_path(&package_name, &class_name)
                }
            }
        };

        GeneratedTest {
            code: merged.text,
            package_name,
            class_name,
            scope: request.scope(),
            target_source: None,
            existing_path: is_update.then(|| prepared.existing_path.clone()),
            output_path,
            is_update,
            new_methods_count: merged.inserted_count,
            merge_fell_back: merged.fell_back,
            bdd: None,
        }
    }

    fn finish_bdd(&self, prepared: PreparedRequest, mut triple: BddTriple) -> GeneratedTest {
        triple.package_name = non_empty_or(&triple.package_name, &prepared.default_package);
        let scenarios = count_scenarios(&triple.feature_file);
        info!("Generated {} scenarios in {}", scenarios, triple.class_name);

        GeneratedTest {
            code: triple.step_definitions.clone(),
            package_name: triple.package_name.clone(),
            class_name: triple.class_name.clone(),
            scope: TestScope::Instrumentation,
            target_source: None,
            existing_path: None,
            output_path: self
                .layout()
                .step_definitions_path(&triple.package_name, &triple.class_name),
            is_update: false,
            new_methods_count: scenarios,
            merge_fell_back: false,
            bdd: Some(triple),
        }
    }

    /// One refinement round over already generated code
    pub async fn refine(
        &self,
        context: &RefineContext,
        user_message: &str,
    ) -> Result<Refinement, AiTestGenError> {
        let prompt = ModelPrompt::new(
            build_refine_prompt(context, user_message),
            &self.planner.config.generation,
        )
        .with_system(SYSTEM_PROMPT_REFINE);

        info!("Refining {} with {}", context.scope, self.provider.name());
        let reply = self.provider.generate(&prompt).await?;
        Ok(extract_refinement(&reply))
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Number of `Scenario:` / `Scenario Outline:` entries in a feature file
pub fn count_scenarios(feature: &str) -> usize {
    feature
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("Scenario:") || line.starts_with("Scenario Outline:"))
        .count()
}
