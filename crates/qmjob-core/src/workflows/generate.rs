use crate::core::models::molecule::Molecule;
use crate::engine::basis::{BasisSetup, basis_setup_for};
use crate::engine::config::{GenerationConfig, WorkflowParameters};
use crate::engine::deck::{DeckRequest, coordinate_block, render_deck};
use crate::engine::dedup::DuplicateSet;
use crate::engine::error::EngineError;
use crate::engine::partition::partition_elements;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::resources::{ResourcePlan, estimate_resources};
use crate::engine::script::{SubmitManifest, render_cluster_script};
use crate::engine::tasks::build_task_sequence;
use crate::workflows::deduplicate::find_duplicates;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, instrument, warn};

pub const DECK_EXTENSION: &str = "gjf";
pub const SCRIPT_EXTENSION: &str = "sh";
pub const MANIFEST_FILE: &str = "submit.sh";
pub const PROVENANCE_FILE: &str = "workflow.toml";

/// Deck and script for one conformer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDocument {
    pub conformer_index: usize,
    pub conformer_name: String,
    pub deck: String,
    pub script: String,
}

/// Every document generated for one molecule, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct JobBatch {
    pub molecule_dir: String,
    pub workflow: WorkflowParameters,
    pub resources: ResourcePlan,
    pub basis: BasisSetup,
    pub jobs: Vec<JobDocument>,
    pub manifest: SubmitManifest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub molecule: String,
    pub directory: PathBuf,
    pub jobs_written: usize,
    pub duplicates_skipped: usize,
}

/// Outcome of a multi-molecule run. A failing molecule does not stop the
/// batch, and files written for earlier molecules are kept.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub generated: Vec<GenerationSummary>,
    pub failed: Vec<(String, EngineError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Computes every document for `molecule` without touching the filesystem.
///
/// Conformers listed in `excluded` are skipped; the remaining ones keep their
/// original index in their names. The resource plan is computed once and used
/// for every deck and script.
#[instrument(skip_all, name = "plan_jobs", fields(molecule = molecule.label()))]
pub fn plan_jobs(
    molecule: &Molecule,
    config: &GenerationConfig,
    excluded: &DuplicateSet,
) -> Result<JobBatch, EngineError> {
    ensure_single_component(molecule.label())?;
    ensure_single_component(molecule.identifier())?;
    let conformer_count = molecule.conformers().len();
    if let Some(&index) = excluded.indices().iter().find(|&&i| i >= conformer_count) {
        return Err(EngineError::ConformerNotFound {
            molecule: molecule.label().to_string(),
            index,
        });
    }

    let params = &config.workflow;
    let partition = partition_elements(molecule.elements(), params.max_light_atomic_number)?;
    let basis = basis_setup_for(&partition, params);
    let resources = estimate_resources(molecule.atom_count(), &config.resources)?;
    let tasks = build_task_sequence(params.workflow_type, &params.theory, &basis.token);
    let resource_block = resources.resource_block();
    let molecule_dir = molecule.label().to_string();

    debug!(
        light = ?partition.light(),
        heavy = ?partition.heavy(),
        processors = resources.processors(),
        memory_gb = resources.memory_gb(),
        "Planned shared job settings."
    );

    let mut jobs = Vec::with_capacity(conformer_count - excluded.len());
    let mut manifest = SubmitManifest::new();
    for (index, conformer) in molecule.conformers().iter().enumerate() {
        if excluded.contains(index) {
            continue;
        }
        if conformer.atom_count() != resources.atom_count() {
            return Err(EngineError::ResourcePlanMismatch {
                molecule: molecule.label().to_string(),
                planned: resources.atom_count(),
                actual: conformer.atom_count(),
            });
        }

        let conformer_name = molecule.conformer_name(index);
        let coordinates = coordinate_block(molecule.elements(), conformer.coordinates());
        let deck = render_deck(&DeckRequest {
            tasks: &tasks,
            conformer_name: &conformer_name,
            resource_block: &resource_block,
            coordinate_block: &coordinates,
            charge: molecule.charge(),
            multiplicity: molecule.multiplicity(),
            basis_block: &basis.block,
        });
        let script =
            render_cluster_script(&resources, &conformer_name, &params.wall_time, &config.cluster);
        manifest.push(&config.cluster.submit_command, &molecule_dir, &conformer_name);

        jobs.push(JobDocument {
            conformer_index: index,
            conformer_name,
            deck,
            script,
        });
    }

    Ok(JobBatch {
        molecule_dir,
        workflow: params.clone(),
        resources,
        basis,
        jobs,
        manifest,
    })
}

/// Molecule labels and identifiers become directory and file names; each must
/// be exactly one ordinary path component.
fn ensure_single_component(name: &str) -> Result<(), EngineError> {
    let mut components = Path::new(name).components();
    let is_single = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none();
    if !is_single || name.contains(['/', '\\', '\0']) {
        return Err(EngineError::UnsafeName(name.to_string()));
    }
    Ok(())
}

fn persist_error(path: &Path) -> impl FnOnce(std::io::Error) -> EngineError + '_ {
    move |source| EngineError::Persist {
        path: path.to_path_buf(),
        source,
    }
}

fn remove_stale_documents(dir: &Path) -> Result<usize, EngineError> {
    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(persist_error(dir))? {
        let path = entry.map_err(persist_error(dir))?.path();
        let is_document = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == DECK_EXTENSION || ext == SCRIPT_EXTENSION);
        if is_document && path.is_file() {
            fs::remove_file(&path).map_err(persist_error(&path))?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn append_manifest(root: &Path, manifest: &SubmitManifest) -> Result<(), EngineError> {
    let path = root.join(MANIFEST_FILE);
    let is_new = !path.exists();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(persist_error(&path))?;
    if is_new {
        file.write_all(SubmitManifest::HEADER.as_bytes())
            .map_err(persist_error(&path))?;
    }
    file.write_all(manifest.render_lines().as_bytes())
        .map_err(persist_error(&path))
}

/// Writes a planned batch below `root` and returns the molecule directory.
///
/// Stale decks and scripts in the molecule directory are removed first. The
/// workflow parameters are recorded next to the decks, and one submission line
/// per job is appended to the shared manifest.
#[instrument(skip_all, name = "write_batch", fields(molecule = %batch.molecule_dir))]
pub fn write_batch(batch: &JobBatch, root: &Path) -> Result<PathBuf, EngineError> {
    ensure_single_component(&batch.molecule_dir)?;
    let dir = root.join(&batch.molecule_dir);
    fs::create_dir_all(&dir).map_err(persist_error(&dir))?;

    let removed = remove_stale_documents(&dir)?;
    if removed > 0 {
        debug!(removed, "Removed stale job documents.");
    }

    for job in &batch.jobs {
        let deck_path = dir.join(format!("{}.{DECK_EXTENSION}", job.conformer_name));
        fs::write(&deck_path, &job.deck).map_err(persist_error(&deck_path))?;
        let script_path = dir.join(format!("{}.{SCRIPT_EXTENSION}", job.conformer_name));
        fs::write(&script_path, &job.script).map_err(persist_error(&script_path))?;
        debug!(path = %deck_path.display(), "Wrote job deck.");
    }

    let provenance =
        toml::to_string(&batch.workflow).map_err(|e| EngineError::Provenance(e.to_string()))?;
    let provenance_path = dir.join(PROVENANCE_FILE);
    fs::write(&provenance_path, provenance).map_err(persist_error(&provenance_path))?;

    append_manifest(root, &batch.manifest)?;

    info!(
        jobs = batch.jobs.len(),
        directory = %dir.display(),
        "Job documents written."
    );
    Ok(dir)
}

/// Deduplicates (when configured), plans and writes the jobs of one molecule.
#[instrument(skip_all, name = "generation_workflow", fields(molecule = molecule.label()))]
pub fn run(
    molecule: &Molecule,
    config: &GenerationConfig,
    root: &Path,
    reporter: &ProgressReporter,
    cancel: Option<&AtomicBool>,
) -> Result<GenerationSummary, EngineError> {
    let excluded = match &config.deduplication {
        Some(dedup) => {
            let duplicates = find_duplicates(molecule, dedup, reporter, cancel)?;
            if !duplicates.is_completed() {
                return Err(EngineError::Cancelled(molecule.label().to_string()));
            }
            duplicates
        }
        None => DuplicateSet::empty(),
    };

    reporter.report(Progress::PhaseStart { name: "Generation" });
    let batch = plan_jobs(molecule, config, &excluded)?;
    let directory = write_batch(&batch, root)?;
    reporter.report(Progress::PhaseFinish);

    Ok(GenerationSummary {
        molecule: molecule.label().to_string(),
        directory,
        jobs_written: batch.jobs.len(),
        duplicates_skipped: excluded.len(),
    })
}

/// Runs [`run`] for every molecule; a failure aborts only that molecule.
///
/// A molecule whose directory was already written by an earlier molecule of
/// the batch fails with [`EngineError::DirectoryConflict`] and writes nothing.
pub fn run_batch(
    molecules: &[Molecule],
    config: &GenerationConfig,
    root: &Path,
    reporter: &ProgressReporter,
    cancel: Option<&AtomicBool>,
) -> BatchReport {
    let mut report = BatchReport::default();
    let mut used_dirs: HashSet<&str> = HashSet::new();
    for molecule in molecules {
        let result = if used_dirs.contains(molecule.label()) {
            Err(EngineError::DirectoryConflict {
                molecule: molecule.identifier().to_string(),
                directory: molecule.label().to_string(),
            })
        } else {
            run(molecule, config, root, reporter, cancel)
        };
        match result {
            Ok(summary) => {
                used_dirs.insert(molecule.label());
                report.generated.push(summary);
            }
            Err(e) => {
                warn!(molecule = molecule.label(), error = %e, "Generation aborted for molecule.");
                report.failed.push((molecule.label().to_string(), e));
            }
        }
    }
    report
}
