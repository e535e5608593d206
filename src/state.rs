use std::io::Write;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use anyhow::{bail, Context, Result};

use crate::config::ViewConfig;
use crate::data::model::{MetaboliteDetail, ProcessedResult};
use crate::data::pipeline::{process_files, InputFiles, PipelineError, PipelineStage, Upload};
use crate::layout::{Camera, ForceLayout};
use crate::view::DashboardView;

// ---------------------------------------------------------------------------
// Upload slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    MetaboliteInfo,
    Correlations,
    Gwas,
}

impl UploadKind {
    pub const ALL: [UploadKind; 3] = [
        UploadKind::MetaboliteInfo,
        UploadKind::Correlations,
        UploadKind::Gwas,
    ];

    pub fn label(self) -> &'static str {
        match self {
            UploadKind::MetaboliteInfo => "Metabolite Information (CSV)",
            UploadKind::Correlations => "Metabolite Correlations (CSV)",
            UploadKind::Gwas => "GWAS Data (CSV)",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            UploadKind::MetaboliteInfo => {
                "Contains metadata about metabolites (metabolite_id, name, subclass)"
            }
            UploadKind::Correlations => {
                "Contains pairs of strongly correlated metabolites (metabolite_1, metabolite_2)"
            }
            UploadKind::Gwas => {
                "Contains genome-wide association study results (metabolite_id, snp, position, lod)"
            }
        }
    }
}

/// A file chosen for one slot.
#[derive(Debug, Clone)]
pub struct ChosenFile {
    pub upload: Upload,
    pub size_bytes: u64,
}

impl ChosenFile {
    pub fn file_name(&self) -> String {
        self.upload.name()
    }

    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadSlots {
    pub metabolite_info: Option<ChosenFile>,
    pub correlations: Option<ChosenFile>,
    pub gwas: Option<ChosenFile>,
}

impl UploadSlots {
    pub fn get(&self, kind: UploadKind) -> Option<&ChosenFile> {
        match kind {
            UploadKind::MetaboliteInfo => self.metabolite_info.as_ref(),
            UploadKind::Correlations => self.correlations.as_ref(),
            UploadKind::Gwas => self.gwas.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: UploadKind) -> &mut Option<ChosenFile> {
        match kind {
            UploadKind::MetaboliteInfo => &mut self.metabolite_info,
            UploadKind::Correlations => &mut self.correlations,
            UploadKind::Gwas => &mut self.gwas,
        }
    }

    /// All three paths, or `None` while any slot is empty.
    pub fn input_files(&self) -> Option<InputFiles> {
        Some(InputFiles {
            metabolite_info: self.metabolite_info.as_ref()?.upload.clone(),
            correlations: self.correlations.as_ref()?.upload.clone(),
            gwas: self.gwas.as_ref()?.upload.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Background runs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Upload,
    Visualize,
}

/// Worker → UI message. Every message carries the token of the run that
/// sent it.
#[derive(Debug)]
pub enum RunMessage {
    Stage(PipelineStage),
    Finished(Result<ProcessedResult, PipelineError>),
}

struct PipelineRun {
    token: u64,
    rx: Receiver<(u64, RunMessage)>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewConfig,

    pub step: Step,

    pub uploads: UploadSlots,

    /// Where the current (or last) run is in the pipeline.
    pub stage: PipelineStage,

    /// Result of the last successful run (None outside the Visualize step).
    pub result: Option<ProcessedResult>,

    /// Chart-ready shapes derived from `result`.
    pub view: Option<DashboardView>,

    /// Node positions for the network view.
    pub layout: Option<ForceLayout>,

    /// Network view camera; `None` until first drawn, then fitted.
    pub camera: Option<Camera>,

    /// Id the camera last centred on, so a selection is focused only once.
    pub camera_target: Option<String>,

    /// Last "metabolite selected" event from either chart.
    pub selected: Option<MetaboliteDetail>,

    pub details_open: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    run: Option<PipelineRun>,
    last_token: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            config: ViewConfig::default(),
            step: Step::Upload,
            uploads: UploadSlots::default(),
            stage: PipelineStage::Idle,
            result: None,
            view: None,
            layout: None,
            camera: None,
            camera_target: None,
            selected: None,
            details_open: false,
            status_message: None,
            run: None,
            last_token: 0,
        }
    }
}

impl AppState {
    /// Assign a file to a slot. Only `.csv` files are accepted.
    pub fn set_upload(&mut self, kind: UploadKind, upload: Upload) -> Result<()> {
        let name = upload.name();
        let is_csv = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if !is_csv {
            bail!("Invalid file type. Please upload a CSV file.");
        }
        let size_bytes = match &upload {
            Upload::Path(path) => std::fs::metadata(path)
                .with_context(|| format!("reading {}", path.display()))?
                .len(),
            Upload::Memory { content, .. } => content.len() as u64,
        };

        log::info!("{}: {name}", kind.label());
        *self.uploads.slot_mut(kind) = Some(ChosenFile { upload, size_bytes });
        self.status_message = None;
        Ok(())
    }

    pub fn is_processing(&self) -> bool {
        self.run.is_some()
    }

    /// Start a background run over the three chosen files. A run already in
    /// flight is abandoned; its messages will be ignored.
    pub fn start_processing(&mut self) -> Result<()> {
        let Some(files) = self.uploads.input_files() else {
            bail!("Please upload all required files");
        };

        self.last_token += 1;
        let token = self.last_token;
        let (tx, rx) = channel();
        thread::Builder::new()
            .name(format!("pipeline-{token}"))
            .spawn(move || run_pipeline(token, files, tx))
            .context("spawning pipeline worker")?;

        self.run = Some(PipelineRun { token, rx });
        self.stage = PipelineStage::Idle;
        self.status_message = None;
        Ok(())
    }

    /// Drain messages from the worker. Returns true if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut messages = Vec::new();
        if let Some(run) = &self.run {
            while let Ok(msg) = run.rx.try_recv() {
                messages.push(msg);
            }
        }
        let changed = !messages.is_empty();
        for (token, msg) in messages {
            self.handle_message(token, msg);
        }
        changed
    }

    /// Apply one worker message, dropping it if it belongs to a stale run.
    pub fn handle_message(&mut self, token: u64, msg: RunMessage) {
        if self.run.as_ref().map(|r| r.token) != Some(token) {
            log::debug!("discarding message from stale run {token}");
            return;
        }
        match msg {
            RunMessage::Stage(stage) => self.stage = stage,
            RunMessage::Finished(Ok(result)) => {
                self.run = None;
                self.set_result(result);
            }
            RunMessage::Finished(Err(e)) => {
                self.run = None;
                self.stage = PipelineStage::Failed;
                self.status_message = Some(format!("Error processing files: {e}"));
            }
        }
    }

    /// Ingest a processed result and move to the Visualize step.
    pub fn set_result(&mut self, result: ProcessedResult) {
        let view = DashboardView::new(&result);
        self.layout = Some(ForceLayout::new(
            view.network.nodes.len(),
            &view.network.links,
            self.config.layout_iterations,
        ));
        self.camera = None;
        self.camera_target = None;
        self.view = Some(view);
        self.result = Some(result);
        self.selected = None;
        self.details_open = false;
        self.stage = PipelineStage::Ready;
        self.step = Step::Visualize;
    }

    /// Return to the Upload step, discarding the result and any run.
    pub fn go_back(&mut self) {
        self.run = None;
        self.result = None;
        self.view = None;
        self.layout = None;
        self.camera = None;
        self.camera_target = None;
        self.selected = None;
        self.details_open = false;
        self.stage = PipelineStage::Idle;
        self.step = Step::Upload;
    }

    pub fn select(&mut self, detail: MetaboliteDetail) {
        log::debug!("selected {}", detail.id);
        self.selected = Some(detail);
        self.details_open = true;
    }

    pub fn close_details(&mut self) {
        self.details_open = false;
    }

    /// Write the current result as pretty-printed JSON.
    pub fn export_json(&self, path: &Path) -> Result<()> {
        let Some(result) = &self.result else {
            bail!("Nothing to export yet");
        };
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, result).context("writing JSON")?;
        writer.flush().context("writing JSON")?;
        log::info!("exported result to {}", path.display());
        Ok(())
    }
}

fn run_pipeline(token: u64, files: InputFiles, tx: Sender<(u64, RunMessage)>) {
    let stage_tx = tx.clone();
    let result = process_files(&files, &|stage: PipelineStage| {
        let _ = stage_tx.send((token, RunMessage::Stage(stage)));
    });
    // The receiver is gone if the run was abandoned.
    let _ = tx.send((token, RunMessage::Finished(result)));
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::data::model::AssociationPoint;

    fn write_csv(dir: &Path, name: &str, text: &str) -> Upload {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(text.as_bytes()).unwrap();
        Upload::Path(path)
    }

    fn filled_state(dir: &Path, corr: &str) -> AppState {
        let mut state = AppState::default();
        let info = write_csv(dir, "info.csv", "metabolite_id,name,subclass\nM1,Alpha,Lipid\n");
        let corr = write_csv(dir, "corr.csv", corr);
        let gwas = write_csv(dir, "gwas.csv", "metabolite_id,snp,position,lod\nM1,rs1,5000,4.5\n");
        state.set_upload(UploadKind::MetaboliteInfo, info).unwrap();
        state.set_upload(UploadKind::Correlations, corr).unwrap();
        state.set_upload(UploadKind::Gwas, gwas).unwrap();
        state
    }

    fn wait_for_run(state: &mut AppState) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while state.is_processing() && Instant::now() < deadline {
            state.poll();
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_rejects_non_csv() {
        let dir = tempfile::tempdir().unwrap();
        let upload = write_csv(dir.path(), "info.txt", "x");
        let mut state = AppState::default();
        assert!(state.set_upload(UploadKind::MetaboliteInfo, upload).is_err());
        assert!(state.uploads.metabolite_info.is_none());
    }

    #[test]
    fn test_in_memory_upload_sized_from_content() {
        let mut state = AppState::default();
        let upload = Upload::Memory {
            name: "gwas.CSV".to_string(),
            content: vec![b'x'; 2048],
        };
        state.set_upload(UploadKind::Gwas, upload).unwrap();
        let chosen = state.uploads.get(UploadKind::Gwas).unwrap();
        assert_eq!(chosen.file_name(), "gwas.CSV");
        assert_eq!(chosen.size_kb(), 2.0);
        assert!(state.uploads.input_files().is_none());
    }

    #[test]
    fn test_requires_all_files() {
        let mut state = AppState::default();
        let err = state.start_processing().unwrap_err();
        assert_eq!(err.to_string(), "Please upload all required files");
        assert!(!state.is_processing());
    }

    #[test]
    fn test_successful_run_moves_to_visualize() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = filled_state(dir.path(), "metabolite_1,metabolite_2\nM1,M2\n");
        state.start_processing().unwrap();
        wait_for_run(&mut state);

        assert_eq!(state.step, Step::Visualize);
        assert_eq!(state.stage, PipelineStage::Ready);
        let result = state.result.as_ref().unwrap();
        assert_eq!(result.graph.nodes.len(), 2);
        assert_eq!(state.layout.as_ref().unwrap().positions.len(), 2);
    }

    #[test]
    fn test_failed_run_stays_on_upload() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = filled_state(dir.path(), "metabolite_1,metabolite_2\nM1\n");
        state.start_processing().unwrap();
        wait_for_run(&mut state);

        assert_eq!(state.step, Step::Upload);
        assert_eq!(state.stage, PipelineStage::Failed);
        assert!(state.result.is_none());
        let msg = state.status_message.as_deref().unwrap();
        assert!(msg.starts_with("Error processing files: failed to process files"));
    }

    #[test]
    fn test_stale_messages_are_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = filled_state(dir.path(), "metabolite_1,metabolite_2\nM1,M2\n");
        state.start_processing().unwrap();
        let first = state.last_token;
        state.start_processing().unwrap();

        state.handle_message(first, RunMessage::Finished(Ok(ProcessedResult::default())));
        assert!(state.result.is_none());
        assert_eq!(state.step, Step::Upload);

        wait_for_run(&mut state);
        assert_eq!(state.result.as_ref().unwrap().series.len(), 1);
    }

    #[test]
    fn test_back_discards_result_and_selection() {
        let mut state = AppState::default();
        let mut result = ProcessedResult::default();
        result.series.push(AssociationPoint {
            id: "M1".into(),
            name: "Alpha".into(),
            subclass: "Lipid".into(),
            snp: "rs1".into(),
            position: 10.0,
            lod: 2.0,
        });
        state.set_result(result);
        let detail = MetaboliteDetail::from(&state.result.as_ref().unwrap().series[0]);
        state.select(detail);
        assert!(state.details_open);

        state.go_back();
        assert_eq!(state.step, Step::Upload);
        assert!(state.result.is_none());
        assert!(state.selected.is_none());
        assert!(!state.details_open);
    }

    #[test]
    fn test_export_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::default();
        assert!(state.export_json(&dir.path().join("none.json")).is_err());

        state.set_result(ProcessedResult::default());
        let out = dir.path().join("result.json");
        state.export_json(&out).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert!(value["registry"].is_object());
        assert!(value["graph"]["nodes"].is_array());
        assert!(value["series"].is_array());
    }
}
