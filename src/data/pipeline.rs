use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::thread;

use thiserror::Error;

use super::gwas::build_series;
use super::model::{AssociationSeries, NetworkGraph, ProcessedResult};
use super::network::build_network;
use super::parser::{
    parse_table, MalformedInputError, Table, TableSchema, CORRELATIONS, GWAS, METABOLITE_INFO,
};
use super::registry::build_registry;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One uploaded file, either on disk or already in memory.
#[derive(Debug, Clone)]
pub enum Upload {
    Path(PathBuf),
    Memory { name: String, content: Vec<u8> },
}

impl Upload {
    pub fn name(&self) -> String {
        match self {
            Upload::Path(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string()),
            Upload::Memory { name, .. } => name.clone(),
        }
    }

    fn open(&self) -> std::io::Result<Box<dyn Read + '_>> {
        match self {
            Upload::Path(p) => Ok(Box::new(BufReader::new(File::open(p)?))),
            Upload::Memory { content, .. } => Ok(Box::new(content.as_slice())),
        }
    }
}

/// The three files one run consumes.
#[derive(Debug, Clone)]
pub struct InputFiles {
    pub metabolite_info: Upload,
    pub correlations: Upload,
    pub gwas: Upload,
}

// ---------------------------------------------------------------------------
// Stages and errors
// ---------------------------------------------------------------------------

/// `Idle → Parsing → Building → Ready`, or `Idle → Parsing → Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStage {
    #[default]
    Idle,
    Parsing,
    Building,
    Ready,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Parsing => "parsing files",
            PipelineStage::Building => "building views",
            PipelineStage::Ready => "ready",
            PipelineStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every file that failed to parse, in input order.
    #[error("failed to process files: {}", describe(.0))]
    Malformed(Vec<MalformedInputError>),

    #[error("{0} task panicked")]
    TaskPanicked(&'static str),
}

fn describe(errors: &[MalformedInputError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Parse the three files concurrently, then build the registry, network and
/// series. Any parse failure aborts the run before the builders start.
///
/// `on_stage` is called from the calling thread at each transition.
pub fn process_files(
    files: &InputFiles,
    on_stage: &dyn Fn(PipelineStage),
) -> Result<ProcessedResult, PipelineError> {
    on_stage(PipelineStage::Parsing);
    log::info!(
        "parsing {}, {}, {}",
        files.metabolite_info.name(),
        files.correlations.name(),
        files.gwas.name()
    );

    let parsed = thread::scope(|s| {
        let info = s.spawn(|| parse_upload(&files.metabolite_info, &METABOLITE_INFO));
        let corr = s.spawn(|| parse_upload(&files.correlations, &CORRELATIONS));
        let gwas = s.spawn(|| parse_upload(&files.gwas, &GWAS));
        (info.join(), corr.join(), gwas.join())
    });

    let (info, corr, gwas) = match collect_parsed(parsed) {
        Ok(tables) => tables,
        Err(e) => {
            log::error!("{e}");
            on_stage(PipelineStage::Failed);
            return Err(e);
        }
    };

    on_stage(PipelineStage::Building);
    let registry = build_registry(&info.rows);

    let (graph, series) = thread::scope(|s| {
        let graph = s.spawn(|| build_network(&corr.rows, &registry));
        let series = s.spawn(|| build_series(&gwas.rows, &registry));
        (graph.join(), series.join())
    });
    let (graph, series) = match collect_built(graph, series) {
        Ok(built) => built,
        Err(e) => {
            log::error!("{e}");
            on_stage(PipelineStage::Failed);
            return Err(e);
        }
    };

    log::info!(
        "ready: {} metabolite(s), {} node(s), {} edge(s), {} point(s)",
        registry.len(),
        graph.nodes.len(),
        graph.edges.len(),
        series.len()
    );
    on_stage(PipelineStage::Ready);

    Ok(ProcessedResult {
        registry,
        graph,
        series,
    })
}

fn parse_upload(upload: &Upload, schema: &TableSchema) -> Result<Table, MalformedInputError> {
    let file = format!("{} ({})", schema.label, upload.name());
    let reader = upload.open().map_err(|source| MalformedInputError::Io {
        file: file.clone(),
        source,
    })?;
    let table = parse_table(&file, schema, reader)?;
    log::debug!(
        "{file}: {} row(s), columns {:?}",
        table.rows.len(),
        table.headers
    );
    Ok(table)
}

type Joined = thread::Result<Result<Table, MalformedInputError>>;

fn collect_parsed(
    (info, corr, gwas): (Joined, Joined, Joined),
) -> Result<(Table, Table, Table), PipelineError> {
    let info = info.map_err(|_| PipelineError::TaskPanicked("metabolite info parser"))?;
    let corr = corr.map_err(|_| PipelineError::TaskPanicked("correlations parser"))?;
    let gwas = gwas.map_err(|_| PipelineError::TaskPanicked("GWAS parser"))?;

    match (info, corr, gwas) {
        (Ok(info), Ok(corr), Ok(gwas)) => Ok((info, corr, gwas)),
        (info, corr, gwas) => Err(PipelineError::Malformed(
            [info.err(), corr.err(), gwas.err()]
                .into_iter()
                .flatten()
                .collect(),
        )),
    }
}

fn collect_built(
    graph: thread::Result<NetworkGraph>,
    series: thread::Result<AssociationSeries>,
) -> Result<(NetworkGraph, AssociationSeries), PipelineError> {
    let graph = graph.map_err(|_| PipelineError::TaskPanicked("network builder"))?;
    let series = series.map_err(|_| PipelineError::TaskPanicked("series builder"))?;
    Ok((graph, series))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Write;

    use super::*;
    use crate::data::model::{AssociationPoint, UNKNOWN};

    fn memory(name: &str, text: &str) -> Upload {
        Upload::Memory {
            name: name.to_string(),
            content: text.as_bytes().to_vec(),
        }
    }

    fn inputs(info: &str, corr: &str, gwas: &str) -> InputFiles {
        InputFiles {
            metabolite_info: memory("info.csv", info),
            correlations: memory("corr.csv", corr),
            gwas: memory("gwas.csv", gwas),
        }
    }

    fn ignore(_: PipelineStage) {}

    const INFO: &str = "metabolite_id,name,subclass\nM1,Alpha,Lipid\nM2,Beta,Amino\n";
    const CORR: &str = "metabolite_1,metabolite_2\nM1,M2\n";
    const GWAS_CSV: &str = "metabolite_id,snp,position,lod\nM1,rs100,5000,4.5\nM3,rs200,6000,3.1\n";

    #[test]
    fn test_end_to_end() {
        let result = process_files(&inputs(INFO, CORR, GWAS_CSV), &ignore).unwrap();

        let nodes: Vec<(&str, &str, &str)> = result
            .graph
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), n.name.as_str(), n.subclass.as_str()))
            .collect();
        assert_eq!(nodes, vec![("M1", "Alpha", "Lipid"), ("M2", "Beta", "Amino")]);
        assert_eq!(result.graph.edges.len(), 1);
        assert_eq!(result.graph.edges[0].source, "M1");
        assert_eq!(result.graph.edges[0].target, "M2");

        assert_eq!(
            result.series,
            vec![
                AssociationPoint {
                    id: "M1".into(),
                    name: "Alpha".into(),
                    subclass: "Lipid".into(),
                    snp: "rs100".into(),
                    position: 5000.0,
                    lod: 4.5,
                },
                AssociationPoint {
                    id: "M3".into(),
                    name: UNKNOWN.into(),
                    subclass: UNKNOWN.into(),
                    snp: "rs200".into(),
                    position: 6000.0,
                    lod: 3.1,
                },
            ]
        );
        assert_eq!(result.registry.len(), 2);
    }

    #[test]
    fn test_stage_transitions_on_success() {
        let stages = RefCell::new(Vec::new());
        process_files(&inputs(INFO, CORR, GWAS_CSV), &|s: PipelineStage| stages.borrow_mut().push(s)).unwrap();
        assert_eq!(
            stages.into_inner(),
            vec![
                PipelineStage::Parsing,
                PipelineStage::Building,
                PipelineStage::Ready
            ]
        );
    }

    #[test]
    fn test_one_malformed_file_fails_whole_run() {
        let stages = RefCell::new(Vec::new());
        let bad_corr = "metabolite_1,metabolite_2\nM1,M2,M3\n";
        let err = process_files(&inputs(INFO, bad_corr, GWAS_CSV), &|s: PipelineStage| {
            stages.borrow_mut().push(s)
        })
        .unwrap_err();

        match err {
            PipelineError::Malformed(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(matches!(
                    &errors[0],
                    MalformedInputError::Rows { lines, .. } if lines == &vec![2]
                ));
            }
            other => panic!("expected malformed input, got {other:?}"),
        }
        assert_eq!(
            stages.into_inner(),
            vec![PipelineStage::Parsing, PipelineStage::Failed]
        );
    }

    #[test]
    fn test_all_failures_aggregated() {
        let err = process_files(
            &inputs("metabolite_id\nM1\n", CORR, "metabolite_id,snp,position,lod\nM1\n"),
            &ignore,
        )
        .unwrap_err();
        match err {
            PipelineError::Malformed(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected malformed input, got {other:?}"),
        }
    }

    #[test]
    fn test_reads_files_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, text: &str| {
            let path = dir.path().join(name);
            let mut f = File::create(&path).unwrap();
            f.write_all(text.as_bytes()).unwrap();
            Upload::Path(path)
        };
        let files = InputFiles {
            metabolite_info: write("info.csv", INFO),
            correlations: write("corr.csv", CORR),
            gwas: write("gwas.csv", GWAS_CSV),
        };
        let result = process_files(&files, &ignore).unwrap();
        assert_eq!(result.series.len(), 2);
        assert_eq!(files.gwas.name(), "gwas.csv");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let files = InputFiles {
            metabolite_info: Upload::Path(PathBuf::from("/nonexistent/info.csv")),
            correlations: memory("corr.csv", CORR),
            gwas: memory("gwas.csv", GWAS_CSV),
        };
        match process_files(&files, &ignore).unwrap_err() {
            PipelineError::Malformed(errors) => {
                assert!(matches!(errors[0], MalformedInputError::Io { .. }))
            }
            other => panic!("expected io failure, got {other:?}"),
        }
    }

    #[test]
    fn test_builder_panic_reported_as_failure() {
        let panicked: thread::Result<AssociationSeries> = Err(Box::new("boom"));
        match collect_built(Ok(NetworkGraph::default()), panicked) {
            Err(PipelineError::TaskPanicked(task)) => assert_eq!(task, "series builder"),
            other => panic!("expected a panicked task, got {other:?}"),
        }
        assert!(collect_built(Ok(NetworkGraph::default()), Ok(Vec::new())).is_ok());
    }
}
