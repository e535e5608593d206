/// Data layer: parsing, joining and shaping the three uploaded tables.
///
/// Architecture:
/// ```text
///  metabolite_info.csv   correlations.csv   gwas_data.csv
///        │                     │                  │
///        ▼                     ▼                  ▼
///   ┌──────────────────────────────────────────────────┐
///   │ parser     (three scoped threads, joined)         │
///   └──────────────────────────────────────────────────┘
///        │                     │                  │
///        ▼                     │                  │
///   ┌──────────┐               │                  │
///   │ registry  │──────────────┼──────────────────┤
///   └──────────┘               ▼                  ▼
///                        ┌──────────┐       ┌──────────┐
///                        │ network   │       │  gwas     │
///                        └──────────┘       └──────────┘
///                              │                  │
///                              ▼                  ▼
///                           ProcessedResult (pipeline)
/// ```

pub mod gwas;
pub mod model;
pub mod network;
pub mod parser;
pub mod pipeline;
pub mod registry;
