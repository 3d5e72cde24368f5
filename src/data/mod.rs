/// Data layer: the batch wage pipeline.
///
/// Architecture:
/// ```text
///  Clases.csv          Mensuales.csv
///        │                   │
///        ▼                   ▼
///   ┌────────────────────────────┐
///   │  loader                    │  parse files → RawTable
///   └────────────────────────────┘
///        │                   │
///        ▼                   ▼
///   ┌────────────────────────────┐
///   │  normalize                 │  dates, SectorCode, CLAE projection
///   └────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  join     │  left join on clae3 → EnrichedRecord
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ features  │  MoM / YoY / rank / deviation → FeatureRecord
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────────┐
///   │ aggregate, summary    │  chart tables, dataset profile
///   └──────────────────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod features;
pub mod join;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod summary;
