//! What-if scenario engine: cost model, elimination loop, reporting.

pub mod cost;
pub mod observer;
pub mod report;
pub mod whatif;

pub use cost::CostModel;
pub use observer::{EliminationStep, NoopObserver, StepObserver, TracingObserver};
pub use report::WhatIfReport;
pub use whatif::{WhatIfAnalysis, WhatIfConfig};
