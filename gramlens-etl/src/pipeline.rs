use crate::config::Settings;
use crate::error::Result;
use crate::extract::{self, ExtractSummary};
use crate::load::{self, LoadSummary};
use crate::transform::{self, TransformSummary};

#[derive(Debug, Clone, Copy)]
pub struct PipelineSummary {
    pub extract: ExtractSummary,
    pub transform: TransformSummary,
    pub load: LoadSummary,
}

/// Run the three stages strictly in order. Each stage starts only after
/// the prior stage's artifact is durably written; any stage error
/// propagates and the run can be resumed from the failed stage.
pub fn run(settings: &Settings) -> Result<PipelineSummary> {
    tracing::info!("pipeline start");
    let extract = extract::run_extract(settings)?;
    let transform = transform::run_transform(settings)?;
    let load = load::run_load(settings)?;
    tracing::info!(
        items = extract.items,
        rows_loaded = load.posts + load.comments + load.flat_texts,
        "pipeline finished"
    );
    Ok(PipelineSummary {
        extract,
        transform,
        load,
    })
}
