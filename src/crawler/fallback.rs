//! Engine fallback
//!
//! An extraction is attempted under each engine in priority order, each time in a
//! fresh context that is closed afterwards. The first engine producing records
//! wins; the reasons earlier engines failed are kept in its diagnostics.

use super::diagnostics::{Diagnostics, Extraction};
use crate::engine::{BrowserContext, Engine};
use crate::{HarvestError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// One complete extraction attempt inside a given context
#[async_trait]
pub trait ContextRun: Send + Sync {
    async fn run_in(&self, context: &dyn BrowserContext) -> Result<Extraction>;
}

/// Runs `job` under each engine until one yields a non-empty result set
///
/// # Errors
///
/// * The engine's own error when only one engine is configured
/// * `AllEnginesFailed` listing every engine's reason otherwise
pub async fn run_with_fallback(
    site: &str,
    engines: &[Arc<dyn Engine>],
    job: &dyn ContextRun,
) -> Result<Extraction> {
    let mut diagnostics = Diagnostics::default();
    let mut reasons: Vec<String> = Vec::new();
    let mut last_error: Option<HarvestError> = None;

    for engine in engines {
        tracing::info!("{}: extracting with {}", site, engine.name());

        let context = match engine.new_context().await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!("{}: {} context failed: {}", site, engine.name(), e);
                reasons.push(format!("{}: {}", engine.name(), e));
                diagnostics.record_engine_failure(engine.name(), e.to_string());
                last_error = Some(e.into());
                continue;
            }
        };

        let result = job.run_in(context.as_ref()).await;
        context.close().await;

        match result {
            Ok(mut extraction) if !extraction.records.is_empty() => {
                tracing::info!(
                    "{}: {} returned {} records",
                    site,
                    engine.name(),
                    extraction.records.len()
                );
                diagnostics.merge(std::mem::take(&mut extraction.diagnostics));
                extraction.diagnostics = diagnostics;
                return Ok(extraction);
            }
            Ok(_) => {
                tracing::warn!("{}: {} returned no records", site, engine.name());
                reasons.push(format!("{}: no records", engine.name()));
                diagnostics.record_engine_failure(engine.name(), "no records");
            }
            Err(e) => {
                tracing::warn!("{}: {} failed: {}", site, engine.name(), e);
                reasons.push(format!("{}: {}", engine.name(), e));
                diagnostics.record_engine_failure(engine.name(), e.to_string());
                last_error = Some(e);
            }
        }
    }

    if engines.len() == 1 {
        if let Some(e) = last_error {
            return Err(e);
        }
    }

    Err(HarvestError::AllEnginesFailed {
        site: site.to_string(),
        reasons: if reasons.is_empty() {
            "no engines configured".to_string()
        } else {
            reasons.join(" | ")
        },
    })
}
