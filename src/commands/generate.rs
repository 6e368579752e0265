//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Folio;

/// Generate the static site.
///
/// Posts that fail to load are logged and skipped by the generator; the
/// command still fails afterwards so the problem is not missed.
pub async fn run(folio: &Folio) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(folio)?;
    let report = generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} pages ({} published) in {:.2}s",
        report.pages,
        report.published,
        duration.as_secs_f64()
    );

    if !report.failed.is_empty() {
        for (id, reason) in &report.failed {
            tracing::error!("{}: {}", id, reason);
        }
        anyhow::bail!("{} post(s) failed to load", report.failed.len());
    }

    Ok(())
}
