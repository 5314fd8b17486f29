use anyhow::{bail, Result};
use arealink::{GeographyScale, Indicator, Service};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::BatchArgs) -> Result<()> {
    let service = Service::new(super::config(cli));
    let scale: GeographyScale = args.scale.parse()?;

    let bundled = service.bundled_tables();
    let tables = if args.dataset.trim().eq_ignore_ascii_case("all") {
        bundled
    } else {
        let wanted = args.dataset.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::parse::<Indicator>)
            .collect::<Result<Vec<_>, _>>()?;

        let missing = wanted.iter()
            .filter(|indicator| !bundled.iter().any(|(b, _)| b == *indicator))
            .map(|indicator| indicator.to_string())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            bail!("no bundled table for: {}", missing.join(", "));
        }

        bundled.into_iter().filter(|(indicator, _)| wanted.contains(indicator)).collect()
    };

    let missing = tables.iter()
        .filter(|(_, path)| !path.exists())
        .map(|(indicator, path)| format!("CSV not found for {indicator}: {}", path.display()))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!("{}\ndata directory used: {}", missing.join("\n"), service.config().data_dir.display());
    }

    let outputs = service.generate_batch(
        &tables,
        scale,
        super::targets(&args.targets).as_ref(),
        args.boundary.as_deref(),
        args.output.as_deref(),
    )?;

    for output in &outputs {
        println!("[batch] {}: {} features -> {}", output.indicator, output.feature_count, output.path.display());
    }

    Ok(())
}
