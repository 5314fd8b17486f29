use anyhow::Result;
use arealink::{GenerateRequest, GeographyScale, Service};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::GenerateArgs) -> Result<()> {
    let service = Service::new(super::config(cli));

    let request = GenerateRequest {
        indicator: args.indicator.parse()?,
        scale: args.scale.as_deref().map(str::parse::<GeographyScale>).transpose()?,
        table: args.table.clone(),
        targets: super::targets(&args.targets),
        boundary: args.boundary.clone(),
        out_dir: args.output.clone(),
    };

    let output = service.generate(&request)?;
    println!("[generate] {} features ({}) -> {}", output.feature_count, output.crs, output.path.display());

    Ok(())
}
