use std::time::Duration;

use anyhow::Result;
use arealink::{Crs, OverlayOptions, OverlayRequest, OverlayYear, Service};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::OverlayArgs) -> Result<()> {
    let mut config = super::config(cli);
    if let Some(dir) = &args.overlay_dir {
        config = config.with_overlay_dir(dir);
    }
    let service = Service::new(config);

    let request = OverlayRequest {
        precinct_name: args.precinct.clone(),
        year: OverlayYear::try_from(args.year)?,
    };
    let options = OverlayOptions {
        target: Crs(args.epsg),
        parallel: !args.sequential,
        budget: args.budget_ms.map(Duration::from_millis),
        ..OverlayOptions::default()
    };

    let response = service.precinct_overlay(&request, &options)?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
