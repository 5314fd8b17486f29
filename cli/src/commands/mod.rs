pub mod batch;
pub mod generate;
pub mod overlay;

use arealink::{DataConfig, TargetIds};

use crate::cli::{Cli, TargetArgs};

/// Environment configuration with the global `--data-dir` applied.
pub(crate) fn config(cli: &Cli) -> DataConfig {
    let config = DataConfig::from_env();
    match &cli.data_dir {
        Some(dir) => DataConfig { data_dir: dir.clone(), ..config },
        None => config,
    }
}

pub(crate) fn targets(args: &TargetArgs) -> Option<TargetIds> {
    match (&args.ids, &args.ids_file) {
        (Some(list), _) => Some(TargetIds::List(list.clone())),
        (None, Some(path)) => Some(TargetIds::File(path.clone())),
        (None, None) => None,
    }
}
