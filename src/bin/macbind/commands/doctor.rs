//! `macbind doctor` command

use anyhow::Result;

use crate::cli::DoctorArgs;
use macbind::ops::{doctor, format_report, DoctorOptions};
use macbind::util::config::{global_config_path, load_config, project_config_path};

pub fn execute(args: DoctorArgs, verbose: bool) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    let config = load_config(
        global_config_path().as_deref(),
        &project_config_path(&cwd),
    );

    let options = DoctorOptions {
        tools: config.tools(),
    };
    let report = doctor(&options)?;

    print!("{}", format_report(&report, verbose));

    // Exit with error code if required checks failed
    let passed = if args.strict {
        report.failed_count() == 0
    } else {
        report.all_required_passed()
    };
    if passed {
        Ok(0)
    } else {
        Ok(1)
    }
}
