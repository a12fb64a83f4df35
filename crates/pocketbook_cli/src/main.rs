//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `pocketbook_core` linkage.
//! - Bootstrap a repository (in memory, or under the data dir given as the
//!   first argument) and report what the first-run guard did.
//! - Start file logging under `<data_dir>/logs` when a data dir is given.

use pocketbook_core::{
    CategoryFilter, CoreConfig, FinanceRepository, LogConfig, LoggingError, RepoResult,
    SeedOutcome,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("pocketbook_core ping={}", pocketbook_core::ping());
    println!("pocketbook_core version={}", pocketbook_core::core_version());

    let config = match std::env::args_os().nth(1) {
        Some(data_dir) => CoreConfig::for_data_dir(data_dir),
        None => CoreConfig::default(),
    };

    if let Err(err) = start_logging(&config.log) {
        eprintln!("pocketbook_core logging failed: {err}");
        return ExitCode::FAILURE;
    }

    match bootstrap(&config) {
        Ok((outcome, categories)) => {
            println!("pocketbook_core seed={outcome:?} categories={categories}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("pocketbook_core bootstrap failed: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether file logging was started; without a log dir nothing runs.
fn start_logging(log: &LogConfig) -> Result<bool, LoggingError> {
    if log.dir.is_none() {
        return Ok(false);
    }
    pocketbook_core::init_logging(log)?;
    Ok(true)
}

fn bootstrap(config: &CoreConfig) -> RepoResult<(SeedOutcome, usize)> {
    let repo = FinanceRepository::open(config)?;
    let outcome = repo.initialize()?;
    let categories = repo.list_categories(&CategoryFilter::default())?.len();
    Ok((outcome, categories))
}

#[cfg(test)]
mod tests {
    use super::{bootstrap, start_logging};
    use pocketbook_core::{logging_status, CoreConfig, SeedOutcome};

    #[test]
    fn in_memory_run_skips_file_logging() {
        let config = CoreConfig::default();
        assert!(!start_logging(&config.log).unwrap());
        assert_eq!(bootstrap(&config).unwrap(), (SeedOutcome::Seeded(17), 17));
    }

    #[test]
    fn data_dir_run_writes_logs_under_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::for_data_dir(dir.path());

        assert!(start_logging(&config.log).unwrap());
        let (_, log_dir) = logging_status().unwrap();
        assert_eq!(Some(log_dir), config.log.dir.clone());
        assert!(dir.path().join("logs").is_dir());

        assert_eq!(bootstrap(&config).unwrap().1, 17);
    }
}
