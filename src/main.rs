//! Media Harvester - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use media_harvester::{
    browser::Harvester,
    cli::Args,
    config::{filter_valid_folders, validate_config, validate_folders, Config},
    download::{download_records, harvest_timeline, FolderState, GlobalState},
    error::{exit_codes, Error, Result},
    fs::{ensure_dir, get_folder_path, list_folders, ProgressStore},
    output::{
        print_banner, print_config_summary, print_error, print_folder_stats, print_global_stats,
        print_harvest_listing, print_info, print_success, print_warning,
    },
    session::{get_or_create_session, SessionCredential, SessionStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(state) if state.folders_failed > 0 => {
            ExitCode::from(exit_codes::SOME_FOLDERS_FAILED as u8)
        }
        Ok(_) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::MissingConfig(_)
                | Error::TomlParse(_) => ExitCode::from(exit_codes::CONFIG_ERROR as u8),
                Error::Session(_) | Error::LoginTimeout(_) | Error::Browser(_) | Error::Cdp(_) => {
                    ExitCode::from(exit_codes::BROWSER_ERROR as u8)
                }
                Error::Download(_) | Error::Http(_) => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<GlobalState> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        print_warning(&format!(
            "Configuration file not found: {}",
            args.config.display()
        ));
        print_info("Using default configuration with CLI arguments");
        Config::default()
    };

    args.merge_into_config(&mut config);
    validate_config(&config)?;

    let root = config.storage_root().to_path_buf();
    ensure_dir(&root)?;

    let folders = if args.folders.is_empty() {
        filter_valid_folders(list_folders(&root)?)?
    } else {
        validate_folders(&args.folders)?;
        args.folders.clone()
    };

    let mut global_state = GlobalState::default();

    if folders.is_empty() {
        print_warning(&format!(
            "No folders to harvest. Create one per account under {}",
            root.display()
        ));
        return Ok(global_state);
    }

    print_config_summary(&folders, &root.display().to_string(), args.dry_run);

    // Authenticate
    let store = SessionStore::in_root(&root);
    let credential = get_or_create_session(&config, &store).await?;
    print_success("Session is valid");

    let harvester = Harvester::from_config(&config)?;
    let progress = ProgressStore::new(&root);

    // Harvest every folder before downloading anything
    let mut harvested = Vec::new();
    for folder in &folders {
        print_info(&format!("Processing folder: {}", folder));

        match harvest_folder(&harvester, &config, &credential, &progress, folder).await {
            Ok(Some(state)) => harvested.push(state),
            Ok(None) => {
                print_warning(&format!("Could not open the timeline of {}, skipping", folder));
                global_state.mark_folder_failed();
            }
            Err(e) => {
                print_error(&format!("Failed to harvest {}: {}", folder, e));
                global_state.mark_folder_failed();
            }
        }
    }

    for mut state in harvested {
        if args.dry_run {
            print_harvest_listing(&state);
            global_state.add_folder_stats(&state);
            continue;
        }

        match download_folder(&config, &progress, &mut state).await {
            Ok(()) => {
                print_folder_stats(&state);
                global_state.add_folder_stats(&state);
            }
            Err(e) => {
                print_error(&format!("Failed to download {}: {}", state.folder, e));
                global_state.mark_folder_failed();
            }
        }
    }

    print_global_stats(&global_state);

    Ok(global_state)
}

async fn harvest_folder(
    harvester: &Harvester,
    config: &Config,
    credential: &SessionCredential,
    progress: &ProgressStore,
    folder: &str,
) -> Result<Option<FolderState>> {
    let mut state = match harvest_timeline(harvester, config, credential, progress, folder).await? {
        Some(state) => state,
        None => return Ok(None),
    };

    // Set base path (with path traversal protection)
    state.path = Some(get_folder_path(config, folder)?);
    Ok(Some(state))
}

/// Download a harvested folder and record its progress.
///
/// Progress is only saved when every attachment landed, so failed ones are
/// harvested again next run.
async fn download_folder(
    config: &Config,
    progress: &ProgressStore,
    state: &mut FolderState,
) -> Result<()> {
    let path = match &state.path {
        Some(path) => path.clone(),
        None => get_folder_path(config, &state.folder)?,
    };

    state.stats = download_records(&path, &state.records, config.download.concurrency).await?;

    if state.stats.failed > 0 {
        print_warning(&format!(
            "{} attachment(s) of {} failed, progress not saved",
            state.stats.failed, state.folder
        ));
        return Ok(());
    }

    progress.merge_and_save(&state.folder, &state.new_ids())?;
    Ok(())
}
