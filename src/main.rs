//! ntemoji - Export QQ NT personal stickers and repair their file names

use anyhow::{bail, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ntemoji_core::config::UserDataLocator;
use ntemoji_core::encoding;
use ntemoji_core::export::{self, ProgressFn};
use ntemoji_core::reconcile;
use std::fs;
use std::path::Path;
use std::sync::Arc;

mod cache;
mod cli;
use cache::NicknameCache;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            output,
            account,
            config,
            no_rename,
        } => {
            let mut locator = UserDataLocator::new(&config);
            let root = locator.user_data_save_path()?;
            println!("User data root: {}", root.display());

            let account = match account {
                Some(account) => account,
                None => pick_single_account(&root)?,
            };
            println!("Exporting stickers for account {}", account);
            println!();

            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            let pb_clone = pb.clone();
            let progress: ProgressFn = Arc::new(move |current: usize, total: usize, msg: &str| {
                pb_clone.set_length(total as u64);
                pb_clone.set_position(current as u64);
                pb_clone.set_message(msg.to_string());
            });

            let result =
                export::export_stickers(&root, &account, &output, !no_rename, Some(&progress))?;
            pb.finish_with_message("Complete");

            println!();
            println!("Export complete!");
            println!("  Source: {}", result.source.display());
            println!(
                "  Copied: {} of {} files ({} failed)",
                result.copy.copied, result.copy.total, result.copy.failed
            );
            if let Some(stats) = &result.reconcile {
                println!("  Extension repairs: {} renamed", stats.renamed);
                println!("  Already correct: {}", stats.already_correct);
                if stats.skipped_existing > 0 {
                    println!("  Skipped (name taken): {}", stats.skipped_existing);
                }
                if stats.unrecognized > 0 {
                    println!("  Unrecognized headers: {}", stats.unrecognized);
                }
                if stats.failed > 0 {
                    println!("  Failed: {}", stats.failed);
                }
            }
            println!("Output: {}", output.display());

            Ok(())
        }

        Commands::Locate { config } => {
            let mut locator = UserDataLocator::new(&config);
            let root = locator.user_data_save_path()?;
            println!("User data root: {}", root.display());

            let accounts = export::numeric_subdirectories(&root);
            if accounts.is_empty() {
                println!("No account directories found (is anyone logged in?)");
                return Ok(());
            }

            let cache = cache::default_cache_path()
                .map(|path| NicknameCache::load(&path))
                .unwrap_or_default();
            println!("Accounts:");
            for account in &accounts {
                println!("  {}", cache.display_name(account));
            }
            Ok(())
        }

        Commands::FixExt { dir } => {
            if !dir.is_dir() {
                bail!("not a directory: {}", dir.display());
            }
            let stats = reconcile::reconcile_tree(&dir);
            println!("Examined {} image files", stats.examined);
            println!("  Renamed: {}", stats.renamed);
            println!("  Already correct: {}", stats.already_correct);
            println!("  Unrecognized headers: {}", stats.unrecognized);
            println!("  Skipped (name taken): {}", stats.skipped_existing);
            if stats.failed > 0 {
                println!("  Failed: {}", stats.failed);
            }
            Ok(())
        }

        Commands::SniffEncoding { file, marker } => {
            let raw = fs::read(&file)?;
            let resolved = encoding::resolve(&raw, &marker)?;
            println!(
                "{}: {} (candidate label {})",
                file.display(),
                resolved.encoding.name(),
                resolved.label
            );
            Ok(())
        }
    }
}

/// Without an explicit account there must be exactly one to pick from.
fn pick_single_account(root: &Path) -> Result<String> {
    let accounts = export::numeric_subdirectories(root);
    match accounts.as_slice() {
        [] => bail!("no account directories under {}", root.display()),
        [only] => Ok(only.clone()),
        many => bail!(
            "multiple accounts found ({}); pick one with --account",
            many.join(", ")
        ),
    }
}
