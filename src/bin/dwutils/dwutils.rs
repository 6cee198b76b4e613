use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use warehouse_utils::filename::{create_unique_filename, has_folder_name_extension, return_folder_name};
use warehouse_utils::files::{get_data_source_files, get_file_extension, get_file_format};
use warehouse_utils::organize::{PlannedFile, collect_files, find_conflicts, plan};
use warehouse_utils::storage::ObjectStore;
use warehouse_utils::{ndjson, print_error, print_warning, whatsapp};

use crate::config::Config;
use crate::{BucketAction, DwUtilsCommand};

const PROGRESS_BAR_CHARS: &str = "=> ";
const PROGRESS_BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:80.cyan/blue} {pos}/{len} {percent}%";
const ORGANIZED_SUFFIX: &str = "-organized";

#[derive(Debug)]
pub struct DwUtils {
    config: Config,
}

/// Result counts from organizing a directory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct OrganizeStats {
    copied: usize,
    converted: usize,
    skipped: usize,
    failed: usize,
}

enum CopyOutcome {
    Copied,
    Converted,
}

impl DwUtils {
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self, command: &DwUtilsCommand) -> Result<()> {
        match command {
            DwUtilsCommand::Folder { names } => self.print_folder_names(names),
            DwUtilsCommand::Unique { paths } => Self::print_unique_filenames(paths),
            DwUtilsCommand::Format { data_source, path } => self.print_file_format(data_source, path.as_deref()),
            DwUtilsCommand::Organize { path, output, .. } => self.organize(path.as_deref(), output.as_deref()),
            DwUtilsCommand::Whatsapp { chat, output } => self.export_whatsapp(chat, output.as_deref()),
            DwUtilsCommand::Bucket { action, .. } => self.bucket(action).await,
        }
    }

    fn print_folder_names(&self, names: &[String]) -> Result<()> {
        let mut failed = 0;
        for name in names {
            match return_folder_name(name) {
                Ok(folder) if self.config.verbose => println!("{name}: {}", folder.cyan()),
                Ok(folder) => println!("{folder}"),
                Err(error) => {
                    print_error!("{error}");
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            anyhow::bail!("{failed} of {} names did not produce a folder name", names.len());
        }
        Ok(())
    }

    fn print_unique_filenames(paths: &[String]) -> Result<()> {
        for path in paths {
            let unique = create_unique_filename(path)?;
            println!("{unique}");
        }
        Ok(())
    }

    fn print_file_format(&self, data_source: &str, path: Option<&Path>) -> Result<()> {
        let root = warehouse_utils::resolve_input_path(path)?;
        let directory = root.join(data_source);
        if !directory.is_dir() {
            anyhow::bail!("Data source directory does not exist: {}", directory.display());
        }

        let files: Vec<String> = collect_files(&directory)
            .iter()
            .filter_map(|file| file.strip_prefix(&root).ok())
            .map(warehouse_utils::path_to_slash_string)
            .collect();

        if self.config.verbose {
            for file in get_data_source_files(data_source, &files, true) {
                println!("{file}");
            }
        }

        let format = get_file_format(data_source, &files)?;
        println!("{format}");
        Ok(())
    }

    fn organize(&self, path: Option<&Path>, output: Option<&str>) -> Result<()> {
        let root = warehouse_utils::resolve_input_path(path)?;
        if !root.is_dir() {
            anyhow::bail!("Input path is not a directory: {}", root.display());
        }
        let output_root = Self::organize_output_path(&root, output)?;
        if self.config.verbose {
            println!("{self}");
            println!("Output: {}", output_root.display());
        }

        let planned = plan(&root, &collect_files(&root));
        if planned.is_empty() {
            println!("No JSON or CSV files found");
            return Ok(());
        }

        let jobs = Self::valid_targets(&planned);
        if self.config.dryrun || self.config.verbose {
            for (file, target) in &jobs {
                warehouse_utils::show_diff(&file.relative, target);
            }
        }

        if self.config.dryrun {
            println!(
                "{}",
                format!("Dryrun: would copy {} files to {}", jobs.len(), output_root.display()).bold()
            );
            return Ok(());
        }

        let stats = self.copy_files(&jobs, &output_root);
        println!(
            "{}",
            format!(
                "Copied {} files to {} ({} converted, {} skipped)",
                stats.copied + stats.converted,
                output_root.display(),
                stats.converted,
                stats.skipped
            )
            .green()
        );
        if stats.failed > 0 {
            anyhow::bail!("Failed to copy {} files", stats.failed);
        }
        Ok(())
    }

    /// Default output directory is a sibling of the input directory.
    fn organize_output_path(root: &Path, output: Option<&str>) -> Result<PathBuf> {
        match output.map(str::trim) {
            Some(output) if !output.is_empty() => warehouse_utils::resolve_output_path(Some(output), root),
            _ => {
                let name = warehouse_utils::path_to_filename_string(root);
                let parent = root.parent().context("Failed to get parent directory")?;
                Ok(parent.join(format!("{name}{ORGANIZED_SUFFIX}")))
            }
        }
    }

    /// Return the planned files that have a target no other file maps to.
    /// Files without a valid target and conflicting targets are reported as warnings.
    fn valid_targets(planned: &[PlannedFile]) -> Vec<(&PlannedFile, &str)> {
        let conflicts = find_conflicts(planned);
        for conflict in &conflicts {
            print_warning!("Multiple files map to {conflict}, skipping");
        }

        planned
            .iter()
            .filter_map(|file| match &file.target {
                Ok(target) if conflicts.contains(target) => None,
                Ok(target) => Some((file, target.as_str())),
                Err(error) => {
                    print_warning!("{error}");
                    None
                }
            })
            .collect()
    }

    fn copy_files(&self, jobs: &[(&PlannedFile, &str)], output_root: &Path) -> OrganizeStats {
        let mut stats = OrganizeStats::default();
        let progress_bar = self.create_progress_bar(jobs.len() as u64);

        for (file, target) in jobs {
            let destination = output_root.join(target);
            if destination.exists() && !self.config.force {
                progress_bar.suspend(|| print_warning!("Skipping existing file: {}", destination.display()));
                stats.skipped += 1;
            } else {
                match self.copy_file(&file.source, &destination) {
                    Ok(CopyOutcome::Copied) => stats.copied += 1,
                    Ok(CopyOutcome::Converted) => stats.converted += 1,
                    Err(error) => {
                        progress_bar.suspend(|| print_error!("{error:#}"));
                        stats.failed += 1;
                    }
                }
            }
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();
        stats
    }

    fn copy_file(&self, source: &Path, destination: &Path) -> Result<CopyOutcome> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let is_json = get_file_extension(&warehouse_utils::path_to_filename_string(source)).eq_ignore_ascii_case("json");
        if self.config.convert_json
            && is_json
            && let Some(content) = ndjson::convert_file(source, &self.config.transformer)?
        {
            fs::write(destination, format!("{content}\n"))
                .with_context(|| format!("Failed to write file: {}", destination.display()))?;
            return Ok(CopyOutcome::Converted);
        }

        fs::copy(source, destination)
            .with_context(|| format!("Failed to copy {} to {}", source.display(), destination.display()))?;
        Ok(CopyOutcome::Copied)
    }

    fn export_whatsapp(&self, chat: &Path, output: Option<&Path>) -> Result<()> {
        let chat = warehouse_utils::resolve_input_path(Some(chat))?;
        let output = match output {
            Some(path) => path.to_path_buf(),
            None => {
                let name = return_folder_name(&warehouse_utils::path_to_string(&chat))
                    .unwrap_or_else(|_| warehouse_utils::path_to_file_stem_string(&chat));
                let parent = chat.parent().context("Failed to get parent directory")?;
                parent.join(format!("{name}.json"))
            }
        };

        if self.config.verbose {
            let text = fs::read(&chat).with_context(|| format!("Failed to read chat: {}", chat.display()))?;
            println!("Chat has {} messages", whatsapp::count_messages(&String::from_utf8_lossy(&text)));
        }

        let written = whatsapp::export_chat(&chat, &output)?;
        if written == 0 {
            println!("No new messages");
        } else {
            println!("{}", format!("Wrote {written} new messages to {}", output.display()).green());
        }
        Ok(())
    }

    async fn bucket(&self, action: &BucketAction) -> Result<()> {
        let storage = self.config.storage().await?;
        if self.config.verbose {
            println!("Storage: {storage}");
        }

        match action {
            BucketAction::List { bucket, folders } => {
                for key in storage.list(bucket).await? {
                    let folder = if *folders && has_folder_name_extension(Path::new(&key)) {
                        return_folder_name(&key).ok()
                    } else {
                        None
                    };
                    match folder {
                        Some(folder) => println!("{key} {}", folder.cyan()),
                        None => println!("{key}"),
                    }
                }
            }
            BucketAction::Read { bucket, key } => {
                let content = storage.read_to_string(bucket, key).await?;
                print!("{content}");
            }
            BucketAction::Upload { bucket, file, key } => {
                let file = warehouse_utils::resolve_input_path(Some(file.as_path()))?;
                let key = key
                    .clone()
                    .unwrap_or_else(|| warehouse_utils::path_to_filename_string(&file));
                storage.upload(bucket, &file, &key).await?;
                println!("Uploaded {} to {bucket}/{key}", file.display());
            }
            BucketAction::Copy {
                source_bucket,
                source_key,
                destination_bucket,
                destination_key,
            } => {
                storage
                    .copy(source_bucket, source_key, destination_bucket, destination_key)
                    .await?;
                println!("Copied {source_bucket}/{source_key} to {destination_bucket}/{destination_key}");
            }
        }
        Ok(())
    }

    /// Progress bar is hidden with verbose output since each file is printed.
    fn create_progress_bar(&self, len: u64) -> ProgressBar {
        if self.config.verbose || cfg!(test) {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(len);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_BAR_TEMPLATE)
                .expect("Failed to set progress bar template")
                .progress_chars(PROGRESS_BAR_CHARS),
        );
        progress_bar
    }
}

impl fmt::Display for DwUtils {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Storage: {}", self.config.storage)?;
        writeln!(f, "JSON transformer: {} '{}'", self.config.transformer.program, self.config.transformer.filter)?;
        write!(f, "Dryrun: {}, force: {}", self.config.dryrun, self.config.force)
    }
}
