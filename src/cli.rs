use crate::merge::DEFAULT_OUTPUT_NAME;
use crate::output::OutputSink;
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command, value_parser};
use std::path::PathBuf;

pub struct Config {
    /// Files and directories to merge, absolute.
    pub selection: Vec<PathBuf>,
    pub project_root: PathBuf,
    pub output: OutputSink,
    pub respect_gitignore: bool,
    pub min_selections: usize,
    pub verbosity: u8,
    pub quiet: bool,
    #[cfg(feature = "restore")]
    pub restore_input: Option<PathBuf>,
    #[cfg(feature = "restore")]
    pub restore_path: Option<PathBuf>,
}

impl Config {
    /// Defaults for merging `project_root` into `merged_output.txt` inside it.
    pub fn new(project_root: PathBuf) -> Self {
        let output = OutputSink::File(project_root.join(DEFAULT_OUTPUT_NAME));
        Self {
            selection: Vec::new(),
            project_root,
            output,
            respect_gitignore: true,
            min_selections: 1,
            verbosity: 0,
            quiet: false,
            #[cfg(feature = "restore")]
            restore_input: None,
            #[cfg(feature = "restore")]
            restore_path: None,
        }
    }
}

fn build_command() -> Command {
    let command = Command::new("filemerge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Merges files and folders into one document with a directory tree summary")
        .arg(
            Arg::new("paths")
                .value_name("PATHS")
                .help("Files or directories to merge (defaults to the whole root)")
                .num_args(1..),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("DIR")
                .help("Workspace root used for relative paths and .gitignore (defaults to the current directory)")
                .num_args(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Sets the output file path, '-' for stdout")
                .num_args(1),
        )
        .arg(
            Arg::new("clipboard")
                .long("clipboard")
                .help("Copies the merged document to the clipboard instead of writing a file")
                .action(ArgAction::SetTrue)
                .conflicts_with("output"),
        )
        .arg(
            Arg::new("no-gitignore")
                .long("no-gitignore")
                .help("Includes files matched by the root .gitignore")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("min-selections")
                .long("min-selections")
                .value_name("N")
                .help("Minimum number of paths that must be selected")
                .value_parser(value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increases log output (repeat for more)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only reports errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        );

    #[cfg(feature = "restore")]
    let command = command
        .arg(
            Arg::new("restore")
                .long("restore")
                .value_name("FILE")
                .help("Restores files from a merged document instead of merging")
                .num_args(1)
                .conflicts_with_all(["paths", "output", "clipboard"]),
        )
        .arg(
            Arg::new("restore-path")
                .long("restore-path")
                .value_name("DIR")
                .help("Directory to restore files into (defaults to the current directory)")
                .num_args(1)
                .requires("restore"),
        );

    command
}

pub fn parse_args() -> Result<Config> {
    parse_from(std::env::args_os())
}

pub fn parse_from<I, T>(args: I) -> Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;

    let project_root = matches
        .get_one::<String>("root")
        .map(|r| cwd.join(r))
        .unwrap_or_else(|| cwd.clone());

    let mut config = Config::new(project_root);

    config.output = if matches.get_flag("clipboard") {
        OutputSink::Clipboard
    } else {
        match matches.get_one::<String>("output").map(String::as_str) {
            Some("-") => OutputSink::Stdout,
            Some(path) => OutputSink::File(cwd.join(path)),
            None => config.output,
        }
    };

    config.selection = matches
        .get_many::<String>("paths")
        .map(|vals| vals.map(|s| cwd.join(s)).collect())
        .unwrap_or_default();

    config.respect_gitignore = !matches.get_flag("no-gitignore");
    config.min_selections = matches
        .get_one::<usize>("min-selections")
        .copied()
        .unwrap_or(1);
    config.verbosity = matches.get_count("verbose");
    config.quiet = matches.get_flag("quiet");

    #[cfg(feature = "restore")]
    {
        config.restore_input = matches.get_one::<String>("restore").map(|p| cwd.join(p));
        config.restore_path = matches.get_one::<String>("restore-path").map(|p| cwd.join(p));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        build_command().debug_assert();
    }

    #[test]
    fn defaults_to_file_in_root() {
        let config = parse_from(["filemerge", "--root", "/tmp/proj"]).unwrap();
        assert_eq!(config.project_root, PathBuf::from("/tmp/proj"));
        assert_eq!(
            config.output,
            OutputSink::File(PathBuf::from("/tmp/proj/merged_output.txt"))
        );
        assert!(config.respect_gitignore);
        assert!(config.selection.is_empty());
    }

    #[test]
    fn dash_output_means_stdout() {
        let config = parse_from(["filemerge", "-o", "-", "a.rs"]).unwrap();
        assert_eq!(config.output, OutputSink::Stdout);
        assert_eq!(config.selection.len(), 1);
        assert!(config.selection[0].is_absolute());
    }

    #[test]
    fn flags_are_parsed() {
        let config = parse_from([
            "filemerge",
            "--clipboard",
            "--no-gitignore",
            "--min-selections",
            "2",
            "-vv",
            "a",
            "b",
        ])
        .unwrap();
        assert_eq!(config.output, OutputSink::Clipboard);
        assert!(!config.respect_gitignore);
        assert_eq!(config.min_selections, 2);
        assert_eq!(config.verbosity, 2);
        assert_eq!(config.selection.len(), 2);
    }
}
