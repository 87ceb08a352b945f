//! Command-line interface

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{BenchmarkConfig, ConfigFile, RemoteParams, RunMode};
use crate::{Result, DEFAULT_LOOP_COUNT};

/// File read/write latency benchmark for GridFS.
///
/// Times repeated writes and reads of each listed file against a
/// GridFS-backed mount, against GridFS through the driver, or both, and
/// prints one tab-separated record per trial.
#[derive(Parser, Debug)]
#[command(name = "gridbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend(s) to benchmark.
    #[arg(long, value_enum)]
    pub run: RunMode,

    /// Directory the listed files are read from [default: .]
    #[arg(long)]
    pub srcdir: Option<PathBuf>,

    /// Mounted destination directory (mounted mode).
    #[arg(long)]
    pub destdir: Option<PathBuf>,

    /// Database server host (direct mode).
    #[arg(long, env = "GRIDBENCH_SERVER")]
    pub server: Option<String>,

    /// Database server port (direct mode).
    #[arg(long, env = "GRIDBENCH_PORT")]
    pub port: Option<u16>,

    /// Database name (direct mode).
    #[arg(long, env = "GRIDBENCH_DB")]
    pub db: Option<String>,

    /// GridFS bucket name (direct mode).
    #[arg(long, env = "GRIDBENCH_COLLPREFIX")]
    pub collprefix: Option<String>,

    /// Comma-separated file names under the source directory.
    #[arg(long, required = true, value_delimiter = ',')]
    pub files: Vec<String>,

    /// Write and read repetitions per file [default: 100]
    #[arg(long)]
    pub loopcnt: Option<u32>,

    /// Statistics output file; standard output when omitted.
    #[arg(long)]
    pub outfile: Option<PathBuf>,

    /// Per-trial timeout, e.g. "30s" or "2m".
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Write a JSON summary of the run to this path.
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Defaults file; the standard location is used when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Build the run configuration, filling gaps from the defaults file
    pub fn into_config(self) -> Result<BenchmarkConfig> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::load_default()?,
        };
        self.merge(file)
    }

    /// Combine with `file`; command-line values win
    pub fn merge(self, file: ConfigFile) -> Result<BenchmarkConfig> {
        let timeout = match self.timeout {
            Some(timeout) => Some(timeout),
            None => file.timeout()?,
        };

        let files: Vec<String> = self
            .files
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect();

        let remote = RemoteParams {
            server: self.server.or(file.server),
            port: self.port.or(file.port),
            db: self.db.or(file.db),
            coll_prefix: self.collprefix.or(file.collprefix),
        };

        let mut config = BenchmarkConfig::new(self.run)
            .with_src_dir(
                self.srcdir
                    .or(file.srcdir)
                    .unwrap_or_else(|| PathBuf::from(".")),
            )
            .with_remote(remote)
            .with_files(files)
            .with_loop_count(self.loopcnt.or(file.loopcnt).unwrap_or(DEFAULT_LOOP_COUNT));

        if let Some(dest) = self.destdir.or(file.destdir) {
            config = config.with_dest_dir(dest);
        }
        if let Some(outfile) = self.outfile {
            config = config.with_outfile(outfile);
        }
        if let Some(timeout) = timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(summary) = self.summary {
            config = config.with_summary_path(summary);
        }
        config.verbose = self.verbose;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gridbench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_example_invocation() {
        let cli = parse(&[
            "--run", "mounted", "--srcdir", "/tmp/src", "--destdir", "/mnt/fs", "--files",
            "sample.txt", "--loopcnt", "3",
        ]);
        let config = cli.merge(ConfigFile::default()).unwrap();

        assert_eq!(config.mode, RunMode::Mounted);
        assert_eq!(config.src_dir, PathBuf::from("/tmp/src"));
        assert_eq!(config.dest_dir, Some(PathBuf::from("/mnt/fs")));
        assert_eq!(config.files, vec!["sample.txt"]);
        assert_eq!(config.loop_count, 3);
        assert!(config.outfile.is_none());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_defaults_and_file_order() {
        let cli = parse(&["--run", "direct", "--files", "b.bin, a.bin,,c.bin"]);
        let config = cli.merge(ConfigFile::default()).unwrap();
        assert_eq!(config.files, vec!["b.bin", "a.bin", "c.bin"]);
        assert_eq!(config.loop_count, DEFAULT_LOOP_COUNT);
        assert_eq!(config.src_dir, PathBuf::from("."));
        assert_eq!(config.mode.backends(), &[Backend::Direct]);
    }

    #[test]
    fn test_legacy_mode_names() {
        assert_eq!(parse(&["--run", "mgridfs", "--files", "a"]).run, RunMode::Mounted);
        assert_eq!(parse(&["--run", "gridfs", "--files", "a"]).run, RunMode::Direct);
        assert_eq!(parse(&["--run", "both", "--files", "a"]).run, RunMode::Both);
    }

    #[test]
    fn test_required_arguments() {
        assert!(Cli::try_parse_from(["gridbench", "--files", "a"]).is_err());
        assert!(Cli::try_parse_from(["gridbench", "--run", "mounted"]).is_err());
        assert!(Cli::try_parse_from(["gridbench", "--run", "sideways", "--files", "a"]).is_err());
    }

    #[test]
    fn test_timeout_syntax() {
        let cli = parse(&["--run", "mounted", "--files", "a", "--timeout", "1m 30s"]);
        assert_eq!(cli.timeout, Some(Duration::from_secs(90)));
        let bad = ["gridbench", "--run", "mounted", "--files", "a", "--timeout", "soon"];
        assert!(Cli::try_parse_from(bad).is_err());
    }

    #[test]
    fn test_connection_params_read_from_environment() {
        let command = Cli::command();
        let env_of = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .and_then(|name| name.to_str())
                .map(String::from)
        };
        assert_eq!(env_of("server").as_deref(), Some("GRIDBENCH_SERVER"));
        assert_eq!(env_of("port").as_deref(), Some("GRIDBENCH_PORT"));
        assert_eq!(env_of("db").as_deref(), Some("GRIDBENCH_DB"));
        assert_eq!(env_of("collprefix").as_deref(), Some("GRIDBENCH_COLLPREFIX"));
    }

    #[test]
    fn test_command_line_overrides_file() {
        let file = ConfigFile::parse(
            r#"
            server = "file-host"
            port = 27018
            db = "perf"
            collprefix = "bench"
            loopcnt = 7
            timeout = "5s"
            "#,
        )
        .unwrap();
        let cli = parse(&[
            "--run", "direct", "--files", "a", "--server", "cli-host", "--loopcnt", "2",
        ]);
        let config = cli.merge(file).unwrap();

        let params = config.remote.resolve().unwrap();
        assert_eq!(params.server, "cli-host");
        assert_eq!(params.port, 27018);
        assert_eq!(params.coll_prefix, "bench");
        assert_eq!(config.loop_count, 2);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }
}
