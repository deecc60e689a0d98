use std::{
    fs::File,
    io::{BufReader, BufWriter, Read},
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Context, Result};
use cloudshape_core::{
    containers::PointCloud,
    error::{self, PipelineError},
};
use log::{debug, info};
use tempfile::TempDir;

use super::xyz_export_pipeline;
use crate::{ascii::parse_xyz, base::PointCloudReader, settings::ReaderSettings};

const PIPELINE_FILE_NAME: &str = "pipeline.json";
const POINTS_FILE_NAME: &str = "points.csv";
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// `PointCloudReader` that runs `pdal pipeline` as a subprocess
///
/// The tool is invoked as `<command> <args...> <pipeline file>` and must write the points to
/// `points.csv` next to the pipeline file. It is killed if it does not finish within the timeout.
#[derive(Debug, Clone)]
pub struct PdalReader {
    command: String,
    args: Vec<String>,
    timeout: Duration,
    temp_root: Option<PathBuf>,
}

impl PdalReader {
    pub fn new(settings: &ReaderSettings) -> Self {
        Self {
            command: settings.command.clone(),
            args: settings.args.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            temp_root: settings.temp_dir.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Temporary directory for one read. The prefix carries the input file stem (the class name) so that
    /// concurrent runs are easy to tell apart, the random suffix keeps them from colliding
    fn make_temp_dir(&self, input: &Path) -> Result<TempDir> {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prefix = format!("cloudshape_{}_", stem);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.context("Could not create temporary directory for point extraction")
    }

    fn write_pipeline(&self, input: &Path, dir: &Path) -> Result<PathBuf> {
        let pipeline_path = dir.join(PIPELINE_FILE_NAME);
        let pipeline = xyz_export_pipeline(input, &dir.join(POINTS_FILE_NAME));
        let writer = BufWriter::new(File::create(&pipeline_path)?);
        serde_json::to_writer_pretty(writer, &pipeline)
            .with_context(|| format!("Could not write {}", pipeline_path.display()))?;
        Ok(pipeline_path)
    }

    /// Waits for `child` to exit. Returns `None` if the timeout elapsed first, the child is killed then
    fn wait_with_timeout(&self, child: &mut Child) -> Result<Option<ExitStatus>> {
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(Some(status)),
                Ok(None) => {}
                Err(e) => {
                    let _ = child.kill();
                    return Err(e.into());
                }
            }
            if start.elapsed() >= self.timeout {
                // the process may have exited in the meantime, in which case kill fails harmlessly
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Runs the tool on `pipeline_path`. An unsuccessful exit is reported together with its stderr output
    fn run_tool(&self, pipeline_path: &Path) -> Result<()> {
        debug!("Running {} {:?} {}", self.command, self.args, pipeline_path.display());
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg(pipeline_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Could not start {}", self.command))?;

        // drain stderr concurrently so a chatty tool can not block on a full pipe
        let stderr = child.stderr.take();
        let stderr_reader = thread::spawn(move || {
            let mut output = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut output);
            }
            output
        });

        let status = self.wait_with_timeout(&mut child);
        let stderr_output = stderr_reader.join();
        let status = match status? {
            Some(status) => status,
            None => bail!("{} did not finish within {:?}", self.command, self.timeout),
        };
        let stderr_output =
            stderr_output.map_err(|_| anyhow!("stderr reader of {} panicked", self.command))?;
        if !status.success() {
            bail!("{} exited with {}: {}", self.command, status, stderr_output.trim());
        }
        Ok(())
    }
}

impl Default for PdalReader {
    fn default() -> Self {
        Self::new(&ReaderSettings::default())
    }
}

impl PointCloudReader for PdalReader {
    fn read(&self, path: &Path) -> error::Result<PointCloud> {
        if !path.is_file() {
            return Err(PipelineError::load(path, "file does not exist"));
        }
        let start = Instant::now();
        let temp_dir = self
            .make_temp_dir(path)
            .map_err(|e| PipelineError::Extraction(format!("{:#}", e)))?;
        let pipeline_path = self
            .write_pipeline(path, temp_dir.path())
            .map_err(|e| PipelineError::Extraction(format!("{:#}", e)))?;
        self.run_tool(&pipeline_path)
            .map_err(|e| PipelineError::Extraction(format!("{:#}", e)))?;

        // a missing or unreadable output file is a load error, malformed content an extraction error
        let points_path = temp_dir.path().join(POINTS_FILE_NAME);
        let points_file = File::open(&points_path).map_err(|e| {
            PipelineError::load(path, format!("no readable output {}: {}", points_path.display(), e))
        })?;
        let cloud = parse_xyz(BufReader::new(points_file), ',').map_err(|e| {
            PipelineError::Extraction(format!(
                "{} wrote invalid points for {}: {:#}",
                self.command,
                path.display(),
                e
            ))
        })?;
        info!(
            "Extracted {} points from {} in {:.2}s",
            cloud.len(),
            path.display(),
            start.elapsed().as_secs_f64()
        );
        Ok(cloud)
    }

    fn extension(&self) -> &str {
        "laz"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings_for(command: &str, args: &[&str], timeout_secs: u64) -> ReaderSettings {
        ReaderSettings {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout_secs,
            temp_dir: None,
        }
    }

    fn dummy_input(dir: &Path) -> PathBuf {
        let input = dir.join("6_Buildings.laz");
        File::create(&input).unwrap().write_all(b"not really a laz file").unwrap();
        input
    }

    #[test]
    fn test_missing_input_is_load_error() {
        let reader = PdalReader::default();
        let result = reader.read(Path::new("/definitely/not/here.laz"));
        assert!(matches!(result, Err(PipelineError::Load { .. })));
    }

    #[test]
    fn test_missing_tool_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dummy_input(dir.path());
        let reader = PdalReader::new(&settings_for("cloudshape-no-such-tool", &["pipeline"], 5));
        assert!(matches!(reader.read(&input), Err(PipelineError::Extraction(_))));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;

        /// Writes a shell script standing in for pdal and returns its path
        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake_pdal.sh");
            let mut file = File::create(&path).unwrap();
            writeln!(file, "{}", body).unwrap();
            path
        }

        /// The script is run as `sh <script> pipeline <pipeline file>`
        fn reader_with_temp_root(script: &Path, timeout_secs: u64, temp_root: &Path) -> PdalReader {
            let mut settings = settings_for("sh", &[script.to_str().unwrap(), "pipeline"], timeout_secs);
            settings.temp_dir = Some(temp_root.to_path_buf());
            PdalReader::new(&settings)
        }

        #[test]
        fn test_successful_extraction_cleans_up() {
            let dir = tempfile::tempdir().unwrap();
            let temp_root = tempfile::tempdir().unwrap();
            let input = dummy_input(dir.path());
            let command = script(
                dir.path(),
                r#"printf '1.0,2.0,3.0\n4.0,5.0,6.0\n' > "$(dirname "$2")/points.csv""#,
            );
            let reader = reader_with_temp_root(&command, 10, temp_root.path());
            let cloud = reader.read(&input).unwrap();
            assert_eq!(cloud.len(), 2);
            assert_eq!(std::fs::read_dir(temp_root.path()).unwrap().count(), 0);
        }

        #[test]
        fn test_failing_tool_reports_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let temp_root = tempfile::tempdir().unwrap();
            let input = dummy_input(dir.path());
            let command = script(dir.path(), "echo 'unable to open stream' >&2\nexit 3");
            let reader = reader_with_temp_root(&command, 10, temp_root.path());
            match reader.read(&input) {
                Err(PipelineError::Extraction(message)) => {
                    assert!(message.contains("unable to open stream"))
                }
                other => panic!("unexpected result {:?}", other.map(|c| c.len())),
            }
            assert_eq!(std::fs::read_dir(temp_root.path()).unwrap().count(), 0);
        }

        #[test]
        fn test_timeout_kills_tool() {
            let dir = tempfile::tempdir().unwrap();
            let input = dummy_input(dir.path());
            // exec so that killing the shell also closes its stderr
            let command = script(dir.path(), "exec sleep 10");
            let reader = reader_with_temp_root(&command, 1, dir.path());
            let start = Instant::now();
            match reader.read(&input) {
                Err(PipelineError::Extraction(message)) => assert!(message.contains("did not finish")),
                other => panic!("unexpected result {:?}", other.map(|c| c.len())),
            }
            assert!(start.elapsed() < Duration::from_secs(8));
        }

        #[test]
        fn test_timeout_after_stderr_output() {
            let dir = tempfile::tempdir().unwrap();
            let input = dummy_input(dir.path());
            let command = script(dir.path(), "echo 'reading points' >&2\nexec sleep 10");
            let reader = reader_with_temp_root(&command, 1, dir.path());
            let start = Instant::now();
            match reader.read(&input) {
                Err(PipelineError::Extraction(message)) => assert!(message.contains("did not finish")),
                other => panic!("unexpected result {:?}", other.map(|c| c.len())),
            }
            // the stderr reader is joined once the killed tool closed its pipe
            assert!(start.elapsed() < Duration::from_secs(8));
        }

        #[test]
        fn test_malformed_output_is_extraction_error() {
            let dir = tempfile::tempdir().unwrap();
            let input = dummy_input(dir.path());
            let command = script(
                dir.path(),
                r#"printf '1.0,2.0,3.0\nnot,a,point\n' > "$(dirname "$2")/points.csv""#,
            );
            let reader = reader_with_temp_root(&command, 10, dir.path());
            match reader.read(&input) {
                Err(PipelineError::Extraction(message)) => assert!(message.contains("invalid points")),
                other => panic!("unexpected result {:?}", other.map(|c| c.len())),
            }
        }

        #[test]
        fn test_missing_output_is_load_error() {
            let dir = tempfile::tempdir().unwrap();
            let input = dummy_input(dir.path());
            let command = script(dir.path(), "exit 0");
            let reader = reader_with_temp_root(&command, 10, dir.path());
            assert!(matches!(reader.read(&input), Err(PipelineError::Load { .. })));
        }
    }
}
