/*!
Wrappers around the ROS command line tools.

Bags are never decoded here: `rostopic echo` renders the recorded messages as
text for [`crate::parser`], and the export direction hands rendered field
blocks to `rostopic pub` while `rosbag record` captures them.
 */
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::error::{Error, Result};
use crate::topics::Topic;

#[derive(Debug, Clone)]
pub struct RosTools {
    rostopic: String,
    rosbag: String,
}

impl Default for RosTools {
    fn default() -> Self {
        Self::with_programs("rostopic", "rosbag")
    }
}

impl RosTools {
    /// Uses the given executables instead of the ones on `PATH`.
    pub fn with_programs(rostopic: &str, rosbag: &str) -> Self {
        Self {
            rostopic: rostopic.to_string(),
            rosbag: rosbag.to_string(),
        }
    }

    /// Text of the first message recorded on `topic`.
    pub fn echo(&self, bag: &Path, topic: Topic) -> Result<String> {
        let args: [&OsStr; 6] = [
            "echo".as_ref(),
            "-b".as_ref(),
            bag.as_os_str(),
            "-n".as_ref(),
            "1".as_ref(),
            topic.name.as_ref(),
        ];
        run(&self.rostopic, &args)
    }

    /// `rosbag info` summary, topics and message types included.
    pub fn info(&self, bag: &Path) -> Result<String> {
        run(&self.rosbag, &["info".as_ref(), bag.as_os_str()])
    }

    /// Publishes the message body stored in `file` once.
    pub fn publish(&self, topic: Topic, file: &Path) -> Result<()> {
        let args: [&OsStr; 6] = [
            "pub".as_ref(),
            "-1".as_ref(),
            "-f".as_ref(),
            file.as_os_str(),
            topic.name.as_ref(),
            topic.message_type.as_ref(),
        ];
        run(&self.rostopic, &args).map(|_| ())
    }

    /// Starts recording `topics` into `output`.
    pub fn record(&self, output: &Path, topics: &[Topic]) -> Result<Recorder> {
        let mut command = Command::new(&self.rosbag);
        command.arg("record").arg("-O").arg(output);
        command.args(topics.iter().map(|topic| topic.name));
        command.stdin(Stdio::null()).stdout(Stdio::null());
        log::debug!("spawning {:?}", command);
        let child = command.spawn().map_err(|err| Error::Tool {
            tool: self.rosbag.clone(),
            message: err.to_string(),
        })?;
        Ok(Recorder {
            tool: self.rosbag.clone(),
            child: Some(child),
        })
    }
}

fn run(program: &str, args: &[&OsStr]) -> Result<String> {
    let mut command = Command::new(program);
    command.args(args);
    log::debug!("running {:?}", command);
    let output = command.output().map_err(|err| Error::Tool {
        tool: program.to_string(),
        message: err.to_string(),
    })?;
    if !output.status.success() {
        return Err(Error::Tool {
            tool: program.to_string(),
            message: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// A running `rosbag record`. Stopped with SIGINT so the bag gets closed
/// properly; dropping the recorder stops it too.
#[derive(Debug)]
pub struct Recorder {
    tool: String,
    child: Option<Child>,
}

impl Recorder {
    /// Fails when the recorder is no longer running.
    pub fn check(&mut self) -> Result<()> {
        let Some(child) = self.child.as_mut() else {
            return Err(self.exited("already stopped".to_string()));
        };
        match child.try_wait()? {
            Some(status) => {
                self.child = None;
                Err(self.exited(format!("exited early with {}", status)))
            }
            None => Ok(()),
        }
    }

    /// Stops the recorder. Fails when it had already exited on its own with
    /// a failure status, in which case no bag was written.
    pub fn stop(mut self) -> Result<()> {
        self.interrupt()
    }

    fn exited(&self, message: String) -> Error {
        Error::Tool {
            tool: self.tool.clone(),
            message,
        }
    }

    fn interrupt(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if let Some(status) = child.try_wait()? {
            if !status.success() {
                return Err(self.exited(format!("exited early with {}", status)));
            }
            log::debug!("{} already exited with {}", self.tool, status);
            return Ok(());
        }
        let signalled = Command::new("kill")
            .args(["-INT", &child.id().to_string()])
            .status()
            .map(|status| status.success())
            .unwrap_or(false);
        if !signalled {
            log::warn!("could not interrupt {}, killing it", self.tool);
            child.kill()?;
        }
        let status = child.wait()?;
        log::debug!("{} exited with {}", self.tool, status);
        Ok(())
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Err(err) = self.interrupt() {
            log::error!("failed to stop {}: {}", self.tool, err);
        }
    }
}
