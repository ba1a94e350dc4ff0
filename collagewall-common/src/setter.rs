use crate::error::SetterError;
use crate::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

/// OS-facing wallpaper application, injected so the engine is testable
/// without touching the desktop.
pub trait WallpaperSetter {
    fn set(&self, target: &str, image: &Path) -> Result<()>;
}

/// Applies wallpapers by invoking an external command with the image
/// path as the final argument.
#[derive(Debug, Clone)]
pub struct CommandSetter {
    command: String,
    args: Vec<String>,
}

impl CommandSetter {
    pub fn new(command: String, args: Vec<String>) -> Self {
        Self { command, args }
    }
}

impl WallpaperSetter for CommandSetter {
    fn set(&self, target: &str, image: &Path) -> Result<()> {
        let resolved = which::which(&self.command).map_err(|_| SetterError::CommandNotFound {
            command: self.command.clone(),
        })?;

        let mut cmd = Command::new(&resolved);
        cmd.args(&self.args);
        cmd.arg(image);

        log::debug!("Applying wallpaper for {}: {:?}", target, cmd);

        let output = cmd.output().map_err(|e| SetterError::Execution {
            command: format!("{:?}", cmd),
            source: e,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!(
                "Wallpaper command failed with exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr
            );
            return Err(SetterError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.to_string(),
            }
            .into());
        }

        log::info!("Applied wallpaper for {}: {:?}", target, image);
        Ok(())
    }
}

/// Records calls instead of touching the OS. Test support.
#[derive(Debug, Default)]
pub struct RecordingSetter {
    calls: Mutex<Vec<(String, PathBuf)>>,
}

impl RecordingSetter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.lock().expect("recording setter lock").clone()
    }
}

impl WallpaperSetter for RecordingSetter {
    fn set(&self, target: &str, image: &Path) -> Result<()> {
        self.calls
            .lock()
            .expect("recording setter lock")
            .push((target.to_string(), image.to_path_buf()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollageError;

    #[test]
    fn test_recording_setter_records_calls() {
        let setter = RecordingSetter::new();

        setter.set("0", Path::new("/out/collage-0.bmp")).unwrap();
        setter.set("1", Path::new("/out/collage-1.bmp")).unwrap();

        let calls = setter.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "0");
        assert_eq!(calls[1].1, PathBuf::from("/out/collage-1.bmp"));
    }

    #[test]
    fn test_command_setter_missing_binary() {
        let setter = CommandSetter::new("collagewall-no-such-binary".to_string(), vec![]);

        let result = setter.set("0", Path::new("/out/collage-0.bmp"));
        assert!(matches!(
            result.unwrap_err(),
            CollageError::Setter(SetterError::CommandNotFound { .. })
        ));
    }
}
