//! Fake fetch tool for integration tests: a `/bin/sh` script that prints
//! yt-dlp-like progress, writes the file named by `-o`, and exits as told.
//!
//! The script is run as `sh <script> <args...>` (via `program_args`) so tests
//! never exec a file that was just written.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FakeTool {
    /// Exit status of the script.
    pub exit_code: i32,
    /// Whether to write the output file on success.
    pub write_file: bool,
    /// Seconds to sleep between progress lines.
    pub step_delay: &'static str,
}

impl Default for FakeTool {
    fn default() -> Self {
        Self {
            exit_code: 0,
            write_file: true,
            step_delay: "0",
        }
    }
}

impl FakeTool {
    /// Write the script into `dir` and return its path.
    pub fn install(&self, dir: &Path) -> PathBuf {
        let write = if self.write_file {
            r#"file=$(printf '%s' "$out" | sed -e 's/%(id)s/media/' -e 's/%(ext)s/mp4/')
printf 'video' > "$file""#
        } else {
            ":"
        };
        let script = format!(
            r#"#!/bin/sh
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
echo "args: $*"
echo "[youtube] media: Downloading webpage"
sleep {delay}
echo "[download]   0.0% of 1.00MiB at 1.00MiB/s ETA 00:01"
sleep {delay}
echo "[download]  45.2% of 1.00MiB at 1.00MiB/s ETA 00:01"
echo "WARNING: fake tool stderr line" >&2
sleep {delay}
echo "[download] 100.0% of 1.00MiB in 00:01"
{write}
exit {code}
"#,
            delay = self.step_delay,
            write = write,
            code = self.exit_code,
        );
        let path = dir.join("fake-fetch-tool.sh");
        std::fs::write(&path, script).expect("write fake tool");
        path
    }
}
