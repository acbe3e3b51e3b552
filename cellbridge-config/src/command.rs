use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use crate::buffer::ExternalBuffer;
use crate::codec::ConfigCodec;
use crate::error::CodecError;

/// Runs an external program as the config codec.
///
/// The program is invoked as `program [args..] boc-to-json <param>` or
/// `program [args..] json-to-boc <param>`, reads the input on stdin and
/// writes the result on stdout. A non-zero exit is a codec failure.
#[derive(Debug, Clone)]
pub struct CommandCodec {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandCodec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Creates a codec with fixed leading arguments.
    pub fn with_args(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn run(&self, direction: &str, input: &str, param: i32) -> Result<ExternalBuffer, CodecError> {
        debug!(program = %self.program.display(), direction, param, "running config codec");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(direction)
            .arg(param.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from a second thread while the output is drained; the
        // pipe closes when the writer finishes, signalling end of input.
        let stdin = child.stdin.take();
        let (written, output) = thread::scope(|scope| {
            let writer = stdin.map(|mut stdin| scope.spawn(move || stdin.write_all(input.as_bytes())));
            let output = child.wait_with_output();
            let written = match writer.map(|w| w.join()) {
                None | Some(Ok(Ok(()))) => Ok(()),
                Some(Ok(Err(e))) => Err(e),
                Some(Err(_)) => Err(io::Error::other("stdin writer panicked")),
            };
            (written, output)
        });
        let output = output?;

        if !output.status.success() {
            return Err(CodecError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        match written {
            // The program may finish without consuming all of its input.
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e.into()),
            _ => {}
        }

        let text = String::from_utf8(output.stdout)?;
        Ok(ExternalBuffer::owned(text.trim()))
    }
}

impl ConfigCodec for CommandCodec {
    fn boc_to_json(&self, boc: &str, param: i32) -> Result<ExternalBuffer, CodecError> {
        self.run("boc-to-json", boc, param)
    }

    fn json_to_boc(&self, json: &str, param: i32) -> Result<ExternalBuffer, CodecError> {
        self.run("json-to-boc", json, param)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> CommandCodec {
        CommandCodec::with_args("sh", vec!["-c".into(), script.into(), "codec".into()])
    }

    #[test]
    fn passes_direction_param_and_stdin() {
        let codec = shell(r#"input=$(cat); printf '{"p%s":"%s:%s"}\n' "$2" "$1" "$input""#);
        let buffer = codec.boc_to_json("AAAA", 34).unwrap();
        assert_eq!(buffer.as_str().unwrap(), r#"{"p34":"boc-to-json:AAAA"}"#);

        let buffer = codec.json_to_boc("{}", -1).unwrap();
        assert_eq!(buffer.as_str().unwrap(), r#"{"p-1":"json-to-boc:{}"}"#);
    }

    #[test]
    fn non_zero_exit_is_failure() {
        let codec = shell("cat >/dev/null; echo 'unknown param' >&2; exit 3");
        match codec.boc_to_json("AAAA", 12) {
            Err(CodecError::Failed { stderr, .. }) => assert_eq!(stderr, "unknown param"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn failure_without_reading_input_keeps_stderr() {
        let codec = shell("echo 'unknown param 999' >&2; exit 3");
        let input = "A".repeat(1 << 20);
        match codec.boc_to_json(&input, 999) {
            Err(CodecError::Failed { status, stderr }) => {
                assert!(status.contains('3'));
                assert_eq!(stderr, "unknown param 999");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn large_stderr_before_reading_input() {
        let codec = shell("head -c 200000 /dev/zero >&2; cat");
        let input = "B".repeat(200_000);
        let buffer = codec.json_to_boc(&input, 0).unwrap();
        assert_eq!(buffer.as_str().unwrap(), input);
    }

    #[test]
    fn large_output_round_trip() {
        let codec = shell("cat");
        let input = "C".repeat(1 << 20);
        let buffer = codec.boc_to_json(&input, 0).unwrap();
        assert_eq!(buffer.as_str().unwrap().len(), input.len());
    }

    #[test]
    fn missing_program_is_io_error() {
        let codec = CommandCodec::new("/nonexistent/cellbridge-codec");
        assert!(matches!(
            codec.json_to_boc("{}", 0),
            Err(CodecError::Io(_))
        ));
    }
}
