use crate::exec::command::{LineSink, StreamKind};
use std::io::{self, BufRead, BufReader, Read};
use std::sync::mpsc;
use std::thread;

/// Read both pipes to the end, forwarding whole lines to `sink` and returning copies of the
/// bytes read as `(stdout, stderr)`.
///
/// Each pipe gets its own reader thread; lines travel over a channel to the calling thread,
/// which is the only one touching `sink`, so a line is never split by output from the other
/// stream.
pub(crate) fn pump_lines<O, E>(
    stdout: O,
    stderr: E,
    sink: &mut dyn LineSink,
) -> io::Result<(Vec<u8>, Vec<u8>)>
where
    O: Read + Send + 'static,
    E: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<(StreamKind, Vec<u8>)>();

    thread::scope(|scope| {
        let out_reader = {
            let tx = tx.clone();
            scope.spawn(move || read_lines(stdout, StreamKind::Stdout, tx))
        };
        let err_reader = scope.spawn(move || read_lines(stderr, StreamKind::Stderr, tx));

        let mut captured_out = Vec::new();
        let mut captured_err = Vec::new();
        let mut sink_error = None;
        for (kind, line) in rx {
            if sink_error.is_none() {
                if let Err(e) = sink.line(kind, &line) {
                    sink_error = Some(e);
                }
            }
            match kind {
                StreamKind::Stdout => captured_out.extend_from_slice(&line),
                StreamKind::Stderr => captured_err.extend_from_slice(&line),
            }
        }

        for reader in [out_reader, err_reader] {
            reader
                .join()
                .map_err(|_| io::Error::other("output reader thread panicked"))??;
        }
        match sink_error {
            Some(e) => Err(e),
            None => Ok((captured_out, captured_err)),
        }
    })
}

fn read_lines<R: Read>(
    pipe: R,
    kind: StreamKind,
    tx: mpsc::Sender<(StreamKind, Vec<u8>)>,
) -> io::Result<()> {
    let mut reader = BufReader::new(pipe);
    loop {
        let mut line = Vec::new();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        // The receiver only goes away once both readers are done.
        let _ = tx.send((kind, line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Default)]
    struct Recorder(Vec<(StreamKind, String)>);

    impl LineSink for Recorder {
        fn line(&mut self, stream: StreamKind, line: &[u8]) -> io::Result<()> {
            self.0.push((stream, String::from_utf8_lossy(line).into_owned()));
            Ok(())
        }
    }

    #[test]
    fn test_lines_are_delivered_whole() {
        let mut sink = Recorder::default();
        let (out, err) = pump_lines(
            Cursor::new(b"one\ntwo\nthree".to_vec()),
            Cursor::new(b"oops\n".to_vec()),
            &mut sink,
        )
        .unwrap();

        assert_eq!(out, b"one\ntwo\nthree");
        assert_eq!(err, b"oops\n");

        let stdout_lines: Vec<&str> = sink
            .0
            .iter()
            .filter(|(k, _)| *k == StreamKind::Stdout)
            .map(|(_, l)| l.as_str())
            .collect();
        assert_eq!(stdout_lines, ["one\n", "two\n", "three"]);
        assert!(sink.0.contains(&(StreamKind::Stderr, "oops\n".to_string())));
    }

    #[test]
    fn test_sink_error_is_reported_after_draining() {
        struct Failing;
        impl LineSink for Failing {
            fn line(&mut self, _: StreamKind, _: &[u8]) -> io::Result<()> {
                Err(io::Error::other("closed"))
            }
        }

        let res = pump_lines(
            Cursor::new(b"a\nb\n".to_vec()),
            Cursor::new(Vec::new()),
            &mut Failing,
        );
        assert!(res.is_err());
    }
}
