//! Line input for the console front end.

use std::io::{self, BufRead};
use std::thread;

use tokio::sync::mpsc;

/// Lines buffered between the reader thread and the consumer.
const LINE_BUFFER: usize = 64;

/// Reads `reader` line by line on a dedicated OS thread.
///
/// The thread is detached and outside any tokio runtime, so a read blocked
/// on an idle terminal never delays runtime or process shutdown. The channel
/// closes at end of input, after the first read error, or when the next line
/// arrives after the receiver was dropped.
pub fn spawn_line_reader<R>(reader: R) -> io::Result<mpsc::Receiver<io::Result<String>>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);

    thread::Builder::new()
        .name("line-reader".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        })?;

    Ok(rx)
}
