// ============================================================================
// INPUT READER
// ============================================================================

use std::io::{self, BufRead, BufReader, Read};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use tracing::{debug, info, trace, warn};

use crate::error::InstrumentError;
use crate::field::FieldSet;
use crate::protocol::parse_line;

/// Updates buffered between the reader and the render loop. A full queue
/// blocks the reader, which in turn backs up the producer's pipe.
pub const INPUT_QUEUE_DEPTH: usize = 256;

/// Counters for one run of the reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    pub accepted: u64,
    pub skipped: u64,
}

/// Read `reader` line by line on a dedicated thread.
///
/// Each line carrying at least one usable field is sent as one `FieldSet`.
/// The channel disconnects when the input ends; the receiver keeps whatever
/// it already has.
pub fn spawn_line_reader<R>(reader: R) -> Result<Receiver<FieldSet>, InstrumentError>
where
    R: Read + Send + 'static,
{
    let (sender, receiver) = mpsc::sync_channel(INPUT_QUEUE_DEPTH);
    thread::Builder::new()
        .name("dialfeed-input".to_string())
        .spawn(move || {
            let stats = pump_lines(BufReader::new(reader), &sender);
            info!(
                accepted = stats.accepted,
                skipped = stats.skipped,
                "input stream closed; display keeps its last state"
            );
        })
        .map_err(InstrumentError::InputThread)?;
    Ok(receiver)
}

/// Parse every line of `reader` into `sender` until end of input, a read
/// failure, or the receiving side going away.
pub fn pump_lines<R: BufRead>(mut reader: R, sender: &SyncSender<FieldSet>) -> LineStats {
    let mut stats = LineStats::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(error = %err, "failed to read input");
                break;
            }
        }

        let Ok(line) = std::str::from_utf8(&buf) else {
            debug!("skipping line that is not valid UTF-8");
            stats.skipped += 1;
            continue;
        };
        let fields = parse_line(line);
        if fields.is_empty() {
            trace!(line = line.trim_end(), "no usable fields");
            stats.skipped += 1;
            continue;
        }

        trace!(?fields, "update");
        stats.accepted += 1;
        if sender.send(fields).is_err() {
            debug!("render loop gone, stopping input");
            break;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn pump_forwards_only_usable_lines() {
        let (tx, rx) = mpsc::sync_channel(16);
        let input = "needle1=5\n\nnonsense\n42\nneedle1=abc needle2=30\n";
        let stats = pump_lines(Cursor::new(input), &tx);
        assert_eq!(stats, LineStats { accepted: 3, skipped: 2 });

        let updates: Vec<_> = rx.try_iter().collect();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].get(Field::Needle1), Some(5.0));
        assert_eq!(updates[1].get(Field::Readout), Some(42.0));
        assert_eq!(updates[2].get(Field::Needle1), None);
        assert_eq!(updates[2].get(Field::Needle2), Some(30.0));
    }

    #[test]
    fn last_line_without_newline_is_still_read() {
        let (tx, rx) = mpsc::sync_channel(16);
        pump_lines(Cursor::new("needle2=7"), &tx);
        assert_eq!(rx.try_recv().ok().and_then(|f| f.get(Field::Needle2)), Some(7.0));
    }

    #[test]
    fn invalid_utf8_line_is_skipped_not_fatal() {
        let (tx, rx) = mpsc::sync_channel(16);
        let mut input = b"needle1=1\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);
        input.extend_from_slice(b"needle1=2\n");
        let stats = pump_lines(Cursor::new(input), &tx);
        assert_eq!(stats, LineStats { accepted: 2, skipped: 1 });
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn stops_when_the_receiver_is_dropped() {
        let (tx, rx) = mpsc::sync_channel(16);
        drop(rx);
        let stats = pump_lines(Cursor::new("1\n2\n3\n"), &tx);
        assert_eq!(stats.accepted, 1);
    }

    #[test]
    fn reader_thread_disconnects_at_end_of_input() {
        let rx = spawn_line_reader(Cursor::new("needle1=1\nneedle1=2\n")).unwrap();
        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.get(Field::Needle1), Some(1.0));
        assert_eq!(second.get(Field::Needle1), Some(2.0));
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_err());
    }

    #[test]
    fn reader_holds_back_once_the_queue_is_full() {
        let total = INPUT_QUEUE_DEPTH * 4;
        let input: String = (0..total).map(|i| format!("needle1={i}\n")).collect();
        let rx = spawn_line_reader(Cursor::new(input)).unwrap();

        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_iter().count() <= INPUT_QUEUE_DEPTH + 1);

        let mut last = None;
        while let Ok(update) = rx.recv_timeout(Duration::from_secs(5)) {
            last = update.get(Field::Needle1);
        }
        assert_eq!(last, Some((total - 1) as f64));
    }
}
