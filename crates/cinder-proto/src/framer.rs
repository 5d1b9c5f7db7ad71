//! Byte-stream to protocol-line framing.
//!
//! A [`LineFramer`] owns a fixed buffer of [`MAX_MESSAGE_SIZE`] bytes.
//! The connection reads straight into [`LineFramer::space`], commits with
//! [`LineFramer::advance`], then pulls complete lines out with
//! [`LineFramer::next_line`] until it reports `NeedMore`. Lines are
//! yielded without the `\n` terminator; a trailing `\r` is left for the
//! caller to strip.
//!
//! A peer that ships a full buffer with no terminator has its pending
//! bytes discarded; the framer resynchronises at the next `\n`.

use thiserror::Error;

use crate::MAX_MESSAGE_SIZE;

/// Framing violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FramingError {
    #[error("no line terminator within {} bytes", MAX_MESSAGE_SIZE)]
    Overflow,
}

/// Incremental line extractor over a fixed 512-byte buffer.
pub struct LineFramer {
    buf: [u8; MAX_MESSAGE_SIZE],
    /// One past the last byte received.
    write_pos: usize,
    /// Next byte to examine for `\n`.
    scan_pos: usize,
    /// First byte of the message currently being assembled.
    start: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            buf: [0; MAX_MESSAGE_SIZE],
            write_pos: 0,
            scan_pos: 0,
            start: 0,
        }
    }

    /// Writable tail of the buffer. Empty only when a full, terminator-less
    /// buffer is pending, which the next [`next_line`](Self::next_line)
    /// call resolves by discarding.
    pub fn space(&mut self) -> &mut [u8] {
        &mut self.buf[self.write_pos..]
    }

    /// Commit `n` bytes previously read into [`space`](Self::space).
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.write_pos + n <= MAX_MESSAGE_SIZE);
        self.write_pos += n;
    }

    /// Number of buffered bytes not yet yielded.
    pub fn pending(&self) -> usize {
        self.write_pos - self.start
    }

    /// Extract the next complete line, if any.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Returns
    /// `Err(Overflow)` after discarding a full buffer that contains no
    /// terminator; the connection stays usable.
    pub fn next_line(&mut self) -> Result<Option<&[u8]>, FramingError> {
        if let Some(rel) = self.buf[self.scan_pos..self.write_pos]
            .iter()
            .position(|&b| b == b'\n')
        {
            let nl = self.scan_pos + rel;
            let line_start = self.start;
            self.start = nl + 1;
            self.scan_pos = nl + 1;
            if self.start == self.write_pos {
                // Buffer fully consumed; rewind so the next read gets the
                // whole buffer again. The yielded slice stays intact.
                self.start = 0;
                self.scan_pos = 0;
                self.write_pos = 0;
            }
            return Ok(Some(&self.buf[line_start..nl]));
        }

        self.scan_pos = self.write_pos;

        if self.write_pos == MAX_MESSAGE_SIZE {
            if self.start == 0 {
                // 512 bytes and no terminator: drop the pending input.
                self.write_pos = 0;
                self.scan_pos = 0;
                return Err(FramingError::Overflow);
            }
            // Make room by shifting the unfinished message to the front.
            self.buf.copy_within(self.start..self.write_pos, 0);
            self.write_pos -= self.start;
            self.scan_pos -= self.start;
            self.start = 0;
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed `bytes` and collect every line the framer yields.
    fn feed(framer: &mut LineFramer, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        let mut fed = 0;
        while fed < bytes.len() {
            let space = framer.space();
            let n = space.len().min(bytes.len() - fed);
            assert!(n > 0, "framer wedged with no space");
            space[..n].copy_from_slice(&bytes[fed..fed + n]);
            framer.advance(n);
            fed += n;
            while let Some(line) = framer.next_line().unwrap_or(None) {
                out.push(line.to_vec());
            }
        }
        out
    }

    #[test]
    fn one_read_many_lines() {
        let mut f = LineFramer::new();
        let lines = feed(&mut f, b"NICK alice\r\nUSER alice 0 * :Alice\r\n");
        assert_eq!(lines, vec![b"NICK alice\r".to_vec(), b"USER alice 0 * :Alice\r".to_vec()]);
        assert_eq!(f.pending(), 0);
    }

    #[test]
    fn line_split_across_reads() {
        let mut f = LineFramer::new();
        assert!(feed(&mut f, b"PRIVMSG #room").is_empty());
        let lines = feed(&mut f, b" :hello\n");
        assert_eq!(lines, vec![b"PRIVMSG #room :hello".to_vec()]);
    }

    #[test]
    fn bare_lf_is_accepted() {
        let mut f = LineFramer::new();
        let lines = feed(&mut f, b"PING one\nPING two\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], b"PING two");
    }

    #[test]
    fn fragmentation_does_not_change_output() {
        let stream = b"NICK alice\r\nUSER alice 0 * :Alice in Chains\r\nJOIN #room\r\nPRIVMSG #room :a longer line of chatter\r\n";
        let whole = feed(&mut LineFramer::new(), stream);
        for chunk in [1, 2, 3, 7, 100] {
            let mut f = LineFramer::new();
            let mut lines = Vec::new();
            for piece in stream.chunks(chunk) {
                lines.extend(feed(&mut f, piece));
            }
            assert_eq!(lines, whole, "chunk size {chunk}");
        }
    }

    #[test]
    fn compaction_preserves_partial_message() {
        let mut f = LineFramer::new();
        // A finished line plus a long unfinished tail that forces the
        // buffer to fill and compact before the terminator arrives.
        let head = b"PING x\r\n";
        let tail_len = MAX_MESSAGE_SIZE - head.len();
        let mut stream = head.to_vec();
        stream.extend(std::iter::repeat_n(b'a', tail_len));
        let lines = feed(&mut f, &stream);
        assert_eq!(lines, vec![b"PING x\r".to_vec()]);
        assert_eq!(f.pending(), tail_len);

        // Room was reclaimed, so the terminator can still arrive.
        let lines = feed(&mut f, b"\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), tail_len);
    }

    #[test]
    fn overflow_discards_and_recovers() {
        let mut f = LineFramer::new();
        let flood = vec![b'x'; MAX_MESSAGE_SIZE];
        let space = f.space();
        space.copy_from_slice(&flood);
        f.advance(MAX_MESSAGE_SIZE);
        assert_eq!(f.next_line(), Err(FramingError::Overflow));

        // The connection resynchronises on the next terminated line.
        let lines = feed(&mut f, b"PONG :server\r\n");
        assert_eq!(lines, vec![b"PONG :server\r".to_vec()]);
    }

    #[test]
    fn never_yields_more_than_max_message_size() {
        let mut f = LineFramer::new();
        let mut stream = vec![b'y'; MAX_MESSAGE_SIZE - 1];
        stream.push(b'\n');
        let lines = feed(&mut f, &stream);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].len() < MAX_MESSAGE_SIZE);
    }
}
