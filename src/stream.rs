use tracing::debug;

/// Prefix that marks a line as carrying a frame payload.
pub const DATA_MARKER: &str = "data: ";

/// Incremental line splitter for the analysis event stream.
///
/// Bytes are buffered raw and only decoded once a full line is available, so a
/// chunk boundary falling inside a multi-byte character never corrupts it.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    scanned: usize,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next transport chunk and drain every complete candidate line.
    ///
    /// Returned lines still carry [`DATA_MARKER`]; lines without it are
    /// discarded here.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();
        let mut consumed = 0;

        while let Some(offset) = self.buffer[self.scanned..]
            .iter()
            .position(|byte| *byte == b'\n')
        {
            let end = self.scanned + offset;
            if let Some(line) = candidate_line(&self.buffer[consumed..end]) {
                lines.push(line);
            }
            consumed = end + 1;
            self.scanned = consumed;
        }

        self.buffer.drain(..consumed);
        self.scanned = self.buffer.len();
        lines
    }

    /// Decode a complete body in one shot. An unterminated tail is dropped.
    pub fn decode_all(input: &[u8]) -> Vec<String> {
        let mut decoder = Self::default();
        let lines = decoder.feed(input);
        decoder.finish();
        lines
    }

    /// End of stream: the unterminated fragment, if any, is discarded.
    ///
    /// Returns the number of bytes thrown away.
    pub fn finish(&mut self) -> usize {
        let discarded = self.buffer.len();
        if discarded > 0 {
            debug!(bytes = discarded, "dropping unterminated trailing fragment");
        }
        self.buffer.clear();
        self.scanned = 0;
        discarded
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

fn candidate_line(raw: &[u8]) -> Option<String> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if !raw.starts_with(DATA_MARKER.as_bytes()) {
        return None;
    }

    Some(String::from_utf8_lossy(raw).into_owned())
}
