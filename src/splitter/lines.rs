/// Maps byte offsets in the original file text to 1-based line numbers.
#[derive(Debug, Clone)]
pub(crate) struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Lines break on `\n`, `\r\n`, a lone `\r`, and U+2028 / U+2029.
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => starts.push(i + 1),
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => starts.push(i + 1),
                // LINE SEPARATOR and PARAGRAPH SEPARATOR: E2 80 A8 / E2 80 A9
                0xE2 if bytes.get(i + 1) == Some(&0x80)
                    && matches!(bytes.get(i + 2), Some(0xA8 | 0xA9)) =>
                {
                    starts.push(i + 3);
                    i += 2;
                }
                _ => {}
            }
            i += 1;
        }
        Self {
            starts,
            len: bytes.len(),
        }
    }

    /// 1-based line containing `offset`; offsets past the end clamp to the last line.
    pub fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.len);
        self.starts.partition_point(|&start| start <= offset)
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset <= self.len
    }
}
