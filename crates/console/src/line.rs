//! Bounded line editor

/// Longest accepted command line
pub const MAX_INPUT_LEN: usize = 100;

/// Printable-ASCII input line, capped at [`MAX_INPUT_LEN`]
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            buf: String::with_capacity(MAX_INPUT_LEN),
        }
    }

    /// Append a printable character. Returns false when full or not printable.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.buf.len() >= MAX_INPUT_LEN || !(byte == b' ' || byte.is_ascii_graphic()) {
            return false;
        }
        self.buf.push(char::from(byte));
        true
    }

    /// Drop the last character. Returns false if the line was empty.
    pub fn backspace(&mut self) -> bool {
        self.buf.pop().is_some()
    }

    /// Hand out the line and start a new one
    pub fn take(&mut self) -> String {
        std::mem::replace(&mut self.buf, String::with_capacity(MAX_INPUT_LEN))
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_backspace() {
        let mut line = LineBuffer::new();
        for &b in b"help" {
            assert!(line.push(b));
        }
        assert!(line.backspace());
        assert_eq!(line.as_str(), "hel");
    }

    #[test]
    fn test_backspace_on_empty() {
        let mut line = LineBuffer::new();
        assert!(!line.backspace());
    }

    #[test]
    fn test_capped_length() {
        let mut line = LineBuffer::new();
        for _ in 0..MAX_INPUT_LEN {
            assert!(line.push(b'x'));
        }
        assert!(!line.push(b'y'));
        assert_eq!(line.len(), MAX_INPUT_LEN);
    }

    #[test]
    fn test_control_bytes_rejected() {
        let mut line = LineBuffer::new();
        assert!(!line.push(b'\n'));
        assert!(!line.push(0x01));
        assert!(!line.push(0xC3));
        assert!(line.is_empty());
    }

    #[test]
    fn test_take_resets() {
        let mut line = LineBuffer::new();
        line.push(b'a');
        assert_eq!(line.take(), "a");
        assert!(line.is_empty());
    }
}
