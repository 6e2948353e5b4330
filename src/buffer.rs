use crate::error::FtpError;

/// Fixed-capacity buffer with read/write cursors.
///
/// Used for the command accumulator and the transfer buffer. The unread
/// region is `remaining()`, consumed with `consume(n)`; the free region is
/// `space_mut()`, committed with `advance(n)`. Once everything queued has
/// been consumed both cursors reset, so the buffer never needs compaction
/// for the refill-then-drain pattern the transfer engine uses.
#[derive(Debug)]
pub struct XferBuf {
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
}

impl XferBuf {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            pos: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.len
    }

    pub fn clear(&mut self) {
        self.pos = 0;
        self.len = 0;
    }

    /// The bytes queued but not yet consumed.
    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.pos..self.len]
    }

    /// Marks `n` bytes of `remaining()` as handled.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.len);
        self.pos += n;
        if self.pos == self.len {
            self.clear();
        }
    }

    /// The writable tail of the buffer.
    pub fn space_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.len..]
    }

    /// Commits `n` bytes previously written into `space_mut()`.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.len + n <= self.buf.len());
        self.len += n;
    }

    /// Appends `bytes`, failing if they do not fit.
    pub fn extend(&mut self, bytes: &[u8]) -> Result<(), FtpError> {
        if bytes.len() > self.buf.len() - self.len {
            return Err(FtpError::ListingOverflow);
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    /// Drops everything before the read cursor so the free region grows
    /// back to the front of the buffer. Needed by the command accumulator,
    /// which consumes one line at a time while more input may be queued.
    pub fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.len, 0);
            self.len -= self.pos;
            self.pos = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_and_consume() {
        let mut buf = XferBuf::new(8);
        buf.extend(b"abcdef").unwrap();
        assert_eq!(buf.remaining(), b"abcdef");
        buf.consume(2);
        assert_eq!(buf.remaining(), b"cdef");
        buf.consume(4);
        assert!(buf.is_empty());
        // Cursors reset once drained, full capacity is available again.
        buf.extend(b"12345678").unwrap();
        assert_eq!(buf.remaining(), b"12345678");
    }

    #[test]
    fn extend_overflow_is_rejected() {
        let mut buf = XferBuf::new(4);
        buf.extend(b"abc").unwrap();
        assert!(buf.extend(b"de").is_err());
        // The failed extend must not have written anything.
        assert_eq!(buf.remaining(), b"abc");
    }

    #[test]
    fn space_and_advance() {
        let mut buf = XferBuf::new(8);
        buf.space_mut()[..3].copy_from_slice(b"xyz");
        buf.advance(3);
        assert_eq!(buf.remaining(), b"xyz");
        assert_eq!(buf.space_mut().len(), 5);
    }

    #[test]
    fn compact_moves_unread_to_front() {
        let mut buf = XferBuf::new(8);
        buf.extend(b"abcdefgh").unwrap();
        buf.consume(6);
        buf.compact();
        assert_eq!(buf.remaining(), b"gh");
        assert_eq!(buf.space_mut().len(), 6);
    }
}
