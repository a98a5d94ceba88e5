//! Byte source and sink collaborators.
//!
//! The adapters never touch files or sockets; they pull compressed bytes from
//! a [`ByteSource`] and push them to a [`ByteSink`]. Both are implemented for
//! every [`std::io::Read`] / [`std::io::Write`], so `&[u8]`, `File`,
//! `Cursor` and `Vec<u8>` work directly.

use alloc::vec::Vec;
use std::io;

/// Supplies compressed input.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes. Returns 0 at end of input.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Append everything that remains to `buf`, returning the count.
    fn read_all(&mut self, buf: &mut Vec<u8>) -> io::Result<usize>;
}

impl<R: io::Read + ?Sized> ByteSource for R {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buf)
    }

    fn read_all(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        io::Read::read_to_end(self, buf)
    }
}

/// Receives compressed output.
pub trait ByteSink {
    /// Accept all of `bytes` or fail.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl<W: io::Write + ?Sized> ByteSink for W {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        io::Write::write_all(self, bytes)?;
        io::Write::flush(self)
    }
}

/// Read until `limit` bytes are buffered or the source is exhausted.
pub(crate) fn read_prefix<S: ByteSource + ?Sized>(
    source: &mut S,
    limit: usize,
) -> io::Result<Vec<u8>> {
    let mut buf = alloc::vec![0u8; limit];
    let mut filled = 0;
    while filled < limit {
        match ByteSource::read(source, &mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}
