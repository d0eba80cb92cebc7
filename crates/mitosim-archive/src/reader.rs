//! Strict little-endian byte reader over a checkpoint buffer.
//!
//! Every read names what it was reading so a truncated archive reports the
//! exact field the buffer ran out under. Reads never guess: if the declared
//! bytes are not all present, the read fails.

use crate::error::ArchiveError;

/// Cursor over an in-memory checkpoint buffer.
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Number of unread bytes.
    pub(crate) const fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Take exactly `n` bytes, or fail naming `context`.
    fn take(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], ArchiveError> {
        if self.buf.len() < n {
            return Err(ArchiveError::Truncated { context });
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    pub(crate) fn read_magic(&mut self) -> Result<[u8; 4], ArchiveError> {
        let bytes = self.take(4, "magic")?;
        bytes
            .try_into()
            .map_err(|_err| ArchiveError::Truncated { context: "magic" })
    }

    pub(crate) fn read_u8(&mut self, context: &'static str) -> Result<u8, ArchiveError> {
        let bytes = self.take(1, context)?;
        bytes
            .first()
            .copied()
            .ok_or(ArchiveError::Truncated { context })
    }

    pub(crate) fn read_u32(&mut self, context: &'static str) -> Result<u32, ArchiveError> {
        let bytes = self.take(4, context)?;
        let array: [u8; 4] = bytes
            .try_into()
            .map_err(|_err| ArchiveError::Truncated { context })?;
        Ok(u32::from_le_bytes(array))
    }

    pub(crate) fn read_i32(&mut self, context: &'static str) -> Result<i32, ArchiveError> {
        let bytes = self.take(4, context)?;
        let array: [u8; 4] = bytes
            .try_into()
            .map_err(|_err| ArchiveError::Truncated { context })?;
        Ok(i32::from_le_bytes(array))
    }

    pub(crate) fn read_u64(&mut self, context: &'static str) -> Result<u64, ArchiveError> {
        let bytes = self.take(8, context)?;
        let array: [u8; 8] = bytes
            .try_into()
            .map_err(|_err| ArchiveError::Truncated { context })?;
        Ok(u64::from_le_bytes(array))
    }

    pub(crate) fn read_i64(&mut self, context: &'static str) -> Result<i64, ArchiveError> {
        let bytes = self.take(8, context)?;
        let array: [u8; 8] = bytes
            .try_into()
            .map_err(|_err| ArchiveError::Truncated { context })?;
        Ok(i64::from_le_bytes(array))
    }

    pub(crate) fn read_f64(&mut self, context: &'static str) -> Result<f64, ArchiveError> {
        let bytes = self.take(8, context)?;
        let array: [u8; 8] = bytes
            .try_into()
            .map_err(|_err| ArchiveError::Truncated { context })?;
        Ok(f64::from_le_bytes(array))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn reads_consume_in_order() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&7_u32.to_le_bytes());
        buf.extend_from_slice(&(-3_i32).to_le_bytes());
        buf.extend_from_slice(&1.5_f64.to_le_bytes());

        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_u32("a").unwrap(), 7);
        assert_eq!(reader.read_i32("b").unwrap(), -3);
        assert!((reader.read_f64("c").unwrap() - 1.5).abs() < f64::EPSILON);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn truncation_names_the_field() {
        let buf = 7_u32.to_le_bytes();
        let mut reader = ByteReader::new(buf.get(..2).unwrap());
        let result = reader.read_u32("cell count");
        assert!(matches!(
            result,
            Err(ArchiveError::Truncated {
                context: "cell count"
            })
        ));
    }
}
